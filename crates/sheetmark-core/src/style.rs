//! Cell style types
//!
//! Only the formatting a rubric can check is modelled: the resolved font and
//! the name of the named cell style the cell's format inherits from.

use ahash::AHashMap;
use std::hash::{Hash, Hasher};

/// Name of the built-in default cell style
pub const NORMAL_STYLE: &str = "Normal";

/// Font style settings
#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    /// Font family name (e.g., "Calibri", "Arial")
    pub name: String,
    /// Font size in points
    pub size: f64,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
        }
    }
}

impl FontStyle {
    /// Set font name
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Set font size
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Set bold
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set italic
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }
}

impl Hash for FontStyle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.to_bits().hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
    }
}

impl Eq for FontStyle {}

/// Resolved style of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Font
    pub font: FontStyle,
    /// Named cell style ("Normal", "Title", "Heading 1", ...)
    pub named_style: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font: FontStyle::default(),
            named_style: NORMAL_STYLE.to_string(),
        }
    }
}

impl Style {
    /// Create a default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set font size
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    /// Set the font
    pub fn font(mut self, font: FontStyle) -> Self {
        self.font = font;
        self
    }

    /// Set the named cell style
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.named_style = name.into();
        self
    }
}

impl Hash for Style {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.font.hash(state);
        self.named_style.hash(state);
    }
}

/// Style pool for deduplicating styles
///
/// Cells reference styles by index. Index 0 is always the default style.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<u64, u32>,
}

fn style_key(style: &Style) -> u64 {
    let mut hasher = ahash::AHasher::default();
    style.hash(&mut hasher);
    hasher.finish()
}

impl StylePool {
    /// Create a new style pool with the default style at index 0
    pub fn new() -> Self {
        let default = Style::default();
        let mut index_map = AHashMap::with_capacity(16);
        index_map.insert(style_key(&default), 0);
        Self {
            styles: vec![default],
            index_map,
        }
    }

    /// Get or create a style, returning its index
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        let key = style_key(&style);

        if let Some(&idx) = self.index_map.get(&key) {
            // hash collision check
            if self.styles[idx as usize] == style {
                return idx;
            }
        }

        let idx = self.styles.len() as u32;
        self.index_map.insert(key, idx);
        self.styles.push(style);
        idx
    }

    /// Get a style by index
    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    /// Get the default style (index 0)
    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    /// Get the number of styles, including the default
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the pool only has the default style
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

//! Legend types

use std::fmt;

/// Chart legend
///
/// Both settings are optional: `None` means the chart did not declare the
/// setting, not that it has the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Legend {
    /// Declared position (`c:legendPos`)
    pub position: Option<LegendPosition>,
    /// Declared overlay flag (`c:overlay`)
    pub overlay: Option<bool>,
}

impl Legend {
    /// Create a legend with a declared position
    pub fn new(position: LegendPosition) -> Self {
        Self {
            position: Some(position),
            overlay: None,
        }
    }

    /// Set the overlay flag
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

/// Legend position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    #[default]
    Right,
    Top,
    Bottom,
    Left,
    TopRight,
}

impl LegendPosition {
    /// Parse the `val` of `c:legendPos`
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "r" => Some(LegendPosition::Right),
            "t" => Some(LegendPosition::Top),
            "b" => Some(LegendPosition::Bottom),
            "l" => Some(LegendPosition::Left),
            "tr" => Some(LegendPosition::TopRight),
            _ => None,
        }
    }

    /// The `val` used in `c:legendPos`
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            LegendPosition::Right => "r",
            LegendPosition::Top => "t",
            LegendPosition::Bottom => "b",
            LegendPosition::Left => "l",
            LegendPosition::TopRight => "tr",
        }
    }
}

impl fmt::Display for LegendPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LegendPosition::Right => "Right",
            LegendPosition::Top => "Top",
            LegendPosition::Bottom => "Bottom",
            LegendPosition::Left => "Left",
            LegendPosition::TopRight => "Top Right",
        };
        f.write_str(name)
    }
}

//! Data series types

/// Data series for a chart
#[derive(Debug, Clone, PartialEq)]
pub struct DataSeries {
    /// Series name text (cached or literal)
    pub name: Option<String>,
    /// Reference the series name is taken from (`c:tx/c:strRef/c:f`)
    pub name_reference: Option<String>,
    /// Values (Y data)
    pub values: DataReference,
    /// Categories (X data)
    pub categories: Option<DataReference>,
}

impl DataSeries {
    /// Create a new data series
    pub fn new(values: DataReference) -> Self {
        Self {
            name: None,
            name_reference: None,
            values,
            categories: None,
        }
    }

    /// Set series name
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the reference the series name comes from
    pub fn with_name_reference<S: Into<String>>(mut self, formula: S) -> Self {
        self.name_reference = Some(formula.into());
        self
    }

    /// Set categories
    pub fn with_categories(mut self, categories: DataReference) -> Self {
        self.categories = Some(categories);
        self
    }
}

/// Reference to chart data
#[derive(Debug, Clone, PartialEq)]
pub enum DataReference {
    /// Formula reference (e.g., "Sheet1!$A$1:$A$10")
    Formula(String),
    /// Literal numeric values
    Numbers(Vec<f64>),
    /// Literal string values (for categories)
    Strings(Vec<String>),
}

impl DataReference {
    /// Create a formula reference
    pub fn formula<S: Into<String>>(formula: S) -> Self {
        DataReference::Formula(formula.into())
    }

    /// The formula text, if this is a reference
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            DataReference::Formula(f) => Some(f),
            _ => None,
        }
    }
}

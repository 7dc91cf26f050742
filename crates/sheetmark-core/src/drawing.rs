//! Objects placed on a worksheet's drawing layer

use crate::chart::{Chart, ChartAnchor};

/// A drawing object anchored to a worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum Drawing {
    /// An embedded chart
    Chart(Box<Chart>),
    /// A picture
    Picture {
        name: Option<String>,
        anchor: ChartAnchor,
    },
    /// Any other shape (text box, connector, ...)
    Shape {
        name: Option<String>,
        anchor: ChartAnchor,
    },
}

impl Drawing {
    /// The chart, if this drawing is one
    pub fn as_chart(&self) -> Option<&Chart> {
        match self {
            Drawing::Chart(chart) => Some(chart),
            _ => None,
        }
    }

    /// Where the object is anchored
    pub fn anchor(&self) -> ChartAnchor {
        match self {
            Drawing::Chart(chart) => chart.anchor,
            Drawing::Picture { anchor, .. } | Drawing::Shape { anchor, .. } => *anchor,
        }
    }
}

//! Detection strategies
//!
//! Each strategy extracts one fact from a sheet or chart. Most are a chain:
//! the typed document model is asked first, then the markup tree behind it,
//! then a heuristic over cell text. The first link that finds something wins
//! and the later links are never evaluated, so two sources that disagree are
//! never both counted.
//!
//! Strategies are pure functions. They return a [`Detection`] so that "not
//! found" and "found with the format's default" stay distinct.

mod chart;
mod filter;
mod outline;
mod series;

pub use chart::{
    chart_kind, is_pie_3d, legend_overlay, legend_position, pattern_fill, pie_3d_kind, placement,
};
pub use chart::{ChartRegion, PlacementCheck};
pub use filter::{autofilter_range, filter_column, visible_range_check, RangeCheck};
pub use outline::{grand_total, page_break_count, subtotal_grouping, GrandTotal, GroupingSignals};
pub use series::{series_provenance, Provenance, ProvenanceRule};

/// Outcome of a detection strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Detection<T> {
    /// The fact is stated explicitly
    Detected(T),
    /// The facet is present but relies on an implicit value
    DetectedDefault(T),
    /// Nothing found
    NotDetected,
}

impl<T> Detection<T> {
    /// Chain another link. It only runs when nothing was found so far.
    pub fn or_else<F>(self, next: F) -> Self
    where
        F: FnOnce() -> Detection<T>,
    {
        match self {
            Detection::NotDetected => next(),
            found => found,
        }
    }

    /// The detected value, explicit or default
    pub fn value(&self) -> Option<&T> {
        match self {
            Detection::Detected(v) | Detection::DetectedDefault(v) => Some(v),
            Detection::NotDetected => None,
        }
    }

    /// Consume into the detected value, explicit or default
    pub fn into_value(self) -> Option<T> {
        match self {
            Detection::Detected(v) | Detection::DetectedDefault(v) => Some(v),
            Detection::NotDetected => None,
        }
    }

    /// Whether any link found the fact
    pub fn is_found(&self) -> bool {
        !matches!(self, Detection::NotDetected)
    }

    /// Whether the value is an implicit default
    pub fn is_default(&self) -> bool {
        matches!(self, Detection::DetectedDefault(_))
    }

    /// Map the value, keeping how it was found
    pub fn map<U, F>(self, f: F) -> Detection<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Detection::Detected(v) => Detection::Detected(f(v)),
            Detection::DetectedDefault(v) => Detection::DetectedDefault(f(v)),
            Detection::NotDetected => Detection::NotDetected,
        }
    }
}

impl<T> From<Option<T>> for Detection<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Detection::Detected(v),
            None => Detection::NotDetected,
        }
    }
}

/// Case-insensitive substring test used by the text heuristics
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_found_link_wins() {
        let calls = Cell::new(0);
        let result = Detection::Detected(1).or_else(|| {
            calls.set(calls.get() + 1);
            Detection::Detected(2)
        });
        assert_eq!(result, Detection::Detected(1));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_default_also_stops_the_chain() {
        let result = Detection::DetectedDefault("r").or_else(|| Detection::Detected("b"));
        assert_eq!(result, Detection::DetectedDefault("r"));
        assert!(result.is_default());
    }

    #[test]
    fn test_not_detected_falls_through() {
        let result: Detection<i32> = Detection::NotDetected
            .or_else(|| Detection::NotDetected)
            .or_else(|| Detection::DetectedDefault(7));
        assert_eq!(result.value(), Some(&7));
    }

    #[test]
    fn test_from_option_and_map() {
        assert_eq!(Detection::from(Some(2)).map(|v| v * 2), Detection::Detected(4));
        assert_eq!(Detection::<i32>::from(None), Detection::NotDetected);
        assert!(!Detection::<i32>::NotDetected.is_found());
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Grand TOTAL", "total"));
        assert!(!contains_ignore_case("Subtotal", "grand"));
    }
}

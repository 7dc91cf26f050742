//! Typed view of embedded charts
//!
//! The typed view is what a reader could classify. Everything it saw is also
//! kept as [`Chart::markup`], which stays authoritative when the two differ.

mod legend;
mod series;

pub use legend::{Legend, LegendPosition};
pub use series::{DataReference, DataSeries};

use crate::markup::{ns, MarkupNode};
use std::fmt;

/// Chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    // Column/Bar
    ColumnClustered,
    ColumnStacked,
    ColumnPercentStacked,
    Column3D,
    BarClustered,
    BarStacked,
    BarPercentStacked,
    Bar3D,

    // Line
    Line,
    LineStacked,
    Line3D,

    // Pie
    Pie,
    PieExploded,
    Pie3D,
    PieExploded3D,
    OfPie,
    Doughnut,

    // Area
    Area,
    AreaStacked,
    Area3D,

    // Other
    Scatter,
    Bubble,
    Radar,
    Stock,
    Surface,

    /// Not classified
    Other,
}

impl ChartKind {
    /// Classify a plot element (`c:barChart`, `c:pie3DChart`, ...) by its
    /// local name and the few child settings that split a family
    pub fn from_plot(
        element: &str,
        bar_dir: Option<&str>,
        grouping: Option<&str>,
        exploded: bool,
    ) -> Self {
        let horizontal = bar_dir == Some("bar");
        match element {
            "barChart" => match (horizontal, grouping) {
                (true, Some("stacked")) => ChartKind::BarStacked,
                (true, Some("percentStacked")) => ChartKind::BarPercentStacked,
                (true, _) => ChartKind::BarClustered,
                (false, Some("stacked")) => ChartKind::ColumnStacked,
                (false, Some("percentStacked")) => ChartKind::ColumnPercentStacked,
                (false, _) => ChartKind::ColumnClustered,
            },
            "bar3DChart" if horizontal => ChartKind::Bar3D,
            "bar3DChart" => ChartKind::Column3D,
            "lineChart" => match grouping {
                Some("stacked") | Some("percentStacked") => ChartKind::LineStacked,
                _ => ChartKind::Line,
            },
            "line3DChart" => ChartKind::Line3D,
            "pieChart" if exploded => ChartKind::PieExploded,
            "pieChart" => ChartKind::Pie,
            "pie3DChart" if exploded => ChartKind::PieExploded3D,
            "pie3DChart" => ChartKind::Pie3D,
            "ofPieChart" => ChartKind::OfPie,
            "doughnutChart" => ChartKind::Doughnut,
            "areaChart" => match grouping {
                Some("stacked") | Some("percentStacked") => ChartKind::AreaStacked,
                _ => ChartKind::Area,
            },
            "area3DChart" => ChartKind::Area3D,
            "scatterChart" => ChartKind::Scatter,
            "bubbleChart" => ChartKind::Bubble,
            "radarChart" => ChartKind::Radar,
            "stockChart" => ChartKind::Stock,
            "surfaceChart" | "surface3DChart" => ChartKind::Surface,
            _ => ChartKind::Other,
        }
    }

    /// Classify the first plot element of a `c:plotArea`
    ///
    /// A pie counts as exploded when any of its series declares an
    /// `c:explosion` greater than zero.
    pub fn from_plot_area(plot_area: &MarkupNode) -> Self {
        plot_area
            .children
            .iter()
            .filter(|n| n.name.ns.as_deref() == Some(ns::CHART))
            .map(ChartKind::from_plot_element)
            .find(|kind| *kind != ChartKind::Other)
            .unwrap_or(ChartKind::Other)
    }

    /// Classify a single plot element such as `c:barChart` or `c:pie3DChart`
    pub fn from_plot_element(plot: &MarkupNode) -> Self {
        let setting = |local: &str| plot.child(ns::CHART, local).and_then(|n| n.attr("val"));
        let exploded = plot
            .children_named(ns::CHART, "ser")
            .filter_map(|ser| ser.child(ns::CHART, "explosion"))
            .filter_map(|e| e.attr("val"))
            .any(|v| v.parse::<u32>().map_or(false, |n| n > 0));
        ChartKind::from_plot(&plot.name.local, setting("barDir"), setting("grouping"), exploded)
    }

    /// Check for any three-dimensional variant
    pub fn is_3d(&self) -> bool {
        matches!(
            self,
            ChartKind::Column3D
                | ChartKind::Bar3D
                | ChartKind::Line3D
                | ChartKind::Pie3D
                | ChartKind::PieExploded3D
                | ChartKind::Area3D
        )
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::ColumnClustered => "Clustered Column",
            ChartKind::ColumnStacked => "Stacked Column",
            ChartKind::ColumnPercentStacked => "100% Stacked Column",
            ChartKind::Column3D => "3-D Column",
            ChartKind::BarClustered => "Clustered Bar",
            ChartKind::BarStacked => "Stacked Bar",
            ChartKind::BarPercentStacked => "100% Stacked Bar",
            ChartKind::Bar3D => "3-D Bar",
            ChartKind::Line => "Line",
            ChartKind::LineStacked => "Stacked Line",
            ChartKind::Line3D => "3-D Line",
            ChartKind::Pie => "Pie",
            ChartKind::PieExploded => "Exploded Pie",
            ChartKind::Pie3D => "3-D Pie",
            ChartKind::PieExploded3D => "Exploded 3-D Pie",
            ChartKind::OfPie => "Pie of Pie",
            ChartKind::Doughnut => "Doughnut",
            ChartKind::Area => "Area",
            ChartKind::AreaStacked => "Stacked Area",
            ChartKind::Area3D => "3-D Area",
            ChartKind::Scatter => "Scatter",
            ChartKind::Bubble => "Bubble",
            ChartKind::Radar => "Radar",
            ChartKind::Stock => "Stock",
            ChartKind::Surface => "Surface",
            ChartKind::Other => "Other",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill of a chart region's shape properties (`c:spPr`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeFill {
    /// `a:noFill`
    NoFill,
    /// `a:solidFill`
    Solid,
    /// `a:gradFill`
    Gradient,
    /// `a:pattFill` with its preset (`pct10`, `dkHorz`, ...)
    Pattern(String),
    /// `a:blipFill`
    Picture,
}

/// Chart anchor position (0-based cell indices of the two-cell anchor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartAnchor {
    /// Start column
    pub from_col: u16,
    /// Start row
    pub from_row: u32,
    /// End column
    pub to_col: u16,
    /// End row
    pub to_row: u32,
}

impl ChartAnchor {
    /// Create an anchor from its corners
    pub fn new(from_row: u32, from_col: u16, to_row: u32, to_col: u16) -> Self {
        Self {
            from_col,
            from_row,
            to_col,
            to_row,
        }
    }
}

/// Chart definition
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Object name from the drawing (e.g. "Chart 1")
    pub name: Option<String>,
    /// Chart type
    pub kind: ChartKind,
    /// Chart title
    pub title: Option<String>,
    /// Legend, if the chart shows one
    pub legend: Option<Legend>,
    /// Data series
    pub series: Vec<DataSeries>,
    /// Fill of the plot area
    pub plot_area_fill: Option<ShapeFill>,
    /// Fill of the whole chart area
    pub chart_area_fill: Option<ShapeFill>,
    /// Position anchor
    pub anchor: ChartAnchor,
    /// Markup tree of the chart part (`c:chartSpace`)
    pub markup: MarkupNode,
}

impl Chart {
    /// Create a new chart with an empty `c:chartSpace`
    pub fn new(kind: ChartKind) -> Self {
        Self {
            name: None,
            kind,
            title: None,
            legend: None,
            series: Vec::new(),
            plot_area_fill: None,
            chart_area_fill: None,
            anchor: ChartAnchor::default(),
            markup: MarkupNode::new(ns::CHART, "chartSpace"),
        }
    }

    /// Set chart title
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the legend
    pub fn with_legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Set the anchor
    pub fn with_anchor(mut self, anchor: ChartAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Replace the markup tree
    pub fn with_markup(mut self, markup: MarkupNode) -> Self {
        self.markup = markup;
        self
    }

    /// Add a data series
    pub fn add_series(&mut self, series: DataSeries) {
        self.series.push(series);
    }

    /// The `c:chart` element of the markup
    pub fn chart_element(&self) -> Option<&MarkupNode> {
        self.markup.child(ns::CHART, "chart")
    }

    /// The `c:plotArea` element of the markup
    pub fn plot_area(&self) -> Option<&MarkupNode> {
        self.markup
            .path(&[(ns::CHART, "chart"), (ns::CHART, "plotArea")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_plot() {
        assert_eq!(
            ChartKind::from_plot("barChart", Some("col"), Some("clustered"), false),
            ChartKind::ColumnClustered
        );
        assert_eq!(
            ChartKind::from_plot("barChart", Some("bar"), Some("stacked"), false),
            ChartKind::BarStacked
        );
        assert_eq!(ChartKind::from_plot("pie3DChart", None, None, false), ChartKind::Pie3D);
        assert_eq!(
            ChartKind::from_plot("pie3DChart", None, None, true),
            ChartKind::PieExploded3D
        );
        assert_eq!(ChartKind::from_plot("layout", None, None, false), ChartKind::Other);
    }

    #[test]
    fn test_from_plot_area_skips_layout() {
        let plot_area = MarkupNode::new(ns::CHART, "plotArea")
            .child_node(MarkupNode::new(ns::CHART, "layout"))
            .child_node(
                MarkupNode::new(ns::CHART, "pie3DChart").child_node(
                    MarkupNode::new(ns::CHART, "ser").child_node(
                        MarkupNode::new(ns::CHART, "explosion").attr_value("val", "12"),
                    ),
                ),
            );
        let kind = ChartKind::from_plot_area(&plot_area);
        assert_eq!(kind, ChartKind::PieExploded3D);
        assert!(kind.is_3d());
    }
}

//! Chart facts: fills, legend, kind and placement

use sheetmark_core::{ns, CellAddress, CellRange, Chart, ChartKind, LegendPosition, ShapeFill};
use tracing::debug;

use super::Detection;

/// A fillable region of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRegion {
    /// The plot area inside the axes
    PlotArea,
    /// The whole chart object
    ChartArea,
}

impl ChartRegion {
    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartRegion::PlotArea => "Plot area",
            ChartRegion::ChartArea => "Chart area",
        }
    }
}

/// Pattern preset (`pct10`, `dkHorz`, ...) filling a chart region
pub fn pattern_fill(chart: &Chart, region: ChartRegion) -> Detection<String> {
    let typed = match region {
        ChartRegion::PlotArea => chart.plot_area_fill.as_ref(),
        ChartRegion::ChartArea => chart.chart_area_fill.as_ref(),
    };
    let typed = typed.and_then(|fill| match fill {
        ShapeFill::Pattern(preset) => Some(preset.clone()),
        _ => None,
    });

    Detection::from(typed).or_else(|| {
        let sp_pr = match region {
            ChartRegion::PlotArea => chart.markup.path(&[
                (ns::CHART, "chart"),
                (ns::CHART, "plotArea"),
                (ns::CHART, "spPr"),
            ]),
            ChartRegion::ChartArea => chart.markup.child(ns::CHART, "spPr"),
        };
        let preset = sp_pr
            .and_then(|sp| sp.child(ns::DRAWINGML, "pattFill"))
            .and_then(|fill| fill.attr("prst"))
            .map(str::to_string);
        debug!(region = region.as_str(), ?preset, "pattern fill from markup");
        Detection::from(preset)
    })
}

/// Where the legend sits. A legend without `c:legendPos` is on the right,
/// the format's default.
pub fn legend_position(chart: &Chart) -> Detection<LegendPosition> {
    let typed = chart.legend.as_ref().and_then(|legend| legend.position);

    Detection::from(typed).or_else(|| {
        let Some(legend) = chart
            .chart_element()
            .and_then(|c| c.child(ns::CHART, "legend"))
        else {
            return Detection::NotDetected;
        };
        match legend.child(ns::CHART, "legendPos") {
            Some(pos) => Detection::from(pos.attr("val").and_then(LegendPosition::from_ooxml)),
            None => Detection::DetectedDefault(LegendPosition::Right),
        }
    })
}

/// Whether the legend may overlap the plot. An overlay node without a
/// value means it may.
pub fn legend_overlay(chart: &Chart) -> Detection<bool> {
    let typed = chart.legend.as_ref().and_then(|legend| legend.overlay);

    Detection::from(typed).or_else(|| {
        let overlay = chart.chart_element().and_then(|c| {
            c.path(&[(ns::CHART, "legend"), (ns::CHART, "overlay")])
        });
        match overlay {
            Some(node) => match node.attr("val") {
                Some(v) => Detection::Detected(v == "1" || v.eq_ignore_ascii_case("true")),
                None => Detection::DetectedDefault(true),
            },
            None => Detection::NotDetected,
        }
    })
}

/// Chart type. The typed kind is used unless it could not be classified;
/// then every plot area in the markup is inspected.
pub fn chart_kind(chart: &Chart) -> Detection<ChartKind> {
    let typed = match chart.kind {
        ChartKind::Other => Detection::NotDetected,
        kind => Detection::Detected(kind),
    };

    typed
        .or_else(|| {
            let kind = chart
                .markup
                .descendants_named(ns::CHART, "plotArea")
                .map(ChartKind::from_plot_area)
                .find(|kind| *kind != ChartKind::Other);
            Detection::from(kind)
        })
        .or_else(|| {
            // a 3-D pie element outside any plot area
            let pie = chart.markup.descendant(ns::CHART, "pie3DChart");
            Detection::from(pie.map(|_| ChartKind::Pie3D))
        })
}

/// Check for a 3-D pie, exploded or not
pub fn is_pie_3d(kind: &Detection<ChartKind>) -> bool {
    matches!(
        kind.value(),
        Some(ChartKind::Pie3D) | Some(ChartKind::PieExploded3D)
    )
}

/// 3-D pie kind of a chart, if it has one. A combination chart can classify
/// as its first plot type, so any `c:pie3DChart` in the markup also counts.
pub fn pie_3d_kind(chart: &Chart) -> Detection<ChartKind> {
    let kind = chart_kind(chart);
    if is_pie_3d(&kind) {
        return kind;
    }
    let pie = chart.markup.descendant(ns::CHART, "pie3DChart");
    if pie.is_some() {
        debug!(typed = %chart.kind, "3-D pie found in markup");
    }
    Detection::from(pie.map(ChartKind::from_plot_element))
}

/// Result of comparing a chart's anchor with an expected rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCheck {
    /// Cell of the anchor's top-left corner
    pub top_left: CellAddress,
    /// Cell of the anchor's bottom-right corner
    pub bottom_right: CellAddress,
    /// All four corners lie within the tolerance
    pub in_range: bool,
}

/// Compare a chart's anchor against `expected`, allowing each corner to be
/// off by `tolerance` cells in either direction.
pub fn placement(chart: &Chart, expected: &CellRange, tolerance: u32) -> PlacementCheck {
    let anchor = chart.anchor;
    let near = |actual: u32, wanted: u32| actual.abs_diff(wanted) <= tolerance;

    let in_range = near(anchor.from_col.into(), expected.start.col.into())
        && near(anchor.from_row, expected.start.row)
        && near(anchor.to_col.into(), expected.end.col.into())
        && near(anchor.to_row, expected.end.row);

    debug!(?anchor, expected = %expected, in_range, "chart placement");
    PlacementCheck {
        top_left: CellAddress::new(anchor.from_row, anchor.from_col),
        bottom_right: CellAddress::new(anchor.to_row, anchor.to_col),
        in_range,
    }
}

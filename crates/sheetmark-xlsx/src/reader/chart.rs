//! Typed view of a chart part

use sheetmark_core::{
    ns, Chart, ChartKind, DataReference, DataSeries, Legend, LegendPosition, MarkupNode, ShapeFill,
};

/// Build the typed view of a `c:chartSpace` tree. The tree itself is kept
/// on the chart.
pub(crate) fn chart_from_markup(markup: MarkupNode) -> Chart {
    let mut chart = Chart::new(ChartKind::Other);

    chart.chart_area_fill = markup.child(ns::CHART, "spPr").and_then(shape_fill);

    if let Some(chart_el) = markup.child(ns::CHART, "chart") {
        chart.title = chart_el.child(ns::CHART, "title").and_then(title_text);
        chart.legend = chart_el.child(ns::CHART, "legend").map(read_legend);

        if let Some(plot_area) = chart_el.child(ns::CHART, "plotArea") {
            chart.kind = ChartKind::from_plot_area(plot_area);
            chart.plot_area_fill = plot_area.child(ns::CHART, "spPr").and_then(shape_fill);
            chart.series = plot_area
                .children
                .iter()
                .flat_map(|plot| plot.children_named(ns::CHART, "ser"))
                .map(read_series)
                .collect();
        }
    }

    chart.markup = markup;
    chart
}

fn shape_fill(sp_pr: &MarkupNode) -> Option<ShapeFill> {
    sp_pr.children.iter().find_map(|fill| {
        if fill.name.ns.as_deref() != Some(ns::DRAWINGML) {
            return None;
        }
        match fill.name.local.as_str() {
            "noFill" => Some(ShapeFill::NoFill),
            "solidFill" => Some(ShapeFill::Solid),
            "gradFill" => Some(ShapeFill::Gradient),
            "blipFill" => Some(ShapeFill::Picture),
            // a pattern without preset is not something we can classify
            "pattFill" => fill.attr("prst").map(|p| ShapeFill::Pattern(p.to_string())),
            _ => None,
        }
    })
}

fn read_legend(legend: &MarkupNode) -> Legend {
    let position = legend
        .child(ns::CHART, "legendPos")
        .and_then(|p| p.attr("val"))
        .and_then(LegendPosition::from_ooxml);
    // an overlay node without `val` is left to the markup
    let overlay = legend
        .child(ns::CHART, "overlay")
        .and_then(|o| o.attr("val"))
        .map(|v| v == "1" || v == "true");
    Legend { position, overlay }
}

fn title_text(title: &MarkupNode) -> Option<String> {
    let rich: String = title
        .descendants_named(ns::DRAWINGML, "t")
        .map(|t| t.text.as_str())
        .collect();
    if !rich.is_empty() {
        return Some(rich);
    }
    title
        .descendant(ns::CHART, "strCache")
        .and_then(|cache| cache.descendant(ns::CHART, "v"))
        .map(|v| v.text.clone())
}

fn read_series(ser: &MarkupNode) -> DataSeries {
    let values = ser
        .child(ns::CHART, "val")
        .or_else(|| ser.child(ns::CHART, "yVal"))
        .and_then(read_reference)
        .unwrap_or(DataReference::Numbers(Vec::new()));
    let mut series = DataSeries::new(values);
    series.categories = ser
        .child(ns::CHART, "cat")
        .or_else(|| ser.child(ns::CHART, "xVal"))
        .and_then(read_reference);

    if let Some(tx) = ser.child(ns::CHART, "tx") {
        series.name_reference = tx
            .path(&[(ns::CHART, "strRef"), (ns::CHART, "f")])
            .map(|f| f.text.clone());
        series.name = tx
            .descendant(ns::CHART, "v")
            .map(|v| v.text.clone());
    }
    series
}

/// A `c:cat`/`c:val` source: a formula reference wins over literal caches
fn read_reference(source: &MarkupNode) -> Option<DataReference> {
    for container in &source.children {
        match container.name.local.as_str() {
            "strRef" | "numRef" | "multiLvlStrRef" => {
                if let Some(f) = container.child(ns::CHART, "f") {
                    return Some(DataReference::Formula(f.text.clone()));
                }
            }
            "strLit" => {
                return Some(DataReference::Strings(point_values(container).collect()));
            }
            "numLit" => {
                let numbers = point_values(container)
                    .filter_map(|v| v.trim().parse().ok())
                    .collect();
                return Some(DataReference::Numbers(numbers));
            }
            _ => {}
        }
    }
    None
}

fn point_values(container: &MarkupNode) -> impl Iterator<Item = String> + '_ {
    container
        .children_named(ns::CHART, "pt")
        .filter_map(|pt| pt.child(ns::CHART, "v"))
        .map(|v| v.text.clone())
}

//! Rule variants and their sub-rules
//!
//! Every sub-rule adds exactly one line to the scorecard. Defaults are the
//! constants of the built-in P09 rubric.

use rust_decimal::Decimal;
use sheetmark_core::{CellAddress, CellRange, Chart, LegendPosition, Worksheet};

use super::Scorecard;
use crate::detect::{
    self, autofilter_range, filter_column, grand_total, legend_overlay, legend_position,
    page_break_count, pattern_fill, pie_3d_kind, placement, series_provenance,
    subtotal_grouping, visible_range_check, ChartRegion, ProvenanceRule,
};
use crate::error::{GradingError, Result};

/// First chart on the sheet, or a chart-not-found error
fn first_chart(sheet: &Worksheet) -> Result<&Chart> {
    sheet
        .charts()
        .next()
        .ok_or_else(|| GradingError::ChartNotFound(sheet.name().to_string()))
}

/// Whole number with thousands separators (`38500.4` -> `38,500`)
fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Pattern fills on the plot area and the chart area
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPatternFill {
    /// Expected plot area preset
    pub plot_area: String,
    /// Expected chart area preset
    pub chart_area: String,
    /// Points per region with the expected preset
    pub points: Decimal,
    /// Points per region filled with another pattern
    pub other_pattern_points: Decimal,
}

impl Default for ChartPatternFill {
    fn default() -> Self {
        Self {
            plot_area: "pct10".to_string(),
            chart_area: "pct50".to_string(),
            points: Decimal::new(25, 1),
            other_pattern_points: Decimal::ONE,
        }
    }
}

impl ChartPatternFill {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        let chart = first_chart(sheet)?;

        for (region, expected) in [
            (ChartRegion::PlotArea, &self.plot_area),
            (ChartRegion::ChartArea, &self.chart_area),
        ] {
            let name = region.as_str();
            match pattern_fill(chart, region).into_value() {
                Some(preset) if preset == *expected => {
                    card.award(self.points, format!("{name} has pattern fill {preset}"));
                }
                Some(preset) => card.partial(
                    self.other_pattern_points,
                    format!("{name} has pattern fill '{preset}' (expected {expected})"),
                ),
                None => card.fail(format!("{name} has no pattern fill")),
            }
        }
        Ok(())
    }
}

/// Formatting of a title cell: unmerged, named style, font size and bold
#[derive(Debug, Clone, PartialEq)]
pub struct TitleCellFormat {
    /// Title cell
    pub cell: String,
    /// Text the cell's named style must contain
    pub style_name: String,
    /// Font size in points
    pub font_size: f64,
    /// Points per satisfied sub-rule
    pub points: Decimal,
}

impl Default for TitleCellFormat {
    fn default() -> Self {
        Self {
            cell: "A1".to_string(),
            style_name: "Title".to_string(),
            font_size: 24.0,
            points: Decimal::ONE,
        }
    }
}

impl TitleCellFormat {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        let addr = CellAddress::parse(&self.cell)?;
        let cell = addr.to_a1_string();

        if sheet.is_merged(addr.row, addr.col) {
            card.fail(format!("Cell {cell} is still merged"));
        } else {
            card.award(self.points, format!("Cell {cell} is not merged"));
        }

        let style = sheet.style_at(addr.row, addr.col);
        if detect::contains_ignore_case(&style.named_style, &self.style_name) {
            card.award(self.points, format!("{} style applied", self.style_name));
        } else {
            card.fail(format!(
                "Cell style is '{}' (expected {})",
                style.named_style, self.style_name
            ));
        }

        if (style.font.size - self.font_size).abs() < 0.01 {
            card.award(self.points, format!("Font size is {}pt", self.font_size));
        } else {
            card.fail(format!(
                "Font size is {}pt (expected {}pt)",
                style.font.size, self.font_size
            ));
        }

        if style.font.bold {
            card.award(self.points, "Font is bold");
        } else {
            card.fail("Font is not bold");
        }
        Ok(())
    }
}

/// Legend position and overlay
#[derive(Debug, Clone, PartialEq)]
pub struct LegendLayout {
    /// Expected position
    pub position: LegendPosition,
    /// Points for the position
    pub position_points: Decimal,
    /// Points when the legend may overlap the chart
    pub overlay_points: Decimal,
}

impl Default for LegendLayout {
    fn default() -> Self {
        Self {
            position: LegendPosition::Right,
            position_points: Decimal::TWO,
            overlay_points: Decimal::ONE,
        }
    }
}

impl LegendLayout {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        let chart = first_chart(sheet)?;

        match legend_position(chart).into_value() {
            Some(position) if position == self.position => {
                card.award(self.position_points, format!("Legend is on the {position}"));
            }
            Some(position) => card.fail(format!(
                "Legend is on the {position} (expected {})",
                self.position
            )),
            None => card.fail("Chart has no legend"),
        }

        if legend_overlay(chart).into_value() == Some(true) {
            card.award(self.overlay_points, "Legend may overlap the chart");
        } else {
            card.fail("Legend does not overlap the chart");
        }
        Ok(())
    }
}

/// An autofilter whose visible rows keep a numeric column within bounds
#[derive(Debug, Clone, PartialEq)]
pub struct NumericAutoFilter {
    /// Header text of the filtered column
    pub header: String,
    /// Lower bound, inclusive
    pub min: f64,
    /// Upper bound, inclusive
    pub max: f64,
    /// Points for having an autofilter
    pub filter_points: Decimal,
    /// Points for the visible values
    pub range_points: Decimal,
}

impl Default for NumericAutoFilter {
    fn default() -> Self {
        Self {
            header: "Total".to_string(),
            min: 34_000.0,
            max: 45_000.0,
            filter_points: Decimal::TWO,
            range_points: Decimal::TWO,
        }
    }
}

impl NumericAutoFilter {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        let Some(range) = autofilter_range(sheet).into_value() else {
            card.fail("AutoFilter is not enabled");
            return Ok(());
        };
        card.award(self.filter_points, format!("AutoFilter enabled on {range}"));

        let Some(col) = filter_column(sheet, &range, &self.header).into_value() else {
            card.fail(format!("No '{}' column in the filter range", self.header));
            return Ok(());
        };

        let bounds = format!("{} - {}", format_amount(self.min), format_amount(self.max));
        let check = visible_range_check(sheet, &range, col, self.min, self.max);
        if check.passed() {
            card.award(
                self.range_points,
                format!("Visible {} values are within {bounds}", self.header),
            );
        } else if check.visible == 0 {
            card.fail("No rows are visible in the filter range");
        } else {
            card.fail(format!(
                "{} of {} visible rows are outside {bounds}",
                check.out_of_range, check.visible
            ));
        }
        Ok(())
    }
}

/// Subtotal outline, page breaks between groups and a grand total
#[derive(Debug, Clone, PartialEq)]
pub struct SubtotalReport {
    /// Points for the grouping
    pub grouping_points: Decimal,
    /// Points for page breaks
    pub page_break_points: Decimal,
    /// Points for a grand total computed by a formula
    pub grand_total_points: Decimal,
    /// Points for a grand total typed in as a value
    pub literal_total_points: Decimal,
}

impl Default for SubtotalReport {
    fn default() -> Self {
        Self {
            grouping_points: Decimal::from(3),
            page_break_points: Decimal::TWO,
            grand_total_points: Decimal::from(3),
            literal_total_points: Decimal::new(15, 1),
        }
    }
}

impl SubtotalReport {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        let grouping = subtotal_grouping(sheet);
        if grouping.is_present() {
            card.award(
                self.grouping_points,
                format!("Subtotal grouping found ({} of 4 signals)", grouping.signals()),
            );
        } else {
            card.fail("No subtotal grouping");
        }

        match page_break_count(sheet).into_value() {
            Some(n) if n > 0 => card.award(self.page_break_points, format!("{n} page break(s)")),
            _ => card.fail("No page breaks"),
        }

        match grand_total(sheet).into_value() {
            Some(total) if total.has_formula => card.award(
                self.grand_total_points,
                format!(
                    "Grand Total at {}: {}",
                    total.address,
                    format_amount(total.value)
                ),
            ),
            Some(total) => card.award(
                self.literal_total_points,
                format!(
                    "Grand Total at {} ({}) has no formula",
                    total.address,
                    format_amount(total.value)
                ),
            ),
            None => card.fail("Grand Total not found"),
        }
        Ok(())
    }
}

/// A 3-D pie chart: its type, placement and data source
#[derive(Debug, Clone, PartialEq)]
pub struct Pie3dChart {
    /// Expected anchor rectangle
    pub placement: String,
    /// Cells each corner may be off by
    pub tolerance: u32,
    /// Expected data columns
    pub provenance: ProvenanceRule,
    /// Points for the chart type
    pub type_points: Decimal,
    /// Points for the placement
    pub placement_points: Decimal,
    /// Points for the data, half per correct column
    pub data_points: Decimal,
}

impl Default for Pie3dChart {
    fn default() -> Self {
        Self {
            placement: "J2:P15".to_string(),
            tolerance: 1,
            provenance: ProvenanceRule {
                category_header: "Product".to_string(),
                value_header: "Total".to_string(),
                category_columns: vec!["A".to_string(), "B".to_string()],
                value_columns: vec!["B".to_string(), "F".to_string()],
            },
            type_points: Decimal::from(3),
            placement_points: Decimal::TWO,
            data_points: Decimal::from(3),
        }
    }
}

impl Pie3dChart {
    pub(super) fn evaluate(&self, sheet: &Worksheet, card: &mut Scorecard) -> Result<()> {
        // only the first 3-D pie is graded
        let Some(chart) = sheet.charts().find(|c| pie_3d_kind(c).is_found()) else {
            card.fail(format!("No 3-D pie chart on sheet '{}'", sheet.name()));
            return Ok(());
        };
        card.award(
            self.type_points,
            format!("3-D pie chart: {}", chart.name.as_deref().unwrap_or("(unnamed)")),
        );

        let expected = CellRange::parse(&self.placement)?;
        let check = placement(chart, &expected, self.tolerance);
        let actual = format!("{}:{}", check.top_left, check.bottom_right);
        if check.in_range {
            card.award(self.placement_points, format!("Chart placed at {actual}"));
        } else {
            card.fail(format!("Chart placed at {actual} (expected {expected})"));
        }

        let rule = &self.provenance;
        let provenance = series_provenance(chart, sheet, rule);
        match (provenance.category.is_found(), provenance.values.is_found()) {
            (true, true) => {
                let range = provenance
                    .data_range
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                card.award(
                    self.data_points,
                    format!(
                        "Chart data uses {} and {}{range}",
                        rule.category_header, rule.value_header
                    ),
                );
            }
            (category, _) => {
                let (found, missing) = if category {
                    (&rule.category_header, &rule.value_header)
                } else {
                    (&rule.value_header, &rule.category_header)
                };
                if provenance.satisfied() == 1 {
                    card.award(
                        self.data_points / Decimal::TWO,
                        format!("Chart data partly correct: {found} found, {missing} missing"),
                    );
                } else {
                    card.fail(format!(
                        "Chart data does not use the {} and {} columns",
                        rule.category_header, rule.value_header
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetmark_core::{
        ChartAnchor, ChartKind, DataReference, DataSeries, Legend, ShapeFill, Style,
    };

    fn run(rule: impl FnOnce(&mut Scorecard) -> Result<()>) -> Scorecard {
        let mut card = Scorecard::new();
        rule(&mut card).unwrap();
        card
    }

    fn with_chart(chart: Chart) -> Worksheet {
        let mut sheet = Worksheet::new("Summary");
        sheet.add_chart(chart);
        sheet
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(34_000.0), "34,000");
        assert_eq!(format_amount(1_234_567.6), "1,234,568");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(-45_000.0), "-45,000");
    }

    #[test]
    fn test_pattern_fill_full_and_other() {
        let mut chart = Chart::new(ChartKind::Pie);
        chart.plot_area_fill = Some(ShapeFill::Pattern("pct10".into()));
        chart.chart_area_fill = Some(ShapeFill::Pattern("pct25".into()));
        let sheet = with_chart(chart);

        let card = run(|card| ChartPatternFill::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::new(35, 1));
        assert_eq!(card.details(), ["Plot area has pattern fill pct10".to_string()]);
        assert_eq!(
            card.errors(),
            ["Chart area has pattern fill 'pct25' (expected pct50)".to_string()]
        );
    }

    #[test]
    fn test_chart_rules_need_a_chart() {
        let sheet = Worksheet::new("Summary");
        let mut card = Scorecard::new();
        let err = LegendLayout::default().evaluate(&sheet, &mut card).unwrap_err();
        assert_eq!(err.to_string(), "No chart found on sheet 'Summary'");
    }

    #[test]
    fn test_title_cell_all_sub_rules() {
        let mut sheet = Worksheet::new("Report");
        sheet.set_cell_value("A1", "Quarterly Sales").unwrap();
        sheet
            .set_cell_style("A1", &Style::new().named("Title").font_size(24.0).bold(true))
            .unwrap();

        let card = run(|card| TitleCellFormat::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::from(4));
        assert_eq!(card.details().len(), 4);
        assert!(card.errors().is_empty());
    }

    #[test]
    fn test_title_cell_merged_and_plain() {
        let mut sheet = Worksheet::new("Report");
        sheet.set_cell_value("A1", "Quarterly Sales").unwrap();
        sheet.merge_cells(&CellRange::parse("A1:D1").unwrap()).unwrap();

        let card = run(|card| TitleCellFormat::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::ZERO);
        assert_eq!(
            card.errors(),
            [
                "Cell A1 is still merged".to_string(),
                "Cell style is 'Normal' (expected Title)".to_string(),
                "Font size is 11pt (expected 24pt)".to_string(),
                "Font is not bold".to_string(),
            ]
        );
    }

    #[test]
    fn test_legend_layout() {
        let right = with_chart(
            Chart::new(ChartKind::Pie)
                .with_legend(Legend::new(LegendPosition::Right).with_overlay(true)),
        );
        let card = run(|card| LegendLayout::default().evaluate(&right, card));
        assert_eq!(card.score(), Decimal::from(3));

        let bottom = with_chart(
            Chart::new(ChartKind::Pie)
                .with_legend(Legend::new(LegendPosition::Bottom).with_overlay(false)),
        );
        let card = run(|card| LegendLayout::default().evaluate(&bottom, card));
        assert_eq!(card.score(), Decimal::ZERO);
        assert_eq!(
            card.errors(),
            [
                "Legend is on the Bottom (expected Right)".to_string(),
                "Legend does not overlap the chart".to_string(),
            ]
        );
    }

    #[test]
    fn test_autofilter_missing() {
        let sheet = Worksheet::new("Orders");
        let card = run(|card| NumericAutoFilter::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::ZERO);
        assert_eq!(card.errors(), ["AutoFilter is not enabled".to_string()]);
    }

    #[test]
    fn test_autofilter_without_total_column() {
        let mut sheet = Worksheet::new("Orders");
        sheet.set_cell_value("A1", "Region").unwrap();
        sheet.set_cell_value("A2", "East").unwrap();
        sheet.set_auto_filter(Some(CellRange::parse("A1:A2").unwrap()));

        let card = run(|card| NumericAutoFilter::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::TWO);
        assert_eq!(card.errors(), ["No 'Total' column in the filter range".to_string()]);
    }

    #[test]
    fn test_pie_chart_partial_data() {
        let mut sheet = Worksheet::new("Farmers & Market");
        sheet.set_cell_value("C1", "Product").unwrap();
        let mut chart = Chart::new(ChartKind::Pie3D)
            .with_anchor(ChartAnchor::new(1, 9, 14, 15));
        chart.name = Some("Chart 2".into());
        chart.add_series(
            DataSeries::new(DataReference::formula("$D$2:$D$9"))
                .with_categories(DataReference::formula("$C$2:$C$9")),
        );
        sheet.add_chart(chart);

        let card = run(|card| Pie3dChart::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::new(65, 1));
        assert_eq!(
            card.details(),
            [
                "3-D pie chart: Chart 2".to_string(),
                "Chart placed at J2:P15".to_string(),
                "Chart data partly correct: Product found, Total missing".to_string(),
            ]
        );
    }

    #[test]
    fn test_pie_chart_skips_other_charts() {
        let mut sheet = Worksheet::new("Farmers & Market");
        sheet.add_chart(Chart::new(ChartKind::ColumnClustered));
        let card = run(|card| Pie3dChart::default().evaluate(&sheet, card));
        assert_eq!(card.score(), Decimal::ZERO);
        assert_eq!(
            card.errors(),
            ["No 3-D pie chart on sheet 'Farmers & Market'".to_string()]
        );
    }
}

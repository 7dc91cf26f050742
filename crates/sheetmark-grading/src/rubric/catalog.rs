//! Built-in projects

use rust_decimal::Decimal;

use super::{
    ChartPatternFill, LegendLayout, NumericAutoFilter, Pie3dChart, RubricRule, RubricTask,
    SheetSelector, SubtotalReport, TitleCellFormat,
};
use crate::registry::Project;

/// Project id of the sales and orders exercise
pub const P09: &str = "P09";

/// P09 "Sales and Orders Report", six tasks worth 32 points
pub fn p09() -> Project {
    let summary = || SheetSelector::named("Summary");
    let tasks = vec![
        RubricTask::new(
            "P09-T1",
            "Apply pattern fill to chart (10% plot area, 50% chart area)",
            Decimal::from(5),
            summary(),
            RubricRule::ChartPatternFill(ChartPatternFill::default()),
        ),
        RubricTask::new(
            "P09-T2",
            "Unmerge A1, apply Title style, 24pt, bold",
            Decimal::from(4),
            SheetSelector::First,
            RubricRule::TitleCellFormat(TitleCellFormat::default()),
        ),
        RubricTask::new(
            "P09-T3",
            "Display legend on right, allow overflow",
            Decimal::from(3),
            summary(),
            RubricRule::LegendLayout(LegendLayout::default()),
        ),
        RubricTask::new(
            "P09-T4",
            "Filter Total column: 34,000 to 45,000",
            Decimal::from(4),
            SheetSelector::First,
            RubricRule::NumericAutoFilter(NumericAutoFilter::default()),
        ),
        RubricTask::new(
            "P09-T5",
            "Subtotal by shirt color, page breaks, Grand Total",
            Decimal::from(8),
            SheetSelector::Named {
                candidates: vec!["Shirt Orders".to_string()],
                or_first: true,
            },
            RubricRule::SubtotalReport(SubtotalReport::default()),
        ),
        RubricTask::new(
            "P09-T6",
            "Create 3D Pie Chart in Farmers & Market sheet",
            Decimal::from(8),
            SheetSelector::Named {
                candidates: ["Farmers & Market", "Farmers & Markets", "Farmer & Market"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                or_first: false,
            },
            RubricRule::Pie3dChart(Pie3dChart::default()),
        ),
    ];

    Project::new(P09, "Sales and Orders Report", tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_p09_rubric() {
        let project = p09();
        assert_eq!(project.id, "P09");
        assert_eq!(project.max_score(), Decimal::from(32));

        let ids: Vec<_> = project.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            ["P09-T1", "P09-T2", "P09-T3", "P09-T4", "P09-T5", "P09-T6"]
        );
    }

    #[test]
    fn test_sub_rule_points_add_up() {
        let title = TitleCellFormat::default();
        assert_eq!(title.points * Decimal::from(4), Decimal::from(4));

        let fill = ChartPatternFill::default();
        assert_eq!(fill.points * Decimal::TWO, Decimal::from(5));

        let subtotal = SubtotalReport::default();
        assert_eq!(
            subtotal.grouping_points + subtotal.page_break_points + subtotal.grand_total_points,
            Decimal::from(8)
        );

        let pie = Pie3dChart::default();
        assert_eq!(
            pie.type_points + pie.placement_points + pie.data_points,
            Decimal::from(8)
        );
    }
}

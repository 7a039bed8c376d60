use polars::prelude::{DataFrame, PolarsResult};

use crate::error::ChartError;
use crate::processing::aggregate::{aggregate, Aggregation};
use crate::processing::filter::{date_bounds, filter_by_date, select_range};
use crate::processing::metrics::DashboardMetrics;
use crate::render::figure::{apply_overrides, build_chart, FigureSpec};
use crate::state::app_state::AppState;
use crate::state::selection::{ChartBlockConfig, CustomChartConfig};

/// Shown in place of a pre-defined chart whose pipeline failed.
pub const BLOCK_WARNING: &str = "Sorry, an error is encountered. Please check your inputs.";
/// Shown in place of the custom chart when it cannot be built.
pub const CUSTOM_WARNING: &str = "Sorry, the chart cannot be generated. Please check your inputs.";

/// Result of running one chart block. A failure stays inside its block.
#[derive(Debug, Clone)]
pub enum ChartOutcome {
    Hidden,
    Rendered {
        figure: FigureSpec,
        /// Filtered and aggregated rows behind the figure.
        data: DataFrame,
    },
    Failed(String),
}

impl ChartOutcome {
    fn from_result(block: &str, result: Result<(FigureSpec, DataFrame), ChartError>) -> Self {
        match result {
            Ok((figure, data)) => ChartOutcome::Rendered { figure, data },
            Err(e) => {
                tracing::warn!("Chart block '{block}' failed: {e}");
                ChartOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn figure(&self) -> Option<&FigureSpec> {
        match self {
            ChartOutcome::Rendered { figure, .. } => Some(figure),
            _ => None,
        }
    }
}

/// Selection → date filter → aggregation → chart for a pre-defined block.
pub fn run_block(table: &DataFrame, block: &ChartBlockConfig) -> ChartOutcome {
    if !block.visible {
        return ChartOutcome::Hidden;
    }
    ChartOutcome::from_result(&block.name, build_block(table, block))
}

fn build_block(table: &DataFrame, block: &ChartBlockConfig) -> Result<(FigureSpec, DataFrame), ChartError> {
    let x = block.x_axis.column();
    let (lo, hi) = select_range(date_bounds(table)?, x, block.date_range);
    let filtered = filter_by_date(table, lo, hi)?;
    let data = aggregate(
        &filtered,
        &block.group_columns(),
        &Aggregation::for_y_axis(block.y_axis),
    )?;
    let figure = build_chart(block.kind, &data, x, block.y_axis.column(), block.color_by.column())?;
    Ok((
        apply_overrides(figure, &block.effective_title(), block.height),
        data,
    ))
}

/// The same pipeline over arbitrary columns chosen in the custom block.
pub fn run_custom_block(table: &DataFrame, custom: &CustomChartConfig) -> ChartOutcome {
    if !custom.visible {
        return ChartOutcome::Hidden;
    }
    ChartOutcome::from_result("Custom chart", build_custom(table, custom))
}

fn build_custom(table: &DataFrame, custom: &CustomChartConfig) -> Result<(FigureSpec, DataFrame), ChartError> {
    let x = custom.x_axis.as_deref().ok_or(ChartError::Unselected("x axis"))?;
    let y = custom.y_axis.as_deref().ok_or(ChartError::Unselected("y axis"))?;
    let color = custom.color_by.as_deref().ok_or(ChartError::Unselected("color"))?;

    let (lo, hi) = select_range(date_bounds(table)?, x, custom.date_range);
    let filtered = filter_by_date(table, lo, hi)?;

    let (data, y) = if custom.group_by.is_empty() {
        (filtered, y.to_string())
    } else {
        let (plan, y) = Aggregation::for_custom(y);
        (aggregate(&filtered, &custom.group_by, &plan)?, y)
    };

    let figure = build_chart(custom.kind, &data, x, &y, color)?;
    Ok((
        apply_overrides(figure, &custom.effective_title(), custom.height),
        data,
    ))
}

/// Everything the central panel shows for one frame.
pub struct DashboardView {
    pub metrics: PolarsResult<DashboardMetrics>,
    pub blocks: Vec<ChartOutcome>,
    pub custom: ChartOutcome,
}

/// Run the metrics and every chart block against the same read-only table.
pub fn render_dashboard(table: &DataFrame, state: &AppState) -> DashboardView {
    DashboardView {
        metrics: DashboardMetrics::compute(table),
        blocks: state.blocks.iter().map(|b| run_block(table, b)).collect(),
        custom: run_custom_block(table, &state.custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::*;
    use crate::data::loader::load_bytes;
    use crate::data::loader::tests::{sample_table, HEADER};
    use crate::data::values::ColumnValues;
    use crate::state::selection::{ChartKind, ColorField, GroupField, XAxis, YAxis};

    fn two_rows() -> DataFrame {
        let text = format!(
            "{HEADER}\n0;01/01/2023;A;Pos;10;7;1;4;6;5\n1;01/01/2023;A;Neg;20;14;2;6;8;7\n"
        );
        load_bytes(text.as_bytes()).unwrap()
    }

    fn block(kind: ChartKind, x: XAxis, y: YAxis, group_by: Vec<GroupField>, color: ColorField) -> ChartBlockConfig {
        ChartBlockConfig {
            name: "Test chart".to_string(),
            kind,
            visible: true,
            x_axis: x,
            y_axis: y,
            group_by,
            color_by: color,
            date_range: None,
            title: None,
            height: 500.0,
        }
    }

    fn rendered_data(outcome: ChartOutcome) -> (FigureSpec, DataFrame) {
        match outcome {
            ChartOutcome::Rendered { figure, data } => (figure, data),
            other => panic!("expected a rendered chart, got {other:?}"),
        }
    }

    #[test]
    fn grouping_by_assay_averages_mean_titer() {
        let table = two_rows();
        let cfg = block(ChartKind::Scatter, XAxis::Assay, YAxis::MeanTiter, vec![GroupField::Assay], ColorField::Assay);
        let (figure, data) = rendered_data(run_block(&table, &cfg));
        assert_eq!(data.height(), 1);
        assert_eq!(ColumnValues::from_table(&data, ASSAY).unwrap().label(0).as_deref(), Some("A"));
        assert_eq!(ColumnValues::from_table(&data, MEAN_TITER).unwrap().coordinate(0), Some(6.0));
        assert_eq!(figure.panels[0].traces[0].points, vec![[0.0, 6.0]]);
    }

    #[test]
    fn counting_without_groups_keeps_raw_rows() {
        let table = two_rows();
        let cfg = block(ChartKind::Bar, XAxis::Testdate, YAxis::ResultsCount, Vec::new(), ColorField::Result);
        // No count column exists on raw rows, so the chart itself fails...
        assert!(matches!(run_block(&table, &cfg), ChartOutcome::Failed(_)));
        // ...but the aggregation step hands the rows through unchanged.
        let data = aggregate(&table, &[], &Aggregation::for_y_axis(YAxis::ResultsCount)).unwrap();
        assert!(data.equals_missing(&table));
        assert!(data.column(RESULTS_COUNT).is_err());
    }

    #[test]
    fn overrides_reach_the_figure() {
        let table = sample_table();
        let mut cfg = block(ChartKind::Line, XAxis::Testdate, YAxis::Gmt, Vec::new(), ColorField::Assay);
        cfg.title = Some("GMT over time".to_string());
        cfg.height = 320.0;
        let (figure, _) = rendered_data(run_block(&table, &cfg));
        assert_eq!(figure.title, "GMT over time");
        assert_eq!(figure.height, 320.0);
    }

    #[test]
    fn date_range_only_applies_to_date_axes() {
        let table = sample_table();
        let narrow = Some((
            chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
        ));
        let mut by_date = block(ChartKind::Scatter, XAxis::Testdate, YAxis::Gmt, Vec::new(), ColorField::Assay);
        by_date.date_range = narrow;
        let (_, data) = rendered_data(run_block(&table, &by_date));
        assert_eq!(data.height(), 2);

        let mut by_age = block(ChartKind::Scatter, XAxis::AgeDays, YAxis::Gmt, Vec::new(), ColorField::Assay);
        by_age.date_range = narrow;
        let (_, data) = rendered_data(run_block(&table, &by_age));
        assert_eq!(data.height(), 5);
    }

    #[test]
    fn hidden_blocks_do_no_work() {
        let mut cfg = block(ChartKind::Box, XAxis::Testdate, YAxis::Gmt, Vec::new(), ColorField::Assay);
        cfg.visible = false;
        assert!(matches!(run_block(&sample_table(), &cfg), ChartOutcome::Hidden));
    }

    #[test]
    fn a_failing_block_leaves_the_rest_of_the_dashboard_alone() {
        let table = sample_table().drop(RESULT).unwrap();
        let mut state = AppState::new();
        // Color by Result: the column is gone, this block must fail.
        state.blocks[0].color_by = ColorField::Result;
        // Group by Result: the aggregation step fails.
        state.blocks[1].group_by = vec![GroupField::Result];

        let view = render_dashboard(&table, &state);
        assert!(matches!(view.blocks[0], ChartOutcome::Failed(_)));
        assert!(matches!(view.blocks[1], ChartOutcome::Failed(_)));
        assert!(view.blocks[2].figure().is_some());
        assert_eq!(view.metrics.unwrap().sample_count, 5);
        assert!(matches!(view.custom, ChartOutcome::Hidden));
    }

    #[test]
    fn default_dashboard_renders_every_block() {
        let table = sample_table();
        let view = render_dashboard(&table, &AppState::new());
        for (outcome, cfg) in view.blocks.iter().zip(AppState::new().blocks.iter()) {
            assert!(outcome.figure().is_some(), "{} did not render", cfg.name);
        }
        let bar = view.blocks[3].figure().unwrap();
        assert_eq!(bar.facet.as_deref(), Some(ASSAY));
    }

    #[test]
    fn custom_block_averages_only_the_chosen_column() {
        let table = sample_table();
        let mut custom = CustomChartConfig {
            visible: true,
            kind: ChartKind::Bar,
            x_axis: Some(ASSAY.to_string()),
            y_axis: Some(GMT.to_string()),
            group_by: vec![ASSAY.to_string()],
            color_by: Some(ASSAY.to_string()),
            ..CustomChartConfig::default()
        };
        let (figure, data) = rendered_data(run_custom_block(&table, &custom));
        assert_eq!(data.width(), 2);
        assert_eq!(figure.facet, None);
        assert_eq!(ColumnValues::from_table(&data, GMT).unwrap().coordinate(1), Some(60.0));

        custom.y_axis = Some(RESULT.to_string());
        let (figure, data) = rendered_data(run_custom_block(&table, &custom));
        assert_eq!(figure.y_label, RESULTS_COUNT);
        assert!(data.column(RESULTS_COUNT).is_ok());
    }

    #[test]
    fn custom_block_failure_is_local() {
        let table = sample_table();
        let custom = CustomChartConfig {
            visible: true,
            x_axis: Some(TESTDATE.to_string()),
            y_axis: Some(ASSAY.to_string()),
            group_by: vec![TESTDATE.to_string()],
            color_by: Some(ASSAY.to_string()),
            ..CustomChartConfig::default()
        };
        assert!(matches!(run_custom_block(&table, &custom), ChartOutcome::Failed(_)));
    }
}

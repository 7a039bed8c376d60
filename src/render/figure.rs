use polars::prelude::DataFrame;

use crate::data::columns::ASSAY;
use crate::data::values::ColumnValues;
use crate::error::ChartError;
use crate::state::selection::ChartKind;

/// How x coordinates of a figure are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Numeric,
    /// Coordinates are days since the Unix epoch.
    Date,
    /// Coordinates are indices into the category list.
    Categorical(Vec<String>),
}

/// Points sharing one color-by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    /// Position of `name` among all color values of the figure, stable across
    /// facet panels.
    pub color_index: usize,
    pub points: Vec<[f64; 2]>,
}

/// One facet of a figure. Unfaceted figures have a single untitled panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub traces: Vec<Trace>,
}

/// Toolkit-independent description of a chart, produced by [`build_chart`]
/// and drawn by `render::plot_view`.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSpec {
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub color_label: String,
    pub x_scale: XScale,
    pub facet: Option<String>,
    pub panels: Vec<Panel>,
    pub title: String,
    pub height: f32,
}

impl FigureSpec {
    pub fn point_count(&self) -> usize {
        self.panels
            .iter()
            .flat_map(|p| p.traces.iter())
            .map(|t| t.points.len())
            .sum()
    }
}

pub fn line_chart(table: &DataFrame, x: &str, y: &str, color: &str) -> Result<FigureSpec, ChartError> {
    figure(ChartKind::Line, table, x, y, color, None)
}

pub fn scatter_plot(table: &DataFrame, x: &str, y: &str, color: &str) -> Result<FigureSpec, ChartError> {
    figure(ChartKind::Scatter, table, x, y, color, None)
}

pub fn box_plot(table: &DataFrame, x: &str, y: &str, color: &str) -> Result<FigureSpec, ChartError> {
    figure(ChartKind::Box, table, x, y, color, None)
}

pub fn violin_plot(table: &DataFrame, x: &str, y: &str, color: &str) -> Result<FigureSpec, ChartError> {
    figure(ChartKind::Violin, table, x, y, color, None)
}

/// Bars are split into one panel per assay, unless the assay already is the
/// x axis.
pub fn bar_chart(table: &DataFrame, x: &str, y: &str, color: &str) -> Result<FigureSpec, ChartError> {
    let facet = (x != ASSAY).then_some(ASSAY);
    figure(ChartKind::Bar, table, x, y, color, facet)
}

/// Dispatch to the constructor of `kind`.
pub fn build_chart(
    kind: ChartKind,
    table: &DataFrame,
    x: &str,
    y: &str,
    color: &str,
) -> Result<FigureSpec, ChartError> {
    match kind {
        ChartKind::Line => line_chart(table, x, y, color),
        ChartKind::Scatter => scatter_plot(table, x, y, color),
        ChartKind::Bar => bar_chart(table, x, y, color),
        ChartKind::Box => box_plot(table, x, y, color),
        ChartKind::Violin => violin_plot(table, x, y, color),
    }
}

pub fn apply_overrides(mut spec: FigureSpec, title: &str, height: f32) -> FigureSpec {
    spec.title = title.to_string();
    spec.height = height;
    spec
}

/// Position of `value` in `order`, appending it on first sight.
fn ordinal(order: &mut Vec<String>, value: &str) -> usize {
    match order.iter().position(|v| v == value) {
        Some(idx) => idx,
        None => {
            order.push(value.to_string());
            order.len() - 1
        }
    }
}

const BLANK_LABEL: &str = "(blank)";

fn figure(
    kind: ChartKind,
    table: &DataFrame,
    x: &str,
    y: &str,
    color: &str,
    facet: Option<&str>,
) -> Result<FigureSpec, ChartError> {
    let x_values = ColumnValues::from_table(table, x)?;
    let y_values = ColumnValues::from_table(table, y)?;
    if !matches!(y_values, ColumnValues::Numeric(_)) {
        return Err(ChartError::NonNumeric(y.to_string()));
    }
    let color_values = ColumnValues::from_table(table, color)?;
    let facet_values = facet
        .map(|name| ColumnValues::from_table(table, name))
        .transpose()?;

    let mut categories: Vec<String> = Vec::new();
    let mut color_order: Vec<String> = Vec::new();
    let mut facet_order: Vec<String> = Vec::new();
    // panels[facet][trace] in first-appearance order
    let mut panels: Vec<Panel> = Vec::new();

    for row in 0..x_values.len() {
        let x_coord = match &x_values {
            ColumnValues::Text(_) => x_values
                .label(row)
                .map(|label| ordinal(&mut categories, &label) as f64),
            _ => x_values.coordinate(row),
        };
        let (Some(xv), Some(yv)) = (x_coord, y_values.coordinate(row)) else {
            continue;
        };

        let color_label = color_values
            .label(row)
            .unwrap_or_else(|| BLANK_LABEL.to_string());
        let color_index = ordinal(&mut color_order, &color_label);

        let panel_idx = match &facet_values {
            Some(values) => {
                let label = values.label(row).unwrap_or_else(|| BLANK_LABEL.to_string());
                ordinal(&mut facet_order, &label)
            }
            None => 0,
        };
        if panel_idx == panels.len() {
            panels.push(Panel {
                title: facet_order.get(panel_idx).cloned().unwrap_or_default(),
                traces: Vec::new(),
            });
        }

        let panel = &mut panels[panel_idx];
        match panel.traces.iter_mut().find(|t| t.color_index == color_index) {
            Some(trace) => trace.points.push([xv, yv]),
            None => panel.traces.push(Trace {
                name: color_label,
                color_index,
                points: vec![[xv, yv]],
            }),
        }
    }

    if panels.is_empty() {
        panels.push(Panel {
            title: String::new(),
            traces: Vec::new(),
        });
    }

    let x_scale = match x_values {
        ColumnValues::Numeric(_) => XScale::Numeric,
        ColumnValues::Date(_) => XScale::Date,
        ColumnValues::Text(_) => XScale::Categorical(categories),
    };

    Ok(FigureSpec {
        kind,
        x_label: x.to_string(),
        y_label: y.to_string(),
        color_label: color.to_string(),
        x_scale,
        facet: facet.map(str::to_string),
        panels,
        title: String::new(),
        height: 0.0,
    })
}

use std::ops::RangeInclusive;

use egui::{Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, PlotUi,
    Points, Polygon,
};

use crate::data::datetime::format_epoch_days;
use crate::processing::statistics::{kernel_density, Distribution};
use crate::render::figure::{FigureSpec, Panel, Trace, XScale};
use crate::state::selection::ChartKind;
use crate::state::theme::category_color;

/// Samples per violin outline.
const VIOLIN_SAMPLES: usize = 64;
/// Fraction of the x step a bar, box or violin group may occupy.
const GROUP_FILL: f64 = 0.8;

/// Draw a figure: title, then one plot per facet panel side by side.
/// `id` must be unique per chart block.
pub fn show_figure(ui: &mut egui::Ui, id: &str, spec: &FigureSpec) {
    ui.label(RichText::new(&spec.title).strong().size(16.0));
    ui.add_space(4.0);

    let plot_height = (spec.height - 32.0).max(120.0);
    let step = x_step(spec);

    if spec.panels.len() <= 1 {
        if let Some(panel) = spec.panels.first() {
            show_panel(ui, &format!("{id}_plot"), spec, panel, plot_height, step);
        }
        return;
    }

    let facet = spec.facet.as_deref().unwrap_or_default();
    ui.columns(spec.panels.len(), |columns| {
        for (i, (column, panel)) in columns.iter_mut().zip(spec.panels.iter()).enumerate() {
            column.vertical_centered(|ui| {
                ui.label(RichText::new(format!("{facet}={}", panel.title)).small());
            });
            show_panel(column, &format!("{id}_facet_{i}"), spec, panel, plot_height - 18.0, step);
        }
    });
}

fn show_panel(ui: &mut egui::Ui, plot_id: &str, spec: &FigureSpec, panel: &Panel, height: f32, step: f64) {
    let mut plot = Plot::new(plot_id.to_string())
        .height(height)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone());

    match &spec.x_scale {
        XScale::Numeric => {}
        XScale::Date => {
            plot = plot
                .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| format_epoch_days(mark.value))
                .label_formatter(|name, value| {
                    let prefix = if name.is_empty() { String::new() } else { format!("{name}\n") };
                    format!("{prefix}{}\n{:.2}", format_epoch_days(value.x), value.y)
                });
        }
        XScale::Categorical(categories) => {
            let categories = categories.clone();
            plot = plot.x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                category_at(&categories, mark.value).unwrap_or_default()
            });
        }
    }

    plot.show(ui, |plot_ui| match spec.kind {
        ChartKind::Line => draw_lines(plot_ui, &panel.traces),
        ChartKind::Scatter => draw_points(plot_ui, &panel.traces),
        ChartKind::Bar => draw_bars(plot_ui, &panel.traces, step),
        ChartKind::Box => draw_boxes(plot_ui, &panel.traces, step),
        ChartKind::Violin => draw_violins(plot_ui, &panel.traces, step),
    });
}

/// Category name for an axis mark that sits on an integer position.
fn category_at(categories: &[String], value: f64) -> Option<String> {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return None;
    }
    categories.get(rounded as usize).cloned()
}

/// Smallest gap between distinct x coordinates across the figure.
fn x_step(spec: &FigureSpec) -> f64 {
    let mut xs: Vec<f64> = spec
        .panels
        .iter()
        .flat_map(|p| p.traces.iter())
        .flat_map(|t| t.points.iter().map(|p| p[0]))
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    xs.windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
        .unwrap_or(1.0)
}

/// Distinct x values of a trace, each with the y values found there, in
/// order of first appearance.
fn values_by_x(trace: &Trace) -> Vec<(f64, Vec<f64>)> {
    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for [x, y] in &trace.points {
        match groups.iter_mut().find(|(gx, _)| gx == x) {
            Some((_, ys)) => ys.push(*y),
            None => groups.push((*x, vec![*y])),
        }
    }
    groups
}

fn sorted_by_x(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Horizontal offset of trace `index` out of `count` side-by-side traces.
fn dodge(index: usize, count: usize, slot: f64) -> f64 {
    (index as f64 - (count as f64 - 1.0) / 2.0) * slot
}

fn draw_lines(plot_ui: &mut PlotUi, traces: &[Trace]) {
    for trace in traces {
        let line = Line::new(PlotPoints::from(sorted_by_x(&trace.points)))
            .name(&trace.name)
            .color(category_color(trace.color_index))
            .width(2.0);
        plot_ui.line(line);
    }
}

fn draw_points(plot_ui: &mut PlotUi, traces: &[Trace]) {
    for trace in traces {
        let points = Points::new(PlotPoints::from(trace.points.clone()))
            .name(&trace.name)
            .color(category_color(trace.color_index))
            .radius(3.5);
        plot_ui.points(points);
    }
}

/// One bar segment of a stacked bar chart.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    x: f64,
    base: f64,
    height: f64,
}

/// Stack the traces of one panel bar by bar. Rows sharing an x within one
/// trace are summed into one segment, and each segment starts where the
/// segments of earlier traces at the same x end.
fn stacked_segments(traces: &[Trace]) -> Vec<Vec<Segment>> {
    let mut xs: Vec<f64> = traces
        .iter()
        .flat_map(|t| t.points.iter().map(|p| p[0]))
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    let mut tops = vec![0.0; xs.len()];

    traces
        .iter()
        .map(|trace| {
            let mut segments: Vec<Segment> = values_by_x(trace)
                .into_iter()
                .filter_map(|(x, ys)| {
                    let slot = xs.iter().position(|v| *v == x)?;
                    let height: f64 = ys.iter().sum();
                    let base = tops[slot];
                    tops[slot] += height;
                    Some(Segment { x, base, height })
                })
                .collect();
            segments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            segments
        })
        .collect()
}

fn draw_bars(plot_ui: &mut PlotUi, traces: &[Trace], step: f64) {
    for (trace, segments) in traces.iter().zip(stacked_segments(traces)) {
        let bars: Vec<Bar> = segments
            .into_iter()
            .map(|s| Bar::new(s.x, s.height).base_offset(s.base).width(step * GROUP_FILL))
            .collect();
        plot_ui.bar_chart(
            BarChart::new(bars)
                .name(&trace.name)
                .color(category_color(trace.color_index)),
        );
    }
}

fn draw_boxes(plot_ui: &mut PlotUi, traces: &[Trace], step: f64) {
    let slot = step * GROUP_FILL / traces.len().max(1) as f64;
    for (i, trace) in traces.iter().enumerate() {
        let color = category_color(trace.color_index);
        let offset = dodge(i, traces.len(), slot);
        let boxes: Vec<BoxElem> = values_by_x(trace)
            .into_iter()
            .filter_map(|(x, ys)| {
                let d = Distribution::compute(&ys)?;
                let spread = BoxSpread::new(d.lower_whisker, d.q1, d.median, d.q3, d.upper_whisker);
                Some(
                    BoxElem::new(x + offset, spread)
                        .box_width(slot * 0.9)
                        .whisker_width(slot * 0.45)
                        .fill(color.gamma_multiply(0.3))
                        .stroke(Stroke::new(1.5, color)),
                )
            })
            .collect();
        plot_ui.box_plot(BoxPlot::new(boxes).name(&trace.name).color(color));
    }
}

/// Mirrored kernel density outline per x value, with a median tick.
fn draw_violins(plot_ui: &mut PlotUi, traces: &[Trace], step: f64) {
    let slot = step * GROUP_FILL / traces.len().max(1) as f64;
    for (i, trace) in traces.iter().enumerate() {
        let color = category_color(trace.color_index);
        let offset = dodge(i, traces.len(), slot);
        for (x, ys) in values_by_x(trace) {
            let center = x + offset;
            let curve = kernel_density(&ys, VIOLIN_SAMPLES);
            let peak = curve.iter().map(|(_, d)| *d).fold(0.0_f64, f64::max);
            if peak <= 0.0 {
                continue;
            }
            let scale = slot * 0.45 / peak;
            let outline = violin_outline(center, scale, &curve);
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(outline))
                    .name(&trace.name)
                    .fill_color(color.gamma_multiply(0.35))
                    .stroke(Stroke::new(1.5, color)),
            );
            if let Some(d) = Distribution::compute(&ys) {
                let half = slot * 0.2;
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[center - half, d.median], [center + half, d.median]]))
                        .color(Color32::WHITE)
                        .width(2.0),
                );
            }
        }
    }
}

/// Closed outline: right half going up the value axis, left half coming back.
fn violin_outline(center: f64, scale: f64, curve: &[(f64, f64)]) -> Vec<[f64; 2]> {
    let right = curve.iter().map(|(v, d)| [center + d * scale, *v]);
    let left = curve.iter().rev().map(|(v, d)| [center - d * scale, *v]);
    right.chain(left).collect()
}

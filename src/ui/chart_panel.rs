use eframe::egui;
use polars::prelude::DataFrame;

use crate::data::values::ColumnValues;
use crate::processing::pipeline::ChartOutcome;
use crate::render::plot_view::show_figure;
use crate::state::theme::Theme;

/// Actions that a chart block can request from the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartAction {
    None,
    ToggleTableView,
    ExportCsv,
    ExportImageSave,
    ExportImageClipboard,
}

fn toolbar_btn(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(egui::Button::new(label).min_size(egui::vec2(0.0, 24.0)))
}

/// Render one chart block: toolbar, then the figure (or its rows), or the
/// warning of a failed pipeline. Hidden blocks draw nothing.
///
/// Returns the requested action and the rect the block occupied, used to crop
/// screenshots.
pub fn show_chart_block(
    ui: &mut egui::Ui,
    key: &str,
    outcome: &ChartOutcome,
    warning: &str,
    theme: &Theme,
    table_view: bool,
) -> (ChartAction, Option<egui::Rect>) {
    let mut action = ChartAction::None;
    if matches!(outcome, ChartOutcome::Hidden) {
        return (action, None);
    }

    let frame_resp = egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .corner_radius(egui::CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            match outcome {
                ChartOutcome::Hidden => {}
                ChartOutcome::Failed(reason) => {
                    ui.add_space(8.0);
                    ui.colored_label(theme.warning_color(), warning)
                        .on_hover_text(reason.as_str());
                    ui.add_space(8.0);
                }
                ChartOutcome::Rendered { figure, data } => {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 4.0;
                        let label = if table_view { "Graph View" } else { "Table View" };
                        if toolbar_btn(ui, label)
                            .on_hover_text("Toggle between chart and data table")
                            .clicked()
                        {
                            action = ChartAction::ToggleTableView;
                        }

                        let export_popup_id = ui.make_persistent_id(format!("export_popup_{key}"));
                        let export_btn_resp =
                            toolbar_btn(ui, "Export").on_hover_text("Export data or image");
                        if export_btn_resp.clicked() {
                            ui.memory_mut(|m| m.toggle_popup(export_popup_id));
                        }
                        egui::popup_below_widget(
                            ui,
                            export_popup_id,
                            &export_btn_resp,
                            egui::PopupCloseBehavior::CloseOnClickOutside,
                            |ui| {
                                ui.set_min_width(160.0);
                                if ui.button("Save as CSV").clicked() {
                                    action = ChartAction::ExportCsv;
                                    ui.memory_mut(|m| m.toggle_popup(export_popup_id));
                                }
                                if ui.button("Save as Image").clicked() {
                                    action = ChartAction::ExportImageSave;
                                    ui.memory_mut(|m| m.toggle_popup(export_popup_id));
                                }
                                if ui.button("Copy Image").clicked() {
                                    action = ChartAction::ExportImageClipboard;
                                    ui.memory_mut(|m| m.toggle_popup(export_popup_id));
                                }
                            },
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                egui::RichText::new(format!("{} rows", data.height()))
                                    .weak()
                                    .small(),
                            )
                            .on_hover_text(format!("{} points plotted", figure.point_count()));
                        });
                    });
                    ui.add_space(4.0);

                    if table_view {
                        ui.label(egui::RichText::new(&figure.title).strong().size(16.0));
                        show_table_view(ui, key, data, figure.height - 32.0);
                    } else {
                        show_figure(ui, key, figure);
                    }
                }
            }
        });

    (action, Some(frame_resp.response.rect))
}

fn show_table_view(ui: &mut egui::Ui, key: &str, data: &DataFrame, height: f32) {
    use egui_extras::{Column, TableBuilder};

    let names: Vec<String> = data
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let columns = match names
        .iter()
        .map(|name| ColumnValues::from_table(data, name))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(columns) => columns,
        Err(e) => {
            ui.label(format!("Cannot show rows: {e}"));
            return;
        }
    };
    if names.is_empty() {
        ui.label("No data.");
        return;
    }

    ui.push_id(format!("{key}_table"), |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(90.0), names.len())
            .min_scrolled_height(height.max(120.0))
            .max_scroll_height(height.max(120.0))
            .header(20.0, |mut header| {
                for name in &names {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, data.height(), |mut row| {
                    let idx = row.index();
                    for column in &columns {
                        row.col(|ui| {
                            ui.label(column.label(idx).unwrap_or_else(|| "-".to_string()));
                        });
                    }
                });
            });
    });
}

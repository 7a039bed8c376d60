use chrono::NaiveDate;
use eframe::egui;
use egui_extras::DatePickerButton;

use crate::data::columns::TESTDATE;
use crate::data::datetime::format_month;
use crate::processing::filter::select_range;
use crate::state::selection::{
    group_options, toggle_group, ChartBlockConfig, ChartKind, ColorField, CustomChartConfig, XAxis,
    YAxis, CUSTOM_HEIGHT_RANGE, FIXED_HEIGHT_RANGE,
};

/// Option controls of one pre-defined chart block.
/// `bounds` are the date bounds of the active table, if it has any dates.
pub fn block_options(ui: &mut egui::Ui, block: &mut ChartBlockConfig, bounds: Option<(NaiveDate, NaiveDate)>) {
    let key = block.name.clone();
    ui.checkbox(&mut block.visible, format!("Show {}", block.name.to_lowercase()));
    if !block.visible {
        return;
    }

    egui::Grid::new(format!("{key}_axes"))
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("X axis");
            egui::ComboBox::from_id_salt(format!("{key}_x"))
                .selected_text(block.x_axis.column())
                .show_ui(ui, |ui| {
                    for axis in XAxis::ALL {
                        ui.selectable_value(&mut block.x_axis, axis, axis.column());
                    }
                });
            ui.end_row();

            ui.label("Y axis");
            egui::ComboBox::from_id_salt(format!("{key}_y"))
                .selected_text(block.y_axis.column())
                .show_ui(ui, |ui| {
                    for axis in YAxis::ALL {
                        ui.selectable_value(&mut block.y_axis, axis, axis.column());
                    }
                });
            ui.end_row();

            ui.label("Color by");
            egui::ComboBox::from_id_salt(format!("{key}_color"))
                .selected_text(block.color_by.column())
                .show_ui(ui, |ui| {
                    for field in ColorField::ALL {
                        ui.selectable_value(&mut block.color_by, field, field.column());
                    }
                });
            ui.end_row();
        });

    ui.label("Group by");
    ui.horizontal_wrapped(|ui| {
        for field in group_options(block.y_axis) {
            let mut selected = block.group_by.contains(&field);
            if ui.checkbox(&mut selected, field.column()).changed() {
                toggle_group(&mut block.group_by, field);
            }
        }
    });

    date_range_picker(ui, &key, block.x_axis.column(), bounds, &mut block.date_range);

    let default_title = block.default_title();
    title_edit(ui, &key, &default_title, &mut block.title);
    ui.add(egui::Slider::new(&mut block.height, FIXED_HEIGHT_RANGE).text("Height (px)"));
}

/// Pair of date pickers bounding the rows of a chart. Only shown while the x
/// axis is the date column; other axes always see the full range.
pub fn date_range_picker(
    ui: &mut egui::Ui,
    key: &str,
    x_column: &str,
    bounds: Option<(NaiveDate, NaiveDate)>,
    range: &mut Option<(NaiveDate, NaiveDate)>,
) {
    let Some(bounds) = bounds else {
        return;
    };
    if x_column != TESTDATE {
        return;
    }

    let (mut lo, mut hi) = select_range(bounds, x_column, *range);
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut lo).id_salt(&format!("{key}_from")))
            .changed();
        ui.label("to");
        changed |= ui
            .add(DatePickerButton::new(&mut hi).id_salt(&format!("{key}_to")))
            .changed();
    });
    ui.label(
        egui::RichText::new(format!(
            "Data covers {} to {}",
            format_month(bounds.0),
            format_month(bounds.1)
        ))
        .weak()
        .small(),
    );
    if changed {
        *range = Some(select_range(bounds, x_column, Some((lo, hi))));
    }
}

/// Single-line title editor. Clearing the text or pressing "Reset" returns
/// to the generated title.
fn title_edit(ui: &mut egui::Ui, key: &str, default_title: &str, title: &mut Option<String>) {
    let mut text = title.clone().unwrap_or_else(|| default_title.to_string());
    ui.horizontal(|ui| {
        ui.label("Title");
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .id_salt(format!("{key}_title"))
                .desired_width(ui.available_width() - 60.0),
        );
        if response.changed() {
            *title = edited_title(&text, default_title);
        }
        if ui
            .add_enabled(title.is_some(), egui::Button::new("Reset").small())
            .clicked()
        {
            *title = None;
        }
    });
}

fn edited_title(text: &str, default_title: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty() && trimmed != default_title).then(|| text.to_string())
}

/// Option controls of the custom chart block over the active table's columns.
pub fn custom_options(
    ui: &mut egui::Ui,
    custom: &mut CustomChartConfig,
    columns: &[String],
    bounds: Option<(NaiveDate, NaiveDate)>,
) {
    ui.checkbox(&mut custom.visible, "Show custom chart");
    if !custom.visible {
        return;
    }

    egui::Grid::new("custom_axes")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Chart type");
            egui::ComboBox::from_id_salt("custom_kind")
                .selected_text(custom.kind.label())
                .show_ui(ui, |ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut custom.kind, kind, kind.label());
                    }
                });
            ui.end_row();

            ui.label("X axis");
            column_combo(ui, "custom_x", columns, &mut custom.x_axis);
            ui.end_row();

            ui.label("Y axis");
            column_combo(ui, "custom_y", columns, &mut custom.y_axis);
            ui.end_row();

            ui.label("Color by");
            column_combo(ui, "custom_color", columns, &mut custom.color_by);
            ui.end_row();
        });

    egui::CollapsingHeader::new(format!("Group by ({})", custom.group_by.len()))
        .id_salt("custom_group_by")
        .show(ui, |ui| {
            for column in columns {
                let mut selected = custom.group_by.contains(column);
                if ui.checkbox(&mut selected, column.as_str()).changed() {
                    toggle_group(&mut custom.group_by, column.clone());
                }
            }
        });

    let x_column = custom.x_axis.clone().unwrap_or_default();
    date_range_picker(ui, "custom", &x_column, bounds, &mut custom.date_range);

    let default_title = custom.default_title();
    title_edit(ui, "custom", &default_title, &mut custom.title);
    ui.add(egui::Slider::new(&mut custom.height, CUSTOM_HEIGHT_RANGE).text("Height (px)"));
}

fn column_combo(ui: &mut egui::Ui, id: &str, columns: &[String], selected: &mut Option<String>) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.as_deref().unwrap_or("-"))
        .width(180.0)
        .show_ui(ui, |ui| {
            for column in columns {
                ui.selectable_value(selected, Some(column.clone()), column.as_str());
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_or_blank_titles_fall_back_to_the_generated_one() {
        let generated = "Box plot: GMT vs. Testdate";
        assert_eq!(edited_title(generated, generated), None);
        assert_eq!(edited_title("   ", generated), None);
        assert_eq!(edited_title("GMT by day", generated).as_deref(), Some("GMT by day"));
    }
}

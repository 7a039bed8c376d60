use eframe::egui;
use crate::data::cache::{read_upload, DatasetCache, Upload};
use crate::data::export::export_table;
use crate::error::{FileError, LoadError};
use crate::processing::filter::date_bounds;
use crate::processing::metrics::format_metric;
use crate::processing::pipeline::{
    render_dashboard, ChartOutcome, DashboardView, BLOCK_WARNING, CUSTOM_WARNING,
};
use crate::state::app_state::{AppState, VERSION};
use crate::state::selection::select_custom_axes;
use crate::ui::chart_panel::{self, ChartAction};
use crate::ui::selectors;
use polars::prelude::DataFrame;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Position of a chart block on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ChartSlot {
    Block(usize),
    Custom,
}

/// Rows of pre-defined blocks: box | violin, line, bar | scatter.
const LAYOUT_ROWS: [&[usize]; 3] = [&[0, 1], &[2], &[3, 4]];

/// What to do when a screenshot arrives.
enum PendingScreenshot {
    SaveFile { slot: ChartSlot, file_name: String },
    Clipboard { slot: ChartSlot },
}

/// Pending async file load result.
struct PendingLoad {
    file_name: String,
    result: Arc<Mutex<Option<Result<Upload, LoadError>>>>,
}

/// The titer results dashboard.
pub struct DashboardApp {
    pub state: AppState,
    cache: DatasetCache,
    /// An error message shown in the footer until dismissed.
    pub error_message: Option<String>,
    /// Whether to show the About window (hidden menu).
    pub show_about: bool,
    /// Blocks currently showing their rows instead of the figure.
    table_views: HashSet<ChartSlot>,
    /// Screen rect of every block drawn last frame, for screenshot cropping.
    block_rects: HashMap<ChartSlot, egui::Rect>,
    pending_load: Option<PendingLoad>,
    pending_screenshot: Option<PendingScreenshot>,
}

fn styled_visuals(state: &AppState) -> egui::Visuals {
    let mut vis = state.theme.visuals();
    vis.window_corner_radius = egui::CornerRadius::same(8);
    vis.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.active.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.open.corner_radius = egui::CornerRadius::same(6);
    vis
}

fn column_names(table: &DataFrame) -> Vec<String> {
    table
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect()
}

/// File name for a chart export, derived from the chart title.
fn export_file_name(title: &str, extension: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "chart" } else { stem };
    format!("{stem}.{extension}")
}

/// RGBA bytes of the part of a screenshot covered by `rect` (in points), or
/// the whole image when there is no rect.
fn crop_screenshot(image: &egui::ColorImage, rect: Option<egui::Rect>, ppp: f32) -> (Vec<u8>, usize, usize) {
    let full_w = image.width();
    let full_h = image.height();
    let Some(rect) = rect else {
        let rgba: Vec<u8> = image
            .pixels
            .iter()
            .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
            .collect();
        return (rgba, full_w, full_h);
    };

    let x0 = ((rect.left() * ppp).max(0.0) as usize).min(full_w);
    let y0 = ((rect.top() * ppp).max(0.0) as usize).min(full_h);
    let x1 = ((rect.right() * ppp).ceil().max(0.0) as usize).min(full_w);
    let y1 = ((rect.bottom() * ppp).ceil().max(0.0) as usize).min(full_h);
    let cw = x1.saturating_sub(x0);
    let ch = y1.saturating_sub(y0);
    let mut cropped = Vec::with_capacity(cw * ch * 4);
    for row in y0..y1 {
        for col in x0..x1 {
            let c = image.pixels[row * full_w + col];
            cropped.extend_from_slice(&[c.r(), c.g(), c.b(), c.a()]);
        }
    }
    (cropped, cw, ch)
}

/// Log a failed layout or export file operation and return the footer text.
fn file_error_message(action: &str, path: &Path, e: &FileError) -> String {
    tracing::error!("Failed to {action} {:?}: {e}", path);
    format!("Failed to {action}: {e}")
}

fn is_dataset_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    ext == "csv" || ext == "txt"
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let state = AppState::new();

        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::proportional(15.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::proportional(14.5),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::proportional(22.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            egui::FontId::proportional(12.0),
        );
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.window_margin = egui::Margin::same(12);
        ctx.set_style(style);
        ctx.set_visuals(styled_visuals(&state));

        Self {
            state,
            cache: DatasetCache::new(),
            error_message: None,
            show_about: false,
            table_views: HashSet::new(),
            block_rects: HashMap::new(),
            pending_load: None,
            pending_screenshot: None,
        }
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Titer results", &["csv", "txt"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Read and parse a dataset file on a worker thread so the UI stays
    /// responsive. Files already in the cache are not parsed again.
    fn load_file(&mut self, path: PathBuf) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let known = self.cache.known_ids();
        let result: Arc<Mutex<Option<Result<Upload, LoadError>>>> = Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            let upload = read_upload(&path, &known);
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(upload);
            }
        });

        self.pending_load = Some(PendingLoad { file_name, result });
    }

    fn poll_pending_load(&mut self) {
        let Some(pending) = self.pending_load.as_ref() else {
            return;
        };
        let finished = match pending.result.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => Some(Err(LoadError::Io(std::io::Error::other(
                "loader thread panicked",
            )))),
        };
        let Some(result) = finished else {
            return;
        };
        let file_name = pending.file_name.clone();
        self.pending_load = None;

        match result {
            Ok(upload) => self.activate_upload(upload),
            Err(e) => {
                tracing::error!("Failed to load {file_name}: {e}");
                self.error_message = Some(format!("Failed to load {file_name}: {e}"));
            }
        }
    }

    /// Make a finished upload the active dataset. Selections that belonged to
    /// the previous dataset are reconciled with the new columns.
    fn activate_upload(&mut self, upload: Upload) {
        let previous = self.cache.active_id().cloned();
        let Some(table) = self.cache.accept(upload) else {
            self.error_message = Some("The dataset is no longer cached, please open it again.".to_string());
            return;
        };
        if previous.as_ref() != self.cache.active_id() {
            self.state.reset_date_ranges();
        }
        self.state.custom.reconcile(&column_names(&table));
        self.error_message = None;
    }

    fn save_layout(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("dashboard_layout.json")
            .add_filter("Dashboard layout", &["json"])
            .save_file()
        {
            if let Err(e) = self.state.save_layout(&path) {
                self.error_message = Some(file_error_message("save layout", &path, &e));
            }
        }
    }

    fn load_layout(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Dashboard layout", &["json"])
            .pick_file()
        {
            match AppState::load_layout(&path) {
                Ok(mut loaded) => {
                    if let Some(table) = self.cache.active() {
                        loaded.custom.reconcile(&column_names(&table));
                    }
                    self.state = loaded;
                }
                Err(e) => {
                    self.error_message = Some(file_error_message("load layout", &path, &e));
                }
            }
        }
    }

    fn export_csv(&mut self, outcome: &ChartOutcome) {
        let ChartOutcome::Rendered { figure, data } = outcome else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(export_file_name(&figure.title, "csv"))
            .add_filter("CSV Files", &["csv"])
            .save_file()
        {
            if let Err(e) = export_table(data, &path) {
                self.error_message = Some(file_error_message("export CSV", &path, &e));
            }
        }
    }

    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.pending_screenshot.is_none() {
            return;
        }
        let mut screenshot_image: Option<Arc<egui::ColorImage>> = None;
        ctx.input(|i| {
            for event in &i.raw.events {
                if let egui::Event::Screenshot { image, .. } = event {
                    screenshot_image = Some(image.clone());
                }
            }
        });
        let Some(color_image) = screenshot_image else {
            return;
        };
        let Some(action) = self.pending_screenshot.take() else {
            return;
        };
        let slot = match &action {
            PendingScreenshot::SaveFile { slot, .. } => *slot,
            PendingScreenshot::Clipboard { slot } => *slot,
        };
        let crop_rect = self.block_rects.get(&slot).copied();
        let (rgba, width, height) = crop_screenshot(&color_image, crop_rect, ctx.pixels_per_point());

        match action {
            PendingScreenshot::SaveFile { file_name, .. } => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name(file_name)
                    .add_filter("PNG Image", &["png"])
                    .save_file()
                {
                    if let Some(img) = image::RgbaImage::from_raw(width as u32, height as u32, rgba) {
                        if let Err(e) = img.save(&path) {
                            tracing::error!("Failed to save image to {:?}: {e}", path);
                            self.error_message = Some(format!("Failed to save image: {e}"));
                        } else {
                            tracing::info!("Saved chart image to {:?}", path);
                        }
                    }
                }
            }
            PendingScreenshot::Clipboard { .. } => match arboard::Clipboard::new() {
                Ok(mut clipboard) => {
                    let img_data = arboard::ImageData {
                        width,
                        height,
                        bytes: std::borrow::Cow::Owned(rgba),
                    };
                    if let Err(e) = clipboard.set_image(img_data) {
                        self.error_message = Some(format!("Failed to copy to clipboard: {e}"));
                    } else {
                        tracing::info!("Copied chart image to clipboard");
                    }
                }
                Err(e) => {
                    self.error_message = Some(format!("Failed to access clipboard: {e}"));
                }
            },
        }
    }

    fn show_options_panel(&mut self, ctx: &egui::Context, table: Option<&Arc<DataFrame>>) {
        let mut open_dialog = false;
        let mut close_dataset = false;
        egui::SidePanel::left("options")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add_space(6.0);
                    ui.heading("Dataset");
                    match (table, self.cache.active_id()) {
                        (Some(table), Some(id)) => {
                            ui.label(egui::RichText::new(&id.name).strong());
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} rows, {} columns",
                                    table.height(),
                                    table.width()
                                ))
                                .weak(),
                            );
                            ui.horizontal(|ui| {
                                if ui
                                    .button("Replace dataset")
                                    .on_hover_text("Open another file in place of this one")
                                    .clicked()
                                {
                                    open_dialog = true;
                                }
                                if ui
                                    .button("Close")
                                    .on_hover_text("Stop showing this dataset; it stays cached")
                                    .clicked()
                                {
                                    close_dataset = true;
                                }
                            });
                        }
                        _ => {
                            if ui.button("Open dataset...").clicked() {
                                open_dialog = true;
                            }
                        }
                    }

                    let Some(table) = table else {
                        return;
                    };
                    let bounds = date_bounds(table).ok();

                    ui.separator();
                    ui.heading("Charts");
                    for block in &mut self.state.blocks {
                        egui::CollapsingHeader::new(block.name.clone())
                            .id_salt(format!("{}_options", block.name))
                            .show(ui, |ui| {
                                selectors::block_options(ui, block, bounds);
                            });
                    }
                    egui::CollapsingHeader::new("Custom chart")
                        .id_salt("custom_options")
                        .show(ui, |ui| {
                            selectors::custom_options(
                                ui,
                                &mut self.state.custom,
                                &column_names(table),
                                bounds,
                            );
                        });
                });
            });
        if close_dataset {
            self.cache.close();
            self.table_views.clear();
            self.block_rects.clear();
        }
        if open_dialog {
            self.open_file_dialog();
        }
    }
}

fn show_metrics(ui: &mut egui::Ui, view: &DashboardView, app: &AppState) {
    let metrics = match &view.metrics {
        Ok(metrics) => metrics,
        Err(e) => {
            ui.colored_label(app.theme.warning_color(), format!("Cannot compute metrics: {e}"));
            return;
        }
    };
    let cards = [
        ("Total Number of Samples", metrics.sample_count.to_string()),
        ("Number of Assays", metrics.assay_count.to_string()),
        ("Minimum GMT", format_metric(metrics.min_gmt)),
        ("Maximum GMT", format_metric(metrics.max_gmt)),
    ];
    ui.columns(cards.len(), |columns| {
        for (column, (title, value)) in columns.iter_mut().zip(cards) {
            egui::Frame::group(column.style())
                .inner_margin(egui::Margin::same(10))
                .corner_radius(egui::CornerRadius::same(8))
                .show(column, |ui| {
                    ui.set_width(ui.available_width());
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new(title).weak());
                        ui.label(
                            egui::RichText::new(value)
                                .size(26.0)
                                .strong()
                                .color(app.theme.metric_color()),
                        );
                    });
                });
        }
    });
}

/// Draw one block and record its action and rect.
fn show_slot(
    ui: &mut egui::Ui,
    slot: ChartSlot,
    outcome: &ChartOutcome,
    app: &AppState,
    table_views: &HashSet<ChartSlot>,
    rects: &mut HashMap<ChartSlot, egui::Rect>,
    actions: &mut Vec<(ChartSlot, ChartAction)>,
) {
    let (key, warning) = match slot {
        ChartSlot::Block(idx) => (format!("block_{idx}"), BLOCK_WARNING),
        ChartSlot::Custom => ("custom".to_string(), CUSTOM_WARNING),
    };
    let (action, rect) = chart_panel::show_chart_block(
        ui,
        &key,
        outcome,
        warning,
        &app.theme,
        table_views.contains(&slot),
    );
    match rect {
        Some(rect) => {
            rects.insert(slot, rect);
        }
        None => {
            rects.remove(&slot);
        }
    }
    if action != ChartAction::None {
        actions.push((slot, action));
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(styled_visuals(&self.state));

        // ------------------------------------------------------------------
        // 0. Screenshots requested last frame, dropped files, finished loads
        // ------------------------------------------------------------------
        self.handle_screenshot(ctx);

        let mut dropped_paths: Vec<PathBuf> = Vec::new();
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    if is_dataset_file(path) {
                        dropped_paths.push(path.clone());
                    }
                }
            }
        });
        // Only the last dropped file becomes the dataset.
        if let Some(path) = dropped_paths.pop() {
            self.load_file(path);
        }

        self.poll_pending_load();

        // --- Header panel ---
        let mut save_layout = false;
        let mut load_layout = false;
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 8)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let heading_response = ui.heading("Titer Dashboard");
                    heading_response.context_menu(|ui| {
                        if ui.button("About").clicked() {
                            self.show_about = true;
                            ui.close_menu();
                        }
                        if ui.button("Reset Layout").clicked() {
                            let theme = self.state.theme;
                            self.state = AppState::new();
                            self.state.theme = theme;
                            if let Some(table) = self.cache.active() {
                                self.state.custom = select_custom_axes(&column_names(&table));
                            }
                            ui.close_menu();
                        }
                    });

                    ui.separator();

                    if ui.button("Save Layout").clicked() {
                        save_layout = true;
                    }
                    if ui.button("Load Layout").clicked() {
                        load_layout = true;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(self.state.theme.toggle_label()).clicked() {
                            self.state.theme = self.state.theme.toggle();
                        }
                        ui.separator();
                        ui.small(format!("v{VERSION}"));
                    });
                });
            });

        if save_layout {
            self.save_layout();
        }
        if load_layout {
            self.load_layout();
        }

        // --- Footer panel ---
        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 6)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let cached = self.cache.len();
                    let label = if cached == 1 { "1 dataset cached".to_string() } else { format!("{cached} datasets cached") };
                    ui.label(egui::RichText::new(label).weak());

                    if let Some(msg) = &self.error_message {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
                        if ui.small_button("dismiss").clicked() {
                            self.error_message = None;
                        }
                    }
                });
            });

        let table = self.cache.active();
        self.show_options_panel(ctx, table.as_ref());

        // ------------------------------------------------------------------
        // 1. Run every block against the active table and draw the results
        // ------------------------------------------------------------------
        let view = table.as_ref().map(|t| render_dashboard(t, &self.state));
        let mut actions: Vec<(ChartSlot, ChartAction)> = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(view) = view.as_ref() else {
                ui.add_space(80.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Welcome to the Titer Dashboard");
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(
                            "Open a ;-delimited results file from the side panel, or drag-and-drop it here.",
                        )
                        .weak(),
                    );
                });
                return;
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                show_metrics(ui, view, &self.state);
                ui.add_space(10.0);

                for row in LAYOUT_ROWS {
                    let visible: Vec<usize> = row
                        .iter()
                        .copied()
                        .filter(|idx| {
                            view.blocks
                                .get(*idx)
                                .is_some_and(|o| !matches!(o, ChartOutcome::Hidden))
                        })
                        .collect();
                    for idx in row.iter().filter(|idx| !visible.contains(idx)) {
                        self.block_rects.remove(&ChartSlot::Block(*idx));
                    }
                    if visible.is_empty() {
                        continue;
                    }
                    ui.columns(visible.len(), |columns| {
                        for (column, idx) in columns.iter_mut().zip(visible.iter()) {
                            show_slot(
                                column,
                                ChartSlot::Block(*idx),
                                &view.blocks[*idx],
                                &self.state,
                                &self.table_views,
                                &mut self.block_rects,
                                &mut actions,
                            );
                        }
                    });
                    ui.add_space(10.0);
                }

                show_slot(
                    ui,
                    ChartSlot::Custom,
                    &view.custom,
                    &self.state,
                    &self.table_views,
                    &mut self.block_rects,
                    &mut actions,
                );
            });
        });

        // ------------------------------------------------------------------
        // 2. Process collected block actions
        // ------------------------------------------------------------------
        for (slot, action) in actions {
            let outcome = view.as_ref().and_then(|v| match slot {
                ChartSlot::Block(idx) => v.blocks.get(idx),
                ChartSlot::Custom => Some(&v.custom),
            });
            match action {
                ChartAction::ToggleTableView => {
                    if !self.table_views.remove(&slot) {
                        self.table_views.insert(slot);
                    }
                }
                ChartAction::ExportCsv => {
                    if let Some(outcome) = outcome {
                        self.export_csv(outcome);
                    }
                }
                ChartAction::ExportImageSave => {
                    let title = outcome
                        .and_then(ChartOutcome::figure)
                        .map(|figure| figure.title.as_str())
                        .unwrap_or_default();
                    self.pending_screenshot = Some(PendingScreenshot::SaveFile {
                        slot,
                        file_name: export_file_name(title, "png"),
                    });
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
                }
                ChartAction::ExportImageClipboard => {
                    self.pending_screenshot = Some(PendingScreenshot::Clipboard { slot });
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
                }
                ChartAction::None => {}
            }
        }

        // Show loading indicator
        if let Some(pending) = &self.pending_load {
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading {}...", pending.file_name));
                    });
                });
            ctx.request_repaint();
        }

        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .default_width(320.0)
                .show(ctx, |ui| {
                    ui.heading("Titer Dashboard");
                    ui.label(format!("Version: {VERSION}"));
                    ui.add_space(4.0);
                    ui.label("Interactive exploration of titer and assay results.");
                    ui.add_space(10.0);
                    ui.label("Right-click the title for this menu.");
                });
        }
    }
}

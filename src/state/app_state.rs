use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FileError;
use crate::state::selection::{ChartBlockConfig, ChartKind, CustomChartConfig, GroupField};
use crate::state::theme::Theme;

pub const VERSION: &str = "0.1.0";

/// Explicit per-session configuration: every chart block's selections.
/// Passed by reference into the pipeline each frame and saved as a layout
/// file; it never holds data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub blocks: Vec<ChartBlockConfig>,
    pub custom: CustomChartConfig,
    pub theme: Theme,
}

impl AppState {
    pub fn new() -> Self {
        use GroupField::{Assay, Result, Testdate, Gmt};

        let blocks = vec![
            ChartBlockConfig::predefined("Box plot", ChartKind::Box, (2, 3), &[], 0),
            ChartBlockConfig::predefined("Violin plot", ChartKind::Violin, (2, 3), &[], 0),
            ChartBlockConfig::predefined(
                "Line chart",
                ChartKind::Line,
                (2, 3),
                &[Testdate, Gmt, Assay],
                0,
            ),
            ChartBlockConfig::predefined(
                "Bar chart",
                ChartKind::Bar,
                (2, 4),
                &[Assay, Testdate, Result],
                1,
            ),
            ChartBlockConfig::predefined(
                "Scatter plot",
                ChartKind::Scatter,
                (0, 3),
                &[Testdate, Gmt, Assay],
                0,
            ),
        ];

        Self {
            blocks,
            custom: CustomChartConfig::default(),
            theme: Theme::default(),
        }
    }

    /// Write the layout (selections only, never data) as pretty JSON.
    pub fn save_layout(&self, path: &Path) -> Result<(), FileError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Layout saved to {:?}", path);
        Ok(())
    }

    pub fn load_layout(path: &Path) -> Result<Self, FileError> {
        let json = std::fs::read_to_string(path)?;
        let state = serde_json::from_str(&json)?;
        tracing::info!("Layout loaded from {:?}", path);
        Ok(state)
    }

    /// Forget date ranges chosen against a previous dataset.
    pub fn reset_date_ranges(&mut self) {
        for block in &mut self.blocks {
            block.date_range = None;
        }
        self.custom.date_range = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::selection::{ColorField, XAxis, YAxis};

    #[test]
    fn default_dashboard_matches_the_layout() {
        let state = AppState::new();
        assert_eq!(state.blocks.len(), 5);
        assert!(!state.custom.visible);

        let bar = &state.blocks[3];
        assert_eq!(bar.name, "Bar chart");
        assert_eq!(bar.x_axis, XAxis::Testdate);
        assert_eq!(bar.y_axis, YAxis::ResultsCount);
        assert_eq!(bar.group_by, vec![GroupField::Assay, GroupField::Testdate, GroupField::Result]);
        assert_eq!(bar.color_by, ColorField::Result);

        let scatter = &state.blocks[4];
        assert_eq!(scatter.name, "Scatter plot");
        assert_eq!(scatter.x_axis, XAxis::AgeDays);
        assert_eq!(scatter.y_axis, YAxis::Gmt);
    }

    #[test]
    fn layout_survives_json() {
        let mut state = AppState::new();
        state.blocks[0].title = Some("Custom title".to_string());
        state.custom.visible = true;
        let json = serde_json::to_string_pretty(&state).unwrap();
        let restored: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.blocks[0].effective_title(), "Custom title");
        assert!(restored.custom.visible);
        assert_eq!(restored.theme, state.theme);
    }

    #[test]
    fn layout_files_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("titerdash_layout_{}.json", std::process::id()));
        let mut state = AppState::new();
        state.blocks[2].visible = false;
        state.theme = state.theme.toggle();
        state.save_layout(&path).unwrap();

        let restored = AppState::load_layout(&path).unwrap();
        assert!(!restored.blocks[2].visible);
        assert_eq!(restored.theme, state.theme);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_layout_is_rejected() {
        let path = std::env::temp_dir().join(format!("titerdash_bad_layout_{}.json", std::process::id()));
        std::fs::write(&path, "{\"blocks\": 3}").unwrap();
        assert!(matches!(AppState::load_layout(&path), Err(FileError::Json(_))));
        std::fs::remove_file(&path).unwrap();
    }
}

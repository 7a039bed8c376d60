use egui::{Color32, Visuals};
use serde::{Deserialize, Serialize};

/// Qualitative palette assigned to color-by categories in order of appearance.
pub const CATEGORY_PALETTE: [[u8; 3]; 10] = [
    [99, 110, 250],  // Indigo
    [239, 85, 59],   // Vermilion
    [0, 204, 150],   // Teal
    [171, 99, 250],  // Violet
    [255, 161, 90],  // Orange
    [25, 211, 243],  // Cyan
    [255, 102, 146], // Pink
    [182, 232, 128], // Lime
    [255, 151, 255], // Magenta
    [254, 203, 82],  // Amber
];

pub fn category_color(index: usize) -> Color32 {
    let [r, g, b] = CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()];
    Color32::from_rgb(r, g, b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        }
    }

    /// Text color of the large numbers on the metric cards.
    pub fn metric_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(235, 235, 235),
            Theme::Light => Color32::from_rgb(30, 30, 30),
        }
    }

    pub fn warning_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(255, 200, 80),
            Theme::Light => Color32::from_rgb(170, 110, 0),
        }
    }

    /// Label of the button that switches to the other theme.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Light Mode",
            Theme::Light => "Dark Mode",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

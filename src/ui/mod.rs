pub mod chart_panel;
pub mod selectors;

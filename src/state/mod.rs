pub mod app_state;
pub mod selection;
pub mod theme;

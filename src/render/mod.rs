pub mod figure;
pub mod plot_view;

pub mod app;
pub mod render;
pub mod settings;
pub mod theme;
pub mod visualization;

pub use app::{UiConfig, run};

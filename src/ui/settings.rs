// Settings persistence and management.

mod data;
mod palette;
mod persistence;
mod ribbon;
mod signal;

pub use persistence::SettingsHandle;

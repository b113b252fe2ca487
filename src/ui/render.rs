pub mod geometry;
pub mod ribbon;
pub mod sprite;

//! Audio sources feeding the ribbon.

pub mod signal;

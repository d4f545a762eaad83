//! Foundation module - Core utilities shared by every layer
//!
//! - Logging setup on top of the `log` facade
//! - Frame timing

pub mod logging;
pub mod time;

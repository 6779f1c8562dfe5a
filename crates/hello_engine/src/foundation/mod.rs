//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Time management and frame pacing
//! - Scoped resource ownership
//! - Logging utilities

pub mod logging;
pub mod resource;
pub mod time;

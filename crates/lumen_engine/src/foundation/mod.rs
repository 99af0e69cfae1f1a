//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the transformation triple
//! - Colors
//! - Frame timing
//! - Logging bootstrap

pub mod color;
pub mod logging;
pub mod math;
pub mod time;

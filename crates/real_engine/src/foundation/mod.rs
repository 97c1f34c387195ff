//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and transforms
//! - Colors
//! - Time management
//! - Logging setup

pub mod color;
pub mod logging;
pub mod math;
pub mod time;

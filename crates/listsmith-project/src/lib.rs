//! Project settings and CMakeLists.txt generation.
//!
//! This crate provides:
//! - Project settings format (`listsmith.toml`)
//! - Placeholder values and custom command types derived from settings
//! - A generator that writes a fresh lists document or updates an existing one
//!
//! # Example
//!
//! ```toml
//! # listsmith.toml
//! [project]
//! name = "blink"
//!
//! [board]
//! id = "uno"
//! port = "/dev/ttyUSB0"
//!
//! [build]
//! sources = ["blink.cpp"]
//! arduino_libs = ["Wire"]
//! ```

mod config;
mod error;
mod generator;

pub use config::{
    BoardConfig, BuildConfig, CommandConfig, ProjectConfig, ProjectKind, ProjectSettings,
    SettingValue,
};
pub use error::{ProjectError, Result};
pub use generator::{Generator, UpdateSummary};

// src/config/mod.rs

//! Configuration loading and validation for hookrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a hook file from disk (`loader.rs`).
//! - Validate settings and hook routes (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, HookConfig, RawConfigFile, SettingsSection};
pub use validate::validate_raw_config;

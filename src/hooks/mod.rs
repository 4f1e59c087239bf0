// src/hooks/mod.rs

//! Hook definitions and the route registry built from them.

pub mod definition;
pub mod registry;

pub use definition::{route_path, HookDefinition};
pub use registry::HookRegistry;

// src/hooks/definition.rs

use std::path::{Path, PathBuf};

use crate::config::HookConfig;
use crate::errors::{HookrunError, Result};

/// One configured hook: a route name plus what to run for it.
///
/// Immutable once built; shared between the registry and its route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDefinition {
    name: String,
    route: String,
    workdir: Option<PathBuf>,
    command: Option<String>,
    inline: Option<String>,
}

impl HookDefinition {
    /// Create a hook with no command attached. Fails if `name` cannot be used
    /// as a route.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let route = route_path(&name)?;
        Ok(Self {
            name,
            route,
            workdir: None,
            command: None,
            inline: None,
        })
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into()).filter(|c| !c.is_empty());
        self
    }

    pub fn with_inline(mut self, script: impl Into<String>) -> Self {
        self.inline = Some(script.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP path this hook is served at (`"/" + name`).
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn inline(&self) -> Option<&str> {
        self.inline.as_deref()
    }
}

impl TryFrom<&HookConfig> for HookDefinition {
    type Error = HookrunError;

    fn try_from(cfg: &HookConfig) -> std::result::Result<Self, Self::Error> {
        let mut def = HookDefinition::new(cfg.name.clone())?;
        if let Some(dir) = cfg.workdir_path() {
            def = def.with_workdir(dir);
        }
        if let Some(command) = &cfg.command {
            def = def.with_command(command.clone());
        }
        if let Some(inline) = &cfg.inline {
            def = def.with_inline(inline.clone());
        }
        Ok(def)
    }
}

/// Derive the route path for a hook name.
///
/// Names may contain several `/`-separated segments (`ci/build`), but no
/// segment may be empty, `.` or `..`, so the derived path never escapes or
/// aliases another route after normalization.
///
/// Only ASCII letters, digits, `-`, `.`, `_` and `~` are allowed inside a
/// segment. The router matches the raw request path, so any character a
/// client would have to percent-encode could never be reached.
pub fn route_path(name: &str) -> Result<String> {
    let invalid = |reason: &str| HookrunError::InvalidHookName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if let Some(c) = name.chars().find(|&c| c != '/' && !is_unreserved(c)) {
        return Err(invalid(&format!(
            "character {c:?} is not allowed; use ASCII letters, digits, '-', '.', '_', '~' and '/'"
        )));
    }
    for segment in name.split('/') {
        match segment {
            "" => return Err(invalid("name must not have empty path segments")),
            "." | ".." => return Err(invalid("name must not contain '.' or '..' segments")),
            _ => {}
        }
    }

    Ok(format!("/{name}"))
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

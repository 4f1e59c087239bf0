// src/hooks/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::{HookrunError, Result};
use crate::hooks::HookDefinition;

/// Route path -> hook definition, built once at startup.
///
/// There is no way to add or remove entries afterwards, so the registry can
/// be shared freely between request tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    routes: BTreeMap<String, Arc<HookDefinition>>,
}

impl HookRegistry {
    pub fn from_definitions(definitions: impl IntoIterator<Item = HookDefinition>) -> Result<Self> {
        let mut routes = BTreeMap::new();
        for def in definitions {
            let route = def.route().to_string();
            if routes.contains_key(&route) {
                return Err(HookrunError::DuplicateRoute(format!(
                    "hook '{}' maps to {} which is already taken",
                    def.name(),
                    route
                )));
            }
            routes.insert(route, Arc::new(def));
        }
        Ok(Self { routes })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let definitions = cfg
            .hooks
            .iter()
            .map(HookDefinition::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::from_definitions(definitions)
    }

    pub fn get(&self, route: &str) -> Option<&Arc<HookDefinition>> {
        self.routes.get(route)
    }

    /// Iterate `(route, definition)` pairs, ordered by route.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<HookDefinition>)> {
        self.routes.iter().map(|(route, def)| (route.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

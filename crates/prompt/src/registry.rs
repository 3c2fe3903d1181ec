//! The template registry.
//!
//! The registry owns the current snapshot: the name to template map plus the
//! tool and prompt definitions derived from it. A snapshot is only ever
//! replaced as a whole, under the write lock, so readers see either the
//! previous set of templates or the new one.

use crate::projector::{prompt_definition, tool_definition, PromptDefinition, ToolDefinition};
use crate::types::Template;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tool and prompt definitions of one snapshot, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tools: Vec<ToolDefinition>,
    pub prompts: Vec<PromptDefinition>,
}

#[derive(Debug, Default)]
struct Snapshot {
    templates: BTreeMap<String, Template>,
    catalog: Catalog,
}

/// Thread-safe holder of the active templates.
#[derive(Debug, Default)]
pub struct Registry {
    snapshot: RwLock<Snapshot>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `templates`.
    ///
    /// When two templates share a name the later one wins. Returns the
    /// number of templates now active.
    pub fn rebuild(&self, templates: Vec<Template>) -> usize {
        let mut snapshot = self.write();

        snapshot.templates.clear();
        for template in templates {
            let name = template.name.clone();
            if snapshot.templates.insert(name.clone(), template).is_some() {
                tracing::warn!("Template with name {:?} already loaded, overwriting", name);
            }
        }

        let catalog = Catalog {
            tools: snapshot.templates.values().map(tool_definition).collect(),
            prompts: snapshot.templates.values().map(prompt_definition).collect(),
        };
        snapshot.catalog = catalog;

        for name in snapshot.templates.keys() {
            tracing::info!("Registered template: {}", name);
        }

        let count = snapshot.templates.len();
        tracing::info!("Loaded {} templates", count);
        count
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<Template> {
        self.read().templates.get(name).cloned()
    }

    /// Names of all active templates, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().templates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().templates.is_empty()
    }

    /// Definitions derived from the active templates.
    pub fn catalog(&self) -> Catalog {
        self.read().catalog.clone()
    }

    // The snapshot is swapped as a unit, so a poisoned lock still guards a
    // consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }
}

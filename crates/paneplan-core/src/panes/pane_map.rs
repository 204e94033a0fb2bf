use std::collections::BTreeMap;

use tracing::debug;

use crate::executor::errors::ExecutionError;

/// Virtual-to-real pane mapping owned by a single execution.
///
/// Keys are kept ordered so descendant lookups are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaneMap {
    entries: BTreeMap<String, String>,
}

impl PaneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, virtual_id: impl Into<String>, real_id: impl Into<String>) {
        self.entries.insert(virtual_id.into(), real_id.into());
    }

    pub fn get(&self, virtual_id: &str) -> Option<&str> {
        self.entries.get(virtual_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Find the real pane backing `virtual_id`.
    ///
    /// Lookup order: exact entry, then the nearest registered ancestor (the result is
    /// cached under `virtual_id`), then the first registered descendant in key order.
    pub fn resolve(&mut self, step_id: &str, virtual_id: &str) -> Result<String, ExecutionError> {
        if let Some(real) = self.entries.get(virtual_id) {
            return Ok(real.clone());
        }

        let mut ancestor = virtual_id;
        while let Some(idx) = ancestor.rfind('.') {
            ancestor = &ancestor[..idx];
            if let Some(real) = self.entries.get(ancestor).cloned() {
                debug!(
                    event = "core.panes.resolve_ancestor_hit",
                    virtual_id = virtual_id,
                    ancestor = ancestor,
                    real_id = %real
                );
                self.entries.insert(virtual_id.to_string(), real.clone());
                return Ok(real);
            }
        }

        let prefix = format!("{virtual_id}.");
        if let Some((descendant, real)) = self
            .entries
            .range(prefix.clone()..)
            .next()
            .filter(|(key, _)| key.starts_with(&prefix))
        {
            debug!(
                event = "core.panes.resolve_descendant_hit",
                virtual_id = virtual_id,
                descendant = %descendant,
                real_id = %real
            );
            return Ok(real.clone());
        }

        Err(ExecutionError::InvalidPane {
            step_id: step_id.to_string(),
            pane_id: virtual_id.to_string(),
        })
    }
}

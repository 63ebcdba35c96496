//! Active layer selection.
//!
//! Tracks which overlay layers a view currently shows. Layers that share a
//! group are linked: toggling any member switches the whole group on or off
//! together, so the selection never holds a partial group.

use std::collections::BTreeSet;

use map_common::{MapError, MapResult};

use crate::registry::LayerRegistry;

/// The set of currently enabled layer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLayerSet {
    ids: BTreeSet<String>,
}

impl ActiveLayerSet {
    /// The selection a new view starts with.
    pub fn defaults(registry: &LayerRegistry) -> Self {
        let ids = registry
            .iter()
            .filter(|l| l.default_active)
            .map(|l| l.id.clone())
            .collect();
        Self { ids }
    }

    /// Build a selection from explicit ids.
    ///
    /// Unknown ids are dropped. If any member of a linked group is named,
    /// the whole group is included.
    pub fn from_ids<I, S>(registry: &LayerRegistry, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for id in ids {
            let Some(layer) = registry.get(id.as_ref()) else {
                continue;
            };
            match &layer.group {
                Some(group) => {
                    for member in registry.group_members(group) {
                        set.insert(member.to_string());
                    }
                }
                None => {
                    set.insert(layer.id.clone());
                }
            }
        }
        Self { ids: set }
    }

    /// Toggle a layer on or off. Group members switch together.
    pub fn toggle(&mut self, registry: &LayerRegistry, id: &str) -> MapResult<()> {
        let layer = registry
            .get(id)
            .ok_or_else(|| MapError::LayerNotFound(id.to_string()))?;

        let members: Vec<String> = match &layer.group {
            Some(group) => registry
                .group_members(group)
                .into_iter()
                .map(String::from)
                .collect(),
            None => vec![layer.id.clone()],
        };

        let any_active = members.iter().any(|m| self.ids.contains(m));
        for member in members {
            if any_active {
                self.ids.remove(&member);
            } else {
                self.ids.insert(member);
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_overlays_not_base_layers() {
        let registry = LayerRegistry::builtin();
        let active = ActiveLayerSet::defaults(&registry);

        assert!(!active.contains("skaermkort"));
        assert!(!active.contains("ortofoto"));
        assert!(active.contains("skovkort"));
        assert!(active.contains("ao"));
        assert!(active.contains("beregnetrute"));
        assert_eq!(active.len(), 6);
    }

    #[test]
    fn test_toggle_single_layer() {
        let registry = LayerRegistry::builtin();
        let mut active = ActiveLayerSet::defaults(&registry);

        active.toggle(&registry, "ao").unwrap();
        assert!(!active.contains("ao"));

        active.toggle(&registry, "ao").unwrap();
        assert!(active.contains("ao"));
    }

    #[test]
    fn test_toggle_unknown_layer() {
        let registry = LayerRegistry::builtin();
        let mut active = ActiveLayerSet::defaults(&registry);
        assert!(active.toggle(&registry, "bogus").is_err());
    }

    #[test]
    fn test_group_toggles_atomically() {
        let registry = LayerRegistry::builtin();
        let mut active = ActiveLayerSet::defaults(&registry);

        // All three road-theme members start active; one toggle removes all.
        active.toggle(&registry, "veje").unwrap();
        assert!(!active.contains("veje"));
        assert!(!active.contains("containermapsymbols"));
        assert!(!active.contains("vejemapsymbols"));

        // Toggling a different member restores the whole group.
        active.toggle(&registry, "vejemapsymbols").unwrap();
        assert!(active.contains("veje"));
        assert!(active.contains("containermapsymbols"));
        assert!(active.contains("vejemapsymbols"));
    }

    #[test]
    fn test_toggle_enables_whole_group_when_none_active() {
        let registry = LayerRegistry::builtin();
        let mut active = ActiveLayerSet::from_ids(&registry, ["ao"]);

        active.toggle(&registry, "containermapsymbols").unwrap();
        for id in ["veje", "containermapsymbols", "vejemapsymbols"] {
            assert!(active.contains(id), "{}", id);
        }
        assert_eq!(active.len(), 4);
    }

    #[test]
    fn test_from_ids_expands_groups_and_drops_unknown() {
        let registry = LayerRegistry::builtin();
        let active = ActiveLayerSet::from_ids(&registry, ["veje", "skovkort", "nope"]);

        assert!(active.contains("veje"));
        assert!(active.contains("containermapsymbols"));
        assert!(active.contains("vejemapsymbols"));
        assert!(active.contains("skovkort"));
        assert!(!active.contains("nope"));
        assert_eq!(active.len(), 4);
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::compiler::behavior::Behavior;
use crate::compiler::expression::Expression;
use std::collections::HashMap;

/// The compiled form of one process definition.
///
/// Maps every node ID to its behavior and every conditional sequence flow ID
/// to its compiled condition. A map is only produced when the whole definition
/// compiled; there is no partially populated `BehaviorMap`.
///
/// # Examples
/// ```ignore
/// use the_conductor::compiler::{Behavior, BehaviorMap, LeafBehavior};
///
/// let mut behaviors = BehaviorMap::new();
/// behaviors.insert(
///     "start".to_string(),
///     Behavior::from(LeafBehavior::NoneStartEvent { node_id: "start".to_string() }),
/// );
///
/// assert!(behaviors.contains_key("start"));
/// assert_eq!(behaviors.get("start").map(Behavior::label), Some("none_start_event"));
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct BehaviorMap {
    behaviors: HashMap<String, Behavior>,
    conditions: HashMap<String, Expression>,
}

impl BehaviorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: String, behavior: Behavior) {
        self.behaviors.insert(node_id, behavior);
    }

    pub fn get(&self, node_id: &str) -> Option<&Behavior> {
        self.behaviors.get(node_id)
    }

    pub fn contains_key(&self, node_id: &str) -> bool {
        self.behaviors.contains_key(node_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.behaviors.keys()
    }

    /// Node IDs in lexical order, for stable output.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Behavior)> {
        self.behaviors.iter()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    pub fn insert_condition(&mut self, flow_id: String, condition: Expression) {
        self.conditions.insert(flow_id, condition);
    }

    /// Compiled condition of a sequence flow; `None` for unconditional flows.
    pub fn condition(&self, flow_id: &str) -> Option<&Expression> {
        self.conditions.get(flow_id)
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }
}

impl std::fmt::Debug for BehaviorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorMap")
            .field("behavior_count", &self.behaviors.len())
            .field("node_ids", &self.sorted_ids())
            .field("condition_count", &self.conditions.len())
            .finish()
    }
}

impl From<HashMap<String, Behavior>> for BehaviorMap {
    fn from(behaviors: HashMap<String, Behavior>) -> Self {
        Self {
            behaviors,
            conditions: HashMap::new(),
        }
    }
}

impl From<BehaviorMap> for HashMap<String, Behavior> {
    fn from(map: BehaviorMap) -> Self {
        map.behaviors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::behavior::LeafBehavior;

    fn leaf(node_id: &str) -> Behavior {
        Behavior::from(LeafBehavior::Task {
            node_id: node_id.to_string(),
        })
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut map = BehaviorMap::new();
        assert!(map.is_empty());

        map.insert("b".to_string(), leaf("b"));
        map.insert("a".to_string(), leaf("a"));
        map.insert_condition("f1".to_string(), Expression::deferred("${approved}"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.sorted_ids(), vec!["a", "b"]);
        assert!(map.contains_key("a"));
        assert!(map.get("missing").is_none());
        assert_eq!(map.condition("f1").map(Expression::text), Some("${approved}"));
        assert!(map.condition("f2").is_none());
        assert_eq!(map.condition_count(), 1);
    }

    #[test]
    fn test_hashmap_conversions() {
        let mut raw = HashMap::new();
        raw.insert("task".to_string(), leaf("task"));

        let map = BehaviorMap::from(raw);
        assert!(map.contains_key("task"));
        assert_eq!(map.condition_count(), 0);

        let back: HashMap<String, Behavior> = map.into();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_debug_lists_ids() {
        let mut map = BehaviorMap::new();
        map.insert("end".to_string(), leaf("end"));
        let debug = format!("{:?}", map);
        assert!(debug.contains("behavior_count: 1"));
        assert!(debug.contains("\"end\""));
    }
}

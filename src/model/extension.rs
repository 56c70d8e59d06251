// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One vendor attribute, e.g. `conductor:class="com.acme.Sender"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAttribute {
    pub name: String,
    pub value: String,
}

/// Vendor extension attributes keyed by namespace prefix.
///
/// Lookups are name based: the first attribute with a matching name inside the
/// requested namespace wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionAttributes(pub BTreeMap<String, Vec<ExtensionAttribute>>);

impl ExtensionAttributes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, namespace: &str, name: &str, value: &str) {
        self.0
            .entry(namespace.to_string())
            .or_default()
            .push(ExtensionAttribute {
                name: name.to_string(),
                value: value.to_string(),
            });
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, namespace: &str, name: &str, value: &str) -> Self {
        self.insert(namespace, name, value);
        self
    }

    /// Remove every attribute called `name` from `namespace`.
    pub fn remove(&mut self, namespace: &str, name: &str) {
        if let Some(attributes) = self.0.get_mut(namespace) {
            attributes.retain(|attr| attr.name != name);
        }
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&str> {
        self.0
            .get(namespace)?
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_scoped_to_namespace() {
        let attrs = ExtensionAttributes::new()
            .with("conductor", "class", "com.acme.Sender")
            .with("other", "delegateExpression", "${sender}");

        assert_eq!(attrs.get("conductor", "class"), Some("com.acme.Sender"));
        assert_eq!(attrs.get("conductor", "delegateExpression"), None);
        assert_eq!(attrs.get("missing", "class"), None);
    }

    #[test]
    fn first_matching_attribute_wins() {
        let attrs = ExtensionAttributes::new()
            .with("conductor", "class", "first")
            .with("conductor", "class", "second");
        assert_eq!(attrs.get("conductor", "class"), Some("first"));
    }

    #[test]
    fn remove_drops_all_matches() {
        let mut attrs = ExtensionAttributes::new()
            .with("conductor", "class", "first")
            .with("conductor", "delegateExpression", "${x}");
        attrs.remove("conductor", "class");
        assert_eq!(attrs.get("conductor", "class"), None);
        assert!(!attrs.is_empty());
    }
}

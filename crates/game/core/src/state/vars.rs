use std::collections::{BTreeMap, BTreeSet};

use crate::state::{Coord, Value};

/// Variables and tags shared by global, tile and unit scopes.
///
/// Ordered containers keep iteration (and therefore digests and log output)
/// stable across runs.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarBag {
    #[cfg_attr(feature = "serde", serde(default))]
    vars: BTreeMap<String, Value>,
    #[cfg_attr(feature = "serde", serde(default))]
    tags: BTreeSet<String>,
}

impl VarBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(vars: BTreeMap<String, Value>, tags: BTreeSet<String>) -> Self {
        Self { vars, tags }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Integer read; absent keys read as 0.
    pub fn int(&self, key: &str) -> i64 {
        self.vars.get(key).map_or(0, Value::as_int)
    }

    /// Float read; absent keys read as 0.0.
    pub fn float(&self, key: &str) -> f64 {
        self.vars.get(key).map_or(0.0, Value::as_float)
    }

    /// Boolean read; absent keys read as false.
    pub fn flag(&self, key: &str) -> bool {
        self.vars.get(key).is_some_and(Value::as_bool)
    }

    /// String read; absent keys read as the empty string.
    pub fn text(&self, key: &str) -> String {
        self.vars.get(key).map(Value::as_text).unwrap_or_default()
    }

    pub fn coord(&self, key: &str) -> Option<Coord> {
        self.vars.get(key).and_then(Value::as_coord)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Copy-with-change
    // ------------------------------------------------------------------

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_var(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn without_tag(mut self, tag: &str) -> Self {
        self.tags.remove(tag);
        self
    }

    /// Adds `delta` to the numeric value at `key` (absent reads as 0).
    #[must_use]
    pub fn modified(self, key: &str, delta: &Value) -> Self {
        let current = self.vars.get(key).cloned().unwrap_or_default();
        let next = current.add(delta);
        self.with_var(key, next)
    }
}

/// Implements the var/tag accessors and copy-with-change helpers for a state
/// struct that stores its data in a `bag: VarBag` field.
macro_rules! impl_var_scope {
    ($ty:ty) => {
        impl $ty {
            pub fn bag(&self) -> &$crate::state::VarBag {
                &self.bag
            }

            pub fn get(&self, key: &str) -> Option<&$crate::state::Value> {
                self.bag.get(key)
            }

            pub fn int(&self, key: &str) -> i64 {
                self.bag.int(key)
            }

            pub fn float(&self, key: &str) -> f64 {
                self.bag.float(key)
            }

            pub fn flag(&self, key: &str) -> bool {
                self.bag.flag(key)
            }

            pub fn text(&self, key: &str) -> String {
                self.bag.text(key)
            }

            pub fn has_tag(&self, tag: &str) -> bool {
                self.bag.has_tag(tag)
            }

            #[must_use]
            pub fn with_var(
                mut self,
                key: impl Into<String>,
                value: impl Into<$crate::state::Value>,
            ) -> Self {
                self.bag = self.bag.with_var(key, value);
                self
            }

            #[must_use]
            pub fn without_var(mut self, key: &str) -> Self {
                self.bag = self.bag.without_var(key);
                self
            }

            #[must_use]
            pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
                self.bag = self.bag.with_tag(tag);
                self
            }

            #[must_use]
            pub fn without_tag(mut self, tag: &str) -> Self {
                self.bag = self.bag.without_tag(tag);
                self
            }

            #[must_use]
            pub fn modified(mut self, key: &str, delta: &$crate::state::Value) -> Self {
                self.bag = self.bag.modified(key, delta);
                self
            }
        }
    };
}

pub(crate) use impl_var_scope;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_read_as_zero_values() {
        let bag = VarBag::new();
        assert_eq!(bag.int("Hp"), 0);
        assert_eq!(bag.float("resist_magic"), 0.0);
        assert!(!bag.flag("ends_turn"));
        assert_eq!(bag.text("Team"), "");
    }

    #[test]
    fn copy_with_change_leaves_original_untouched() {
        let base = VarBag::new().with_var("Hp", 10).with_tag("duel");
        let changed = base.clone().modified("Hp", &Value::Int(-3)).without_tag("duel");

        assert_eq!(base.int("Hp"), 10);
        assert!(base.has_tag("duel"));
        assert_eq!(changed.int("Hp"), 7);
        assert!(!changed.has_tag("duel"));
    }
}

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Key-value configuration store
//!
//! Configuration is modelled as a hierarchical registry: keys are
//! `/`-separated paths, each key holds named values and may have subkeys.
//! Absent keys and values simply read as empty.

use std::collections::BTreeMap;

/// Substitution table entries
pub const SUBSTITUTES_KEY: &str = "Fonts/Substitutes";
/// Family replacement declarations
pub const REPLACEMENTS_KEY: &str = "Fonts/Replacements";
/// Font-link declarations
pub const SYSTEM_LINK_KEY: &str = "Fonts/SystemLink";
/// Volatile discovery cache
pub const CACHE_KEY: &str = "Fonts/Cache";
/// Locale (codepage) settings
pub const LOCALE_KEY: &str = "Locale";

/// A stored value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    MultiStr(Vec<String>),
    Dword(u32),
    Binary(Vec<u8>),
}

impl ConfigValue {
    /// The value as a single string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a list of strings
    ///
    /// A single string reads as a one-element list.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            ConfigValue::Str(s) => vec![s.as_str()],
            ConfigValue::MultiStr(list) => list.iter().map(|s| s.as_str()).collect(),
            _ => vec![],
        }
    }

    /// The value as a number (decimal strings are accepted)
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ConfigValue::Dword(x) => Some(*x),
            ConfigValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A hierarchical key-value store
pub trait ConfigStore: Send {
    /// All values of `key`, in name order; empty if the key is absent
    fn values(&self, key: &str) -> Vec<(String, ConfigValue)>;

    /// Names of the immediate subkeys of `key`
    fn subkeys(&self, key: &str) -> Vec<String>;

    /// Set a value, creating the key as required
    fn set_value(&mut self, key: &str, name: &str, value: ConfigValue);

    /// Delete a single value
    fn delete_value(&mut self, key: &str, name: &str);

    /// Delete a key with all values and subkeys
    fn delete_tree(&mut self, key: &str);

    /// Read one value
    fn get_value(&self, key: &str, name: &str) -> Option<ConfigValue> {
        self.values(key)
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Join key path components
pub fn join_key(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

/// An in-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    keys: BTreeMap<String, BTreeMap<String, ConfigValue>>,
}

impl MemoryStore {
    /// Construct an empty store
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Builder-style [`ConfigStore::set_value`]
    pub fn with_value(mut self, key: &str, name: &str, value: ConfigValue) -> Self {
        self.set_value(key, name, value);
        self
    }

    /// True if `key` exists
    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }
}

impl ConfigStore for MemoryStore {
    fn values(&self, key: &str) -> Vec<(String, ConfigValue)> {
        self.keys
            .get(key)
            .map(|values| {
                values
                    .iter()
                    .map(|(n, v)| (n.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn subkeys(&self, key: &str) -> Vec<String> {
        let prefix = format!("{key}/");
        let mut names: Vec<String> = self
            .keys
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn set_value(&mut self, key: &str, name: &str, value: ConfigValue) {
        // Create intermediate keys so that subkey listing sees them
        let mut path = String::new();
        for part in key.split('/') {
            path = join_key(&path, part);
            self.keys.entry(path.clone()).or_default();
        }
        if let Some(values) = self.keys.get_mut(key) {
            values.insert(name.to_string(), value);
        }
    }

    fn delete_value(&mut self, key: &str, name: &str) {
        if let Some(values) = self.keys.get_mut(key) {
            values.remove(name);
        }
    }

    fn delete_tree(&mut self, key: &str) {
        let prefix = format!("{key}/");
        self.keys.retain(|k, _| k != key && !k.starts_with(&prefix));
    }
}

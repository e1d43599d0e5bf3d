//! Persistent name -> serial-numbers grouping.
//!
//! Groups are kept in memory and mirrored to the store under the
//! `light_groups` key as `name|serial1,serial2;name2|serial3;`. Entries
//! with an empty name or an empty serial list are dropped silently on
//! reload.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::store::KvStore;

const GROUPS_KEY: &str = "light_groups";

pub struct GroupCache {
    groups: BTreeMap<String, Vec<String>>,
    store: KvStore,
}

impl GroupCache {
    /// Load the cache from the store; a missing or empty key yields an
    /// empty cache.
    pub fn load(store: KvStore) -> Self {
        let groups = store
            .get(GROUPS_KEY)
            .map(|data| deserialize_groups(&data))
            .unwrap_or_default();
        if !groups.is_empty() {
            tracing::info!("loaded {} light group(s)", groups.len());
        }
        Self { groups, store }
    }

    /// Add or replace a group and persist.
    pub fn add_group(&mut self, name: &str, serials: Vec<String>) -> Result<()> {
        tracing::info!("adding group '{name}' with {} device(s)", serials.len());
        self.groups.insert(name.to_owned(), serials);
        self.save()
    }

    /// Remove a group and persist. Removing an unknown group is a no-op.
    pub fn remove_group(&mut self, name: &str) -> Result<()> {
        self.groups.remove(name);
        self.save()
    }

    pub fn group(&self, name: &str) -> Option<&Vec<String>> {
        self.groups.get(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn all_groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Drop every group and persist.
    pub fn clear(&mut self) -> Result<()> {
        self.groups.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        self.store.set(GROUPS_KEY, &serialize_groups(&self.groups))
    }
}

fn serialize_groups(groups: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::new();
    for (name, serials) in groups {
        out.push_str(name);
        out.push('|');
        out.push_str(&serials.join(","));
        out.push(';');
    }
    out
}

fn deserialize_groups(data: &str) -> BTreeMap<String, Vec<String>> {
    let mut groups = BTreeMap::new();
    for entry in data.split(';') {
        if entry.is_empty() {
            continue;
        }
        let Some((name, serials_str)) = entry.split_once('|') else {
            continue;
        };
        let serials: Vec<String> = serials_str
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if !name.is_empty() && !serials.is_empty() {
            groups.insert(name.to_owned(), serials);
        }
    }
    groups
}

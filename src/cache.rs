//! Memoized reference data shared by the resolvers
//!
//! Entries are written once and never evicted. Concurrent writers for the
//! same key always compute the same value, so last-write-wins is harmless.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct ResolverCache {
    members: Mutex<HashMap<String, Vec<String>>>,
    base_forms: Mutex<HashMap<String, bool>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members of a type tag. `None` means the tag was never queried.
    pub fn members(&self, tag: &str) -> Option<Vec<String>> {
        lock(&self.members).get(tag).cloned()
    }

    pub fn store_members(&self, tag: &str, names: Vec<String>) {
        lock(&self.members).insert(tag.to_string(), names);
    }

    pub fn base_form(&self, name: &str) -> Option<bool> {
        lock(&self.base_forms).get(name).copied()
    }

    pub fn store_base_form(&self, name: &str, is_base: bool) {
        lock(&self.base_forms).insert(name.to_string(), is_base);
    }

    pub fn member_tag_count(&self) -> usize {
        lock(&self.members).len()
    }

    pub fn base_form_count(&self) -> usize {
        lock(&self.base_forms).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

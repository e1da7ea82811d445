//! Injectable alias cache abstraction
//!
//! Process-local by default; losing it only costs redundant external
//! calls, so it is not correctness-critical. Tests substitute their own
//! deterministic implementation.

use std::collections::HashMap;
use std::sync::Mutex;

/// Cache seam for generated alias sets
pub trait AliasCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<String>>;
    fn set(&self, key: &str, aliases: Vec<String>);
    fn clear(&self);
}

/// In-memory cache, unbounded for process lifetime
#[derive(Default)]
pub struct MemoryAliasCache {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryAliasCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AliasCache for MemoryAliasCache {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, aliases: Vec<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), aliases);
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

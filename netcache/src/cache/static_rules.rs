//! Administrator-installed exact-match rules.
//!
//! Traffic only ever reads this table. Writes come from the administrative
//! side, and each upsert is visible to concurrent lookups as a whole.

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use netcache_common::{Key, Value};

pub struct StaticRuleCache {
    rules: DashMap<Key, Value, FnvBuildHasher>,
}

impl StaticRuleCache {
    pub fn new() -> StaticRuleCache {
        StaticRuleCache {
            rules: DashMap::with_hasher(FnvBuildHasher::default()),
        }
    }

    pub fn lookup(&self, key: Key) -> Option<Value> {
        self.rules.get(&key).map(|value| *value)
    }

    /// Installs `key -> value`, replacing any earlier rule for `key`.
    /// Returns the replaced value.
    pub fn insert(&self, key: Key, value: Value) -> Option<Value> {
        self.rules.insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for StaticRuleCache {
    fn default() -> Self {
        StaticRuleCache::new()
    }
}

impl FromIterator<(Key, Value)> for StaticRuleCache {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let cache = StaticRuleCache::new();
        for (key, value) in iter {
            cache.insert(key, value);
        }
        cache
    }
}

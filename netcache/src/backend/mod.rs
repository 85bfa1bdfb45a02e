//! Backend key-value server.
//!
//! The device treats it as an oracle that answers found or not found. Its
//! records are fixed at startup.

pub mod main;
pub mod server;

use fnv::FnvHashMap;
use netcache_common::{Key, Value};

use crate::cli::assignment::Assignment;
use crate::protocol::Packet;

pub use server::BackendServer;

#[derive(Debug, Default, Clone)]
pub struct KvOracle {
    records: FnvHashMap<Key, Value>,
}

impl KvOracle {
    pub fn lookup(&self, key: Key) -> Option<Value> {
        self.records.get(&key).copied()
    }

    /// The response the server sends for a request on `key`.
    pub fn answer(&self, key: Key) -> Packet {
        match self.lookup(key) {
            Some(value) => Packet::hit(key, value),
            None => Packet::not_found(key),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Assignment> for KvOracle {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        KvOracle {
            records: iter.into_iter().map(<(Key, Value)>::from).collect(),
        }
    }
}

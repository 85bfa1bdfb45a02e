#![cfg_attr(not(test), no_std)]

pub mod network;

/// Record identifier carried in every cache packet.
pub type Key = u32;

/// Record content carried in cache responses.
pub type Value = u32;

/// Number of learned-cache slots when none is configured.
pub const DEFAULT_SLOTS: usize = 1024;

/// Printed by clients when the backend has no record for a key.
pub const NOT_FOUND_SENTINEL: &str = "NOTFOUND";

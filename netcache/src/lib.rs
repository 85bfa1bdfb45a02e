#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod cli;
pub mod client;
pub mod logging;
pub mod pipeline;
pub mod protocol;
pub mod server;

pub use netcache_common::{Key, Value};

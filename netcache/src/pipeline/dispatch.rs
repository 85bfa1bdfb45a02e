//! Per-datagram cache decisions.
//!
//! A request from a client is answered from the static rules, then from the
//! learned cache, and otherwise forwarded to the server inside a relay
//! envelope. A response from the server is learned when found and relayed
//! to the client named in its envelope. Nothing here blocks or touches a
//! socket; the device executes the returned [`Verdict`].

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use netcache_common::{Key, Value};

use crate::cache::{LearnedCache, ReplySource, SlotUpdate, StaticRuleCache};
use crate::protocol::codec::{self, CodecError, Packet};
use crate::protocol::envelope;

use super::stats::PipelineStats;

/// A datagram and the side of the device it arrived on.
#[derive(Clone, Copy, Debug)]
pub enum Ingress<'a> {
    FromClient { origin: SocketAddr, payload: &'a [u8] },
    FromServer { payload: &'a [u8] },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Answer the requester directly from a cache.
    Reply {
        to: SocketAddr,
        payload: Bytes,
        source: ReplySource,
    },
    /// Send a relay frame to the server.
    ForwardToServer { frame: Bytes },
    /// Pass a server response back to its client.
    ForwardToClient {
        to: SocketAddr,
        payload: Bytes,
        found: bool,
    },
    Drop(DropReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    Malformed(CodecError),
    /// a response from a client or a request from the server
    WrongDirection,
    /// the relay envelope only carries IPv4 clients
    UnsupportedOrigin(SocketAddr),
    /// datagram on the upstream socket from someone other than the server
    UnknownPeer(SocketAddr),
}

pub struct Dispatcher {
    static_rules: Arc<StaticRuleCache>,
    learned: Arc<LearnedCache>,
    stats: PipelineStats,
}

impl Dispatcher {
    pub fn new(static_rules: Arc<StaticRuleCache>, learned: Arc<LearnedCache>) -> Dispatcher {
        Dispatcher {
            static_rules,
            learned,
            stats: PipelineStats::new(),
        }
    }

    pub fn static_rules(&self) -> &Arc<StaticRuleCache> {
        &self.static_rules
    }

    pub fn learned(&self) -> &Arc<LearnedCache> {
        &self.learned
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn process(&self, ingress: Ingress<'_>) -> Verdict {
        match ingress {
            Ingress::FromClient { origin, payload } => self.on_client_datagram(origin, payload),
            Ingress::FromServer { payload } => self.on_server_datagram(payload),
        }
    }

    /// Drop a datagram for a reason found outside the pipeline.
    pub fn reject(&self, reason: DropReason) -> Verdict {
        debug!("Dropping datagram: {:?}", reason);
        self.stats.record_drop();
        Verdict::Drop(reason)
    }

    fn on_client_datagram(&self, origin: SocketAddr, payload: &[u8]) -> Verdict {
        match codec::decode(payload) {
            Ok(Packet::Request { key }) => self.lookup_or_forward(origin, key, payload),
            Ok(Packet::Response { .. }) => self.reject(DropReason::WrongDirection),
            Err(err) => self.reject(DropReason::Malformed(err)),
        }
    }

    fn lookup_or_forward(&self, origin: SocketAddr, key: Key, request: &[u8]) -> Verdict {
        if let Some(value) = self.static_rules.lookup(key) {
            self.stats.record_static_hit();
            return self.reply(origin, key, value, ReplySource::Static);
        }
        if let Some(value) = self.learned.lookup(key) {
            self.stats.record_learned_hit();
            return self.reply(origin, key, value, ReplySource::Learned);
        }

        let client = match envelope::canonical(origin) {
            SocketAddr::V4(client) => client,
            SocketAddr::V6(_) => return self.reject(DropReason::UnsupportedOrigin(origin)),
        };
        trace!("Key {} missed both caches, forwarding for {}", key, client);
        self.stats.record_forward();
        Verdict::ForwardToServer {
            frame: envelope::seal(client, request),
        }
    }

    fn reply(&self, to: SocketAddr, key: Key, value: Value, source: ReplySource) -> Verdict {
        trace!("Key {} answered from {} for {}", key, source.as_str(), to);
        Verdict::Reply {
            to,
            payload: codec::encode(&Packet::hit(key, value)),
            source,
        }
    }

    fn on_server_datagram(&self, frame: &[u8]) -> Verdict {
        let (client, payload) = match envelope::open(frame) {
            Ok(parts) => parts,
            Err(err) => return self.reject(DropReason::Malformed(err)),
        };
        let (key, value, found) = match codec::decode(payload) {
            Ok(Packet::Response { key, value, found }) => (key, value, found),
            Ok(Packet::Request { .. }) => return self.reject(DropReason::WrongDirection),
            Err(err) => return self.reject(DropReason::Malformed(err)),
        };

        // The slot is written before the response leaves, so the client's
        // next request for this key already hits.
        if found {
            match self.learned.update(key, value) {
                SlotUpdate::Replaced { evicted } => {
                    debug!("Learned key {} evicted key {} from its slot", key, evicted)
                }
                SlotUpdate::Filled | SlotUpdate::Refreshed => {
                    trace!("Learned key {} = {}", key, value)
                }
            }
            self.stats.record_learned();
        } else {
            trace!("Server has no record for key {}", key);
            self.stats.record_not_found();
        }

        self.stats.record_relay();
        Verdict::ForwardToClient {
            to: SocketAddr::V4(client),
            payload: Bytes::copy_from_slice(payload),
            found,
        }
    }
}

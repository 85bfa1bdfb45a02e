//! Relay envelope for the device <-> backend link.
//!
//! The device prefixes each forwarded request with the requesting client's
//! IPv4 address and port. The backend echoes the prefix untouched, which is
//! how the device knows where to send the response.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};

use bytes::{BufMut, Bytes, BytesMut};
use netcache_common::network::EnvelopeHeader;

use super::codec::CodecError;

/// IPv4 peers seen through a dual-stack socket arrive as `::ffff:a.b.c.d`.
/// Folds them back to plain IPv4 so they fit the envelope and compare
/// equal to configured IPv4 addresses.
pub fn canonical(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

/// Destination `to` as a socket bound to `local` can send to it. An IPv6
/// socket needs IPv4 destinations in their mapped form.
pub fn reachable_from(local: SocketAddr, to: SocketAddr) -> SocketAddr {
    match (local, to) {
        (SocketAddr::V6(_), SocketAddr::V4(v4)) => {
            SocketAddr::new(IpAddr::V6(v4.ip().to_ipv6_mapped()), v4.port())
        }
        _ => to,
    }
}

/// Prefix `packet` with the envelope for `client`. The packet bytes are
/// copied as-is.
pub fn seal(client: SocketAddrV4, packet: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(EnvelopeHeader::LEN + packet.len());
    buf.put_slice(&client.ip().octets());
    buf.put_u16(client.port());
    buf.put_slice(packet);
    buf.freeze()
}

/// Split a relay frame into the client address and the packet bytes.
pub fn open(frame: &[u8]) -> Result<(SocketAddrV4, &[u8]), CodecError> {
    if frame.len() < EnvelopeHeader::LEN {
        return Err(CodecError::Truncated {
            kind: "envelope",
            needed: EnvelopeHeader::LEN,
            actual: frame.len(),
        });
    }
    let (header, packet) = frame.split_at(EnvelopeHeader::LEN);
    let addr = Ipv4Addr::new(header[0], header[1], header[2], header[3]);
    let port = u16::from_be_bytes([header[4], header[5]]);
    Ok((SocketAddrV4::new(addr, port), packet))
}

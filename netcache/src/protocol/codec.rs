//! Cache packet codec.
//!
//! A request is `type | key`, a response is `type | key | value | flags`,
//! integers in network byte order. Bytes past the declared fields are
//! ignored, as a switch parser would leave them in the payload.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use netcache_common::network::{
    RequestHeader, ResponseHeader, FLAG_FOUND, TYPE_REQUEST, TYPE_RESPONSE,
};
use netcache_common::{Key, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packet {
    Request { key: Key },
    Response { key: Key, value: Value, found: bool },
}

impl Packet {
    pub fn hit(key: Key, value: Value) -> Packet {
        Packet::Response {
            key,
            value,
            found: true,
        }
    }

    pub fn not_found(key: Key) -> Packet {
        Packet::Response {
            key,
            value: 0,
            found: false,
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Packet::Request { .. } => RequestHeader::LEN,
            Packet::Response { .. } => ResponseHeader::LEN,
        }
    }
}

/// Reasons a datagram is not a cache packet. Callers drop the datagram.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed packet: unknown type tag {0:#04x}")]
    UnknownType(u8),
    #[error("malformed packet: {kind} needs {needed} bytes, got {actual}")]
    Truncated {
        kind: &'static str,
        needed: usize,
        actual: usize,
    },
}

fn ensure_len(kind: &'static str, buf: &[u8], needed: usize) -> Result<(), CodecError> {
    if buf.len() < needed {
        return Err(CodecError::Truncated {
            kind,
            needed,
            actual: buf.len(),
        });
    }
    Ok(())
}

pub fn decode(mut buf: &[u8]) -> Result<Packet, CodecError> {
    ensure_len("header", buf, 1)?;
    match buf[0] {
        TYPE_REQUEST => {
            ensure_len("request", buf, RequestHeader::LEN)?;
            buf.advance(1);
            Ok(Packet::Request { key: buf.get_u32() })
        }
        TYPE_RESPONSE => {
            ensure_len("response", buf, ResponseHeader::LEN)?;
            buf.advance(1);
            let key = buf.get_u32();
            let value = buf.get_u32();
            let flags = buf.get_u8();
            Ok(Packet::Response {
                key,
                value,
                found: flags & FLAG_FOUND != 0,
            })
        }
        other => Err(CodecError::UnknownType(other)),
    }
}

pub fn encode_into<B: BufMut>(packet: &Packet, buf: &mut B) {
    match *packet {
        Packet::Request { key } => {
            buf.put_u8(TYPE_REQUEST);
            buf.put_u32(key);
        }
        Packet::Response { key, value, found } => {
            buf.put_u8(TYPE_RESPONSE);
            buf.put_u32(key);
            buf.put_u32(value);
            buf.put_u8(if found { FLAG_FOUND } else { 0 });
        }
    }
}

pub fn encode(packet: &Packet) -> Bytes {
    let mut buf = BytesMut::with_capacity(packet.encoded_len());
    encode_into(packet, &mut buf);
    buf.freeze()
}

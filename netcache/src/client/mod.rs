//! One-shot query client.

pub mod main;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use netcache_common::{Key, Value, NOT_FOUND_SENTINEL};
use tokio::net::UdpSocket;

use crate::protocol::{codec, Packet, MAX_DATAGRAM};

/// Sends one request for `key` to `target` and waits for its response.
/// `Ok(None)` means the key does not exist; no response within `timeout`
/// is an error.
pub async fn query(target: SocketAddr, key: Key, timeout: Duration) -> Result<Option<Value>> {
    let local: SocketAddr = if target.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };
    let socket = UdpSocket::bind(local)
        .await
        .context("Failed to bind client socket")?;
    socket
        .connect(target)
        .await
        .context(format!("Failed to connect to {}", target))?;
    socket
        .send(&codec::encode(&Packet::Request { key }))
        .await
        .context(format!("Failed to send request to {}", target))?;

    tokio::time::timeout(timeout, wait_for_response(&socket, key))
        .await
        .map_err(|_| anyhow!("No response from {} within {:?}", target, timeout))?
}

async fn wait_for_response(socket: &UdpSocket, key: Key) -> Result<Option<Value>> {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let len = socket.recv(&mut buf).await.context("Failed to receive response")?;
        match codec::decode(&buf[..len]) {
            Ok(Packet::Response {
                key: answered,
                value,
                found,
            }) if answered == key => return Ok(found.then_some(value)),
            Ok(other) => debug!("Ignoring unexpected packet {:?}", other),
            Err(err) => debug!("Ignoring datagram: {}", err),
        }
    }
}

/// Text printed for an answer: the value, or the not-found sentinel.
pub fn render(answer: Option<Value>) -> String {
    match answer {
        Some(value) => value.to_string(),
        None => NOT_FOUND_SENTINEL.to_string(),
    }
}

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::net::UdpSocket;

use super::KvOracle;
use crate::protocol::{codec, envelope, Packet, MAX_DATAGRAM};

pub struct BackendServer {
    socket: UdpSocket,
    oracle: KvOracle,
    served: Arc<AtomicU64>,
}

impl BackendServer {
    pub async fn bind(addr: SocketAddr, oracle: KvOracle) -> Result<BackendServer> {
        let socket = UdpSocket::bind(addr)
            .await
            .context(format!("Failed to bind backend socket on {}", addr))?;
        Ok(BackendServer {
            socket,
            oracle,
            served: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Requests answered so far. Shared so it can be read while `run` owns
    /// the server.
    pub fn served_counter(&self) -> Arc<AtomicU64> {
        self.served.clone()
    }

    /// Answer one relay frame, echoing its envelope. `None` means the frame
    /// is not a well-formed request and gets no reply.
    pub fn handle_frame(&self, frame: &[u8]) -> Option<Bytes> {
        let (client, payload) = match envelope::open(frame) {
            Ok(parts) => parts,
            Err(err) => {
                debug!("Dropping frame: {}", err);
                return None;
            }
        };
        let key = match codec::decode(payload) {
            Ok(Packet::Request { key }) => key,
            Ok(other) => {
                debug!("Dropping non-request packet {:?}", other);
                return None;
            }
            Err(err) => {
                debug!("Dropping frame: {}", err);
                return None;
            }
        };

        let answer = self.oracle.answer(key);
        self.served.fetch_add(1, Ordering::Relaxed);
        trace!("Answering {:?} for client {}", answer, client);
        Some(envelope::seal(client, &codec::encode(&answer)))
    }

    pub async fn run(self) -> Result<()> {
        info!(
            "Backend serving {} records on {}",
            self.oracle.len(),
            self.local_addr()?
        );
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(err) => {
                    warn!("Backend receive failed: {}", err);
                    continue;
                }
            };
            if let Some(reply) = self.handle_frame(&buf[..len]) {
                if let Err(err) = self.socket.send_to(&reply, peer).await {
                    warn!("Failed to answer {}: {}", peer, err);
                }
            }
        }
    }
}

//! Socket plumbing for the cache device.
//!
//! Two receive loops share one [`Dispatcher`]: the client side takes cache
//! requests, the upstream side takes relay frames from the backend. Each
//! datagram is processed to completion and its verdict executed before the
//! loop reads the next one.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;

use crate::cache::ReplySource;
use crate::cli::parser::NetcacheArgs;
use crate::pipeline::{Dispatcher, DropReason, Ingress, Verdict};
use crate::protocol::envelope::{canonical, reachable_from};
use crate::protocol::MAX_DATAGRAM;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub listen: SocketAddr,
    pub server: SocketAddr,
    pub upstream_bind: SocketAddr,
}

impl From<&NetcacheArgs> for DeviceConfig {
    fn from(args: &NetcacheArgs) -> Self {
        DeviceConfig {
            listen: args.listen,
            server: args.server,
            upstream_bind: args.upstream_bind,
        }
    }
}

struct Sockets {
    client: UdpSocket,
    upstream: UdpSocket,
    client_local: SocketAddr,
    upstream_local: SocketAddr,
    server: SocketAddr,
}

impl Sockets {
    async fn execute(&self, verdict: Verdict) {
        let (socket, payload, to) = match verdict {
            Verdict::Reply {
                to,
                payload,
                source,
            } => {
                trace!("Replying to {} from {}", to, source.as_str());
                (&self.client, payload, reachable_from(self.client_local, to))
            }
            Verdict::ForwardToClient { to, payload, found } => {
                trace!(
                    "Relaying {} answer (found: {}) to {}",
                    ReplySource::Server.as_str(),
                    found,
                    to
                );
                (&self.client, payload, reachable_from(self.client_local, to))
            }
            Verdict::ForwardToServer { frame } => (
                &self.upstream,
                frame,
                reachable_from(self.upstream_local, self.server),
            ),
            Verdict::Drop(_) => return,
        };
        if let Err(err) = socket.send_to(&payload, to).await {
            warn!("Failed to send {} bytes to {}: {}", payload.len(), to, err);
        }
    }
}

pub struct Device {
    sockets: Arc<Sockets>,
    dispatcher: Arc<Dispatcher>,
}

impl Device {
    pub async fn bind(config: &DeviceConfig, dispatcher: Arc<Dispatcher>) -> Result<Device> {
        let client = UdpSocket::bind(config.listen)
            .await
            .context(format!("Failed to bind client socket on {}", config.listen))?;
        let upstream = UdpSocket::bind(config.upstream_bind).await.context(format!(
            "Failed to bind upstream socket on {}",
            config.upstream_bind
        ))?;
        let client_local = client.local_addr()?;
        let upstream_local = upstream.local_addr()?;
        Ok(Device {
            sockets: Arc::new(Sockets {
                client,
                upstream,
                client_local,
                upstream_local,
                server: canonical(config.server),
            }),
            dispatcher,
        })
    }

    pub fn client_addr(&self) -> io::Result<SocketAddr> {
        self.sockets.client.local_addr()
    }

    pub fn upstream_addr(&self) -> io::Result<SocketAddr> {
        self.sockets.upstream.local_addr()
    }

    /// Runs both receive loops until one of them fails.
    pub async fn run(self) -> Result<()> {
        info!(
            "Serving clients on {}, backend {} via {}",
            self.client_addr()?,
            self.sockets.server,
            self.upstream_addr()?
        );
        let client_side = tokio::spawn(client_ingress(
            self.sockets.clone(),
            self.dispatcher.clone(),
        ));
        let server_side = tokio::spawn(server_ingress(self.sockets, self.dispatcher));
        tokio::select! {
            res = client_side => res.context("Client loop panicked")?,
            res = server_side => res.context("Server loop panicked")?,
        }
    }
}

async fn client_ingress(sockets: Arc<Sockets>, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, origin) = match sockets.client.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!("Client socket receive failed: {}", err);
                continue;
            }
        };
        let verdict = dispatcher.process(Ingress::FromClient {
            origin,
            payload: &buf[..len],
        });
        sockets.execute(verdict).await;
    }
}

async fn server_ingress(sockets: Arc<Sockets>, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = match sockets.upstream.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!("Upstream socket receive failed: {}", err);
                continue;
            }
        };
        let verdict = if canonical(peer) == sockets.server {
            dispatcher.process(Ingress::FromServer {
                payload: &buf[..len],
            })
        } else {
            dispatcher.reject(DropReason::UnknownPeer(peer))
        };
        sockets.execute(verdict).await;
    }
}

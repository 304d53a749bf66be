//! Datagram transport between the two endpoints.
//!
//! The pipeline only needs two operations: fire one datagram at the peer, and
//! wait a bounded time for one datagram from anyone. Delivery is best-effort;
//! nothing here retransmits or orders.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::config::TalkConfig;
use crate::error::{Result, TalkError};

/// A datagram channel to one peer.
///
/// The transmitter and receiver share one transport from two threads, hence
/// `Sync` and `&self` receivers.
pub trait Transport: Send + Sync {
    /// Sends one datagram to the peer.
    fn send(&self, payload: &[u8]) -> io::Result<()>;

    /// Waits a bounded time for one datagram and copies it into `buf`.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Datagrams longer than
    /// `buf` are truncated.
    fn recv(&self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// UDP socket bound on all interfaces, sending to one resolved peer.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Binds `0.0.0.0:<local_port>` and resolves the peer once.
    ///
    /// # Errors
    ///
    /// - [`TalkError::Resolve`] / [`TalkError::NoPeerAddress`] if the peer
    ///   cannot be resolved to an IPv4 address.
    /// - [`TalkError::Bind`] if the local port is unavailable.
    pub fn bind(
        local_port: u16,
        remote_host: &str,
        remote_port: u16,
        poll_interval: Duration,
    ) -> Result<Self> {
        let peer = resolve_ipv4(remote_host, remote_port)?;

        let socket = UdpSocket::bind(("0.0.0.0", local_port)).map_err(|source| TalkError::Bind {
            port: local_port,
            source,
        })?;

        Self::from_socket(socket, peer, poll_interval).map_err(|source| TalkError::Bind {
            port: local_port,
            source,
        })
    }

    /// Binds and resolves according to `config`.
    ///
    /// # Errors
    ///
    /// See [`bind`](Self::bind).
    pub fn from_config(config: &TalkConfig) -> Result<Self> {
        Self::bind(config.local_port, &config.remote_host, config.remote_port, config.poll_interval)
    }

    /// Wraps an already bound socket.
    ///
    /// # Errors
    ///
    /// Returns the socket error if the read timeout cannot be set.
    pub fn from_socket(
        socket: UdpSocket,
        peer: SocketAddr,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        socket.set_read_timeout(Some(poll_interval))?;
        Ok(Self { socket, peer })
    }

    /// Returns the locally bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Returns the resolved peer address.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for UdpTransport {
    fn send(&self, payload: &[u8]) -> io::Result<()> {
        self.socket.send_to(payload, self.peer).map(|_| ())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => {
                debug!(%from, bytes = len, "datagram received");
                Ok(Some(len))
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            // ICMP unreachable from an earlier send; the peer is not up yet.
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset
                ) =>
            {
                debug!(error = %err, "peer unreachable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs().map_err(|source| TalkError::Resolve {
        host: host.to_owned(),
        port,
        source,
    })?;

    addrs.find(SocketAddr::is_ipv4).ok_or_else(|| TalkError::NoPeerAddress {
        host: host.to_owned(),
        port,
    })
}

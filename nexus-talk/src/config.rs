//! Pipeline configuration.

use std::time::Duration;

use nexus_arena::{DEFAULT_HEADS, DEFAULT_NODES};

use crate::error::{Result, TalkError};

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM: usize = 65_507;

/// Default bound on how long the receiver waits for a datagram before it
/// re-checks the shutdown flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settings for one talk endpoint.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use nexus_talk::TalkConfig;
///
/// let config = TalkConfig::new(6000, "localhost", 6001)
///     .with_nodes(256)
///     .with_poll_interval(Duration::from_millis(50));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.peer(), ("localhost", 6001));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkConfig {
    /// UDP port bound on all local interfaces.
    pub local_port: u16,
    /// Peer host name or address.
    pub remote_host: String,
    /// Peer UDP port.
    pub remote_port: u16,
    /// List headers in the shared arena. The pipeline needs two.
    pub heads: usize,
    /// List nodes in the shared arena, i.e. messages in flight across both queues.
    pub nodes: usize,
    /// Receiver read timeout.
    pub poll_interval: Duration,
    /// Receive buffer size.
    pub max_datagram: usize,
}

impl TalkConfig {
    /// Creates a configuration with default capacities.
    pub fn new(local_port: u16, remote_host: impl Into<String>, remote_port: u16) -> Self {
        Self {
            local_port,
            remote_host: remote_host.into(),
            remote_port,
            heads: DEFAULT_HEADS,
            nodes: DEFAULT_NODES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_datagram: MAX_DATAGRAM,
        }
    }

    /// Sets the number of list headers.
    pub fn with_heads(mut self, heads: usize) -> Self {
        self.heads = heads;
        self
    }

    /// Sets the number of list nodes.
    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    /// Sets the receiver poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the receive buffer size.
    pub fn with_max_datagram(mut self, max_datagram: usize) -> Self {
        self.max_datagram = max_datagram;
        self
    }

    /// Returns the peer as a `(host, port)` pair.
    pub fn peer(&self) -> (&str, u16) {
        (&self.remote_host, self.remote_port)
    }

    /// Checks that the pipeline can be built from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TalkError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.heads < 2 {
            return Err(TalkError::Config(format!(
                "heads must be at least 2 (one per queue), got {}",
                self.heads
            )));
        }
        if self.heads > u32::MAX as usize || self.nodes > u32::MAX as usize {
            return Err(TalkError::Config("arena capacity exceeds u32 index range".into()));
        }
        if self.nodes == 0 {
            return Err(TalkError::Config("nodes must be greater than 0".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(TalkError::Config("poll interval must be greater than 0".into()));
        }
        if self.max_datagram == 0 || self.max_datagram > MAX_DATAGRAM {
            return Err(TalkError::Config(format!(
                "max datagram must be in 1..={MAX_DATAGRAM}, got {}",
                self.max_datagram
            )));
        }
        if self.remote_host.is_empty() {
            return Err(TalkError::Config("remote host is empty".into()));
        }
        Ok(())
    }
}

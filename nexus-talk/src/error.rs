//! Error types for the talk pipeline.

use std::io;

use nexus_arena::ArenaError;
use thiserror::Error;

use crate::worker::Worker;

/// Errors that stop a pipeline or prevent it from starting.
#[derive(Debug, Error)]
pub enum TalkError {
    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The local UDP socket could not be bound.
    #[error("failed to bind UDP port {port}")]
    Bind {
        /// Requested local port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The peer host name could not be resolved.
    #[error("failed to resolve peer {host}:{port}")]
    Resolve {
        /// Peer host as given.
        host: String,
        /// Peer port.
        port: u16,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },

    /// The peer host resolved, but not to an IPv4 address.
    #[error("peer {host}:{port} has no IPv4 address")]
    NoPeerAddress {
        /// Peer host as given.
        host: String,
        /// Peer port.
        port: u16,
    },

    /// The arena could not supply a queue header.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Sending or receiving a datagram failed.
    #[error("transport failure")]
    Transport(#[source] io::Error),

    /// Reading local input failed.
    #[error("failed to read input")]
    Input(#[source] io::Error),

    /// Writing to the output sink failed.
    #[error("failed to write output")]
    Output(#[source] io::Error),

    /// A worker thread could not be started.
    #[error("failed to spawn {worker} thread")]
    Spawn {
        /// The worker that was being started.
        worker: Worker,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A worker thread panicked.
    #[error("{worker} thread panicked")]
    WorkerPanicked {
        /// The worker that panicked.
        worker: Worker,
    },

    /// The global tracing subscriber could not be installed.
    #[error("failed to initialize logging")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

/// Result type for talk operations.
pub type Result<T> = std::result::Result<T, TalkError>;

//! Two-endpoint talk over UDP.
//!
//! Each endpoint runs four workers around two blocking queues that share one
//! fixed-capacity arena:
//!
//! ```text
//!            ┌──────────────┐   send queue   ┌─────────────┐
//!  stdin ──► │ input reader │ ─────────────► │ transmitter │ ──► UDP peer
//!            └──────────────┘                └─────────────┘
//!            ┌──────────────┐   recv queue   ┌─────────────┐
//! stdout ◄── │   printer    │ ◄───────────── │  receiver   │ ◄── UDP peer
//!            └──────────────┘                └─────────────┘
//! ```
//!
//! Typing `!` on a line of its own ends the session on both endpoints: the
//! line is forwarded to the peer before the local side shuts down, and the
//! peer shuts down when it receives it.
//!
//! # Example
//!
//! ```no_run
//! use std::io::{self, BufReader};
//!
//! use nexus_talk::{Console, TalkConfig, UdpTransport};
//!
//! let config = TalkConfig::new(6000, "localhost", 6001);
//! let transport = UdpTransport::from_config(&config)?;
//!
//! let report = nexus_talk::run(
//!     &config,
//!     BufReader::new(io::stdin()),
//!     transport,
//!     Console::new(io::stdout()),
//! )?;
//! println!("session ended: {:?}", report.cause);
//! # Ok::<(), nexus_talk::TalkError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod message;
pub mod pipeline;
pub mod shutdown;
pub mod transport;
pub mod worker;

pub use config::{DEFAULT_POLL_INTERVAL, MAX_DATAGRAM, TalkConfig};
pub use error::{Result, TalkError};
pub use io::{Console, LineSource, MessageSink};
pub use message::Message;
pub use pipeline::{PipelineReport, run};
pub use shutdown::{Cause, Shutdown};
pub use transport::{Transport, UdpTransport};
pub use worker::{Lifecycle, Worker};

//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries nothing but received messages.

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;

/// Maps a `-v` count to a default filter directive.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter follows `verbosity`.
///
/// # Errors
///
/// [`TalkError::Logging`](crate::TalkError::Logging) if a global subscriber
/// is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_names(true),
        )
        .try_init()?;

    Ok(())
}

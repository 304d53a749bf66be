//! nexus-talk - chat with one peer over UDP.

use std::io::{self, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nexus_arena::{DEFAULT_HEADS, DEFAULT_NODES};
use nexus_talk::{Cause, Console, TalkConfig, UdpTransport, logging};

/// Talk to a peer over UDP. Type `!` on a line of its own to end the session.
#[derive(Parser, Debug)]
#[command(name = "nexus-talk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// UDP port to listen on
    local_port: u16,

    /// Peer host name or address
    remote_host: String,

    /// Peer UDP port
    remote_port: u16,

    /// List headers in the message arena
    #[arg(long, default_value_t = DEFAULT_HEADS)]
    heads: usize,

    /// Messages that may be in flight across both queues
    #[arg(long, default_value_t = DEFAULT_NODES)]
    nodes: usize,

    /// How often the receiver re-checks for shutdown, in milliseconds
    #[arg(long = "poll-ms", default_value_t = 100)]
    poll_ms: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> TalkConfig {
        TalkConfig::new(self.local_port, self.remote_host.clone(), self.remote_port)
            .with_heads(self.heads)
            .with_nodes(self.nodes)
            .with_poll_interval(Duration::from_millis(self.poll_ms))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = cli.config();
    config.validate()?;

    let transport = UdpTransport::from_config(&config).with_context(|| {
        format!(
            "cannot open session with {}:{}",
            config.remote_host, config.remote_port
        )
    })?;

    println!("Enter your messages below (exit by typing '!'):");

    let report = nexus_talk::run(
        &config,
        BufReader::new(io::stdin()),
        transport,
        Console::new(io::stdout()),
    )
    .context("talk session failed")?;

    if report.cause == Some(Cause::RemoteSentinel) {
        eprintln!("peer ended the session");
    }
    tracing::info!(?report, "session ended");

    Ok(())
}

//! Command-line inspection tool for sideband wire frames and envelopes.
//!
//! # Usage
//!
//! ```bash
//! # Hex-dump a frame's structure from a hex-encoded buffer
//! frame-inspect dump 0a00...
//!
//! # Parse an envelope from stdin JSON and print its decoded shape
//! echo '{"t":"N","e":"ping"}' | frame-inspect roundtrip-envelope
//! ```

#![allow(clippy::print_stdout)]

use std::io::Read;

use clap::{Parser, Subcommand};
use sideband_proto::Frame;
use sideband_rpc::Envelope;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect sideband wire frames and RPC envelopes.
#[derive(Parser, Debug)]
#[command(name = "frame-inspect")]
#[command(about = "Decode sideband frames and envelopes for debugging")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a hex-encoded frame buffer and print its structure.
    Dump {
        /// Hex-encoded frame bytes.
        hex: String,
    },
    /// Decode a JSON envelope from stdin, then re-encode it and print both.
    RoundtripEnvelope,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frame_inspect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Dump { hex } => dump(&hex),
        Command::RoundtripEnvelope => roundtrip_envelope(),
    }
}

fn dump(hex_text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = hex::decode(hex_text.trim())?;
    let frame = Frame::decode(&bytes)?;
    println!("{frame:#?}");
    Ok(())
}

fn roundtrip_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let envelope = Envelope::decode(input.trim().as_bytes())?;
    println!("decoded: {envelope:#?}");
    let encoded = envelope.encode();
    println!("re-encoded: {}", String::from_utf8_lossy(&encoded));
    Ok(())
}

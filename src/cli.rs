//! Command line interface for the `amqpframe` binary.
//!
//! The binary reads captured AMQP frames and prints each reassembled
//! delivery.

use std::{num::NonZeroU64, path::PathBuf};

use clap::Parser;

/// Command line arguments for the `amqpframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "amqpframe",
    version,
    about = "Reassemble AMQP 0-9-1 deliveries from a captured frame stream"
)]
pub struct Cli {
    /// File holding raw frames; standard input when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Stop after this many deliveries; zero reads until end of stream.
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,

    /// Negotiated maximum frame length in bytes.
    #[arg(long, default_value_t = 131_072)]
    pub max_frame_length: usize,

    /// Reject deliveries whose declared body exceeds this many bytes.
    #[arg(long)]
    pub max_body_size: Option<NonZeroU64>,

    /// Print collected metrics in Prometheus format on exit.
    #[arg(long)]
    pub metrics: bool,
}

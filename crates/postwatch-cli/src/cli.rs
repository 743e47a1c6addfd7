//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const CLI_LONG_ABOUT: &str =
    "Duration estimates for proof-of-space-time proving runs.\n\n\
    Estimate before a run starts:\n  \
    postwatch apriori --k1 26 --k2 37 --labels 68719476736 --nonces 64 --batch-size 16 \\\n    \
    --difficulty 262144 --read-throughput 8.4e6 --aes-throughput 5.1e8 --pow-hashrate 832\n\n\
    Refine with observed progress:\n  \
    postwatch midpass ... --batches-remaining 0 --gamma 0.5 --good-labels 3,0,1,...\n\n\
    Percentile answers are valid upper bounds from a union-bound search, not\n\
    exact quantiles.";

#[derive(Parser)]
#[command(name = "postwatch")]
#[command(about = "Duration estimates for proof-of-space-time proving runs")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Args)]
pub(crate) struct ProtocolArgs {
    /// Good-label threshold numerator
    #[arg(long)]
    pub(crate) k1: u64,

    /// Required good-label count per nonce
    #[arg(long)]
    pub(crate) k2: u64,

    /// Total label count n
    #[arg(long)]
    pub(crate) labels: u64,

    /// Parallel nonce count m per pass
    #[arg(long, default_value_t = 64)]
    pub(crate) nonces: u64,

    /// Nonces per proof-of-work batch
    #[arg(long, default_value_t = 16)]
    pub(crate) batch_size: u64,

    /// Expected hashes per proof-of-work batch
    #[arg(long)]
    pub(crate) difficulty: f64,
}

#[derive(Args)]
pub(crate) struct ProfileArgs {
    /// Profile name used in report output
    #[arg(long, default_value = "node")]
    pub(crate) profile: String,

    /// Disk read throughput in labels per second
    #[arg(long)]
    pub(crate) read_throughput: f64,

    /// AES label-hashing throughput in labels per second (all nonces)
    #[arg(long)]
    pub(crate) aes_throughput: f64,

    /// Single-threaded proof-of-work hash rate in hashes per second
    #[arg(long)]
    pub(crate) pow_hashrate: f64,

    /// Proof-of-work thread count
    #[arg(long, default_value_t = 1)]
    pub(crate) threads: u64,
}

#[derive(Args)]
pub(crate) struct OutputArgs {
    /// Percentiles to bound (comma-separated, each in [0, 1))
    #[arg(long, value_delimiter = ',', default_value = "0.5,0.75,0.99")]
    pub(crate) percentiles: Vec<f64>,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub(crate) format: String,

    /// Optional path to write the JSON report artifact
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Estimate the duration distribution before a proving run starts
    Apriori {
        #[command(flatten)]
        protocol: ProtocolArgs,

        #[command(flatten)]
        hardware: ProfileArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Refine the estimate with observed progress inside the current pass
    Midpass {
        #[command(flatten)]
        protocol: ProtocolArgs,

        #[command(flatten)]
        hardware: ProfileArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Proof-of-work batches still unsolved this pass
        #[arg(long, default_value_t = 0)]
        batches_remaining: u64,

        /// Fraction of labels already read this pass
        #[arg(long, default_value_t = 0.0)]
        gamma: f64,

        /// Per-nonce good-label tallies so far (comma-separated, one per nonce)
        #[arg(long, value_delimiter = ',')]
        good_labels: Vec<u64>,
    },
}

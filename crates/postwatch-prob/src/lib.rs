//! Duration estimation for proof-of-space-time (PoST) proving runs.
//!
//! A proving run repeats *passes* until one succeeds. Each pass solves one
//! proof-of-work puzzle per nonce batch, then reads and hashes every label
//! once, attempting `m` nonces in parallel. A nonce wins when it collects
//! `k2` labels whose hashes clear the `k1/n` threshold.
//!
//! The crate answers two questions about such a run:
//!
//! - [`apriori`] — before the run starts, what are the expected and
//!   percentile completion times?
//! - [`midpass`] — given observed progress inside the current pass (unsolved
//!   proof-of-work batches, fraction of labels read, per-nonce good-label
//!   tallies), how do those estimates change?
//!
//! [`profile::NodeProfile`] composes hardware constants (read throughput,
//! AES hashing throughput, proof-of-work hash rate) with either model into a
//! serializable [`profile::DurationReport`].
//!
//! All functions are pure; identical inputs produce bit-identical outputs.
//! Percentile answers are valid upper bounds obtained from a union-bound
//! family, not exact quantiles.

pub mod apriori;
pub mod dist;
pub mod midpass;
pub mod params;
pub mod profile;

pub use params::{ModelError, PassProgress, ProtocolParams};
pub use profile::{DurationReport, NodeProfile, PercentileEstimate};

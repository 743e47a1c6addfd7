//! Validated model parameters and the shared error type.

use serde::Serialize;
use thiserror::Error;

use crate::dist::{self, DistError};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(
        "invalid protocol parameters: k1={k1}, k2={k2}, n={n}, m={m}, batch_size={batch_size} \
         (need k1 < n, 0 < k2 <= n, m a positive multiple of batch_size)"
    )]
    InvalidProtocolParams {
        k1: u64,
        k2: u64,
        n: u64,
        m: u64,
        batch_size: u64,
    },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("`{name}` must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("`{name}` must lie in [0, 1], got {value}")]
    UnitIntervalViolation { name: &'static str, value: f64 },
    #[error("percentile must lie in [0, 1), got {0}")]
    InvalidPercentile(f64),
    #[error("confidence split eps={eps} outside (0, {limit})")]
    InvalidConfidenceSplit { eps: f64, limit: f64 },
    #[error("pass success probability is zero; the run can never complete")]
    DegeneratePassSuccess,
    #[error("good-label tallies length {actual} does not match nonce count {expected}")]
    GoodLabelsLength { expected: usize, actual: usize },
    #[error("batches remaining {remaining} exceeds batches per pass {per_pass}")]
    BatchesRemaining { remaining: u64, per_pass: u64 },
    #[error(transparent)]
    Dist(#[from] DistError),
}

/// Protocol-side difficulty parameters.
///
/// A label is *good* for a nonce when its hash clears the `k1 / n`
/// threshold; a nonce wins a pass once `k2` good labels accumulate over the
/// `n` labels. `m` nonces are attempted per pass, grouped into proof-of-work
/// batches of `batch_size`.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolParams {
    /// Good-label threshold numerator.
    pub k1: u64,
    /// Required good-label count per nonce.
    pub k2: u64,
    /// Total label count.
    pub n: u64,
    /// Parallel nonce count per pass.
    pub m: u64,
    /// Nonces per proof-of-work batch.
    pub batch_size: u64,
}

impl ProtocolParams {
    /// Construct validated protocol parameters.
    ///
    /// Requires `k1 < n`, `0 < k2 <= n`, and `m` a positive multiple of
    /// `batch_size`.
    pub fn new(k1: u64, k2: u64, n: u64, m: u64, batch_size: u64) -> Result<Self, ModelError> {
        let valid = k1 < n
            && k2 >= 1
            && k2 <= n
            && m >= 1
            && batch_size >= 1
            && m % batch_size == 0;
        if !valid {
            return Err(ModelError::InvalidProtocolParams {
                k1,
                k2,
                n,
                m,
                batch_size,
            });
        }
        Ok(Self {
            k1,
            k2,
            n,
            m,
            batch_size,
        })
    }

    /// Proof-of-work batches solved per pass (`r = m / batch_size`).
    pub fn batches_per_pass(&self) -> u64 {
        self.m / self.batch_size
    }

    /// Probability that a single label is good for a single nonce (`k1 / n`).
    pub fn good_label_prob(&self) -> f64 {
        self.k1 as f64 / self.n as f64
    }

    /// Probability that a single nonce wins a full pass:
    /// `Pr[Binomial(n, k1/n) >= k2]`.
    pub fn nonce_success_prob(&self) -> Result<f64, ModelError> {
        Ok(dist::binomial_survival(
            self.n,
            self.good_label_prob(),
            self.k2,
        )?)
    }
}

/// Snapshot of progress inside the current pass.
///
/// Supplied by the caller at query time; the model never owns or mutates it.
/// Proof-of-work batches are solved at the start of a pass, so
/// `batches_remaining > 0` means the label sweep has not begun.
#[derive(Debug, Clone, Serialize)]
pub struct PassProgress {
    /// Proof-of-work batches still unsolved this pass.
    pub batches_remaining: u64,
    /// Fraction of labels already read this pass.
    pub gamma: f64,
    /// Good labels found so far, one tally per nonce. A tally at or above
    /// `k2` marks that nonce as already successful.
    pub good_labels: Vec<u64>,
}

impl PassProgress {
    pub fn new(
        batches_remaining: u64,
        gamma: f64,
        good_labels: Vec<u64>,
    ) -> Result<Self, ModelError> {
        if gamma.is_nan() || !(0.0..=1.0).contains(&gamma) {
            return Err(ModelError::UnitIntervalViolation {
                name: "gamma",
                value: gamma,
            });
        }
        Ok(Self {
            batches_remaining,
            gamma,
            good_labels,
        })
    }

    /// Progress at the very start of a pass: every batch unsolved, nothing
    /// read, all tallies zero.
    pub fn start_of_pass(params: &ProtocolParams) -> Self {
        Self {
            batches_remaining: params.batches_per_pass(),
            gamma: 0.0,
            good_labels: vec![0; params.m as usize],
        }
    }

    /// Validate this snapshot against the protocol it claims progress for.
    pub fn check_against(&self, params: &ProtocolParams) -> Result<(), ModelError> {
        if self.good_labels.len() != params.m as usize {
            return Err(ModelError::GoodLabelsLength {
                expected: params.m as usize,
                actual: self.good_labels.len(),
            });
        }
        let per_pass = params.batches_per_pass();
        if self.batches_remaining > per_pass {
            return Err(ModelError::BatchesRemaining {
                remaining: self.batches_remaining,
                per_pass,
            });
        }
        Ok(())
    }
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ModelError::NonPositive { name, value });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_nan() || value < 0.0 {
        return Err(ModelError::Negative { name, value });
    }
    Ok(())
}

pub(crate) fn ensure_percentile(pstar: f64) -> Result<(), ModelError> {
    if pstar.is_nan() || !(0.0..1.0).contains(&pstar) {
        return Err(ModelError::InvalidPercentile(pstar));
    }
    Ok(())
}

/// Pass success probabilities live in `(0, 1]`; exactly zero means the run
/// can never finish and must be rejected before it reaches a logarithm.
pub(crate) fn ensure_pass_success(qm: f64) -> Result<(), ModelError> {
    if qm.is_nan() || qm < 0.0 || qm > 1.0 {
        return Err(ModelError::UnitIntervalViolation {
            name: "qm",
            value: qm,
        });
    }
    if qm == 0.0 {
        return Err(ModelError::DegeneratePassSuccess);
    }
    Ok(())
}

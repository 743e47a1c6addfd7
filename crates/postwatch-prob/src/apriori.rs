//! Duration estimates assuming no progress has been observed.
//!
//! Passes are independent attempts that each succeed with probability `qm`,
//! so the pass count is geometric. Each pass costs a fixed label sweep
//! (`pass_time`) plus proof-of-work time for `r` batches of geometric
//! difficulty `d` (expected hashes per batch) at a given hash rate.

use crate::dist;
use crate::params::{
    ensure_non_negative, ensure_pass_success, ensure_percentile, ensure_positive, ModelError,
    ProtocolParams,
};

/// Probability that a single pass succeeds for at least one of the `m`
/// nonces: `1 - (1 - q)^m` with `q = Pr[Binomial(n, k1/n) >= k2]`.
///
/// Always in `[0, 1]` and non-decreasing in `m`.
pub fn pass_success_prob(params: &ProtocolParams) -> Result<f64, ModelError> {
    let q = params.nonce_success_prob()?;
    Ok(1.0 - (1.0 - q).powf(params.m as f64))
}

/// Expected time to solve `batches` proof-of-work puzzles, each needing `d`
/// hashes in expectation: `d * batches / hashrate`.
pub fn expected_pass_k2pow_time(d: f64, hashrate: f64, batches: f64) -> Result<f64, ModelError> {
    ensure_positive("d", d)?;
    ensure_positive("hashrate", hashrate)?;
    ensure_non_negative("batches", batches)?;
    Ok(d * batches / hashrate)
}

/// Expected total duration until the first successful pass.
///
/// The pass count is geometric with mean `1 / qm`, and every attempt costs
/// the label sweep plus the per-pass proof-of-work time.
pub fn expected_total_time(
    pass_time: f64,
    d: f64,
    hashrate: f64,
    batches: f64,
    qm: f64,
) -> Result<f64, ModelError> {
    ensure_positive("pass_time", pass_time)?;
    ensure_pass_success(qm)?;
    let pow = expected_pass_k2pow_time(d, hashrate, batches)?;
    Ok((pass_time + pow) / qm)
}

/// Smallest number of geometric trials covering probability `pstar`:
/// `ceil(ln(1 - pstar) / ln(1 - qm))`.
///
/// The result `x` satisfies `(1-qm)^(x-1) > 1-pstar >= (1-qm)^x`.
pub fn percentile_passes(pstar: f64, qm: f64) -> Result<u64, ModelError> {
    ensure_percentile(pstar)?;
    ensure_pass_success(qm)?;
    if pstar == 0.0 {
        return Ok(0);
    }
    if qm == 1.0 {
        return Ok(1);
    }
    let x = ((1.0 - pstar).ln() / (1.0 - qm).ln()).ceil();
    Ok(x as u64)
}

/// `pstar`-percentile of total proof-of-work time across `batches` puzzles.
///
/// Uses the negative-binomial percentile with success-count `batches + 1`
/// and per-trial success probability `1/d`, divided by the hash rate. The
/// `+ 1` shape offset is deliberate; callers depend on these exact values.
pub fn percentile_k2pow_time(
    pstar: f64,
    d: f64,
    hashrate: f64,
    batches: f64,
) -> Result<f64, ModelError> {
    ensure_percentile(pstar)?;
    ensure_positive("d", d)?;
    ensure_positive("hashrate", hashrate)?;
    ensure_non_negative("batches", batches)?;
    let hashes = dist::neg_binomial_percentile(batches + 1.0, 1.0 / d, pstar)?;
    Ok(hashes / hashrate)
}

/// Valid upper bound on the `pstar`-percentile total time for a fixed
/// confidence split `eps in (0, 1 - pstar)`.
///
/// Union bound over two events: needing more than
/// `x = percentile_passes(pstar / (1 - eps), qm)` passes, and the
/// cumulative proof-of-work effort across those passes exceeding its
/// `(1 - eps)`-percentile. `first_pass_batches` lets the first pass carry a
/// different remaining batch budget than the steady-state `batches`.
#[allow(clippy::too_many_arguments)]
pub fn percentile_bound_total_time(
    eps: f64,
    pstar: f64,
    pass_time: f64,
    d: f64,
    hashrate: f64,
    batches: f64,
    qm: f64,
    first_pass_batches: f64,
) -> Result<f64, ModelError> {
    ensure_percentile(pstar)?;
    ensure_pass_success(qm)?;
    ensure_positive("pass_time", pass_time)?;
    ensure_non_negative("first_pass_batches", first_pass_batches)?;
    let limit = 1.0 - pstar;
    if eps.is_nan() || eps <= 0.0 || eps >= limit {
        return Err(ModelError::InvalidConfidenceSplit { eps, limit });
    }
    let target = pstar / (1.0 - eps);
    if target >= 1.0 {
        return Err(ModelError::InvalidConfidenceSplit { eps, limit });
    }
    let x = percentile_passes(target, qm)?;
    if x == 0 {
        return Ok(0.0);
    }
    let total_batches = first_pass_batches + batches * (x - 1) as f64;
    let pow = percentile_k2pow_time(1.0 - eps, d, hashrate, total_batches)?;
    Ok(pass_time * x as f64 + pow)
}

/// Tightest percentile bound obtainable from the union-bound family.
///
/// Minimizes [`percentile_bound_total_time`] over the confidence split via
/// bounded golden-section search. Still an upper bound on the true
/// percentile, not an exact quantile.
pub fn percentile_total_time(
    pstar: f64,
    pass_time: f64,
    d: f64,
    hashrate: f64,
    batches: f64,
    qm: f64,
    first_pass_batches: f64,
) -> Result<f64, ModelError> {
    ensure_percentile(pstar)?;
    ensure_pass_success(qm)?;
    ensure_positive("pass_time", pass_time)?;
    ensure_positive("d", d)?;
    ensure_positive("hashrate", hashrate)?;
    ensure_non_negative("batches", batches)?;
    ensure_non_negative("first_pass_batches", first_pass_batches)?;
    if pstar == 0.0 {
        return Ok(0.0);
    }
    let head = 1.0 - pstar;
    let lo = head * 1e-9;
    let hi = head * (1.0 - 1e-9);
    let objective = |eps: f64| {
        percentile_bound_total_time(
            eps,
            pstar,
            pass_time,
            d,
            hashrate,
            batches,
            qm,
            first_pass_batches,
        )
        .unwrap_or(f64::INFINITY)
    };
    // The bound is a sawtooth in eps: decreasing within each fixed pass
    // count, jumping up by one pass time at each count boundary. A coarse
    // scan locates the winning tooth; golden-section then polishes it.
    const SCAN_POINTS: usize = 256;
    let step = (hi - lo) / SCAN_POINTS as f64;
    let mut scan_best = (lo, objective(lo));
    for i in 1..=SCAN_POINTS {
        let eps = lo + step * i as f64;
        let value = objective(eps);
        if value < scan_best.1 {
            scan_best = (eps, value);
        }
    }
    let bracket_lo = (scan_best.0 - step).max(lo);
    let bracket_hi = (scan_best.0 + step).min(hi);
    let (eps_best, refined) = dist::minimize_scalar(objective, bracket_lo, bracket_hi);
    let eps_best = if refined <= scan_best.1 {
        eps_best
    } else {
        scan_best.0
    };
    percentile_bound_total_time(
        eps_best,
        pstar,
        pass_time,
        d,
        hashrate,
        batches,
        qm,
        first_pass_batches,
    )
}

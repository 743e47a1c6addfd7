//! Distribution primitives shared by the apriori and mid-pass models.
//!
//! Thin validated wrappers over [`statrs`] for the binomial survival
//! function and the negative-binomial percentile, plus the bounded scalar
//! minimizer used by the percentile-bound search. The negative binomial is
//! parameterized with a real-valued success count, which is required when a
//! partial first pass leaves a fractional batch budget.

use statrs::distribution::{Binomial, DiscreteCDF, NegativeBinomial};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistError {
    #[error("probability {value} for `{name}` outside [0, 1]")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// Survival probability `Pr[Binomial(trials, p) >= k]`.
///
/// # Parameters
/// - `trials`: Number of independent trials.
/// - `p`: Per-trial success probability.
/// - `k`: Threshold success count.
///
/// # Returns
/// The upper-tail probability, or [`DistError::ProbabilityOutOfRange`] when
/// `p` falls outside `[0, 1]`.
pub fn binomial_survival(trials: u64, p: f64, k: u64) -> Result<f64, DistError> {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return Err(DistError::ProbabilityOutOfRange { name: "p", value: p });
    }
    if k == 0 {
        return Ok(1.0);
    }
    if k > trials {
        return Ok(0.0);
    }
    // Degenerate p would feed beta_reg a zero argument; answer directly.
    if p == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(1.0);
    }
    let dist = Binomial::new(p, trials)
        .map_err(|_| DistError::ProbabilityOutOfRange { name: "p", value: p })?;
    // sf(x) = Pr[X > x], so Pr[X >= k] = sf(k - 1).
    Ok(dist.sf(k - 1))
}

/// Percentile (inverse CDF) of a negative binomial, counting failures.
///
/// The distribution counts failures observed before `shape` successes
/// accumulate, with per-trial success probability `p`. `shape` may be any
/// positive real.
///
/// # Parameters
/// - `shape`: Required success count (continuous).
/// - `p`: Per-trial success probability, in `(0, 1]`.
/// - `q`: Target percentile, in `[0, 1)`.
///
/// # Returns
/// Smallest failure count whose CDF reaches `q`.
pub fn neg_binomial_percentile(shape: f64, p: f64, q: f64) -> Result<f64, DistError> {
    if !(shape > 0.0) {
        return Err(DistError::NonPositive {
            name: "shape",
            value: shape,
        });
    }
    if p.is_nan() || !(p > 0.0 && p <= 1.0) {
        return Err(DistError::ProbabilityOutOfRange { name: "p", value: p });
    }
    if q.is_nan() || !(0.0..1.0).contains(&q) {
        return Err(DistError::ProbabilityOutOfRange { name: "q", value: q });
    }
    let dist = NegativeBinomial::new(shape, p)
        .map_err(|_| DistError::ProbabilityOutOfRange { name: "p", value: p })?;
    Ok(dist.inverse_cdf(q) as f64)
}

/// Interval tolerance for [`minimize_scalar`]: 2^-64, floored at machine
/// precision relative to the bracket at run time.
const MINIMIZE_TOL: f64 = 5.421_010_862_427_522e-20;
/// Iteration cap for [`minimize_scalar`]: 2^20.
const MINIMIZE_MAX_ITERS: u32 = 1 << 20;

/// Bounded golden-section minimization of `f` over `[lo, hi]`.
///
/// Returns the best `(x, f(x))` pair among all evaluated points, including
/// both endpoints. The objective need not be unimodal; in that case the
/// result is a good local minimum rather than the global one, which is
/// acceptable for callers whose every objective value is already a valid
/// answer (the percentile union bound).
pub fn minimize_scalar<F>(f: F, lo: f64, hi: f64) -> (f64, f64)
where
    F: Fn(f64) -> f64,
{
    const INV_PHI: f64 = 0.618_033_988_749_894_9;

    let (mut best_x, mut best_f) = (lo, f(lo));
    let f_hi = f(hi);
    if f_hi < best_f {
        best_x = hi;
        best_f = f_hi;
    }

    let mut a = lo;
    let mut b = hi;
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    // An absolute tolerance alone can sit below one ulp of the bracket, at
    // which point the interval stops shrinking; floor it at machine
    // precision relative to the endpoints so the loop always terminates
    // long before the iteration cap.
    let tol = MINIMIZE_TOL.max(f64::EPSILON * lo.abs().max(hi.abs()));
    let mut iters = 0u32;
    while b - a > tol && iters < MINIMIZE_MAX_ITERS {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d);
        }
        iters += 1;
    }

    if fc < best_f {
        best_x = c;
        best_f = fc;
    }
    if fd < best_f {
        best_x = d;
        best_f = fd;
    }
    (best_x, best_f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_survival_exact_small_case() {
        // Pr[Binomial(4, 0.5) >= 2] = 11/16.
        let v = binomial_survival(4, 0.5, 2).unwrap();
        assert!((v - 0.6875).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn binomial_survival_threshold_zero_is_certain() {
        assert_eq!(binomial_survival(10, 0.3, 0).unwrap(), 1.0);
        assert_eq!(binomial_survival(0, 0.3, 0).unwrap(), 1.0);
    }

    #[test]
    fn binomial_survival_threshold_above_trials_is_impossible() {
        assert_eq!(binomial_survival(10, 0.3, 11).unwrap(), 0.0);
        assert_eq!(binomial_survival(0, 0.3, 1).unwrap(), 0.0);
    }

    #[test]
    fn binomial_survival_degenerate_p() {
        assert_eq!(binomial_survival(10, 0.0, 1).unwrap(), 0.0);
        assert_eq!(binomial_survival(10, 1.0, 10).unwrap(), 1.0);
    }

    #[test]
    fn binomial_survival_rejects_bad_probability() {
        assert!(binomial_survival(10, -0.1, 1).is_err());
        assert!(binomial_survival(10, 1.1, 1).is_err());
        assert!(binomial_survival(10, f64::NAN, 1).is_err());
    }

    #[test]
    fn binomial_survival_huge_trial_count() {
        // Poisson regime: n = 2^36, n*p = 26. The tail at 37 is ~2.4%.
        let n = 1u64 << 36;
        let v = binomial_survival(n, 26.0 / n as f64, 37).unwrap();
        assert!(v > 0.02 && v < 0.03, "got {v}");
    }

    #[test]
    fn neg_binomial_percentile_matches_geometric() {
        // shape = 1, p = 0.5: failures before the first success.
        // CDF: 0.5, 0.75, 0.875, ...
        assert_eq!(neg_binomial_percentile(1.0, 0.5, 0.4).unwrap(), 0.0);
        assert_eq!(neg_binomial_percentile(1.0, 0.5, 0.6).unwrap(), 1.0);
        assert_eq!(neg_binomial_percentile(1.0, 0.5, 0.8).unwrap(), 2.0);
    }

    #[test]
    fn neg_binomial_percentile_certain_success_needs_no_failures() {
        assert_eq!(neg_binomial_percentile(3.0, 1.0, 0.99).unwrap(), 0.0);
    }

    #[test]
    fn neg_binomial_percentile_fractional_shape() {
        let v = neg_binomial_percentile(2.5, 0.5, 0.9).unwrap();
        assert!(v.is_finite() && v > 0.0, "got {v}");
    }

    #[test]
    fn neg_binomial_percentile_monotone_in_q() {
        let mut prev = -1.0;
        for q in [0.0, 0.1, 0.5, 0.9, 0.99, 0.999] {
            let v = neg_binomial_percentile(4.0, 0.2, q).unwrap();
            assert!(v >= prev, "percentile regressed at q={q}: {v} < {prev}");
            prev = v;
        }
    }

    #[test]
    fn neg_binomial_percentile_rejects_bad_inputs() {
        assert!(neg_binomial_percentile(0.0, 0.5, 0.5).is_err());
        assert!(neg_binomial_percentile(-1.0, 0.5, 0.5).is_err());
        assert!(neg_binomial_percentile(1.0, 0.0, 0.5).is_err());
        assert!(neg_binomial_percentile(1.0, 1.5, 0.5).is_err());
        assert!(neg_binomial_percentile(1.0, 0.5, 1.0).is_err());
        assert!(neg_binomial_percentile(1.0, 0.5, -0.1).is_err());
    }

    #[test]
    fn minimize_scalar_finds_quadratic_minimum() {
        let (x, fx) = minimize_scalar(|x| (x - 0.3) * (x - 0.3), 0.0, 1.0);
        assert!((x - 0.3).abs() < 1e-9, "got x={x}");
        assert!(fx < 1e-17, "got fx={fx}");
    }

    #[test]
    fn minimize_scalar_monotone_objective_picks_endpoint() {
        let (x, _) = minimize_scalar(|x| -x, 0.0, 1.0);
        assert!((x - 1.0).abs() < 1e-9, "got x={x}");
    }

    #[test]
    fn minimize_scalar_converges_in_bounded_evaluations() {
        use std::cell::Cell;
        // Step objective, constant almost everywhere, like a discrete
        // inverse CDF viewed as a function of the percentile target. The
        // interval must still shrink to the tolerance floor in O(log) steps
        // instead of stalling at a few ulp and spinning to the iteration
        // cap.
        let evals = Cell::new(0u32);
        let (x, fx) = minimize_scalar(
            |x| {
                evals.set(evals.get() + 1);
                if x < 0.3 {
                    2.0
                } else {
                    1.0
                }
            },
            0.0,
            1.0,
        );
        assert!(x >= 0.3, "got x={x}");
        assert_eq!(fx, 1.0);
        assert!(
            evals.get() < 256,
            "golden-section took {} evaluations to converge",
            evals.get()
        );
    }

    #[test]
    fn minimize_scalar_tolerates_infinite_regions() {
        // Objective that is infinite on the right half, as the percentile
        // bound is outside its eps domain.
        let (x, fx) = minimize_scalar(
            |x| if x > 0.5 { f64::INFINITY } else { (x - 0.2).abs() },
            0.0,
            1.0,
        );
        assert!((x - 0.2).abs() < 1e-6, "got x={x}");
        assert!(fx < 1e-6);
    }
}

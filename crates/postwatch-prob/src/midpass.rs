//! Duration estimates conditioned on progress inside the current pass.
//!
//! The refinement rests on memorylessness: if the current pass fails, the
//! remaining time is distributed exactly as the unconditioned model in
//! [`crate::apriori`], so observed progress only changes the current-pass
//! terms and the weight placed on the restart branch.

use crate::apriori;
use crate::dist;
use crate::params::{
    ensure_percentile, ensure_positive, ModelError, PassProgress, ProtocolParams,
};

/// Probability that the current pass still succeeds given partial progress.
///
/// With `n' = floor((1 - gamma) * n)` labels left, a nonce holding `g` good
/// labels succeeds with `Pr[Binomial(n', k1/n) >= k2 - g]` (certainty once
/// `g >= k2`), and the pass succeeds when any nonce does.
///
/// Equals [`apriori::pass_success_prob`] at the start of a pass.
pub fn pass_success_prob(
    progress: &PassProgress,
    params: &ProtocolParams,
) -> Result<f64, ModelError> {
    progress.check_against(params)?;
    let remaining = ((1.0 - progress.gamma) * params.n as f64).floor() as u64;
    let p = params.good_label_prob();
    let mut all_fail = 1.0;
    for &good in &progress.good_labels {
        let nonce_wins = if good >= params.k2 {
            1.0
        } else {
            dist::binomial_survival(remaining, p, params.k2 - good)?
        };
        all_fail *= 1.0 - nonce_wins;
    }
    Ok(1.0 - all_fail)
}

/// Expected remaining duration given mid-pass progress.
///
/// Remaining proof-of-work for the unsolved batches, plus the unread tail of
/// the label sweep, plus the full apriori expectation weighted by the
/// probability that the current pass fails.
pub fn expected_total_time(
    progress: &PassProgress,
    pass_time: f64,
    d: f64,
    hashrate: f64,
    params: &ProtocolParams,
) -> Result<f64, ModelError> {
    ensure_positive("pass_time", pass_time)?;
    progress.check_against(params)?;
    let pow =
        apriori::expected_pass_k2pow_time(d, hashrate, progress.batches_remaining as f64)?;
    let sweep = (1.0 - progress.gamma) * pass_time;
    let z = pass_success_prob(progress, params)?;
    let qm = apriori::pass_success_prob(params)?;
    let restart = apriori::expected_total_time(
        pass_time,
        d,
        hashrate,
        params.batches_per_pass() as f64,
        qm,
    )?;
    Ok(pow + sweep + (1.0 - z) * restart)
}

/// Upper bound on the `pstar`-percentile of the remaining duration.
///
/// Branches on phase:
/// - proof-of-work still pending (`batches_remaining > 0`): the apriori
///   percentile machinery applies with a shortened first pass;
/// - label sweep underway and the current pass already covers `pstar`
///   (`z >= pstar`): only the unread tail remains;
/// - otherwise: the unread tail plus the apriori percentile at the target
///   rescaled by the conditional failure probability, since only the
///   "current pass fails" branch carries mass beyond this pass.
pub fn percentile_total_time(
    pstar: f64,
    progress: &PassProgress,
    pass_time: f64,
    d: f64,
    hashrate: f64,
    params: &ProtocolParams,
) -> Result<f64, ModelError> {
    ensure_percentile(pstar)?;
    ensure_positive("pass_time", pass_time)?;
    ensure_positive("d", d)?;
    ensure_positive("hashrate", hashrate)?;
    progress.check_against(params)?;
    let r = params.batches_per_pass() as f64;
    let qm = apriori::pass_success_prob(params)?;

    if progress.batches_remaining > 0 {
        return apriori::percentile_total_time(
            pstar,
            pass_time,
            d,
            hashrate,
            r,
            qm,
            progress.batches_remaining as f64,
        );
    }

    let z = pass_success_prob(progress, params)?;
    let sweep = (1.0 - progress.gamma) * pass_time;
    if z >= pstar {
        return Ok(sweep);
    }
    let rescaled = 1.0 - (1.0 - pstar) / (1.0 - z);
    let tail = apriori::percentile_total_time(rescaled, pass_time, d, hashrate, r, qm, r)?;
    Ok(sweep + tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> ProtocolParams {
        // Modest label count keeps per-nonce probabilities visible.
        ProtocolParams::new(20, 30, 10_000, 8, 4).unwrap()
    }

    #[test]
    fn zero_progress_matches_apriori_probability() {
        let params = small_params();
        let fresh = PassProgress::start_of_pass(&params);
        let mid = pass_success_prob(&fresh, &params).unwrap();
        let apriori_qm = apriori::pass_success_prob(&params).unwrap();
        assert!(
            (mid - apriori_qm).abs() < 1e-12,
            "mid-pass at zero progress {mid} != apriori {apriori_qm}"
        );
    }

    #[test]
    fn zero_progress_matches_apriori_expectation() {
        let params = small_params();
        let fresh = PassProgress::start_of_pass(&params);
        let (pass_time, d, hashrate) = (500.0, 64.0, 10.0);
        let mid = expected_total_time(&fresh, pass_time, d, hashrate, &params).unwrap();
        let qm = apriori::pass_success_prob(&params).unwrap();
        let r = params.batches_per_pass() as f64;
        let full = apriori::expected_total_time(pass_time, d, hashrate, r, qm).unwrap();
        assert!(
            ((mid - full) / full).abs() < 1e-9,
            "mid-pass at zero progress {mid} != apriori {full}"
        );
    }

    #[test]
    fn winning_nonce_makes_success_certain() {
        let params = small_params();
        let mut tallies = vec![0u64; params.m as usize];
        tallies[3] = params.k2;
        let progress = PassProgress::new(0, 0.9, tallies).unwrap();
        let z = pass_success_prob(&progress, &params).unwrap();
        assert_eq!(z, 1.0);
    }

    #[test]
    fn success_probability_stays_in_unit_interval() {
        let params = small_params();
        for gamma in [0.0, 0.25, 0.5, 0.99, 1.0] {
            for tally in [0u64, 5, 29, 30, 40] {
                let progress =
                    PassProgress::new(0, gamma, vec![tally; params.m as usize]).unwrap();
                let z = pass_success_prob(&progress, &params).unwrap();
                assert!((0.0..=1.0).contains(&z), "z={z} at gamma={gamma}, tally={tally}");
            }
        }
    }

    #[test]
    fn completed_covering_pass_needs_no_more_time() {
        // Sweep finished and one nonce already won: the percentile is fully
        // covered by the current pass.
        let params = small_params();
        let mut tallies = vec![0u64; params.m as usize];
        tallies[0] = params.k2;
        let progress = PassProgress::new(0, 1.0, tallies).unwrap();
        let t = percentile_total_time(0.99, &progress, 500.0, 64.0, 10.0, &params).unwrap();
        assert_eq!(t, 0.0);
    }

    #[test]
    fn doomed_completed_pass_restarts_from_scratch() {
        // Sweep finished with no winner: z = 0, so the remaining time is the
        // full apriori percentile.
        let params = small_params();
        let progress =
            PassProgress::new(0, 1.0, vec![0u64; params.m as usize]).unwrap();
        let z = pass_success_prob(&progress, &params).unwrap();
        assert_eq!(z, 0.0);
        let (pass_time, d, hashrate) = (500.0, 64.0, 10.0);
        let mid =
            percentile_total_time(0.9, &progress, pass_time, d, hashrate, &params).unwrap();
        let qm = apriori::pass_success_prob(&params).unwrap();
        let r = params.batches_per_pass() as f64;
        let full =
            apriori::percentile_total_time(0.9, pass_time, d, hashrate, r, qm, r).unwrap();
        assert!(
            ((mid - full) / full).abs() < 1e-9,
            "doomed pass {mid} != fresh start {full}"
        );
    }

    #[test]
    fn pending_proof_of_work_delegates_with_short_first_pass() {
        let params = small_params();
        let progress = PassProgress::new(1, 0.0, vec![0u64; params.m as usize]).unwrap();
        let (pstar, pass_time, d, hashrate) = (0.75, 500.0, 64.0, 10.0);
        let mid =
            percentile_total_time(pstar, &progress, pass_time, d, hashrate, &params).unwrap();
        let qm = apriori::pass_success_prob(&params).unwrap();
        let r = params.batches_per_pass() as f64;
        let direct =
            apriori::percentile_total_time(pstar, pass_time, d, hashrate, r, qm, 1.0).unwrap();
        assert_eq!(mid.to_bits(), direct.to_bits());
    }

    #[test]
    fn partial_sweep_shrinks_expected_time() {
        // Reading labels without losing ground can only help: compare the
        // sweep-tail contribution at gamma=0 and gamma=0.5 with tallies held
        // proportional.
        let params = small_params();
        let fresh = PassProgress::new(0, 0.0, vec![0u64; params.m as usize]).unwrap();
        let halfway = PassProgress::new(0, 0.5, vec![15u64; params.m as usize]).unwrap();
        let (pass_time, d, hashrate) = (500.0, 64.0, 10.0);
        let t_fresh = expected_total_time(&fresh, pass_time, d, hashrate, &params).unwrap();
        let t_half = expected_total_time(&halfway, pass_time, d, hashrate, &params).unwrap();
        assert!(
            t_half < t_fresh,
            "halfway through with strong tallies should not cost more: {t_half} vs {t_fresh}"
        );
    }

    #[test]
    fn progress_validation_errors_propagate() {
        let params = small_params();
        let wrong_len = PassProgress::new(0, 0.0, vec![0u64; 3]).unwrap();
        assert!(pass_success_prob(&wrong_len, &params).is_err());
        assert!(expected_total_time(&wrong_len, 500.0, 64.0, 10.0, &params).is_err());
        assert!(percentile_total_time(0.9, &wrong_len, 500.0, 64.0, 10.0, &params).is_err());

        let bad_batches = PassProgress::new(9, 0.0, vec![0u64; params.m as usize]).unwrap();
        assert!(pass_success_prob(&bad_batches, &params).is_err());
    }

    // ---------------------------------------------------------------
    // Proptest: property-based / randomized tests
    // ---------------------------------------------------------------

    use proptest::prelude::*;
    use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence, RngAlgorithm};

    fn model_proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 64,
            source_file: Some(file!()),
            failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
                "proptest-regressions",
            ))),
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        }
    }

    proptest! {
        #![proptest_config(model_proptest_config())]

        /// Mid-pass success probability is a probability for arbitrary
        /// progress snapshots.
        #[test]
        fn success_prob_in_unit_interval(
            gamma in 0.0f64..=1.0,
            tallies in proptest::collection::vec(0u64..=35, 8),
        ) {
            let params = small_params();
            let progress = PassProgress::new(0, gamma, tallies).unwrap();
            let z = pass_success_prob(&progress, &params).unwrap();
            prop_assert!((0.0..=1.0).contains(&z), "z={z}");
        }

        /// Extra good labels never lower the current-pass success
        /// probability.
        #[test]
        fn success_prob_monotone_in_tallies(
            gamma in 0.0f64..0.95,
            base in 0u64..=20,
            bump in 1u64..=10,
        ) {
            let params = small_params();
            let low = PassProgress::new(0, gamma, vec![base; params.m as usize]).unwrap();
            let high =
                PassProgress::new(0, gamma, vec![base + bump; params.m as usize]).unwrap();
            let z_low = pass_success_prob(&low, &params).unwrap();
            let z_high = pass_success_prob(&high, &params).unwrap();
            prop_assert!(
                z_high >= z_low - 1e-12,
                "tallies {base}->{} lowered z: {z_low} -> {z_high}",
                base + bump
            );
        }
    }
}

//! Hardware profiles and duration reports.
//!
//! Composes hardware constants with the apriori/mid-pass models into a
//! single report a caller can print or serialize.

use serde::Serialize;

use crate::apriori;
use crate::midpass;
use crate::params::{ensure_percentile, ensure_positive, ModelError, PassProgress, ProtocolParams};

/// Hardware constants of a proving node.
///
/// Throughputs are in labels per second; the proof-of-work rate is hashes
/// per second for a single thread.
#[derive(Debug, Clone, Serialize)]
pub struct NodeProfile {
    pub name: String,
    pub read_throughput: f64,
    pub aes_throughput: f64,
    pub pow_hashrate: f64,
    pub threads: u64,
}

impl NodeProfile {
    pub fn new(
        name: impl Into<String>,
        read_throughput: f64,
        aes_throughput: f64,
        pow_hashrate: f64,
        threads: u64,
    ) -> Result<Self, ModelError> {
        ensure_positive("read_throughput", read_throughput)?;
        ensure_positive("aes_throughput", aes_throughput)?;
        ensure_positive("pow_hashrate", pow_hashrate)?;
        ensure_positive("threads", threads as f64)?;
        Ok(Self {
            name: name.into(),
            read_throughput,
            aes_throughput,
            pow_hashrate,
            threads,
        })
    }

    /// Effective proof-of-work hash rate across all threads.
    pub fn hashrate(&self) -> f64 {
        self.pow_hashrate * self.threads as f64
    }

    /// Time for one full label sweep, limited by the slower of hashing
    /// (split across the `m` nonces) and disk reads.
    pub fn pass_time(&self, params: &ProtocolParams) -> f64 {
        let rate = (self.aes_throughput / params.m as f64).min(self.read_throughput);
        params.n as f64 / rate
    }

    /// Duration report with no observed progress.
    pub fn apriori_report(
        &self,
        params: &ProtocolParams,
        difficulty: f64,
        percentiles: &[f64],
    ) -> Result<DurationReport, ModelError> {
        let qm = apriori::pass_success_prob(params)?;
        let pass_time = self.pass_time(params);
        let hashrate = self.hashrate();
        let r = params.batches_per_pass() as f64;
        let expected_secs =
            apriori::expected_total_time(pass_time, difficulty, hashrate, r, qm)?;
        let mut bounds = Vec::with_capacity(percentiles.len());
        for &pstar in percentiles {
            ensure_percentile(pstar)?;
            let upper_bound_secs = apriori::percentile_total_time(
                pstar, pass_time, difficulty, hashrate, r, qm, r,
            )?;
            bounds.push(PercentileEstimate {
                percentile: pstar,
                upper_bound_secs,
            });
        }
        Ok(DurationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            profile: self.name.clone(),
            phase: "apriori".to_string(),
            params: params.clone(),
            progress: None,
            difficulty,
            pass_time_secs: pass_time,
            hashrate,
            pass_success_prob: qm,
            expected_secs,
            percentiles: bounds,
        })
    }

    /// Duration report refined by mid-pass progress.
    pub fn midpass_report(
        &self,
        params: &ProtocolParams,
        progress: &PassProgress,
        difficulty: f64,
        percentiles: &[f64],
    ) -> Result<DurationReport, ModelError> {
        let pass_time = self.pass_time(params);
        let hashrate = self.hashrate();
        let z = midpass::pass_success_prob(progress, params)?;
        let expected_secs =
            midpass::expected_total_time(progress, pass_time, difficulty, hashrate, params)?;
        let mut bounds = Vec::with_capacity(percentiles.len());
        for &pstar in percentiles {
            ensure_percentile(pstar)?;
            let upper_bound_secs = midpass::percentile_total_time(
                pstar, progress, pass_time, difficulty, hashrate, params,
            )?;
            bounds.push(PercentileEstimate {
                percentile: pstar,
                upper_bound_secs,
            });
        }
        Ok(DurationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            profile: self.name.clone(),
            phase: "mid-pass".to_string(),
            params: params.clone(),
            progress: Some(progress.clone()),
            difficulty,
            pass_time_secs: pass_time,
            hashrate,
            pass_success_prob: z,
            expected_secs,
            percentiles: bounds,
        })
    }
}

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// One percentile of the duration distribution, as a valid upper bound.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileEstimate {
    pub percentile: f64,
    pub upper_bound_secs: f64,
}

/// Full duration estimate for one node profile and protocol.
#[derive(Debug, Clone, Serialize)]
pub struct DurationReport {
    pub schema_version: u32,
    pub profile: String,
    pub phase: String,
    pub params: ProtocolParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<PassProgress>,
    pub difficulty: f64,
    pub pass_time_secs: f64,
    pub hashrate: f64,
    /// Success probability of the current (mid-pass) or next (apriori) pass.
    pub pass_success_prob: f64,
    pub expected_secs: f64,
    pub percentiles: Vec<PercentileEstimate>,
}

impl std::fmt::Display for DurationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Profile \"{}\" ({}):", self.profile, self.phase)?;
        writeln!(
            f,
            "  Pass: {:.1} min sweep, {} batches of difficulty 2^{:.1}, {:.0} hash/s",
            self.pass_time_secs / 60.0,
            self.params.batches_per_pass(),
            self.difficulty.log2(),
            self.hashrate
        )?;
        writeln!(
            f,
            "  Pass success probability: {:.4}",
            self.pass_success_prob
        )?;
        writeln!(f, "  Expected total: {:.1} min", self.expected_secs / 60.0)?;
        for est in &self.percentiles {
            writeln!(
                f,
                "  p{:<4} bound: {:.1} min",
                est.percentile * 100.0,
                est.upper_bound_secs / 60.0
            )?;
        }
        Ok(())
    }
}

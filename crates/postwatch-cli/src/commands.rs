//! Command handlers for the `apriori` and `midpass` subcommands.

use std::fs;
use std::path::PathBuf;

use miette::IntoDiagnostic;
use serde_json::Value;

use postwatch_prob::{DurationReport, NodeProfile, PassProgress, ProtocolParams};

use crate::cli::{OutputArgs, ProfileArgs, ProtocolArgs};

#[derive(Clone, Copy, Debug)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) fn parse_output_format(s: &str) -> miette::Result<OutputFormat> {
    match s {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(miette::miette!(
            "unknown output format '{other}' (expected: text | json)"
        )),
    }
}

pub(crate) fn build_params(args: &ProtocolArgs) -> miette::Result<ProtocolParams> {
    ProtocolParams::new(args.k1, args.k2, args.labels, args.nonces, args.batch_size)
        .into_diagnostic()
}

pub(crate) fn build_profile(args: &ProfileArgs) -> miette::Result<NodeProfile> {
    NodeProfile::new(
        args.profile.clone(),
        args.read_throughput,
        args.aes_throughput,
        args.pow_hashrate,
        args.threads,
    )
    .into_diagnostic()
}

pub(crate) fn write_json_artifact(path: &PathBuf, value: &Value) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, serde_json::to_string_pretty(value).into_diagnostic()?).into_diagnostic()?;
    Ok(())
}

pub(crate) fn emit_report(report: &DurationReport, output: &OutputArgs) -> miette::Result<()> {
    let format = parse_output_format(&output.format)?;
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => {
            let value = serde_json::to_value(report).into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        }
    }
    if let Some(out) = &output.out {
        let value = serde_json::to_value(report).into_diagnostic()?;
        write_json_artifact(out, &value)?;
        if matches!(format, OutputFormat::Text) {
            println!("Report written to {}", out.display());
        }
    }
    Ok(())
}

pub(crate) fn run_apriori_command(
    protocol: &ProtocolArgs,
    hardware: &ProfileArgs,
    output: &OutputArgs,
) -> miette::Result<()> {
    let params = build_params(protocol)?;
    let profile = build_profile(hardware)?;
    tracing::debug!(
        batches_per_pass = params.batches_per_pass(),
        pass_time_secs = profile.pass_time(&params),
        "running apriori estimate"
    );
    let report = profile
        .apriori_report(&params, protocol.difficulty, &output.percentiles)
        .into_diagnostic()?;
    emit_report(&report, output)
}

pub(crate) fn run_midpass_command(
    protocol: &ProtocolArgs,
    hardware: &ProfileArgs,
    output: &OutputArgs,
    batches_remaining: u64,
    gamma: f64,
    good_labels: Vec<u64>,
) -> miette::Result<()> {
    let params = build_params(protocol)?;
    let profile = build_profile(hardware)?;
    let progress =
        PassProgress::new(batches_remaining, gamma, good_labels).into_diagnostic()?;
    tracing::debug!(
        batches_remaining,
        gamma,
        tallies = progress.good_labels.len(),
        "running mid-pass estimate"
    );
    let report = profile
        .midpass_report(&params, &progress, protocol.difficulty, &output.percentiles)
        .into_diagnostic()?;
    emit_report(&report, output)
}

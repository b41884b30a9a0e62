//! Helpers behind the `stagekit` subcommands

use crate::config::SourceConfig;
use anyhow::{anyhow, Context};
use stagekit_client::HttpAssemblySource;
use stagekit_core::{parse_component, Component};
use stagekit_kinematics::{AxisPositions, Pose};
use stagekit_state::SubmitOutcome;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub fn build_source(config: &SourceConfig) -> anyhow::Result<HttpAssemblySource> {
    let source = HttpAssemblySource::new(&config.base_url)
        .with_paths(&config.fetch_path, &config.submit_path);
    if config.timeout_secs == 0 {
        return Ok(source);
    }
    source
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .context("failed to build HTTP client")
}

/// Parse one `ID=POS` displacement, e.g. `3=12.5`.
pub fn parse_axis_position(arg: &str) -> anyhow::Result<(i64, f64)> {
    let (id, pos) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=POS, got {:?}", arg))?;
    let id: i64 = id
        .trim()
        .parse()
        .with_context(|| format!("invalid axis identifier in {:?}", arg))?;
    let pos: f64 = pos
        .trim()
        .parse()
        .with_context(|| format!("invalid axis position in {:?}", arg))?;
    if !pos.is_finite() {
        return Err(anyhow!("axis position must be finite in {:?}", arg));
    }
    Ok((id, pos))
}

/// Later entries for the same identifier win.
pub fn parse_axis_positions(args: &[String]) -> anyhow::Result<AxisPositions> {
    args.iter().map(|arg| parse_axis_position(arg)).collect()
}

/// A component from inline JSON, or from a file when the argument starts with `@`.
pub fn read_component(arg: &str) -> anyhow::Result<Component> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read {}", path))?,
        None => arg.to_string(),
    };
    parse_component(&text).context("component JSON does not describe a component")
}

pub fn format_poses(poses: &BTreeMap<String, Pose>) -> String {
    let width = poses.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, pose) in poses {
        let record = pose.to_record();
        let [x, y, z] = record.translation;
        let [qx, qy, qz, qw] = record.rotation;
        out.push_str(&format!(
            "{:width$}  t=({:.4}, {:.4}, {:.4})  q=[{:.4}, {:.4}, {:.4}, {:.4}]\n",
            name,
            x,
            y,
            z,
            qx,
            qy,
            qz,
            qw,
            width = width
        ));
    }
    out
}

pub fn poses_to_json(poses: &BTreeMap<String, Pose>) -> anyhow::Result<serde_json::Value> {
    let records: BTreeMap<&str, _> = poses
        .iter()
        .map(|(name, pose)| (name.as_str(), pose.to_record()))
        .collect();
    serde_json::to_value(records).context("failed to encode poses as JSON")
}

/// One-line report of where a submission landed.
pub fn describe_submit(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Applied { version } => format!("server version {}", version),
        SubmitOutcome::Stale { request, applied } => format!(
            "accepted by the source as request #{}; request #{} already refreshed the local copy",
            request, applied
        ),
    }
}

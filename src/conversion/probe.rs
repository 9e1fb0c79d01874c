use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Unreadable ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("No video stream found")]
    NoVideoStream,
    #[error("Frame rate unavailable")]
    MissingFrameRate,
    #[error("Duration unavailable")]
    MissingDuration,
}

#[derive(Debug, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeStream {
    pub avg_frame_rate: Option<String>,
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
}

/// Runs ffprobe on the first video stream and estimates its frame count.
pub fn estimate_frame_count(ffprobe: &str, input: &Path) -> Result<u64, ProbeError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=avg_frame_rate,r_frame_rate,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;
    frames_from_probe(&probe)
}

/// fps × duration, truncated toward zero.
pub fn frames_from_probe(probe: &ProbeOutput) -> Result<u64, ProbeError> {
    let stream = probe.streams.first().ok_or(ProbeError::NoVideoStream)?;

    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_frame_rate(rate))
        .ok_or(ProbeError::MissingFrameRate)?;

    let duration = stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_seconds)
        })
        .ok_or(ProbeError::MissingDuration)?;

    Ok((fps * duration).floor() as u64)
}

/// Parses `30000/1001` or `25`. Zero and non-finite rates are rejected.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.trim().split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn parse_seconds(value: &str) -> Option<f64> {
    let seconds: f64 = value.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

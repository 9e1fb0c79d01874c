use crate::constants::{CORRUPT_FRAME_MARKERS, MAX_LOG_LINES, VIDEO_CODEC};
use crate::conversion::probe::{self, ProbeError};
use crate::conversion::progress::{FrameCounter, ProgressLine, ProgressParser};
use crate::presets::{OutputFormat, QualityPreset};
use crate::services::{ValidationError, ValidationService};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use thiserror::Error;

/// Decision returned by the per-frame hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Stop,
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Frame data missing or corrupted.")]
    CorruptFrames,
    #[error("FFmpeg not found. Please install FFmpeg and ensure it's in your PATH.")]
    EncoderNotFound,
    #[error("Conversion cancelled.")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    pub fn user_message(&self, input: &Path) -> String {
        match self {
            Self::Cancelled => self.to_string(),
            other => format!("Error converting {}: {}", input.display(), other),
        }
    }
}

/// Everything the backend needs to write one output file.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub quality: QualityPreset,
}

impl TranscodeRequest {
    pub fn encoder_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), VIDEO_CODEC.to_string()];
        if let Some(preset) = self.quality.encoder_preset() {
            args.push("-preset".to_string());
            args.push(preset.to_string());
        }
        args.push("-c:a".to_string());
        args.push(self.format.audio_codec().to_string());
        args
    }
}

/// The external media toolchain, as seen by the conversion worker.
pub trait MediaBackend: Send + Sync {
    /// First line of the encoder's version banner.
    fn encoder_version(&self) -> Result<String, ValidationError>;

    fn estimate_frames(&self, input: &Path) -> Result<u64, ProbeError>;

    /// Writes `request.output`, calling `on_frame` once per encoded frame.
    /// Returning `FrameControl::Stop` aborts with `EncodeError::Cancelled`.
    fn transcode(
        &self,
        request: &TranscodeRequest,
        on_frame: &mut dyn FnMut() -> FrameControl,
    ) -> Result<(), EncodeError>;
}

/// Runs `ffprobe` and `ffmpeg` as child processes.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn build_command(&self, request: &TranscodeRequest) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-nostdin")
            .arg("-hide_banner")
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-nostats")
            .arg("-progress")
            .arg("pipe:1")
            .arg("-i")
            .arg(&request.input)
            .args(request.encoder_args())
            .arg(&request.output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn abort(child: &mut Child, output: &Path) {
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to kill ffmpeg: {}", e);
        }
        let _ = child.wait();
        if output.exists() {
            if let Err(e) = std::fs::remove_file(output) {
                tracing::warn!("Failed to remove partial output {:?}: {}", output, e);
            }
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_FFMPEG_PATH,
            crate::constants::DEFAULT_FFPROBE_PATH,
        )
    }
}

impl MediaBackend for FfmpegBackend {
    fn encoder_version(&self) -> Result<String, ValidationError> {
        ValidationService::new().check_ffmpeg(&self.ffmpeg)
    }

    fn estimate_frames(&self, input: &Path) -> Result<u64, ProbeError> {
        probe::estimate_frame_count(&self.ffprobe, input)
    }

    fn transcode(
        &self,
        request: &TranscodeRequest,
        on_frame: &mut dyn FnMut() -> FrameControl,
    ) -> Result<(), EncodeError> {
        let mut cmd = self.build_command(request);
        tracing::debug!("Running {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodeError::EncoderNotFound
            } else {
                EncodeError::Io(e)
            }
        })?;

        // Drain stderr on its own thread so a chatty encoder never blocks on a full pipe.
        let stderr_tail = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let mut tail = VecDeque::with_capacity(MAX_LOG_LINES);
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if tail.len() == MAX_LOG_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail)
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let parser = ProgressParser::new();
            let mut counter = FrameCounter::default();

            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                match parser.parse_line(&line) {
                    ProgressLine::Frame(cumulative) => {
                        for _ in 0..counter.advance(cumulative) {
                            if on_frame() == FrameControl::Stop {
                                Self::abort(&mut child, &request.output);
                                return Err(EncodeError::Cancelled);
                            }
                        }
                    }
                    ProgressLine::End => break,
                    ProgressLine::Other => {}
                }
            }
        }

        let status = child.wait()?;
        let stderr_lines = stderr_tail
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(classify_failure(&stderr_lines, &status.to_string()))
        }
    }
}

/// Maps the encoder's final diagnostics onto an `EncodeError`.
pub fn classify_failure(stderr_lines: &[String], status: &str) -> EncodeError {
    let corrupt = stderr_lines.iter().any(|line| {
        let line = line.to_lowercase();
        CORRUPT_FRAME_MARKERS.iter().any(|marker| line.contains(marker))
    });
    if corrupt {
        return EncodeError::CorruptFrames;
    }

    let detail = stderr_lines
        .iter()
        .rev()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("ffmpeg {}", status));
    EncodeError::Failed(detail)
}

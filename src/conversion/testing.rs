//! Scripted in-memory backend for worker and app tests.

use super::backend::{EncodeError, FrameControl, MediaBackend, TranscodeRequest};
use super::probe::ProbeError;
use super::CancellationToken;
use crate::events::{ConversionEvent, EventReceiver};
use crate::services::ValidationError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub(crate) struct FakeFile {
    estimate: Option<u64>,
    frames: u64,
    failure: Option<EncodeError>,
    cancel_after: Option<(u64, CancellationToken)>,
}

impl FakeFile {
    pub(crate) fn ok(frames: u64) -> Self {
        Self {
            estimate: Some(frames),
            frames,
            failure: None,
            cancel_after: None,
        }
    }

    /// Delivers `frames` frames, then fails with `error`.
    pub(crate) fn failing(frames: u64, error: EncodeError) -> Self {
        Self {
            failure: Some(error),
            ..Self::ok(frames)
        }
    }

    pub(crate) fn without_estimate(mut self) -> Self {
        self.estimate = None;
        self
    }

    /// Trips `token` once `frames` frames were accepted, as a user click would.
    pub(crate) fn cancel_after(mut self, frames: u64, token: CancellationToken) -> Self {
        self.cancel_after = Some((frames, token));
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    files: HashMap<PathBuf, FakeFile>,
    attempted: Mutex<Vec<PathBuf>>,
    delivered: Mutex<HashMap<PathBuf, u64>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(mut self, path: &str, file: FakeFile) -> Self {
        self.files.insert(PathBuf::from(path), file);
        self
    }

    pub(crate) fn attempted(&self) -> Vec<PathBuf> {
        self.attempted.lock().unwrap().clone()
    }

    pub(crate) fn frames_delivered(&self, path: &Path) -> u64 {
        self.delivered
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl MediaBackend for FakeBackend {
    fn encoder_version(&self) -> Result<String, ValidationError> {
        Ok("ffmpeg version fake".to_string())
    }

    fn estimate_frames(&self, input: &Path) -> Result<u64, ProbeError> {
        self.files
            .get(input)
            .and_then(|f| f.estimate)
            .ok_or(ProbeError::NoVideoStream)
    }

    fn transcode(
        &self,
        request: &TranscodeRequest,
        on_frame: &mut dyn FnMut() -> FrameControl,
    ) -> Result<(), EncodeError> {
        self.attempted.lock().unwrap().push(request.input.clone());
        let file = self
            .files
            .get(&request.input)
            .ok_or_else(|| EncodeError::Failed("No such file or directory".into()))?;

        let mut accepted = 0;
        for _ in 0..file.frames {
            if let Some((after, token)) = &file.cancel_after {
                if accepted == *after {
                    token.cancel();
                }
            }
            if on_frame() == FrameControl::Stop {
                self.record(&request.input, accepted);
                return Err(EncodeError::Cancelled);
            }
            accepted += 1;
        }
        self.record(&request.input, accepted);

        match &file.failure {
            Some(EncodeError::CorruptFrames) => Err(EncodeError::CorruptFrames),
            Some(other) => Err(EncodeError::Failed(other.to_string())),
            None => Ok(()),
        }
    }
}

impl FakeBackend {
    fn record(&self, input: &Path, frames: u64) {
        self.delivered
            .lock()
            .unwrap()
            .insert(input.to_path_buf(), frames);
    }
}

pub(crate) fn drain(rx: &mut EventReceiver) -> Vec<ConversionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

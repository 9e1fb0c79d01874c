pub mod backend;
pub mod probe;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{EncodeError, FfmpegBackend, FrameControl, MediaBackend, TranscodeRequest};
pub use progress::ProgressTracker;

use crate::events::{emit, ConversionEvent, EventSender};
use crate::presets::{OutputFormat, QualityPreset};
use crate::services::file_service::{plan_output, OutputPlan, OverwritePolicy};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use uuid::Uuid;

/// One batch run. Immutable once the worker has started.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: Uuid,
    pub inputs: Vec<PathBuf>,
    pub format: OutputFormat,
    pub quality: QualityPreset,
    pub output_dir: PathBuf,
    pub overwrite: OverwritePolicy,
}

impl ConversionJob {
    pub fn new(
        inputs: Vec<PathBuf>,
        format: OutputFormat,
        quality: QualityPreset,
        output_dir: PathBuf,
        overwrite: OverwritePolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            inputs,
            format,
            quality,
            output_dir,
            overwrite,
        }
    }
}

/// Set once by the UI thread, polled by the worker at every checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} converted", self.converted)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(BatchSummary),
    Cancelled(BatchSummary),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to start conversion worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Conversion worker stopped unexpectedly")]
    Panicked,
}

/// Handle to the background thread running one job.
pub struct ConversionWorker {
    job_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<JobOutcome>,
}

impl ConversionWorker {
    pub fn spawn(
        job: ConversionJob,
        backend: Arc<dyn MediaBackend>,
        events: EventSender,
    ) -> Result<Self, WorkerError> {
        let cancel = CancellationToken::new();
        let job_id = job.id;
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("conversion-worker".to_string())
            .spawn(move || run_job(&job, backend.as_ref(), &worker_cancel, &events))?;

        Ok(Self {
            job_id,
            cancel,
            handle,
        })
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the worker thread exits.
    pub fn join(self) -> Result<JobOutcome, WorkerError> {
        self.handle.join().map_err(|_| WorkerError::Panicked)
    }

    pub fn cancel_and_wait(self) -> Result<JobOutcome, WorkerError> {
        self.cancel();
        self.join()
    }
}

fn estimate_total_frames(job: &ConversionJob, backend: &dyn MediaBackend) -> u64 {
    job.inputs
        .iter()
        .map(|input| match backend.estimate_frames(input) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!("Error getting total frames for {:?}: {}", input, e);
                0
            }
        })
        .fold(0u64, u64::saturating_add)
}

/// Converts every input of `job` in order. Emits exactly one terminal
/// event (`Completed` or `Cancelled`) before returning.
pub fn run_job(
    job: &ConversionJob,
    backend: &dyn MediaBackend,
    cancel: &CancellationToken,
    events: &EventSender,
) -> JobOutcome {
    let span = tracing::info_span!("conversion_job", job_id = %job.id);
    let _guard = span.enter();

    tracing::info!(
        "Converting {} file(s) to {} ({} quality) into {:?}",
        job.inputs.len(),
        job.format,
        job.quality,
        job.output_dir
    );

    let mut tracker = ProgressTracker::new(estimate_total_frames(job, backend));
    tracing::debug!("Estimated {} frames in total", tracker.total_frames());
    emit(events, ConversionEvent::Progress(0));

    let mut summary = BatchSummary::default();
    let total = job.inputs.len();

    for (index, input) in job.inputs.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        let output = match plan_output(input, &job.output_dir, job.format, job.overwrite) {
            Ok(OutputPlan::Write(path)) => path,
            Ok(OutputPlan::Skip(path)) => {
                tracing::info!("Skipping {:?}, {:?} already exists", input, path);
                summary.skipped += 1;
                emit(
                    events,
                    ConversionEvent::FileSkipped {
                        input: input.clone(),
                        output: path,
                    },
                );
                continue;
            }
            Err(e) => {
                tracing::error!("Cannot convert {:?}: {}", input, e);
                summary.failed += 1;
                emit(
                    events,
                    ConversionEvent::FileError {
                        input: input.clone(),
                        message: format!("Error converting {}: {}", input.display(), e),
                    },
                );
                continue;
            }
        };

        emit(
            events,
            ConversionEvent::FileStarted {
                index,
                total,
                input: input.clone(),
            },
        );

        let request = TranscodeRequest {
            input: input.clone(),
            output: output.clone(),
            format: job.format,
            quality: job.quality,
        };

        let mut on_frame = || {
            if cancel.is_cancelled() {
                return FrameControl::Stop;
            }
            if let Some(percent) = tracker.record_frame() {
                emit(events, ConversionEvent::Progress(percent));
            }
            FrameControl::Continue
        };

        match backend.transcode(&request, &mut on_frame) {
            Ok(()) => {
                tracing::info!("Converted {:?} -> {:?}", input, output);
                summary.converted += 1;
                emit(
                    events,
                    ConversionEvent::FileFinished {
                        input: input.clone(),
                        output,
                    },
                );
            }
            Err(EncodeError::Cancelled) => break,
            Err(e) => {
                tracing::error!("Conversion of {:?} failed: {}", input, e);
                summary.failed += 1;
                emit(
                    events,
                    ConversionEvent::FileError {
                        input: input.clone(),
                        message: e.user_message(input),
                    },
                );
            }
        }
    }

    if cancel.is_cancelled() {
        tracing::info!("Conversion cancelled: {}", summary);
        emit(events, ConversionEvent::Cancelled);
        return JobOutcome::Cancelled(summary);
    }

    if let Some(percent) = tracker.finish() {
        emit(events, ConversionEvent::Progress(percent));
    }
    tracing::info!("Conversion finished: {}", summary);
    emit(events, ConversionEvent::Completed);
    JobOutcome::Completed(summary)
}

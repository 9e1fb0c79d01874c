use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running {
        job_id: Uuid,
        start_time: Instant,
        percent: u8,
        current_file: Option<PathBuf>,
        file_index: usize,
        file_count: usize,
        errors: usize,
    },
    Completed {
        job_id: Uuid,
        duration: Duration,
        errors: usize,
    },
    Cancelled {
        job_id: Uuid,
    },
}

impl JobState {
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            JobState::Running { job_id, .. }
            | JobState::Completed { job_id, .. }
            | JobState::Cancelled { job_id } => Some(*job_id),
            JobState::Idle => None,
        }
    }

    pub fn percent(&self) -> u8 {
        match self {
            JobState::Running { percent, .. } => *percent,
            JobState::Completed { .. } => 100,
            _ => 0,
        }
    }

    pub fn transition_to_running(job_id: Uuid, file_count: usize) -> Self {
        JobState::Running {
            job_id,
            start_time: Instant::now(),
            percent: 0,
            current_file: None,
            file_index: 0,
            file_count,
            errors: 0,
        }
    }

    /// Progress never moves backwards within a job.
    pub fn update_progress(&mut self, new_percent: u8) {
        if let JobState::Running { percent, .. } = self {
            *percent = (*percent).max(new_percent.min(100));
        }
    }

    pub fn start_file(&mut self, index: usize, input: PathBuf) {
        if let JobState::Running {
            current_file,
            file_index,
            ..
        } = self
        {
            *current_file = Some(input);
            *file_index = index;
        }
    }

    pub fn record_error(&mut self) {
        if let JobState::Running { errors, .. } = self {
            *errors += 1;
        }
    }

    pub fn transition_to_completed(self) -> Self {
        match self {
            JobState::Running {
                job_id,
                start_time,
                errors,
                ..
            } => JobState::Completed {
                job_id,
                duration: start_time.elapsed(),
                errors,
            },
            _ => self,
        }
    }

    pub fn transition_to_cancelled(self) -> Self {
        match self {
            JobState::Running { job_id, .. } => JobState::Cancelled { job_id },
            _ => self,
        }
    }

    pub fn reset_to_idle(&mut self) {
        *self = JobState::Idle;
    }
}

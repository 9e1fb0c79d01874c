use crate::config::AppConfig;
use crate::constants::VIDEO_EXTENSIONS;
use crate::conversion::{ConversionJob, ConversionWorker, FfmpegBackend, MediaBackend};
use crate::events::{create_event_channel, ConversionEvent, EventReceiver};
use crate::presets::{OutputFormat, QualityPreset};
use crate::services::file_service::is_supported_input;
use crate::services::{OverwritePolicy, ValidationError, ValidationService};
use crate::state::JobState;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SELECT_VIDEOS_LABEL: &str = "Select Videos to Convert";
pub const SELECT_FOLDER_LABEL: &str = "Select Output Folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A modal message waiting to be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn info(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

pub struct ConverterApp {
    pub videos: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub quality: QualityPreset,
    pub overwrite: OverwritePolicy,
    pub status_label: String,
    pub folder_label: String,
    pub state: JobState,
    pub notices: VecDeque<Notice>,
    pub file_log: Vec<String>,
    pub ffmpeg_version: Option<String>,
    pub config: AppConfig,
    config_path: Option<PathBuf>,
    backend: Arc<dyn MediaBackend>,
    validation: ValidationService,
    worker: Option<ConversionWorker>,
    event_receiver: Option<EventReceiver>,
}

impl ConverterApp {
    pub fn new() -> Self {
        let config = AppConfig::load();
        let backend = Arc::new(FfmpegBackend::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
        ));

        let mut app = Self::with_backend(config, AppConfig::default_path(), backend);
        app.check_ffmpeg();
        app
    }

    pub fn with_backend(
        config: AppConfig,
        config_path: Option<PathBuf>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            videos: Vec::new(),
            output_dir: None,
            format: config.output_format,
            quality: config.quality,
            overwrite: config.overwrite_policy,
            status_label: SELECT_VIDEOS_LABEL.to_string(),
            folder_label: SELECT_FOLDER_LABEL.to_string(),
            state: JobState::default(),
            notices: VecDeque::new(),
            file_log: Vec::new(),
            ffmpeg_version: None,
            config,
            config_path,
            backend,
            validation: ValidationService::new(),
            worker: None,
            event_receiver: None,
        }
    }

    /// Records the encoder version, or queues an error notice.
    fn check_ffmpeg(&mut self) -> bool {
        match self.backend.encoder_version() {
            Ok(version) => {
                tracing::info!("Using {}", version);
                self.ffmpeg_version = Some(version);
                true
            }
            Err(e) => {
                tracing::error!("FFmpeg check failed: {}", e);
                self.ffmpeg_version = None;
                self.notices.push_back(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn is_converting(&self) -> bool {
        self.worker.is_some()
    }

    pub fn can_start(&self) -> bool {
        !self.is_converting() && !self.videos.is_empty() && self.output_dir.is_some()
    }

    pub fn select_videos(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Select Videos")
            .add_filter("Video Files", VIDEO_EXTENSIONS);

        if let Some(ref dir) = self.config.last_input_dir {
            dialog = dialog.set_directory(dir);
        }

        if let Some(files) = dialog.pick_files() {
            self.set_videos(files);
        }
    }

    pub fn set_videos(&mut self, files: Vec<PathBuf>) {
        let (supported, rejected): (Vec<PathBuf>, Vec<PathBuf>) =
            files.into_iter().partition(|p| is_supported_input(p));
        for path in &rejected {
            tracing::warn!("Ignoring unsupported file {:?}", path);
        }
        if supported.is_empty() {
            return;
        }

        self.config.update_last_input_dir(&supported[0]);
        self.status_label = format!("Selected {} video(s)", supported.len());
        self.videos = supported;
        self.save_config();
    }

    pub fn select_output_folder(&mut self) {
        let mut dialog = rfd::FileDialog::new().set_title("Select Output Folder");

        if let Some(ref dir) = self.config.last_output_dir {
            dialog = dialog.set_directory(dir);
        }

        if let Some(folder) = dialog.pick_folder() {
            self.set_output_dir(folder);
        }
    }

    pub fn set_output_dir(&mut self, folder: PathBuf) {
        self.config.update_last_output_dir(&folder);
        self.folder_label = format!("Output Folder: {}", folder.display());
        self.output_dir = Some(folder);
        self.save_config();
    }

    /// Persists the format, quality and overwrite pickers.
    pub fn settings_changed(&mut self) {
        self.config.output_format = self.format;
        self.config.quality = self.quality;
        self.config.overwrite_policy = self.overwrite;
        self.save_config();
    }

    pub fn start_conversion(&mut self) {
        if self.is_converting() {
            return;
        }

        if let Err(e) = self
            .validation
            .validate_job(&self.videos, self.output_dir.as_deref())
        {
            match e {
                ValidationError::MissingInputFiles | ValidationError::MissingOutputFolder => {
                    self.status_label = e.to_string();
                }
                other => self.notices.push_back(Notice::error(other.to_string())),
            }
            return;
        }
        let Some(output_dir) = self.output_dir.clone() else {
            return;
        };
        if !self.check_ffmpeg() {
            return;
        }

        let job = ConversionJob::new(
            self.videos.clone(),
            self.format,
            self.quality,
            output_dir,
            self.overwrite,
        );
        let job_id = job.id;
        let file_count = job.inputs.len();
        let (tx, rx) = create_event_channel();

        match ConversionWorker::spawn(job, Arc::clone(&self.backend), tx) {
            Ok(worker) => {
                tracing::info!("Started conversion job {}", job_id);
                self.worker = Some(worker);
                self.event_receiver = Some(rx);
                self.state = JobState::transition_to_running(job_id, file_count);
                self.file_log.clear();
                self.status_label = "Converting...".to_string();
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.notices.push_back(Notice::error(e.to_string()));
            }
        }
    }

    /// Requests cancellation and blocks until the worker has stopped.
    pub fn cancel_conversion(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        tracing::info!("Cancelling conversion job {}", worker.job_id());

        if let Err(e) = worker.cancel_and_wait() {
            self.notices.push_back(Notice::error(e.to_string()));
        }
        self.drain_events();
        self.event_receiver = None;
        if self.state.is_running() {
            self.state = std::mem::take(&mut self.state).transition_to_cancelled();
        }

        self.reset_selection();
        if matches!(self.state, JobState::Cancelled { .. }) {
            self.status_label = "Conversion Cancelled.".to_string();
        }
    }

    /// Applies every event the worker has sent since the last call.
    pub fn poll_events(&mut self) {
        self.drain_events();

        let worker_exited = self.worker.as_ref().is_some_and(|w| w.is_finished());
        if worker_exited && self.state.is_running() {
            // Events sent right before the thread exited.
            self.drain_events();
        }
        if worker_exited || !self.state.is_running() {
            self.finish_worker();
        }
    }

    fn drain_events(&mut self) {
        let mut events = Vec::new();
        if let Some(rx) = self.event_receiver.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ConversionEvent) {
        match event {
            ConversionEvent::Progress(percent) => self.state.update_progress(percent),
            ConversionEvent::FileStarted {
                index,
                total,
                input,
            } => {
                self.status_label = format!(
                    "Converting {} of {}: {}",
                    index + 1,
                    total,
                    display_name(&input)
                );
                self.state.start_file(index, input);
            }
            ConversionEvent::FileFinished { input, output } => {
                self.file_log
                    .push(format!("✔ {} → {}", display_name(&input), output.display()));
            }
            ConversionEvent::FileSkipped { input, output } => {
                self.file_log.push(format!(
                    "⏭ {} skipped, {} exists",
                    display_name(&input),
                    output.display()
                ));
            }
            ConversionEvent::FileError { input, message } => {
                self.state.record_error();
                self.file_log.push(format!("✖ {}", display_name(&input)));
                self.notices.push_back(Notice::error(message));
            }
            ConversionEvent::Cancelled => {
                tracing::info!("Job {:?} cancelled", self.state.job_id());
                self.state = std::mem::take(&mut self.state).transition_to_cancelled();
                self.notices
                    .push_back(Notice::info("Conversion Cancelled", "Conversion cancelled."));
            }
            ConversionEvent::Completed => {
                tracing::info!("Job {:?} completed", self.state.job_id());
                self.state = std::mem::take(&mut self.state).transition_to_completed();
                let message = match self.state {
                    JobState::Completed { errors: 0, .. } => {
                        "All videos have been successfully converted!".to_string()
                    }
                    JobState::Completed { errors, .. } => {
                        format!("Conversion finished with {} error(s).", errors)
                    }
                    _ => "Conversion finished.".to_string(),
                };
                self.notices
                    .push_back(Notice::info("Conversion Complete", message));
                self.reset_selection();
            }
        }
    }

    fn finish_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.event_receiver = None;

        match worker.join() {
            Ok(outcome) => tracing::debug!("Worker exited: {:?}", outcome),
            Err(e) => {
                tracing::error!("{}", e);
                self.notices.push_back(Notice::error(e.to_string()));
                self.state.reset_to_idle();
                self.reset_selection();
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    fn reset_selection(&mut self) {
        self.videos.clear();
        self.output_dir = None;
        self.status_label = SELECT_VIDEOS_LABEL.to_string();
        self.folder_label = SELECT_FOLDER_LABEL.to_string();
    }

    fn save_config(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                tracing::warn!("Failed to save config: {}", e);
            }
        }
    }
}

impl Default for ConverterApp {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::testing::{FakeBackend, FakeFile};
    use crate::conversion::EncodeError;
    use std::time::{Duration, Instant};

    fn app(backend: FakeBackend) -> ConverterApp {
        ConverterApp::with_backend(AppConfig::default(), None, Arc::new(backend))
    }

    fn wait_until_done(app: &mut ConverterApp) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.is_converting() {
            assert!(Instant::now() < deadline, "conversion did not finish");
            app.poll_events();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn titles(app: &ConverterApp) -> Vec<&str> {
        app.notices.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_start_requires_selection() {
        let mut app = app(FakeBackend::new());
        app.start_conversion();
        assert_eq!(app.status_label, "Please select videos first.");
        assert!(!app.is_converting());

        app.set_videos(vec![PathBuf::from("/in/a.mov")]);
        app.start_conversion();
        assert_eq!(app.status_label, "Please select an output folder.");
        assert!(!app.is_converting());
    }

    #[test]
    fn test_unsupported_files_are_filtered() {
        let mut app = app(FakeBackend::new());
        app.set_videos(vec![
            PathBuf::from("/in/a.mov"),
            PathBuf::from("/in/notes.txt"),
            PathBuf::from("/in/b.MP4"),
        ]);
        assert_eq!(app.videos.len(), 2);
        assert_eq!(app.status_label, "Selected 2 video(s)");
    }

    #[test]
    fn test_successful_batch_shows_single_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(
            FakeBackend::new()
                .with_file("/in/a.mov", FakeFile::ok(12))
                .with_file("/in/b.mov", FakeFile::ok(8)),
        );
        app.set_videos(vec![PathBuf::from("/in/a.mov"), PathBuf::from("/in/b.mov")]);
        app.set_output_dir(dir.path().to_path_buf());

        app.start_conversion();
        assert!(app.is_converting());
        assert!(!app.can_start());
        wait_until_done(&mut app);

        assert_eq!(titles(&app), vec!["Conversion Complete"]);
        assert_eq!(
            app.notices[0].message,
            "All videos have been successfully converted!"
        );
        assert!(matches!(app.state, JobState::Completed { errors: 0, .. }));
        assert_eq!(app.state.percent(), 100);
        assert!(app.videos.is_empty());
        assert!(app.output_dir.is_none());
        assert_eq!(app.file_log.len(), 2);
    }

    #[test]
    fn test_file_errors_are_shown_and_batch_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(
            FakeBackend::new()
                .with_file("/in/a.mov", FakeFile::failing(2, EncodeError::CorruptFrames))
                .with_file("/in/b.mov", FakeFile::ok(8)),
        );
        app.set_videos(vec![PathBuf::from("/in/a.mov"), PathBuf::from("/in/b.mov")]);
        app.set_output_dir(dir.path().to_path_buf());

        app.start_conversion();
        wait_until_done(&mut app);

        assert_eq!(titles(&app), vec!["Error", "Conversion Complete"]);
        assert_eq!(app.notices[0].kind, NoticeKind::Error);
        assert_eq!(
            app.notices[1].message,
            "Conversion finished with 1 error(s)."
        );

        app.dismiss_notice();
        assert_eq!(titles(&app), vec!["Conversion Complete"]);
    }

    #[test]
    fn test_cancel_waits_for_worker_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(
            FakeBackend::new()
                .with_file("/in/a.mov", FakeFile::ok(200_000))
                .with_file("/in/b.mov", FakeFile::ok(200_000)),
        );
        app.set_videos(vec![PathBuf::from("/in/a.mov"), PathBuf::from("/in/b.mov")]);
        app.set_output_dir(dir.path().to_path_buf());

        app.start_conversion();
        app.cancel_conversion();

        assert!(!app.is_converting());
        assert!(!app.state.is_running());
        assert!(app.videos.is_empty());
        let terminal = titles(&app)
            .into_iter()
            .filter(|t| *t == "Conversion Cancelled" || *t == "Conversion Complete")
            .count();
        assert_eq!(terminal, 1);
        if titles(&app).contains(&"Conversion Cancelled") {
            assert_eq!(app.status_label, "Conversion Cancelled.");
        } else {
            assert_eq!(app.status_label, SELECT_VIDEOS_LABEL);
        }
    }

    #[test]
    fn test_cancel_after_completion_keeps_completed_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(FakeBackend::new().with_file("/in/a.mov", FakeFile::ok(4)));
        app.set_videos(vec![PathBuf::from("/in/a.mov")]);
        app.set_output_dir(dir.path().to_path_buf());

        app.start_conversion();
        let deadline = Instant::now() + Duration::from_secs(10);
        while !app.worker.as_ref().unwrap().is_finished() {
            assert!(Instant::now() < deadline, "worker did not exit");
            std::thread::sleep(Duration::from_millis(5));
        }
        app.cancel_conversion();

        assert_eq!(titles(&app), vec!["Conversion Complete"]);
        assert!(matches!(app.state, JobState::Completed { .. }));
        assert_eq!(app.status_label, SELECT_VIDEOS_LABEL);
    }

    #[test]
    fn test_missing_ffmpeg_blocks_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.ffmpeg_path = "definitely-not-a-real-ffmpeg".to_string();
        let backend = FfmpegBackend::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());
        let mut app = ConverterApp::with_backend(config, None, Arc::new(backend));
        app.set_videos(vec![PathBuf::from("/in/a.mov")]);
        app.set_output_dir(dir.path().to_path_buf());

        app.start_conversion();

        assert!(!app.is_converting());
        assert_eq!(app.state, JobState::Idle);
        assert_eq!(titles(&app), vec!["Error"]);
        assert_eq!(
            app.notices[0].message,
            ValidationError::FFmpegNotAvailable.to_string()
        );
        assert!(app.ffmpeg_version.is_none());
    }

    #[test]
    fn test_settings_changes_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = ConverterApp::with_backend(
            AppConfig::default(),
            Some(path.clone()),
            Arc::new(FakeBackend::new()),
        );

        app.format = OutputFormat::Mkv;
        app.quality = QualityPreset::Low;
        app.settings_changed();

        let saved = AppConfig::load_from(&path);
        assert_eq!(saved.output_format, OutputFormat::Mkv);
        assert_eq!(saved.quality, QualityPreset::Low);
    }
}

use crate::services::file_service::is_supported_input;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select videos first.")]
    MissingInputFiles,
    #[error("Please select an output folder.")]
    MissingOutputFolder,
    #[error("Output folder does not exist: {path}")]
    OutputDirectoryNotFound { path: String },
    #[error("Insufficient permissions for output folder: {path}")]
    OutputPermissionDenied { path: String },
    #[error("Unsupported input file format: {path}")]
    UnsupportedInputFormat { path: String },
    #[error("FFmpeg not found. Please install FFmpeg and ensure it's in your PATH.")]
    FFmpegNotAvailable,
    #[error("FFmpeg not working properly")]
    FFmpegBroken,
}

#[derive(Clone, Default)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Checks a job before the worker is spawned.
    pub fn validate_job(
        &self,
        inputs: &[PathBuf],
        output_dir: Option<&Path>,
    ) -> Result<(), ValidationError> {
        if inputs.is_empty() {
            return Err(ValidationError::MissingInputFiles);
        }
        let output_dir = output_dir.ok_or(ValidationError::MissingOutputFolder)?;

        if let Some(bad) = inputs.iter().find(|p| !is_supported_input(p)) {
            return Err(ValidationError::UnsupportedInputFormat {
                path: bad.display().to_string(),
            });
        }

        self.validate_output_dir(output_dir)
    }

    pub fn validate_output_dir(&self, dir: &Path) -> Result<(), ValidationError> {
        if !dir.is_dir() {
            return Err(ValidationError::OutputDirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        // Check write permissions by attempting to create a test file
        let test_file = dir.join(".write_test_temp");
        match std::fs::write(&test_file, b"test") {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_file);
                Ok(())
            }
            Err(_) => Err(ValidationError::OutputPermissionDenied {
                path: dir.display().to_string(),
            }),
        }
    }

    /// Returns the first line of `ffmpeg -version`.
    pub fn check_ffmpeg(&self, ffmpeg: &str) -> Result<String, ValidationError> {
        let output = Command::new(ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|_| ValidationError::FFmpegNotAvailable)?;

        if !output.status.success() {
            return Err(ValidationError::FFmpegBroken);
        }

        let version_info = String::from_utf8_lossy(&output.stdout);
        Ok(version_info.lines().next().unwrap_or_default().to_string())
    }
}

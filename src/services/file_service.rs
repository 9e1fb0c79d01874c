use crate::constants::{MAX_RENAME_ATTEMPTS, VIDEO_EXTENSIONS};
use crate::presets::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What to do when the derived output file already exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    Overwrite,
    Skip,
    Rename,
}

impl OverwritePolicy {
    pub const ALL: [OverwritePolicy; 3] = [
        OverwritePolicy::Overwrite,
        OverwritePolicy::Skip,
        OverwritePolicy::Rename,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            OverwritePolicy::Overwrite => "Overwrite existing files",
            OverwritePolicy::Skip => "Skip existing files",
            OverwritePolicy::Rename => "Keep both (add _1, _2, ...)",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Input has no file name")]
    NoFileName,
    #[error("Output would overwrite the input file")]
    SameAsInput,
    #[error("No free output name next to {path}")]
    NoFreeName { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    Write(PathBuf),
    Skip(PathBuf),
}

/// `output_dir/<input stem>.<format extension>`.
pub fn derive_output_path(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf, PlanError> {
    let stem = input.file_stem().ok_or(PlanError::NoFileName)?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.extension());
    Ok(output_dir.join(name))
}

pub fn plan_output(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
    policy: OverwritePolicy,
) -> Result<OutputPlan, PlanError> {
    let path = derive_output_path(input, output_dir, format)?;
    let collides_with_input = same_file(input, &path);

    if !path.exists() && !collides_with_input {
        return Ok(OutputPlan::Write(path));
    }

    match policy {
        OverwritePolicy::Overwrite if collides_with_input => Err(PlanError::SameAsInput),
        OverwritePolicy::Overwrite => Ok(OutputPlan::Write(path)),
        OverwritePolicy::Skip if collides_with_input => Err(PlanError::SameAsInput),
        OverwritePolicy::Skip => Ok(OutputPlan::Skip(path)),
        OverwritePolicy::Rename => ensure_unique_output_path(&path).map(OutputPlan::Write),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// First `stem_N.ext` next to `path` that does not exist yet.
pub fn ensure_unique_output_path(path: &Path) -> Result<PathBuf, PlanError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or(PlanError::NoFileName)?;
    let extension = path.extension().map(|s| s.to_string_lossy().to_string());

    for counter in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(new_name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(PlanError::NoFreeName {
        path: path.display().to_string(),
    })
}

/// Extension filter used by the open dialog and job validation.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

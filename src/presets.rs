use serde::{Deserialize, Serialize};
use std::fmt;

/// Output containers offered in the format picker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Avi,
    Mkv,
    Mov,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Mp4,
        OutputFormat::Avi,
        OutputFormat::Mkv,
        OutputFormat::Mov,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Avi => "avi",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Mov => "mov",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "MP4 - Most compatible",
            OutputFormat::Avi => "AVI - Legacy format",
            OutputFormat::Mkv => "MKV - Supports all codecs",
            OutputFormat::Mov => "MOV - QuickTime",
        }
    }

    /// Audio encoder that the container accepts alongside H.264.
    pub fn audio_codec(&self) -> &'static str {
        match self {
            OutputFormat::Avi => "libmp3lame",
            OutputFormat::Mp4 | OutputFormat::Mkv | OutputFormat::Mov => "aac",
        }
    }

}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Speed/quality trade-off requested from the encoder. Persisted by label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "&'static str")]
pub enum QualityPreset {
    Original,
    Low,
    #[default]
    Medium,
    High,
}

/// Preset label, x264 `-preset` value. `None` keeps the encoder default.
static QUALITY_TABLE: [(QualityPreset, &str, Option<&str>); 4] = [
    (QualityPreset::Original, "Original", None),
    (QualityPreset::Low, "low", Some("veryfast")),
    (QualityPreset::Medium, "medium", Some("medium")),
    (QualityPreset::High, "high", Some("slow")),
];

impl QualityPreset {
    pub const ALL: [QualityPreset; 4] = [
        QualityPreset::Original,
        QualityPreset::Low,
        QualityPreset::Medium,
        QualityPreset::High,
    ];

    fn row(&self) -> &'static (QualityPreset, &'static str, Option<&'static str>) {
        // The table covers every variant, Medium is the last-resort row.
        QUALITY_TABLE
            .iter()
            .find(|(preset, _, _)| preset == self)
            .unwrap_or(&QUALITY_TABLE[2])
    }

    pub fn label(&self) -> &'static str {
        self.row().1
    }

    pub fn encoder_preset(&self) -> Option<&'static str> {
        self.row().2
    }

    /// Unrecognized labels resolve to `Medium`.
    pub fn from_label(label: &str) -> Self {
        QUALITY_TABLE
            .iter()
            .find(|(_, name, _)| *name == label)
            .map(|(preset, _, _)| *preset)
            .unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        match self {
            QualityPreset::Original => "Encoder defaults",
            QualityPreset::Low => "Fastest encode, largest loss",
            QualityPreset::Medium => "Balanced",
            QualityPreset::High => "Slowest encode, best quality",
        }
    }
}

impl From<String> for QualityPreset {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<QualityPreset> for &'static str {
    fn from(preset: QualityPreset) -> Self {
        preset.label()
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

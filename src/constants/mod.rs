// App Constants
pub const APP_NAME: &str = "Video Converter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONFIG_DIR_NAME: &str = "video-batch-converter";

// FFmpeg Constants
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";
pub const VIDEO_CODEC: &str = "libx264";
pub const PROGRESS_UPDATE_INTERVAL_MS: u64 = 100;

// File handling
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov"];
pub const MAX_RENAME_ATTEMPTS: u32 = 1000;

// Number of encoder stderr lines kept for error reporting
pub const MAX_LOG_LINES: usize = 50;

// Encoder diagnostics that mean the input's frame data is unusable
pub const CORRUPT_FRAME_MARKERS: &[&str] = &[
    "invalid data found when processing input",
    "moov atom not found",
    "error while decoding",
    "corrupt decoded frame",
    "missing picture in access unit",
    "invalid nal unit size",
];

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

pub const VIDEO_OUTPUT_ENV: &str = "DEMUX_VIDEO_OUTPUT";
pub const AUDIO_OUTPUT_ENV: &str = "DEMUX_AUDIO_OUTPUT";

/// Where the raw outputs go. Both files are truncated on every run.
pub struct OutputConfig {
    video: PathBuf,
    audio: PathBuf,
}

impl OutputConfig {
    pub fn new(video: impl Into<PathBuf>, audio: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
        }
    }

    /// Defaults overridden by `DEMUX_VIDEO_OUTPUT` / `DEMUX_AUDIO_OUTPUT`.
    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // raw video, despite the extension
        let video = lookup(VIDEO_OUTPUT_ENV).unwrap_or_else(|| "test.h264".to_string());
        let audio = lookup(AUDIO_OUTPUT_ENV).unwrap_or_else(|| "test.pcm".to_string());
        Self::new(video, audio)
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }
}

pub fn config() -> &'static OutputConfig {
    static CONFIG: LazyLock<OutputConfig> =
        LazyLock::new(|| OutputConfig::from_env(|key| std::env::var(key).ok()));
    &CONFIG
}

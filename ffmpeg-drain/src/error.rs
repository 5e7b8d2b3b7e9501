use std::path::PathBuf;

use crate::stream::MediaKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening, selecting, draining or writing.
///
/// Only [`Error::Decode`] and [`Error::LayoutMismatch`] are absorbed inside
/// the drain loop; everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("media runtime init failed: {0}")]
    Init(String),

    #[error("failed to open input {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("failed to open {kind} output {path}: {source}")]
    OpenOutput {
        kind: MediaKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no {0} stream found")]
    NoStreamFound(MediaKind),

    #[error("no decoder available for stream {index} (codec {codec})")]
    DecoderUnavailable { index: usize, codec: String },

    #[error("failed to open decoder for stream {index}: {reason}")]
    DecoderInitFailed { index: usize, reason: String },

    #[error("invalid image layout {0}")]
    InvalidLayout(String),

    #[error("failed to read packet: {0}")]
    Read(#[source] ffmpeg_next::Error),

    #[error("decode failed on stream {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("frame layout {found} does not match stream layout {expected}")]
    LayoutMismatch { expected: String, found: String },

    #[error("failed to write {kind} output: {source}")]
    Write {
        kind: MediaKind,
        #[source]
        source: std::io::Error,
    },

    #[error("no sink configured for {0} frames")]
    MissingSink(MediaKind),
}

/// FFmpeg's "try again" status: not an error, the call has to be repeated
/// after the other side of the send/receive pair made progress.
pub(crate) fn is_again(err: &ffmpeg_next::Error) -> bool {
    matches!(err, ffmpeg_next::Error::Other { errno } if *errno == ffmpeg_next::util::error::EAGAIN)
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Decode { .. } | Error::LayoutMismatch { .. })
    }
}

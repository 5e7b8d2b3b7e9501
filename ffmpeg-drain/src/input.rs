use std::path::{Path, PathBuf};

use crate::{
    decoder::{Decoder, FfmpegDecoder},
    error::{Error, Result, is_again},
    metadata::MediaInfo,
    packet::RawPacket,
    stream::MediaKind,
};

/// An opened, demultiplexed input.
///
/// Closing happens on drop.
pub trait Container {
    /// Index of the stream FFmpeg ranks best for `kind`, if any.
    fn best_stream(&self, kind: MediaKind) -> Option<usize>;

    /// Opens a decoder configured from the stream's codec parameters.
    fn open_decoder(&self, index: usize) -> Result<Box<dyn Decoder>>;

    /// Next packet in file order, or `None` at end of stream.
    fn read_packet(&mut self) -> Result<Option<RawPacket>>;

    fn media_info(&self) -> Option<MediaInfo> {
        None
    }
}

pub trait ContainerOpener {
    type Container: Container;

    fn open(&self, path: &Path) -> Result<Self::Container>;
}

/// Opens inputs with FFmpeg's demuxers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl ContainerOpener for FfmpegOpener {
    type Container = AvInput;

    fn open(&self, path: &Path) -> Result<AvInput> {
        AvInput::open(path)
    }
}

pub struct AvInput {
    path: PathBuf,
    inner: ffmpeg_next::format::context::Input,
}

impl AvInput {
    /// Opens the file and probes its streams.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = ffmpeg_next::format::input(&path).map_err(|source| Error::OpenInput {
            path: path.clone(),
            source,
        })?;
        log::debug!(
            "opened input {} ({} streams)",
            path.display(),
            inner.nb_streams()
        );
        Ok(Self { path, inner })
    }
}

impl Container for AvInput {
    fn best_stream(&self, kind: MediaKind) -> Option<usize> {
        self.inner
            .streams()
            .best(kind.into())
            .map(|stream| stream.index())
    }

    fn open_decoder(&self, index: usize) -> Result<Box<dyn Decoder>> {
        let stream = self
            .inner
            .stream(index)
            .ok_or_else(|| Error::DecoderInitFailed {
                index,
                reason: "no such stream".to_string(),
            })?;
        let params = stream.parameters();
        let codec = params.id();
        let kind = MediaKind::try_from(params.medium()).map_err(|medium| {
            Error::DecoderInitFailed {
                index,
                reason: format!("unsupported stream type {:?}", medium),
            }
        })?;

        let ctx = ffmpeg_next::codec::Context::from_parameters(params).map_err(|e| {
            Error::DecoderInitFailed {
                index,
                reason: e.to_string(),
            }
        })?;
        let open_failed = |e: ffmpeg_next::Error| match e {
            ffmpeg_next::Error::DecoderNotFound => Error::DecoderUnavailable {
                index,
                codec: format!("{:?}", codec).to_lowercase(),
            },
            other => Error::DecoderInitFailed {
                index,
                reason: other.to_string(),
            },
        };

        let decoder = match kind {
            MediaKind::Video => {
                FfmpegDecoder::video(index, ctx.decoder().video().map_err(open_failed)?)?
            }
            MediaKind::Audio => {
                FfmpegDecoder::audio(index, ctx.decoder().audio().map_err(open_failed)?)?
            }
        };
        log::debug!("opened {:?} decoder for {} stream {}", codec, kind, index);
        Ok(Box::new(decoder))
    }

    fn read_packet(&mut self) -> Result<Option<RawPacket>> {
        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.inner) {
                Ok(()) => return Ok(Some(RawPacket::from(packet))),
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(err) if is_again(&err) => continue,
                Err(err) => return Err(Error::Read(err)),
            }
        }
    }

    fn media_info(&self) -> Option<MediaInfo> {
        Some(MediaInfo::from_input(
            &self.path.to_string_lossy(),
            &self.inner,
        ))
    }
}

impl Drop for AvInput {
    fn drop(&mut self) {
        log::debug!("closing input {}", self.path.display());
    }
}


#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

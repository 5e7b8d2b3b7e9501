use crate::{
    error::{Error, Result},
    scratch::ScratchImage,
    sink::SinkSet,
    stream::{ImageLayout, MediaKind},
};

/// A decoded frame lent out by a decoder.
///
/// The borrow ends before the next decode call on the same decoder, so the
/// contents have to be copied out while the frame is held.
#[derive(Clone, Copy)]
pub enum Frame<'a> {
    Video(&'a ffmpeg_next::frame::Video),
    Audio(&'a ffmpeg_next::frame::Audio),
}

impl Frame<'_> {
    pub fn kind(&self) -> MediaKind {
        match self {
            Frame::Video(_) => MediaKind::Video,
            Frame::Audio(_) => MediaKind::Audio,
        }
    }
}

/// The first data plane of an audio frame, cut to `samples * bytes_per_sample`.
///
/// Decoders pad plane allocations; the padding is never part of the output.
pub fn audio_payload(frame: &ffmpeg_next::frame::Audio) -> Result<&[u8]> {
    let len = frame.samples() * frame.format().bytes();
    if frame.planes() == 0 {
        return Err(Error::LayoutMismatch {
            expected: format!("{} bytes of samples", len),
            found: "audio frame without data planes".to_string(),
        });
    }
    let plane = frame.data(0);
    plane.get(..len).ok_or_else(|| Error::LayoutMismatch {
        expected: format!("{} bytes of samples", len),
        found: format!("plane of {} bytes", plane.len()),
    })
}

/// Writes emitted frames to the sink of their kind.
///
/// Video frames go through the scratch buffer so every write is exactly one
/// packed image; audio frames are written unpadded from their first plane.
pub struct FrameWriter<'a> {
    scratch: Option<&'a mut ScratchImage>,
    sinks: &'a mut SinkSet,
}

impl<'a> FrameWriter<'a> {
    pub fn new(scratch: Option<&'a mut ScratchImage>, sinks: &'a mut SinkSet) -> Self {
        Self { scratch, sinks }
    }

    /// Returns the number of bytes written.
    pub fn emit(&mut self, frame: Frame<'_>) -> Result<usize> {
        let kind = frame.kind();
        let bytes = match frame {
            Frame::Video(video) => {
                let scratch = self.scratch.as_deref_mut().ok_or_else(|| {
                    Error::InvalidLayout(format!(
                        "no scratch buffer for video frame {}",
                        ImageLayout::of(video)
                    ))
                })?;
                scratch.pack(video)?
            }
            Frame::Audio(audio) => audio_payload(audio)?,
        };
        let sink = self.sinks.get_mut(kind).ok_or(Error::MissingSink(kind))?;
        sink.write(bytes)
            .map_err(|source| Error::Write { kind, source })?;
        Ok(bytes.len())
    }
}

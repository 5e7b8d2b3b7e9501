use std::fmt::{self, Display, Formatter};

use ffmpeg_next::format::{Pixel, Sample};

use crate::decoder::Decoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MediaKind> for ffmpeg_next::media::Type {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => ffmpeg_next::media::Type::Video,
            MediaKind::Audio => ffmpeg_next::media::Type::Audio,
        }
    }
}

impl TryFrom<ffmpeg_next::media::Type> for MediaKind {
    type Error = ffmpeg_next::media::Type;

    fn try_from(medium: ffmpeg_next::media::Type) -> Result<Self, Self::Error> {
        match medium {
            ffmpeg_next::media::Type::Video => Ok(MediaKind::Video),
            ffmpeg_next::media::Type::Audio => Ok(MediaKind::Audio),
            other => Err(other),
        }
    }
}

/// Geometry and pixel format of a video stream. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub width: u32,
    pub height: u32,
    pub format: Pixel,
}

impl ImageLayout {
    pub fn new(width: u32, height: u32, format: Pixel) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    pub fn of(frame: &ffmpeg_next::frame::Video) -> Self {
        Self::new(frame.width(), frame.height(), frame.format())
    }

    /// FFmpeg's short name for the pixel format, e.g. "yuv420p".
    pub fn pixel_name(&self) -> &'static str {
        self.format
            .descriptor()
            .map(|d| d.name())
            .unwrap_or("none")
    }
}

impl Display for ImageLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.pixel_name(), self.width, self.height)
    }
}

/// Sample format, channel count and rate of an audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample: Sample,
    pub channels: u16,
    pub rate: u32,
}

impl AudioFormat {
    /// Raw format name understood by `ffplay -f`, for the packed variant of
    /// the sample type in native byte order.
    pub fn raw_name(&self) -> Option<&'static str> {
        let little = cfg!(target_endian = "little");
        match self.sample {
            Sample::U8(_) => Some("u8"),
            Sample::I16(_) => Some(if little { "s16le" } else { "s16be" }),
            Sample::I32(_) => Some(if little { "s32le" } else { "s32be" }),
            Sample::F32(_) => Some(if little { "f32le" } else { "f32be" }),
            Sample::F64(_) => Some(if little { "f64le" } else { "f64be" }),
            _ => None,
        }
    }

    /// Channels present in the written output. Planar audio only has its
    /// first plane persisted, which holds a single channel.
    pub fn written_channels(&self) -> u16 {
        if self.sample.is_planar() {
            1
        } else {
            self.channels
        }
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}ch {}Hz",
            self.sample.name(),
            self.channels,
            self.rate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Video(ImageLayout),
    Audio(AudioFormat),
}

impl StreamFormat {
    pub fn kind(&self) -> MediaKind {
        match self {
            StreamFormat::Video(_) => MediaKind::Video,
            StreamFormat::Audio(_) => MediaKind::Audio,
        }
    }
}

/// A selected stream and the decoder bound to it.
pub struct StreamDescriptor {
    index: usize,
    kind: MediaKind,
    decoder: Box<dyn Decoder>,
}

impl StreamDescriptor {
    pub fn new(index: usize, decoder: Box<dyn Decoder>) -> Self {
        let kind = decoder.stream_format().kind();
        Self {
            index,
            kind,
            decoder,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn format(&self) -> StreamFormat {
        self.decoder.stream_format()
    }

    pub fn decoder_mut(&mut self) -> &mut dyn Decoder {
        self.decoder.as_mut()
    }
}

impl Drop for StreamDescriptor {
    fn drop(&mut self) {
        log::debug!("closing {} decoder for stream {}", self.kind, self.index);
    }
}

/// Selected streams in selection order. Dropped last-selected-first.
#[derive(Default)]
pub struct StreamSet {
    streams: Vec<StreamDescriptor>,
}

impl StreamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stream: StreamDescriptor) {
        self.streams.push(stream);
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn contains(&self, kind: MediaKind) -> bool {
        self.streams.iter().any(|s| s.kind == kind)
    }

    /// The stream reading packets tagged with `index`, if it was selected.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut StreamDescriptor> {
        self.streams.iter_mut().find(|s| s.index == index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StreamDescriptor> {
        self.streams.iter_mut()
    }

    pub fn video_layout(&self) -> Option<ImageLayout> {
        self.streams.iter().find_map(|s| match s.format() {
            StreamFormat::Video(layout) => Some(layout),
            StreamFormat::Audio(_) => None,
        })
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.streams.iter().find_map(|s| match s.format() {
            StreamFormat::Audio(format) => Some(format),
            StreamFormat::Video(_) => None,
        })
    }
}

impl Drop for StreamSet {
    fn drop(&mut self) {
        while let Some(stream) = self.streams.pop() {
            drop(stream);
        }
    }
}

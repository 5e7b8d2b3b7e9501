use std::sync::OnceLock;

static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Registers FFmpeg's formats and codecs and quiets its own logging down to
/// warnings. Only the first call does any work; later calls return its result.
pub fn init() -> Result<()> {
    INIT.get_or_init(|| {
        ffmpeg_next::init().map_err(|e| e.to_string())?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Warning);
        Ok(())
    })
    .clone()
    .map_err(Error::Init)
}

pub mod decoder;
pub mod drain;
pub mod error;
pub mod frame;
pub mod input;
pub mod metadata;
pub mod packet;
pub mod pipeline;
pub mod scratch;
pub mod selector;
pub mod sink;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use decoder::{AvDecoder, Decoded, Decoder, FfmpegDecoder, SendReceive};
pub use drain::{DrainStats, KindStats, PacketDrain};
pub use error::{Error, Result};
pub use frame::{Frame, FrameWriter};
pub use input::{AvInput, Container, ContainerOpener, FfmpegOpener};
pub use packet::{PacketCursor, PacketTail, RawPacket, TailPacket};
pub use pipeline::{PipelineConfig, PipelineController, PipelineReport};
pub use sink::{FileSink, FileSinkOpener, FrameSink, MemorySink, SinkOpener, SinkSet};
pub use stream::{AudioFormat, ImageLayout, MediaKind, StreamDescriptor, StreamFormat, StreamSet};

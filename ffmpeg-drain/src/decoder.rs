use ffmpeg_next::Packet;

use crate::{
    error::{Error, Result, is_again},
    frame::Frame,
    packet::PacketTail,
    stream::{AudioFormat, ImageLayout, StreamFormat},
};

/// Outcome of one decode call.
pub struct Decoded<'a> {
    /// Bytes of the input the decoder took. May exceed the input length;
    /// callers clamp.
    pub consumed: usize,
    pub frame: Option<Frame<'a>>,
    /// A failure the decoder reported for input from an earlier call. The
    /// current input was still taken.
    pub earlier_error: Option<Error>,
}

impl Decoded<'_> {
    pub fn nothing() -> Self {
        Self {
            consumed: 0,
            frame: None,
            earlier_error: None,
        }
    }
}

/// A codec bound to one stream.
///
/// `decode` takes the not yet consumed tail of a packet and reports how much
/// of it was used, so one packet can take any number of calls. A returned
/// frame borrows the decoder and is only valid until the next call.
pub trait Decoder {
    fn stream_format(&self) -> StreamFormat;

    fn decode(&mut self, input: PacketTail<'_>) -> Result<Decoded<'_>>;

    /// Returns frames still buffered after the last packet, one per call,
    /// until `None`.
    fn flush(&mut self) -> Result<Option<Frame<'_>>> {
        Ok(None)
    }
}

/// FFmpeg's send/receive decoding calls over a single frame slot.
pub trait SendReceive {
    fn send_packet(&mut self, packet: &Packet) -> std::result::Result<(), ffmpeg_next::Error>;

    fn send_eof(&mut self) -> std::result::Result<(), ffmpeg_next::Error>;

    /// Fills the frame slot with the next decoded frame.
    fn receive_frame(&mut self) -> std::result::Result<(), ffmpeg_next::Error>;

    fn frame(&self) -> Frame<'_>;
}

pub enum AvDecoder {
    Video {
        decoder: ffmpeg_next::codec::decoder::Video,
        frame: ffmpeg_next::frame::Video,
    },
    Audio {
        decoder: ffmpeg_next::codec::decoder::Audio,
        frame: ffmpeg_next::frame::Audio,
    },
}

impl SendReceive for AvDecoder {
    fn send_packet(&mut self, packet: &Packet) -> std::result::Result<(), ffmpeg_next::Error> {
        match self {
            AvDecoder::Video { decoder, .. } => decoder.send_packet(packet),
            AvDecoder::Audio { decoder, .. } => decoder.send_packet(packet),
        }
    }

    fn send_eof(&mut self) -> std::result::Result<(), ffmpeg_next::Error> {
        match self {
            AvDecoder::Video { decoder, .. } => decoder.send_eof(),
            AvDecoder::Audio { decoder, .. } => decoder.send_eof(),
        }
    }

    fn receive_frame(&mut self) -> std::result::Result<(), ffmpeg_next::Error> {
        match self {
            AvDecoder::Video { decoder, frame } => decoder.receive_frame(frame),
            AvDecoder::Audio { decoder, frame } => decoder.receive_frame(frame),
        }
    }

    fn frame(&self) -> Frame<'_> {
        match self {
            AvDecoder::Video { frame, .. } => Frame::Video(frame),
            AvDecoder::Audio { frame, .. } => Frame::Audio(frame),
        }
    }
}

/// FFmpeg decoder adapted to the consumed-bytes contract.
///
/// FFmpeg takes whole packets, so a call either consumes all of its input or,
/// while the decoder still holds an undelivered frame, nothing. Frames left
/// over from earlier input are handed out first.
pub struct FfmpegDecoder<C: SendReceive = AvDecoder> {
    index: usize,
    format: StreamFormat,
    inner: C,
    eof_sent: bool,
}

impl FfmpegDecoder {
    pub fn video(index: usize, decoder: ffmpeg_next::codec::decoder::Video) -> Result<Self> {
        if decoder.format() == ffmpeg_next::format::Pixel::None
            || decoder.width() == 0
            || decoder.height() == 0
        {
            return Err(Error::DecoderInitFailed {
                index,
                reason: "missing codec parameters".to_string(),
            });
        }
        let layout = ImageLayout::new(decoder.width(), decoder.height(), decoder.format());
        let inner = AvDecoder::Video {
            decoder,
            frame: ffmpeg_next::frame::Video::empty(),
        };
        Ok(Self::with_codec(index, StreamFormat::Video(layout), inner))
    }

    pub fn audio(index: usize, decoder: ffmpeg_next::codec::decoder::Audio) -> Result<Self> {
        let channels = unsafe { (*decoder.as_ptr()).ch_layout.nb_channels };
        let format = AudioFormat {
            sample: decoder.format(),
            channels: channels.max(0) as u16,
            rate: decoder.rate(),
        };
        let inner = AvDecoder::Audio {
            decoder,
            frame: ffmpeg_next::frame::Audio::empty(),
        };
        Ok(Self::with_codec(index, StreamFormat::Audio(format), inner))
    }
}

impl<C: SendReceive> FfmpegDecoder<C> {
    pub fn with_codec(index: usize, format: StreamFormat, codec: C) -> Self {
        Self {
            index,
            format,
            inner: codec,
            eof_sent: false,
        }
    }

    /// Pulls the next buffered frame into the decoder's frame slot.
    fn receive(&mut self) -> Result<bool> {
        match self.inner.receive_frame() {
            Ok(()) => Ok(true),
            Err(ffmpeg_next::Error::Eof) => Ok(false),
            Err(err) if is_again(&err) => Ok(false),
            Err(source) => Err(self.failed(source)),
        }
    }

    fn failed(&self, source: ffmpeg_next::Error) -> Error {
        Error::Decode {
            index: self.index,
            source,
        }
    }
}

impl<C: SendReceive> Decoder for FfmpegDecoder<C> {
    fn stream_format(&self) -> StreamFormat {
        self.format
    }

    fn decode(&mut self, input: PacketTail<'_>) -> Result<Decoded<'_>> {
        // a failure here belongs to an earlier packet, not to `input`
        let earlier_error = match self.receive() {
            Ok(true) => {
                return Ok(Decoded {
                    consumed: 0,
                    frame: Some(self.inner.frame()),
                    earlier_error: None,
                });
            }
            Ok(false) => None,
            Err(err) => Some(err),
        };
        if input.is_empty() {
            return Ok(Decoded {
                earlier_error,
                ..Decoded::nothing()
            });
        }

        let packet = input.to_packet();
        let consumed = match self.inner.send_packet(packet.as_packet()) {
            Ok(()) => input.len(),
            Err(err) if is_again(&err) => 0,
            Err(source) => return Err(self.failed(source)),
        };

        let frame = if self.receive()? {
            Some(self.inner.frame())
        } else {
            None
        };
        Ok(Decoded {
            consumed,
            frame,
            earlier_error,
        })
    }

    fn flush(&mut self) -> Result<Option<Frame<'_>>> {
        if !self.eof_sent {
            self.eof_sent = true;
            match self.inner.send_eof() {
                Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
                Err(err) if is_again(&err) => {}
                Err(source) => return Err(self.failed(source)),
            }
        }
        if self.receive()? {
            Ok(Some(self.inner.frame()))
        } else {
            Ok(None)
        }
    }
}

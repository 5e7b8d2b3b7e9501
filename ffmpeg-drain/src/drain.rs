use std::fmt::{self, Display, Formatter};

use crate::{
    decoder::Decoded,
    error::Result,
    frame::{Frame, FrameWriter},
    input::Container,
    packet::{PacketCursor, RawPacket},
    stream::{MediaKind, StreamSet},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindStats {
    pub frames: usize,
    pub bytes: usize,
}

/// Counters for one drain run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainStats {
    pub packets_read: usize,
    /// Packets of streams that were not selected.
    pub packets_ignored: usize,
    pub decode_failures: usize,
    /// Packets abandoned because the decoder made no progress.
    pub stalled_packets: usize,
    /// Frames dropped because they did not match the stream layout.
    pub frames_dropped: usize,
    pub video: KindStats,
    pub audio: KindStats,
}

impl DrainStats {
    fn kind_mut(&mut self, kind: MediaKind) -> &mut KindStats {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }

    pub fn frames(&self) -> usize {
        self.video.frames + self.audio.frames
    }
}

impl Display for DrainStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packets ({} ignored, {} failed, {} stalled), ",
            self.packets_read, self.packets_ignored, self.decode_failures, self.stalled_packets,
        )?;
        write!(
            f,
            "video {} frames / {} bytes, audio {} frames / {} bytes, {} frames dropped",
            self.video.frames,
            self.video.bytes,
            self.audio.frames,
            self.audio.bytes,
            self.frames_dropped,
        )
    }
}

/// Reads packets until end of stream and feeds each one to the decoder of
/// its stream, writing every frame as soon as it is produced.
///
/// A packet is fed in pieces: each decode call reports how many bytes it
/// took and the cursor moves by that amount, clamped to what is left.
/// Decode failures and mismatching frames are counted and skipped; read and
/// write failures abort the run.
pub struct PacketDrain<'a, C: Container + ?Sized> {
    container: &'a mut C,
    streams: &'a mut StreamSet,
    writer: FrameWriter<'a>,
    stats: DrainStats,
}

impl<'a, C: Container + ?Sized> PacketDrain<'a, C> {
    pub fn new(container: &'a mut C, streams: &'a mut StreamSet, writer: FrameWriter<'a>) -> Self {
        Self {
            container,
            streams,
            writer,
            stats: DrainStats::default(),
        }
    }

    pub fn run(mut self) -> Result<DrainStats> {
        while let Some(packet) = self.container.read_packet()? {
            self.stats.packets_read += 1;
            self.drain_packet(&packet)?;
        }
        log::debug!("end of stream after {} packets", self.stats.packets_read);
        self.flush()?;
        Ok(self.stats)
    }

    fn drain_packet(&mut self, packet: &RawPacket) -> Result<()> {
        let index = packet.index();
        let Some(stream) = self.streams.get_mut(index) else {
            log::trace!("ignoring {} byte packet of stream {}", packet.size(), index);
            self.stats.packets_ignored += 1;
            return Ok(());
        };
        log::trace!(
            "{} packet of stream {}: {} bytes, pts {:?}, key {}",
            stream.kind(),
            index,
            packet.size(),
            packet.pts(),
            packet.is_key()
        );

        let mut cursor = PacketCursor::new(packet);
        while !cursor.is_drained() {
            let remaining = cursor.remaining_len();
            let decoded = match stream.decoder_mut().decode(cursor.remaining()) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::warn!(
                        "{}, dropping {} of {} bytes",
                        err,
                        remaining,
                        packet.size()
                    );
                    self.stats.decode_failures += 1;
                    return Ok(());
                }
            };
            let Decoded {
                consumed,
                frame,
                earlier_error,
            } = decoded;
            if let Some(err) = earlier_error {
                log::warn!("{} (left over from an earlier packet)", err);
                self.stats.decode_failures += 1;
            }

            match frame {
                Some(frame) => emit(&mut self.writer, &mut self.stats, frame)?,
                None if consumed == 0 => {
                    log::warn!(
                        "decoder for stream {} made no progress, dropping {} bytes",
                        index,
                        remaining
                    );
                    self.stats.stalled_packets += 1;
                    return Ok(());
                }
                None => {}
            }

            if cursor.advance(consumed) < consumed {
                log::debug!(
                    "stream {} decoder reported {} bytes consumed with {} left, clamping",
                    index,
                    consumed,
                    remaining
                );
            }
        }
        Ok(())
    }

    /// Emits the frames decoders still hold once the input is exhausted.
    fn flush(&mut self) -> Result<()> {
        for stream in self.streams.iter_mut() {
            let index = stream.index();
            let decoder = stream.decoder_mut();
            loop {
                match decoder.flush() {
                    Ok(Some(frame)) => emit(&mut self.writer, &mut self.stats, frame)?,
                    Ok(None) => break,
                    Err(err) => {
                        log::warn!("flushing stream {}: {}", index, err);
                        self.stats.decode_failures += 1;
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

fn emit(writer: &mut FrameWriter<'_>, stats: &mut DrainStats, frame: Frame<'_>) -> Result<()> {
    let kind = frame.kind();
    match writer.emit(frame) {
        Ok(bytes) => {
            let counts = stats.kind_mut(kind);
            counts.frames += 1;
            counts.bytes += bytes;
            Ok(())
        }
        Err(err) if !err.is_fatal() => {
            log::warn!("dropping {} frame: {}", kind, err);
            stats.frames_dropped += 1;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

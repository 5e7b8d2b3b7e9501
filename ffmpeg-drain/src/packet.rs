use ffmpeg_next::codec::packet::Packet;

/// A compressed packet read from the container, tagged with its stream index.
pub struct RawPacket {
    packet: Packet,
}

impl RawPacket {
    /// Builds a packet holding a copy of `data`.
    pub fn new(stream_index: usize, data: &[u8]) -> Self {
        let mut packet = Packet::copy(data);
        packet.set_stream(stream_index);
        Self { packet }
    }

    pub fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    pub fn size(&self) -> usize {
        self.packet.size()
    }

    pub fn index(&self) -> usize {
        self.packet.stream()
    }

    pub fn data(&self) -> &[u8] {
        self.packet.data().unwrap_or_default()
    }

    pub fn is_key(&self) -> bool {
        self.packet.is_key()
    }

    /// The demuxer's packet, with its timing, flags and side data.
    pub fn as_packet(&self) -> &Packet {
        &self.packet
    }
}

impl From<Packet> for RawPacket {
    fn from(packet: Packet) -> Self {
        Self { packet }
    }
}

/// Read position inside a packet that is fed to a decoder in pieces.
pub struct PacketCursor<'a> {
    packet: &'a RawPacket,
    offset: usize,
}

impl<'a> PacketCursor<'a> {
    pub fn new(packet: &'a RawPacket) -> Self {
        Self { packet, offset: 0 }
    }

    pub fn remaining(&self) -> PacketTail<'a> {
        PacketTail {
            packet: self.packet,
            offset: self.offset,
        }
    }

    pub fn remaining_len(&self) -> usize {
        self.packet.size() - self.offset
    }

    pub fn consumed(&self) -> usize {
        self.offset
    }

    pub fn is_drained(&self) -> bool {
        self.offset >= self.packet.size()
    }

    /// Moves the read position forward by at most the remaining length and
    /// returns how far it actually moved.
    pub fn advance(&mut self, consumed: usize) -> usize {
        let step = consumed.min(self.remaining_len());
        self.offset += step;
        step
    }
}

/// The not yet consumed part of a packet, as handed to a decoder.
#[derive(Clone, Copy)]
pub struct PacketTail<'a> {
    packet: &'a RawPacket,
    offset: usize,
}

impl<'a> PacketTail<'a> {
    pub fn data(&self) -> &'a [u8] {
        &self.packet.data()[self.offset..]
    }

    pub fn len(&self) -> usize {
        self.packet.size() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while nothing of the packet has been consumed yet.
    pub fn is_whole(&self) -> bool {
        self.offset == 0
    }

    /// The FFmpeg packet to send for this tail.
    ///
    /// An untouched packet is the demuxer's own. A partial tail is a copy of
    /// the remaining bytes carrying the source's timing and flags; side data
    /// went out with the head.
    pub fn to_packet(&self) -> TailPacket<'a> {
        if self.is_whole() {
            return TailPacket::Whole(self.packet.as_packet());
        }
        let source = self.packet.as_packet();
        let mut rest = Packet::copy(self.data());
        rest.set_stream(source.stream());
        rest.set_pts(source.pts());
        rest.set_dts(source.dts());
        rest.set_duration(source.duration());
        rest.set_flags(source.flags());
        TailPacket::Rest(rest)
    }
}

pub enum TailPacket<'a> {
    Whole(&'a Packet),
    Rest(Packet),
}

impl TailPacket<'_> {
    pub fn as_packet(&self) -> &Packet {
        match self {
            TailPacket::Whole(packet) => packet,
            TailPacket::Rest(packet) => packet,
        }
    }
}

use std::collections::VecDeque;

use crate::container::domain::container_error::ContainerError;
use crate::container::domain::opus_header::{OpusHead, OpusTags};
use crate::container::domain::opus_packet::OpusPacket;
use crate::container::infrastructure::ogg_page::{OggPage, NO_GRANULE};

/// A parsed Ogg Opus stream whose audio packets are read lazily.
pub struct DemuxedStream<'a> {
    pub header: OpusHead,
    pub tags: OpusTags,
    pub serial: u32,
    pub packets: OpusPackets<'a>,
}

/// Split an Ogg Opus byte stream into its headers and audio packets.
///
/// Both header packets are parsed eagerly so codec problems surface before
/// any audio is touched; the remaining packets are parsed on demand.
pub fn demux(bytes: &[u8]) -> Result<DemuxedStream<'_>, ContainerError> {
    if bytes.is_empty() {
        return Err(ContainerError::malformed("empty input"));
    }

    let mut reader = PacketReader::new(bytes);
    let (head_packet, _) = reader
        .next()
        .ok_or_else(|| ContainerError::malformed("missing identification header"))??;
    let header = OpusHead::parse(&head_packet)?;

    let (tags_packet, _) = reader
        .next()
        .ok_or_else(|| ContainerError::malformed("missing comment header"))??;
    let tags = OpusTags::parse(&tags_packet)?;

    let serial = reader.serial.unwrap_or_default();
    log::debug!(
        "Demux: serial {serial:#010x}, {} channel(s), pre-skip {}, input rate {} Hz",
        header.channels,
        header.pre_skip,
        header.input_sample_rate
    );

    Ok(DemuxedStream {
        header,
        tags,
        serial,
        packets: OpusPackets { reader },
    })
}

/// Single-pass iterator over the audio packets of a demuxed stream.
///
/// Fused after the first error.
pub struct OpusPackets<'a> {
    reader: PacketReader<'a>,
}

impl Iterator for OpusPackets<'_> {
    type Item = Result<OpusPacket, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (data, granule) = match self.reader.next()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        let packet = match OpusPacket::from_bytes(data) {
            Ok(packet) => packet,
            Err(e) => {
                self.reader.done = true;
                return Some(Err(e));
            }
        };
        Some(Ok(match granule {
            Some(g) => packet.with_granule_position(g),
            None => packet,
        }))
    }
}

type RawPacket = (Vec<u8>, Option<u64>);

/// Reassembles packets from the pages of a single logical stream.
struct PacketReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    serial: Option<u32>,
    last_sequence: Option<u32>,
    partial: Vec<u8>,
    has_partial: bool,
    ready: VecDeque<RawPacket>,
    eos: bool,
    done: bool,
}

impl<'a> PacketReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            serial: None,
            last_sequence: None,
            partial: Vec::new(),
            has_partial: false,
            ready: VecDeque::new(),
            eos: false,
            done: false,
        }
    }

    fn fail(&mut self, err: ContainerError) -> Option<Result<RawPacket, ContainerError>> {
        self.done = true;
        Some(Err(err))
    }

    /// Read the next page of our logical stream and queue the packets it completes.
    fn read_page(&mut self) -> Result<(), ContainerError> {
        let (page, len) = OggPage::parse(&self.bytes[self.offset..])?;
        self.offset += len;
        let header = &page.header;

        match self.serial {
            None => {
                if !header.is_bos() {
                    return Err(ContainerError::malformed(
                        "first page is missing the beginning-of-stream flag",
                    ));
                }
                self.serial = Some(header.serial);
            }
            Some(serial) if serial != header.serial => {
                log::warn!(
                    "Demux: skipping page of foreign logical stream {:#010x}",
                    header.serial
                );
                return Ok(());
            }
            Some(_) => {}
        }

        if let Some(last) = self.last_sequence {
            if header.sequence <= last {
                return Err(ContainerError::malformed(format!(
                    "page sequence {} does not follow {last}",
                    header.sequence
                )));
            }
        }
        self.last_sequence = Some(header.sequence);

        if header.is_continued() != self.has_partial {
            return Err(ContainerError::malformed(format!(
                "continuation flag mismatch on page {}",
                header.sequence
            )));
        }

        let mut offset = 0;
        let mut completed = Vec::new();
        for &lacing in &header.segment_table {
            let len = lacing as usize;
            self.partial.extend_from_slice(&page.data[offset..offset + len]);
            offset += len;
            if lacing < 255 {
                completed.push(std::mem::take(&mut self.partial));
                self.has_partial = false;
            } else {
                self.has_partial = true;
            }
        }

        let page_granule = (header.granule_position != NO_GRANULE).then_some(header.granule_position);
        let count = completed.len();
        for (i, packet) in completed.into_iter().enumerate() {
            let granule = if i + 1 == count { page_granule } else { None };
            self.ready.push_back((packet, granule));
        }

        if header.is_eos() {
            if self.has_partial {
                return Err(ContainerError::malformed(
                    "end of stream inside an unfinished packet",
                ));
            }
            self.eos = true;
            if self.offset < self.bytes.len() {
                log::warn!(
                    "Demux: ignoring {} trailing bytes after end of stream",
                    self.bytes.len() - self.offset
                );
            }
        }
        Ok(())
    }
}

impl Iterator for PacketReader<'_> {
    type Item = Result<RawPacket, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(packet) = self.ready.pop_front() {
                return Some(Ok(packet));
            }
            if self.eos {
                self.done = true;
                return None;
            }
            if self.offset >= self.bytes.len() {
                return self.fail(ContainerError::malformed(
                    "stream ended before the end-of-stream page",
                ));
            }
            if let Err(e) = self.read_page() {
                return self.fail(e);
            }
        }
    }
}

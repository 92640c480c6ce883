use crate::container::domain::opus_header::{OpusHead, OpusTags};
use crate::container::domain::opus_packet::OpusPacket;
use crate::container::infrastructure::ogg_page::{
    OggPage, OggPageHeader, HEADER_TYPE_BOS, HEADER_TYPE_CONTINUED, HEADER_TYPE_EOS,
    MAX_SEGMENTS, NO_GRANULE,
};
use crate::shared::constants::OPUS_SAMPLE_RATE;

/// Flush an audio page once it holds this many payload bytes.
const TARGET_PAGE_BYTES: usize = 4096;

/// Flush an audio page once it spans this many samples (one second).
const MAX_PAGE_SAMPLES: u64 = OPUS_SAMPLE_RATE as u64;

/// Writes Opus packets into a single logical OGG stream.
pub struct OggMuxer {
    serial: u32,
}

impl OggMuxer {
    pub fn new(serial: u32) -> Self {
        Self { serial }
    }

    /// Build a complete stream: identification page, comment page(s), audio pages.
    ///
    /// Page granules are the cumulative sample count of completed packets; a
    /// packet carrying its own granule position (the end-trimmed final packet)
    /// overrides the running count.
    pub fn mux(&self, packets: &[OpusPacket], header: &OpusHead, tags: &OpusTags) -> Vec<u8> {
        let mut writer = PageWriter::new(self.serial);

        writer.push_packet(&header.to_bytes(), 0);
        writer.flush(false);
        writer.push_packet(&tags.to_bytes(), 0);
        writer.flush(false);

        let mut granule = 0u64;
        let mut page_start = 0u64;
        for packet in packets {
            // Flush before pushing so the end-of-stream page always carries the last packet.
            if writer.data.len() >= TARGET_PAGE_BYTES || granule - page_start >= MAX_PAGE_SAMPLES {
                writer.flush(false);
                page_start = granule;
            }
            granule += u64::from(packet.samples());
            let packet_granule = packet.granule_position().unwrap_or(granule);
            writer.push_packet(packet.data(), packet_granule);
        }
        writer.flush(true);

        log::debug!(
            "Mux: {} packets in {} pages, final granule {granule}",
            packets.len(),
            writer.sequence
        );
        writer.out
    }
}

/// Accumulates lacing segments into pages and serializes them.
struct PageWriter {
    serial: u32,
    sequence: u32,
    segments: Vec<u8>,
    data: Vec<u8>,
    /// Granule of the last packet completed on the current page.
    granule: Option<u64>,
    /// The current page begins with the tail of a packet from the previous page.
    continued: bool,
    out: Vec<u8>,
}

impl PageWriter {
    fn new(serial: u32) -> Self {
        Self {
            serial,
            sequence: 0,
            segments: Vec::new(),
            data: Vec::new(),
            granule: None,
            continued: false,
            out: Vec::new(),
        }
    }

    fn push_packet(&mut self, packet: &[u8], granule: u64) {
        let full = packet.len() / 255;
        let mut offset = 0;
        for i in 0..=full {
            if self.segments.len() == MAX_SEGMENTS {
                self.flush(false);
                // Only a flush inside the packet leaves a tail for the next page.
                self.continued = i > 0;
            }
            let len = if i < full { 255 } else { packet.len() % 255 };
            self.segments.push(len as u8);
            self.data.extend_from_slice(&packet[offset..offset + len]);
            offset += len;
        }
        self.granule = Some(granule);
    }

    /// Emit the pending page. The end-of-stream page is written even when empty.
    fn flush(&mut self, eos: bool) {
        if self.segments.is_empty() && !eos {
            return;
        }
        let mut header_type = 0;
        if self.continued {
            header_type |= HEADER_TYPE_CONTINUED;
        }
        if self.sequence == 0 {
            header_type |= HEADER_TYPE_BOS;
        }
        if eos {
            header_type |= HEADER_TYPE_EOS;
        }

        let page = OggPage {
            header: OggPageHeader {
                header_type,
                granule_position: self.granule.take().unwrap_or(NO_GRANULE),
                serial: self.serial,
                sequence: self.sequence,
                checksum: 0,
                segment_table: std::mem::take(&mut self.segments),
            },
            data: std::mem::take(&mut self.data),
        };
        self.out.extend(page.to_bytes());
        self.sequence += 1;
        self.continued = false;
    }
}

use crate::container::domain::container_error::ContainerError;

pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

pub const HEADER_TYPE_CONTINUED: u8 = 0x01;
pub const HEADER_TYPE_BOS: u8 = 0x02;
pub const HEADER_TYPE_EOS: u8 = 0x04;

/// Granule position of a page on which no packet completes.
pub const NO_GRANULE: u64 = u64::MAX;

pub const MAX_SEGMENTS: usize = 255;

const HEADER_LEN: usize = 27;
const CHECKSUM_OFFSET: usize = 22;

/// CRC-32 with polynomial 0x04C11DB7, zero init, no reflection, no final xor.
const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            r = if r & 0x8000_0000 != 0 {
                (r << 1) ^ 0x04C1_1DB7
            } else {
                r << 1
            };
            bit += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
}

fn crc_update(crc: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(crc, |crc, &b| {
        (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ b) as usize]
    })
}

/// OGG page header (RFC 3533 §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPageHeader {
    pub header_type: u8,
    pub granule_position: u64,
    pub serial: u32,
    pub sequence: u32,
    pub checksum: u32,
    pub segment_table: Vec<u8>,
}

/// OGG page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPage {
    pub header: OggPageHeader,
    pub data: Vec<u8>,
}

impl OggPageHeader {
    pub fn is_continued(&self) -> bool {
        self.header_type & HEADER_TYPE_CONTINUED != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & HEADER_TYPE_EOS != 0
    }

    pub fn data_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    fn write(&self, out: &mut Vec<u8>, checksum: u32) {
        out.extend_from_slice(CAPTURE_PATTERN);
        out.push(0);
        out.push(self.header_type);
        out.extend_from_slice(&self.granule_position.to_le_bytes());
        out.extend_from_slice(&self.serial.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.push(self.segment_table.len() as u8);
        out.extend_from_slice(&self.segment_table);
    }
}

impl OggPage {
    /// Parse one page at the start of `bytes`, returning it with its encoded length.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), ContainerError> {
        if bytes.len() < HEADER_LEN {
            return Err(ContainerError::malformed("truncated page header"));
        }
        if &bytes[..4] != CAPTURE_PATTERN {
            return Err(ContainerError::malformed("missing OggS capture pattern"));
        }
        if bytes[4] != 0 {
            return Err(ContainerError::malformed(format!(
                "unsupported stream structure version {}",
                bytes[4]
            )));
        }

        let segment_count = bytes[26] as usize;
        let table_end = HEADER_LEN + segment_count;
        if bytes.len() < table_end {
            return Err(ContainerError::malformed("truncated segment table"));
        }
        let segment_table = bytes[HEADER_LEN..table_end].to_vec();
        let data_size: usize = segment_table.iter().map(|&x| x as usize).sum();
        let page_len = table_end + data_size;
        if bytes.len() < page_len {
            return Err(ContainerError::malformed("truncated page body"));
        }

        let header = OggPageHeader {
            header_type: bytes[5],
            granule_position: u64::from_le_bytes(le_array(&bytes[6..14])),
            serial: u32::from_le_bytes(le_array(&bytes[14..18])),
            sequence: u32::from_le_bytes(le_array(&bytes[18..22])),
            checksum: u32::from_le_bytes(le_array(&bytes[22..26])),
            segment_table,
        };

        let computed = page_checksum(&bytes[..page_len]);
        if computed != header.checksum {
            return Err(ContainerError::malformed(format!(
                "checksum mismatch on page {} (stored {:#010x}, computed {computed:#010x})",
                header.sequence, header.checksum
            )));
        }

        let page = OggPage {
            header,
            data: bytes[table_end..page_len].to_vec(),
        };
        Ok((page, page_len))
    }

    /// Serialize with a freshly computed checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.header.segment_table.len() + self.data.len());
        self.header.write(&mut out, 0);
        out.extend_from_slice(&self.data);
        let checksum = crc_update(0, &out);
        out[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&checksum.to_le_bytes());
        out
    }
}

/// Checksum of an encoded page, computed with its checksum field zeroed.
fn page_checksum(page: &[u8]) -> u32 {
    let crc = crc_update(0, &page[..CHECKSUM_OFFSET]);
    let crc = crc_update(crc, &[0; 4]);
    crc_update(crc, &page[CHECKSUM_OFFSET + 4..])
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(header_type: u8, data: &[u8]) -> OggPage {
        OggPage {
            header: OggPageHeader {
                header_type,
                granule_position: 960,
                serial: 0x1234_5678,
                sequence: 2,
                checksum: 0,
                segment_table: vec![data.len() as u8],
            },
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_crc_of_known_vector() {
        // CRC-32/MPEG-2 without the 0xFFFFFFFF init; "123456789" check value.
        assert_eq!(crc_update(0, b"123456789"), 0x89A1_897F);
    }

    #[test]
    fn test_parse_reads_written_page() {
        let original = page(HEADER_TYPE_BOS, b"hello");
        let bytes = original.to_bytes();
        let (parsed, len) = OggPage::parse(&bytes).unwrap();
        assert_eq!(len, bytes.len());
        assert_eq!(parsed.data, b"hello");
        assert_eq!(parsed.header.granule_position, 960);
        assert_eq!(parsed.header.serial, 0x1234_5678);
        assert_eq!(parsed.header.sequence, 2);
        assert!(parsed.header.is_bos());
        assert!(!parsed.header.is_eos());
        assert!(!parsed.header.is_continued());
    }

    #[test]
    fn test_checksum_mismatch_is_malformed() {
        let mut bytes = page(0, b"payload").to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = OggPage::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::Malformed(ref m) if m.contains("checksum")));
    }

    #[test]
    fn test_every_truncation_is_malformed() {
        let bytes = page(0, b"some packet data").to_bytes();
        for cut in 0..bytes.len() {
            assert!(
                matches!(OggPage::parse(&bytes[..cut]), Err(ContainerError::Malformed(_))),
                "cut at {cut} should fail"
            );
        }
    }

    #[test]
    fn test_bad_capture_pattern() {
        let mut bytes = page(0, b"x").to_bytes();
        bytes[0] = b'X';
        assert!(OggPage::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_consumes_only_one_page() {
        let mut bytes = page(0, b"first").to_bytes();
        let first_len = bytes.len();
        bytes.extend(page(HEADER_TYPE_EOS, b"second").to_bytes());
        let (_, len) = OggPage::parse(&bytes).unwrap();
        assert_eq!(len, first_len);
        let (second, _) = OggPage::parse(&bytes[len..]).unwrap();
        assert!(second.header.is_eos());
    }
}

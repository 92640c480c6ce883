use super::container_error::ContainerError;
use crate::shared::constants::MAX_CHANNELS;

const OPUS_HEAD_MAGIC: &[u8; 8] = b"OpusHead";
const OPUS_TAGS_MAGIC: &[u8; 8] = b"OpusTags";
const OPUS_HEAD_LEN: usize = 19;

/// Identification header of an Ogg Opus stream (RFC 7845 §5.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
    /// Q7.8 fixed-point gain in dB to apply on decode.
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    pub fn new(channels: u8, pre_skip: u16, input_sample_rate: u32) -> Self {
        Self {
            version: 1,
            channels,
            pre_skip,
            input_sample_rate,
            output_gain: 0,
            mapping_family: 0,
        }
    }

    pub fn parse(packet: &[u8]) -> Result<Self, ContainerError> {
        if packet.len() < OPUS_HEAD_MAGIC.len() || &packet[..8] != OPUS_HEAD_MAGIC {
            return Err(ContainerError::unsupported(
                "identification header is not OpusHead",
            ));
        }
        if packet.len() < OPUS_HEAD_LEN {
            return Err(ContainerError::malformed("truncated OpusHead"));
        }

        let version = packet[8];
        if version >> 4 != 0 {
            return Err(ContainerError::unsupported(format!(
                "OpusHead version {version} is not supported"
            )));
        }

        let channels = packet[9];
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ContainerError::unsupported(format!(
                "{channels} channels (only mono and stereo are supported)"
            )));
        }

        let head = Self {
            version,
            channels,
            pre_skip: u16::from_le_bytes([packet[10], packet[11]]),
            input_sample_rate: u32::from_le_bytes([
                packet[12], packet[13], packet[14], packet[15],
            ]),
            output_gain: i16::from_le_bytes([packet[16], packet[17]]),
            mapping_family: packet[18],
        };

        match head.mapping_family {
            0 => {}
            1 => head.check_family_one_table(&packet[OPUS_HEAD_LEN..])?,
            family => {
                return Err(ContainerError::unsupported(format!(
                    "channel mapping family {family}"
                )))
            }
        }

        Ok(head)
    }

    /// Family 1 is accepted only when it describes the same layout as family 0:
    /// one stream, coupled when stereo, identity mapping.
    fn check_family_one_table(&self, table: &[u8]) -> Result<(), ContainerError> {
        let channels = self.channels as usize;
        if table.len() < 2 + channels {
            return Err(ContainerError::malformed("truncated channel mapping table"));
        }
        let stream_count = table[0];
        let coupled_count = table[1];
        let identity = table[2..2 + channels]
            .iter()
            .enumerate()
            .all(|(i, &m)| m as usize == i);
        if stream_count != 1 || coupled_count as usize != channels - 1 || !identity {
            return Err(ContainerError::unsupported(
                "multistream channel mapping is not supported",
            ));
        }
        Ok(())
    }

    /// Linear factor for the header's output gain.
    pub fn gain_factor(&self) -> f32 {
        10f32.powf(self.output_gain as f32 / (20.0 * 256.0))
    }

    /// Serialize as a family 0 header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(OPUS_HEAD_LEN);
        out.extend_from_slice(OPUS_HEAD_MAGIC);
        out.push(self.version);
        out.push(self.channels);
        out.extend_from_slice(&self.pre_skip.to_le_bytes());
        out.extend_from_slice(&self.input_sample_rate.to_le_bytes());
        out.extend_from_slice(&self.output_gain.to_le_bytes());
        out.push(0);
        out
    }
}

/// Comment header of an Ogg Opus stream (RFC 7845 §5.2).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpusTags {
    pub vendor: String,
    pub comments: Vec<String>,
}

impl OpusTags {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            comments: Vec::new(),
        }
    }

    pub fn parse(packet: &[u8]) -> Result<Self, ContainerError> {
        if packet.len() < OPUS_TAGS_MAGIC.len() || &packet[..8] != OPUS_TAGS_MAGIC {
            return Err(ContainerError::malformed("comment header is not OpusTags"));
        }
        let mut cursor = &packet[8..];
        let vendor = read_string(&mut cursor)?;
        let count = read_u32(&mut cursor)?;
        let mut comments = Vec::new();
        for _ in 0..count {
            comments.push(read_string(&mut cursor)?);
        }
        Ok(Self { vendor, comments })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(OPUS_TAGS_MAGIC);
        write_string(&mut out, &self.vendor);
        out.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for comment in &self.comments {
            write_string(&mut out, comment);
        }
        out
    }
}

fn read_u32(cursor: &mut &[u8]) -> Result<u32, ContainerError> {
    if cursor.len() < 4 {
        return Err(ContainerError::malformed("truncated OpusTags"));
    }
    let value = u32::from_le_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]);
    *cursor = &cursor[4..];
    Ok(value)
}

fn read_string(cursor: &mut &[u8]) -> Result<String, ContainerError> {
    let len = read_u32(cursor)? as usize;
    if cursor.len() < len {
        return Err(ContainerError::malformed("truncated OpusTags string"));
    }
    let value = String::from_utf8_lossy(&cursor[..len]).into_owned();
    *cursor = &cursor[len..];
    Ok(value)
}

fn write_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn head_bytes(channels: u8, family: u8) -> Vec<u8> {
        let mut bytes = OpusHead::new(channels, 312, 48000).to_bytes();
        bytes[18] = family;
        bytes
    }

    #[test]
    fn test_head_parse_reads_fields() {
        let mut bytes = OpusHead::new(2, 3840, 44100).to_bytes();
        bytes[16..18].copy_from_slice(&(-256i16).to_le_bytes());
        let head = OpusHead::parse(&bytes).unwrap();
        assert_eq!(head.channels, 2);
        assert_eq!(head.pre_skip, 3840);
        assert_eq!(head.input_sample_rate, 44100);
        assert_eq!(head.output_gain, -256);
        assert_eq!(head.mapping_family, 0);
    }

    #[test]
    fn test_head_rejects_vorbis() {
        let mut bytes = b"\x01vorbis".to_vec();
        bytes.extend_from_slice(&[0; 20]);
        assert!(matches!(
            OpusHead::parse(&bytes),
            Err(ContainerError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_head_rejects_more_than_two_channels() {
        let bytes = head_bytes(6, 0);
        assert!(matches!(
            OpusHead::parse(&bytes),
            Err(ContainerError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_head_rejects_zero_channels() {
        assert!(OpusHead::parse(&head_bytes(0, 0)).is_err());
    }

    #[test]
    fn test_head_rejects_unknown_mapping_family() {
        assert!(matches!(
            OpusHead::parse(&head_bytes(2, 255)),
            Err(ContainerError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_head_accepts_family_one_stereo_identity() {
        let mut bytes = head_bytes(2, 1);
        bytes.extend_from_slice(&[1, 1, 0, 1]);
        assert_eq!(OpusHead::parse(&bytes).unwrap().channels, 2);
    }

    #[test]
    fn test_head_rejects_family_one_uncoupled_streams() {
        let mut bytes = head_bytes(2, 1);
        bytes.extend_from_slice(&[2, 0, 0, 1]);
        assert!(matches!(
            OpusHead::parse(&bytes),
            Err(ContainerError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_head_rejects_future_major_version() {
        let mut bytes = head_bytes(1, 0);
        bytes[8] = 0x10;
        assert!(OpusHead::parse(&bytes).is_err());
    }

    #[test]
    fn test_truncated_head_is_malformed() {
        let bytes = head_bytes(1, 0);
        assert!(matches!(
            OpusHead::parse(&bytes[..12]),
            Err(ContainerError::Malformed(_))
        ));
    }

    #[test]
    fn test_gain_factor() {
        let mut head = OpusHead::new(1, 0, 48000);
        assert_relative_eq!(head.gain_factor(), 1.0);
        // +6 dB in Q7.8
        head.output_gain = 6 * 256;
        assert_relative_eq!(head.gain_factor(), 1.995_262_3, epsilon = 1e-4);
    }

    #[test]
    fn test_tags_round_trip() {
        let tags = OpusTags {
            vendor: "libopus 1.4".to_string(),
            comments: vec!["TITLE=voice note".to_string(), "ARTIST=someone".to_string()],
        };
        assert_eq!(OpusTags::parse(&tags.to_bytes()).unwrap(), tags);
    }

    #[test]
    fn test_tags_truncated_comment_is_malformed() {
        let tags = OpusTags {
            vendor: "v".to_string(),
            comments: vec!["KEY=value".to_string()],
        };
        let bytes = tags.to_bytes();
        assert!(matches!(
            OpusTags::parse(&bytes[..bytes.len() - 3]),
            Err(ContainerError::Malformed(_))
        ));
    }
}

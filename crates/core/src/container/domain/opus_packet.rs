use super::container_error::ContainerError;
use crate::shared::constants::MAX_PACKET_SAMPLES;

/// One Opus packet as carried in an OGG stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpusPacket {
    data: Vec<u8>,
    samples: u32,
    granule_position: Option<u64>,
}

impl OpusPacket {
    pub fn new(data: Vec<u8>, samples: u32) -> Self {
        Self {
            data,
            samples,
            granule_position: None,
        }
    }

    /// Parse the packet's TOC to determine its duration.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ContainerError> {
        let samples = packet_samples(&data)?;
        Ok(Self::new(data, samples))
    }

    /// Attach the granule position of the page this packet completes.
    pub fn with_granule_position(mut self, granule: u64) -> Self {
        self.granule_position = Some(granule);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Duration in 48 kHz samples per channel.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn granule_position(&self) -> Option<u64> {
        self.granule_position
    }
}

/// Samples per frame at 48 kHz for a TOC configuration number (RFC 6716 §3.1).
fn frame_samples(config: u8) -> u32 {
    match config {
        // SILK-only: 10, 20, 40, 60 ms
        0..=11 => [480, 960, 1920, 2880][(config % 4) as usize],
        // Hybrid: 10, 20 ms
        12..=15 => [480, 960][(config % 2) as usize],
        // CELT-only: 2.5, 5, 10, 20 ms
        _ => [120, 240, 480, 960][(config % 4) as usize],
    }
}

/// Duration of an Opus packet in 48 kHz samples per channel.
pub fn packet_samples(data: &[u8]) -> Result<u32, ContainerError> {
    let toc = *data
        .first()
        .ok_or_else(|| ContainerError::malformed("empty opus packet"))?;
    let frames = match toc & 0x03 {
        0 => 1,
        1 | 2 => 2,
        _ => {
            let count = data
                .get(1)
                .ok_or_else(|| ContainerError::malformed("code 3 packet missing frame count"))?;
            u32::from(count & 0x3F)
        }
    };
    if frames == 0 {
        return Err(ContainerError::malformed("opus packet with zero frames"));
    }
    let samples = frames * frame_samples(toc >> 3);
    if samples as usize > MAX_PACKET_SAMPLES {
        return Err(ContainerError::malformed(format!(
            "opus packet lasts {samples} samples, more than 120 ms"
        )));
    }
    Ok(samples)
}

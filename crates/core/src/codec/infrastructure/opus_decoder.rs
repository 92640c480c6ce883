use audiopus::coder::Decoder;
use audiopus::{Channels, SampleRate};

use crate::codec::domain::codec_error::CodecError;
use crate::container::domain::container_error::ContainerError;
use crate::container::domain::opus_header::OpusHead;
use crate::container::domain::opus_packet::OpusPacket;
use crate::shared::constants::{MAX_PACKET_SAMPLES, OPUS_SAMPLE_RATE};
use crate::shared::error::MorphError;
use crate::shared::pcm_buffer::PcmBuffer;

/// Decodes an Opus packet sequence to 48 kHz float PCM with libopus.
pub struct OpusPacketDecoder {
    decoder: Decoder,
    channels: u16,
    pre_skip: usize,
    gain: f32,
}

impl OpusPacketDecoder {
    pub fn new(header: &OpusHead) -> Result<Self, CodecError> {
        let channels = opus_channels(header.channels)?;
        let decoder = Decoder::new(SampleRate::Hz48000, channels)
            .map_err(|e| CodecError::DecodeFailure(e.to_string()))?;
        Ok(Self {
            decoder,
            channels: u16::from(header.channels),
            pre_skip: usize::from(header.pre_skip),
            gain: header.gain_factor(),
        })
    }

    /// Decode every packet in order into one contiguous buffer.
    ///
    /// Applies pre-skip and, when the final packet carries a granule position,
    /// end trimming. Any rejected packet aborts the whole decode.
    pub fn decode<I>(&mut self, packets: I) -> Result<PcmBuffer, MorphError>
    where
        I: IntoIterator<Item = Result<OpusPacket, ContainerError>>,
    {
        let channels = self.channels as usize;
        let mut frame = vec![0f32; MAX_PACKET_SAMPLES * channels];
        let mut samples = Vec::new();
        let mut packet_count = 0usize;
        let mut end_granule = None;

        for packet in packets {
            let packet = packet?;
            let decoded = packet
                .data()
                .try_into()
                .and_then(|input| {
                    self.decoder
                        .decode_float(Some(input), (&mut frame[..]).try_into()?, false)
                })
                .map_err(|e| {
                    CodecError::DecodeFailure(format!("packet {packet_count}: {e}"))
                })?;
            samples.extend_from_slice(&frame[..decoded * channels]);
            end_granule = packet.granule_position();
            packet_count += 1;
        }

        let decoded_frames = samples.len() / channels;
        if let Some(granule) = end_granule {
            let keep = decoded_frames.min(usize::try_from(granule).unwrap_or(usize::MAX));
            samples.truncate(keep * channels);
        }
        let skip = self.pre_skip.min(samples.len() / channels);
        samples.drain(..skip * channels);

        if (self.gain - 1.0).abs() > f32::EPSILON {
            for s in &mut samples {
                *s *= self.gain;
            }
        }

        let mut pcm = PcmBuffer::new(samples, OPUS_SAMPLE_RATE, self.channels);
        pcm.clamp();
        log::debug!(
            "Decode: {packet_count} packets -> {} frames ({decoded_frames} before trimming)",
            pcm.frames()
        );
        Ok(pcm)
    }
}

pub(crate) fn opus_channels(channels: u8) -> Result<Channels, CodecError> {
    match channels {
        1 => Ok(Channels::Mono),
        2 => Ok(Channels::Stereo),
        n => Err(CodecError::DecodeFailure(format!("{n} channels"))),
    }
}

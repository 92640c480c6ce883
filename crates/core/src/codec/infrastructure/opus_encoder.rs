use audiopus::coder::Encoder;
use audiopus::{Application, Bitrate, SampleRate};

use crate::codec::domain::codec_error::CodecError;
use crate::codec::domain::encoder_settings::{EncoderSettings, OpusApplication};
use crate::codec::infrastructure::opus_decoder::opus_channels;
use crate::container::domain::opus_packet::OpusPacket;
use crate::shared::constants::{MAX_COMPLEXITY, MAX_PACKET_BYTES, OPUS_FRAME_SIZE, OPUS_SAMPLE_RATE};
use crate::shared::pcm_buffer::PcmBuffer;

/// Encoded packets plus what the muxer needs for the identification header.
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub packets: Vec<OpusPacket>,
    pub channels: u16,
    /// Encoder lookahead in samples; decoders discard this many leading frames.
    pub pre_skip: u16,
}

/// Encodes 48 kHz float PCM into 20 ms Opus packets with libopus.
pub struct OpusPacketEncoder {
    settings: EncoderSettings,
}

impl OpusPacketEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    /// Encode the whole buffer.
    ///
    /// Pre-skip is the encoder's reported lookahead, which depends on the
    /// application (120 samples for low delay, 312 otherwise). That many
    /// frames of trailing silence flush the lookahead, and the final partial
    /// frame is zero-padded. The last packet carries the end granule so
    /// decoders trim the padding back off.
    pub fn encode(&self, pcm: &PcmBuffer) -> Result<EncodedAudio, CodecError> {
        if pcm.sample_rate() != OPUS_SAMPLE_RATE {
            return Err(CodecError::EncodeFailure(format!(
                "expected {OPUS_SAMPLE_RATE} Hz input, got {} Hz",
                pcm.sample_rate()
            )));
        }
        let channel_count = u8::try_from(pcm.channels())
            .map_err(|_| CodecError::EncodeFailure(format!("{} channels", pcm.channels())))?;
        let channels = opus_channels(channel_count)
            .map_err(|_| CodecError::EncodeFailure(format!("{channel_count} channels")))?;

        let mut encoder = self.configured_encoder(channels)?;
        let lookahead = encoder
            .lookahead()
            .map_err(|e| CodecError::EncodeFailure(format!("lookahead: {e}")))?;
        let pre_skip = u16::try_from(lookahead)
            .map_err(|_| CodecError::EncodeFailure(format!("lookahead {lookahead} out of range")))?;

        let channels = usize::from(pcm.channels());
        let frame_len = OPUS_FRAME_SIZE * channels;
        let valid_frames = pcm.frames();
        let total_frames = valid_frames + usize::from(pre_skip);
        let packet_count = total_frames.div_ceil(OPUS_FRAME_SIZE);

        let mut padded = pcm.samples().to_vec();
        padded.resize(packet_count * frame_len, 0.0);

        let mut output = vec![0u8; MAX_PACKET_BYTES];
        let mut packets = Vec::with_capacity(packet_count);
        for (index, frame) in padded.chunks_exact(frame_len).enumerate() {
            let len = encoder
                .encode_float(frame, &mut output)
                .map_err(|e| CodecError::EncodeFailure(format!("frame {index}: {e}")))?;
            packets.push(OpusPacket::new(output[..len].to_vec(), OPUS_FRAME_SIZE as u32));
        }

        if let Some(last) = packets.pop() {
            packets.push(last.with_granule_position(total_frames as u64));
        }

        log::debug!(
            "Encode: {valid_frames} frames -> {} packets at {} bit/s ({}, complexity {}, pre-skip {pre_skip})",
            packets.len(),
            self.settings.bitrate,
            self.settings.application,
            self.settings.complexity
        );

        Ok(EncodedAudio {
            packets,
            channels: pcm.channels(),
            pre_skip,
        })
    }

    fn configured_encoder(&self, channels: audiopus::Channels) -> Result<Encoder, CodecError> {
        let EncoderSettings {
            bitrate,
            application: app,
            complexity,
        } = self.settings;
        if complexity > MAX_COMPLEXITY {
            return Err(CodecError::EncodeFailure(format!(
                "complexity {complexity} (expected 0..={MAX_COMPLEXITY})"
            )));
        }
        let bits = i32::try_from(bitrate)
            .map_err(|_| CodecError::EncodeFailure(format!("bitrate {bitrate} out of range")))?;

        let mut encoder = Encoder::new(SampleRate::Hz48000, channels, application(app))
            .map_err(|e| CodecError::EncodeFailure(e.to_string()))?;
        encoder
            .set_bitrate(Bitrate::BitsPerSecond(bits))
            .map_err(|e| CodecError::EncodeFailure(format!("bitrate {bitrate}: {e}")))?;
        encoder
            .set_complexity(complexity)
            .map_err(|e| CodecError::EncodeFailure(format!("complexity {complexity}: {e}")))?;
        Ok(encoder)
    }
}

fn application(app: OpusApplication) -> Application {
    match app {
        OpusApplication::Voip => Application::Voip,
        OpusApplication::Audio => Application::Audio,
        OpusApplication::LowDelay => Application::LowDelay,
    }
}

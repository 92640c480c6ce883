//! Fixture builders shared by unit tests.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::codec::domain::encoder_settings::EncoderSettings;
use crate::codec::infrastructure::opus_decoder::OpusPacketDecoder;
use crate::codec::infrastructure::opus_encoder::OpusPacketEncoder;
use crate::container::domain::opus_header::{OpusHead, OpusTags};
use crate::container::infrastructure::ogg_demuxer::demux;
use crate::container::infrastructure::ogg_muxer::OggMuxer;
use crate::shared::constants::OPUS_SAMPLE_RATE;
use crate::shared::pcm_buffer::PcmBuffer;

pub const FIXTURE_SERIAL: u32 = 0x5EED_0001;

/// Voice-like tone: fundamental plus two decaying harmonics, amplitude 0.5.
pub fn tone(freq: f64, frames: usize, channels: u16) -> PcmBuffer {
    let rate = OPUS_SAMPLE_RATE as f64;
    let mut samples = Vec::with_capacity(frames * channels as usize);
    for i in 0..frames {
        let t = i as f64 / rate;
        let w = 2.0 * std::f64::consts::PI * freq * t;
        let value = (w.sin() + 0.5 * (2.0 * w).sin() + 0.25 * (3.0 * w).sin()) / 1.75 * 0.5;
        for _ in 0..channels {
            samples.push(value as f32);
        }
    }
    PcmBuffer::new(samples, OPUS_SAMPLE_RATE, channels)
}

/// Encode and mux a buffer into a complete Ogg Opus file.
pub fn encode_tone_stream(pcm: &PcmBuffer) -> Vec<u8> {
    let encoded = OpusPacketEncoder::new(EncoderSettings::default())
        .encode(pcm)
        .unwrap();
    let header = OpusHead::new(encoded.channels as u8, encoded.pre_skip, OPUS_SAMPLE_RATE);
    let mut tags = OpusTags::new("fixture");
    tags.comments.push("TITLE=test tone".to_string());
    OggMuxer::new(FIXTURE_SERIAL).mux(&encoded.packets, &header, &tags)
}

/// Demux and decode a complete Ogg Opus file.
pub fn decode_stream(bytes: &[u8]) -> PcmBuffer {
    let stream = demux(bytes).unwrap();
    OpusPacketDecoder::new(&stream.header)
        .unwrap()
        .decode(stream.packets)
        .unwrap()
}

/// Magnitude-weighted mean frequency of the first channel, in Hz.
pub fn spectral_centroid(pcm: &PcmBuffer) -> f64 {
    let mono: Vec<f64> = pcm.to_planar().swap_remove(0);
    let n = mono.len().next_power_of_two();
    let mut buf: Vec<Complex<f64>> = mono.iter().map(|&s| Complex::new(s, 0.0)).collect();
    buf.resize(n, Complex::new(0.0, 0.0));
    FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut buf);

    let bin_hz = pcm.sample_rate() as f64 / n as f64;
    let (weighted, total) = buf[..n / 2]
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(w, t), (k, c)| {
            let mag = c.norm();
            (w + mag * k as f64 * bin_hz, t + mag)
        });
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

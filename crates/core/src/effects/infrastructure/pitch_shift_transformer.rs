use std::f64::consts::{PI, TAU};

use rustfft::num_complex::Complex;

use super::stft::{limit_to_peak, Stft, HALF_WINDOW, HOP_SIZE, WINDOW_SIZE};
use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

/// Largest shift accepted in either direction.
pub const MAX_SEMITONES: f64 = 24.0;

/// Phase-vocoder pitch shifter.
///
/// Each analysis bin is moved to `k * 2^(semitones/12)` and carries its
/// instantaneous frequency scaled by the same ratio; the synthesis phase is
/// accumulated from those frequencies. Duration is unchanged.
pub struct PitchShiftTransformer {
    semitones: f64,
}

impl PitchShiftTransformer {
    pub fn new(semitones: f64) -> Self {
        Self { semitones }
    }

    pub fn ratio(&self) -> f64 {
        2.0_f64.powf(self.semitones / 12.0)
    }

    fn validate(&self) -> Result<(), EffectError> {
        if !self.semitones.is_finite() || self.semitones.abs() > MAX_SEMITONES {
            return Err(EffectError::InvalidParameters(format!(
                "pitch shift must be within ±{MAX_SEMITONES} semitones, got {}",
                self.semitones
            )));
        }
        Ok(())
    }

    fn shift_channel(&self, stft: &Stft, samples: &[f64]) -> Vec<f64> {
        let ratio = self.ratio();
        let expected_advance: Vec<f64> = (0..HALF_WINDOW)
            .map(|k| 2.0 * PI * k as f64 * HOP_SIZE as f64 / WINDOW_SIZE as f64)
            .collect();

        let mut prev_phase = vec![0.0f64; HALF_WINDOW];
        let mut synth_phase = vec![0.0f64; HALF_WINDOW];
        let mut magnitudes = vec![0.0f64; HALF_WINDOW];
        let mut frequencies = vec![0.0f64; HALF_WINDOW];

        stft.process(samples, |_, spectrum| {
            magnitudes.fill(0.0);
            frequencies.fill(0.0);

            for k in 0..HALF_WINDOW {
                let magnitude = spectrum[k].norm();
                let phase = spectrum[k].arg();
                let deviation = phase - prev_phase[k] - expected_advance[k];
                let wrapped = deviation - TAU * (deviation / TAU).round();
                prev_phase[k] = phase;

                // Several source bins can land on one target: keep the loudest.
                let target = (k as f64 * ratio).round() as usize;
                if target < HALF_WINDOW && magnitude > magnitudes[target] {
                    magnitudes[target] = magnitude;
                    frequencies[target] = (expected_advance[k] + wrapped) * ratio;
                }
            }

            for k in 0..HALF_WINDOW {
                synth_phase[k] = (synth_phase[k] + frequencies[k]).rem_euclid(TAU);
                spectrum[k] = Complex::from_polar(magnitudes[k], synth_phase[k]);
            }
        })
    }
}

impl AudioTransformer for PitchShiftTransformer {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError> {
        self.validate()?;
        if self.semitones.abs() < 1e-10 || audio.is_empty() {
            return Ok(());
        }

        let stft = Stft::new();
        let input_peak = audio.peak() as f64;
        let mut planar: Vec<Vec<f64>> = audio
            .to_planar()
            .iter()
            .map(|channel| self.shift_channel(&stft, channel))
            .collect();
        limit_to_peak(&mut planar, input_peak);

        log::debug!(
            "Pitch shift: {:+.2} semitones (ratio {:.4}) over {} frames",
            self.semitones,
            self.ratio(),
            audio.frames()
        );
        *audio = PcmBuffer::from_planar(&planar, audio.sample_rate());
        Ok(())
    }
}

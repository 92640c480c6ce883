use super::lpc::{autocorrelation, levinson_durbin, spectral_envelope, warp_envelope};
use super::stft::{limit_to_peak, Stft, HALF_WINDOW};
use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

/// Order of the LPC analysis; enough poles for four or five formants at 48 kHz.
const LPC_ORDER: usize = 24;

/// Per-bin gain limits when reshaping the envelope.
const MIN_BIN_GAIN: f64 = 0.01;
const MAX_BIN_GAIN: f64 = 100.0;

/// Moves formants without moving pitch.
///
/// Each STFT frame is divided by its LPC envelope and multiplied by the same
/// envelope stretched along frequency, so harmonics stay where they are while
/// the resonances that shape them move.
pub struct FormantShiftTransformer {
    ratio: f64,
}

impl FormantShiftTransformer {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    fn reshape(&self, stft: &Stft, samples: &[f64]) -> Vec<f64> {
        stft.process(samples, |frame, spectrum| {
            let r = autocorrelation(frame, LPC_ORDER);
            if r[0].abs() < 1e-30 {
                return;
            }
            let (coeffs, error) = levinson_durbin(&r, LPC_ORDER);
            let gain = error.abs().sqrt().max(1e-15);
            let original = spectral_envelope(&coeffs, gain, HALF_WINDOW);
            let shifted = warp_envelope(&original, self.ratio);

            for ((bin, orig), new) in spectrum.iter_mut().zip(&original).zip(&shifted) {
                *bin *= (new / orig.max(1e-15)).clamp(MIN_BIN_GAIN, MAX_BIN_GAIN);
            }
        })
    }
}

impl AudioTransformer for FormantShiftTransformer {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError> {
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(EffectError::InvalidParameters(format!(
                "formant ratio must be positive, got {}",
                self.ratio
            )));
        }
        if (self.ratio - 1.0).abs() < 1e-6 || audio.is_empty() {
            return Ok(());
        }

        let stft = Stft::new();
        let input_peak = audio.peak() as f64;
        let mut planar: Vec<Vec<f64>> = audio
            .to_planar()
            .iter()
            .map(|channel| self.reshape(&stft, channel))
            .collect();
        limit_to_peak(&mut planar, input_peak);

        *audio = PcmBuffer::from_planar(&planar, audio.sample_rate());
        Ok(())
    }
}

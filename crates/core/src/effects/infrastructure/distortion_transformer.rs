use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

/// Memoryless tanh soft clipper.
///
/// Normalized so full scale still maps to full scale; `drive` sets how early
/// the curve bends. Zero drive leaves the signal untouched.
pub struct DistortionTransformer {
    drive: f32,
}

impl DistortionTransformer {
    pub fn new(drive: f32) -> Self {
        Self { drive }
    }

    fn shape(&self, sample: f32) -> f32 {
        (self.drive * sample).tanh() / self.drive.tanh()
    }
}

impl AudioTransformer for DistortionTransformer {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError> {
        if !self.drive.is_finite() || self.drive < 0.0 {
            return Err(EffectError::InvalidParameters(format!(
                "distortion drive must be non-negative, got {}",
                self.drive
            )));
        }
        if self.drive == 0.0 {
            return Ok(());
        }
        for sample in audio.samples_mut() {
            *sample = self.shape(*sample);
        }
        audio.clamp();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_scale_is_preserved() {
        let mut audio = PcmBuffer::new(vec![1.0, -1.0, 0.0], 48_000, 1);
        DistortionTransformer::new(2.5).transform(&mut audio).unwrap();
        assert_relative_eq!(audio.samples()[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(audio.samples()[1], -1.0, epsilon = 1e-6);
        assert_eq!(audio.samples()[2], 0.0);
    }

    #[test]
    fn test_quiet_samples_are_boosted() {
        let mut audio = PcmBuffer::new(vec![0.2], 48_000, 1);
        DistortionTransformer::new(2.5).transform(&mut audio).unwrap();
        assert!(audio.samples()[0] > 0.2);
    }

    #[test]
    fn test_curve_is_odd_and_monotonic() {
        let inputs: Vec<f32> = (-10..=10).map(|i| i as f32 / 10.0).collect();
        let mut audio = PcmBuffer::new(inputs, 48_000, 1);
        DistortionTransformer::new(1.5).transform(&mut audio).unwrap();
        let out = audio.samples();
        assert!(out.windows(2).all(|w| w[0] < w[1]));
        assert_relative_eq!(out[0], -out[20], epsilon = 1e-6);
    }

    #[test]
    fn test_zero_drive_is_identity() {
        let mut audio = PcmBuffer::new(vec![0.3, -0.7], 48_000, 1);
        DistortionTransformer::new(0.0).transform(&mut audio).unwrap();
        assert_eq!(audio.samples(), &[0.3, -0.7]);
    }

    #[test]
    fn test_rejects_negative_drive() {
        let mut audio = PcmBuffer::new(vec![0.3], 48_000, 1);
        assert!(DistortionTransformer::new(-1.0).transform(&mut audio).is_err());
    }
}

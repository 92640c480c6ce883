use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

const SINC_LEN: usize = 256;

/// Input frames fed to the resampler per call.
const CHUNK_FRAMES: usize = 1024;

/// Changes playback rate (and with it pitch) by band-limited resampling.
///
/// `rate > 1` shortens the recording. The output always has exactly
/// `ceil(frames / rate)` frames at the original sample rate.
pub struct RateTransformer {
    rate: f64,
}

impl RateTransformer {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub fn output_frames(&self, input_frames: usize) -> usize {
        (input_frames as f64 / self.rate).ceil() as usize
    }

    fn validate(&self) -> Result<(), EffectError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(EffectError::InvalidParameters(format!(
                "rate multiplier must be positive, got {}",
                self.rate
            )));
        }
        Ok(())
    }
}

impl AudioTransformer for RateTransformer {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError> {
        self.validate()?;
        if self.rate == 1.0 || audio.is_empty() {
            return Ok(());
        }

        let frames = audio.frames();
        let target = self.output_frames(frames);
        let channels = usize::from(audio.channels().max(1));

        let params = SincInterpolationParameters {
            sinc_len: SINC_LEN,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let mut resampler =
            SincFixedIn::<f64>::new(1.0 / self.rate, 1.0, params, CHUNK_FRAMES, channels)
                .map_err(|e| EffectError::InvalidParameters(format!("resampler: {e}")))?;
        let delay = resampler.output_delay();
        let needed = target + delay;

        let planar = audio.to_planar();
        let mut resampled: Vec<Vec<f64>> = vec![Vec::with_capacity(needed + CHUNK_FRAMES); channels];
        let mut position = 0;
        let mut blocks = 0usize;
        // Full blocks, then the partial tail, then silence until the delayed
        // output covers the target length.
        while resampled[0].len() < needed {
            let block = if position + CHUNK_FRAMES <= frames {
                let input: Vec<&[f64]> = planar
                    .iter()
                    .map(|c| &c[position..position + CHUNK_FRAMES])
                    .collect();
                position += CHUNK_FRAMES;
                resampler.process(input.as_slice(), None)
            } else if position < frames {
                let input: Vec<&[f64]> = planar.iter().map(|c| &c[position..]).collect();
                position = frames;
                resampler.process_partial(Some(input.as_slice()), None)
            } else {
                resampler.process_partial(None::<&[&[f64]]>, None)
            }
            .map_err(|e| EffectError::InvalidParameters(format!("resampler: {e}")))?;

            for (out, chunk) in resampled.iter_mut().zip(block) {
                out.extend(chunk);
            }
            blocks += 1;
        }

        log::debug!(
            "Rate change x{:.3}: {frames} -> {target} frames ({blocks} blocks of {CHUNK_FRAMES}, delay {delay})",
            self.rate
        );

        let aligned: Vec<Vec<f64>> = resampled
            .into_iter()
            .map(|channel| {
                let mut out: Vec<f64> = channel.into_iter().skip(delay).take(target).collect();
                out.resize(target, 0.0);
                out
            })
            .collect();

        *audio = PcmBuffer::from_planar(&aligned, audio.sample_rate());
        audio.clamp();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spectral_centroid, tone};
    use rstest::rstest;

    #[rstest]
    #[case::slower(0.8, 48_000, 60_000)]
    #[case::faster(1.25, 48_000, 38_400)]
    #[case::uneven(1.08, 1_001, 927)]
    #[case::tiny_input(0.97, 3, 4)]
    fn test_output_length_is_exact(
        #[case] rate: f64,
        #[case] frames: usize,
        #[case] expected: usize,
    ) {
        let transformer = RateTransformer::new(rate);
        assert_eq!(transformer.output_frames(frames), expected);

        let mut audio = tone(220.0, frames, 1);
        transformer.transform(&mut audio).unwrap();
        assert_eq!(audio.frames(), expected);
    }

    #[test]
    fn test_stereo_stays_stereo() {
        let mut audio = tone(220.0, 9_600, 2);
        RateTransformer::new(0.95).transform(&mut audio).unwrap();
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.frames(), 10_106);
    }

    #[test]
    fn test_slowing_down_lowers_centroid() {
        let original = tone(440.0, 48_000, 1);
        let mut slowed = original.clone();
        RateTransformer::new(0.8).transform(&mut slowed).unwrap();
        assert!(spectral_centroid(&slowed) < spectral_centroid(&original));
    }

    #[test]
    fn test_delay_is_compensated() {
        // A step at the very start should still start near frame zero.
        let mut samples = vec![0.0f32; 4_800];
        for s in &mut samples[..2_400] {
            *s = 0.5;
        }
        let mut audio = PcmBuffer::new(samples, 48_000, 1);
        RateTransformer::new(0.5).transform(&mut audio).unwrap();
        assert_eq!(audio.frames(), 9_600);
        assert!(audio.samples()[200].abs() > 0.4);
        assert!(audio.samples()[9_000].abs() < 0.05);
    }

    #[rstest]
    #[case::one_block(CHUNK_FRAMES)]
    #[case::one_past_block(CHUNK_FRAMES + 1)]
    #[case::many_blocks(10 * CHUNK_FRAMES + 77)]
    fn test_block_boundaries_are_seamless(#[case] frames: usize) {
        let freq = 440.0;
        let samples: Vec<f32> = (0..frames)
            .map(|i| (0.5 * (std::f64::consts::TAU * freq * i as f64 / 48_000.0).sin()) as f32)
            .collect();
        let mut audio = PcmBuffer::new(samples, 48_000, 1);
        let rate = 0.8;
        RateTransformer::new(rate).transform(&mut audio).unwrap();
        assert_eq!(audio.frames(), (frames as f64 / rate).ceil() as usize);

        // Steepest slope of a 0.5 amplitude sine at the new frequency, with headroom.
        let max_step = 0.5 * std::f64::consts::TAU * freq * rate / 48_000.0 * 1.2;
        let out = audio.samples();
        let edge = SINC_LEN * 2;
        for i in edge..out.len().saturating_sub(edge) {
            let step = f64::from(out[i + 1] - out[i]).abs();
            assert!(step <= max_step, "jump of {step} at frame {i}");
        }
    }

    #[test]
    fn test_unity_rate_is_untouched() {
        let original = tone(220.0, 4_800, 1);
        let mut audio = original.clone();
        RateTransformer::new(1.0).transform(&mut audio).unwrap();
        assert_eq!(audio, original);
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let mut audio = PcmBuffer::empty(48_000, 1);
        RateTransformer::new(1.2).transform(&mut audio).unwrap();
        assert!(audio.is_empty());
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    fn test_rejects_invalid_rate(#[case] rate: f64) {
        let mut audio = tone(220.0, 480, 1);
        assert!(matches!(
            RateTransformer::new(rate).transform(&mut audio),
            Err(EffectError::InvalidParameters(_))
        ));
    }
}

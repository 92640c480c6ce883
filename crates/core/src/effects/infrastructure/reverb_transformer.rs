//! Schroeder/Freeverb style room reverb.
//!
//! Eight damped feedback combs in parallel feed four allpasses in series.
//! Delay lengths are the classic 44.1 kHz tunings scaled to the buffer's
//! sample rate; each channel after the first gets a small extra spread.

use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const TUNING_RATE: f64 = 44_100.0;
const STEREO_SPREAD: usize = 23;

const COMB_FEEDBACK: f32 = 0.84;
const COMB_DAMPING: f32 = 0.5;
const ALLPASS_FEEDBACK: f32 = 0.5;
const INPUT_GAIN: f32 = 0.015;

struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    store: f32,
}

impl CombFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            store: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        // One-pole lowpass in the loop darkens the tail over time.
        self.store = output * (1.0 - COMB_DAMPING) + self.store * COMB_DAMPING;
        self.buffer[self.index] = input + self.store * COMB_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.index];
        self.buffer[self.index] = input + delayed * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        delayed - input
    }
}

/// Reverb network for one channel.
struct ReverbTank {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl ReverbTank {
    fn new(sample_rate: u32, spread: usize) -> Self {
        let scale = sample_rate as f64 / TUNING_RATE;
        let size = |t: usize| (t as f64 * scale) as usize + spread;
        Self {
            combs: COMB_TUNING.iter().map(|&t| CombFilter::new(size(t))).collect(),
            allpasses: ALLPASS_TUNING
                .iter()
                .map(|&t| AllpassFilter::new(size(t)))
                .collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let driven = input * INPUT_GAIN;
        let mut out: f32 = self.combs.iter_mut().map(|c| c.process(driven)).sum();
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }
}

/// Mixes a reverberated copy into the signal; the tail past the last input
/// frame is dropped so length is unchanged.
pub struct ReverbTransformer {
    mix: f32,
}

impl ReverbTransformer {
    pub fn new(mix: f32) -> Self {
        Self { mix }
    }
}

impl AudioTransformer for ReverbTransformer {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError> {
        if !(0.0..=1.0).contains(&self.mix) {
            return Err(EffectError::InvalidParameters(format!(
                "reverb mix must be within [0, 1], got {}",
                self.mix
            )));
        }
        if self.mix == 0.0 || audio.is_empty() {
            return Ok(());
        }

        let channels = usize::from(audio.channels().max(1));
        let sample_rate = audio.sample_rate();
        let mut tanks: Vec<ReverbTank> = (0..channels)
            .map(|ch| ReverbTank::new(sample_rate, ch * STEREO_SPREAD))
            .collect();

        let dry = 1.0 - self.mix;
        for frame in audio.samples_mut().chunks_exact_mut(channels) {
            for (sample, tank) in frame.iter_mut().zip(&mut tanks) {
                let wet = tank.process(*sample);
                *sample = *sample * dry + wet * self.mix;
            }
        }
        audio.clamp();
        Ok(())
    }
}

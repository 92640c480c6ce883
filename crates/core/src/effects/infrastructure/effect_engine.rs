use super::distortion_transformer::DistortionTransformer;
use super::formant_shift_transformer::FormantShiftTransformer;
use super::pitch_shift_transformer::PitchShiftTransformer;
use super::rate_transformer::RateTransformer;
use super::reverb_transformer::ReverbTransformer;
use crate::effects::domain::audio_transformer::AudioTransformer;
use crate::effects::domain::effect_error::EffectError;
use crate::effects::domain::voice_character::VoiceCharacter;
use crate::shared::pcm_buffer::PcmBuffer;

/// Pitch shift followed by rate change.
///
/// Pitch is shifted first so the phase vocoder works on the original
/// timing; the rate change then rescales duration to exactly
/// `ceil(frames / rate_multiplier)`. Zero semitones at rate 1.0 returns the
/// buffer untouched.
pub fn apply(
    pcm: PcmBuffer,
    pitch_shift_semitones: f32,
    rate_multiplier: f32,
) -> Result<PcmBuffer, EffectError> {
    let chain: [Box<dyn AudioTransformer>; 2] = [
        Box::new(PitchShiftTransformer::new(f64::from(pitch_shift_semitones))),
        Box::new(RateTransformer::new(f64::from(rate_multiplier))),
    ];
    run_chain(pcm, &chain)
}

/// Formant shift, soft-clip distortion and reverb, each skipped when neutral.
/// Frame count and channel layout are preserved.
pub fn apply_character(pcm: PcmBuffer, character: &VoiceCharacter) -> Result<PcmBuffer, EffectError> {
    let chain: [Box<dyn AudioTransformer>; 3] = [
        Box::new(FormantShiftTransformer::new(f64::from(character.formant_ratio))),
        Box::new(DistortionTransformer::new(character.drive)),
        Box::new(ReverbTransformer::new(character.reverb_mix)),
    ];
    run_chain(pcm, &chain)
}

fn run_chain(
    mut pcm: PcmBuffer,
    chain: &[Box<dyn AudioTransformer>],
) -> Result<PcmBuffer, EffectError> {
    for transformer in chain {
        transformer.transform(&mut pcm)?;
    }
    Ok(pcm)
}

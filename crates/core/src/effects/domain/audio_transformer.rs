use super::effect_error::EffectError;
use crate::shared::pcm_buffer::PcmBuffer;

/// One DSP stage applied to a decoded buffer.
///
/// Implementations may replace the buffer wholesale when they change its
/// length (rate change), otherwise they rewrite samples in place.
pub trait AudioTransformer: Send + Sync {
    fn transform(&self, audio: &mut PcmBuffer) -> Result<(), EffectError>;
}

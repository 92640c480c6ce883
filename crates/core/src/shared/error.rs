use thiserror::Error;

use crate::codec::domain::codec_error::CodecError;
use crate::container::domain::container_error::ContainerError;
use crate::effects::domain::effect_error::EffectError;

/// Terminal failure of a morph job: the first error any stage reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MorphError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Effect(#[from] EffectError),
    /// The worker running the job panicked.
    #[error("morph job aborted: {0}")]
    Aborted(String),
}

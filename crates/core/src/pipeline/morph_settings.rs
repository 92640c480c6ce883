use serde::{Deserialize, Serialize};

use crate::codec::domain::encoder_settings::EncoderSettings;

/// User-tunable knobs for a morph job, loadable from a JSON settings file.
///
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphSettings {
    pub encoder: EncoderSettings,
}

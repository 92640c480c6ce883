use serde::{Deserialize, Serialize};

/// Timbre adjustments layered on top of the pitch/rate change.
///
/// Every field has a neutral value (`1.0`, `0.0`, `0.0`) at which the
/// corresponding stage is skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceCharacter {
    /// Spectral envelope scale; above 1 moves formants up.
    pub formant_ratio: f32,
    /// tanh soft-clip drive; 0 disables distortion.
    pub drive: f32,
    /// Reverb wet mix in `[0, 1]`.
    pub reverb_mix: f32,
}

impl VoiceCharacter {
    pub const NEUTRAL: Self = Self {
        formant_ratio: 1.0,
        drive: 0.0,
        reverb_mix: 0.0,
    };

    pub const fn new(formant_ratio: f32, drive: f32, reverb_mix: f32) -> Self {
        Self {
            formant_ratio,
            drive,
            reverb_mix,
        }
    }

    pub fn is_neutral(&self) -> bool {
        (self.formant_ratio - 1.0).abs() < f32::EPSILON
            && self.drive <= 0.0
            && self.reverb_mix <= 0.0
    }
}

impl Default for VoiceCharacter {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        assert!(VoiceCharacter::default().is_neutral());
    }

    #[test]
    fn test_any_active_stage_is_not_neutral() {
        assert!(!VoiceCharacter::new(1.1, 0.0, 0.0).is_neutral());
        assert!(!VoiceCharacter::new(1.0, 1.5, 0.0).is_neutral());
        assert!(!VoiceCharacter::new(1.0, 0.0, 0.2).is_neutral());
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::voice_character::VoiceCharacter;

/// Voice effect applied to a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphPreset {
    Disabled,
    Anonymous,
    Female,
    Male,
    Child,
    Robot,
}

/// Resolved DSP parameters for one preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetParams {
    pub pitch_semitones: f32,
    pub rate: f32,
    pub character: VoiceCharacter,
}

impl PresetParams {
    const fn new(pitch_semitones: f32, rate: f32, character: VoiceCharacter) -> Self {
        Self {
            pitch_semitones,
            rate,
            character,
        }
    }
}

/// Indexed by `MorphPreset::id`.
static PRESET_TABLE: [PresetParams; 6] = [
    PresetParams::new(0.0, 1.0, VoiceCharacter::NEUTRAL),
    PresetParams::new(-2.0, 0.95, VoiceCharacter::new(1.0, 1.5, 0.20)),
    PresetParams::new(6.0, 1.08, VoiceCharacter::new(1.10, 0.0, 0.0)),
    PresetParams::new(-3.0, 0.97, VoiceCharacter::new(0.90, 0.0, 0.0)),
    PresetParams::new(8.0, 1.10, VoiceCharacter::new(1.20, 0.0, 0.0)),
    PresetParams::new(-5.0, 0.80, VoiceCharacter::new(1.0, 2.5, 0.30)),
];

impl MorphPreset {
    pub const ALL: [MorphPreset; 6] = [
        MorphPreset::Disabled,
        MorphPreset::Anonymous,
        MorphPreset::Female,
        MorphPreset::Male,
        MorphPreset::Child,
        MorphPreset::Robot,
    ];

    /// Stable numeric id, `0..=5`.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    pub fn params(self) -> &'static PresetParams {
        &PRESET_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            MorphPreset::Disabled => "disabled",
            MorphPreset::Anonymous => "anonymous",
            MorphPreset::Female => "female",
            MorphPreset::Male => "male",
            MorphPreset::Child => "child",
            MorphPreset::Robot => "robot",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MorphPreset::Disabled => "Voice unchanged",
            MorphPreset::Anonymous => "Masked voice, as used for news interviews",
            MorphPreset::Female => "Raised pitch and formants",
            MorphPreset::Male => "Lowered pitch and formants",
            MorphPreset::Child => "High, bright child voice",
            MorphPreset::Robot => "Low metallic voice",
        }
    }
}

/// Pitch shift in semitones for a preset.
pub fn pitch_shift_for_preset(preset: MorphPreset) -> f32 {
    preset.params().pitch_semitones
}

/// Playback-rate multiplier for a preset; above 1 shortens the recording.
pub fn rate_for_preset(preset: MorphPreset) -> f32 {
    preset.params().rate
}

impl fmt::Display for MorphPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MorphPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

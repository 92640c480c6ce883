//! Voice morphing for OGG/Opus recordings.
//!
//! A recording is demuxed, decoded to PCM, pitch/rate shifted and coloured
//! by a [`MorphPreset`], then re-encoded and re-muxed into a new,
//! independently playable OGG/Opus file.

pub mod codec;
pub mod container;
pub mod effects;
pub mod pipeline;
pub mod shared;

#[cfg(test)]
mod test_support;

pub use codec::domain::encoder_settings::{EncoderSettings, OpusApplication};
pub use effects::domain::morph_preset::{pitch_shift_for_preset, rate_for_preset, MorphPreset, PresetParams};
pub use effects::domain::voice_character::VoiceCharacter;
pub use pipeline::infrastructure::voice_morpher::VoiceMorpher;
pub use pipeline::morph_settings::MorphSettings;
pub use pipeline::transcode_job::TranscodeJob;
pub use shared::error::MorphError;

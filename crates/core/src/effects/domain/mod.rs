pub mod audio_transformer;
pub mod effect_error;
pub mod morph_preset;
pub mod voice_character;

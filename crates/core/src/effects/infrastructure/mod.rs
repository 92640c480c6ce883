pub mod distortion_transformer;
pub mod effect_engine;
pub mod formant_shift_transformer;
mod lpc;
pub mod pitch_shift_transformer;
pub mod rate_transformer;
pub mod reverb_transformer;
mod stft;

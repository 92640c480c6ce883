pub mod codec_error;
pub mod encoder_settings;

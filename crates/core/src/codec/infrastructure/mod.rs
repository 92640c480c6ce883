pub mod opus_decoder;
pub mod opus_encoder;

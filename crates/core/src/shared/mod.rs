pub mod constants;
pub mod error;
pub mod pcm_buffer;

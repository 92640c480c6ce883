use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("opus decode failed: {0}")]
    DecodeFailure(String),
    #[error("opus encode failed: {0}")]
    EncodeFailure(String),
}

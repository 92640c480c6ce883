use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("invalid effect parameters: {0}")]
    InvalidParameters(String),
}

use thiserror::Error;

/// Failure of a key derivation. No partial key material is ever returned.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// Cost parameters out of range, or rejected by the primitive.
    #[error("invalid KDF parameters: {0}")]
    InvalidParams(String),

    /// The primitive could not run (allocation failure, worker task died).
    #[error("key derivation unavailable: {0}")]
    Unavailable(String),
}

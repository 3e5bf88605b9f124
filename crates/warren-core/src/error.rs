use thiserror::Error;

/// Errors raised by the tagged binary codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("expected {expected} bytes but found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("unexpected end of buffer while decoding `{what}`")]
    Truncated { what: &'static str },
}

/// Errors raised by the per-packet encryption envelope.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("packet too short to contain a KXT and AEAD tag")]
    TooShort,

    #[error("packet failed authentication (forged, corrupted, or sender spoofed)")]
    Integrity,

    #[error("malformed public key bytes")]
    BadKey,
}

use thiserror::Error;

/// Errors raised by signing and verification ("Fatal configuration").
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("key material unavailable: {0}")]
    KeyUnavailable(String),
    #[error("signing backend rejected the digest: {0}")]
    SigningFailed(String),
    #[error("signature has the wrong length for scheme {scheme:?}: expected {expected}, got {actual}")]
    WrongLength {
        scheme: relayer_types::SignatureScheme,
        expected: usize,
        actual: usize,
    },
    #[error("remote signing RPC is not configured for this deployment")]
    RemoteNotConfigured,
    #[error("validator cohort did not meet signature threshold: required {required}, collected {collected}")]
    ThresholdNotMet { required: usize, collected: usize },
}

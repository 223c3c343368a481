use thiserror::Error;

/// Failure surfaced by the external wallet collaborator.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet signing failed: {0}")]
    Signing(String),
    #[error("wallet verification failed: {0}")]
    Verification(String),
    #[error("wallet could not produce a public key: {0}")]
    PublicKey(String),
    #[error("wallet could not mint a nonce: {0}")]
    NonceCreation(String),
}

/// Failure surfaced by the external transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport is closed")]
    Closed,
}

/// Structural rejection of an inbound or outbound [`crate::AuthMessage`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported protocol version {0:?}")]
    UnsupportedVersion(String),
    #[error("missing required field `{0}` for messageType {1:?}")]
    MissingField(&'static str, crate::MessageType),
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("invalid base64 in field `{0}`: {1}")]
    InvalidBase64(&'static str, String),
    #[error("invalid hex in field `{0}`: {1}")]
    InvalidHex(&'static str, String),
}

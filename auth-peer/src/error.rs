use auth_wire::{CodecError, TransportError, WalletError};
use thiserror::Error;

/// Every way a handshake, session lookup, or message exchange can fail.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("structural error: {0}")]
    Structural(#[from] CodecError),
    #[error("nonce rejected by wallet")]
    NonceRejected,
    #[error("no session found for the given key")]
    SessionMissing,
    #[error("session is missing required field `{0}`")]
    SessionIncomplete(&'static str),
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error("certificate validation failed: {0}")]
    CertificateValidation(String),
    #[error(transparent)]
    TransportFailure(#[from] TransportError),
    #[error("initial response timed out")]
    HandshakeTimeout,
    #[error("handshake failed: no authenticated session was established")]
    HandshakeFailed,
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

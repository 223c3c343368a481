//! Wire types for the peer authentication protocol.
//!
//! This crate carries no session logic: it defines the on-wire
//! [`AuthMessage`] record, the [`RequestedCertificateSet`]/[`VerifiableCertificate`]
//! shapes it embeds, structural validation of a message against its declared
//! `messageType`, and the canonical byte encodings signed by each message
//! kind. The state machine that drives the handshake and routes messages
//! lives in `auth-peer`, which depends on this crate.

mod error;
mod message;

pub use error::{CodecError, TransportError, WalletError};
pub use message::{
    AuthMessage, MessageType, RequestedCertificateSet, VerifiableCertificate,
    PROTOCOL_VERSION, SIGNATURE_PROTOCOL_ID, certificates_signing_bytes, decode_base64,
    decode_hex, encode_base64, initial_response_signing_bytes,
    requested_certificates_signing_bytes, validate_structure,
};

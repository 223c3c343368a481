use std::collections::BTreeMap;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Fixed protocol version this crate speaks. Any other value is rejected.
pub const PROTOCOL_VERSION: &str = "0.1";

/// The fixed `protocolID` under which every authentication signature is made.
pub const SIGNATURE_PROTOCOL_ID: (u8, &str) = (2, "auth message signature");

/// Discriminant for [`AuthMessage`], carried on the wire as `messageType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    InitialRequest,
    InitialResponse,
    CertificateRequest,
    CertificateResponse,
    General,
}

/// A certifier/type/field-name combination the sender wishes to see disclosed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCertificateSet {
    pub certifiers: Vec<String>,
    pub types: BTreeMap<String, Vec<String>>,
}

/// An opaque, already-disclosed certificate. The core never interprets
/// `fields` beyond checking that a requested field name is present; the
/// actual certificate semantics (issuance, decryption of selectively
/// disclosed values) live entirely in the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableCertificate {
    pub certifier: String,
    #[serde(rename = "type")]
    pub cert_type: String,
    pub fields: BTreeMap<String, String>,
    pub signature: Vec<u8>,
}

/// The on-wire record exchanged between two peers.
///
/// Fields beyond `version`, `message_type` and `identity_key` are optional;
/// which of them are required is a function of `message_type` (see
/// [`validate_structure`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMessage {
    pub version: String,
    pub message_type: MessageType,
    pub identity_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_certificates: Option<RequestedCertificateSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<VerifiableCertificate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl AuthMessage {
    fn new(message_type: MessageType, identity_key: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type,
            identity_key: identity_key.into(),
            initial_nonce: None,
            your_nonce: None,
            nonce: None,
            requested_certificates: None,
            certificates: None,
            payload: None,
            signature: None,
        }
    }

    #[must_use]
    pub fn initial_request(identity_key: impl Into<String>, initial_nonce: impl Into<String>) -> Self {
        let mut m = Self::new(MessageType::InitialRequest, identity_key);
        m.initial_nonce = Some(initial_nonce.into());
        m.requested_certificates = Some(RequestedCertificateSet::default());
        m
    }

    #[must_use]
    pub fn initial_response(identity_key: impl Into<String>) -> Self {
        Self::new(MessageType::InitialResponse, identity_key)
    }

    #[must_use]
    pub fn certificate_request(identity_key: impl Into<String>) -> Self {
        Self::new(MessageType::CertificateRequest, identity_key)
    }

    #[must_use]
    pub fn certificate_response(identity_key: impl Into<String>) -> Self {
        Self::new(MessageType::CertificateResponse, identity_key)
    }

    #[must_use]
    pub fn general(identity_key: impl Into<String>) -> Self {
        Self::new(MessageType::General, identity_key)
    }
}

fn require<'a>(
    field_name: &'static str,
    message_type: MessageType,
    value: &'a Option<String>,
) -> Result<&'a str, CodecError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(CodecError::EmptyField(field_name)),
        None => Err(CodecError::MissingField(field_name, message_type)),
    }
}

/// Validates that `message` carries every field its `message_type` requires,
/// per the required-fields table. Does not verify signatures or nonces; that
/// is the processors' job once a session is available.
pub fn validate_structure(message: &AuthMessage) -> Result<(), CodecError> {
    if message.version != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(message.version.clone()));
    }
    if message.identity_key.is_empty() {
        return Err(CodecError::EmptyField("identityKey"));
    }

    match message.message_type {
        MessageType::InitialRequest => {
            require("initialNonce", message.message_type, &message.initial_nonce)?;
            if message.requested_certificates.is_none() {
                return Err(CodecError::MissingField(
                    "requestedCertificates",
                    message.message_type,
                ));
            }
        }
        MessageType::InitialResponse => {
            require("initialNonce", message.message_type, &message.initial_nonce)?;
            require("yourNonce", message.message_type, &message.your_nonce)?;
            if message.signature.is_none() {
                return Err(CodecError::MissingField("signature", message.message_type));
            }
        }
        MessageType::CertificateRequest => {
            require("nonce", message.message_type, &message.nonce)?;
            require("yourNonce", message.message_type, &message.your_nonce)?;
            if message.requested_certificates.is_none() {
                return Err(CodecError::MissingField(
                    "requestedCertificates",
                    message.message_type,
                ));
            }
            if message.signature.is_none() {
                return Err(CodecError::MissingField("signature", message.message_type));
            }
        }
        MessageType::CertificateResponse => {
            require("nonce", message.message_type, &message.nonce)?;
            require("yourNonce", message.message_type, &message.your_nonce)?;
            if message.certificates.is_none() {
                return Err(CodecError::MissingField("certificates", message.message_type));
            }
            if message.signature.is_none() {
                return Err(CodecError::MissingField("signature", message.message_type));
            }
        }
        MessageType::General => {
            require("nonce", message.message_type, &message.nonce)?;
            require("yourNonce", message.message_type, &message.your_nonce)?;
            if message.payload.is_none() {
                return Err(CodecError::MissingField("payload", message.message_type));
            }
            if message.signature.is_none() {
                return Err(CodecError::MissingField("signature", message.message_type));
            }
        }
    }
    Ok(())
}

/// Decodes a base64 wire field, tagging decode failures with the field name.
pub fn decode_base64(field_name: &'static str, value: &str) -> Result<Vec<u8>, CodecError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| CodecError::InvalidBase64(field_name, e.to_string()))
}

/// Encodes bytes as the base64 form used for nonce wire fields.
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a hex wire field (e.g. `identityKey`), tagging failures.
pub fn decode_hex(field_name: &'static str, value: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(value).map_err(|e| CodecError::InvalidHex(field_name, e.to_string()))
}

/// Canonical bytes signed for an `initialResponse`. The order is fixed by
/// role, not by which side is computing it: the identity key that sent the
/// original `initialRequest`'s nonce always goes first, the responder's
/// freshly minted nonce always goes second, both base64-decoded first. Both
/// the signer and the verifier must pass their two nonces in that same
/// absolute order or the signature will never match.
#[must_use]
pub fn initial_response_signing_bytes(initiator_nonce: &[u8], responder_nonce: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(initiator_nonce.len() + responder_nonce.len());
    data.extend_from_slice(initiator_nonce);
    data.extend_from_slice(responder_nonce);
    data
}

/// Canonical bytes signed for a `certificateRequest`: the UTF-8 JSON
/// serialization of the requested set, with sorted map keys (`BTreeMap`)
/// so the same request always produces the same bytes.
pub fn requested_certificates_signing_bytes(
    set: &RequestedCertificateSet,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(set)
}

/// Canonical bytes signed for a `certificateResponse`: the UTF-8 JSON
/// serialization of the disclosed certificate sequence.
pub fn certificates_signing_bytes(
    certificates: &[VerifiableCertificate],
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_initial_request_minimal() {
        let msg = AuthMessage::initial_request("abcd", "bm9uY2U=");
        assert!(validate_structure(&msg).is_ok());
    }

    #[test]
    fn rejects_missing_initial_nonce() {
        let mut msg = AuthMessage::initial_request("abcd", "bm9uY2U=");
        msg.initial_nonce = None;
        assert_eq!(
            validate_structure(&msg),
            Err(CodecError::MissingField("initialNonce", MessageType::InitialRequest))
        );
    }

    #[test]
    fn rejects_initial_request_missing_requested_certificates() {
        let mut msg = AuthMessage::initial_request("abcd", "bm9uY2U=");
        msg.requested_certificates = None;
        assert_eq!(
            validate_structure(&msg),
            Err(CodecError::MissingField(
                "requestedCertificates",
                MessageType::InitialRequest
            ))
        );
    }

    #[test]
    fn rejects_empty_identity_key() {
        let msg = AuthMessage::initial_request("", "bm9uY2U=");
        assert_eq!(validate_structure(&msg), Err(CodecError::EmptyField("identityKey")));
    }

    #[test]
    fn rejects_version_mismatch() {
        let mut msg = AuthMessage::general("abcd");
        msg.version = "9.9".to_string();
        assert_eq!(
            validate_structure(&msg),
            Err(CodecError::UnsupportedVersion("9.9".to_string()))
        );
    }

    #[test]
    fn rejects_general_without_payload() {
        let mut msg = AuthMessage::general("abcd");
        msg.nonce = Some("n".to_string());
        msg.your_nonce = Some("y".to_string());
        msg.signature = Some(vec![1, 2, 3]);
        assert_eq!(
            validate_structure(&msg),
            Err(CodecError::MissingField("payload", MessageType::General))
        );
    }

    #[test]
    fn accepts_well_formed_general() {
        let mut msg = AuthMessage::general("abcd");
        msg.nonce = Some("n".to_string());
        msg.your_nonce = Some("y".to_string());
        msg.payload = Some(b"hi".to_vec());
        msg.signature = Some(vec![1, 2, 3]);
        assert!(validate_structure(&msg).is_ok());
    }

    #[test]
    fn base64_round_trips() {
        let bytes = b"hello world";
        let encoded = encode_base64(bytes);
        assert_eq!(decode_base64("nonce", &encoded).unwrap(), bytes);
    }

    #[test]
    fn certificate_signing_bytes_are_order_independent_in_map_keys() {
        let mut set_a = RequestedCertificateSet::default();
        set_a.types.insert("b".to_string(), vec!["x".to_string()]);
        set_a.types.insert("a".to_string(), vec!["y".to_string()]);

        let mut set_b = RequestedCertificateSet::default();
        set_b.types.insert("a".to_string(), vec!["y".to_string()]);
        set_b.types.insert("b".to_string(), vec!["x".to_string()]);

        assert_eq!(
            requested_certificates_signing_bytes(&set_a).unwrap(),
            requested_certificates_signing_bytes(&set_b).unwrap()
        );
    }
}

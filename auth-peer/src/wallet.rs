use async_trait::async_trait;
use auth_wire::{RequestedCertificateSet, VerifiableCertificate, WalletError};

/// Arguments to a signature operation, mirroring the wallet's
/// `(data, protocolID, keyID, counterparty)` convention.
#[derive(Debug, Clone, Copy)]
pub struct SignatureArgs<'a> {
    pub data: &'a [u8],
    pub protocol_id: (u8, &'a str),
    pub key_id: &'a str,
    pub counterparty: &'a str,
}

/// The cryptographic wallet this engine consumes but does not implement.
///
/// Every method is a suspension point: a real wallet may prompt a user,
/// reach a hardware token, or cross a process boundary.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn create_signature(&self, args: SignatureArgs<'_>) -> Result<Vec<u8>, WalletError>;

    async fn verify_signature(
        &self,
        args: SignatureArgs<'_>,
        signature: &[u8],
    ) -> Result<bool, WalletError>;

    /// Returns our own identity public key, hex-encoded.
    async fn get_public_key(&self) -> Result<String, WalletError>;

    /// Mints a nonce bound to this wallet's identity.
    async fn create_nonce(&self) -> Result<String, WalletError>;

    /// Returns true iff `nonce` was produced by this wallet's `create_nonce`.
    async fn verify_nonce(&self, nonce: &str) -> Result<bool, WalletError>;

    /// Selects certificates from the wallet's store matching `request` and
    /// prepares them for disclosure to `verifier_identity_key`.
    async fn select_certificates(
        &self,
        request: &RequestedCertificateSet,
        verifier_identity_key: &str,
    ) -> Result<Vec<VerifiableCertificate>, WalletError>;
}

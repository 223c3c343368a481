//! In-memory test doubles for [`crate::Wallet`] and [`crate::Transport`].
//!
//! These are deliberately simplistic: `InMemoryWallet` signs with a fixed
//! per-wallet secret byte (not a real signature scheme) and tracks nonces it
//! minted in a `HashSet`, matching the role the teacher's
//! `generate_test_keypair()` helper plays for its own tests. They exist to
//! exercise the protocol state machine, not to demonstrate a real
//! cryptographic construction.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use auth_wire::{AuthMessage, RequestedCertificateSet, TransportError, VerifiableCertificate, WalletError};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::transport::Transport;
use crate::wallet::{SignatureArgs, Wallet};

/// A wallet whose "signature" is a keyed hash stand-in: `key_id` and
/// `counterparty` and `data` are concatenated and hashed with a per-wallet
/// secret. Good enough to exercise forgery/tamper detection in tests without
/// pulling in a real signature crate for the core's own test suite.
pub struct InMemoryWallet {
    identity_key: String,
    secret: [u8; 32],
    minted_nonces: StdMutex<HashSet<String>>,
    certificates: Vec<VerifiableCertificate>,
}

impl InMemoryWallet {
    pub fn new(identity_key: impl Into<String>) -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self {
            identity_key: identity_key.into(),
            secret,
            minted_nonces: StdMutex::new(HashSet::new()),
            certificates: Vec::new(),
        }
    }

    pub fn with_certificates(mut self, certificates: Vec<VerifiableCertificate>) -> Self {
        self.certificates = certificates;
        self
    }

    fn mac(&self, args: &SignatureArgs<'_>) -> Vec<u8> {
        let mut input = Vec::new();
        input.extend_from_slice(&self.secret);
        input.extend_from_slice(args.key_id.as_bytes());
        input.extend_from_slice(args.counterparty.as_bytes());
        input.extend_from_slice(args.data);
        input.push(args.protocol_id.0);
        input.extend_from_slice(args.protocol_id.1.as_bytes());
        simple_digest(&input)
    }
}

/// Not a cryptographic hash. Deterministic, order-sensitive mixing, enough
/// to tell "same inputs" from "different inputs" in tests.
fn simple_digest(input: &[u8]) -> Vec<u8> {
    let mut state: u64 = 0xcbf29ce484222325;
    for byte in input {
        state ^= *byte as u64;
        state = state.wrapping_mul(0x100000001b3);
    }
    state.to_le_bytes().to_vec()
}

#[async_trait]
impl Wallet for InMemoryWallet {
    async fn create_signature(&self, args: SignatureArgs<'_>) -> Result<Vec<u8>, WalletError> {
        Ok(self.mac(&args))
    }

    async fn verify_signature(&self, args: SignatureArgs<'_>, signature: &[u8]) -> Result<bool, WalletError> {
        Ok(self.mac(&args) == signature)
    }

    async fn get_public_key(&self) -> Result<String, WalletError> {
        Ok(self.identity_key.clone())
    }

    async fn create_nonce(&self) -> Result<String, WalletError> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let nonce = auth_wire::encode_base64(&bytes);
        self.minted_nonces.lock().expect("lock poisoned").insert(nonce.clone());
        Ok(nonce)
    }

    async fn verify_nonce(&self, nonce: &str) -> Result<bool, WalletError> {
        Ok(self.minted_nonces.lock().expect("lock poisoned").contains(nonce))
    }

    async fn select_certificates(
        &self,
        request: &RequestedCertificateSet,
        _verifier_identity_key: &str,
    ) -> Result<Vec<VerifiableCertificate>, WalletError> {
        Ok(self
            .certificates
            .iter()
            .filter(|c| {
                request.certifiers.iter().any(|certifier| certifier == &c.certifier)
                    && request.types.contains_key(&c.cert_type)
            })
            .cloned()
            .collect())
    }
}

type DataHandler = Box<dyn Fn(AuthMessage) + Send + Sync>;

/// A direct, in-process duplex channel between exactly two `LoopbackTransport`
/// endpoints. `send` on one side calls the other side's registered handler
/// inline (after spawning, so it never deadlocks on the caller's own task).
pub struct LoopbackTransport {
    peer: StdMutex<Option<Arc<LoopbackTransport>>>,
    handler: StdMutex<Option<DataHandler>>,
    drop_inbound: std::sync::atomic::AtomicBool,
    inbound_tamper: StdMutex<Option<Box<dyn Fn(&mut AuthMessage) + Send + Sync>>>,
    sent_initial_requests: std::sync::atomic::AtomicUsize,
}

impl LoopbackTransport {
    pub fn new_pair() -> (Arc<Self>, Arc<Self>) {
        let a = Arc::new(Self {
            peer: StdMutex::new(None),
            handler: StdMutex::new(None),
            drop_inbound: std::sync::atomic::AtomicBool::new(false),
            inbound_tamper: StdMutex::new(None),
            sent_initial_requests: std::sync::atomic::AtomicUsize::new(0),
        });
        let b = Arc::new(Self {
            peer: StdMutex::new(None),
            handler: StdMutex::new(None),
            drop_inbound: std::sync::atomic::AtomicBool::new(false),
            inbound_tamper: StdMutex::new(None),
            sent_initial_requests: std::sync::atomic::AtomicUsize::new(0),
        });
        *a.peer.lock().expect("lock poisoned") = Some(b.clone());
        *b.peer.lock().expect("lock poisoned") = Some(a.clone());
        (a, b)
    }

    /// After this call, messages sent to this endpoint are silently
    /// discarded instead of reaching the registered handler, simulating a
    /// counterparty that never replies.
    pub fn silence_inbound(&self) {
        self.drop_inbound.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Every message about to reach this endpoint's handler is first passed
    /// through `tamper`, simulating an on-path attacker mutating traffic.
    pub fn set_inbound_tamper(&self, tamper: impl Fn(&mut AuthMessage) + Send + Sync + 'static) {
        *self.inbound_tamper.lock().expect("lock poisoned") = Some(Box::new(tamper));
    }

    /// How many `initialRequest` messages this endpoint has sent out.
    pub fn sent_initial_request_count(&self) -> usize {
        self.sent_initial_requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, mut message: AuthMessage) -> Result<(), TransportError> {
        if message.message_type == auth_wire::MessageType::InitialRequest {
            self.sent_initial_requests.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
        let peer = self
            .peer
            .lock()
            .expect("lock poisoned")
            .clone()
            .ok_or(TransportError::Closed)?;
        if peer.drop_inbound.load(std::sync::atomic::Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(tamper) = peer.inbound_tamper.lock().expect("lock poisoned").as_ref() {
            tamper(&mut message);
        }
        let handler_guard = peer.handler.lock().expect("lock poisoned");
        if let Some(handler) = handler_guard.as_ref() {
            handler(message);
        }
        Ok(())
    }

    fn on_data(&self, handler: Box<dyn Fn(AuthMessage) + Send + Sync>) {
        *self.handler.lock().expect("lock poisoned") = Some(handler);
    }
}

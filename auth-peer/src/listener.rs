use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use auth_wire::{RequestedCertificateSet, VerifiableCertificate};
use tokio::sync::Mutex;

/// Which of the four callback registries a [`ListenerId`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    GeneralMessage,
    CertificatesReceived,
    CertificatesRequested,
    InitialResponse,
}

/// A handle returned by `listen_for_*`, tagged with the registry it came
/// from. `stop_listening_for_*` takes the matching handler map directly by
/// construction, so a handle from one kind can never be used to remove a
/// listener of another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) ListenerKind, pub(crate) u64);

impl ListenerId {
    pub fn kind(&self) -> ListenerKind {
        self.0
    }
}

pub type GeneralMessageHandler = Arc<dyn Fn(Vec<u8>, String) + Send + Sync>;
pub type CertificatesReceivedHandler = Arc<dyn Fn(Vec<VerifiableCertificate>, String) + Send + Sync>;
pub type CertificatesRequestedHandler = Arc<dyn Fn(RequestedCertificateSet, String) + Send + Sync>;
pub type InitialResponseHandler = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct Counters {
    general_message: AtomicU64,
    certificates_received: AtomicU64,
    certificates_requested: AtomicU64,
    initial_response: AtomicU64,
}

/// The Peer's four independent callback registries.
pub(crate) struct ListenerRegistry {
    general_message: Mutex<HashMap<u64, GeneralMessageHandler>>,
    certificates_received: Mutex<HashMap<u64, CertificatesReceivedHandler>>,
    certificates_requested: Mutex<HashMap<u64, CertificatesRequestedHandler>>,
    initial_response: Mutex<HashMap<u64, InitialResponseHandler>>,
    counters: Counters,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            general_message: Mutex::new(HashMap::new()),
            certificates_received: Mutex::new(HashMap::new()),
            certificates_requested: Mutex::new(HashMap::new()),
            initial_response: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub(crate) async fn listen_for_general_message(&self, handler: GeneralMessageHandler) -> ListenerId {
        let id = self.counters.general_message.fetch_add(1, Ordering::Relaxed);
        self.general_message.lock().await.insert(id, handler);
        ListenerId(ListenerKind::GeneralMessage, id)
    }

    pub(crate) async fn listen_for_certificates_received(
        &self,
        handler: CertificatesReceivedHandler,
    ) -> ListenerId {
        let id = self.counters.certificates_received.fetch_add(1, Ordering::Relaxed);
        self.certificates_received.lock().await.insert(id, handler);
        ListenerId(ListenerKind::CertificatesReceived, id)
    }

    pub(crate) async fn listen_for_certificates_requested(
        &self,
        handler: CertificatesRequestedHandler,
    ) -> ListenerId {
        let id = self.counters.certificates_requested.fetch_add(1, Ordering::Relaxed);
        self.certificates_requested.lock().await.insert(id, handler);
        ListenerId(ListenerKind::CertificatesRequested, id)
    }

    pub(crate) async fn listen_for_initial_response(&self, handler: InitialResponseHandler) -> ListenerId {
        let id = self.counters.initial_response.fetch_add(1, Ordering::Relaxed);
        self.initial_response.lock().await.insert(id, handler);
        ListenerId(ListenerKind::InitialResponse, id)
    }

    /// Removes a listener. A stale or already-removed id is a no-op.
    pub(crate) async fn stop_listening(&self, id: ListenerId) {
        match id.0 {
            ListenerKind::GeneralMessage => {
                self.general_message.lock().await.remove(&id.1);
            }
            ListenerKind::CertificatesReceived => {
                self.certificates_received.lock().await.remove(&id.1);
            }
            ListenerKind::CertificatesRequested => {
                self.certificates_requested.lock().await.remove(&id.1);
            }
            ListenerKind::InitialResponse => {
                self.initial_response.lock().await.remove(&id.1);
            }
        }
    }

    pub(crate) async fn certificates_requested_listener_count(&self) -> usize {
        self.certificates_requested.lock().await.len()
    }

    pub(crate) async fn notify_general_message(&self, payload: Vec<u8>, sender: String) {
        for handler in self.general_message.lock().await.values() {
            handler(payload.clone(), sender.clone());
        }
    }

    pub(crate) async fn notify_certificates_received(
        &self,
        certificates: Vec<VerifiableCertificate>,
        sender: String,
    ) {
        for handler in self.certificates_received.lock().await.values() {
            handler(certificates.clone(), sender.clone());
        }
    }

    pub(crate) async fn notify_certificates_requested(
        &self,
        request: RequestedCertificateSet,
        sender: String,
    ) {
        for handler in self.certificates_requested.lock().await.values() {
            handler(request.clone(), sender.clone());
        }
    }

    pub(crate) async fn notify_initial_response(&self, peer_identity_key: String) {
        for handler in self.initial_response.lock().await.values() {
            handler(peer_identity_key.clone());
        }
    }
}

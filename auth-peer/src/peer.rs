use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auth_wire::{
    AuthMessage, CodecError, MessageType, RequestedCertificateSet, SIGNATURE_PROTOCOL_ID,
    VerifiableCertificate, certificates_signing_bytes, decode_base64,
    initial_response_signing_bytes, requested_certificates_signing_bytes, validate_structure,
};
use rand::RngCore;
use rand::rngs::OsRng;
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::time::timeout;

use crate::certificates;
use crate::config::PeerConfig;
use crate::error::PeerError;
use crate::listener::{
    CertificatesReceivedHandler, CertificatesRequestedHandler, GeneralMessageHandler,
    InitialResponseHandler, ListenerId, ListenerRegistry,
};
use crate::nonce;
use crate::session::{PeerSession, SessionManager};
use crate::transport::Transport;
use crate::wallet::{SignatureArgs, Wallet};

fn missing(field: &'static str, kind: MessageType) -> PeerError {
    PeerError::Structural(CodecError::MissingField(field, kind))
}

/// The handshake/dispatch state machine. One `Peer` multiplexes every
/// counterparty session reachable over a single [`Transport`].
pub struct Peer {
    wallet: Arc<dyn Wallet>,
    transport: Arc<dyn Transport>,
    sessions: SessionManager,
    config: PeerConfig,
    listeners: ListenerRegistry,
    last_interacted_with_peer: Mutex<Option<String>>,
    pending_handshakes: Mutex<HashMap<String, Arc<Notify>>>,
    pending_initial_response: Mutex<HashMap<String, oneshot::Sender<Result<String, PeerError>>>>,
}

impl Peer {
    /// Builds a `Peer` and registers its dispatcher with `transport`. The
    /// registered closure only holds a `Weak` reference back to the peer, so
    /// dropping every `Arc<Peer>` lets the peer (and, transitively, the
    /// closure's captured state) be reclaimed even though the transport
    /// outlives it.
    pub fn new(wallet: Arc<dyn Wallet>, transport: Arc<dyn Transport>, config: PeerConfig) -> Arc<Self> {
        let peer = Arc::new(Self {
            wallet,
            transport: transport.clone(),
            sessions: SessionManager::new(),
            config,
            listeners: ListenerRegistry::new(),
            last_interacted_with_peer: Mutex::new(None),
            pending_handshakes: Mutex::new(HashMap::new()),
            pending_initial_response: Mutex::new(HashMap::new()),
        });

        let weak = Arc::downgrade(&peer);
        transport.on_data(Box::new(move |message| {
            let Some(peer) = weak.upgrade() else {
                return;
            };
            tokio::spawn(async move {
                peer.dispatch(message).await;
            });
        }));

        peer
    }

    fn mint_request_nonce() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        auth_wire::encode_base64(&bytes)
    }

    async fn dispatch(self: Arc<Self>, message: AuthMessage) {
        if let Err(error) = validate_structure(&message) {
            tracing::debug!(?error, message_type = ?message.message_type, "dropping malformed auth message");
            return;
        }
        let result = match message.message_type {
            MessageType::InitialRequest => self.process_initial_request(message).await,
            MessageType::InitialResponse => self.process_initial_response(message).await,
            MessageType::CertificateRequest => self.process_certificate_request(message).await,
            MessageType::CertificateResponse => self.process_certificate_response(message).await,
            MessageType::General => self.process_general_message(message).await,
        };
        if let Err(error) = result {
            tracing::warn!(%error, "failed to process inbound auth message");
        }
    }

    async fn resolve_target(&self, identity_key: Option<String>) -> Result<String, PeerError> {
        if let Some(key) = identity_key {
            return Ok(key);
        }
        if self.config.auto_persist_last_session {
            if let Some(last) = self.last_interacted_with_peer.lock().await.clone() {
                return Ok(last);
            }
        }
        Err(PeerError::SessionIncomplete("identityKey"))
    }

    async fn set_last_interacted(&self, identity_key: String) {
        *self.last_interacted_with_peer.lock().await = Some(identity_key);
    }

    pub async fn last_interacted_with_peer(&self) -> Option<String> {
        self.last_interacted_with_peer.lock().await.clone()
    }

    /// Establishes (or joins an in-flight establishment of) an authenticated
    /// session with `identity_key`. Returns the counterparty's identity key
    /// once the handshake completes.
    pub async fn initiate_handshake(
        &self,
        identity_key: Option<String>,
        max_wait_time: Option<Duration>,
    ) -> Result<String, PeerError> {
        let target = self.resolve_target(identity_key).await?;
        let max_wait = max_wait_time.unwrap_or(self.config.default_max_wait_time);

        if let Some((_, session)) = self.sessions.get_by_identity_key(&target).await {
            if session.is_authenticated {
                return Ok(target);
            }
        }

        // The `Notified` future is created while still holding the pending-
        // handshake lock below, so it cannot miss a `notify_waiters()` call
        // that the first caller makes after also taking that same lock to
        // remove its entry: the two critical sections are mutually exclusive,
        // so "create Notified" and "remove + notify" are strictly ordered.
        let mut pending = self.pending_handshakes.lock().await;
        if let Some(existing) = pending.get(&target) {
            let notified = existing.notified();
            drop(pending);
            let _ = timeout(max_wait, notified).await;
            return match self.sessions.get_by_identity_key(&target).await {
                Some((_, session)) if session.is_authenticated => Ok(target),
                _ => Err(PeerError::HandshakeTimeout),
            };
        }
        pending.insert(target.clone(), Arc::new(Notify::new()));
        drop(pending);

        let result = self.run_handshake(&target, max_wait).await;

        let mut pending = self.pending_handshakes.lock().await;
        if let Some(notify) = pending.remove(&target) {
            notify.notify_waiters();
        }
        drop(pending);

        result
    }

    async fn run_handshake(&self, target: &str, max_wait: Duration) -> Result<String, PeerError> {
        let session_nonce = nonce::create_nonce(self.wallet.as_ref()).await?;
        self.sessions.insert(PeerSession::pending(session_nonce.clone())).await;

        let (tx, rx) = oneshot::channel();
        self.pending_initial_response
            .lock()
            .await
            .insert(session_nonce.clone(), tx);

        let our_identity_key = self.wallet.get_public_key().await?;
        let request = AuthMessage::initial_request(our_identity_key, session_nonce.clone());
        if let Err(error) = self.transport.send(request).await {
            self.pending_initial_response.lock().await.remove(&session_nonce);
            return Err(PeerError::from(error));
        }

        match timeout(max_wait, rx).await {
            Ok(Ok(Ok(peer_identity_key))) => Ok(peer_identity_key),
            Ok(Ok(Err(error))) => Err(error),
            Ok(Err(_canceled)) => Err(PeerError::HandshakeFailed),
            Err(_elapsed) => {
                self.pending_initial_response.lock().await.remove(&session_nonce);
                Err(PeerError::HandshakeTimeout)
            }
        }
    }

    async fn process_initial_request(&self, message: AuthMessage) -> Result<(), PeerError> {
        let peer_initial_nonce = message
            .initial_nonce
            .clone()
            .ok_or_else(|| missing("initialNonce", message.message_type))?;

        let session_nonce = nonce::create_nonce(self.wallet.as_ref()).await?;
        self.sessions
            .insert(PeerSession::authenticated_from_request(
                session_nonce.clone(),
                peer_initial_nonce.clone(),
                message.identity_key.clone(),
            ))
            .await;

        {
            let mut last = self.last_interacted_with_peer.lock().await;
            if last.is_none() {
                *last = Some(message.identity_key.clone());
            }
        }

        let peer_initial_nonce_bytes = decode_base64("initialNonce", &peer_initial_nonce)?;
        let session_nonce_bytes = decode_base64("initialNonce", &session_nonce)?;
        let data = initial_response_signing_bytes(&peer_initial_nonce_bytes, &session_nonce_bytes);
        let key_id = format!("{peer_initial_nonce} {session_nonce}");

        let signature = self
            .wallet
            .create_signature(SignatureArgs {
                data: &data,
                protocol_id: SIGNATURE_PROTOCOL_ID,
                key_id: &key_id,
                counterparty: &message.identity_key,
            })
            .await?;

        let our_identity_key = self.wallet.get_public_key().await?;
        let mut response = AuthMessage::initial_response(our_identity_key);
        response.initial_nonce = Some(session_nonce.clone());
        response.your_nonce = Some(peer_initial_nonce);
        response.signature = Some(signature);

        if let Some(requested) = &message.requested_certificates {
            if !requested.certifiers.is_empty() || !requested.types.is_empty() {
                let certs = certificates::get_verifiable_certificates(
                    self.wallet.as_ref(),
                    requested,
                    &message.identity_key,
                )
                .await?;
                if !certs.is_empty() {
                    response.certificates = Some(certs);
                }
            }
        }

        self.transport.send(response).await?;
        Ok(())
    }

    async fn process_initial_response(&self, message: AuthMessage) -> Result<(), PeerError> {
        let your_nonce = message
            .your_nonce
            .clone()
            .ok_or_else(|| missing("yourNonce", message.message_type))?;
        if !nonce::verify_nonce(self.wallet.as_ref(), &your_nonce).await? {
            return Err(PeerError::NonceRejected);
        }

        let (handle, session) = self
            .sessions
            .get_by_session_nonce(&your_nonce)
            .await
            .ok_or(PeerError::SessionMissing)?;

        let peer_initial_nonce = message
            .initial_nonce
            .clone()
            .ok_or_else(|| missing("initialNonce", message.message_type))?;
        let signature = message
            .signature
            .clone()
            .ok_or_else(|| missing("signature", message.message_type))?;

        let session_nonce_bytes = decode_base64("yourNonce", &your_nonce)?;
        let peer_initial_nonce_bytes = decode_base64("initialNonce", &peer_initial_nonce)?;
        let data = initial_response_signing_bytes(&session_nonce_bytes, &peer_initial_nonce_bytes);
        let key_id = format!("{your_nonce} {peer_initial_nonce}");

        let valid = self
            .wallet
            .verify_signature(
                SignatureArgs {
                    data: &data,
                    protocol_id: SIGNATURE_PROTOCOL_ID,
                    key_id: &key_id,
                    counterparty: &message.identity_key,
                },
                &signature,
            )
            .await?;
        if !valid {
            self.fail_pending_initial_response(&your_nonce, PeerError::SignatureInvalid).await;
            return Err(PeerError::SignatureInvalid);
        }

        self.sessions
            .complete_handshake(handle, peer_initial_nonce.clone(), message.identity_key.clone())
            .await?;

        // The handshake itself is done and the session is authenticated from
        // here on: resolve the waiting caller and fire the initial-response
        // callback now, before touching any piggybacked certificate traffic.
        // A failure below must not make an already-successful handshake look
        // like a timeout to whoever is waiting on it.
        self.set_last_interacted(message.identity_key.clone()).await;
        self.listeners.notify_initial_response(message.identity_key.clone()).await;
        if let Some(tx) = self.pending_initial_response.lock().await.remove(&your_nonce) {
            let _ = tx.send(Ok(message.identity_key.clone()));
        }

        if let Some(certs) = message.certificates.clone() {
            let outstanding = self.sessions.take_outstanding_certificate_request(handle).await;
            let validation = match &outstanding {
                Some(requested) => certificates::validate_certificates(&certs, requested),
                None => Ok(()),
            };
            match validation {
                Ok(()) => {
                    self.listeners
                        .notify_certificates_received(certs, message.identity_key.clone())
                        .await;
                }
                Err(error) => {
                    tracing::warn!(%error, "certificates embedded in initialResponse failed validation");
                }
            }
        }

        if let Some(requested) = message.requested_certificates.clone() {
            let our_session_nonce = session.session_nonce.clone();
            match our_session_nonce {
                Some(our_session_nonce) => {
                    if let Err(error) = self
                        .handle_certificate_request(
                            requested,
                            message.identity_key.clone(),
                            our_session_nonce,
                            peer_initial_nonce,
                        )
                        .await
                    {
                        tracing::warn!(%error, "failed to handle certificate request piggybacked on initialResponse");
                    }
                }
                None => {
                    tracing::warn!("session missing sessionNonce while handling piggybacked certificate request");
                }
            }
        }

        Ok(())
    }

    async fn process_certificate_request(&self, message: AuthMessage) -> Result<(), PeerError> {
        let your_nonce = message
            .your_nonce
            .clone()
            .ok_or_else(|| missing("yourNonce", message.message_type))?;
        if !nonce::verify_nonce(self.wallet.as_ref(), &your_nonce).await? {
            return Err(PeerError::NonceRejected);
        }

        let (_handle, session) = self
            .sessions
            .get_by_session_nonce(&your_nonce)
            .await
            .ok_or(PeerError::SessionMissing)?;
        if !session.is_authenticated {
            return Err(PeerError::SessionIncomplete("isAuthenticated"));
        }
        let peer_nonce = session
            .peer_nonce
            .clone()
            .ok_or(PeerError::SessionIncomplete("peerNonce"))?;

        let nonce_field = message
            .nonce
            .clone()
            .ok_or_else(|| missing("nonce", message.message_type))?;
        let requested = message
            .requested_certificates
            .clone()
            .ok_or_else(|| missing("requestedCertificates", message.message_type))?;
        let signature = message
            .signature
            .clone()
            .ok_or_else(|| missing("signature", message.message_type))?;

        let data = requested_certificates_signing_bytes(&requested)
            .map_err(|e| PeerError::CertificateValidation(e.to_string()))?;
        let key_id = format!("{nonce_field} {your_nonce}");

        let valid = self
            .wallet
            .verify_signature(
                SignatureArgs {
                    data: &data,
                    protocol_id: SIGNATURE_PROTOCOL_ID,
                    key_id: &key_id,
                    counterparty: &message.identity_key,
                },
                &signature,
            )
            .await?;
        if !valid {
            return Err(PeerError::SignatureInvalid);
        }

        self.handle_certificate_request(requested, message.identity_key.clone(), your_nonce, peer_nonce)
            .await
    }

    async fn process_certificate_response(&self, message: AuthMessage) -> Result<(), PeerError> {
        let your_nonce = message
            .your_nonce
            .clone()
            .ok_or_else(|| missing("yourNonce", message.message_type))?;
        if !nonce::verify_nonce(self.wallet.as_ref(), &your_nonce).await? {
            return Err(PeerError::NonceRejected);
        }

        let (handle, session) = self
            .sessions
            .get_by_session_nonce(&your_nonce)
            .await
            .ok_or(PeerError::SessionMissing)?;
        if !session.is_authenticated {
            return Err(PeerError::SessionIncomplete("isAuthenticated"));
        }

        let nonce_field = message
            .nonce
            .clone()
            .ok_or_else(|| missing("nonce", message.message_type))?;
        let certs = message
            .certificates
            .clone()
            .ok_or_else(|| missing("certificates", message.message_type))?;
        let signature = message
            .signature
            .clone()
            .ok_or_else(|| missing("signature", message.message_type))?;

        let data = certificates_signing_bytes(&certs)
            .map_err(|e| PeerError::CertificateValidation(e.to_string()))?;
        let key_id = format!("{nonce_field} {your_nonce}");

        let valid = self
            .wallet
            .verify_signature(
                SignatureArgs {
                    data: &data,
                    protocol_id: SIGNATURE_PROTOCOL_ID,
                    key_id: &key_id,
                    counterparty: &message.identity_key,
                },
                &signature,
            )
            .await?;
        if !valid {
            return Err(PeerError::SignatureInvalid);
        }

        // Prefer the per-session outstanding request over the set the
        // response itself echoes back: a responder could otherwise shrink
        // its own obligations by simply echoing a narrower request than the
        // one actually sent.
        let validation_target = match self.sessions.take_outstanding_certificate_request(handle).await {
            Some(requested) => requested,
            None => message.requested_certificates.clone().unwrap_or_default(),
        };
        certificates::validate_certificates(&certs, &validation_target)?;

        self.listeners
            .notify_certificates_received(certs, message.identity_key.clone())
            .await;
        Ok(())
    }

    async fn process_general_message(&self, message: AuthMessage) -> Result<(), PeerError> {
        let your_nonce = message
            .your_nonce
            .clone()
            .ok_or_else(|| missing("yourNonce", message.message_type))?;
        if !nonce::verify_nonce(self.wallet.as_ref(), &your_nonce).await? {
            return Err(PeerError::NonceRejected);
        }

        let (_handle, session) = self
            .sessions
            .get_by_session_nonce(&your_nonce)
            .await
            .ok_or(PeerError::SessionMissing)?;
        if !session.is_authenticated {
            return Err(PeerError::SessionIncomplete("isAuthenticated"));
        }

        let nonce_field = message
            .nonce
            .clone()
            .ok_or_else(|| missing("nonce", message.message_type))?;
        let payload = message
            .payload
            .clone()
            .ok_or_else(|| missing("payload", message.message_type))?;
        let signature = message
            .signature
            .clone()
            .ok_or_else(|| missing("signature", message.message_type))?;

        let key_id = format!("{nonce_field} {your_nonce}");
        let valid = self
            .wallet
            .verify_signature(
                SignatureArgs {
                    data: &payload,
                    protocol_id: SIGNATURE_PROTOCOL_ID,
                    key_id: &key_id,
                    counterparty: &message.identity_key,
                },
                &signature,
            )
            .await?;
        if !valid {
            return Err(PeerError::SignatureInvalid);
        }

        self.set_last_interacted(message.identity_key.clone()).await;
        self.listeners.notify_general_message(payload, message.identity_key.clone()).await;
        Ok(())
    }

    /// Routes a just-received `requestedCertificates` set: if a
    /// `certificatesRequested` listener is registered it decides what (if
    /// anything) to disclose via [`Peer::send_certificate_response`];
    /// otherwise the peer answers automatically with whatever the wallet
    /// selects.
    async fn handle_certificate_request(
        &self,
        requested: RequestedCertificateSet,
        counterparty_identity_key: String,
        our_session_nonce: String,
        peer_nonce: String,
    ) -> Result<(), PeerError> {
        if self.listeners.certificates_requested_listener_count().await > 0 {
            self.listeners
                .notify_certificates_requested(requested, counterparty_identity_key)
                .await;
            return Ok(());
        }
        let certs = certificates::get_verifiable_certificates(
            self.wallet.as_ref(),
            &requested,
            &counterparty_identity_key,
        )
        .await?;
        self.send_certificate_response_message(&counterparty_identity_key, our_session_nonce, peer_nonce, certs)
            .await
    }

    async fn send_certificate_response_message(
        &self,
        counterparty_identity_key: &str,
        our_session_nonce: String,
        peer_nonce: String,
        certificates: Vec<VerifiableCertificate>,
    ) -> Result<(), PeerError> {
        let request_nonce = Self::mint_request_nonce();
        let data = certificates_signing_bytes(&certificates)
            .map_err(|e| PeerError::CertificateValidation(e.to_string()))?;
        let key_id = format!("{request_nonce} {peer_nonce}");

        let signature = self
            .wallet
            .create_signature(SignatureArgs {
                data: &data,
                protocol_id: SIGNATURE_PROTOCOL_ID,
                key_id: &key_id,
                counterparty: counterparty_identity_key,
            })
            .await?;

        let our_identity_key = self.wallet.get_public_key().await?;
        let mut response = AuthMessage::certificate_response(our_identity_key);
        response.nonce = Some(request_nonce);
        response.your_nonce = Some(peer_nonce);
        response.initial_nonce = Some(our_session_nonce);
        response.certificates = Some(certificates);
        response.signature = Some(signature);

        self.transport.send(response).await.map_err(PeerError::from)
    }

    async fn fail_pending_initial_response(&self, session_nonce: &str, error: PeerError) {
        if let Some(tx) = self.pending_initial_response.lock().await.remove(session_nonce) {
            let _ = tx.send(Err(error));
        }
    }

    async fn get_authenticated_session(
        &self,
        identity_key: Option<String>,
        max_wait_time: Option<Duration>,
    ) -> Result<String, PeerError> {
        let target = self.resolve_target(identity_key).await?;
        if let Some((_, session)) = self.sessions.get_by_identity_key(&target).await {
            if session.is_authenticated {
                return Ok(target);
            }
        }
        self.initiate_handshake(Some(target), max_wait_time).await
    }

    /// Sends a signed application payload, establishing a session first if
    /// none exists yet.
    pub async fn to_peer(
        &self,
        payload: Vec<u8>,
        identity_key: Option<String>,
        max_wait_time: Option<Duration>,
    ) -> Result<(), PeerError> {
        let target = self.get_authenticated_session(identity_key, max_wait_time).await?;
        let (_, session) = self
            .sessions
            .get_by_identity_key(&target)
            .await
            .ok_or(PeerError::SessionMissing)?;
        let peer_nonce = session
            .peer_nonce
            .clone()
            .ok_or(PeerError::SessionIncomplete("peerNonce"))?;

        let request_nonce = Self::mint_request_nonce();
        let key_id = format!("{request_nonce} {peer_nonce}");
        let signature = self
            .wallet
            .create_signature(SignatureArgs {
                data: &payload,
                protocol_id: SIGNATURE_PROTOCOL_ID,
                key_id: &key_id,
                counterparty: &target,
            })
            .await?;

        let our_identity_key = self.wallet.get_public_key().await?;
        let mut message = AuthMessage::general(our_identity_key);
        message.nonce = Some(request_nonce);
        message.your_nonce = Some(peer_nonce);
        message.payload = Some(payload);
        message.signature = Some(signature);

        self.transport.send(message).await?;
        self.set_last_interacted(target).await;
        Ok(())
    }

    /// Requests a certificate set from `identity_key`, establishing a
    /// session first if needed. Remembers the request so the eventual
    /// response is validated against it rather than against whatever it
    /// echoes back.
    pub async fn request_certificates(
        &self,
        identity_key: Option<String>,
        request: RequestedCertificateSet,
        max_wait_time: Option<Duration>,
    ) -> Result<(), PeerError> {
        let target = self.get_authenticated_session(identity_key, max_wait_time).await?;
        let (handle, session) = self
            .sessions
            .get_by_identity_key(&target)
            .await
            .ok_or(PeerError::SessionMissing)?;
        let peer_nonce = session
            .peer_nonce
            .clone()
            .ok_or(PeerError::SessionIncomplete("peerNonce"))?;

        self.sessions.set_outstanding_certificate_request(handle, request.clone()).await?;

        let request_nonce = Self::mint_request_nonce();
        let data = requested_certificates_signing_bytes(&request)
            .map_err(|e| PeerError::CertificateValidation(e.to_string()))?;
        let key_id = format!("{request_nonce} {peer_nonce}");
        let signature = self
            .wallet
            .create_signature(SignatureArgs {
                data: &data,
                protocol_id: SIGNATURE_PROTOCOL_ID,
                key_id: &key_id,
                counterparty: &target,
            })
            .await?;

        let our_identity_key = self.wallet.get_public_key().await?;
        let mut message = AuthMessage::certificate_request(our_identity_key);
        message.nonce = Some(request_nonce);
        message.your_nonce = Some(peer_nonce);
        message.requested_certificates = Some(request);
        message.signature = Some(signature);

        self.transport.send(message).await.map_err(PeerError::from)
    }

    /// Sends a certificate response to `identity_key` outside of the
    /// automatic reply path, e.g. from a `certificatesRequested` listener
    /// that chooses what to disclose.
    pub async fn send_certificate_response(
        &self,
        identity_key: &str,
        certificates: Vec<VerifiableCertificate>,
    ) -> Result<(), PeerError> {
        let (_, session) = self
            .sessions
            .get_by_identity_key(identity_key)
            .await
            .ok_or(PeerError::SessionMissing)?;
        let our_session_nonce = session
            .session_nonce
            .clone()
            .ok_or(PeerError::SessionIncomplete("sessionNonce"))?;
        let peer_nonce = session
            .peer_nonce
            .clone()
            .ok_or(PeerError::SessionIncomplete("peerNonce"))?;
        self.send_certificate_response_message(identity_key, our_session_nonce, peer_nonce, certificates)
            .await
    }

    pub async fn listen_for_general_message(&self, handler: GeneralMessageHandler) -> ListenerId {
        self.listeners.listen_for_general_message(handler).await
    }

    pub async fn listen_for_certificates_received(&self, handler: CertificatesReceivedHandler) -> ListenerId {
        self.listeners.listen_for_certificates_received(handler).await
    }

    pub async fn listen_for_certificates_requested(
        &self,
        handler: CertificatesRequestedHandler,
    ) -> ListenerId {
        self.listeners.listen_for_certificates_requested(handler).await
    }

    pub async fn listen_for_initial_response(&self, handler: InitialResponseHandler) -> ListenerId {
        self.listeners.listen_for_initial_response(handler).await
    }

    pub async fn stop_listening(&self, id: ListenerId) {
        self.listeners.stop_listening(id).await;
    }
}

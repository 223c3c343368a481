use std::collections::HashMap;

use auth_wire::RequestedCertificateSet;
use tokio::sync::Mutex;

use crate::error::PeerError;

/// An opaque, stable handle into a [`SessionManager`].
///
/// Handles stay valid for the lifetime of the session they name; they are
/// never reused, so a stale handle after `remove` simply misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

/// A peer's authentication session state, as seen from this side.
#[derive(Debug, Clone, Default)]
pub struct PeerSession {
    /// True once a mutual nonce exchange has been verified. On the
    /// responder side this is set the moment a signed `initialResponse` has
    /// been produced and handed to the transport, which happens before the
    /// initiator's own identity key has signed anything this side verifies;
    /// it is a true statement about *this side's* commitment to the
    /// exchange, not yet mutual proof.
    pub is_authenticated: bool,
    pub session_nonce: Option<String>,
    pub peer_nonce: Option<String>,
    pub peer_identity_key: Option<String>,
    pub(crate) outstanding_certificate_request: Option<RequestedCertificateSet>,
}

impl PeerSession {
    pub fn pending(session_nonce: String) -> Self {
        Self {
            session_nonce: Some(session_nonce),
            ..Default::default()
        }
    }

    pub fn authenticated_from_request(
        session_nonce: String,
        peer_nonce: String,
        peer_identity_key: String,
    ) -> Self {
        Self {
            is_authenticated: true,
            session_nonce: Some(session_nonce),
            peer_nonce: Some(peer_nonce),
            peer_identity_key: Some(peer_identity_key),
            outstanding_certificate_request: None,
        }
    }
}

#[derive(Default)]
struct Inner {
    next_handle: u64,
    sessions: HashMap<u64, PeerSession>,
    by_session_nonce: HashMap<String, u64>,
    by_peer_nonce: HashMap<String, u64>,
    by_identity_key: HashMap<String, u64>,
}

impl Inner {
    fn index(&mut self, handle: u64, session: &PeerSession) {
        if let Some(n) = &session.session_nonce {
            self.by_session_nonce.insert(n.clone(), handle);
        }
        if let Some(n) = &session.peer_nonce {
            self.by_peer_nonce.insert(n.clone(), handle);
        }
        if let Some(k) = &session.peer_identity_key {
            self.by_identity_key.insert(k.clone(), handle);
        }
    }
}

/// An owning store of [`PeerSession`]s with three auxiliary lookup indices:
/// by local `sessionNonce`, by `peerNonce`, and by `peerIdentityKey`. A
/// lookup by identity key always returns the most recently inserted or
/// completed session for that peer, matching the "one session per
/// identity" expectation of the handshake protocol.
pub struct SessionManager {
    inner: Mutex<Inner>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn insert(&self, session: PeerSession) -> SessionHandle {
        let mut inner = self.inner.lock().await;
        let handle = inner.next_handle;
        inner.next_handle += 1;
        inner.index(handle, &session);
        inner.sessions.insert(handle, session);
        SessionHandle(handle)
    }

    pub async fn get(&self, handle: SessionHandle) -> Option<PeerSession> {
        self.inner.lock().await.sessions.get(&handle.0).cloned()
    }

    pub async fn get_by_session_nonce(&self, nonce: &str) -> Option<(SessionHandle, PeerSession)> {
        let inner = self.inner.lock().await;
        let handle = *inner.by_session_nonce.get(nonce)?;
        let session = inner.sessions.get(&handle)?.clone();
        Some((SessionHandle(handle), session))
    }

    pub async fn get_by_peer_nonce(&self, nonce: &str) -> Option<(SessionHandle, PeerSession)> {
        let inner = self.inner.lock().await;
        let handle = *inner.by_peer_nonce.get(nonce)?;
        let session = inner.sessions.get(&handle)?.clone();
        Some((SessionHandle(handle), session))
    }

    pub async fn get_by_identity_key(&self, key: &str) -> Option<(SessionHandle, PeerSession)> {
        let inner = self.inner.lock().await;
        let handle = *inner.by_identity_key.get(key)?;
        let session = inner.sessions.get(&handle)?.clone();
        Some((SessionHandle(handle), session))
    }

    /// Completes a handshake initiated by us: binds the peer's nonce and
    /// identity key to the pending session and marks it authenticated.
    pub async fn complete_handshake(
        &self,
        handle: SessionHandle,
        peer_nonce: String,
        peer_identity_key: String,
    ) -> Result<(), PeerError> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(&handle.0)
            .ok_or(PeerError::SessionMissing)?;
        session.peer_nonce = Some(peer_nonce);
        session.peer_identity_key = Some(peer_identity_key);
        session.is_authenticated = true;
        let snapshot = session.clone();
        inner.index(handle.0, &snapshot);
        Ok(())
    }

    pub async fn set_outstanding_certificate_request(
        &self,
        handle: SessionHandle,
        request: RequestedCertificateSet,
    ) -> Result<(), PeerError> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(&handle.0)
            .ok_or(PeerError::SessionMissing)?;
        session.outstanding_certificate_request = Some(request);
        Ok(())
    }

    pub async fn take_outstanding_certificate_request(
        &self,
        handle: SessionHandle,
    ) -> Option<RequestedCertificateSet> {
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .get_mut(&handle.0)
            .and_then(|s| s.outstanding_certificate_request.take())
    }

    pub async fn remove(&self, handle: SessionHandle) -> Option<PeerSession> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.remove(&handle.0)?;
        if let Some(n) = &session.session_nonce {
            inner.by_session_nonce.remove(n);
        }
        if let Some(n) = &session.peer_nonce {
            inner.by_peer_nonce.remove(n);
        }
        if let Some(k) = &session.peer_identity_key {
            if inner.by_identity_key.get(k) == Some(&handle.0) {
                inner.by_identity_key.remove(k);
            }
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_lookup_by_session_nonce() {
        let mgr = SessionManager::new();
        let handle = mgr.insert(PeerSession::pending("n1".to_string())).await;
        let (found_handle, session) = mgr.get_by_session_nonce("n1").await.unwrap();
        assert_eq!(found_handle, handle);
        assert!(!session.is_authenticated);
    }

    #[tokio::test]
    async fn complete_handshake_indexes_peer_nonce_and_identity() {
        let mgr = SessionManager::new();
        let handle = mgr.insert(PeerSession::pending("mine".to_string())).await;
        mgr.complete_handshake(handle, "theirs".to_string(), "their-key".to_string())
            .await
            .unwrap();

        let (h, s) = mgr.get_by_peer_nonce("theirs").await.unwrap();
        assert_eq!(h, handle);
        assert!(s.is_authenticated);

        let (h2, _) = mgr.get_by_identity_key("their-key").await.unwrap();
        assert_eq!(h2, handle);
    }

    #[tokio::test]
    async fn identity_key_lookup_returns_most_recent_session() {
        let mgr = SessionManager::new();
        let first = mgr
            .insert(PeerSession::authenticated_from_request(
                "a".to_string(),
                "b".to_string(),
                "peer".to_string(),
            ))
            .await;
        let second = mgr
            .insert(PeerSession::authenticated_from_request(
                "c".to_string(),
                "d".to_string(),
                "peer".to_string(),
            ))
            .await;
        let (found, _) = mgr.get_by_identity_key("peer").await.unwrap();
        assert_ne!(found, first);
        assert_eq!(found, second);
    }

    #[tokio::test]
    async fn remove_clears_all_indices() {
        let mgr = SessionManager::new();
        let handle = mgr
            .insert(PeerSession::authenticated_from_request(
                "a".to_string(),
                "b".to_string(),
                "peer".to_string(),
            ))
            .await;
        mgr.remove(handle).await;
        assert!(mgr.get_by_session_nonce("a").await.is_none());
        assert!(mgr.get_by_peer_nonce("b").await.is_none());
        assert!(mgr.get_by_identity_key("peer").await.is_none());
    }

    #[tokio::test]
    async fn outstanding_certificate_request_round_trips_once() {
        let mgr = SessionManager::new();
        let handle = mgr.insert(PeerSession::pending("n".to_string())).await;
        let req = RequestedCertificateSet {
            certifiers: vec!["c".to_string()],
            types: Default::default(),
        };
        mgr.set_outstanding_certificate_request(handle, req.clone())
            .await
            .unwrap();
        let taken = mgr.take_outstanding_certificate_request(handle).await;
        assert_eq!(taken, Some(req));
        assert_eq!(mgr.take_outstanding_certificate_request(handle).await, None);
    }
}

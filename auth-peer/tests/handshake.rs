use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use auth_peer::testing::{InMemoryWallet, LoopbackTransport};
use auth_peer::{Peer, PeerConfig, PeerError};
use auth_wire::{RequestedCertificateSet, VerifiableCertificate};
use tokio::sync::oneshot;
use tokio::time::timeout;

fn peer_pair(identity_a: &str, identity_b: &str) -> (Arc<Peer>, Arc<Peer>) {
    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    let peer_a = Peer::new(
        Arc::new(InMemoryWallet::new(identity_a)),
        transport_a,
        PeerConfig::default(),
    );
    let peer_b = Peer::new(
        Arc::new(InMemoryWallet::new(identity_b)),
        transport_b,
        PeerConfig::default(),
    );
    (peer_a, peer_b)
}

#[tokio::test]
async fn basic_handshake_and_general_message() {
    let (peer_a, peer_b) = peer_pair("a", "b");

    let (tx, rx) = oneshot::channel();
    let tx = std::sync::Mutex::new(Some(tx));
    peer_b
        .listen_for_general_message(Arc::new(move |payload, sender| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((payload, sender));
            }
        }))
        .await;

    peer_a
        .to_peer(vec![0xDE, 0xAD, 0xBE, 0xEF], Some("b".to_string()), None)
        .await
        .expect("to_peer should succeed");

    let (payload, sender) = timeout(Duration::from_secs(1), rx)
        .await
        .expect("general message should arrive")
        .expect("channel should not be dropped");

    assert_eq!(payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(sender, "a");
}

#[tokio::test]
async fn handshake_times_out_when_peer_is_silent() {
    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    transport_b.silence_inbound();
    let peer_a = Peer::new(
        Arc::new(InMemoryWallet::new("a")),
        transport_a,
        PeerConfig::default(),
    );
    let _peer_b = Peer::new(
        Arc::new(InMemoryWallet::new("b")),
        transport_b,
        PeerConfig::default(),
    );

    let result = peer_a
        .initiate_handshake(Some("b".to_string()), Some(Duration::from_millis(50)))
        .await;

    assert!(matches!(result, Err(PeerError::HandshakeTimeout)));
}

#[tokio::test]
async fn tampered_payload_is_rejected() {
    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    transport_b.set_inbound_tamper(|message| {
        if let Some(payload) = message.payload.as_mut() {
            if let Some(byte) = payload.first_mut() {
                *byte ^= 0xFF;
            }
        }
    });
    let peer_a = Peer::new(
        Arc::new(InMemoryWallet::new("a")),
        transport_a,
        PeerConfig::default(),
    );
    let peer_b = Peer::new(
        Arc::new(InMemoryWallet::new("b")),
        transport_b,
        PeerConfig::default(),
    );

    let (tx, rx) = oneshot::channel();
    let tx = std::sync::Mutex::new(Some(tx));
    peer_b
        .listen_for_general_message(Arc::new(move |payload, sender| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((payload, sender));
            }
        }))
        .await;

    peer_a
        .to_peer(vec![0x01, 0x02, 0x03], Some("b".to_string()), None)
        .await
        .expect("to_peer should still send, tampering happens after");

    let outcome = timeout(Duration::from_millis(200), rx).await;
    assert!(outcome.is_err(), "listener must not fire for a tampered payload");
}

#[tokio::test]
async fn replayed_your_nonce_is_rejected() {
    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    let _peer_a = Peer::new(Arc::new(InMemoryWallet::new("a")), transport_a.clone(), PeerConfig::default());
    let peer_b = Peer::new(Arc::new(InMemoryWallet::new("b")), transport_b, PeerConfig::default());

    let (tx, rx) = oneshot::channel();
    let tx = std::sync::Mutex::new(Some(tx));
    peer_b
        .listen_for_general_message(Arc::new(move |payload, sender| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((payload, sender));
            }
        }))
        .await;

    // Inject a general message directly onto the channel peer_b listens on,
    // bypassing peer_a entirely, with a `yourNonce` peer_b never minted.
    let forged = auth_wire::AuthMessage {
        version: auth_wire::PROTOCOL_VERSION.to_string(),
        message_type: auth_wire::MessageType::General,
        identity_key: "mallory".to_string(),
        initial_nonce: None,
        your_nonce: Some(auth_wire::encode_base64(b"never minted by b")),
        nonce: Some(auth_wire::encode_base64(b"whatever")),
        requested_certificates: None,
        certificates: None,
        payload: Some(vec![0x02]),
        signature: Some(vec![0, 0, 0, 0]),
    };
    auth_peer::Transport::send(transport_a.as_ref(), forged)
        .await
        .expect("transport send should not fail even though processing rejects it");

    let outcome = timeout(Duration::from_millis(200), rx).await;
    assert!(outcome.is_err(), "listener must not fire for a replayed/forged yourNonce");
}

#[tokio::test]
async fn certificate_auto_response_on_handshake() {
    let cert = VerifiableCertificate {
        certifier: "C".to_string(),
        cert_type: "T".to_string(),
        fields: BTreeMap::from([("x".to_string(), "1".to_string())]),
        signature: vec![0xAA],
    };

    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    let peer_a = Peer::new(
        Arc::new(InMemoryWallet::new("a")),
        transport_a,
        PeerConfig::default(),
    );
    let peer_b = Peer::new(
        Arc::new(InMemoryWallet::new("b").with_certificates(vec![cert.clone()])),
        transport_b,
        PeerConfig::default(),
    );
    let _ = &peer_b;

    let (tx, rx) = oneshot::channel();
    let tx = std::sync::Mutex::new(Some(tx));
    peer_a
        .listen_for_certificates_received(Arc::new(move |certs, sender| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((certs, sender));
            }
        }))
        .await;

    let mut request = RequestedCertificateSet::default();
    request.certifiers.push("C".to_string());
    request.types.insert("T".to_string(), vec!["x".to_string()]);

    peer_a
        .initiate_handshake(Some("b".to_string()), None)
        .await
        .expect("handshake should succeed");

    peer_a
        .request_certificates(Some("b".to_string()), request, None)
        .await
        .expect("certificate request should send");

    let (certs, sender) = timeout(Duration::from_secs(1), rx)
        .await
        .expect("certificates should arrive")
        .expect("channel should not be dropped");

    assert_eq!(certs, vec![cert]);
    assert_eq!(sender, "b");
}

#[tokio::test]
async fn concurrent_handshakes_to_the_same_peer_do_not_double_send() {
    let (transport_a, transport_b) = LoopbackTransport::new_pair();
    let peer_a = Peer::new(
        Arc::new(InMemoryWallet::new("a")),
        transport_a.clone(),
        PeerConfig::default(),
    );
    let _peer_b = Peer::new(
        Arc::new(InMemoryWallet::new("b")),
        transport_b,
        PeerConfig::default(),
    );

    let (first, second) = tokio::join!(
        peer_a.initiate_handshake(Some("b".to_string()), None),
        peer_a.initiate_handshake(Some("b".to_string()), None),
    );

    assert_eq!(first.expect("first call should succeed"), "b");
    assert_eq!(second.expect("joined call should succeed"), "b");
    assert_eq!(
        transport_a.sent_initial_request_count(),
        1,
        "a second concurrent handshake to the same peer must join the first instead of re-sending"
    );
}

#[tokio::test]
async fn last_peer_affinity_targets_most_recent_counterparty() {
    let (peer_a, peer_b) = peer_pair("a", "b");

    let (tx, rx) = oneshot::channel();
    let tx = std::sync::Mutex::new(Some(tx));
    peer_b
        .listen_for_general_message(Arc::new(move |payload, sender| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send((payload, sender));
            }
        }))
        .await;

    peer_a
        .to_peer(vec![0x01], Some("b".to_string()), None)
        .await
        .expect("first message establishes the session and records affinity");
    let _ = timeout(Duration::from_secs(1), rx).await.expect("first message should arrive");

    assert_eq!(peer_a.last_interacted_with_peer().await.as_deref(), Some("b"));

    let (tx2, rx2) = oneshot::channel();
    let tx2 = std::sync::Mutex::new(Some(tx2));
    peer_b
        .listen_for_general_message(Arc::new(move |payload, sender| {
            if let Some(tx2) = tx2.lock().unwrap().take() {
                let _ = tx2.send((payload, sender));
            }
        }))
        .await;

    // No identity_key given: must fall back to the last interacted peer.
    peer_a
        .to_peer(vec![0x02], None, None)
        .await
        .expect("affinity should resolve the target automatically");

    let (payload, sender) = timeout(Duration::from_secs(1), rx2)
        .await
        .expect("second message should arrive")
        .expect("channel should not be dropped");
    assert_eq!(payload, vec![0x02]);
    assert_eq!(sender, "a");
}

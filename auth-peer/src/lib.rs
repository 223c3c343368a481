//! Peer-to-peer mutual authentication state machine.
//!
//! Two [`Peer`]s exchange [`auth_wire::AuthMessage`]s over a [`Transport`] to
//! prove possession of long-lived identity keys held by a [`Wallet`], and
//! establish a symmetric authenticated session identified by mutually
//! exchanged nonces. Once authenticated, peers exchange signed application
//! payloads (`to_peer`) and verifiable certificate sets
//! (`request_certificates` / `send_certificate_response`).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_peer::{Peer, PeerConfig};
//! use auth_peer::testing::{InMemoryWallet, LoopbackTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (transport_a, transport_b) = LoopbackTransport::new_pair();
//! let peer_a = Peer::new(Arc::new(InMemoryWallet::new("a")), transport_a, PeerConfig::default());
//! let peer_b = Peer::new(Arc::new(InMemoryWallet::new("b")), transport_b, PeerConfig::default());
//!
//! peer_b
//!     .listen_for_general_message(Arc::new(|payload, sender| {
//!         println!("received {} bytes from {sender}", payload.len());
//!     }))
//!     .await;
//!
//! peer_a.to_peer(b"hello".to_vec(), Some("b".to_string()), None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! A `Peer` is driven by `tokio`: inbound messages are dispatched one at a
//! time per message (the transport is trusted to deliver serially), and
//! every call into the wallet or transport is an `async fn` suspension
//! point. `initiate_handshake` bounds its wait on `initialResponse` with
//! `tokio::time::timeout`; concurrent callers targeting the same
//! not-yet-authenticated identity key join the first caller's wait instead
//! of racing a second `initialRequest`.

mod certificates;
mod config;
mod error;
mod listener;
mod nonce;
mod peer;
mod session;
mod transport;
mod wallet;

pub mod testing;

pub use config::PeerConfig;
pub use error::PeerError;
pub use listener::{
    CertificatesReceivedHandler, CertificatesRequestedHandler, GeneralMessageHandler,
    InitialResponseHandler, ListenerId, ListenerKind,
};
pub use peer::Peer;
pub use session::{PeerSession, SessionHandle, SessionManager};
pub use transport::Transport;
pub use wallet::{SignatureArgs, Wallet};

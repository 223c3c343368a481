use std::time::Duration;

/// Tunable policy for a [`crate::Peer`], following the same
/// plain-struct-of-defaults shape this engine's session-management code uses
/// for `SessionManagerConfig`.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// When true, an outbound call with no explicit identity key targets
    /// whichever peer we last exchanged a general message or handshake
    /// with.
    pub auto_persist_last_session: bool,
    /// How long `initiate_handshake` waits for an `initialResponse` before
    /// failing with [`crate::error::PeerError::HandshakeTimeout`], unless a
    /// call overrides it explicitly.
    pub default_max_wait_time: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            auto_persist_last_session: true,
            default_max_wait_time: Duration::from_millis(10_000),
        }
    }
}

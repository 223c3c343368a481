use async_trait::async_trait;
use auth_wire::{AuthMessage, TransportError};

/// The duplex message carrier this engine consumes but does not implement.
///
/// A `Transport` delivers inbound messages to whatever handler was last
/// registered via [`Transport::on_data`], serially and in order.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: AuthMessage) -> Result<(), TransportError>;

    /// Registers the handler invoked once per inbound message. Registering a
    /// new handler replaces any previous one.
    fn on_data(&self, handler: Box<dyn Fn(AuthMessage) + Send + Sync>);
}

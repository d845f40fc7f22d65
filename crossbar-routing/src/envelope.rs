//! Entity envelope.
//!
//! The envelope is the seam between classification and delivery: it wraps
//! the original message for the addressed entity without rewrapping or
//! mutating it. Delivery metadata added later (leases, versions, retry
//! hints) belongs here, not in the assigner.

use crossbar_core::RouteMessage;

/// Carries the original, unmodified message to the addressed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEnvelope {
    message: RouteMessage,
}

impl EntityEnvelope {
    /// Wraps a message for delivery. Identity over the payload: no
    /// validation, no transformation.
    #[must_use]
    pub const fn wrap(message: RouteMessage) -> Self {
        Self { message }
    }

    /// Returns the wrapped message.
    #[must_use]
    pub const fn message(&self) -> &RouteMessage {
        &self.message
    }

    /// Unwraps back into the original message.
    #[must_use]
    pub fn into_message(self) -> RouteMessage {
        self.message
    }
}

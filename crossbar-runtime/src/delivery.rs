//! Delivery substrate boundary.
//!
//! This module defines the trait the cluster's delivery fabric implements,
//! allowing different implementations for production (real cluster
//! membership and networking) and in-process use (`HandlerPool`, tests).
//!
//! # Contract
//!
//! The substrate receives a destination selector and a payload and is
//! responsible for choosing a live process hosting the addressed entity;
//! this crate never performs network delivery itself. The substrate must at
//! least attempt delivery and must surface delivery failure distinctly from
//! timeout. The reply path quotes the correlation token back through a
//! [`ReplySink`](crate::ReplySink).

use async_trait::async_trait;
use thiserror::Error;
use tracing::Span;

use crossbar_core::CorrelationId;
use crossbar_routing::{Assignment, EntityEnvelope};

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Delivery errors, surfaced to the forwarding caller as a failure kind
/// distinct from timeout. Not retried by the forwarder; retry policy
/// belongs to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// No live process hosts the destination.
    #[error("destination {destination} is unreachable")]
    Unreachable {
        /// The destination that could not be reached.
        destination: Assignment,
    },

    /// The envelope could not be serialized for the wire.
    #[error("failed to serialize envelope: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

/// An outgoing unit handed to the substrate.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The `(shard, entity)` selector derived by the extractor. The
    /// substrate maps this to a live process.
    pub destination: Assignment,
    /// The token the reply path must quote back.
    pub token: CorrelationId,
    /// The original message, untouched.
    pub envelope: EntityEnvelope,
    /// Trace context attached at issue time. The reply path re-enters this
    /// span so the context survives the whole request lifecycle.
    pub span: Span,
}

/// Trait for the cluster delivery fabric.
///
/// Implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait DeliverySubstrate: Send + Sync {
    /// Submits a delivery toward its destination.
    ///
    /// Returning `Ok` means delivery was at least attempted; a reply, if
    /// any, arrives later through the reply path. Returning `Err` means the
    /// destination was not reachable or the envelope could not be encoded.
    ///
    /// # Errors
    ///
    /// Returns a `DeliveryError` if the substrate could not hand the
    /// envelope toward a live process.
    async fn deliver(&self, delivery: Delivery) -> DeliveryResult<()>;
}

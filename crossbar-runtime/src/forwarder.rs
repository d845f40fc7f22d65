//! The router forwarder.
//!
//! Bridges a synchronous caller to the asynchronous delivery fabric: one
//! `forward` call issues exactly one delivery and resolves with exactly one
//! terminal outcome - the correlated reply, a timeout, a delivery failure,
//! or shutdown. Any number of callers may await concurrently; each pending
//! request is independent and never blocks another.
//!
//! # Request Lifecycle
//!
//! 1. **Issued**: classify the identifier, register a pending correlation,
//!    hand the delivery to the substrate
//! 2. **Awaiting**: suspend on the reply channel, bounded by the deadline
//! 3. **Completed**: the reply payload is returned and the entry is gone
//! 4. **TimedOut**: the entry is cancelled and a later reply is discarded
//!
//! The correlation table's locked remove arbitrates the reply/deadline
//! race: whichever transition removes the entry first wins, the loser's
//! effect is a no-op.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, debug_span, warn, Instrument, Span};

use crossbar_core::{CorrelationId, RouteMessage};
use crossbar_routing::{DecodeError, EntityEnvelope, MessageExtractor};

use crate::config::{ConfigError, RouterConfig};
use crate::correlation::CorrelationTable;
use crate::delivery::{Delivery, DeliveryError, DeliverySubstrate};

/// Forwarding errors. Only timeout and delivery failure cross the
/// synchronous boundary for well-formed requests; neither is retried here.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The message identifier failed to decode. Synchronous, never retried.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] DecodeError),

    /// No reply arrived within the deadline. The caller may retry at its
    /// own discretion.
    #[error("no reply within {timeout:?}")]
    RequestTimeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The delivery substrate could not reach the destination.
    /// Distinguishable from `RequestTimeout` by kind.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// The forwarder shut down while the request was in flight.
    #[error("forwarder is shut down")]
    Shutdown,
}

/// Completes pending requests from the reply path.
///
/// Cloneable handle over the shared correlation table; the substrate's
/// reply pipeline calls [`complete`](Self::complete) from any task or
/// thread.
#[derive(Debug, Clone)]
pub struct ReplySink {
    correlations: Arc<CorrelationTable>,
}

impl ReplySink {
    /// Creates a sink over a shared correlation table.
    #[must_use]
    pub fn new(correlations: Arc<CorrelationTable>) -> Self {
        Self { correlations }
    }

    /// Delivers a reply to the caller waiting on `token`.
    ///
    /// Returns false if no caller is waiting - the token is unknown,
    /// already timed out, or already answered. The reply is discarded; at
    /// most one reply is ever accepted per pending request.
    pub fn complete(&self, token: CorrelationId, payload: Bytes) -> bool {
        let delivered = self.correlations.complete(token, payload);
        if !delivered {
            debug!(%token, "discarding reply with no waiting caller");
        }
        delivered
    }
}

/// The request/response bridge into the routing fabric.
pub struct RouterForwarder {
    /// Derives destinations. Counts are fixed at construction.
    extractor: MessageExtractor,
    /// The cluster delivery fabric.
    substrate: Arc<dyn DeliverySubstrate>,
    /// Pending request bookkeeping, shared with the reply path.
    correlations: Arc<CorrelationTable>,
    /// Default deadline for `forward`.
    request_timeout: Duration,
    /// Injected trace context; each request opens a child span of this.
    trace_context: Span,
}

impl RouterForwarder {
    /// Creates a forwarder with its own correlation table.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid; the
    /// forwarder refuses to initialize rather than fail per-message later.
    pub fn new(
        config: &RouterConfig,
        substrate: Arc<dyn DeliverySubstrate>,
    ) -> Result<Self, ConfigError> {
        Self::with_correlations(config, substrate, Arc::new(CorrelationTable::new()))
    }

    /// Creates a forwarder over a shared correlation table.
    ///
    /// Use this when the reply path needs a [`ReplySink`] before the
    /// forwarder exists, e.g. to wire up an in-process fabric.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn with_correlations(
        config: &RouterConfig,
        substrate: Arc<dyn DeliverySubstrate>,
        correlations: Arc<CorrelationTable>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let extractor = MessageExtractor::new(config.shard_count, config.entity_count)?;

        Ok(Self {
            extractor,
            substrate,
            correlations,
            request_timeout: config.request_timeout,
            trace_context: Span::current(),
        })
    }

    /// Replaces the injected trace context.
    ///
    /// Every request opens a child span of this context, and the reply path
    /// re-enters it, so the context survives the full request lifecycle
    /// without any process-global tracer state.
    #[must_use]
    pub fn with_trace_context(mut self, span: Span) -> Self {
        self.trace_context = span;
        self
    }

    /// Forwards a message and awaits its single correlated reply, bounded
    /// by the configured default timeout.
    ///
    /// # Errors
    ///
    /// See [`forward_with_timeout`](Self::forward_with_timeout).
    pub async fn forward(&self, message: RouteMessage) -> Result<Bytes, ForwardError> {
        self.forward_with_timeout(message, self.request_timeout).await
    }

    /// Forwards a message with an explicit deadline.
    ///
    /// Suspends only the calling task; concurrent forwards are independent.
    /// Exactly one terminal outcome is delivered, never both, never zero.
    ///
    /// # Errors
    ///
    /// - `ForwardError::MalformedIdentifier` if the identifier fails to
    ///   decode; surfaced synchronously, nothing was delivered
    /// - `ForwardError::Delivery` if the substrate could not reach the
    ///   destination
    /// - `ForwardError::RequestTimeout` if no reply arrived in time; a
    ///   later reply for this token is discarded
    /// - `ForwardError::Shutdown` if the forwarder shut down mid-flight
    pub async fn forward_with_timeout(
        &self,
        message: RouteMessage,
        timeout: Duration,
    ) -> Result<Bytes, ForwardError> {
        let destination = self.extractor.destination(&message.identifier)?;
        let (token, reply_rx) = self.correlations.register();

        let span = debug_span!(
            parent: &self.trace_context,
            "forward",
            %token,
            shard = %destination.shard,
            entity = %destination.entity,
        );

        let delivery = Delivery {
            destination,
            token,
            envelope: EntityEnvelope::wrap(message),
            span: span.clone(),
        };

        if let Err(err) = self
            .substrate
            .deliver(delivery)
            .instrument(span.clone())
            .await
        {
            self.correlations.cancel(token);
            warn!(%token, error = %err, "delivery failed");
            return Err(ForwardError::Delivery(err));
        }

        match tokio::time::timeout(timeout, reply_rx).instrument(span).await {
            Ok(Ok(payload)) => Ok(payload),
            // The table was cleared out from under us: shutdown.
            Ok(Err(_closed)) => Err(ForwardError::Shutdown),
            Err(_elapsed) => {
                // The receiver is already dropped, so a reply racing the
                // deadline fails to send; cancel only reclaims the entry.
                self.correlations.cancel(token);
                warn!(%token, ?timeout, "request timed out");
                Err(ForwardError::RequestTimeout { timeout })
            }
        }
    }

    /// Returns a handle the reply path uses to complete tokens.
    #[must_use]
    pub fn reply_sink(&self) -> ReplySink {
        ReplySink::new(Arc::clone(&self.correlations))
    }

    /// Returns the number of requests currently awaiting replies.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.correlations.len()
    }

    /// Returns the extractor this forwarder classifies with.
    #[must_use]
    pub const fn extractor(&self) -> &MessageExtractor {
        &self.extractor
    }

    /// Drops every pending request. Waiting callers resolve with
    /// `ForwardError::Shutdown`; replies arriving afterwards are discarded.
    pub fn shutdown(&self) {
        self.correlations.clear();
        debug!("router forwarder shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::time::{sleep, Instant};

    use crate::delivery::DeliveryResult;

    /// Substrate that echoes the payload back after a delay.
    struct EchoSubstrate {
        sink: ReplySink,
        delay: Duration,
    }

    #[async_trait]
    impl DeliverySubstrate for EchoSubstrate {
        async fn deliver(&self, delivery: Delivery) -> DeliveryResult<()> {
            let sink = self.sink.clone();
            let delay = self.delay;
            tokio::spawn(async move {
                sleep(delay).await;
                sink.complete(delivery.token, delivery.envelope.message().payload.clone());
            });
            Ok(())
        }
    }

    /// Substrate that accepts deliveries but never replies.
    struct SilentSubstrate;

    #[async_trait]
    impl DeliverySubstrate for SilentSubstrate {
        async fn deliver(&self, _delivery: Delivery) -> DeliveryResult<()> {
            Ok(())
        }
    }

    /// Substrate that rejects every delivery.
    struct FailingSubstrate;

    #[async_trait]
    impl DeliverySubstrate for FailingSubstrate {
        async fn deliver(&self, delivery: Delivery) -> DeliveryResult<()> {
            Err(DeliveryError::Unreachable {
                destination: delivery.destination,
            })
        }
    }

    fn echo_forwarder(delay: Duration) -> RouterForwarder {
        let correlations = Arc::new(CorrelationTable::new());
        let substrate = Arc::new(EchoSubstrate {
            sink: ReplySink::new(Arc::clone(&correlations)),
            delay,
        });
        RouterForwarder::with_correlations(
            &RouterConfig::fast_for_testing(),
            substrate,
            correlations,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_forward_completes_with_reply() {
        let forwarder = echo_forwarder(Duration::from_millis(10));

        let reply = forwarder
            .forward(RouteMessage::new("trace:1f", "hit"))
            .await
            .unwrap();

        assert_eq!(reply, Bytes::from_static(b"hit"));
        // The pending entry is removed as the reply is delivered.
        assert_eq!(forwarder.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_forward_malformed_identifier_fails_synchronously() {
        let forwarder = RouterForwarder::new(
            &RouterConfig::fast_for_testing(),
            Arc::new(SilentSubstrate),
        )
        .unwrap();

        let err = forwarder
            .forward(RouteMessage::new("no-separator", "hit"))
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::MalformedIdentifier(_)));
        // Nothing was registered or delivered.
        assert_eq!(forwarder.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_forward_times_out_without_reply() {
        let forwarder = RouterForwarder::new(
            &RouterConfig::fast_for_testing(),
            Arc::new(SilentSubstrate),
        )
        .unwrap();

        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        let err = forwarder
            .forward_with_timeout(RouteMessage::new("trace:1f", "hit"), timeout)
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, ForwardError::RequestTimeout { .. }));
        // At approximately the deadline: not before, not indefinitely after.
        assert!(elapsed >= timeout, "timed out early after {elapsed:?}");
        assert!(elapsed < timeout * 10, "timed out late after {elapsed:?}");
        assert_eq!(forwarder.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_distinct_from_timeout() {
        let forwarder = RouterForwarder::new(
            &RouterConfig::fast_for_testing(),
            Arc::new(FailingSubstrate),
        )
        .unwrap();

        let err = forwarder
            .forward(RouteMessage::new("trace:1f", "hit"))
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Delivery(_)));
        assert_eq!(forwarder.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_refused() {
        let config = RouterConfig::new(0, 20);
        let result = RouterForwarder::new(&config, Arc::new(SilentSubstrate));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCount {
                parameter: "shard_count"
            })
        ));
    }

    #[tokio::test]
    async fn test_late_reply_is_discarded() {
        // Reply arrives well past the deadline.
        let forwarder = echo_forwarder(Duration::from_millis(150));

        let err = forwarder
            .forward_with_timeout(
                RouteMessage::new("trace:1f", "hit"),
                Duration::from_millis(30),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::RequestTimeout { .. }));
        assert_eq!(forwarder.pending_requests(), 0);

        // Let the late reply land on the empty table: a no-op.
        sleep(Duration::from_millis(200)).await;
        assert_eq!(forwarder.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_resolves_waiters() {
        let forwarder = Arc::new(
            RouterForwarder::new(
                &RouterConfig::new(10, 20),
                Arc::new(SilentSubstrate),
            )
            .unwrap(),
        );

        let waiter = Arc::clone(&forwarder);
        let pending = tokio::spawn(async move {
            waiter
                .forward(RouteMessage::new("trace:1f", "hit"))
                .await
        });

        // Give the forward a moment to register.
        sleep(Duration::from_millis(20)).await;
        assert_eq!(forwarder.pending_requests(), 1);

        forwarder.shutdown();
        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ForwardError::Shutdown));
    }

    #[tokio::test]
    async fn test_reply_sink_reports_unknown_token() {
        let forwarder = RouterForwarder::new(
            &RouterConfig::fast_for_testing(),
            Arc::new(SilentSubstrate),
        )
        .unwrap();

        let sink = forwarder.reply_sink();
        assert!(!sink.complete(CorrelationId::new(42), Bytes::from_static(b"stray")));
    }

    #[tokio::test]
    async fn test_concurrent_forwards_are_independent() {
        // A slow request must not delay a fast one.
        let forwarder = Arc::new(echo_forwarder(Duration::from_millis(80)));

        let slow = Arc::clone(&forwarder);
        let slow_task = tokio::spawn(async move {
            slow.forward(RouteMessage::new("slow:1", "slow")).await
        });

        // The fast request uses its own echo stack with a shorter delay.
        let fast_forwarder = echo_forwarder(Duration::from_millis(5));
        let start = Instant::now();
        let fast = fast_forwarder
            .forward(RouteMessage::new("fast:2", "fast"))
            .await
            .unwrap();

        assert_eq!(fast, Bytes::from_static(b"fast"));
        assert!(start.elapsed() < Duration::from_millis(60));

        let slow_reply = slow_task.await.unwrap().unwrap();
        assert_eq!(slow_reply, Bytes::from_static(b"slow"));
    }
}

//! In-process delivery fabric.
//!
//! A load-balanced pool of handler workers standing in for the cluster
//! fabric: any live worker may host the addressed entity, and deliveries
//! are spread across them at random. Each worker drains its own queue,
//! runs the handler inside the delivery's span, and completes the
//! correlation token through the reply sink.
//!
//! Real cluster membership and failure detection live behind the same
//! [`DeliverySubstrate`] trait, outside this crate.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, Instrument};

use crate::delivery::{Delivery, DeliveryError, DeliveryResult, DeliverySubstrate};
use crate::forwarder::ReplySink;

/// Maximum queued deliveries per worker.
const WORKER_QUEUE_DEPTH: usize = 64;

/// A pool of handler workers implementing [`DeliverySubstrate`].
pub struct HandlerPool {
    /// One queue per worker. A closed or full queue means the worker is
    /// not a viable host for the delivery.
    workers: Vec<mpsc::Sender<Delivery>>,
}

impl HandlerPool {
    /// Spawns `size` workers, each running `handler` over its deliveries
    /// and completing tokens through `replies`.
    ///
    /// The handler receives the full delivery (destination, token,
    /// envelope) and returns the reply payload.
    pub fn spawn<H, Fut>(size: usize, replies: ReplySink, handler: H) -> Self
    where
        H: Fn(Delivery) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Bytes> + Send + 'static,
    {
        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let (delivery_tx, delivery_rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
            tokio::spawn(Self::worker_loop(
                worker_id,
                delivery_rx,
                replies.clone(),
                handler.clone(),
            ));
            workers.push(delivery_tx);
        }
        Self { workers }
    }

    /// Loop that processes deliveries for one worker.
    async fn worker_loop<H, Fut>(
        worker_id: usize,
        mut deliveries: mpsc::Receiver<Delivery>,
        replies: ReplySink,
        handler: H,
    ) where
        H: Fn(Delivery) -> Fut + Send,
        Fut: Future<Output = Bytes> + Send,
    {
        while let Some(delivery) = deliveries.recv().await {
            let token = delivery.token;
            let span = delivery.span.clone();

            debug!(worker_id, %token, destination = %delivery.destination, "handling delivery");
            let payload = handler(delivery).instrument(span.clone()).await;

            // Late replies are discarded by the sink; nothing else to do.
            span.in_scope(|| replies.complete(token, payload));
        }

        debug!(worker_id, "worker queue closed");
    }

    /// Returns the number of workers in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns true if the pool has no workers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[async_trait]
impl DeliverySubstrate for HandlerPool {
    async fn deliver(&self, delivery: Delivery) -> DeliveryResult<()> {
        if self.workers.is_empty() {
            return Err(DeliveryError::Unreachable {
                destination: delivery.destination,
            });
        }

        // Any worker may host the entity; pick one at random.
        let index = rand::thread_rng().gen_range(0..self.workers.len());
        self.workers[index].try_send(delivery).map_err(|err| {
            let delivery = match err {
                mpsc::error::TrySendError::Full(d) | mpsc::error::TrySendError::Closed(d) => d,
            };
            DeliveryError::Unreachable {
                destination: delivery.destination,
            }
        })
    }
}

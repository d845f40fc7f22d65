//! Crossbar Runtime - Request forwarding over a cluster delivery substrate.
//!
//! This crate bridges synchronous callers to an asynchronous, load-balanced
//! pool of entity handlers. A caller hands the forwarder a message; the
//! forwarder classifies it (via `crossbar-routing`), registers a pending
//! correlation, submits it to the delivery substrate, and suspends until
//! exactly one of a correlated reply or the deadline arrives.
//!
//! # Overview
//!
//! - `RouterConfig`: address-space and timeout configuration
//! - `RouterForwarder`: the fire-and-wait request/response bridge
//! - `CorrelationTable` / `ReplySink`: pending-request bookkeeping
//! - `DeliverySubstrate`: the boundary trait the cluster fabric implements
//! - `HandlerPool`: an in-process, load-balanced substrate implementation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crossbar_core::RouteMessage;
//! use crossbar_runtime::{CorrelationTable, HandlerPool, ReplySink, RouterConfig, RouterForwarder};
//!
//! let config = RouterConfig::new(10, 20);
//! let correlations = Arc::new(CorrelationTable::new());
//! let pool = Arc::new(HandlerPool::spawn(
//!     4,
//!     ReplySink::new(Arc::clone(&correlations)),
//!     |delivery| async move { delivery.envelope.message().payload.clone() },
//! ));
//! let forwarder = RouterForwarder::with_correlations(&config, pool, correlations)?;
//!
//! let reply = forwarder.forward(RouteMessage::new("trace:1f", "hit")).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod correlation;
mod delivery;
mod fabric;
mod forwarder;

pub use config::{ConfigError, RouterConfig, DEFAULT_REQUEST_TIMEOUT};
pub use correlation::CorrelationTable;
pub use delivery::{Delivery, DeliveryError, DeliveryResult, DeliverySubstrate};
pub use fabric::HandlerPool;
pub use forwarder::{ForwardError, ReplySink, RouterForwarder};

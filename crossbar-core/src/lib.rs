//! Crossbar Core - Strongly-typed identifiers and message types for Crossbar.
//!
//! This crate provides the vocabulary shared by the routing and runtime
//! crates. It does NOT provide any async machinery or delivery logic -
//! those live in `crossbar-runtime`.
//!
//! # Design Principles
//!
//! - **Strongly-typed IDs**: Prevent mixing up `ShardId` with `EntityId`
//! - **Signed address space**: Shard and entity identifiers are signed
//!   64-bit because the key derivation can wrap (see `crossbar-routing`)
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod message;
mod types;

pub use message::RouteMessage;
pub use types::{CorrelationId, EntityId, RouteKey, ShardId};

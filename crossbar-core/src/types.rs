//! Strongly-typed identifiers for Crossbar entities.
//!
//! Explicit types prevent bugs from mixing up identifiers. Shard and entity
//! identifiers are signed: the routing key is decoded from unsigned hex into
//! a signed 64-bit container, so large payloads wrap negative and truncating
//! modulo carries the sign through to the derived identifiers.

use std::fmt;

/// Macro to generate strongly-typed ID wrappers.
///
/// Each ID type wraps a raw integer and provides:
/// - Type safety (can't mix `ShardId` with `EntityId`)
/// - Debug/Display formatting
/// - Zero-cost abstraction (same as the raw integer)
macro_rules! define_id {
    ($name:ident, $raw:ty, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name($raw);

        impl $name {
            /// Creates a new ID from a raw value.
            #[inline]
            #[must_use]
            pub const fn new(value: $raw) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> $raw {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for $raw {
            fn from(id: $name) -> Self {
                id.get()
            }
        }
    };
}

// Routing address space. Signed: derived via truncating modulo from a key
// that can be negative.
define_id!(ShardId, i64, "shard", "One of the fixed logical partitions a message key maps into.");
define_id!(EntityId, i64, "entity", "One of the fixed logical entities within the address space, independent of shard.");

// The decoded numeric key. Computed fresh per message, never cached.
define_id!(RouteKey, i64, "key", "Numeric routing key decoded from a message identifier.");

// Request/reply correlation.
define_id!(CorrelationId, u64, "corr", "Unique token tying an outgoing request to its single reply.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_safety() {
        let shard = ShardId::new(1);
        let entity = EntityId::new(1);

        // These are different types even with same value.
        assert_eq!(shard.get(), entity.get());
        // But they can't be compared directly (won't compile):
        // assert_ne!(shard, entity);
    }

    #[test]
    fn test_id_display() {
        let shard = ShardId::new(7);
        assert_eq!(format!("{shard}"), "shard-7");
        assert_eq!(format!("{shard:?}"), "shard(7)");

        let entity = EntityId::new(11);
        assert_eq!(format!("{entity}"), "entity-11");
    }

    #[test]
    fn test_negative_id_display() {
        // Negative identifiers are representable; the key derivation can
        // produce them for large hex payloads.
        let shard = ShardId::new(-3);
        assert_eq!(format!("{shard}"), "shard--3");
    }

    #[test]
    fn test_correlation_ordering() {
        let a = CorrelationId::new(1);
        let b = CorrelationId::new(2);
        let c = CorrelationId::new(1);

        assert!(a < b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_id_from_raw() {
        let key: RouteKey = (-1i64).into();
        assert_eq!(key.get(), -1);
        assert_eq!(i64::from(key), -1);
    }
}

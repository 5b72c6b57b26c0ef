//! A generic in-memory key/value map whose entries expire after a
//! configurable time-to-live.
//!
//! # Features
//! - **Lazy Expiration**: Expired entries are invisible to every operation the
//!   moment their deadline passes, whether or not they have been reclaimed.
//! - **Cheap Reclamation**: Entries are kept in write order, so expired ones are
//!   always found at one end and reclaimed in amortized O(1) by writes or by
//!   an explicit [`ExpiringMap::clear_expired`].
//! - **Arena Storage**: A power-of-two bucket table with index-linked chains
//!   into a single arena, grown on a configurable load factor.
//! - **Injectable Time**: Every map reads time from a [`clock::Clock`], with
//!   a process-wide overridable default for deterministic tests.
//! - **Optional Sharing**: [`SharedExpiringMap`] adds locking and an optional
//!   periodic sweep on top of the single-threaded core.
//! - **Configuration**: Optional `serde` feature for building maps from
//!   external settings.

// Public modules that form the API
pub mod builder;
pub mod clock;
pub mod error;
pub mod iter;
pub mod map;
pub mod metrics;
pub mod shared;

// Internal, crate-only modules
mod entry;
mod store;
mod task;

#[cfg(feature = "serde")]
pub mod config;

// Re-export the primary user-facing types for convenience
pub use builder::ExpiringMapBuilder;
pub use clock::{Clock, GlobalClock, ManualClock, SystemClock};
pub use error::{BuildError, MapError};
pub use map::ExpiringMap;
pub use metrics::MetricsSnapshot;
pub use shared::SharedExpiringMap;

use thiserror::Error;

/// Errors that can occur when building a map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
  /// The load factor was zero, negative, not finite, or above the supported
  /// maximum. It must lie in `(0, 8]`.
  #[error("load factor must be finite and within (0, 8], got {0}")]
  InvalidLoadFactor(f64),
  /// The initial capacity needs more buckets than the table can hold.
  #[error("initial capacity {requested} exceeds the maximum of {max} for this load factor")]
  InitialCapacityTooLarge { requested: usize, max: usize },
  /// A background sweep was requested with a zero interval.
  #[error("sweep interval cannot be zero")]
  ZeroSweepInterval,
}

/// Errors reported by map operations.
///
/// Missing or expired keys are never errors; they are reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
  /// `put` was called without a key. Keys must always be present.
  #[error("cache keys must not be absent")]
  InvalidKey,
}

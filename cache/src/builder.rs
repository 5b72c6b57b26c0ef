use crate::clock::{Clock, GlobalClock};
use crate::error::BuildError;
use crate::map::ExpiringMap;
use crate::store::{max_initial_capacity, Store};

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// The load factor used when none is configured.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// The largest accepted load factor.
pub const MAX_LOAD_FACTOR: f64 = 8.0;

/// The initial capacity used when none is configured.
pub const DEFAULT_INITIAL_CAPACITY: usize = 0;

/// A builder for creating [`ExpiringMap`] and
/// [`SharedExpiringMap`](crate::SharedExpiringMap) instances.
pub struct ExpiringMapBuilder<K, V, H = ahash::RandomState> {
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) initial_capacity: usize,
  pub(crate) load_factor: f64,
  pub(crate) hasher: H,
  pub(crate) clock: Option<Arc<dyn Clock>>,
  pub(crate) sweep_interval: Option<Duration>,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

impl<K, V, H> fmt::Debug for ExpiringMapBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExpiringMapBuilder")
      .field("time_to_live", &self.time_to_live)
      .field("initial_capacity", &self.initial_capacity)
      .field("load_factor", &self.load_factor)
      .field("sweep_interval", &self.sweep_interval)
      .field("has_custom_clock", &self.clock.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> ExpiringMapBuilder<K, V, H> {
  /// Sets the time-to-live applied to every entry.
  ///
  /// Without one, entries never expire until
  /// [`ExpiringMap::set_time_to_live`] is called.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = Some(duration);
    self
  }

  /// Pre-sizes the bucket table for `capacity` entries.
  pub fn initial_capacity(mut self, capacity: usize) -> Self {
    self.initial_capacity = capacity;
    self
  }

  /// Sets the entries-per-bucket ratio at which the bucket table doubles.
  ///
  /// Must be finite and within `(0, 8]`. Defaults to `0.75`.
  pub fn load_factor(mut self, load_factor: f64) -> Self {
    self.load_factor = load_factor;
    self
  }

  /// Sets the time source used to stamp and check entries.
  ///
  /// Defaults to [`GlobalClock`].
  pub fn clock<C>(mut self, clock: C) -> Self
  where
    C: Clock + 'static,
  {
    self.clock = Some(Arc::new(clock));
    self
  }

  /// Enables a background sweep every `interval` on a map created with
  /// [`build_shared`](Self::build_shared). Ignored by [`build`](Self::build).
  pub fn sweep_interval(mut self, interval: Duration) -> Self {
    self.sweep_interval = Some(interval);
    self
  }

  /// Replaces the hasher, changing the builder's hasher type.
  pub fn hasher<H2>(self, hasher: H2) -> ExpiringMapBuilder<K, V, H2> {
    ExpiringMapBuilder {
      time_to_live: self.time_to_live,
      initial_capacity: self.initial_capacity,
      load_factor: self.load_factor,
      hasher,
      clock: self.clock,
      sweep_interval: self.sweep_interval,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    let load_factor = self.load_factor;
    if !(load_factor.is_finite() && load_factor > 0.0 && load_factor <= MAX_LOAD_FACTOR) {
      return Err(BuildError::InvalidLoadFactor(load_factor));
    }
    let max = max_initial_capacity(load_factor);
    if self.initial_capacity > max {
      return Err(BuildError::InitialCapacityTooLarge {
        requested: self.initial_capacity,
        max,
      });
    }
    if self.sweep_interval == Some(Duration::ZERO) {
      return Err(BuildError::ZeroSweepInterval);
    }
    Ok(())
  }

  /// Assembles the map from validated settings.
  pub(crate) fn build_map(self) -> ExpiringMap<K, V, H> {
    let store = Store::new(self.initial_capacity, self.load_factor, self.hasher);
    let clock = self.clock.unwrap_or_else(|| Arc::new(GlobalClock));
    ExpiringMap::from_parts(store, self.time_to_live, clock)
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> ExpiringMapBuilder<K, V, H> {
  /// Creates a new `ExpiringMapBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      time_to_live: None,
      initial_capacity: DEFAULT_INITIAL_CAPACITY,
      load_factor: DEFAULT_LOAD_FACTOR,
      hasher: H::default(),
      clock: None,
      sweep_interval: None,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }
}

impl<K, V> Default for ExpiringMapBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(feature = "rapidhash")]
impl<K, V> ExpiringMapBuilder<K, V, rapidhash::RapidRandomState> {
  /// Creates a builder that hashes keys with `rapidhash`.
  pub fn rapidhash() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> ExpiringMapBuilder<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  /// Builds a single-threaded [`ExpiringMap`].
  pub fn build(self) -> Result<ExpiringMap<K, V, H>, BuildError> {
    self.validate()?;
    if let Some(interval) = self.sweep_interval {
      tracing::warn!(
        ?interval,
        "sweep_interval only applies to shared maps and is ignored by build()"
      );
    }
    Ok(self.build_map())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_bad_load_factors() {
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 8.5] {
      let result = ExpiringMapBuilder::<u8, u8>::new().load_factor(bad).build();
      assert!(
        matches!(result, Err(BuildError::InvalidLoadFactor(_))),
        "load factor {bad} should be rejected"
      );
    }
  }

  #[test]
  fn accepts_boundary_load_factor() {
    let map = ExpiringMapBuilder::<u8, u8>::new()
      .load_factor(MAX_LOAD_FACTOR)
      .build()
      .unwrap();
    assert!(map.is_empty());
  }

  #[test]
  fn rejects_zero_sweep_interval() {
    let result = ExpiringMapBuilder::<u8, u8>::new()
      .sweep_interval(Duration::ZERO)
      .build();
    assert_eq!(result.err(), Some(BuildError::ZeroSweepInterval));
  }

  #[test]
  fn rejects_oversized_initial_capacity() {
    let max = max_initial_capacity(DEFAULT_LOAD_FACTOR);
    let result = ExpiringMapBuilder::<u8, u8>::new()
      .initial_capacity(usize::MAX)
      .build();
    assert_eq!(
      result.err(),
      Some(BuildError::InitialCapacityTooLarge {
        requested: usize::MAX,
        max,
      })
    );

    let result = ExpiringMapBuilder::<u8, u8>::new()
      .initial_capacity(max + 1)
      .build_shared();
    assert!(matches!(result, Err(BuildError::InitialCapacityTooLarge { .. })));
  }

  #[test]
  fn initial_capacity_presizes_buckets() {
    let map = ExpiringMapBuilder::<u32, u32>::new()
      .initial_capacity(1_000)
      .build()
      .unwrap();
    assert_eq!(map.bucket_count(), 2_048);
  }
}

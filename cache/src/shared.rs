//! A thread-safe handle layered on top of [`ExpiringMap`].
//!
//! The map itself is single-threaded. `SharedExpiringMap` puts it behind a
//! `parking_lot::RwLock` so lookups can proceed in parallel while writes are
//! serialized, and optionally owns a janitor thread that calls
//! [`ExpiringMap::clear_expired`] on a fixed interval.

use crate::builder::ExpiringMapBuilder;
use crate::error::{BuildError, MapError};
use crate::map::ExpiringMap;
use crate::metrics::MetricsSnapshot;
use crate::task::janitor::Janitor;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use equivalent::Equivalent;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A cloneable, thread-safe handle to an [`ExpiringMap`].
///
/// All clones share the same map. If the map was built with a sweep
/// interval, the background sweep stops when the last handle is dropped.
pub struct SharedExpiringMap<K, V, H = ahash::RandomState> {
  map: Arc<RwLock<ExpiringMap<K, V, H>>>,
  janitor: Option<Arc<Janitor>>,
}

impl<K, V, H> Clone for SharedExpiringMap<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      map: self.map.clone(),
      janitor: self.janitor.clone(),
    }
  }
}

impl<K, V, H> fmt::Debug for SharedExpiringMap<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SharedExpiringMap")
      .field("handles", &Arc::strong_count(&self.map))
      .field("has_janitor", &self.janitor.is_some())
      .finish_non_exhaustive()
  }
}

impl<K, V, H> From<ExpiringMap<K, V, H>> for SharedExpiringMap<K, V, H> {
  /// Wraps an existing map without a background sweep.
  fn from(map: ExpiringMap<K, V, H>) -> Self {
    Self {
      map: Arc::new(RwLock::new(map)),
      janitor: None,
    }
  }
}

impl<K, V, H> SharedExpiringMap<K, V, H> {
  /// Acquires a read lock on the underlying map.
  pub fn read(&self) -> RwLockReadGuard<'_, ExpiringMap<K, V, H>> {
    self.map.read()
  }

  /// Acquires a write lock on the underlying map.
  pub fn write(&self) -> RwLockWriteGuard<'_, ExpiringMap<K, V, H>> {
    self.map.write()
  }

  /// Returns `true` if a background sweep is running for this map.
  pub fn has_janitor(&self) -> bool {
    self.janitor.is_some()
  }

  /// See [`ExpiringMap::len`].
  pub fn len(&self) -> usize {
    self.map.read().len()
  }

  /// See [`ExpiringMap::is_empty`].
  pub fn is_empty(&self) -> bool {
    self.map.read().is_empty()
  }

  /// See [`ExpiringMap::clear`].
  pub fn clear(&self) {
    self.map.write().clear();
  }

  /// See [`ExpiringMap::clear_expired`].
  pub fn clear_expired(&self) -> usize {
    self.map.write().clear_expired()
  }

  /// See [`ExpiringMap::set_time_to_live`].
  pub fn set_time_to_live(&self, ttl: Duration) {
    self.map.write().set_time_to_live(ttl);
  }

  /// See [`ExpiringMap::time_to_live`].
  pub fn time_to_live(&self) -> Option<Duration> {
    self.map.read().time_to_live()
  }

  /// See [`ExpiringMap::metrics`].
  pub fn metrics(&self) -> MetricsSnapshot {
    self.map.read().metrics()
  }
}

impl<K, V, H> SharedExpiringMap<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  /// See [`ExpiringMap::insert`].
  pub fn insert(&self, key: K, value: V) -> Option<V> {
    self.map.write().insert(key, value)
  }

  /// See [`ExpiringMap::put`].
  pub fn put(&self, key: Option<K>, value: Option<V>) -> Result<Option<V>, MapError> {
    self.map.write().put(key, value)
  }

  /// Looks up a live entry and, if found, applies a closure to the value.
  ///
  /// The closure runs while the read lock is held, so it should be fast.
  pub fn get<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    Q: Hash + Equivalent<K> + ?Sized,
    F: FnOnce(&V) -> R,
  {
    self.map.read().get(key).map(f)
  }

  /// Returns a clone of the live value for `key`.
  pub fn fetch<Q>(&self, key: &Q) -> Option<V>
  where
    Q: Hash + Equivalent<K> + ?Sized,
    V: Clone,
  {
    self.map.read().get(key).cloned()
  }

  /// See [`ExpiringMap::contains_key`].
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    self.map.read().contains_key(key)
  }

  /// See [`ExpiringMap::remove`].
  pub fn remove<Q>(&self, key: &Q) -> Option<V>
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    self.map.write().remove(key)
  }
}

// --- Shared Build Method ---
impl<K, V, H> ExpiringMapBuilder<K, V, H>
where
  K: Eq + Hash + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  /// Builds a thread-safe [`SharedExpiringMap`].
  ///
  /// If a [`sweep_interval`](Self::sweep_interval) was configured, a janitor
  /// thread is started that calls `clear_expired` on that interval.
  pub fn build_shared(self) -> Result<SharedExpiringMap<K, V, H>, BuildError> {
    self.validate()?;
    let sweep_interval = self.sweep_interval;
    let map = Arc::new(RwLock::new(self.build_map()));

    let janitor = sweep_interval.map(|interval| Arc::new(Janitor::spawn(Arc::downgrade(&map), interval)));

    Ok(SharedExpiringMap { map, janitor })
  }
}

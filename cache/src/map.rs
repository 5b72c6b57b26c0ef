//! The expiring map itself.

use crate::builder::{ExpiringMapBuilder, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR};
use crate::clock::{Clock, GlobalClock};
use crate::error::MapError;
use crate::iter::{Iter, Keys, Values};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::store::Store;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use equivalent::Equivalent;
use generational_arena::Index;

/// A hash map whose entries disappear once they are older than the map's
/// time-to-live.
///
/// Every entry remembers the clock reading of its last write. An entry is
/// *expired* once `now >= written_at + ttl`, and from that moment on no
/// operation returns it or counts it, whether or not its memory has been
/// reclaimed yet. Reclamation is lazy: write operations drop whatever has
/// expired, and [`clear_expired`](Self::clear_expired) can be called at any
/// time to do the same eagerly. There are no background threads; see
/// [`SharedExpiringMap`](crate::SharedExpiringMap) for a thread-safe wrapper
/// with an optional periodic sweep.
///
/// # TTL changes apply to existing entries
///
/// Deadlines are not frozen at insertion. Each check uses the entry's stored
/// write time and the TTL configured *at the time of the check*, so
/// [`set_time_to_live`](Self::set_time_to_live) immediately shortens or
/// extends the lifetime of everything already in the map.
///
/// # Examples
///
/// ```
/// use fibre_expiring_map::{clock::ManualClock, ExpiringMapBuilder};
/// use std::time::Duration;
///
/// let clock = ManualClock::starting_at(1_000);
/// let mut map = ExpiringMapBuilder::<i32, &str>::new()
///   .time_to_live(Duration::from_secs(1))
///   .clock(clock.clone())
///   .build()
///   .unwrap();
///
/// map.insert(1, "apple");
/// assert_eq!(map.get(&1), Some(&"apple"));
///
/// clock.set(3_000);
/// assert_eq!(map.get(&1), None);
/// assert!(map.is_empty());
/// ```
pub struct ExpiringMap<K, V, H = ahash::RandomState> {
  pub(crate) store: Store<K, V, H>,
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) metrics: Metrics,
}

impl<K, V> ExpiringMap<K, V, ahash::RandomState> {
  /// Creates an empty map with no TTL, driven by the global clock.
  pub fn new() -> Self {
    Self::with_hasher(ahash::RandomState::new())
  }

  /// Returns a builder for configuring a map.
  pub fn builder() -> ExpiringMapBuilder<K, V, ahash::RandomState> {
    ExpiringMapBuilder::new()
  }
}

impl<K, V, H> ExpiringMap<K, V, H> {
  /// Creates an empty map with no TTL that hashes keys with `hasher`.
  pub fn with_hasher(hasher: H) -> Self {
    Self::from_parts(
      Store::new(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, hasher),
      None,
      Arc::new(GlobalClock),
    )
  }

  pub(crate) fn from_parts(
    store: Store<K, V, H>,
    time_to_live: Option<Duration>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      store,
      time_to_live,
      clock,
      metrics: Metrics::new(),
    }
  }

  /// Sets the TTL used by every expiry check from now on.
  ///
  /// Existing entries are affected too: their deadlines are recomputed from
  /// their stored write time on the next check. Nothing is swept by this call.
  pub fn set_time_to_live(&mut self, ttl: Duration) {
    self.time_to_live = Some(ttl);
  }

  /// Removes the TTL; entries stop expiring until one is set again.
  pub fn clear_time_to_live(&mut self) {
    self.time_to_live = None;
  }

  /// Returns the configured TTL, or `None` if entries never expire.
  pub fn time_to_live(&self) -> Option<Duration> {
    self.time_to_live
  }

  /// Returns the hasher used by this map.
  pub fn hasher(&self) -> &H {
    self.store.hasher()
  }

  /// Returns the number of live entries.
  ///
  /// Expired entries that have not been reclaimed yet are not counted.
  pub fn len(&self) -> usize {
    let now = self.clock.now();
    self.store.len() - self.expired_prefix_len(now)
  }

  /// Returns `true` if the map holds no live entries.
  pub fn is_empty(&self) -> bool {
    let now = self.clock.now();
    // The newest entry is the last to expire.
    match self.store.newest() {
      Some(index) => self.store.node(index).is_expired(now, self.time_to_live),
      None => true,
    }
  }

  /// Removes every entry, live or expired.
  pub fn clear(&mut self) {
    let dropped = self.store.len();
    self.store.clear();
    Metrics::record(&self.metrics.clears, 1);
    tracing::debug!(dropped, "expiring map cleared");
  }

  /// Physically removes every entry that has expired as of now and returns
  /// how many were removed. Live entries are untouched.
  ///
  /// Calling this is never required for correctness; it only releases
  /// memory sooner.
  pub fn clear_expired(&mut self) -> usize {
    let now = self.clock.now();
    self.purge_expired(now)
  }

  /// Iterates live entries from the oldest write to the newest.
  pub fn iter(&self) -> Iter<'_, K, V> {
    Iter::new(self.store.iter_by_age(), self.clock.now(), self.time_to_live)
  }

  /// Iterates the keys of live entries.
  pub fn keys(&self) -> Keys<'_, K, V> {
    Keys::new(self.iter())
  }

  /// Iterates the values of live entries.
  pub fn values(&self) -> Values<'_, K, V> {
    Values::new(self.iter())
  }

  /// Returns `true` if some live entry holds a value equal to `value`.
  pub fn contains_value(&self, value: &V) -> bool
  where
    V: PartialEq,
  {
    self.values().any(|candidate| candidate == value)
  }

  /// Returns a snapshot of this map's counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot(self.len())
  }

  /// The current size of the bucket table.
  #[doc(hidden)]
  pub fn bucket_count(&self) -> usize {
    self.store.bucket_count()
  }

  // Counts the expired entries at the old end of the age list.
  fn expired_prefix_len(&self, now: u64) -> usize {
    self
      .store
      .iter_by_age()
      .take_while(|node| node.is_expired(now, self.time_to_live))
      .count()
  }

  // Removes the expired entries at the old end of the age list.
  fn purge_expired(&mut self, now: u64) -> usize {
    let mut removed = 0usize;
    while let Some(index) = self.store.oldest() {
      if !self.store.node(index).is_expired(now, self.time_to_live) {
        break;
      }
      self.store.remove(index);
      removed += 1;
    }

    if removed > 0 {
      Metrics::record(&self.metrics.evicted_by_ttl, removed as u64);
      tracing::trace!(removed, remaining = self.store.len(), "reclaimed expired entries");
    }
    removed
  }
}

impl<K, V, H> ExpiringMap<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  /// Stores `value` under `key`, stamped with the current time.
  ///
  /// Returns the previous *live* value for `key`. An expired previous entry
  /// is replaced as if the key were new, and `None` is returned.
  pub fn insert(&mut self, key: K, value: V) -> Option<V> {
    let now = self.clock.now();
    // Expired entries form the old end of the age list, so after the purge
    // every node `find` can reach is live.
    self.purge_expired(now);

    let hash = self.store.hash(&key);
    match self.store.find(hash, &key) {
      Some(index) => {
        let previous = self.store.rewrite(index, value, now);
        Metrics::record(&self.metrics.updates, 1);
        Some(previous)
      }
      None => {
        self.store.insert(key, value, hash, now);
        Metrics::record(&self.metrics.inserts, 1);
        None
      }
    }
  }

  /// The nullable form of [`insert`](Self::insert).
  ///
  /// A `None` key is rejected with [`MapError::InvalidKey`]. A `None` value
  /// removes the key and behaves exactly like [`remove`](Self::remove).
  pub fn put(&mut self, key: Option<K>, value: Option<V>) -> Result<Option<V>, MapError> {
    let key = key.ok_or(MapError::InvalidKey)?;
    Ok(match value {
      Some(value) => self.insert(key, value),
      None => self.remove(&key),
    })
  }

  /// Returns the live value for `key`.
  pub fn get<Q>(&self, key: &Q) -> Option<&V>
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    match self.live_index(key, self.clock.now()) {
      Some(index) => {
        Metrics::record(&self.metrics.hits, 1);
        Some(&self.store.node(index).value)
      }
      None => {
        Metrics::record(&self.metrics.misses, 1);
        None
      }
    }
  }

  /// Returns the live key and value stored for `key`.
  pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    self
      .live_index(key, self.clock.now())
      .map(|index| {
        let node = self.store.node(index);
        (&node.key, &node.value)
      })
  }

  /// Returns `true` if [`get`](Self::get) would return a value for `key`.
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    self.live_index(key, self.clock.now()).is_some()
  }

  /// Removes `key` and returns its live value.
  ///
  /// An expired entry for `key` is reclaimed by the purge that precedes the
  /// lookup, so `None` is returned for it.
  pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    let now = self.clock.now();
    self.purge_expired(now);

    let hash = self.store.hash(key);
    let index = self.store.find(hash, key)?;
    let node = self.store.remove(index)?;
    Metrics::record(&self.metrics.removals, 1);
    Some(node.value)
  }

  // Locates `key` and applies the expiry predicate before trusting it.
  fn live_index<Q>(&self, key: &Q, now: u64) -> Option<Index>
  where
    Q: Hash + Equivalent<K> + ?Sized,
  {
    let hash = self.store.hash(key);
    self
      .store
      .find(hash, key)
      .filter(|&index| !self.store.node(index).is_expired(now, self.time_to_live))
  }
}

impl<K, V, H: Default> Default for ExpiringMap<K, V, H> {
  fn default() -> Self {
    Self::with_hasher(H::default())
  }
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for ExpiringMap<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

impl<'a, K, V, H> IntoIterator for &'a ExpiringMap<K, V, H> {
  type Item = (&'a K, &'a V);
  type IntoIter = Iter<'a, K, V>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<K, V, H> Extend<(K, V)> for ExpiringMap<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (key, value) in iter {
      self.insert(key, value);
    }
  }
}

impl<K, V> FromIterator<(K, V)> for ExpiringMap<K, V, ahash::RandomState>
where
  K: Eq + Hash,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::new();
    map.extend(iter);
    map
  }
}

use generational_arena::Index;
use std::time::Duration;

/// A stored key/value pair together with its expiry and linkage metadata.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
  pub(crate) key: K,
  pub(crate) value: V,
  /// The key's hash, cached so chains can be rebuilt without rehashing.
  pub(crate) hash: u64,
  /// The clock reading (milliseconds) at the last write of this entry.
  pub(crate) inserted_at: u64,
  /// The next node in the same bucket chain.
  pub(crate) next_in_bucket: Option<Index>,
  /// The neighbour inserted before this one in the age list.
  pub(crate) older: Option<Index>,
  /// The neighbour inserted after this one in the age list.
  pub(crate) newer: Option<Index>,
}

impl<K, V> Node<K, V> {
  pub(crate) fn new(key: K, value: V, hash: u64, inserted_at: u64) -> Self {
    Self {
      key,
      value,
      hash,
      inserted_at,
      next_in_bucket: None,
      older: None,
      newer: None,
    }
  }

  /// Checks this node against the expiry predicate.
  #[inline]
  pub(crate) fn is_expired(&self, now: u64, ttl: Option<Duration>) -> bool {
    is_expired(self.inserted_at, now, ttl)
  }
}

/// Converts a duration to whole milliseconds, rounding down and saturating.
#[inline]
pub(crate) fn duration_millis(duration: Duration) -> u64 {
  u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// The single expiry predicate shared by every read path and by sweeps.
///
/// An entry written at `inserted_at` is expired once `now` reaches
/// `inserted_at + ttl`; the deadline itself is already expired. A `None` TTL
/// never expires anything.
#[inline]
pub(crate) fn is_expired(inserted_at: u64, now: u64, ttl: Option<Duration>) -> bool {
  match ttl {
    Some(ttl) => now >= inserted_at.saturating_add(duration_millis(ttl)),
    None => false,
  }
}

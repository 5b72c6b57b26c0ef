use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// An internal metrics collector for a map.
///
/// Counters are atomic so that read-only lookups (`&self`) can record hits
/// and misses, including from concurrent readers of a shared map.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Throughput ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) removals: CachePadded<AtomicU64>,

  // --- Reclamation ---
  pub(crate) evicted_by_ttl: CachePadded<AtomicU64>,
  pub(crate) clears: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      updates: CachePadded::new(AtomicU64::new(0)),
      removals: CachePadded::new(AtomicU64::new(0)),
      evicted_by_ttl: CachePadded::new(AtomicU64::new(0)),
      clears: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn record(counter: &AtomicU64, n: u64) {
    counter.fetch_add(n, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the counters.
  pub(crate) fn snapshot(&self, live_entries: usize) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
      evicted_by_ttl: self.evicted_by_ttl.load(Ordering::Relaxed),
      clears: self.clears.load(Ordering::Relaxed),
      live_entries,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of a map's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// The number of lookups that found a live entry.
  pub hits: u64,
  /// The number of lookups that found nothing, or only an expired entry.
  pub misses: u64,
  /// The hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// The number of writes that created a new live entry.
  pub inserts: u64,
  /// The number of writes that replaced a live entry.
  pub updates: u64,
  /// The number of live entries removed by `remove` or an absent-value `put`.
  pub removals: u64,
  /// The number of expired entries physically reclaimed.
  pub evicted_by_ttl: u64,
  /// The number of `clear` calls.
  pub clears: u64,
  /// The number of live entries when the snapshot was taken.
  pub live_entries: usize,
  /// The number of seconds since the map was created.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("removals", &self.removals)
      .field("evicted_by_ttl", &self.evicted_by_ttl)
      .field("clears", &self.clears)
      .field("live_entries", &self.live_entries)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}

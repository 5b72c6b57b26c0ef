//! Time sources used to stamp and check entry deadlines.
//!
//! The map only ever asks a [`Clock`] for the current logical time in
//! milliseconds. Three implementations are provided:
//!
//! - [`SystemClock`]: plain wall-clock time.
//! - [`ManualClock`]: a cloneable handle whose time can be pinned, advanced
//!   and released, for deterministic tests of a single map.
//! - [`GlobalClock`]: reads the process-wide override controlled by
//!   [`set`] and [`reset`]. This is the default clock of every map.

use crate::entry::duration_millis;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Process-wide time override. `None` means wall-clock time.
static GLOBAL_OVERRIDE: Lazy<RwLock<Option<u64>>> = Lazy::new(|| RwLock::new(None));

/// A source of the current logical time, in milliseconds.
pub trait Clock: Send + Sync {
  /// Returns the current time in milliseconds.
  fn now(&self) -> u64;
}

/// Returns the wall-clock time in milliseconds since the UNIX epoch.
#[inline]
pub fn wall_clock_millis() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Returns the process-wide logical time: the value passed to [`set`] if an
/// override is active, wall-clock time otherwise.
pub fn now() -> u64 {
  match *GLOBAL_OVERRIDE.read() {
    Some(time) => time,
    None => wall_clock_millis(),
  }
}

/// Pins the process-wide time to `time` until [`reset`] is called.
///
/// Every map built with the default clock observes the change.
pub fn set(time: u64) {
  *GLOBAL_OVERRIDE.write() = Some(time);
}

/// Removes the process-wide override; [`now`] reverts to wall-clock time.
pub fn reset() {
  *GLOBAL_OVERRIDE.write() = None;
}

/// Wall-clock time, ignoring any override.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> u64 {
    wall_clock_millis()
  }
}

/// The process-wide clock driven by [`set`] and [`reset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalClock;

impl Clock for GlobalClock {
  #[inline]
  fn now(&self) -> u64 {
    now()
  }
}

/// A clock whose time can be controlled through any of its clones.
///
/// Unlike [`GlobalClock`], each `ManualClock` created with [`ManualClock::new`]
/// or [`ManualClock::starting_at`] is independent, so several maps can run on
/// separate timelines within one test binary.
#[derive(Clone, Default)]
pub struct ManualClock {
  time: Arc<RwLock<Option<u64>>>,
}

impl fmt::Debug for ManualClock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManualClock")
      .field("override", &*self.time.read())
      .finish()
  }
}

impl ManualClock {
  /// Creates a clock that reports wall-clock time until [`set`](Self::set).
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a clock pinned at `time`.
  pub fn starting_at(time: u64) -> Self {
    let clock = Self::new();
    clock.set(time);
    clock
  }

  /// Pins this clock (and all of its clones) to `time`.
  pub fn set(&self, time: u64) {
    *self.time.write() = Some(time);
  }

  /// Moves the pinned time forward by `by`. If the clock is not pinned, it
  /// becomes pinned at the current wall-clock time plus `by`.
  pub fn advance(&self, by: Duration) {
    let mut guard = self.time.write();
    let base = guard.unwrap_or_else(wall_clock_millis);
    *guard = Some(base.saturating_add(duration_millis(by)));
  }

  /// Releases the pin; the clock reverts to wall-clock time.
  pub fn reset(&self) {
    *self.time.write() = None;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> u64 {
    match *self.time.read() {
      Some(time) => time,
      None => wall_clock_millis(),
    }
  }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
  #[inline]
  fn now(&self) -> u64 {
    (**self).now()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn manual_clock_clones_share_time() {
    let clock = ManualClock::starting_at(1_000);
    let other = clock.clone();

    other.set(2_500);
    assert_eq!(clock.now(), 2_500);

    clock.advance(Duration::from_millis(500));
    assert_eq!(other.now(), 3_000);
  }

  #[test]
  fn manual_clock_reset_returns_to_wall_clock() {
    let clock = ManualClock::starting_at(5);
    assert_eq!(clock.now(), 5);

    clock.reset();
    let before = wall_clock_millis();
    let observed = clock.now();
    assert!(observed >= before);
  }

  #[test]
  fn manual_clock_advance_saturates() {
    let clock = ManualClock::starting_at(u64::MAX - 10);
    clock.advance(Duration::MAX);
    assert_eq!(clock.now(), u64::MAX);

    let clock = ManualClock::starting_at(0);
    clock.advance(Duration::from_secs(u64::MAX));
    assert_eq!(clock.now(), u64::MAX, "oversized durations must not wrap");
  }

  #[test]
  fn independent_manual_clocks_do_not_interfere() {
    let a = ManualClock::starting_at(10);
    let b = ManualClock::starting_at(20);
    a.advance(Duration::from_millis(5));
    assert_eq!(a.now(), 15);
    assert_eq!(b.now(), 20);
  }
}

#![allow(dead_code)]

use std::hash::{BuildHasher, Hasher};
use std::time::Duration;

use fibre_expiring_map::{ExpiringMap, ExpiringMapBuilder, ManualClock};

// A hasher that uses the integer value of the key as its hash, so tests can
// reason about which bucket a key lands in.
// For a 16-bucket table:
// - key 1  -> bucket 1
// - key 17 -> bucket 1 (17 & 15 = 1)
#[derive(Clone, Default)]
pub struct IdentityHasher;
impl BuildHasher for IdentityHasher {
  type Hasher = KeyHasher;
  fn build_hasher(&self) -> Self::Hasher {
    KeyHasher(0)
  }
}
pub struct KeyHasher(u64);
impl Hasher for KeyHasher {
  fn finish(&self) -> u64 {
    self.0
  }
  fn write(&mut self, _: &[u8]) {
    unimplemented!()
  }
  fn write_i32(&mut self, i: i32) {
    self.0 = i as u64;
  }
}

// A hasher that sends every key to the same bucket.
#[derive(Clone, Default)]
pub struct CollidingHasher;
impl BuildHasher for CollidingHasher {
  type Hasher = ConstantHasher;
  fn build_hasher(&self) -> Self::Hasher {
    ConstantHasher
  }
}
pub struct ConstantHasher;
impl Hasher for ConstantHasher {
  fn finish(&self) -> u64 {
    0
  }
  fn write(&mut self, _: &[u8]) {}
}

pub const TTL: Duration = Duration::from_millis(1_000);

// Builds a map with a 1s TTL on a clock pinned at `start`.
pub fn build_test_map(start: u64) -> (ExpiringMap<i32, String>, ManualClock) {
  let clock = ManualClock::starting_at(start);
  let map = ExpiringMapBuilder::<i32, String>::new()
    .time_to_live(TTL)
    .clock(clock.clone())
    .build()
    .unwrap();
  (map, clock)
}

// Same as `build_test_map`, but every key collides into one chain.
pub fn build_colliding_map(start: u64) -> (ExpiringMap<i32, String, CollidingHasher>, ManualClock) {
  let clock = ManualClock::starting_at(start);
  let map = ExpiringMapBuilder::<i32, String>::new()
    .time_to_live(TTL)
    .clock(clock.clone())
    .hasher(CollidingHasher)
    .build()
    .unwrap();
  (map, clock)
}

pub fn s(text: &str) -> String {
  text.to_string()
}

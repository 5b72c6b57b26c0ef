mod common;

use common::{build_colliding_map, build_test_map, s, TTL};
use fibre_expiring_map::{ExpiringMapBuilder, ManualClock};
use std::time::Duration;

#[test]
fn test_sync_item_expires_after_ttl() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  assert_eq!(map.get(&1), Some(&s("apple")));
  assert!(!map.is_empty());

  clock.set(3_000);
  assert!(map.get(&1).is_none(), "Item should have expired");
  assert!(map.is_empty());
  assert_eq!(map.len(), 0);
}

#[test]
fn test_sync_expiry_boundary_is_exclusive() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));

  clock.set(1_999);
  assert_eq!(map.get(&1), Some(&s("apple")));

  clock.set(2_000);
  assert!(map.get(&1).is_none(), "An entry is expired exactly at its deadline");
}

#[test]
fn test_sync_partial_expiry() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));

  clock.set(1_500);
  map.insert(2, s("orange"));
  assert_eq!(map.len(), 2);

  clock.set(2_300);
  assert!(map.get(&1).is_none());
  assert_eq!(map.get(&2), Some(&s("orange")));
  assert_eq!(map.len(), 1);
}

#[test]
fn test_sync_size_never_counts_expired_entries() {
  let (mut map, clock) = build_test_map(0);
  for key in 0..10 {
    clock.set(key as u64 * 100);
    map.insert(key, key.to_string());
  }

  // Entries written at 0..=400 expire at 1_000..=1_400.
  clock.set(1_450);
  assert_eq!(map.len(), 5);
  assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);

  // A sweep changes memory use, not the observable size.
  assert_eq!(map.clear_expired(), 5);
  assert_eq!(map.len(), 5);
}

#[test]
fn test_sync_put_over_expired_entry_acts_like_fresh_insert() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  map.insert(1, s("mango"));

  clock.set(3_000);
  assert!(map.get(&1).is_none());
  assert_eq!(map.insert(1, s("kiwi")), None, "Expired values are never returned");
  assert_eq!(map.len(), 1);
  assert_eq!(map.get(&1), Some(&s("kiwi")));

  // The new entry is stamped with the time of the overwrite.
  clock.set(3_999);
  assert_eq!(map.get(&1), Some(&s("kiwi")));
}

#[test]
fn test_sync_remove_of_expired_entry_returns_nothing() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  map.insert(2, s("pear"));
  clock.set(1_500);
  map.insert(3, s("plum"));

  clock.set(2_100);
  let before = map.len();
  assert_eq!(before, 1);
  assert_eq!(map.remove(&1), None);
  assert_eq!(map.len(), before, "The entry was already logically absent");
  assert_eq!(map.metrics().removals, 0);
}

#[test]
fn test_sync_remove_of_expired_entry_in_a_chain() {
  let (mut map, clock) = build_colliding_map(1_000);
  map.insert(1, s("old"));
  clock.set(1_800);
  map.insert(2, s("young"));

  clock.set(2_000);
  assert_eq!(map.remove(&1), None);
  assert_eq!(map.get(&2), Some(&s("young")));
  assert_eq!(map.len(), 1);
}

#[test]
fn test_sync_contains_value_ignores_expired_entries() {
  let (mut map, clock) = build_test_map(1_000);
  assert!(!map.contains_value(&s("apple")));

  map.insert(1, s("apple"));
  assert!(map.contains_value(&s("apple")));

  clock.set(3_000);
  assert!(!map.contains_value(&s("apple")), "No sweep is needed to hide it");
  assert!(!map.contains_key(&1));
}

#[test]
fn test_sync_clear_expired_only_removes_expired() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  map.insert(2, s("pear"));
  clock.set(1_600);
  map.insert(3, s("plum"));

  clock.set(2_000);
  assert_eq!(map.clear_expired(), 2);
  assert_eq!(map.get(&3), Some(&s("plum")));
  assert_eq!(map.metrics().evicted_by_ttl, 2);

  // Nothing changed, so a second sweep is a no-op.
  assert_eq!(map.clear_expired(), 0);
  assert_eq!(map.len(), 1);
  assert_eq!(map.metrics().evicted_by_ttl, 2);
}

#[test]
fn test_sync_clear_after_expiry() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  clock.set(1_900);
  map.insert(2, s("pear"));
  clock.set(2_500);

  map.clear();
  assert_eq!(map.len(), 0);
  assert!(map.is_empty());
  assert_eq!(map.clear_expired(), 0);
}

#[test]
fn test_sync_ttl_change_applies_to_existing_entries() {
  let (mut map, clock) = build_test_map(1_000);
  map.insert(1, s("apple"));
  assert_eq!(map.time_to_live(), Some(TTL));

  // Shortening the TTL expires the entry without any sweep.
  clock.set(1_400);
  map.set_time_to_live(Duration::from_millis(300));
  assert!(map.get(&1).is_none());
  assert_eq!(map.len(), 0);

  // Lengthening it again revives the unreclaimed entry.
  map.set_time_to_live(Duration::from_millis(2_000));
  assert_eq!(map.get(&1), Some(&s("apple")));
  assert_eq!(map.time_to_live(), Some(Duration::from_millis(2_000)));

  map.clear_time_to_live();
  clock.set(u64::MAX / 2);
  assert_eq!(map.get(&1), Some(&s("apple")));
}

#[test]
fn test_sync_no_ttl_means_no_expiry() {
  let clock = ManualClock::starting_at(0);
  let mut map = ExpiringMapBuilder::<i32, String>::new()
    .clock(clock.clone())
    .build()
    .unwrap();
  map.insert(1, s("apple"));

  clock.set(u64::MAX);
  assert_eq!(map.get(&1), Some(&s("apple")));
  assert_eq!(map.clear_expired(), 0);
}

#[test]
fn test_sync_clock_moving_backwards() {
  let (mut map, clock) = build_test_map(5_000);
  map.insert(1, s("late"));
  clock.set(1_000);
  map.insert(2, s("early"));

  // Entry 2 expires first even though it was written last.
  clock.set(2_000);
  assert!(map.get(&2).is_none());
  assert_eq!(map.get(&1), Some(&s("late")));
  assert_eq!(map.len(), 1);
  assert_eq!(map.clear_expired(), 1);
  assert_eq!(map.get(&1), Some(&s("late")));
}

#[test]
fn test_sync_iteration_skips_expired_entries() {
  let (mut map, clock) = build_test_map(0);
  map.insert(1, s("apple"));
  clock.set(600);
  map.insert(2, s("orange"));
  clock.set(1_200);

  let live: Vec<(i32, String)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
  assert_eq!(live, vec![(2, s("orange"))]);
  assert_eq!(map.iter().rev().count(), 1);
  assert_eq!(format!("{map:?}"), r#"{2: "orange"}"#);
}

#[test]
fn test_sync_reads_do_not_reclaim() {
  let (mut map, clock) = build_test_map(0);
  map.insert(1, s("apple"));
  clock.set(5_000);

  assert!(map.get(&1).is_none());
  assert!(!map.contains_key(&1));
  assert_eq!(map.metrics().evicted_by_ttl, 0);

  assert_eq!(map.clear_expired(), 1);
  assert_eq!(map.metrics().evicted_by_ttl, 1);
}

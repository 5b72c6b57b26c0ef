use fibre_expiring_map::builder::DEFAULT_LOAD_FACTOR;
use fibre_expiring_map::{ExpiringMap, ExpiringMapBuilder, ManualClock};
use std::time::Duration;

#[test]
fn test_default_map_has_no_ttl() {
  let mut map: ExpiringMap<i32, i32> = ExpiringMap::default();
  assert_eq!(map.time_to_live(), None);

  map.insert(1, 1);
  assert_eq!(map.get(&1), Some(&1));
  assert_eq!(map.clear_expired(), 0);
}

#[test]
fn test_builder_and_new_agree() {
  let built = ExpiringMap::<i32, i32>::builder().build().unwrap();
  let plain = ExpiringMap::<i32, i32>::new();
  assert_eq!(built.bucket_count(), plain.bucket_count());
  assert_eq!(built.time_to_live(), plain.time_to_live());
}

#[test]
fn test_builder_debug_output() {
  let builder = ExpiringMapBuilder::<i32, i32>::new()
    .time_to_live(Duration::from_secs(5))
    .clock(ManualClock::new());
  let rendered = format!("{builder:?}");
  assert!(rendered.contains("time_to_live: Some(5s)"));
  assert!(rendered.contains("has_custom_clock: true"));
  assert!(rendered.contains(&format!("load_factor: {DEFAULT_LOAD_FACTOR}")));
}

#[test]
fn test_high_load_factor_keeps_working() {
  let mut map = ExpiringMapBuilder::<i32, i32>::new()
    .load_factor(8.0)
    .build()
    .unwrap();
  let initial = map.bucket_count();
  for key in 0..(initial as i32 * 8) {
    map.insert(key, key);
  }
  assert_eq!(map.bucket_count(), initial, "Chains absorb load up to the factor");
  assert_eq!(map.len(), initial * 8);
  for key in 0..(initial as i32 * 8) {
    assert_eq!(map.get(&key), Some(&key));
  }
}

#[test]
fn test_builder_ignores_sweep_interval_for_plain_maps() {
  let map = ExpiringMapBuilder::<i32, i32>::new()
    .sweep_interval(Duration::from_millis(10))
    .build();
  assert!(map.is_ok());
}

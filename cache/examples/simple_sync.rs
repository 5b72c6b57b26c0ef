use fibre_expiring_map::ExpiringMapBuilder;
use std::thread;
use std::time::Duration;

fn slow_square(n: u64) -> u64 {
  thread::sleep(Duration::from_millis(200));
  n * n
}

fn main() {
  // Memoize an expensive computation for 1 second.
  let mut memo = ExpiringMapBuilder::<u64, u64>::new()
    .time_to_live(Duration::from_secs(1))
    .build()
    .expect("Failed to build map");

  for round in 0..3 {
    let value = match memo.get(&12) {
      Some(value) => {
        println!("round {round}: cached 12^2 = {value}");
        *value
      }
      None => {
        let value = slow_square(12);
        println!("round {round}: computed 12^2 = {value}");
        memo.insert(12, value);
        value
      }
    };
    assert_eq!(value, 144);
  }

  println!("\nWaiting for the memoized value to expire...");
  thread::sleep(Duration::from_millis(1_100));

  match memo.get(&12) {
    Some(value) => println!("Still cached: {value}"),
    None => println!("Entry expired (as expected after TTL)."),
  }
  println!("Entries reclaimed by sweep: {}", memo.clear_expired());

  println!("\nMap metrics: {:#?}", memo.metrics());
}

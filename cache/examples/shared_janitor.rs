use fibre_expiring_map::ExpiringMapBuilder;
use std::thread;
use std::time::Duration;

fn main() {
  // A thread-safe map whose expired entries are swept every 250ms.
  let sessions = ExpiringMapBuilder::<String, u32>::new()
    .time_to_live(Duration::from_millis(500))
    .sweep_interval(Duration::from_millis(250))
    .build_shared()
    .expect("Failed to build shared map");

  let writers: Vec<_> = (0..4)
    .map(|worker| {
      let sessions = sessions.clone();
      thread::spawn(move || {
        for i in 0..10 {
          sessions.insert(format!("worker-{worker}-session-{i}"), worker);
        }
      })
    })
    .collect();
  for writer in writers {
    writer.join().expect("writer thread panicked");
  }

  println!("Live sessions: {}", sessions.len());

  thread::sleep(Duration::from_secs(1));
  println!("Live sessions after TTL: {}", sessions.len());
  println!("\nMap metrics: {:#?}", sessions.metrics());
}

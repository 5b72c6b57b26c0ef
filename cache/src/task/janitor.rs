use crate::map::ExpiringMap;

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A background thread that periodically sweeps expired entries out of a
/// shared map.
///
/// The thread only holds a weak reference to the map, so it never keeps the
/// map alive; it exits on its own once the map is gone. Dropping the
/// `Janitor` stops the thread and waits for it to finish.
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  stop_flag: Arc<AtomicBool>,
}

impl Janitor {
  /// Spawns a new janitor thread sweeping every `tick_interval`.
  pub(crate) fn spawn<K, V, H>(
    map: Weak<RwLock<ExpiringMap<K, V, H>>>,
    tick_interval: Duration,
  ) -> Self
  where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: Send + Sync + 'static,
  {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_clone = stop_flag.clone();

    let handle = thread::spawn(move || {
      tracing::debug!(?tick_interval, "expiring map janitor started");
      let mut next_tick = Instant::now() + tick_interval;

      while !stop_clone.load(Ordering::Acquire) {
        // Parking lets `stop` cut the wait short.
        let now = Instant::now();
        if now < next_tick {
          thread::park_timeout(next_tick - now);
          continue;
        }
        next_tick = now + tick_interval;

        let Some(shared) = map.upgrade() else {
          break;
        };
        let removed = shared.write().clear_expired();
        drop(shared);

        if removed > 0 {
          tracing::trace!(removed, "janitor swept expired entries");
        }
      }

      tracing::debug!("expiring map janitor stopped");
    });

    Self {
      handle: Some(handle),
      stop_flag,
    }
  }

  /// Signals the thread to stop and waits for it to exit.
  pub(crate) fn stop(&mut self) {
    if let Some(handle) = self.handle.take() {
      self.stop_flag.store(true, Ordering::Release);
      handle.thread().unpark();
      if handle.join().is_err() {
        tracing::error!("expiring map janitor panicked");
      }
    }
  }
}

impl Drop for Janitor {
  fn drop(&mut self) {
    self.stop();
  }
}

//! Deserializable configuration for building maps from external settings.
//!
//! Durations are written in `humantime` notation, e.g. `"30s"`,
//! `"1m 30s"` or `"250ms"`.
//!
//! ```
//! # use fibre_expiring_map::config::ExpiringMapConfig;
//! # use fibre_expiring_map::ExpiringMapBuilder;
//! # use std::time::Duration;
//! let config = ExpiringMapConfig {
//!   time_to_live: Some(Duration::from_secs(60)),
//!   ..Default::default()
//! };
//! let map = ExpiringMapBuilder::<u64, String>::from_config(&config).build().unwrap();
//! assert_eq!(map.time_to_live(), Some(Duration::from_secs(60)));
//! ```

use crate::builder::{ExpiringMapBuilder, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::hash::BuildHasher;
use std::time::Duration;

/// Settings for an expiring map. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpiringMapConfig {
  /// Entry lifetime; absent means entries never expire.
  #[serde(default, deserialize_with = "optional_duration")]
  pub time_to_live: Option<Duration>,
  #[serde(default = "default_initial_capacity")]
  pub initial_capacity: usize,
  #[serde(default = "default_load_factor")]
  pub load_factor: f64,
  /// Background sweep period for shared maps.
  #[serde(default, deserialize_with = "optional_duration")]
  pub sweep_interval: Option<Duration>,
}

fn default_initial_capacity() -> usize {
  DEFAULT_INITIAL_CAPACITY
}

fn default_load_factor() -> f64 {
  DEFAULT_LOAD_FACTOR
}

fn optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  raw
    .map(|text| {
      humantime::parse_duration(&text)
        .map_err(|e| D::Error::custom(format!("invalid duration '{text}': {e}")))
    })
    .transpose()
}

impl Default for ExpiringMapConfig {
  fn default() -> Self {
    Self {
      time_to_live: None,
      initial_capacity: default_initial_capacity(),
      load_factor: default_load_factor(),
      sweep_interval: None,
    }
  }
}

impl<K, V, H: BuildHasher + Default> ExpiringMapBuilder<K, V, H> {
  /// Creates a builder pre-populated from `config`.
  ///
  /// Values are validated when the map is built.
  pub fn from_config(config: &ExpiringMapConfig) -> Self {
    let mut builder = Self::new()
      .initial_capacity(config.initial_capacity)
      .load_factor(config.load_factor);
    if let Some(ttl) = config.time_to_live {
      builder = builder.time_to_live(ttl);
    }
    if let Some(interval) = config.sweep_interval {
      builder = builder.sweep_interval(interval);
    }
    builder
  }
}

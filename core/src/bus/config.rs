//! Configuration for bus construction

use tokio::runtime::Handle;

use crate::routing::CacheStrategy;

/// Registry-level performance and behavior settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSettings {
	/// How resolved topics are memoised between publishes
	pub topic_cache: CacheStrategy,
	/// Subscriber slots reserved up front
	pub initial_capacity: usize,
}

impl Default for BusSettings {
	fn default() -> Self {
		Self {
			topic_cache: CacheStrategy::default(),
			initial_capacity: 4,
		}
	}
}

impl BusSettings {
	/// Settings with an LRU cache of `capacity` topics (`0` disables caching)
	pub fn with_cache_capacity(capacity: usize) -> Self {
		Self {
			topic_cache: CacheStrategy::new(capacity),
			..Self::default()
		}
	}
}

/// Configuration for bus creation
#[derive(Debug, Clone, Default)]
pub struct BusConfig {
	/// Registry-level settings
	pub settings: BusSettings,
	/// Runtime handlers are spawned on; the ambient one when unset
	pub runtime: Option<Handle>,
}

impl BusConfig {
	/// Create config with default settings
	pub fn new() -> Self {
		Self::default()
	}

	/// Pin handler execution to `runtime`.
	///
	/// Required when publishing from threads that are not inside a tokio
	/// runtime context.
	pub fn with_runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);
		self
	}

	/// Replace the registry-level settings
	pub fn with_settings(mut self, settings: BusSettings) -> Self {
		self.settings = settings;
		self
	}
}

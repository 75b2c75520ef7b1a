//! Topic resolution cache.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use arcstr::ArcStr;
use lru::LruCache;

use super::subscriber::{SubscriberEntry, SubscriberId};

/// How resolved topics are memoised by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
	/// Keep at most this many topics, evicting the least recently published
	Lru(NonZeroUsize),
	/// Keep every topic ever resolved until the next registry mutation
	Unbounded,
	/// Resolve every publish from scratch
	NoCache,
}

impl CacheStrategy {
	/// Default number of topics kept by [`CacheStrategy::Lru`]
	pub const DEFAULT_CAPACITY: usize = 1024;

	/// LRU strategy with `capacity` entries, `NoCache` when zero
	pub fn new(capacity: usize) -> Self {
		NonZeroUsize::new(capacity).map_or(Self::NoCache, Self::Lru)
	}
}

impl Default for CacheStrategy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}

/// Ordered set of subscribers whose pattern matches one concrete topic.
///
/// Cheap to clone: the subscriber list is shared with the cache.
pub struct Resolution<T> {
	topic: ArcStr,
	subscribers: Arc<[Arc<SubscriberEntry<T>>]>,
}

impl<T> Resolution<T> {
	pub(crate) fn new(
		topic: ArcStr,
		subscribers: Arc<[Arc<SubscriberEntry<T>>]>,
	) -> Self {
		Self { topic, subscribers }
	}

	pub(crate) fn empty(topic: ArcStr) -> Self {
		Self::new(topic, Arc::from(Vec::new()))
	}

	/// Topic this resolution was computed for
	pub fn topic(&self) -> &ArcStr {
		&self.topic
	}

	/// Number of matching subscribers
	pub fn len(&self) -> usize {
		self.subscribers.len()
	}

	/// True when no subscriber matched
	pub fn is_empty(&self) -> bool {
		self.subscribers.is_empty()
	}

	/// Ids of the matching subscribers, in pattern order
	pub fn subscriber_ids(&self) -> impl Iterator<Item = SubscriberId> + '_ {
		self.subscribers.iter().map(|entry| entry.id)
	}

	pub(crate) fn entries(&self) -> &[Arc<SubscriberEntry<T>>] {
		&self.subscribers
	}

	/// True if both resolutions share the same cached subscriber list
	pub fn shares_entries_with(&self, other: &Resolution<T>) -> bool {
		Arc::ptr_eq(&self.subscribers, &other.subscribers)
	}
}

impl<T> Clone for Resolution<T> {
	fn clone(&self) -> Self {
		Self {
			topic: self.topic.clone(),
			subscribers: Arc::clone(&self.subscribers),
		}
	}
}

impl<T> fmt::Debug for Resolution<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolution")
			.field("topic", &self.topic)
			.field("subscribers", &self.subscriber_ids().collect::<Vec<_>>())
			.finish()
	}
}

/// Storage behind a [`CacheStrategy`].
pub(crate) enum ResolutionCache<T> {
	Lru(LruCache<ArcStr, Resolution<T>>),
	Disabled,
}

impl<T> ResolutionCache<T> {
	pub(crate) fn new(strategy: CacheStrategy) -> Self {
		match strategy {
			| CacheStrategy::Lru(capacity) => Self::Lru(LruCache::new(capacity)),
			| CacheStrategy::Unbounded => Self::Lru(LruCache::unbounded()),
			| CacheStrategy::NoCache => Self::Disabled,
		}
	}

	pub(crate) fn get(&mut self, topic: &str) -> Option<Resolution<T>> {
		match self {
			| Self::Lru(cache) => cache.get(topic).cloned(),
			| Self::Disabled => None,
		}
	}

	pub(crate) fn insert(&mut self, resolution: Resolution<T>) {
		if let Self::Lru(cache) = self {
			cache.put(resolution.topic.clone(), resolution);
		}
	}

	pub(crate) fn clear(&mut self) {
		if let Self::Lru(cache) = self {
			cache.clear();
		}
	}

	pub(crate) fn len(&self) -> usize {
		match self {
			| Self::Lru(cache) => cache.len(),
			| Self::Disabled => 0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cache_strategy_new() {
		assert_eq!(CacheStrategy::new(0), CacheStrategy::NoCache);
		match CacheStrategy::new(50) {
			| CacheStrategy::Lru(size) => assert_eq!(size.get(), 50),
			| other => panic!("Expected LRU cache strategy, got {other:?}"),
		}
		assert_eq!(
			CacheStrategy::default(),
			CacheStrategy::new(CacheStrategy::DEFAULT_CAPACITY)
		);
	}

	#[test]
	fn test_lru_evicts_least_recent_topic() {
		let mut cache =
			ResolutionCache::<()>::new(CacheStrategy::new(2));
		cache.insert(Resolution::empty(ArcStr::from("a")));
		cache.insert(Resolution::empty(ArcStr::from("b")));
		assert!(cache.get("a").is_some());
		cache.insert(Resolution::empty(ArcStr::from("c")));

		assert_eq!(cache.len(), 2);
		assert!(cache.get("b").is_none());
		assert!(cache.get("a").is_some());
		assert!(cache.get("c").is_some());
	}

	#[test]
	fn test_disabled_cache_stores_nothing() {
		let mut cache = ResolutionCache::<()>::new(CacheStrategy::NoCache);
		cache.insert(Resolution::empty(ArcStr::from("a")));
		assert_eq!(cache.len(), 0);
		assert!(cache.get("a").is_none());
	}

	#[test]
	fn test_clear() {
		let mut cache = ResolutionCache::<()>::new(CacheStrategy::Unbounded);
		for topic in ["a", "b", "c"] {
			cache.insert(Resolution::empty(ArcStr::from(topic)));
		}
		assert_eq!(cache.len(), 3);
		cache.clear();
		assert_eq!(cache.len(), 0);
	}
}

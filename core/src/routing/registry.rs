//! # Subscriber registry with cached topic resolution.
//!
//! [`SubscriberRegistry`] owns every registration of a bus. Patterns and
//! subscriber records live in two arrays kept in lockstep and sorted by
//! pattern, so subscribers sharing a pattern are adjacent (in insertion
//! order) and each distinct pattern is matched once per resolution.
//!
//! ## Locking
//! ```text
//! subscribe / unsubscribe / close          resolve(topic)
//!            │                                   │
//!            ▼                                   ├──► cache hit ─► return
//!     state.write() ──► cache.clear()            ▼
//!                                          state.read()
//!                                                ├──► scan patterns
//!                                                ├──► match_sizes.lock()
//!                                                └──► cache.lock().insert()
//! ```
//! A cache entry is only ever inserted while the read lock is held, and
//! writers clear the cache while holding the write lock. An entry therefore
//! never outlives the registry state it was computed from, and a cache hit
//! needs no registry lock at all.

use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::cache::{CacheStrategy, Resolution, ResolutionCache};
use super::subscriber::{Subscriber, SubscriberEntry, SubscriberId};
use super::value_counter::ValueCounter;
use crate::bus::Handler;
use crate::pattern;

struct RegistryState<T> {
	/// Sorted; `patterns[i]` is the pattern of `subscribers[i]`
	patterns: Vec<ArcStr>,
	subscribers: Vec<Arc<SubscriberEntry<T>>>,
	closed: bool,
}

/// Ordered collection of (pattern, handler) registrations.
pub struct SubscriberRegistry<T> {
	state: RwLock<RegistryState<T>>,
	cache: Mutex<ResolutionCache<T>>,
	/// Histogram of resolution sizes, used to pre-size the next one
	match_sizes: Mutex<ValueCounter>,
}

impl<T> Default for SubscriberRegistry<T> {
	fn default() -> Self {
		Self::new(CacheStrategy::default(), 4)
	}
}

impl<T> SubscriberRegistry<T> {
	/// Empty registry with room for `initial_capacity` subscribers
	pub fn new(cache_strategy: CacheStrategy, initial_capacity: usize) -> Self {
		Self {
			state: RwLock::new(RegistryState {
				patterns: Vec::with_capacity(initial_capacity),
				subscribers: Vec::with_capacity(initial_capacity),
				closed: false,
			}),
			cache: Mutex::new(ResolutionCache::new(cache_strategy)),
			match_sizes: Mutex::new(ValueCounter::new()),
		}
	}

	/// Registers `handler` under the normalised form of `pattern`.
	///
	/// The new subscriber is placed after every existing subscriber with an
	/// equal pattern. On a closed registry the returned handle is inert.
	pub fn subscribe(&self, pattern: &str, handler: Handler<T>) -> Subscriber {
		let pattern = ArcStr::from(pattern::normalize(pattern));

		let mut state = self.state.write();
		if state.closed {
			warn!(pattern = %pattern, "Subscribe on closed registry ignored");
			return Subscriber::new(SubscriberId::INERT, pattern);
		}
		let id = SubscriberId::next();

		let index = state
			.patterns
			.partition_point(|existing| existing.as_str() <= pattern.as_str());
		state.patterns.insert(index, pattern.clone());
		state.subscribers.insert(
			index,
			Arc::new(SubscriberEntry {
				id,
				pattern: pattern.clone(),
				handler,
			}),
		);
		self.cache.lock().clear();

		debug!(
			subscriber_id = %id,
			pattern = %pattern,
			total = state.subscribers.len(),
			"Subscriber added"
		);
		Subscriber::new(id, pattern)
	}

	/// Removes the registration behind `subscriber`.
	///
	/// The lookup narrows to the run of the handle's pattern before scanning
	/// for its id, which relies on [`Subscriber::pattern`] being the exact
	/// normalised pattern this registry stored. Returns false if it is
	/// unknown, e.g. already removed.
	pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
		let mut state = self.state.write();

		let pattern = subscriber.pattern();
		let start = state
			.patterns
			.partition_point(|existing| existing.as_str() < pattern);
		let found = state.patterns[start ..]
			.iter()
			.take_while(|existing| existing.as_str() == pattern)
			.zip(&state.subscribers[start ..])
			.position(|(_, entry)| entry.id == subscriber.id());

		let Some(offset) = found else {
			debug!(
				subscriber_id = %subscriber.id(),
				pattern = %pattern,
				"Unsubscribe of unknown subscriber"
			);
			return false;
		};

		let index = start + offset;
		let removed_pattern = state.patterns.remove(index);
		let removed = state.subscribers.remove(index);
		if removed.pattern != removed_pattern || removed.id != subscriber.id() {
			panic!(
				"BUG: registry arrays out of sync at index {index}: pattern \
				 '{removed_pattern}' holds {} with pattern '{}'",
				removed.id, removed.pattern
			);
		}
		self.cache.lock().clear();

		debug!(
			subscriber_id = %removed.id,
			pattern = %removed.pattern,
			total = state.subscribers.len(),
			"Subscriber removed"
		);
		true
	}

	/// Resolves the ordered set of subscribers whose pattern matches `topic`.
	pub fn resolve(&self, topic: &str) -> Resolution<T> {
		if let Some(cached) = self.cache.lock().get(topic) {
			trace!(topic = %topic, matched = cached.len(), "Resolution cache hit");
			return cached;
		}

		let state = self.state.read();
		let topic = ArcStr::from(topic);
		if state.closed {
			return Resolution::empty(topic);
		}

		let expected = self.match_sizes.lock().most_common().unwrap_or(0) + 1;
		let mut matched = Vec::with_capacity(expected);

		let patterns = &state.patterns;
		let mut run_start = 0;
		while run_start < patterns.len() {
			let current = &patterns[run_start];
			let run_len = patterns[run_start ..]
				.iter()
				.take_while(|other| *other == current)
				.count();
			let run_end = run_start + run_len;
			// Equal patterns share one verdict.
			if pattern::matches(current, &topic) {
				matched.extend(
					state.subscribers[run_start .. run_end].iter().cloned(),
				);
			}
			run_start = run_end;
		}

		self.match_sizes.lock().increment_for(matched.len());
		trace!(
			topic = %topic,
			matched = matched.len(),
			expected,
			"Resolution cache miss"
		);

		let resolution = Resolution::new(topic, Arc::from(matched));
		self.cache.lock().insert(resolution.clone());
		resolution
	}

	/// Current number of registrations
	pub fn total_subscribers(&self) -> usize {
		self.state.read().subscribers.len()
	}

	/// Snapshot of the stored (normalised, sorted) patterns
	pub fn patterns(&self) -> Vec<ArcStr> {
		self.state.read().patterns.clone()
	}

	/// Number of topics currently held by the resolution cache
	pub fn cached_topics(&self) -> usize {
		self.cache.lock().len()
	}

	/// Snapshot of the resolution-size histogram
	pub fn match_sizes(&self) -> ValueCounter {
		self.match_sizes.lock().clone()
	}

	/// Drops every registration and the cache; the registry stays inert.
	///
	/// Returns false if it was already closed.
	pub fn close(&self) -> bool {
		let mut state = self.state.write();
		if state.closed {
			return false;
		}
		state.closed = true;
		state.patterns.clear();
		state.subscribers.clear();
		self.cache.lock().clear();
		true
	}

	/// True once [`SubscriberRegistry::close`] has run
	pub fn is_closed(&self) -> bool {
		self.state.read().closed
	}
}

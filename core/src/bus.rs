//! # Publish/subscribe entry point
//!
//! [`Bus`] glues the subscriber registry to the runtime: `publish` validates
//! the topic, resolves the matching subscribers and schedules one
//! independent unit of work per subscriber, returning a [`Completion`] that
//! is satisfied once every invocation has signalled done.
//!
//! ```text
//! publish(topic, data)
//!     │
//!     ├──► validate_topic ──► Err(BusError::Topic)
//!     ├──► registry.resolve(topic)
//!     │        ├──► matches  ──► one Event per subscriber ──► spawn / inline
//!     │        └──► no match ──► unhandled sink? ──► spawn / drop
//!     └──► Completion
//! ```
//!
//! [`Bus::publish_sync`] takes the same route but runs every handler on the
//! calling thread, in registry order, before returning. Channel subscribers
//! ([`Bus::subscribe_channel`]) are inline handlers that forward each event
//! into an unbounded tokio channel.

pub mod completion;
pub mod config;
/// Bus error types
pub mod error;
/// Per-invocation event records
pub mod event;
pub mod handler;


use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub use completion::Completion;
pub use config::{BusConfig, BusSettings};
pub use error::{BusError, BusResult};
pub use event::Event;
pub use handler::{Handler, HandlerSet};

use completion::CompletionState;
use crate::pattern::validation::validate_topic;
use crate::routing::{Subscriber, SubscriberRegistry};

/// Payload type of an [`UntypedBus`]
pub type AnyPayload = Box<dyn Any + Send + Sync>;

/// Bus carrying payloads of arbitrary type, downcast by the handlers
pub type UntypedBus = Bus<AnyPayload>;

struct BusInner<T> {
	registry: SubscriberRegistry<T>,
	unhandled: RwLock<Option<Handler<T>>>,
	runtime: Option<Handle>,
}

/// In-process event bus routing payloads of type `T` by wildcard topic.
///
/// Cloning is cheap; clones share subscribers and lifecycle.
pub struct Bus<T> {
	inner: Arc<BusInner<T>>,
}

impl<T> Clone for Bus<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Send + Sync + 'static> Default for Bus<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Send + Sync + 'static> Bus<T> {
	/// Bus with default settings, dispatching on the ambient runtime
	pub fn new() -> Self {
		Self::with_config(BusConfig::default())
	}

	/// Bus built from explicit settings and, optionally, a runtime
	pub fn with_config(config: BusConfig) -> Self {
		let BusConfig { settings, runtime } = config;
		Self {
			inner: Arc::new(BusInner {
				registry: SubscriberRegistry::new(
					settings.topic_cache,
					settings.initial_capacity,
				),
				unhandled: RwLock::new(None),
				runtime,
			}),
		}
	}

	/// Subscribes an async handler to every topic matching `pattern`.
	///
	/// `pattern` may contain `*` (any run of characters, possibly empty) and
	/// `?` (at most one character).
	pub fn subscribe<F, Fut>(&self, pattern: &str, handler: F) -> Subscriber
	where
		F: Fn(Event<T>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.subscribe_handler(pattern, Handler::from_async(handler))
	}

	/// Subscribes a synchronous handler, run on the blocking pool.
	pub fn subscribe_blocking<F>(&self, pattern: &str, handler: F) -> Subscriber
	where
		F: Fn(Event<T>) + Send + Sync + 'static,
	{
		self.subscribe_handler(pattern, Handler::blocking(handler))
	}

	/// Subscribes a fresh unbounded channel to every topic matching
	/// `pattern`.
	///
	/// Events are queued on the publishing thread in publish order and count
	/// as done once queued; calling [`Event::done`] on a received event has no
	/// further effect. Use [`Bus::subscribe_sender`] to feed more patterns
	/// into the same channel. The receiver yields `None` once every
	/// subscription feeding it is gone.
	pub fn subscribe_channel(
		&self,
		pattern: &str,
	) -> (Subscriber, mpsc::UnboundedReceiver<Event<T>>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(self.subscribe_sender(pattern, sender), receiver)
	}

	/// Forwards every event matching `pattern` into `sender`.
	pub fn subscribe_sender(
		&self,
		pattern: &str,
		sender: mpsc::UnboundedSender<Event<T>>,
	) -> Subscriber {
		self.subscribe_handler(
			pattern,
			Handler::inline(move |event: Event<T>| {
				if let Err(mpsc::error::SendError(event)) = sender.send(event) {
					trace!(
						topic = %event.topic(),
						"Channel receiver gone, event dropped"
					);
				}
			}),
		)
	}

	/// Subscribes an already wrapped [`Handler`]
	pub fn subscribe_handler(
		&self,
		pattern: &str,
		handler: Handler<T>,
	) -> Subscriber {
		self.inner.registry.subscribe(pattern, handler)
	}

	/// Subscribes every handler of `set`
	pub fn subscribe_set<H>(&self, set: Arc<H>) -> Vec<Subscriber>
	where
		H: HandlerSet<T> + ?Sized,
	{
		set.subscribe_to(self)
	}

	/// Removes a subscription. Returns false if it was already gone.
	pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
		self.inner.registry.unsubscribe(subscriber)
	}

	/// Publishes `data` on the concrete `topic`.
	///
	/// Every matching handler is scheduled before this returns; none has
	/// necessarily run yet. With no match the event goes to the unhandled
	/// sink if one is installed, otherwise it is dropped and the returned
	/// completion is already satisfied.
	///
	/// # Errors
	/// - [`BusError::Topic`] if `topic` contains a wildcard marker
	/// - [`BusError::NoRuntime`] if a non-inline handler must be spawned but
	///   no runtime is configured or ambient
	pub fn publish(&self, topic: &str, data: T) -> BusResult<Completion> {
		validate_topic(topic)?;

		let resolution = self.inner.registry.resolve(topic);
		if resolution.is_empty() {
			return self.publish_unhandled(resolution.topic().clone(), data);
		}

		let needs_runtime = resolution
			.entries()
			.iter()
			.any(|entry| !entry.handler.is_inline());
		let runtime = if needs_runtime {
			Some(self.runtime(topic)?)
		} else {
			None
		};
		let state = CompletionState::new(resolution.len());
		let data = Arc::new(data);
		for entry in resolution.entries() {
			let event = Event::new(
				resolution.topic().clone(),
				Arc::clone(&data),
				Arc::clone(&state),
			);
			entry.handler.dispatch(runtime.as_ref(), event, Some(entry.id));
		}

		trace!(topic = %topic, dispatched = resolution.len(), "Event published");
		Ok(Completion::new(state))
	}

	/// Publishes `data` on the concrete `topic`, running every matching
	/// handler on the calling thread before returning.
	///
	/// Handlers run one after another in registry order, which is sorted by
	/// pattern and by subscription order among equal patterns. Async
	/// handlers are driven by a local executor and must not rely on tokio
	/// timers or IO. No runtime is needed. The unhandled sink, if any, is
	/// run the same way. A panicking handler is logged and the remaining
	/// handlers still run.
	///
	/// # Errors
	/// - [`BusError::Topic`] if `topic` contains a wildcard marker
	pub fn publish_sync(&self, topic: &str, data: T) -> BusResult<()> {
		validate_topic(topic)?;

		let resolution = self.inner.registry.resolve(topic);
		let data = Arc::new(data);
		if resolution.is_empty() {
			let Some(sink) = self.inner.unhandled.read().clone() else {
				debug!(topic = %topic, "No subscribers, event dropped");
				return Ok(());
			};
			let state = CompletionState::new(1);
			let event = Event::new(resolution.topic().clone(), data, state);
			sink.run_inline(event, None);
			return Ok(());
		}

		let state = CompletionState::new(resolution.len());
		for entry in resolution.entries() {
			let event = Event::new(
				resolution.topic().clone(),
				Arc::clone(&data),
				Arc::clone(&state),
			);
			entry.handler.run_inline(event, Some(entry.id));
		}

		trace!(
			topic = %topic,
			delivered = resolution.len(),
			"Event delivered inline"
		);
		Ok(())
	}

	/// Publishes and waits until every dispatched handler signalled done.
	pub async fn publish_and_wait(&self, topic: &str, data: T) -> BusResult<()> {
		self.publish(topic, data)?.wait().await;
		Ok(())
	}

	/// Installs (`Some`) or clears (`None`) the consumer of events that
	/// matched no subscriber.
	pub fn set_unhandled_sink(&self, sink: Option<Handler<T>>) {
		let mut unhandled = self.inner.unhandled.write();
		// Checked under the sink lock so a racing close cannot be undone.
		if sink.is_some() && self.is_closed() {
			warn!("Unhandled sink on closed bus ignored");
			return;
		}
		*unhandled = sink;
	}

	/// Current number of subscriptions
	pub fn total_subscribers(&self) -> usize {
		self.inner.registry.total_subscribers()
	}

	/// Underlying registry, for inspection
	pub fn registry(&self) -> &SubscriberRegistry<T> {
		&self.inner.registry
	}

	/// Drops every subscription and the unhandled sink.
	///
	/// The bus stays usable but inert: publishes resolve to nothing and
	/// subscribes are ignored. Calling it again has no effect.
	pub fn close(&self) {
		if self.inner.registry.close() {
			*self.inner.unhandled.write() = None;
			info!("Bus closed");
		}
	}

	/// True once [`Bus::close`] has run
	pub fn is_closed(&self) -> bool {
		self.inner.registry.is_closed()
	}

	fn publish_unhandled(
		&self,
		topic: ArcStr,
		data: T,
	) -> BusResult<Completion> {
		let Some(sink) = self.inner.unhandled.read().clone() else {
			debug!(topic = %topic, "No subscribers, event dropped");
			return Ok(Completion::finished());
		};

		let runtime = if sink.is_inline() {
			None
		} else {
			Some(self.runtime(&topic)?)
		};
		let state = CompletionState::new(1);
		let event = Event::new(topic, Arc::new(data), Arc::clone(&state));
		trace!(topic = %event.topic(), "No subscribers, routing to unhandled sink");
		sink.dispatch(runtime.as_ref(), event, None);
		Ok(Completion::new(state))
	}

	fn runtime(&self, topic: &str) -> BusResult<Handle> {
		self.inner
			.runtime
			.clone()
			.or_else(|| Handle::try_current().ok())
			.ok_or_else(|| BusError::no_runtime(topic))
	}
}

impl<T> fmt::Debug for Bus<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Bus")
			.field("subscribers", &self.inner.registry.total_subscribers())
			.field("closed", &self.inner.registry.is_closed())
			.field("unhandled_sink", &self.inner.unhandled.read().is_some())
			.finish()
	}
}

//! Handler callbacks and their dispatch onto the runtime.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use futures::executor;
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::{error, trace};

use super::{Bus, Event};
use crate::routing::{Subscriber, SubscriberId};

type AsyncFn<T> = dyn Fn(Event<T>) -> BoxFuture<'static, ()> + Send + Sync;
type BlockingFn<T> = dyn Fn(Event<T>) + Send + Sync;

enum HandlerKind<T> {
	/// Spawned as a task on the runtime
	Async(Arc<AsyncFn<T>>),
	/// Run on the runtime's blocking pool
	Blocking(Arc<BlockingFn<T>>),
	/// Run on the publishing thread before `publish` returns
	Inline(Arc<BlockingFn<T>>),
}

/// Callback invoked with every event whose topic matches a subscription.
pub struct Handler<T> {
	kind: HandlerKind<T>,
}

impl<T: Send + Sync + 'static> Handler<T> {
	/// Wraps an async callback; each invocation becomes its own task.
	pub fn from_async<F, Fut>(handler: F) -> Self
	where
		F: Fn(Event<T>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		Self {
			kind: HandlerKind::Async(Arc::new(
				move |event: Event<T>| -> BoxFuture<'static, ()> {
					handler(event).boxed()
				},
			)),
		}
	}

	/// Wraps a synchronous callback that may block.
	pub fn blocking<F>(handler: F) -> Self
	where
		F: Fn(Event<T>) + Send + Sync + 'static,
	{
		Self {
			kind: HandlerKind::Blocking(Arc::new(handler)),
		}
	}

	/// Wraps a short, non-blocking callback run on the publishing thread.
	///
	/// Inline handlers need no runtime and see events in publish order.
	/// A slow inline handler stalls the publisher.
	pub fn inline<F>(handler: F) -> Self
	where
		F: Fn(Event<T>) + Send + Sync + 'static,
	{
		Self {
			kind: HandlerKind::Inline(Arc::new(handler)),
		}
	}

	/// True for handlers that run on the blocking pool
	pub fn is_blocking(&self) -> bool {
		matches!(self.kind, HandlerKind::Blocking(_))
	}

	/// True for handlers that run on the publishing thread
	pub fn is_inline(&self) -> bool {
		matches!(self.kind, HandlerKind::Inline(_))
	}

	/// Schedules one invocation with `event`.
	///
	/// Inline handlers run right away; the others are spawned on `runtime`,
	/// which the caller resolves whenever a non-inline handler is involved.
	/// The event is marked done when the invocation finishes, panics, or is
	/// dropped unrun by a shutting-down runtime.
	pub(crate) fn dispatch(
		&self,
		runtime: Option<&Handle>,
		event: Event<T>,
		subscriber_id: Option<SubscriberId>,
	) {
		match (&self.kind, runtime) {
			| (HandlerKind::Inline(_), _) => {
				self.run_inline(event, subscriber_id);
				return;
			}
			| (HandlerKind::Async(handler), Some(runtime)) => {
				let guard = DoneGuard(event.clone());
				let handler = Arc::clone(handler);
				runtime.spawn(async move {
					let _guard = guard;
					let topic = event.topic().to_owned();
					let run = AssertUnwindSafe(async move { handler(event).await });
					if let Err(panic) = run.catch_unwind().await {
						report_panic(subscriber_id, &topic, panic.as_ref());
					}
				});
			}
			| (HandlerKind::Blocking(handler), Some(runtime)) => {
				let guard = DoneGuard(event.clone());
				let handler = Arc::clone(handler);
				runtime.spawn_blocking(move || {
					let _guard = guard;
					let topic = event.topic().to_owned();
					let run = AssertUnwindSafe(move || handler(event));
					if let Err(panic) = panic::catch_unwind(run) {
						report_panic(subscriber_id, &topic, panic.as_ref());
					}
				});
			}
			| (_, None) => panic!(
				"BUG: {self:?} dispatched without a runtime on topic '{}'",
				event.topic()
			),
		}
		trace!(subscriber_id = ?subscriber_id, "Handler dispatched");
	}

	/// Runs one invocation to completion on the calling thread.
	///
	/// Async handlers are driven with a local executor, so they must not
	/// depend on tokio timers or IO. Panics are caught and logged, and the
	/// event is marked done before this returns.
	pub(crate) fn run_inline(
		&self,
		event: Event<T>,
		subscriber_id: Option<SubscriberId>,
	) {
		let _guard = DoneGuard(event.clone());
		let topic = event.topic().to_owned();
		let outcome = match &self.kind {
			| HandlerKind::Async(handler) => panic::catch_unwind(
				AssertUnwindSafe(|| executor::block_on(handler(event))),
			),
			| HandlerKind::Blocking(handler) | HandlerKind::Inline(handler) => {
				panic::catch_unwind(AssertUnwindSafe(|| handler(event)))
			}
		};
		if let Err(panic) = outcome {
			report_panic(subscriber_id, &topic, panic.as_ref());
		}
		trace!(subscriber_id = ?subscriber_id, "Handler ran inline");
	}
}

impl<T> Clone for Handler<T> {
	fn clone(&self) -> Self {
		let kind = match &self.kind {
			| HandlerKind::Async(handler) => HandlerKind::Async(Arc::clone(handler)),
			| HandlerKind::Blocking(handler) => {
				HandlerKind::Blocking(Arc::clone(handler))
			}
			| HandlerKind::Inline(handler) => {
				HandlerKind::Inline(Arc::clone(handler))
			}
		};
		Self { kind }
	}
}

impl<T> fmt::Debug for Handler<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.kind {
			| HandlerKind::Async(_) => "async",
			| HandlerKind::Blocking(_) => "blocking",
			| HandlerKind::Inline(_) => "inline",
		};
		f.debug_tuple("Handler").field(&kind).finish()
	}
}

/// Marks its event done when dropped.
struct DoneGuard<T>(Event<T>);

impl<T> Drop for DoneGuard<T> {
	fn drop(&mut self) {
		self.0.done();
	}
}

fn report_panic(
	subscriber_id: Option<SubscriberId>,
	topic: &str,
	panic: &(dyn Any + Send),
) {
	error!(
		subscriber_id = ?subscriber_id,
		topic = %topic,
		panic = %panic_message(panic),
		"Handler panicked"
	);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&'static str>() {
		(*message).to_owned()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_owned()
	}
}

/// A group of handlers that subscribes itself to a bus in one call.
///
/// Usually implemented by `#[event_handlers]` on an `impl` block.
pub trait HandlerSet<T> {
	/// Subscribes every handler of the set, returning the handles in
	/// declaration order.
	fn subscribe_to(self: Arc<Self>, bus: &Bus<T>) -> Vec<Subscriber>;
}

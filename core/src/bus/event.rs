use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arcstr::ArcStr;

use super::completion::CompletionState;

/// Single-shot done flag owned by one handler invocation.
struct DoneSignal {
	fired: AtomicBool,
	completion: Arc<CompletionState>,
}

impl DoneSignal {
	fn fire(&self) {
		if self
			.fired
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
		{
			self.completion.mark_done();
		}
	}
}

/// One delivery of a published payload to one handler.
///
/// The payload is shared by every handler the publish reached. The done
/// flag is private to this invocation: cloning the event shares the flag,
/// other handlers of the same publish have their own.
pub struct Event<T> {
	topic: ArcStr,
	data: Arc<T>,
	done: Arc<DoneSignal>,
}

impl<T> Event<T> {
	pub(crate) fn new(
		topic: ArcStr,
		data: Arc<T>,
		completion: Arc<CompletionState>,
	) -> Self {
		Self {
			topic,
			data,
			done: Arc::new(DoneSignal {
				fired: AtomicBool::new(false),
				completion,
			}),
		}
	}

	/// Concrete topic the payload was published on
	pub fn topic(&self) -> &str {
		&self.topic
	}

	/// Published payload
	pub fn data(&self) -> &T {
		&self.data
	}

	/// Shared handle to the payload, for work that outlives the handler
	pub fn data_arc(&self) -> Arc<T> {
		Arc::clone(&self.data)
	}

	/// Signals that this invocation is finished.
	///
	/// Only the first call has an effect. Handlers that never call it are
	/// marked done when they return, so calling it is only needed to signal
	/// completion before the handler itself finishes.
	pub fn done(&self) {
		self.done.fire();
	}

	/// True once this invocation has signalled done
	pub fn is_done(&self) -> bool {
		self.done.fired.load(Ordering::Acquire)
	}
}

impl<T> Clone for Event<T> {
	fn clone(&self) -> Self {
		Self {
			topic: self.topic.clone(),
			data: Arc::clone(&self.data),
			done: Arc::clone(&self.done),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("topic", &self.topic)
			.field("data", &self.data)
			.field("done", &self.is_done())
			.finish()
	}
}

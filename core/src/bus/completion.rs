//! Aggregated completion of one publish.
//!
//! Every dispatched handler invocation owns one single-shot done flag (see
//! [`Event::done`](super::Event::done)). Firing a flag decrements a shared
//! countdown; the invocation that brings it to zero flips a `watch` channel
//! that any number of waiters can await or block on.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;

pub(crate) struct CompletionState {
	dispatched: usize,
	remaining: AtomicUsize,
	finished: watch::Sender<bool>,
}

impl CompletionState {
	pub(crate) fn new(dispatched: usize) -> Arc<Self> {
		let (finished, _) = watch::channel(dispatched == 0);
		Arc::new(Self {
			dispatched,
			remaining: AtomicUsize::new(dispatched),
			finished,
		})
	}

	/// Records one finished invocation.
	///
	/// Callers guarantee at most one call per dispatched invocation.
	pub(crate) fn mark_done(&self) {
		let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
		match previous {
			| 0 => panic!(
				"BUG: completion signalled more often than the {} dispatched \
				 invocations",
				self.dispatched
			),
			| 1 => {
				self.finished.send_replace(true);
			}
			| _ => {}
		}
	}

	fn remaining(&self) -> usize {
		self.remaining.load(Ordering::Acquire)
	}
}

/// Handle returned by `publish`, satisfied once every dispatched handler
/// invocation has signalled done.
///
/// Dropping it never cancels anything: handlers run to completion whether or
/// not someone waits.
#[derive(Clone)]
pub struct Completion {
	state: Arc<CompletionState>,
}

impl Completion {
	pub(crate) fn new(state: Arc<CompletionState>) -> Self {
		Self { state }
	}

	/// A completion with nothing to wait for
	pub(crate) fn finished() -> Self {
		Self::new(CompletionState::new(0))
	}

	/// Waits until every dispatched invocation has signalled done.
	pub async fn wait(&self) {
		let mut finished = self.state.finished.subscribe();
		// The sender lives in `self.state`, so the channel cannot close here.
		let _ = finished.wait_for(|done| *done).await;
	}

	/// Blocks the current thread until every invocation has signalled done.
	///
	/// Must not be called from inside an async task: on a current-thread
	/// runtime the handlers could never make progress.
	pub fn wait_blocking(&self) {
		futures::executor::block_on(self.wait());
	}

	/// Waits at most `timeout`, returning whether completion was reached.
	///
	/// Giving up does not stop the handlers; they may still signal done
	/// afterwards.
	pub async fn wait_timeout(&self, timeout: Duration) -> bool {
		tokio::time::timeout(timeout, self.wait()).await.is_ok()
	}

	/// True once every dispatched invocation has signalled done
	pub fn is_complete(&self) -> bool {
		*self.state.finished.borrow()
	}

	/// Number of handler invocations this publish dispatched
	pub fn dispatched(&self) -> usize {
		self.state.dispatched
	}

	/// Invocations that have not signalled done yet
	pub fn pending(&self) -> usize {
		self.state.remaining()
	}
}

impl fmt::Debug for Completion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Completion")
			.field("dispatched", &self.dispatched())
			.field("pending", &self.pending())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_completion_is_finished() {
		let completion = Completion::finished();
		assert!(completion.is_complete());
		assert_eq!(completion.dispatched(), 0);
		assert_eq!(completion.pending(), 0);
		completion.wait_blocking();
	}

	#[test]
	fn test_countdown() {
		let state = CompletionState::new(3);
		let completion = Completion::new(Arc::clone(&state));

		state.mark_done();
		state.mark_done();
		assert!(!completion.is_complete());
		assert_eq!(completion.pending(), 1);

		state.mark_done();
		assert!(completion.is_complete());
		assert_eq!(completion.pending(), 0);
		assert_eq!(completion.dispatched(), 3);
	}

	#[test]
	#[should_panic(expected = "BUG: completion signalled more often")]
	fn test_over_signalling_is_a_bug() {
		let state = CompletionState::new(1);
		state.mark_done();
		state.mark_done();
	}

	#[tokio::test]
	async fn test_wait_wakes_on_last_done() {
		let state = CompletionState::new(2);
		let completion = Completion::new(Arc::clone(&state));

		let waiter = tokio::spawn({
			let completion = completion.clone();
			async move { completion.wait().await }
		});

		state.mark_done();
		tokio::task::yield_now().await;
		assert!(!waiter.is_finished());

		state.mark_done();
		waiter.await.unwrap();
		assert!(completion.is_complete());
	}

	#[tokio::test]
	async fn test_wait_timeout() {
		let state = CompletionState::new(1);
		let completion = Completion::new(Arc::clone(&state));

		assert!(!completion.wait_timeout(Duration::from_millis(20)).await);
		state.mark_done();
		assert!(completion.wait_timeout(Duration::from_millis(20)).await);
	}
}

//! End-to-end tests for publish/subscribe through the public facade
//!
//! Covers fan-out and wildcard routing, completion semantics, the unhandled
//! sink, topic validation and the closed-bus lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use wildcard_bus::prelude::*;
use wildcard_bus::{CacheStrategy, TopicError};

/// Shared record of (handler name, topic) invocations
#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<(&'static str, String)>>>);

impl Calls {
	fn record(&self, name: &'static str, topic: &str) {
		self.0.lock().push((name, topic.to_string()));
	}

	fn count(&self, name: &'static str, topic: &str) -> usize {
		self.0
			.lock()
			.iter()
			.filter(|(n, t)| *n == name && t == topic)
			.count()
	}

	fn len(&self) -> usize {
		self.0.lock().len()
	}
}

fn recording(
	calls: &Calls,
	name: &'static str,
) -> impl Fn(Event<u32>) -> std::future::Ready<()> + Send + Sync + 'static {
	let calls = calls.clone();
	move |event: Event<u32>| {
		calls.record(name, event.topic());
		std::future::ready(())
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_and_exact_patterns() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	bus.subscribe("a*", recording(&calls, "first"));
	bus.subscribe("a*", recording(&calls, "second"));
	bus.subscribe("ab", recording(&calls, "exact"));
	assert_eq!(bus.total_subscribers(), 3);

	let completion = bus.publish("ab", 1).unwrap();
	assert_eq!(completion.dispatched(), 3);
	completion.wait().await;
	for name in ["first", "second", "exact"] {
		assert_eq!(calls.count(name, "ab"), 1, "{name} on ab");
	}
	assert_eq!(bus.total_subscribers(), 3);

	bus.publish_and_wait("ac", 2).await.unwrap();
	assert_eq!(calls.count("first", "ac"), 1);
	assert_eq!(calls.count("second", "ac"), 1);
	assert_eq!(calls.count("exact", "ac"), 0);
	assert_eq!(calls.len(), 5);
	assert_eq!(bus.total_subscribers(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unhandled_sink_receives_unmatched_topic() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	bus.set_unhandled_sink(Some(Handler::from_async(recording(&calls, "sink"))));

	bus.publish_and_wait("x", 1).await.unwrap();
	assert_eq!(calls.count("sink", "x"), 1);

	bus.set_unhandled_sink(None);
	let completion = bus.publish("x", 2).unwrap();
	assert!(completion.is_complete());
	tokio::task::yield_now().await;
	assert_eq!(calls.len(), 1);
}

#[tokio::test]
async fn test_illegal_topic_dispatches_nothing() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	bus.subscribe("*", recording(&calls, "all"));
	bus.set_unhandled_sink(Some(Handler::from_async(recording(&calls, "sink"))));

	match bus.publish("a*b", 1) {
		| Err(BusError::Topic(TopicError::IllegalWildcard { index, .. })) => {
			assert_eq!(index, 1)
		}
		| other => panic!("expected illegal wildcard error, got {other:?}"),
	}
	let err = bus.publish("ab?", 1).unwrap_err();
	assert_eq!(err.error_type(), "illegal_wildcard");

	tokio::task::yield_now().await;
	assert_eq!(calls.len(), 0);
}

#[tokio::test]
async fn test_no_listeners_is_not_an_error() {
	let bus = Bus::<u32>::new();
	bus.subscribe("other", |_| async {});

	let completion = bus.publish("nobody.listens", 1).unwrap();
	assert!(completion.is_complete());
	assert_eq!(completion.dispatched(), 0);
	completion.wait().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_wait_returns_after_every_handler_without_explicit_done() {
	let bus = Bus::<u32>::new();
	let finished = Arc::new(AtomicUsize::new(0));
	for i in 0 .. 50 {
		let finished = Arc::clone(&finished);
		if i % 2 == 0 {
			bus.subscribe("job.*", move |_| {
				let finished = Arc::clone(&finished);
				async move {
					tokio::time::sleep(Duration::from_millis(5)).await;
					finished.fetch_add(1, Ordering::SeqCst);
				}
			});
		} else {
			bus.subscribe_blocking("job.*", move |_| {
				std::thread::sleep(Duration::from_millis(5));
				finished.fetch_add(1, Ordering::SeqCst);
			});
		}
	}

	let completion = bus.publish("job.run", 1).unwrap();
	assert_eq!(completion.dispatched(), 50);
	completion.wait().await;
	assert_eq!(finished.load(Ordering::SeqCst), 50);
	assert_eq!(completion.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_early_done_releases_waiter_before_handler_finishes() {
	let bus = Bus::<u32>::new();
	let (release, released) = tokio::sync::oneshot::channel::<()>();
	let released = Arc::new(Mutex::new(Some(released)));
	let finished = Arc::new(AtomicUsize::new(0));

	let handler_finished = Arc::clone(&finished);
	bus.subscribe("early", move |event: Event<u32>| {
		let released = released.lock().take();
		let finished = Arc::clone(&handler_finished);
		async move {
			event.done();
			if let Some(released) = released {
				let _ = released.await;
			}
			finished.fetch_add(1, Ordering::SeqCst);
		}
	});

	let completion = bus.publish("early", 1).unwrap();
	assert!(completion.wait_timeout(Duration::from_secs(5)).await);
	assert_eq!(finished.load(Ordering::SeqCst), 0);

	release.send(()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_and_concurrent_done_counts_once() {
	let bus = Bus::<u32>::new();
	bus.subscribe_blocking("twice", |event| {
		let clones: Vec<_> = (0 .. 4).map(|_| event.clone()).collect();
		std::thread::scope(|scope| {
			for clone in &clones {
				scope.spawn(move || clone.done());
			}
		});
		event.done();
	});
	let slow_done = Arc::new(AtomicUsize::new(0));
	let slow = Arc::clone(&slow_done);
	bus.subscribe("twice", move |_| {
		let slow = Arc::clone(&slow);
		async move {
			tokio::time::sleep(Duration::from_millis(50)).await;
			slow.fetch_add(1, Ordering::SeqCst);
		}
	});

	let completion = bus.publish("twice", 1).unwrap();
	completion.wait().await;
	// The first handler signalling repeatedly must not release the waiter early
	assert_eq!(slow_done.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_handler_still_completes() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	bus.subscribe("boom", |_| async { panic!("async handler failure") });
	bus.subscribe_blocking("boom", |_| panic!("blocking handler failure"));
	bus.subscribe("boom", recording(&calls, "survivor"));

	let completion = bus.publish("boom", 1).unwrap();
	assert!(completion.wait_timeout(Duration::from_secs(5)).await);
	assert_eq!(calls.count("survivor", "boom"), 1);

	// The bus keeps working afterwards
	bus.publish_and_wait("boom", 2).await.unwrap();
	assert_eq!(calls.count("survivor", "boom"), 2);
}

#[tokio::test]
async fn test_subscribe_and_unsubscribe_invalidate_cache() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	bus.subscribe("cache.*", recording(&calls, "old"));

	bus.publish_and_wait("cache.hit", 1).await.unwrap();
	bus.publish_and_wait("cache.hit", 2).await.unwrap();
	assert_eq!(calls.count("old", "cache.hit"), 2);
	assert_eq!(bus.registry().cached_topics(), 1);

	let newer = bus.subscribe("cache.hit", recording(&calls, "new"));
	bus.publish_and_wait("cache.hit", 3).await.unwrap();
	assert_eq!(calls.count("new", "cache.hit"), 1);
	assert_eq!(calls.count("old", "cache.hit"), 3);

	assert!(bus.unsubscribe(&newer));
	assert!(!bus.unsubscribe(&newer));
	bus.publish_and_wait("cache.hit", 4).await.unwrap();
	assert_eq!(calls.count("new", "cache.hit"), 1);
	assert_eq!(calls.count("old", "cache.hit"), 4);
}

#[tokio::test]
async fn test_uncached_bus_behaves_the_same() {
	let config = BusConfig::new().with_settings(wildcard_bus::BusSettings {
		topic_cache: CacheStrategy::NoCache,
		initial_capacity: 0,
	});
	let bus = Bus::<u32>::with_config(config);
	let calls = Calls::default();
	bus.subscribe("?", recording(&calls, "one"));
	bus.subscribe("??", recording(&calls, "two"));

	for topic in ["a", "bc", "def", "a"] {
		bus.publish_and_wait(topic, 0).await.unwrap();
	}
	assert_eq!(calls.count("one", "a"), 2);
	// A trailing '?' may match nothing
	assert_eq!(calls.count("two", "a"), 2);
	assert_eq!(calls.count("two", "bc"), 1);
	assert_eq!(calls.len(), 5);
	assert_eq!(bus.registry().cached_topics(), 0);
}

#[tokio::test]
async fn test_closed_bus_is_inert() {
	let bus = Bus::<u32>::new();
	let calls = Calls::default();
	let subscriber = bus.subscribe("*", recording(&calls, "all"));
	bus.set_unhandled_sink(Some(Handler::from_async(recording(&calls, "sink"))));

	bus.close();
	assert!(bus.is_closed());
	assert_eq!(bus.total_subscribers(), 0);
	assert!(!bus.unsubscribe(&subscriber));

	let completion = bus.publish("anything", 1).unwrap();
	assert!(completion.is_complete());
	bus.subscribe("*", recording(&calls, "late"));
	bus.publish_and_wait("anything", 2).await.unwrap();

	bus.close();
	assert_eq!(calls.len(), 0);
}

#[test]
fn test_blocking_wait_with_explicit_runtime() {
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.worker_threads(2)
		.enable_all()
		.build()
		.unwrap();
	let bus = Bus::<String>::with_config(
		BusConfig::new().with_runtime(runtime.handle().clone()),
	);
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	bus.subscribe_blocking("log.*", move |event: Event<String>| {
		sink.lock().push(format!("{}={}", event.topic(), event.data()));
	});

	bus.publish("log.info", "ready".to_string())
		.unwrap()
		.wait_blocking();
	assert_eq!(*seen.lock(), vec!["log.info=ready".to_string()]);
}

#[test]
fn test_publish_without_runtime_fails_before_dispatch() {
	let bus = Bus::<u32>::new();
	bus.subscribe("a", |_| async {});
	match bus.publish("a", 1) {
		| Err(BusError::NoRuntime { topic }) => assert_eq!(topic, "a"),
		| other => panic!("expected NoRuntime, got {other:?}"),
	}
}

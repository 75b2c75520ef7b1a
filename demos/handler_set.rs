//! # Handler Sets - Wildcard Bus
//!
//! `#[event_handlers]` subscribes every `*_handler` method of an `impl`
//! block to `prefix + method name without the suffix`.

mod shared;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wildcard_bus::prelude::*;

#[derive(Default)]
struct OrderService {
	processed: AtomicUsize,
}

#[event_handlers(prefix = "order.")]
impl OrderService {
	/// Subscribed to "order.created"
	async fn created_handler(&self, event: Event<u64>) {
		println!("order {} created", event.data());
		self.processed.fetch_add(1, Ordering::SeqCst);
	}

	/// Subscribed to "order.shipped"; signals completion before the slow part
	fn shipped_handler(&self, event: Event<u64>) {
		println!("order {} shipped", event.data());
		event.done();
		self.processed.fetch_add(1, Ordering::SeqCst);
	}

	/// Subscribed to "order.audit"; takes no event at all
	fn audit_handler(&self) {
		println!("audit requested");
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	shared::tracing::setup(None);

	let bus = Bus::<u64>::new();
	let service = Arc::new(OrderService::default());

	for subscriber in bus.subscribe_set(Arc::clone(&service)) {
		println!("subscribed {subscriber}");
	}

	bus.publish_and_wait("order.created", 1001).await?;
	bus.publish_and_wait("order.shipped", 1001).await?;
	bus.publish_and_wait("order.audit", 0).await?;

	println!(
		"processed {} order event(s)",
		service.processed.load(Ordering::SeqCst)
	);
	Ok(())
}

//! # Unhandled Sink - Wildcard Bus
//!
//! Events nobody subscribed to can be routed to a fallback handler instead
//! of being dropped. Also shows the untyped bus and a timed wait.

mod shared;

use std::time::Duration;

use wildcard_bus::prelude::*;
use wildcard_bus::AnyPayload;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	shared::tracing::setup(Some("info"));

	let bus = UntypedBus::new();

	bus.subscribe("metrics.count", |event: Event<AnyPayload>| async move {
		if let Some(value) = event.data().downcast_ref::<u64>() {
			println!("count = {value}");
		}
	});

	bus.set_unhandled_sink(Some(Handler::from_async(
		|event: Event<AnyPayload>| async move {
			println!("nobody handles '{}'", event.topic());
		},
	)));

	bus.publish_and_wait("metrics.count", Box::new(42_u64)).await?;
	bus.publish_and_wait("metrics.latency", Box::new(1.5_f64)).await?;

	// Without a sink unmatched events are silently dropped
	bus.set_unhandled_sink(None);
	let completion = bus.publish("metrics.latency", Box::new(2.5_f64))?;
	println!("dispatched to {} handler(s)", completion.dispatched());

	// A slow handler: give up waiting, it keeps running
	bus.subscribe("jobs.slow", |_| async {
		tokio::time::sleep(Duration::from_millis(200)).await;
		println!("slow job finished anyway");
	});
	let completion = bus.publish("jobs.slow", Box::new(()))?;
	if !completion.wait_timeout(Duration::from_millis(10)).await {
		println!("still {} handler(s) pending", completion.pending());
	}
	completion.wait().await;

	bus.close();
	Ok(())
}

//! # Basic - Wildcard Bus
//!
//! Subscribes a few wildcard patterns, publishes concrete topics and waits
//! for the handlers to finish.
//!
//! Run with `RUST_LOG=wildcard_bus_core=trace` to see resolution and
//! dispatch decisions.

mod shared;

use std::time::Duration;

use wildcard_bus::prelude::*;

#[derive(Debug)]
struct Reading {
	sensor: &'static str,
	celsius: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	shared::tracing::setup(None);

	let bus = Bus::<Reading>::new();
	tracing::info!("Bus created");

	// `*` matches any run of characters, including none
	let all = bus.subscribe("sensor.*", |event: Event<Reading>| async move {
		println!("[all]      {} -> {:?}", event.topic(), event.data());
	});

	// `?` matches at most one character
	bus.subscribe("sensor.room?", |event: Event<Reading>| async move {
		println!("[rooms]    {} -> {:.1}C", event.topic(), event.data().celsius);
	});

	// Blocking handlers run on the blocking pool
	bus.subscribe_blocking("sensor.*.alarm", |event| {
		std::thread::sleep(Duration::from_millis(50));
		println!("[alarm]    {} from {}", event.topic(), event.data().sensor);
	});

	let readings = [
		("sensor.room1", Reading { sensor: "room1", celsius: 21.5 }),
		("sensor.room2", Reading { sensor: "room2", celsius: 19.0 }),
		("sensor.boiler.alarm", Reading { sensor: "boiler", celsius: 95.0 }),
	];
	for (topic, reading) in readings {
		let completion = bus.publish(topic, reading)?;
		completion.wait().await;
		println!("{topic}: {} handler(s) done\n", completion.dispatched());
	}

	// Topics must be concrete
	if let Err(err) = bus.publish("sensor.*", Reading { sensor: "x", celsius: 0.0 }) {
		println!("rejected: {err}");
	}

	bus.unsubscribe(&all);
	println!("subscribers left: {}", bus.total_subscribers());
	bus.close();
	Ok(())
}

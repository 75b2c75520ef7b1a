//! # Wildcard Bus
//!
//! An in-process publish/subscribe event bus with wildcard topic patterns.
//!
//! ## Features
//!
//! - **Wildcard Subscriptions**: `*` matches any run of characters, `?` at most one
//! - **Concurrent Fan-out**: every matching handler runs as its own tokio task
//! - **Completion Tracking**: await, block on or time out a publish
//! - **Unhandled Sink**: optional fallback consumer for unmatched topics
//! - **Handler Sets**: `#[event_handlers]` wires a whole `impl` block at once
//!
//! ## Quick Start
//!
//! ```rust
//! use wildcard_bus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BusError> {
//!     let bus = Bus::<u32>::new();
//!
//!     let orders = bus.subscribe("order.*", |event: Event<u32>| async move {
//!         println!("{}: {}", event.topic(), event.data());
//!     });
//!     bus.subscribe_blocking("order.paid", |event| {
//!         // long-running work is fine here
//!         event.done();
//!     });
//!
//!     bus.publish("order.paid", 42)?.wait().await;
//!     bus.publish_and_wait("order.created", 7).await?;
//!
//!     bus.unsubscribe(&orders);
//!     bus.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Handler Sets
//!
//! ```rust
//! use std::sync::Arc;
//! use wildcard_bus::prelude::*;
//!
//! struct Audit;
//!
//! #[event_handlers(prefix = "user.")]
//! impl Audit {
//!     async fn created_handler(&self, event: Event<String>) {
//!         println!("created {}", event.data());
//!     }
//!
//!     fn deleted_handler(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BusError> {
//!     let bus = Bus::<String>::new();
//!     let subscribers = bus.subscribe_set(Arc::new(Audit));
//!     assert_eq!(subscribers.len(), 2);
//!
//!     bus.publish_and_wait("user.created", "alice".to_string()).await
//! }
//! ```
//!
//! ## Untyped Payloads
//!
//! [`UntypedBus`] carries `Box<dyn Any + Send + Sync>` payloads; handlers
//! downcast to the types they understand.

#![warn(missing_docs)]

pub use wildcard_bus_core::{bus, pattern, routing};
// === Core Public API ===
pub use wildcard_bus_core::{
	AnyPayload, Bus, BusConfig, BusError, BusResult, BusSettings, Completion,
	Event, Handler, HandlerSet, Subscriber, SubscriberId, TopicError,
	TopicResult, UntypedBus,
};
// Attribute macro
pub use wildcard_bus_macros::event_handlers;
// === Advanced API ===
pub use wildcard_bus_core::{
	CacheStrategy, Resolution, SubscriberRegistry, ValueCounter,
};

/// Prelude module for convenient imports
///
/// Everything typical applications need, in one line:
///
/// ```rust
/// use wildcard_bus::prelude::*;
/// ```
pub mod prelude {
	//! Essential types for most applications

	pub use wildcard_bus_core::prelude::*;

	pub use crate::event_handlers;
}

/// Advanced types and utilities for complex use cases
///
/// - Registry inspection and cache tuning
/// - Pattern matching helpers and topic validation
///
/// ```rust
/// use wildcard_bus::advanced::*;
/// ```
pub mod advanced {
	//! Advanced types for complex use cases

	pub use wildcard_bus_core::advanced::*;
}

/// Error types used throughout the library
///
/// ```rust
/// use wildcard_bus::errors::*;
/// ```
pub mod errors {
	//! All error types used in the library

	pub use wildcard_bus_core::errors::*;
}

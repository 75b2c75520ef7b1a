//! # Wildcard Bus Core
//!
//! In-process publish/subscribe engine: subscribers register wildcard topic
//! patterns, publishers send payloads on concrete topics, and every matching
//! handler runs as its own unit of work on a tokio runtime.
//!
//! ## Features
//!
//! - **Wildcard patterns**: `*` matches any run of characters, `?` at most one
//! - **Ordered registry**: patterns kept sorted, equal patterns matched once
//! - **Resolution cache**: per-topic subscriber sets, invalidated on change
//! - **Completion tracking**: await or block until every handler is done
//! - **Panic isolation**: a panicking handler still counts as done
//!
//! ## Quick Start
//!
//! ```rust
//! use wildcard_bus_core::{Bus, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::<String>::new();
//!
//!     bus.subscribe("user.*", |event: Event<String>| async move {
//!         println!("{} -> {}", event.topic(), event.data());
//!     });
//!
//!     bus.publish("user.created", "alice".to_string())?.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Pattern Matching
//!
//! - `user.*` matches `user.`, `user.created`, `user.a.b`
//! - `user.?` matches `user.` and `user.x` but not `user.xy`
//! - `*` matches every topic, including the empty one
//!
//! Published topics must be concrete: publishing on a topic containing a
//! wildcard marker fails with [`TopicError::IllegalWildcard`].

#![warn(missing_docs)]

pub mod bus;
pub mod pattern;
pub mod routing;

// === Core Public API ===
pub use bus::{
	AnyPayload, Bus, BusConfig, BusError, BusResult, BusSettings, Completion,
	Event, Handler, HandlerSet, UntypedBus,
};
pub use pattern::{TopicError, TopicResult};
pub use routing::{Subscriber, SubscriberId};

// === Advanced API ===
pub use routing::{CacheStrategy, Resolution, SubscriberRegistry, ValueCounter};

/// Prelude module for convenient imports
///
/// Essential types for most applications:
///
/// ```rust
/// use wildcard_bus_core::prelude::*;
/// ```
pub mod prelude {

	pub use crate::{
		Bus, BusConfig, BusError, BusResult, Completion, Event, Handler,
		HandlerSet, Subscriber, UntypedBus,
	};
}

/// Advanced types and utilities for complex use cases
///
/// - Registry inspection and cache tuning
/// - Pattern helpers and topic validation
///
/// ```rust
/// use wildcard_bus_core::advanced::*;
/// ```
pub mod advanced {

	pub use crate::pattern::{
		ANY_CHAR, ANY_SEQUENCE, index_of_wildcard, is_wildcard, matches,
		normalize, validation,
	};
	pub use crate::{
		AnyPayload, BusSettings, CacheStrategy, Resolution, SubscriberId,
		SubscriberRegistry, ValueCounter,
	};
}

/// Error types used throughout the library
///
/// ```rust
/// use wildcard_bus_core::errors::*;
/// ```
pub mod errors {

	pub use crate::{BusError, BusResult, TopicError, TopicResult};
}

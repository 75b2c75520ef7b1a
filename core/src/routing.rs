//! Subscription storage and topic resolution module
//!
//! This module owns the subscriber registry, the resolution cache that
//! memoises which subscribers match a topic, and the frequency counter used
//! to pre-size resolutions.

/// Resolution cache and its strategy
pub mod cache;
pub mod registry;
/// Subscriber identifiers and handles
pub mod subscriber;
pub mod value_counter;


// Re-export commonly used types for convenience
pub use cache::{CacheStrategy, Resolution};
pub use registry::SubscriberRegistry;
pub use subscriber::{Subscriber, SubscriberId};
pub use value_counter::ValueCounter;

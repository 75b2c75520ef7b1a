//! Topic pattern handling module
//!
//! This module provides the wildcard matcher used to decide whether a
//! subscription pattern matches a concrete topic, together with pattern
//! normalisation and topic validation utilities.

// Submodules
pub mod error;
pub mod wildcard;


// Re-export commonly used types for convenience
pub use error::{TopicError, TopicResult, validation};
pub use wildcard::{
	ANY_CHAR, ANY_SEQUENCE, index_of_wildcard, is_wildcard, matches, normalize,
};

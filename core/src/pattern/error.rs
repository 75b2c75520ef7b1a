//! Error types and validation utilities for the pattern module

use thiserror::Error;

/// Errors raised while validating topics handed to the bus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
	/// A published topic contains a wildcard marker
	#[error(
		"Illegal wildcard '{wildcard}' at index {index} in topic '{topic}': \
		 only subscription patterns may contain wildcards"
	)]
	IllegalWildcard {
		/// The rejected topic
		topic: String,
		/// Character index of the first wildcard marker
		index: usize,
		/// The offending wildcard marker
		wildcard: char,
	},
}

impl TopicError {
	/// Creates a new IllegalWildcard error
	pub fn illegal_wildcard(
		topic: impl Into<String>,
		index: usize,
		wildcard: char,
	) -> Self {
		Self::IllegalWildcard {
			topic: topic.into(),
			index,
			wildcard,
		}
	}

	/// Character index of the offending marker, if any
	pub fn index(&self) -> Option<usize> {
		match self {
			| TopicError::IllegalWildcard { index, .. } => Some(*index),
		}
	}

	/// Returns the error type for categorization
	pub fn error_type(&self) -> &'static str {
		match self {
			| TopicError::IllegalWildcard { .. } => "illegal_wildcard",
		}
	}
}

/// Convenient Result type for topic operations
pub type TopicResult<T> = Result<T, TopicError>;

/// Validation utilities for topic operations
pub mod validation {
	use super::TopicError;
	use crate::pattern::wildcard::is_wildcard;

	/// Validates that a topic is concrete, i.e. carries no wildcard marker.
	///
	/// Publishing is only defined for concrete topics; patterns belong to
	/// subscribers.
	pub fn validate_topic(topic: &str) -> Result<(), TopicError> {
		match topic.chars().enumerate().find(|(_, c)| is_wildcard(*c)) {
			| Some((index, wildcard)) => {
				Err(TopicError::illegal_wildcard(topic, index, wildcard))
			}
			| None => Ok(()),
		}
	}
}

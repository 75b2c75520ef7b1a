use thiserror::Error;

use crate::pattern::TopicError;

/// Errors that can occur in bus operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
	/// The published topic was rejected before dispatch
	#[error("Topic error: {0}")]
	Topic(#[from] TopicError),

	/// Handlers matched but there is no runtime to schedule them on
	#[error(
		"No tokio runtime available to dispatch '{topic}': publish from \
		 within a runtime or configure one with BusConfig::with_runtime"
	)]
	NoRuntime {
		/// Topic whose dispatch was abandoned
		topic: String,
	},
}

impl BusError {
	/// Creates a new NoRuntime error
	pub fn no_runtime(topic: impl Into<String>) -> Self {
		Self::NoRuntime {
			topic: topic.into(),
		}
	}

	/// Returns the error type for categorization
	pub fn error_type(&self) -> &'static str {
		match self {
			| BusError::Topic(err) => err.error_type(),
			| BusError::NoRuntime { .. } => "no_runtime",
		}
	}
}

/// Convenient Result type for bus operations
pub type BusResult<T> = Result<T, BusError>;

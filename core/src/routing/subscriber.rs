use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};

use arcstr::ArcStr;

use crate::bus::Handler;

/// Ids above this margin are treated as exhausted id space.
const ID_SAFETY_MARGIN: u64 = u64::MAX - 10;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique subscriber identifier.
///
/// Ids are handed out by a single process-wide counter and are never
/// reused, even after the subscriber has been removed.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct SubscriberId(u64);

impl SubscriberId {
	/// Id of the handles a closed registry returns; never minted.
	pub const INERT: Self = Self(0);

	/// Mints the next unused id.
	///
	/// # Panics
	/// Panics when the id space is exhausted; continuing would risk handing
	/// out an id twice.
	pub(crate) fn next() -> Self {
		let id = NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed);
		if id > ID_SAFETY_MARGIN {
			panic!("BUG: subscriber id space exhausted at {id}");
		}
		Self(id)
	}

	/// Raw numeric value of the id
	pub fn get(&self) -> u64 {
		self.0
	}
}

impl Display for SubscriberId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SubscriberId({})", self.0)
	}
}

/// Handle to a registration, returned by `subscribe`.
///
/// Carries everything needed to request removal: the id and the normalised
/// pattern the subscriber was stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscriber {
	id: SubscriberId,
	pattern: ArcStr,
}

impl Subscriber {
	pub(crate) fn new(id: SubscriberId, pattern: ArcStr) -> Self {
		Self { id, pattern }
	}

	/// Unique id of this registration
	pub fn id(&self) -> SubscriberId {
		self.id
	}

	/// Normalised pattern this registration listens on
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// True for handles returned by a closed registry
	pub fn is_inert(&self) -> bool {
		self.id == SubscriberId::INERT
	}
}

impl Display for Subscriber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} on '{}'", self.id, self.pattern)
	}
}

/// Registry-owned record of one subscription.
pub(crate) struct SubscriberEntry<T> {
	pub(crate) id: SubscriberId,
	pub(crate) pattern: ArcStr,
	pub(crate) handler: Handler<T>,
}

impl<T> fmt::Debug for SubscriberEntry<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubscriberEntry")
			.field("id", &self.id)
			.field("pattern", &self.pattern)
			.field("handler", &self.handler)
			.finish()
	}
}

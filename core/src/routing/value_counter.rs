//! Frequency tracker used to pre-size topic resolutions.
//!
//! [`ValueCounter`] records how often each value has been observed and keeps
//! the values in a max-heap ordered by occurrence count, so the most common
//! value is available in O(1) and recording an occurrence costs O(log n).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct HeapItem {
	value: usize,
	occurrences: u64,
}

/// Histogram of observed values backed by an indexed max-heap.
///
/// Counts are never decremented.
#[derive(Debug, Default, Clone)]
pub struct ValueCounter {
	heap: Vec<HeapItem>,
	/// value -> index of its item in `heap`
	positions: HashMap<usize, usize>,
}

impl ValueCounter {
	/// Creates an empty counter
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one more occurrence of `value`.
	pub fn increment_for(&mut self, value: usize) {
		match self.positions.get(&value) {
			| Some(&index) => {
				// Pull the item out and re-insert it with the bumped count.
				let mut item = self.remove_at(index);
				item.occurrences += 1;
				self.push(item);
			}
			| None => self.push(HeapItem {
				value,
				occurrences: 1,
			}),
		}
	}

	/// The value observed most often so far.
	pub fn most_common(&self) -> Option<usize> {
		self.heap.first().map(|item| item.value)
	}

	/// The value observed least often so far.
	///
	/// The minimum of a max-heap lives among its leaves, so only the second
	/// half of the heap is scanned.
	pub fn least_common(&self) -> Option<usize> {
		let first_leaf = self.heap.len() / 2;
		self.heap[first_leaf ..]
			.iter()
			.min_by_key(|item| item.occurrences)
			.map(|item| item.value)
	}

	/// How many times `value` has been recorded.
	pub fn occurrences(&self, value: usize) -> u64 {
		self.positions
			.get(&value)
			.map_or(0, |&index| self.heap[index].occurrences)
	}

	/// Number of distinct values recorded.
	pub fn distinct_values(&self) -> usize {
		self.heap.len()
	}

	/// True before the first recorded value
	pub fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}

	fn push(&mut self, item: HeapItem) {
		let index = self.heap.len();
		self.heap.push(item);
		self.positions.insert(item.value, index);
		self.sift_up(index);
	}

	fn remove_at(&mut self, index: usize) -> HeapItem {
		let last = self.heap.len() - 1;
		self.swap(index, last);
		let removed = self.heap.pop().unwrap_or_else(|| {
			panic!("BUG: ValueCounter heap empty while removing index {index}")
		});
		self.positions.remove(&removed.value);
		if index < self.heap.len() {
			self.sift_down(index);
			self.sift_up(index);
		}
		removed
	}

	fn sift_up(&mut self, mut index: usize) {
		while index > 0 {
			let parent = (index - 1) / 2;
			if self.heap[index].occurrences <= self.heap[parent].occurrences {
				break;
			}
			self.swap(index, parent);
			index = parent;
		}
	}

	fn sift_down(&mut self, mut index: usize) {
		let len = self.heap.len();
		loop {
			let left = 2 * index + 1;
			let right = left + 1;
			let mut largest = index;
			if left < len
				&& self.heap[left].occurrences > self.heap[largest].occurrences
			{
				largest = left;
			}
			if right < len
				&& self.heap[right].occurrences > self.heap[largest].occurrences
			{
				largest = right;
			}
			if largest == index {
				break;
			}
			self.swap(index, largest);
			index = largest;
		}
	}

	fn swap(&mut self, a: usize, b: usize) {
		self.heap.swap(a, b);
		self.positions.insert(self.heap[a].value, a);
		self.positions.insert(self.heap[b].value, b);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_heap_consistent(counter: &ValueCounter) {
		for (index, item) in counter.heap.iter().enumerate() {
			assert_eq!(counter.positions[&item.value], index);
			if index > 0 {
				let parent = &counter.heap[(index - 1) / 2];
				assert!(parent.occurrences >= item.occurrences);
			}
		}
		assert_eq!(counter.positions.len(), counter.heap.len());
	}

	#[test]
	fn test_empty_counter() {
		let counter = ValueCounter::new();
		assert!(counter.is_empty());
		assert_eq!(counter.most_common(), None);
		assert_eq!(counter.least_common(), None);
		assert_eq!(counter.occurrences(3), 0);
	}

	#[test]
	fn test_single_value() {
		let mut counter = ValueCounter::new();
		counter.increment_for(7);
		assert_eq!(counter.most_common(), Some(7));
		assert_eq!(counter.least_common(), Some(7));
		assert_eq!(counter.occurrences(7), 1);
	}

	#[test]
	fn test_most_common_follows_counts() {
		let mut counter = ValueCounter::new();
		counter.increment_for(1);
		counter.increment_for(2);
		counter.increment_for(2);
		assert_eq!(counter.most_common(), Some(2));

		counter.increment_for(1);
		counter.increment_for(1);
		assert_eq!(counter.most_common(), Some(1));
		assert_eq!(counter.occurrences(1), 3);
		assert_eq!(counter.occurrences(2), 2);
		assert_heap_consistent(&counter);
	}

	#[test]
	fn test_least_common() {
		let mut counter = ValueCounter::new();
		for (value, times) in [(0, 5), (10, 1), (20, 3), (30, 4), (40, 2)] {
			for _ in 0 .. times {
				counter.increment_for(value);
			}
		}
		assert_eq!(counter.most_common(), Some(0));
		assert_eq!(counter.least_common(), Some(10));
		assert_eq!(counter.distinct_values(), 5);
		assert_heap_consistent(&counter);
	}

	#[test]
	fn test_heap_stays_consistent_under_many_updates() {
		let mut counter = ValueCounter::new();
		for i in 0 .. 500usize {
			counter.increment_for((i * 7) % 13);
			counter.increment_for(i % 5);
			assert_heap_consistent(&counter);
		}
		// 0..5 get the extra `i % 5` increments on top of the `% 13` ones
		let most = counter.most_common().unwrap();
		assert!(most < 5, "unexpected most common value {most}");
		assert_eq!(
			counter.occurrences(most),
			(0 .. 13)
				.map(|v| counter.occurrences(v))
				.max()
				.unwrap()
		);
	}
}

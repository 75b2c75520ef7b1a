//! Glob-style wildcard matching for subscription patterns
//!
//! Two markers are recognised:
//!
//! - `*` matches any run of characters, including the empty run
//! - `?` matches at most one character
//!
//! Every other character matches itself. Matching works on characters, so
//! `?` consumes one whole code point of a non-ASCII topic.
//!
//! A `?` first consumes the character under it and remembers that capture.
//! When a later literal fails, the capture is dropped and the rest of the
//! pattern is retried with the `?` matching nothing. The capture is
//! forgotten as soon as a literal different from the captured character
//! has been matched. A `?` left over at the end of the topic matches the
//! empty remainder.

use std::borrow::Cow;

use smallvec::SmallVec;

/// Wildcard marker matching zero or more characters
pub const ANY_SEQUENCE: char = '*';

/// Wildcard marker matching zero or one character
pub const ANY_CHAR: char = '?';

/// Returns true if `c` is one of the wildcard markers.
#[inline]
pub fn is_wildcard(c: char) -> bool {
	c == ANY_SEQUENCE || c == ANY_CHAR
}

/// Returns true if `pattern` matches the whole of `topic`.
///
/// An empty pattern matches only the empty topic. `*` and a pattern equal
/// to the topic match without running the general algorithm.
pub fn matches(pattern: &str, topic: &str) -> bool {
	if pattern.is_empty() {
		return topic.is_empty();
	}
	if pattern == "*" || pattern == topic {
		return true;
	}

	if pattern.is_ascii() && topic.is_ascii() {
		return match_units(
			pattern.as_bytes(),
			topic.as_bytes(),
			ANY_SEQUENCE as u8,
			ANY_CHAR as u8,
		);
	}

	let pattern: SmallVec<[char; 64]> = pattern.chars().collect();
	let topic: SmallVec<[char; 64]> = topic.chars().collect();
	match_units(&pattern, &topic, ANY_SEQUENCE, ANY_CHAR)
}

/// Greedy matcher with single-point backtracking to the last `?` and `*`.
///
/// Runs in `O(pattern + topic)` for patterns with at most one `*` and
/// degrades to `O(pattern * topic)` when many stars force re-scans.
fn match_units<U: Copy + Eq>(
	pattern: &[U],
	topic: &[U],
	any_sequence: U,
	any_char: U,
) -> bool {
	let mut pattern_index = 0;
	let mut topic_index = 0;
	// (pattern index right after the last '*', topic index it resumes from)
	let mut last_star: Option<(usize, usize)> = None;
	// (pattern index right after the last '?', topic index, captured unit)
	let mut last_any_char: Option<(usize, usize, U)> = None;

	while topic_index < topic.len() {
		let current = topic[topic_index];
		match pattern.get(pattern_index) {
			| Some(&unit) if unit == any_sequence => {
				last_star = Some((pattern_index + 1, topic_index));
				pattern_index += 1;
				continue;
			}
			| Some(&unit) if unit == any_char => {
				last_any_char = Some((pattern_index + 1, topic_index, current));
			}
			| Some(&unit) if unit == current => {
				let repeats_capture = last_any_char
					.map_or(true, |(_, _, captured)| captured == current);
				if !repeats_capture {
					last_any_char = None;
				}
			}
			| unit => {
				// A literal mismatch first retries the last '?' as empty.
				if unit.is_some() {
					if let Some((resume_pattern, resume_topic, _)) =
						last_any_char.take()
					{
						pattern_index = resume_pattern;
						topic_index = resume_topic;
						continue;
					}
				}
				match last_star {
					| Some((resume_pattern, resume_topic)) => {
						// Let the star swallow one more topic character.
						last_star = Some((resume_pattern, resume_topic + 1));
						pattern_index = resume_pattern;
						topic_index = resume_topic + 1;
						continue;
					}
					| None => return false,
				}
			}
		}
		pattern_index += 1;
		topic_index += 1;
	}

	pattern[pattern_index ..]
		.iter()
		.all(|&unit| unit == any_sequence || unit == any_char)
}

/// Returns the character index of the first wildcard marker in `s`.
pub fn index_of_wildcard(s: &str) -> Option<usize> {
	s.chars().position(is_wildcard)
}

/// Collapses every run of consecutive `*` into a single `*`.
///
/// Runs of stars are semantically redundant, collapsing them makes equal
/// patterns compare equal in the registry. The result is borrowed when
/// there is nothing to collapse, and `normalize` is idempotent.
pub fn normalize(pattern: &str) -> Cow<'_, str> {
	if !pattern.contains("**") {
		return Cow::Borrowed(pattern);
	}

	let mut normalized = String::with_capacity(pattern.len());
	let mut previous_was_star = false;
	for c in pattern.chars() {
		let is_star = c == ANY_SEQUENCE;
		if !(is_star && previous_was_star) {
			normalized.push(c);
		}
		previous_was_star = is_star;
	}
	Cow::Owned(normalized)
}

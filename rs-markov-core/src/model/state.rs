use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Represents a state in the word chain.
///
/// A `State` corresponds to a fixed window of `state_size` words (`key`) and
/// stores every observed transition from this window to the next word.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Pick the next word using weighted random sampling
/// - Merge with another state having the same key (model combination)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// Window of preceding words.
	key: Vec<String>,
	/// Outgoing transitions indexed by the next word.
	/// Ordered so that a seeded random source always walks the same way.
	/// Example: { "cat" => 42, "dog" => 3 }
	transitions: BTreeMap<String, usize>
}

impl State {
	/// Creates a new empty state for the given window.
	pub fn new(key: &[String]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: BTreeMap::new(),
		}
	}

	pub fn key(&self) -> &[String] {
		&self.key
	}

	/// Records `count` occurrences of a transition toward `next_word`.
	///
	/// A count of zero is ignored so that the invariant holds.
	pub fn add_transition(&mut self, next_word: &str, count: usize) {
		if count == 0 {
			return;
		}
		*self.transitions.entry(next_word.to_owned()).or_insert(0) += count;
	}

	/// Number of times `next_word` followed this state.
	pub fn occurrences(&self, next_word: &str) -> usize {
		self.transitions.get(next_word).copied().unwrap_or(0)
	}

	/// Predicts the next word using weighted random sampling.
	///
	/// The probability of selecting a word is proportional to its
	/// occurrence count.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let total: usize = self.transitions.values().sum();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);

		let mut fallback: Option<&str> = None;
		for (next_word, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next_word);
			}
			r -= occurrence;
			fallback = Some(next_word);
		}

		fallback
	}

	/// Merges another state into this one, scaling its counts by `weight`.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self, weight: usize) -> Result<(), String> {
		if self.key != other.key {
			return Err("Key mismatch".to_owned());
		}

		for (next_word, occurrence) in &other.transitions {
			self.add_transition(next_word, occurrence * weight);
		}

		Ok(())
	}
}

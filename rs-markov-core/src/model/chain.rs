use super::state::State;
use crate::error::{GenerateError, ModelError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marker padding the start of every sentence.
pub const BEGIN: &str = "___BEGIN__";
/// Marker closing every sentence.
pub const END: &str = "___END__";

/// Represents a word-level Markov chain of order `state_size`.
///
/// The `Chain` stores one state per window of `state_size` words and
/// allows probabilistic prediction of the following word.
///
/// # Responsibilities
/// - Build the chain from tokenized sentences
/// - Accumulate transition counts for each state
/// - Walk the chain from the sentence start (or a given state) to `END`
/// - Merge with another chain of the same order
///
/// # Invariants
/// - `state_size` is always >= 1
/// - Each state in `states` corresponds to a unique window of `state_size` words
/// - All state transitions have occurrence counts >= 1
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "ChainRepr", into = "ChainRepr")]
pub struct Chain {
	state_size: usize,

	/// Mapping from a window of words to its corresponding state
	states: HashMap<Vec<String>, State>,
}

/// Persisted layout of a [`Chain`]: states as a list sorted by key, since
/// word windows cannot be JSON object keys.
#[derive(Serialize, Deserialize)]
struct ChainRepr {
	state_size: usize,
	states: Vec<State>,
}

impl From<Chain> for ChainRepr {
	fn from(chain: Chain) -> Self {
		let mut states: Vec<State> = chain.states.into_values().collect();
		states.sort_by(|a, b| a.key().cmp(b.key()));
		Self { state_size: chain.state_size, states }
	}
}

impl TryFrom<ChainRepr> for Chain {
	type Error = String;

	fn try_from(repr: ChainRepr) -> Result<Self, Self::Error> {
		if repr.state_size == 0 {
			return Err("state_size must be >= 1".to_owned());
		}
		let mut states = HashMap::with_capacity(repr.states.len());
		for state in repr.states {
			if state.key().len() != repr.state_size {
				return Err(format!(
					"state {:?} does not hold {} words",
					state.key(),
					repr.state_size
				));
			}
			states.insert(state.key().to_vec(), state);
		}
		Ok(Self { state_size: repr.state_size, states })
	}
}

impl Chain {
	/// Creates an empty chain of order `state_size`.
	///
	/// # Errors
	/// Returns an error if `state_size < 1`.
	pub fn new(state_size: usize) -> Result<Self, ModelError> {
		if state_size < 1 {
			return Err(ModelError::InvalidStateSize(state_size));
		}
		Ok(Self { state_size, states: HashMap::new() })
	}

	/// Builds a chain from sentences already split into words.
	pub fn build<S: AsRef<[String]>>(corpus: &[S], state_size: usize) -> Result<Self, ModelError> {
		let mut chain = Self::new(state_size)?;
		for run in corpus {
			chain.add_run(run.as_ref());
		}
		Ok(chain)
	}

	pub fn state_size(&self) -> usize {
		self.state_size
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// The state every sentence starts from: `state_size` times `BEGIN`.
	pub fn begin_state(&self) -> Vec<String> {
		vec![BEGIN.to_owned(); self.state_size]
	}

	/// Returns the state for a window of words, if it was ever observed.
	pub fn state(&self, key: &[String]) -> Option<&State> {
		self.states.get(key)
	}

	/// Iterates over every observed window.
	pub fn keys(&self) -> impl Iterator<Item = &[String]> {
		self.states.keys().map(Vec::as_slice)
	}

	/// Adds one sentence to the chain.
	///
	/// The run is padded as `[BEGIN; state_size] + run + [END]` and every
	/// window is mapped to the word that follows it.
	pub fn add_run(&mut self, run: &[String]) {
		let mut items: Vec<String> = Vec::with_capacity(self.state_size + run.len() + 1);
		items.extend(std::iter::repeat_n(BEGIN.to_owned(), self.state_size));
		items.extend_from_slice(run);
		items.push(END.to_owned());

		for window in items.windows(self.state_size + 1) {
			let (key, follow) = window.split_at(self.state_size);
			let state = self.states.entry(key.to_vec()).or_insert_with(|| State::new(key));
			state.add_transition(&follow[0], 1);
		}
	}

	/// Picks the word following `state`.
	///
	/// # Errors
	/// Returns an error if the state was never observed.
	pub fn step<R: Rng + ?Sized>(&self, state: &[String], rng: &mut R) -> Result<String, GenerateError> {
		self.states
			.get(state)
			.and_then(|s| s.predict(rng))
			.map(str::to_owned)
			.ok_or_else(|| GenerateError::UnknownState(state.to_vec()))
	}

	/// Walks the chain from `init_state` (or the begin state) until `END`.
	///
	/// Returns the emitted words, not including the initial state.
	pub fn walk<R: Rng + ?Sized>(&self, init_state: Option<&[String]>, rng: &mut R) -> Result<Vec<String>, GenerateError> {
		let mut state = match init_state {
			Some(init) => init.to_vec(),
			None => self.begin_state(),
		};

		let mut words = Vec::new();
		loop {
			let next_word = self.step(&state, rng)?;
			if next_word == END {
				break;
			}
			state.remove(0);
			state.push(next_word.clone());
			words.push(next_word);
		}
		Ok(words)
	}

	/// Merges another chain into this one, scaling its counts by `weight`.
	///
	/// # Errors
	/// Returns an error if the chain orders do not match.
	pub fn merge(&mut self, other: &Self, weight: usize) -> Result<(), ModelError> {
		if self.state_size != other.state_size {
			return Err(ModelError::StateSizeMismatch { expected: self.state_size, found: other.state_size });
		}

		for (key, state) in &other.states {
			let existing = self.states.entry(key.clone()).or_insert_with(|| State::new(key));
			// Keys are equal by construction
			let _ = existing.merge(state, weight);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn words(sentence: &str) -> Vec<String> {
		sentence.split_whitespace().map(str::to_owned).collect()
	}

	#[test]
	fn rejects_zero_state_size() {
		assert!(matches!(Chain::new(0), Err(ModelError::InvalidStateSize(0))));
	}

	#[test]
	fn pads_runs_with_begin_and_end() {
		let chain = Chain::build(&[words("a b c")], 2).unwrap();

		let begin = chain.begin_state();
		assert_eq!(chain.state(&begin).unwrap().occurrences("a"), 1);
		assert_eq!(chain.state(&words(&format!("{BEGIN} a"))).unwrap().occurrences("b"), 1);
		assert_eq!(chain.state(&words("a b")).unwrap().occurrences("c"), 1);
		assert_eq!(chain.state(&words("b c")).unwrap().occurrences(END), 1);
		assert_eq!(chain.len(), 4);
	}

	#[test]
	fn walk_reproduces_the_only_path() {
		let chain = Chain::build(&[words("the only sentence here")], 2).unwrap();
		let walked = chain.walk(None, &mut StdRng::seed_from_u64(5)).unwrap();
		assert_eq!(walked, words("the only sentence here"));
	}

	#[test]
	fn walk_from_a_given_state() {
		let chain = Chain::build(&[words("one two three four")], 2).unwrap();
		let walked = chain.walk(Some(words("one two").as_slice()), &mut StdRng::seed_from_u64(5)).unwrap();
		assert_eq!(walked, words("three four"));
	}

	#[test]
	fn walking_an_empty_chain_fails() {
		let chain = Chain::new(3).unwrap();
		let err = chain.walk(None, &mut StdRng::seed_from_u64(1)).unwrap_err();
		assert!(matches!(err, GenerateError::UnknownState(_)));
	}

	#[test]
	fn walked_transitions_all_exist_in_the_corpus() {
		let corpus = vec![
			words("the cat sat on the mat"),
			words("the dog sat on the rug"),
			words("a cat ran to the dog"),
		];
		let chain = Chain::build(&corpus, 1).unwrap();
		let mut rng = StdRng::seed_from_u64(11);

		for _ in 0..50 {
			let walked = chain.walk(None, &mut rng).unwrap();
			let mut state = chain.begin_state();
			for word in &walked {
				assert!(chain.state(&state).unwrap().occurrences(word) > 0);
				state = vec![word.clone()];
			}
		}
	}

	#[test]
	fn merge_requires_same_order() {
		let mut left = Chain::new(2).unwrap();
		let right = Chain::new(3).unwrap();
		assert!(matches!(
			left.merge(&right, 1),
			Err(ModelError::StateSizeMismatch { expected: 2, found: 3 })
		));
	}

	#[test]
	fn merge_sums_weighted_counts() {
		let mut left = Chain::build(&[words("a b")], 1).unwrap();
		let right = Chain::build(&[words("a c")], 1).unwrap();
		left.merge(&right, 2).unwrap();

		let begin = left.begin_state();
		assert_eq!(left.state(&begin).unwrap().occurrences("a"), 3);
		assert_eq!(left.state(&words("a")).unwrap().occurrences("b"), 1);
		assert_eq!(left.state(&words("a")).unwrap().occurrences("c"), 2);
	}

	#[test]
	fn serialized_states_are_sorted_and_restorable() {
		let chain = Chain::build(&[words("x y z"), words("y z x")], 1).unwrap();
		let json = serde_json::to_string(&chain).unwrap();
		assert_eq!(json, serde_json::to_string(&chain.clone()).unwrap());

		let restored: Chain = serde_json::from_str(&json).unwrap();
		assert_eq!(restored, chain);
	}

	#[test]
	fn deserialization_checks_window_length() {
		let json = r#"{"state_size":2,"states":[{"key":["a"],"transitions":{"b":1}}]}"#;
		assert!(serde_json::from_str::<Chain>(json).is_err());
	}
}

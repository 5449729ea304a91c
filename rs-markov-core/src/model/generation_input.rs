use crate::error::GenerateError;

pub const DEFAULT_TRIES: usize = 10;
pub const DEFAULT_MAX_OVERLAP_RATIO: f64 = 0.7;
pub const DEFAULT_MAX_OVERLAP_TOTAL: usize = 15;

/// How a sentence may begin.
///
/// # Variants
/// - `Begin`: start from the sentence start of the chain.
/// - `Phrase { words, strict }`: every sentence starts with `words`.
///   With `strict`, the phrase must open a sentence of the corpus; otherwise
///   any state whose words start with the phrase can be used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartPhrase {
	#[default]
	Begin,
	Phrase { words: String, strict: bool },
}

/// Input parameters for sampling sentences from a text model.
///
/// # Responsibilities
/// - Track sampling parameters (`tries`, overlap limits, length bounds, start)
/// - Clamp the overlap ratio and validate the length bounds when they are set
///
/// # Invariants
/// - `max_overlap_ratio` is within `[0.0, 1.0]`
/// - `min_chars <= max_chars` when `max_chars` is set
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
	/// Number of walks to try before giving up on a sentence.
	pub tries: usize,

	/// Upper bound on the number of words shared verbatim with the corpus.
	pub max_overlap_total: usize,

	/// Skip walks shorter than this many words.
	pub min_words: Option<usize>,

	/// Skip walks longer than this many words.
	pub max_words: Option<usize>,

	/// How sentences begin.
	pub start: StartPhrase,

	/// Fraction of a sentence that may be shared verbatim with the corpus.
	max_overlap_ratio: f64,

	/// Character bounds, only applied when `max_chars` is set.
	min_chars: usize,
	max_chars: Option<usize>,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			tries: DEFAULT_TRIES,
			max_overlap_total: DEFAULT_MAX_OVERLAP_TOTAL,
			min_words: None,
			max_words: None,
			start: StartPhrase::Begin,
			max_overlap_ratio: DEFAULT_MAX_OVERLAP_RATIO,
			min_chars: 0,
			max_chars: None,
		}
	}
}

impl GenerationInput {
	/// Creates an input with the given tries and overlap ratio, other
	/// settings at their defaults.
	pub fn new(tries: usize, max_overlap_ratio: f64) -> Self {
		let mut input = Self { tries, ..Self::default() };
		input.set_max_overlap_ratio(max_overlap_ratio);
		input
	}

	pub fn max_overlap_ratio(&self) -> f64 {
		self.max_overlap_ratio
	}

	/// Sets the overlap ratio, clamped to `0.0..=1.0`.
	///
	/// A ratio above 1 allows no more overlap than 1 does; NaN counts as 0.
	pub fn set_max_overlap_ratio(&mut self, ratio: f64) {
		self.max_overlap_ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
	}

	/// Character bounds, `Some((min, max))` when a maximum is set.
	pub fn char_bounds(&self) -> Option<(usize, usize)> {
		self.max_chars.map(|max| (self.min_chars, max))
	}

	/// Restricts sentences to `min_chars..=max_chars` characters.
	///
	/// # Errors
	/// Returns an error if `min_chars > max_chars`.
	pub fn set_char_bounds(&mut self, min_chars: usize, max_chars: usize) -> Result<(), GenerateError> {
		if min_chars > max_chars {
			return Err(GenerateError::InvalidParameter(format!(
				"min chars ({min_chars}) exceeds max chars ({max_chars})"
			)));
		}
		self.min_chars = min_chars;
		self.max_chars = Some(max_chars);
		Ok(())
	}

	/// Whether a walk of `len` words is within the word bounds.
	pub fn accepts_word_count(&self, len: usize) -> bool {
		self.min_words.is_none_or(|min| len >= min) && self.max_words.is_none_or(|max| len <= max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use rstest::rstest;

	#[rstest]
	#[case(0.0)]
	#[case(0.8)]
	#[case(1.0)]
	fn accepts_ratios_in_range(#[case] ratio: f64) {
		let input = GenerationInput::new(32, ratio);
		assert_eq!(input.max_overlap_ratio(), ratio);
		assert_eq!(input.tries, 32);
	}

	#[rstest]
	#[case(-0.1, 0.0)]
	#[case(1.5, 1.0)]
	#[case(f64::INFINITY, 1.0)]
	#[case(f64::NAN, 0.0)]
	fn clamps_ratios_out_of_range(#[case] ratio: f64, #[case] expected: f64) {
		assert_eq!(GenerationInput::new(1, ratio).max_overlap_ratio(), expected);
	}

	#[test]
	fn char_bounds_must_be_ordered() {
		let mut input = GenerationInput::default();
		assert_eq!(input.char_bounds(), None);
		assert!(input.set_char_bounds(10, 5).is_err());
		input.set_char_bounds(5, 10).unwrap();
		assert_eq!(input.char_bounds(), Some((5, 10)));
	}

	#[test]
	fn word_bounds_are_inclusive() {
		let input = GenerationInput { min_words: Some(2), max_words: Some(4), ..GenerationInput::default() };
		assert!(!input.accepts_word_count(1));
		assert!(input.accepts_word_count(2));
		assert!(input.accepts_word_count(4));
		assert!(!input.accepts_word_count(5));
	}
}

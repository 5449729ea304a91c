use std::path::Path;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::chain::{BEGIN, Chain};
use super::generation_input::{GenerationInput, StartPhrase};
use super::splitter::{self, SentenceSplitter, join_words, split_words};
use crate::error::{GenerateError, ModelError};
use crate::io::{ModelFormat, read_model_file, write_model_file};

/// Version written into every persisted model.
///
/// A model file can only be loaded by code that writes the same version.
pub const FORMAT_VERSION: u32 = 1;

/// Persisted layout of a [`TextModel`].
#[derive(Serialize, Deserialize)]
struct PersistedModel {
	format_version: u32,
	state_size: usize,
	splitter: SentenceSplitter,
	chain: Chain,
	parsed_sentences: Option<Vec<Vec<String>>>,
}

/// A sentence generator trained on a body of text.
///
/// This struct manages:
/// - `chain`: the word chain of order `state_size`.
/// - `splitter`: how the training text was cut into sentences.
/// - `parsed_sentences`: the training sentences, split into words, kept to
///   reject generated sentences that copy the source too closely.
/// - `rejoined_text`: the training sentences joined back into one string,
///   derived from `parsed_sentences` and never persisted.
#[derive(Debug, Clone)]
pub struct TextModel {
	state_size: usize,
	splitter: SentenceSplitter,
	chain: Chain,
	parsed_sentences: Option<Vec<Vec<String>>>,
	rejoined_text: Option<String>,
}

/// Options for building a [`TextModel`] from raw text.
#[derive(Debug, Clone)]
pub struct TextModelBuilder {
	state_size: usize,
	splitter: SentenceSplitter,
	well_formed: bool,
	retain_original: bool,
}

impl TextModelBuilder {
	/// Chooses how the text is cut into sentences.
	pub fn splitter(mut self, splitter: SentenceSplitter) -> Self {
		self.splitter = splitter;
		self
	}

	/// When set (the default), sentences with quotes or brackets are skipped.
	pub fn well_formed(mut self, well_formed: bool) -> Self {
		self.well_formed = well_formed;
		self
	}

	/// When set (the default), the training sentences are kept in the model
	/// so generated sentences can be checked for overlap.
	pub fn retain_original(mut self, retain_original: bool) -> Self {
		self.retain_original = retain_original;
		self
	}

	/// Splits `text` into sentences and words and builds the chain.
	///
	/// # Errors
	/// Returns an error if the state size is 0.
	pub fn build(&self, text: &str) -> Result<TextModel, ModelError> {
		let runs: Vec<Vec<String>> = self
			.splitter
			.split(text)
			.into_iter()
			.filter(|sentence| !splitter::is_blank(sentence))
			.filter(|sentence| !self.well_formed || splitter::is_well_formed(sentence))
			.map(split_words)
			.collect();

		let chain = Chain::build(&runs, self.state_size)?;
		debug!(
			"built chain of order {} from {} sentences ({} states)",
			self.state_size,
			runs.len(),
			chain.len()
		);

		let parsed_sentences = self.retain_original.then_some(runs);
		Ok(TextModel::from_parts(self.state_size, self.splitter, chain, parsed_sentences))
	}
}

impl TextModel {
	/// Starts building a model of order `state_size` with default options.
	pub fn builder(state_size: usize) -> TextModelBuilder {
		TextModelBuilder {
			state_size,
			splitter: SentenceSplitter::default(),
			well_formed: true,
			retain_original: true,
		}
	}

	/// Builds a model of order `state_size` from `text` with default options.
	pub fn new(text: &str, state_size: usize) -> Result<Self, ModelError> {
		Self::builder(state_size).build(text)
	}

	fn from_parts(
		state_size: usize,
		splitter: SentenceSplitter,
		chain: Chain,
		parsed_sentences: Option<Vec<Vec<String>>>,
	) -> Self {
		let rejoined_text = parsed_sentences.as_ref().map(|sentences| {
			let joined: Vec<String> = sentences.iter().map(|words| join_words(words)).collect();
			join_words(&joined)
		});
		Self { state_size, splitter, chain, parsed_sentences, rejoined_text }
	}

	pub fn state_size(&self) -> usize {
		self.state_size
	}

	pub fn splitter(&self) -> SentenceSplitter {
		self.splitter
	}

	pub fn chain(&self) -> &Chain {
		&self.chain
	}

	/// Training sentences, if the model retains them.
	pub fn parsed_sentences(&self) -> Option<&[Vec<String>]> {
		self.parsed_sentences.as_deref()
	}

	/// Samples one sentence according to `input`.
	///
	/// # Returns
	/// - `Ok(Some(sentence))` on success
	/// - `Ok(None)` if every try failed the word, character or overlap limits,
	///   or no sentence could start with the requested phrase
	///
	/// # Errors
	/// Returns an error if the chain cannot be walked (for instance an empty
	/// model) or the start phrase has the wrong number of words.
	pub fn make_sentence<R: Rng + ?Sized>(&self, input: &GenerationInput, rng: &mut R) -> Result<Option<String>, GenerateError> {
		match input.char_bounds() {
			Some((min_chars, max_chars)) => self.make_short_sentence(max_chars, min_chars, input, rng),
			None => self.make_unbounded_sentence(input, rng),
		}
	}

	/// Samples a sentence of `min_chars..=max_chars` characters.
	///
	/// Calls the sampler up to `input.tries` times, each of which makes up to
	/// `input.tries` walks itself.
	pub fn make_short_sentence<R: Rng + ?Sized>(
		&self,
		max_chars: usize,
		min_chars: usize,
		input: &GenerationInput,
		rng: &mut R,
	) -> Result<Option<String>, GenerateError> {
		for _ in 0..input.tries {
			if let Some(sentence) = self.make_unbounded_sentence(input, rng)? {
				let len = sentence.chars().count();
				if (min_chars..=max_chars).contains(&len) {
					return Ok(Some(sentence));
				}
			}
		}
		Ok(None)
	}

	fn make_unbounded_sentence<R: Rng + ?Sized>(&self, input: &GenerationInput, rng: &mut R) -> Result<Option<String>, GenerateError> {
		match &input.start {
			StartPhrase::Begin => self.sample(None, input, rng),
			StartPhrase::Phrase { words, strict } => match self.make_sentence_with_start(words, *strict, input, rng) {
				Ok(sentence) => Ok(Some(sentence)),
				Err(GenerateError::NoSentenceWithStart(_)) => Ok(None),
				Err(err) => Err(err),
			},
		}
	}

	/// Samples a sentence starting with `beginning`.
	///
	/// `beginning` must hold between 1 and `state_size` words.
	/// - With exactly `state_size` words it is used as the initial state.
	/// - With fewer words and `strict`, it must open a sentence: the state is
	///   padded on the left with the begin marker.
	/// - With fewer words and not `strict`, every state starting with those
	///   words is tried, in random order.
	///
	/// # Errors
	/// - `StartWordCount` if `beginning` has too few or too many words
	/// - `NoSentenceWithStart` if no candidate state produced a sentence
	pub fn make_sentence_with_start<R: Rng + ?Sized>(
		&self,
		beginning: &str,
		strict: bool,
		input: &GenerationInput,
		rng: &mut R,
	) -> Result<String, GenerateError> {
		let split = split_words(beginning);
		let word_count = split.len();

		let mut init_states: Vec<Vec<String>> = if word_count == self.state_size {
			vec![split]
		} else if word_count > 0 && word_count < self.state_size {
			if strict {
				let mut state = vec![BEGIN.to_owned(); self.state_size - word_count];
				state.extend(split);
				vec![state]
			} else {
				self.chain
					.keys()
					.filter(|key| {
						let mut words = key.iter().filter(|word| *word != BEGIN);
						split.iter().all(|expected| words.next() == Some(expected))
					})
					.map(<[String]>::to_vec)
					.collect()
			}
		} else {
			return Err(GenerateError::StartWordCount {
				max: self.state_size,
				found: word_count,
				beginning: beginning.to_owned(),
			});
		};

		// Sorted first so that a seeded random source gives a stable order.
		init_states.sort();
		init_states.shuffle(rng);

		for init_state in &init_states {
			// A strict phrase absent from the corpus has no state to walk from.
			if self.chain.state(init_state).is_none() {
				continue;
			}
			if let Some(sentence) = self.sample(Some(init_state.as_slice()), input, rng)? {
				return Ok(sentence);
			}
		}

		Err(GenerateError::NoSentenceWithStart(beginning.to_owned()))
	}

	/// Walks the chain up to `input.tries` times and returns the first
	/// sentence within the word bounds that passes the overlap test.
	fn sample<R: Rng + ?Sized>(&self, init_state: Option<&[String]>, input: &GenerationInput, rng: &mut R) -> Result<Option<String>, GenerateError> {
		let prefix: Vec<String> = init_state
			.unwrap_or_default()
			.iter()
			.skip_while(|word| *word == BEGIN)
			.cloned()
			.collect();

		for _ in 0..input.tries {
			let mut words = prefix.clone();
			words.extend(self.chain.walk(init_state, rng)?);

			if !input.accepts_word_count(words.len()) {
				continue;
			}
			if !self.test_sentence_output(&words, input.max_overlap_ratio(), input.max_overlap_total) {
				continue;
			}
			return Ok(Some(join_words(&words)));
		}

		Ok(None)
	}

	/// Whether a generated sentence differs enough from the training text.
	///
	/// With `L` words, at most `min(max_overlap_total, round(max_overlap_ratio * L))`
	/// consecutive words may appear verbatim in the training text. Models
	/// that do not retain their sentences accept everything.
	pub fn test_sentence_output<S: AsRef<str>>(&self, words: &[S], max_overlap_ratio: f64, max_overlap_total: usize) -> bool {
		let Some(rejoined_text) = &self.rejoined_text else {
			return true;
		};

		let len = words.len();
		// Saturating cast: negative and NaN ratios give 0
		let overlap_ratio = (max_overlap_ratio * len as f64).round_ties_even() as usize;
		let overlap_max = max_overlap_total.min(overlap_ratio);
		let overlap_over = overlap_max + 1;
		let gram_count = len.saturating_sub(overlap_max).max(1);

		(0..gram_count).all(|i| {
			let end = (i + overlap_over).min(len);
			let gram = join_words(&words[i.min(end)..end]);
			!rejoined_text.contains(&gram)
		})
	}

	/// Combines several models into one by summing their transition counts.
	///
	/// `weights` scales each model's counts (one weight per model, default 1).
	/// Training sentences are kept only when every model retains them.
	///
	/// # Errors
	/// - `NoModels` if `models` is empty
	/// - `WeightCount` if the number of weights differs from the number of models
	/// - `StateSizeMismatch` if the models have different orders
	pub fn combine(models: &[&Self], weights: Option<&[usize]>) -> Result<Self, ModelError> {
		let first = models.first().ok_or(ModelError::NoModels)?;
		if let Some(weights) = weights {
			if weights.len() != models.len() {
				return Err(ModelError::WeightCount { models: models.len(), weights: weights.len() });
			}
		}

		let mut chain = Chain::new(first.state_size)?;
		let mut parsed_sentences: Option<Vec<Vec<String>>> = Some(Vec::new());

		for (i, model) in models.iter().enumerate() {
			if model.state_size != first.state_size {
				return Err(ModelError::StateSizeMismatch { expected: first.state_size, found: model.state_size });
			}
			let weight = weights.map_or(1, |weights| weights[i]);
			chain.merge(&model.chain, weight)?;

			parsed_sentences = match (parsed_sentences, &model.parsed_sentences) {
				(Some(mut all), Some(sentences)) => {
					all.extend(sentences.iter().cloned());
					Some(all)
				}
				_ => None,
			};
		}

		Ok(Self::from_parts(first.state_size, first.splitter, chain, parsed_sentences))
	}

	fn to_persisted(&self) -> PersistedModel {
		PersistedModel {
			format_version: FORMAT_VERSION,
			state_size: self.state_size,
			splitter: self.splitter,
			chain: self.chain.clone(),
			parsed_sentences: self.parsed_sentences.clone(),
		}
	}

	fn from_persisted(persisted: PersistedModel) -> Result<Self, ModelError> {
		if persisted.format_version != FORMAT_VERSION {
			return Err(ModelError::UnsupportedVersion { found: persisted.format_version, expected: FORMAT_VERSION });
		}
		if persisted.chain.state_size() != persisted.state_size {
			return Err(ModelError::StateSizeMismatch {
				expected: persisted.state_size,
				found: persisted.chain.state_size(),
			});
		}
		Ok(Self::from_parts(persisted.state_size, persisted.splitter, persisted.chain, persisted.parsed_sentences))
	}

	pub fn to_json(&self) -> Result<String, ModelError> {
		Ok(serde_json::to_string(&self.to_persisted())?)
	}

	pub fn from_json(json: &str) -> Result<Self, ModelError> {
		Self::from_persisted(serde_json::from_str(json)?)
	}

	/// Serializes the model with `postcard`.
	pub fn to_postcard(&self) -> Result<Vec<u8>, ModelError> {
		Ok(postcard::to_stdvec(&self.to_persisted())?)
	}

	pub fn from_postcard(bytes: &[u8]) -> Result<Self, ModelError> {
		Self::from_persisted(postcard::from_bytes(bytes)?)
	}

	/// Writes the model to `path`, as `postcard` binary for `.bin` files and
	/// JSON otherwise.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		let bytes = match ModelFormat::from_path(&path) {
			ModelFormat::Json => self.to_json()?.into_bytes(),
			ModelFormat::Binary => self.to_postcard()?,
		};
		write_model_file(&path, &bytes)?;
		debug!("saved model to {}", path.as_ref().display());
		Ok(())
	}

	/// Reads a model written by [`TextModel::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
		let bytes = read_model_file(&path)?;
		let model = match ModelFormat::from_path(&path) {
			ModelFormat::Json => Self::from_persisted(serde_json::from_slice(&bytes)?)?,
			ModelFormat::Binary => Self::from_postcard(&bytes)?,
		};
		debug!("loaded model of order {} from {}", model.state_size, path.as_ref().display());
		Ok(model)
	}
}

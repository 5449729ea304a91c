use crate::error::{GenerateError, ModelError};
use crate::model::generation_input::GenerationInput;
use crate::model::text_model::TextModel;
use log::{debug, trace};
use rand::Rng;
use std::path::Path;

/// High-level generator producing a batch of sentences from one model.
///
/// # Responsibilities
/// - Own a loaded `TextModel` and the `GenerationInput` to sample with
/// - Sample `count` sentences, dropping the ones whose tries all failed
#[derive(Debug)]
pub struct Generator {
	model: TextModel,
	input: GenerationInput,
}

impl Generator {
	pub fn new(model: TextModel, input: GenerationInput) -> Self {
		Self { model, input }
	}

	/// Creates a generator from a model file written by [`TextModel::save`].
	///
	/// # Errors
	/// Returns an error if the file cannot be read or decoded.
	pub fn load<P: AsRef<Path>>(filepath: P, input: GenerationInput) -> Result<Self, ModelError> {
		Ok(Self::new(TextModel::load(filepath)?, input))
	}

	pub fn model(&self) -> &TextModel {
		&self.model
	}

	pub fn input(&self) -> &GenerationInput {
		&self.input
	}

	pub fn input_mut(&mut self) -> &mut GenerationInput {
		&mut self.input
	}

	/// Generates up to `count` sentences with the thread-local random source.
	pub fn generate(&self, count: usize) -> Result<Vec<String>, GenerateError> {
		self.generate_with(count, &mut rand::rng())
	}

	/// Generates up to `count` sentences.
	///
	/// # Behavior
	/// - Makes `count` sampling attempts, each with `input.tries` walks.
	/// - An attempt whose walks all fail the constraints yields nothing, so
	///   fewer than `count` sentences may be returned.
	/// - Sentences are returned in generation order.
	///
	/// # Errors
	/// Stops at the first sampling error (e.g. an empty model).
	pub fn generate_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<String>, GenerateError> {
		let mut sentences = Vec::with_capacity(count);
		for i in 0..count {
			match self.model.make_sentence(&self.input, rng)? {
				Some(sentence) => sentences.push(sentence),
				None => trace!("attempt {} produced no sentence after {} tries", i + 1, self.input.tries),
			}
		}
		debug!("generated {} of {} sentences", sentences.len(), count);
		Ok(sentences)
	}
}

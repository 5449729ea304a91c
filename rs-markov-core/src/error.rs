use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a corpus directory.
///
/// These never abort a build on their own: the reader hands back whatever
/// text it gathered before the failure alongside the error.
#[derive(Debug, Error)]
pub enum CorpusError {
	/// The directory itself could not be listed.
	#[error("failed to read directory {}: {source}", .path.display())]
	ReadDir {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	/// A `.txt` file inside the directory could not be read.
	#[error("failed to read file {}: {source}", .path.display())]
	ReadFile {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Errors raised while building, combining, saving or loading a model.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("state size must be >= 1, got {0}")]
	InvalidStateSize(usize),

	#[error("failed to access model file {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid JSON model: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid binary model: {0}")]
	Postcard(#[from] postcard::Error),

	#[error("unsupported model format version {found} (expected {expected})")]
	UnsupportedVersion { found: u32, expected: u32 },

	#[error("all models must have the same state size ({expected} != {found})")]
	StateSizeMismatch { expected: usize, found: usize },

	#[error("no models to combine")]
	NoModels,

	#[error("{weights} weights given for {models} models")]
	WeightCount { models: usize, weights: usize },
}

/// Errors raised while sampling sentences from a model.
#[derive(Debug, Error)]
pub enum GenerateError {
	#[error("{0}")]
	InvalidParameter(String),

	/// The walk reached a state that the chain never saw.
	/// Happens with an empty model or a strict start phrase absent from the corpus.
	#[error("state {0:?} is not present in the chain")]
	UnknownState(Vec<String>),

	#[error("a start phrase for this model needs 1 to {max} words, got {found}: {beginning:?}")]
	StartWordCount {
		max: usize,
		found: usize,
		beginning: String,
	},

	#[error("cannot find a sentence beginning with {0:?}")]
	NoSentenceWithStart(String),
}

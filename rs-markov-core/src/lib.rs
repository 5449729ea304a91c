//! Markov-chain sentence generation library.
//!
//! This crate provides:
//! - Corpus reading from a directory of `.txt` files
//! - A word-level Markov text model of configurable order
//! - Sentence sampling with bounded verbatim overlap against the corpus
//! - JSON and compact binary persistence of models

/// Errors raised by corpus reading, model handling and generation.
pub mod error;

/// Corpus reading and model file helpers.
pub mod io;

/// Text model and generation logic.
pub mod model;

pub use error::{CorpusError, GenerateError, ModelError};
pub use io::Corpus;
pub use model::generation_input::{GenerationInput, StartPhrase};
pub use model::generator::Generator;
pub use model::splitter::SentenceSplitter;
pub use model::text_model::TextModel;

//! Word-level Markov text model and sentence generation.
//!
//! This module provides:
//! - Sentence and word splitting (`splitter`)
//! - The word chain and its states (`Chain`, `State`)
//! - The trained model with overlap checks and persistence (`TextModel`)
//! - Sampling parameters (`GenerationInput`)
//! - A batch interface (`Generator`)

/// Batch sentence generation from a loaded model.
pub mod generator;

/// Validated sampling parameters: tries, overlap limits, length bounds
/// and start phrase.
pub mod generation_input;

/// Word chain of a fixed order.
///
/// Handles run ingestion, transition counting, weighted walks
/// and chain merging.
pub mod chain;

/// Sentence splitting, word splitting and training input filtering.
pub mod splitter;

/// The trained text model: building, sampling with overlap rejection,
/// combination and (de)serialization.
pub mod text_model;

/// A single chain state (window of words).
///
/// Tracks outgoing transitions and supports weighted random sampling.
pub mod state;

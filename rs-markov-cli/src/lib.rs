//! Support library for the rs-markov CLI binary.
//!
//! Exposes the command pipeline so tests can drive it without spawning a
//! process.

pub mod cli;
pub mod logging;

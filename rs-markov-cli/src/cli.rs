//! Argument parsing and mode dispatch for the `rs-markov` binary.
//!
//! `build` reads a corpus directory into a model file; `run` samples
//! sentences from a model file, building it first when it is missing.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use log::{debug, info, warn};
use rs_markov_core::{
	Corpus, GenerateError, GenerationInput, Generator, ModelError, SentenceSplitter, StartPhrase, TextModel,
};
use thiserror::Error;

/// Corpus directory used when run mode has to build a missing model.
pub const DEFAULT_DIRECTORY: &str = "input";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
	name = "rs-markov",
	version,
	about = "Generate a random sentence or build a model based on text files in a directory."
)]
pub struct Cli {
	/// The directory to read text files from
	#[arg(short = 'd', long = "Directory", value_name = "DIRECTORY", default_value = DEFAULT_DIRECTORY, env = "RS_MARKOV_DIRECTORY")]
	pub directory: PathBuf,

	/// The mode of operation - "build" or "run"
	#[arg(short = 'm', long = "Mode", value_name = "MODE", default_value = "run", env = "RS_MARKOV_MODE")]
	pub mode: String,

	/// The file to save/load the model (`.bin` for a compact binary model)
	#[arg(short = 'f', long = "File", value_name = "FILE", default_value = "model.json", env = "RS_MARKOV_FILE")]
	pub file: PathBuf,

	/// The state size of the Markov model
	#[arg(short = 's', long = "StateSize", value_name = "STATE_SIZE", default_value_t = 3)]
	pub state_size: usize,

	/// The number of tries for generating a sentence
	#[arg(short = 't', long = "Tries", value_name = "TRIES", default_value_t = 32)]
	pub tries: usize,

	/// The maximum overlap ratio
	#[arg(short = 'o', long = "OverlapRatio", value_name = "OVERLAP_RATIO", default_value_t = 0.8)]
	pub overlap_ratio: f64,

	/// The number of sentences to generate
	#[arg(short = 'c', long = "Count", value_name = "COUNT", default_value_t = 1)]
	pub count: usize,

	/// The maximum number of words a sentence may share verbatim with the corpus
	#[arg(long = "MaxOverlapTotal", value_name = "WORDS", default_value_t = 15)]
	pub max_overlap_total: usize,

	/// Only keep sentences of at most this many characters
	#[arg(long = "MaxChars", value_name = "CHARS")]
	pub max_chars: Option<usize>,

	/// Only keep sentences of at least this many characters (with --MaxChars)
	#[arg(long = "MinChars", value_name = "CHARS", default_value_t = 0)]
	pub min_chars: usize,

	/// Skip sentences shorter than this many words
	#[arg(long = "MinWords", value_name = "WORDS")]
	pub min_words: Option<usize>,

	/// Skip sentences longer than this many words
	#[arg(long = "MaxWords", value_name = "WORDS")]
	pub max_words: Option<usize>,

	/// Begin every sentence with these words (1 to state size words)
	#[arg(long = "Start", value_name = "WORDS")]
	pub start: Option<String>,

	/// Let --Start match words in the middle of a corpus sentence
	#[arg(long = "NonStrictStart")]
	pub non_strict_start: bool,

	/// Build mode: treat each line of the corpus as one sentence
	#[arg(long = "NewlineSentences")]
	pub newline_sentences: bool,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	pub verbose: u8,
}

/// Operation selected by `--Mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	Build,
	Run,
}

impl FromStr for Mode {
	type Err = CliError;

	/// Case-insensitive: `BUILD`, `Build` and `build` are the same mode.
	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.to_lowercase().as_str() {
			"build" => Ok(Self::Build),
			"run" => Ok(Self::Run),
			_ => Err(CliError::UnknownMode(raw.to_owned())),
		}
	}
}

/// Settings for building a model file from a corpus directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
	pub directory: PathBuf,
	pub file: PathBuf,
	pub state_size: usize,
	pub splitter: SentenceSplitter,
}

/// Errors reported by the top-level reporter.
///
/// Messages embed the underlying error so the report reads as one line.
#[derive(Debug, Error)]
pub enum CliError {
	#[error("Unknown mode: {0}")]
	UnknownMode(String),

	#[error("Invalid generation settings: {0}")]
	InvalidSettings(GenerateError),

	#[error("An error occurred while building the model: {0}")]
	Build(ModelError),

	#[error("An error occurred while saving the model: {0}")]
	Save(ModelError),

	#[error("Error occurred while loading the model: {0}")]
	Load(ModelError),

	#[error("Error occurred while generating: {0}")]
	Generate(GenerateError),

	#[error("failed to write output")]
	Output(#[from] io::Error),
}

impl Cli {
	/// Resolves `--Mode`.
	///
	/// # Errors
	/// Returns [`CliError::UnknownMode`] for anything but `build` or `run`.
	pub fn mode(&self) -> Result<Mode, CliError> {
		self.mode.parse()
	}

	pub fn build_config(&self) -> BuildConfig {
		BuildConfig {
			directory: self.directory.clone(),
			file: self.file.clone(),
			state_size: self.state_size,
			splitter: if self.newline_sentences {
				SentenceSplitter::Newline
			} else {
				SentenceSplitter::Punctuation
			},
		}
	}

	/// Build settings for a model missing in run mode: the `input` directory
	/// with the configured file, state size and splitter.
	pub fn fallback_build_config(&self) -> BuildConfig {
		BuildConfig { directory: PathBuf::from(DEFAULT_DIRECTORY), ..self.build_config() }
	}

	/// Collects the sampling flags into a validated [`GenerationInput`].
	///
	/// # Errors
	/// Returns [`CliError::InvalidSettings`] for a minimum character count
	/// above the maximum.
	pub fn generation_input(&self) -> Result<GenerationInput, CliError> {
		let mut input = GenerationInput::new(self.tries, self.overlap_ratio);
		input.max_overlap_total = self.max_overlap_total;
		input.min_words = self.min_words;
		input.max_words = self.max_words;
		if let Some(max_chars) = self.max_chars {
			input.set_char_bounds(self.min_chars, max_chars).map_err(CliError::InvalidSettings)?;
		}
		if let Some(words) = &self.start {
			input.start = StartPhrase::Phrase { words: words.clone(), strict: !self.non_strict_start };
		}
		Ok(input)
	}
}

/// Executes the selected mode, writing user-facing output to `out`.
///
/// In `run` mode a missing model file is built first from the `input`
/// directory, whatever `--Directory` says, with the configured state size.
///
/// # Errors
/// Returns the first failure; nothing is retried.
pub fn run_cli<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
	let mode = cli.mode()?;
	debug!("running in {mode:?} mode");

	match mode {
		Mode::Build => build_model(&cli.build_config(), out).map(|_| ()),
		Mode::Run => {
			let input = cli.generation_input()?;
			if !cli.file.exists() {
				writeln!(out, "Model file {} does not exist. Switching to build mode.", cli.file.display())?;
				build_model(&cli.fallback_build_config(), out)?;
			}
			generate_sentences(&cli.file, cli.count, input, out)
		}
	}
}

/// Reads the corpus, builds the model and writes it to `config.file`.
///
/// A corpus read failure is reported and the model is built from the text
/// read before it.
pub fn build_model<W: Write>(config: &BuildConfig, out: &mut W) -> Result<TextModel, CliError> {
	let corpus = Corpus::read(&config.directory);
	if let Some(err) = corpus.failure() {
		warn!("{err}");
		writeln!(out, "An error occurred while reading files: {err}")?;
	}
	info!("read {} files from {}", corpus.files().len(), config.directory.display());

	let model = TextModel::builder(config.state_size)
		.splitter(config.splitter)
		.build(corpus.text())
		.map_err(CliError::Build)?;
	model.save(&config.file).map_err(CliError::Save)?;

	writeln!(out, "Model has been built and saved to {}", config.file.display())?;
	Ok(model)
}

/// Loads the model at `file` and writes up to `count` sentences, one per line.
pub fn generate_sentences<W: Write>(file: &Path, count: usize, input: GenerationInput, out: &mut W) -> Result<(), CliError> {
	let generator = Generator::load(file, input).map_err(CliError::Load)?;
	let sentences = generator.generate(count).map_err(CliError::Generate)?;
	info!("generated {} of {} sentences", sentences.len(), count);

	if !sentences.is_empty() {
		writeln!(out, "{}", sentences.join("\n"))?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	use rstest::rstest;
	use std::fs;
	use tempfile::TempDir;

	const CORPUS: &str = "The cat sat on the mat. The dog sat on the rug. \
		A cat ran to the dog. A dog ran to the cat. The cat ran on the rug.";

	fn parse(args: &[&str]) -> Cli {
		Cli::try_parse_from(std::iter::once("rs-markov").chain(args.iter().copied())).unwrap()
	}

	fn corpus_dir() -> TempDir {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("input")).unwrap();
		fs::write(dir.path().join("input").join("animals.txt"), CORPUS).unwrap();
		dir
	}

	fn path_arg(path: &Path) -> String {
		path.display().to_string()
	}

	#[test]
	fn defaults_match_the_documented_ones() {
		let cli = parse(&[]);
		assert_eq!(cli.directory, PathBuf::from("input"));
		assert_eq!(cli.mode().unwrap(), Mode::Run);
		assert_eq!(cli.file, PathBuf::from("model.json"));
		assert_eq!(cli.state_size, 3);
		assert_eq!(cli.tries, 32);
		assert_eq!(cli.overlap_ratio, 0.8);
		assert_eq!(cli.count, 1);
	}

	#[test]
	fn short_and_long_flags_parse() {
		let cli = parse(&["-d", "corpus", "--Mode", "build", "-f", "m.bin", "-s", "2", "-t", "5", "-o", "0.5", "--Count", "4"]);
		assert_eq!(cli.directory, PathBuf::from("corpus"));
		assert_eq!(cli.mode().unwrap(), Mode::Build);
		assert_eq!(cli.file, PathBuf::from("m.bin"));
		assert_eq!(cli.state_size, 2);
		assert_eq!(cli.tries, 5);
		assert_eq!(cli.overlap_ratio, 0.5);
		assert_eq!(cli.count, 4);
	}

	#[rstest]
	#[case("build", Mode::Build)]
	#[case("BUILD", Mode::Build)]
	#[case("Run", Mode::Run)]
	fn modes_are_case_insensitive(#[case] raw: &str, #[case] expected: Mode) {
		assert_eq!(raw.parse::<Mode>().unwrap(), expected);
	}

	#[test]
	fn unknown_mode_has_no_side_effects() {
		let dir = corpus_dir();
		let model = dir.path().join("model.json");
		let cli = parse(&["-m", "frobnicate", "-d", &path_arg(&dir.path().join("input")), "-f", &path_arg(&model)]);

		let mut out = Vec::new();
		let err = run_cli(&cli, &mut out).unwrap_err();
		assert_eq!(err.to_string(), "Unknown mode: frobnicate");
		assert!(out.is_empty());
		assert!(!model.exists());
	}

	#[test]
	fn build_writes_a_loadable_model() {
		let dir = corpus_dir();
		let model = dir.path().join("model.json");
		let cli = parse(&["-m", "build", "-s", "2", "-d", &path_arg(&dir.path().join("input")), "-f", &path_arg(&model)]);

		let mut out = Vec::new();
		run_cli(&cli, &mut out).unwrap();
		let printed = String::from_utf8(out).unwrap();
		assert!(printed.starts_with("Model has been built and saved to"));
		assert_eq!(TextModel::load(&model).unwrap().state_size(), 2);
	}

	#[test]
	fn build_from_missing_directory_still_writes_a_model() {
		let dir = TempDir::new().unwrap();
		let model = dir.path().join("model.json");
		let config = BuildConfig {
			directory: dir.path().join("absent"),
			file: model.clone(),
			state_size: 3,
			splitter: SentenceSplitter::Punctuation,
		};

		let mut out = Vec::new();
		build_model(&config, &mut out).unwrap();
		let printed = String::from_utf8(out).unwrap();
		assert!(printed.contains("An error occurred while reading files"));
		assert!(model.exists());
	}

	#[test]
	fn run_fallback_builds_from_the_default_directory() {
		let cli = parse(&["-d", "other", "-f", "m.bin", "-s", "2", "--NewlineSentences"]);
		let config = cli.fallback_build_config();
		assert_eq!(config.directory, PathBuf::from("input"));
		assert_eq!(config.file, PathBuf::from("m.bin"));
		assert_eq!(config.state_size, 2);
		assert_eq!(config.splitter, SentenceSplitter::Newline);
	}

	#[test]
	fn run_with_a_model_does_not_rebuild() {
		let dir = corpus_dir();
		let model = dir.path().join("model.json");
		let config = BuildConfig {
			directory: dir.path().join("input"),
			file: model.clone(),
			state_size: 1,
			splitter: SentenceSplitter::Punctuation,
		};
		build_model(&config, &mut Vec::new()).unwrap();

		let cli = parse(&["-d", "absent", "-f", &path_arg(&model), "-o", "1.0", "-c", "3"]);
		let mut out = Vec::new();
		run_cli(&cli, &mut out).unwrap();
		let printed = String::from_utf8(out).unwrap();
		assert!(!printed.contains("does not exist"));
		assert!(printed.lines().count() <= 3);
	}

	#[test]
	fn zero_count_prints_nothing() {
		let dir = corpus_dir();
		let model = dir.path().join("model.json");
		let config = BuildConfig {
			directory: dir.path().join("input"),
			file: model.clone(),
			state_size: 1,
			splitter: SentenceSplitter::Punctuation,
		};
		build_model(&config, &mut Vec::new()).unwrap();

		let mut out = Vec::new();
		generate_sentences(&model, 0, GenerationInput::default(), &mut out).unwrap();
		assert!(out.is_empty());
	}

	#[test]
	fn corrupt_model_is_a_load_error() {
		let dir = TempDir::new().unwrap();
		let model = dir.path().join("model.json");
		fs::write(&model, "{ not a model").unwrap();

		let err = generate_sentences(&model, 1, GenerationInput::default(), &mut Vec::new()).unwrap_err();
		assert!(matches!(err, CliError::Load(ModelError::Json(_))));
		assert!(err.to_string().starts_with("Error occurred while loading the model:"));
	}

	#[test]
	fn empty_model_is_a_generation_error() {
		let dir = TempDir::new().unwrap();
		let model = dir.path().join("model.json");
		TextModel::new("", 3).unwrap().save(&model).unwrap();

		let err = generate_sentences(&model, 1, GenerationInput::default(), &mut Vec::new()).unwrap_err();
		assert!(matches!(err, CliError::Generate(_)));
	}

	#[rstest]
	#[case("--OverlapRatio=2.5", 1.0)]
	#[case("--OverlapRatio=-1", 0.0)]
	#[case("--OverlapRatio=0.3", 0.3)]
	fn overlap_ratio_is_clamped_not_rejected(#[case] arg: &str, #[case] expected: f64) {
		let input = parse(&[arg]).generation_input().unwrap();
		assert_eq!(input.max_overlap_ratio(), expected);
	}

	#[test]
	fn output_error_message_does_not_repeat_its_source() {
		let err = CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
		assert_eq!(err.to_string(), "failed to write output");
		assert_eq!(format!("{:#}", anyhow::Error::from(err)), "failed to write output: pipe closed");
	}

	#[test]
	fn optional_flags_reach_the_generation_input() {
		let cli = parse(&["--MaxChars", "80", "--MinChars", "10", "--MaxWords", "12", "--Start", "The cat", "--NonStrictStart"]);
		let input = cli.generation_input().unwrap();
		assert_eq!(input.char_bounds(), Some((10, 80)));
		assert_eq!(input.max_words, Some(12));
		assert_eq!(input.start, StartPhrase::Phrase { words: "The cat".to_owned(), strict: false });
	}

	#[test]
	fn newline_flag_selects_the_line_splitter() {
		assert_eq!(parse(&["--NewlineSentences"]).build_config().splitter, SentenceSplitter::Newline);
		assert_eq!(parse(&[]).build_config().splitter, SentenceSplitter::Punctuation);
	}
}

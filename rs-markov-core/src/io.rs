use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::{CorpusError, ModelError};

/// Suffix of the file names gathered into a corpus; a file named just
/// `.txt` counts too.
pub const CORPUS_SUFFIX: &str = ".txt";

/// Text gathered from a corpus directory.
///
/// Reading stops at the first failure; the text read up to that point is
/// kept and the failure is available through [`Corpus::failure`].
#[derive(Debug, Default)]
pub struct Corpus {
	text: String,
	files: Vec<PathBuf>,
	failure: Option<CorpusError>,
}

impl Corpus {
	/// Reads every `.txt` file directly inside `dir` (non-recursive).
	///
	/// - Files are visited in directory-listing order
	/// - Each file's content is followed by `\n`
	pub fn read<P: AsRef<Path>>(dir: P) -> Self {
		let dir = dir.as_ref();
		let mut corpus = Self::default();

		let entries = match fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(source) => {
				corpus.failure = Some(CorpusError::ReadDir { path: dir.to_owned(), source });
				return corpus;
			}
		};

		for entry in entries {
			let path = match entry {
				Ok(entry) => entry.path(),
				Err(source) => {
					corpus.failure = Some(CorpusError::ReadDir { path: dir.to_owned(), source });
					break;
				}
			};

			if !is_corpus_file(&path) {
				trace!("skipping {}", path.display());
				continue;
			}

			match fs::read_to_string(&path) {
				Ok(content) => {
					debug!("read {} ({} bytes)", path.display(), content.len());
					corpus.text.push_str(&content);
					corpus.text.push('\n');
					corpus.files.push(path);
				}
				Err(source) => {
					corpus.failure = Some(CorpusError::ReadFile { path, source });
					break;
				}
			}
		}

		corpus
	}

	/// Concatenated text of every file read.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Files that contributed to the text, in reading order.
	pub fn files(&self) -> &[PathBuf] {
		&self.files
	}

	/// The error that stopped reading, if any.
	pub fn failure(&self) -> Option<&CorpusError> {
		self.failure.as_ref()
	}

	/// Splits the corpus into its text and the error that stopped reading.
	pub fn into_parts(self) -> (String, Option<CorpusError>) {
		(self.text, self.failure)
	}
}

fn is_corpus_file(path: &Path) -> bool {
	path.is_file()
		&& path
			.file_name()
			.and_then(OsStr::to_str)
			.is_some_and(|name| name.ends_with(CORPUS_SUFFIX))
}

/// On-disk encoding of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
	/// Human-readable JSON document (the default).
	Json,
	/// Compact `postcard` binary, used for files ending in `.bin`.
	Binary,
}

impl ModelFormat {
	/// Picks the encoding from the file extension.
	///
	/// Example:
	/// `model.bin` → `Binary`, `model.json` or `model` → `Json`
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(OsStr::to_str) {
			Some(ext) if ext.eq_ignore_ascii_case("bin") => Self::Binary,
			_ => Self::Json,
		}
	}
}

/// Writes a serialized model, mapping failures to [`ModelError::Io`].
pub(crate) fn write_model_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ModelError> {
	let path = path.as_ref();
	fs::write(path, bytes).map_err(|source| ModelError::Io { path: path.to_owned(), source })
}

/// Reads a serialized model, mapping failures to [`ModelError::Io`].
pub(crate) fn read_model_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ModelError> {
	let path = path.as_ref();
	fs::read(path).map_err(|source| ModelError::Io { path: path.to_owned(), source })
}

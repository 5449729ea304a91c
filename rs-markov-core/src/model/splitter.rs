use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A word followed by end punctuation, optional closing quotes, then whitespace.
///
/// The character after the whitespace is checked separately in
/// [`is_followed_by_sentence_start`].
static POTENTIAL_END: LazyLock<Regex> = LazyLock::new(|| {
	// Should not panic, the pattern is a literal
	Regex::new(r#"([\w.'’&\])]+[.?!])([‘’“”'")\]]*)(\s+)"#).expect("valid end-of-sentence pattern")
});

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\s*\n\s*").expect("valid line break pattern")
});

/// Sentences starting or ending with a lone quote, or holding quotes and
/// brackets, are poorly formed and kept out of the chain. Curly quotes count
/// as their straight forms.
static MALFORMED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(^['‘’])|(['‘’]$)|\s['‘’]|['‘’]\s|["“”()\[\]]"#).expect("valid malformed sentence pattern")
});

/// Dotted words that never end a sentence.
const EXCEPTIONS: [&str; 5] = ["U.S.", "U.N.", "E.U.", "F.B.I.", "C.I.A."];

/// Capitalised abbreviations, compared in lowercase without the final dot.
const ABBR_CAPPED: &[&str] = &[
	// states
	"ala", "ariz", "ark", "calif", "colo", "conn", "del", "fla", "ga", "ill", "ind", "kan", "ky",
	"la", "md", "mass", "mich", "minn", "miss", "mo", "mont", "neb", "nev", "okla", "ore", "pa",
	"tenn", "vt", "va", "wash", "wis", "wyo",
	"u.s",
	// titles
	"mr", "ms", "mrs", "msr", "dr", "gov", "pres", "sen", "sens", "rep", "reps", "prof", "gen",
	"messrs", "col", "sr", "jf", "sgt", "mgr", "fr", "rev", "jr", "snr", "atty", "supt",
	// streets
	"ave", "blvd", "st", "rd", "hwy",
	// months
	"jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
	// days
	"mon", "tue", "wed", "thu", "fri", "sat", "sun",
];

const ABBR_LOWERCASE: &[&str] = &["etc", "v", "vs", "viz", "al", "pct"];

/// How raw corpus text is cut into sentences.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SentenceSplitter {
	/// Split after end punctuation, skipping abbreviations and initials.
	#[default]
	Punctuation,
	/// One sentence per line.
	Newline,
}

impl SentenceSplitter {
	/// Cuts `text` into trimmed sentences. Blank entries are kept; callers
	/// filter them with [`is_well_formed`] or [`is_blank`].
	pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
		match self {
			Self::Punctuation => split_into_sentences(text),
			Self::Newline => LINE_BREAK.split(text).map(str::trim).collect(),
		}
	}
}

/// Splits a sentence into words on runs of whitespace.
pub fn split_words(sentence: &str) -> Vec<String> {
	sentence.split_whitespace().map(str::to_owned).collect()
}

/// Joins words back into a sentence with single spaces.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
	let mut sentence = String::new();
	for (i, word) in words.iter().enumerate() {
		if i > 0 {
			sentence.push(' ');
		}
		sentence.push_str(word.as_ref());
	}
	sentence
}

pub fn is_blank(sentence: &str) -> bool {
	sentence.trim().is_empty()
}

/// Whether a sentence may be used for training when well-formedness is enforced.
pub fn is_well_formed(sentence: &str) -> bool {
	!MALFORMED.is_match(sentence)
}

fn split_into_sentences(text: &str) -> Vec<&str> {
	let mut end_indices = Vec::new();

	for captures in POTENTIAL_END.captures_iter(text) {
		let (Some(word), Some(closing), Some(space)) = (captures.get(1), captures.get(2), captures.get(3)) else {
			continue;
		};
		if !is_followed_by_sentence_start(text, space.as_str(), space.end())
			|| !is_sentence_ender(word.as_str())
		{
			continue;
		}
		end_indices.push(closing.end());
	}

	let mut sentences = Vec::with_capacity(end_indices.len() + 1);
	let mut start = 0;
	for end in end_indices {
		sentences.push(text[start..end].trim());
		start = end;
	}
	sentences.push(text[start..].trim());
	sentences
}

/// The next sentence must not start with a lowercase letter or a dash.
///
/// With more than one whitespace character the boundary still holds, since
/// the gap can end on whitespace instead.
fn is_followed_by_sentence_start(text: &str, space: &str, space_end: usize) -> bool {
	if space.chars().count() > 1 {
		return true;
	}
	match text[space_end..].chars().next() {
		Some(c) => !(c.is_ascii_lowercase() || matches!(c, '-' | '–' | '—')),
		None => true,
	}
}

fn is_sentence_ender(word: &str) -> bool {
	if EXCEPTIONS.contains(&word) {
		return false;
	}
	if word.ends_with('?') || word.ends_with('!') {
		return true;
	}
	if word.chars().filter(char::is_ascii_uppercase).count() > 1 {
		return true;
	}
	word.ends_with('.') && !is_abbreviation(word)
}

fn is_abbreviation(dotted_word: &str) -> bool {
	let mut chars = dotted_word.chars();
	chars.next_back();
	let clipped = chars.as_str();
	match clipped.chars().next() {
		Some(first) if first.is_ascii_uppercase() => ABBR_CAPPED.contains(&clipped.to_lowercase().as_str()),
		_ => ABBR_LOWERCASE.contains(&clipped),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use rstest::rstest;

	fn punctuation(text: &str) -> Vec<&str> {
		SentenceSplitter::Punctuation
			.split(text)
			.into_iter()
			.filter(|s| !is_blank(s))
			.collect()
	}

	#[test]
	fn splits_on_end_punctuation() {
		assert_eq!(
			punctuation("The cat sat. Did it? It did! Done."),
			vec!["The cat sat.", "Did it?", "It did!", "Done."]
		);
	}

	#[test]
	fn keeps_abbreviations_inside_sentences() {
		assert_eq!(
			punctuation("Mr. Smith went to Washington. He met Dr. Jones etc. there."),
			vec!["Mr. Smith went to Washington.", "He met Dr. Jones etc. there."]
		);
	}

	#[test]
	fn exceptions_do_not_end_sentences() {
		assert_eq!(
			punctuation("He moved to the U.S. Then he left."),
			vec!["He moved to the U.S. Then he left."]
		);
	}

	#[test]
	fn lowercase_continuation_is_not_a_boundary() {
		assert_eq!(punctuation("It cost 3 p. per unit. Fine."), vec!["It cost 3 p. per unit.", "Fine."]);
	}

	#[test]
	fn closing_quotes_stay_with_their_sentence() {
		assert_eq!(
			punctuation("She said “stop.” Then nothing."),
			vec!["She said “stop.”", "Then nothing."]
		);
	}

	#[test]
	fn newline_splitter_uses_lines() {
		let sentences = SentenceSplitter::Newline.split("first line  \n  second line\nthird");
		assert_eq!(sentences, vec!["first line", "second line", "third"]);
	}

	#[rstest]
	#[case("A plain sentence.", true)]
	#[case("It's fine.", true)]
	#[case("'Quoted start.", false)]
	#[case("Quoted end.'", false)]
	#[case("He said \"no\".", false)]
	#[case("A (parenthetical) remark.", false)]
	#[case("Spaced ' quote.", false)]
	#[case("She said “stop.”", false)]
	#[case("‘Curly start.", false)]
	#[case("It’s curly but fine.", true)]
	fn well_formed_sentences(#[case] sentence: &str, #[case] expected: bool) {
		assert_eq!(is_well_formed(sentence), expected);
	}

	#[rstest]
	#[case("Mr.", true)]
	#[case("Sept.", true)]
	#[case("etc.", true)]
	#[case("Etc.", false)]
	#[case("dog.", false)]
	fn abbreviations(#[case] word: &str, #[case] expected: bool) {
		assert_eq!(is_abbreviation(word), expected);
	}

	#[test]
	fn words_split_and_join_on_single_spaces() {
		let words = split_words("  a\tb \n c ");
		assert_eq!(words, vec!["a", "b", "c"]);
		assert_eq!(join_words(&words), "a b c");
	}
}

//! Length-indexed word lists.
//!
//! A `Lexicon` is built once before a fill and never mutated during the search, so a single
//! instance can be shared by any number of concurrent fills. Words are normalized to uppercase,
//! deduplicated, and each length bucket is kept sorted, which makes a `WordId` order the same as
//! alphabetical order.
//!
//! Dictionary files use one entry per line, in any of these forms:
//! - `word;score`
//! - `word,score`
//! - `word` (no score; always kept regardless of `min_score`)
//!
//! Lines that are blank, have an unparseable score, or contain anything other than letters and
//! digits are skipped.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::path::Path;

use log::{debug, info};
use smallvec::SmallVec;

use crate::errors::FillError;
use crate::grid::normalize_word;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the lexicon's bucket for its length.
pub type WordId = usize;

/// A word that can be chosen for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub letters: SmallVec<[char; MAX_SLOT_LENGTH]>,
    pub score: i32,
}

impl Word {
    fn new(string: String, score: i32) -> Word {
        let letters = string.chars().collect();
        Word { string, letters, score }
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

/// The word store the lexicon is loaded from. Implementations are expected to return distinct
/// answers; the lexicon normalizes and dedups them anyway.
pub trait LexiconSource {
    fn words_of_length(&self, length: usize) -> Vec<String>;
}

impl<S: AsRef<str>> LexiconSource for [S] {
    fn words_of_length(&self, length: usize) -> Vec<String> {
        self.iter()
            .map(AsRef::as_ref)
            .filter(|word| word.chars().count() == length)
            .map(str::to_string)
            .collect()
    }
}

impl<S: AsRef<str>> LexiconSource for Vec<S> {
    fn words_of_length(&self, length: usize) -> Vec<String> {
        self.as_slice().words_of_length(length)
    }
}

/// Immutable mapping from word length to the sorted, distinct uppercase words of that length.
#[derive(Clone, Default)]
pub struct Lexicon {
    buckets: Vec<Vec<Word>>,
}

impl Debug for Lexicon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("lengths", &self.lengths().collect::<Vec<_>>())
            .field("words", &self.len())
            .finish()
    }
}

fn is_valid_entry(word: &str) -> bool {
    !word.is_empty() && word.chars().all(char::is_alphanumeric)
}

impl Lexicon {
    /// Build a lexicon from unscored words.
    pub fn from_words<I, S>(words: I) -> Lexicon
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Lexicon::from_scored_words(words.into_iter().map(|word| (word, 0)))
    }

    /// Build a lexicon from (word, score) pairs. If a word appears more than once (including
    /// differing only by case), the highest score wins.
    pub fn from_scored_words<I, S>(words: I) -> Lexicon
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        let mut buckets: Vec<Vec<Word>> = vec![];

        for (word, score) in words {
            let word = normalize_word(word.as_ref().trim());
            if !is_valid_entry(&word) {
                continue;
            }

            let word = Word::new(word, score);
            if buckets.len() <= word.len() {
                buckets.resize_with(word.len() + 1, Vec::new);
            }
            buckets[word.len()].push(word);
        }

        for bucket in &mut buckets {
            // Sort by string, best score first, so that `dedup_by` keeps the highest score.
            bucket.sort_by(|a, b| a.string.cmp(&b.string).then(b.score.cmp(&a.score)));
            bucket.dedup_by(|a, b| a.string == b.string);
        }

        Lexicon { buckets }
    }

    /// Parse a dictionary from an in-memory string, skipping entries scored below `min_score`.
    pub fn parse_from_str(contents: &str, min_score: i32) -> Lexicon {
        let entries = contents.lines().filter_map(|raw_line| {
            let line = raw_line.trim();

            if line.is_empty() {
                None
            } else if let Some((word, score)) = line.split_once(|c: char| c == ';' || c == ',') {
                let score: i32 = score.trim().parse().ok()?;
                if score < min_score {
                    None
                } else {
                    Some((word.trim(), score))
                }
            } else {
                Some((line, 0))
            }
        });

        Lexicon::from_scored_words(entries)
    }

    /// Read a dictionary file from disk and parse it.
    pub fn load_from_path<P: AsRef<Path>>(path: P, min_score: i32) -> Result<Lexicon, FillError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| FillError::LexiconRead { path: path.to_path_buf(), source })?;

        let lexicon = Lexicon::parse_from_str(&contents, min_score);
        info!("Loaded {} words from {}", lexicon.len(), path.display());

        Ok(lexicon)
    }

    /// Query a word source for each of the given lengths and build a lexicon from the answers.
    pub fn load<S, I>(source: &S, lengths: I) -> Lexicon
    where
        S: LexiconSource + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        let lengths: BTreeSet<usize> = lengths.into_iter().collect();
        let lexicon = Lexicon::from_words(lengths.into_iter().flat_map(|length| {
            source.words_of_length(length).into_iter().filter(move |word| word.chars().count() == length)
        }));
        debug!("Loaded lexicon from source: {lexicon:?}");

        lexicon
    }

    /// Total number of distinct words.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lengths that have at least one word, in ascending order.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(length, _)| length)
    }

    /// The sorted words of the given length. A length with no words is treated as missing.
    pub fn bucket(&self, length: usize) -> Result<&[Word], FillError> {
        match self.buckets.get(length) {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => Err(FillError::NoLexiconForLength { length }),
        }
    }

    /// Find a word's id within its length bucket.
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        let bucket = self.buckets.get(word.chars().count())?;
        bucket.binary_search_by(|candidate| candidate.string.as_str().cmp(word)).ok()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_id(word).is_some()
    }

    /// Pre-flight check: fail if any of the given lengths has no words, listing every missing
    /// length rather than just the first.
    pub fn check_coverage<I>(&self, lengths: I) -> Result<(), FillError>
    where
        I: IntoIterator<Item = usize>,
    {
        let missing: Vec<usize> = lengths
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|&length| self.bucket(length).is_err())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FillError::LexiconCoverage { lengths: missing })
        }
    }
}

impl LexiconSource for Lexicon {
    fn words_of_length(&self, length: usize) -> Vec<String> {
        self.buckets
            .get(length)
            .map(|bucket| bucket.iter().map(|word| word.string.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_normalized_sorted_and_deduplicated() {
        let lexicon = Lexicon::from_words(["tea", "Ant", "ANT", " eat ", "a", "it's", ""]);

        let threes: Vec<_> = lexicon.bucket(3).unwrap().iter().map(|w| w.string.as_str()).collect();
        assert_eq!(threes, vec!["ANT", "EAT", "TEA"]);
        assert_eq!(lexicon.bucket(1).unwrap().len(), 1);
        assert_eq!(lexicon.len(), 4);
        assert_eq!(lexicon.lengths().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_missing_bucket_is_an_error() {
        let lexicon = Lexicon::from_words(["AT"]);
        assert!(matches!(lexicon.bucket(5), Err(FillError::NoLexiconForLength { length: 5 })));
        assert!(matches!(lexicon.bucket(0), Err(FillError::NoLexiconForLength { length: 0 })));
    }

    #[test]
    fn test_parse_dictionary_formats() {
        let lexicon = Lexicon::parse_from_str(
            "
            hello;60
            world,10
            horse
            bogus;abc
            swamp ; 55
            ",
            50,
        );

        let fives: Vec<_> = lexicon.bucket(5).unwrap().iter().map(|w| w.string.as_str()).collect();
        assert_eq!(fives, vec!["HELLO", "HORSE", "SWAMP"]);
        assert_eq!(lexicon.bucket(5).unwrap()[0].score, 60);
    }

    #[test]
    fn test_duplicate_keeps_best_score() {
        let lexicon = Lexicon::from_scored_words([("oreo", 10), ("OREO", 40), ("Oreo", 20)]);
        let bucket = lexicon.bucket(4).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].score, 40);
    }

    #[test]
    fn test_word_id_follows_alphabetical_order() {
        let lexicon = Lexicon::from_words(["CAB", "ABC", "BCA"]);
        assert_eq!(lexicon.word_id("ABC"), Some(0));
        assert_eq!(lexicon.word_id("CAB"), Some(2));
        assert_eq!(lexicon.word_id("DOG"), None);
        assert!(lexicon.contains("BCA"));
    }

    #[test]
    fn test_coverage_lists_all_missing_lengths() {
        let lexicon = Lexicon::from_words(["AT", "CAT"]);
        assert!(lexicon.check_coverage([2, 3, 3]).is_ok());

        match lexicon.check_coverage([5, 2, 4, 5]) {
            Err(FillError::LexiconCoverage { lengths }) => assert_eq!(lengths, vec![4, 5]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_from_source_only_queries_needed_lengths() {
        let source = vec!["at", "it", "cat", "horse"];
        let lexicon = Lexicon::load(&source, [2, 5]);

        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.bucket(3).is_err());
        assert_eq!(lexicon.words_of_length(2), vec!["AT".to_string(), "IT".to_string()]);
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = Lexicon::load_from_path("/nonexistent/crossfill.dict", 0).unwrap_err();
        assert_eq!(err.code(), "F007");
    }
}

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};

use smallvec::SmallVec;

use crate::errors::FillError;
use crate::grid::{normalize_glyph, Grid};
use crate::lexicon::{Lexicon, Word, WordId};
use crate::slots::WordSlot;
use crate::MAX_SLOT_LENGTH;

/// The glyph used for wildcard positions when a pattern is displayed.
pub const BLANK_GLYPH: char = '_';

/// A slot's letters-so-far, with `None` marking blank cells that match anything.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    cells: SmallVec<[Option<char>; MAX_SLOT_LENGTH]>,
}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let string: String = self.cells.iter().map(|cell| cell.unwrap_or(BLANK_GLYPH)).collect();
        f.write_str(&string)
    }
}

impl Pattern {
    /// Read the current pattern for a slot out of the grid.
    pub fn from_slot(slot: &WordSlot, grid: &Grid) -> Pattern {
        Pattern { cells: slot.cells.iter().map(|&coord| grid.letter(coord)).collect() }
    }

    /// Parse a pattern string where `_` or `.` is a wildcard. Letters are case-insensitive.
    pub fn parse(pattern: &str) -> Pattern {
        Pattern {
            cells: pattern
                .chars()
                .map(|glyph| match glyph {
                    BLANK_GLYPH | '.' => None,
                    glyph => Some(normalize_glyph(glyph)),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell_idx: usize) -> Option<char> {
        self.cells.get(cell_idx).copied().flatten()
    }

    /// True when every position holds a letter.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// A copy of this pattern with one position fixed to the given letter.
    pub fn with_letter(&self, cell_idx: usize, letter: char) -> Pattern {
        let mut pattern = self.clone();
        pattern.cells[cell_idx] = Some(letter);
        pattern
    }

    /// Does the word match this pattern position-for-position at every fixed letter?
    pub fn matches(&self, letters: &[char]) -> bool {
        letters.len() == self.cells.len()
            && self
                .cells
                .iter()
                .zip(letters)
                .all(|(cell, letter)| cell.map(|fixed| fixed == *letter).unwrap_or(true))
    }

    pub fn matches_str(&self, word: &str) -> bool {
        let letters: SmallVec<[char; MAX_SLOT_LENGTH]> = word.chars().collect();
        self.matches(&letters)
    }

    /// The completed word, if every position is filled.
    pub fn to_word(&self) -> Option<String> {
        self.cells.iter().copied().collect()
    }
}

/// Answers already placed along the current search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedWords {
    words: HashSet<String>,
}

impl UsedWords {
    pub fn new() -> UsedWords {
        UsedWords::default()
    }

    /// Returns false if the word was already present.
    pub fn insert(&mut self, word: &str) -> bool {
        self.words.insert(word.to_string())
    }

    pub fn remove(&mut self, word: &str) -> bool {
        self.words.remove(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }
}

/// Filters lexicon buckets against patterns. Raw matches are cached per distinct pattern, and the
/// used-word exclusion is applied after the lookup so cached entries stay valid for every search
/// state that produces the same pattern.
pub struct PatternMatcher<'a> {
    lexicon: &'a Lexicon,
    cache: HashMap<Pattern, Vec<WordId>>,
    hits: u64,
    misses: u64,
}

impl Debug for PatternMatcher<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("cached_patterns", &self.cache.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl<'a> PatternMatcher<'a> {
    pub fn new(lexicon: &'a Lexicon) -> PatternMatcher<'a> {
        PatternMatcher { lexicon, cache: HashMap::new(), hits: 0, misses: 0 }
    }

    pub fn lexicon(&self) -> &'a Lexicon {
        self.lexicon
    }

    /// Number of distinct patterns cached so far.
    pub fn cached_pattern_count(&self) -> usize {
        self.cache.len()
    }

    /// (hits, misses) for the pattern cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Every word of the pattern's length that matches it and isn't in `used`, in alphabetical
    /// order.
    pub fn filter(&mut self, pattern: &Pattern, used: &UsedWords) -> Result<Vec<WordId>, FillError> {
        self.lexicon.bucket(pattern.len())?;
        Ok(self.candidates(pattern, used))
    }

    /// How many words `filter` would return, without building the list.
    pub fn count(&mut self, pattern: &Pattern, used: &UsedWords) -> Result<usize, FillError> {
        self.lexicon.bucket(pattern.len())?;
        Ok(self.candidate_count(pattern, used, None))
    }

    pub fn word(&self, length: usize, word_id: WordId) -> &'a Word {
        &self.lexicon_bucket(length)[word_id]
    }

    fn lexicon_bucket(&self, length: usize) -> &'a [Word] {
        self.lexicon.bucket(length).unwrap_or(&[])
    }

    /// Cached raw matches for a pattern, before any used-word exclusion. A length with no bucket
    /// simply has no matches.
    fn raw_matches(&mut self, pattern: &Pattern) -> &[WordId] {
        if self.cache.contains_key(pattern) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let bucket = self.lexicon_bucket(pattern.len());
            let word_ids = bucket
                .iter()
                .enumerate()
                .filter(|(_, word)| pattern.matches(&word.letters))
                .map(|(word_id, _)| word_id)
                .collect();
            self.cache.insert(pattern.clone(), word_ids);
        }

        &self.cache[pattern]
    }

    /// Ids of used words that are also raw matches for this pattern, sorted.
    fn used_matches(&self, pattern: &Pattern, used: &UsedWords) -> SmallVec<[WordId; 8]> {
        let mut word_ids: SmallVec<[WordId; 8]> = used
            .iter()
            .filter(|word| pattern.matches_str(word))
            .filter_map(|word| self.lexicon.word_id(word))
            .collect();
        word_ids.sort_unstable();
        word_ids
    }

    /// Like `filter`, but treats a missing bucket as having no candidates. Callers are expected to
    /// have checked lexicon coverage up front.
    pub(crate) fn candidates(&mut self, pattern: &Pattern, used: &UsedWords) -> Vec<WordId> {
        let excluded = self.used_matches(pattern, used);
        let raw = self.raw_matches(pattern);

        if excluded.is_empty() {
            raw.to_vec()
        } else {
            raw.iter().copied().filter(|word_id| excluded.binary_search(word_id).is_err()).collect()
        }
    }

    /// Count the candidates for a pattern, optionally also excluding one more word (a tentative
    /// placement that isn't in `used` yet).
    pub(crate) fn candidate_count(&mut self, pattern: &Pattern, used: &UsedWords, also_excluding: Option<&Word>) -> usize {
        let mut excluded = self.used_matches(pattern, used).len();

        if let Some(word) = also_excluding {
            if pattern.matches(&word.letters) && !used.contains(&word.string) {
                excluded += 1;
            }
        }

        self.raw_matches(pattern).len().saturating_sub(excluded)
    }
}

//! Error types for building a fill request.
//!
//! Everything here is raised before the search loop is entered: a malformed grid, a numbering
//! that doesn't fit the grid, or a lexicon that can't cover every slot length. Running out of
//! options during the search is not an error; see [`crate::search::FillFailure`].
//!
//! # Error Codes
//!
//! - F001: `MalformedGrid`
//! - F002: `EmptyGrid`
//! - F003: `NoSlots`
//! - F004: `InvalidNumbering`
//! - F005: `NoLexiconForLength`
//! - F006: `LexiconCoverage`
//! - F007: `LexiconRead`
//! - F008: `UnnumberedRunStart`
//! - F009: `DuplicateEntry`

use std::path::PathBuf;

/// Validation failures surfaced to the caller before any grid mutation happens.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    /// The grid isn't rectangular, or has no rows at all.
    #[error("malformed grid: {reason}")]
    MalformedGrid { reason: String },

    /// Every cell in the grid is a block.
    #[error("grid has no usable cells")]
    EmptyGrid,

    /// The grid has open cells, but no run of two or more of them starts at a numbered cell.
    #[error("grid has no slots of length 2 or more")]
    NoSlots,

    /// A numbering entry points outside the grid or at a block.
    #[error("invalid numbering entry {number} at ({row}, {col}): {reason}")]
    InvalidNumbering {
        number: u32,
        row: usize,
        col: usize,
        reason: &'static str,
    },

    /// The lexicon has no bucket for a requested length.
    #[error("lexicon has no words of length {length}")]
    NoLexiconForLength { length: usize },

    /// Pre-flight check: one or more slot lengths have no candidate words at all.
    #[error("lexicon has no words for slot length(s): {}", format_lengths(.lengths))]
    LexiconCoverage { lengths: Vec<usize> },

    /// A cell starts a run of two or more open cells but has no number.
    #[error("cell ({row}, {col}) starts a slot but isn't numbered")]
    UnnumberedRunStart { row: usize, col: usize },

    /// The same word is already entered in more than one fully-lettered slot.
    #[error("{word} appears in more than one prefilled slot")]
    DuplicateEntry { word: String },

    /// The dictionary file couldn't be read.
    #[error("failed to read dictionary {}: {source}", .path.display())]
    LexiconRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_lengths(lengths: &[usize]) -> String {
    lengths
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl FillError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            FillError::MalformedGrid { .. } => "F001",
            FillError::EmptyGrid => "F002",
            FillError::NoSlots => "F003",
            FillError::InvalidNumbering { .. } => "F004",
            FillError::NoLexiconForLength { .. } => "F005",
            FillError::LexiconCoverage { .. } => "F006",
            FillError::LexiconRead { .. } => "F007",
            FillError::UnnumberedRunStart { .. } => "F008",
            FillError::DuplicateEntry { .. } => "F009",
        }
    }

    /// Returns a short hint on how to fix the input, if there is one.
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            FillError::MalformedGrid { .. } => Some("Every row of the grid must have the same number of cells."),
            FillError::EmptyGrid => Some("Open up at least one run of two or more cells."),
            FillError::NoSlots => Some("A slot needs two or more consecutive open cells starting at a numbered cell."),
            FillError::InvalidNumbering { .. } => Some("Recompute the numbering from the grid (see `grid::number_grid`)."),
            FillError::NoLexiconForLength { .. } | FillError::LexiconCoverage { .. } => {
                Some("Add words of the missing length(s) to the dictionary, or lower --min-score.")
            }
            FillError::UnnumberedRunStart { .. } => Some("Recompute the numbering from the grid (see `grid::number_grid`)."),
            FillError::DuplicateEntry { .. } => Some("Every answer in the grid has to be different; change one of the repeated entries."),
            FillError::LexiconRead { .. } => None,
        }
    }

    /// Format the error with its code and help text, for display on the command line.
    #[must_use]
    pub fn display_detailed(&self) -> String {
        match self.help() {
            Some(help) => format!("[{}] {self}\n  help: {help}", self.code()),
            None => format!("[{}] {self}", self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_error_lists_every_length() {
        let err = FillError::LexiconCoverage { lengths: vec![3, 7, 15] };
        assert_eq!(err.to_string(), "lexicon has no words for slot length(s): 3, 7, 15");
        assert_eq!(err.code(), "F006");
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            FillError::MalformedGrid { reason: String::new() },
            FillError::EmptyGrid,
            FillError::NoSlots,
            FillError::InvalidNumbering { number: 1, row: 0, col: 0, reason: "" },
            FillError::NoLexiconForLength { length: 2 },
            FillError::LexiconCoverage { lengths: vec![] },
            FillError::UnnumberedRunStart { row: 0, col: 0 },
            FillError::DuplicateEntry { word: "AB".to_string() },
            FillError::LexiconRead {
                path: PathBuf::from("x"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(FillError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_detailed_display_includes_help() {
        let detailed = FillError::NoSlots.display_detailed();
        assert!(detailed.starts_with("[F003]"));
        assert!(detailed.contains("help:"));
    }
}

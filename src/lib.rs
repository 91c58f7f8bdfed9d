//! Crossword grid filling.
//!
//! Given a grid of blocks, blank cells and pre-filled letters, plus a lexicon of allowed words,
//! find an assignment of distinct lexicon words to every slot such that crossing slots agree on
//! their shared letters. The search is a depth-first backtracking search guided by the
//! fewest-candidates heuristic, with optional lookahead-based strategies.

pub mod config;
pub mod errors;
pub mod grid;
pub mod lexicon;
pub mod log;
pub mod pattern;
pub mod progress;
pub mod scorer;
pub mod search;
pub mod slots;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

pub use config::{generate_grid_config, generate_grid_config_from_template, CancelFlag, FillOptions, GridConfig};
pub use errors::FillError;
pub use grid::{number_grid, Cell, Grid, GridCoord, Numbering};
pub use lexicon::{Lexicon, LexiconSource, Word, WordId};
pub use pattern::{Pattern, PatternMatcher, UsedWords};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use search::{
    find_fill, find_fill_with, CandidateOrdering, Choice, FillFailure, FillSuccess, OpenSlot, OrderStrategy, SearchState,
    SlotSelection, SlotStrategy, Statistics,
};
pub use slots::{extract_slots, Direction, IntersectionIndex, SlotId, WordSlot};

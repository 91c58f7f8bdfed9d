//! Backtracking search for a grid fill.
//!
//! The driver is a depth-first search over an explicit stack of frames, one per placed slot. At
//! each step it picks the next open slot (by default the one with the fewest candidates), tries
//! that slot's candidates in order, and backtracks when a slot runs out. Every placement is
//! recorded so that it can be undone exactly: when the search is exhausted, the working grid and
//! used-word set are back to their starting state.
//!
//! Slot selection and candidate ordering are pluggable through the `SlotSelection` and
//! `CandidateOrdering` traits; `SlotStrategy` and `OrderStrategy` are the built-in choices.

use std::fmt::{Debug, Formatter};

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::config::{FillOptions, GridConfig};
use crate::grid::{Grid, Placement};
use crate::lexicon::{Word, WordId};
use crate::pattern::{Pattern, PatternMatcher, UsedWords};
use crate::progress::ProgressReporter;
use crate::scorer::{score_candidates, score_slot, ScoredCandidate, ScoringContext, SlotScore};
use crate::slots::{Direction, SlotId};

/// A struct recording a slot assignment in the finished fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub number: u32,
    pub direction: Direction,
    pub word: String,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub max_depth: usize,
    pub duration: Duration,
}

/// A struct representing the results of a successful fill.
#[derive(Debug)]
pub struct FillSuccess {
    pub grid: Grid,

    /// Seed entries first, then every placement in the order it was made.
    pub choices: Vec<Choice>,
    pub statistics: Statistics,
}

impl FillSuccess {
    /// (number, direction, word) for every slot, ordered by number and direction.
    pub fn entries(&self) -> Vec<(u32, Direction, &str)> {
        let mut entries: Vec<_> =
            self.choices.iter().map(|choice| (choice.number, choice.direction, choice.word.as_str())).collect();
        entries.sort_unstable();
        entries
    }
}

/// Why a fill didn't produce a grid. None of these are errors in the input: `Exhausted` means
/// every branch was explored, the rest mean the search was stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillFailure {
    #[error("no fill exists for this grid and lexicon")]
    Exhausted,

    #[error("fill timed out")]
    Timeout,

    #[error("fill was cancelled")]
    Cancelled,

    #[error("fill gave up after {0} backtracks")]
    ExceededBacktrackLimit(u64),
}

/// An open slot and how many candidates it has in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSlot {
    pub slot_id: SlotId,
    pub candidate_count: usize,
}

/// Chooses which open slot to fill next.
pub trait SlotSelection {
    /// `open_slots` is never empty and is in ascending slot id order.
    fn choose(&self, state: &mut SearchState<'_, '_>, open_slots: &[OpenSlot]) -> SlotId;
}

/// Decides the order in which a slot's candidates are tried.
pub trait CandidateOrdering {
    /// `candidates` arrives in alphabetical order.
    fn order(&self, state: &mut SearchState<'_, '_>, slot_id: SlotId, candidates: Vec<WordId>) -> Vec<WordId>;
}

/// Built-in slot selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStrategy {
    /// Fill slots in clue order.
    InputOrder,

    /// Fill the slot with the fewest remaining candidates first, ties going to the earlier slot.
    #[default]
    FewestCandidates,

    /// Fill the slot with the lowest lookahead score first, then the fewest candidates.
    Lookahead,
}

impl SlotSelection for SlotStrategy {
    fn choose(&self, state: &mut SearchState<'_, '_>, open_slots: &[OpenSlot]) -> SlotId {
        let chosen = match self {
            SlotStrategy::InputOrder => open_slots.first(),
            SlotStrategy::FewestCandidates => open_slots.iter().min_by_key(|open| open.candidate_count),
            SlotStrategy::Lookahead => {
                let keys: Vec<(usize, usize)> = open_slots
                    .iter()
                    .map(|open| (state.slot_score(open.slot_id).best_score, open.candidate_count))
                    .collect();
                open_slots.iter().zip(&keys).min_by_key(|(_, key)| **key).map(|(open, _)| open)
            }
        };

        chosen.map(|open| open.slot_id).unwrap_or(open_slots[0].slot_id)
    }
}

/// Built-in candidate orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStrategy {
    /// Try candidates alphabetically, so a given lexicon always produces the same fill.
    #[default]
    Alphabetical,

    /// Try the candidates that leave their crossings the most room first, ties alphabetical.
    Lookahead,
}

impl CandidateOrdering for OrderStrategy {
    fn order(&self, state: &mut SearchState<'_, '_>, slot_id: SlotId, candidates: Vec<WordId>) -> Vec<WordId> {
        match self {
            OrderStrategy::Alphabetical => candidates,
            OrderStrategy::Lookahead => {
                let mut scored = state.score_candidates(slot_id, &candidates);
                scored.sort_by(|a, b| b.score.cmp(&a.score));
                scored.into_iter().map(|candidate| candidate.word_id).collect()
            }
        }
    }
}

/// A placement made during the search, with enough information to undo it.
#[derive(Debug)]
struct PlacedWord {
    slot_id: SlotId,
    word_id: WordId,
    placement: Placement,
}

/// The mutable state of a single fill: the working grid, the words used along the current path,
/// which slots are resolved, and the caches derived from them. Each fill owns its own state; only
/// the lexicon is shared.
pub struct SearchState<'c, 'a> {
    config: &'c GridConfig<'a>,
    grid: Grid,
    used: UsedWords,
    resolved: BitSet,
    matcher: PatternMatcher<'a>,

    /// Cached lookahead evaluations, cleared whenever a placement could have changed them.
    scores: Vec<Option<SlotScore>>,
}

impl Debug for SearchState<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchState")
            .field("grid", &self.grid)
            .field("used", &self.used.len())
            .field("resolved", &self.resolved.len())
            .field("matcher", &self.matcher)
            .finish()
    }
}

impl<'c, 'a> SearchState<'c, 'a> {
    /// Start from the config's grid, with seed slots already resolved and their words used.
    pub fn new(config: &'c GridConfig<'a>) -> SearchState<'c, 'a> {
        let mut resolved = BitSet::with_capacity(config.slots.len());
        let mut used = UsedWords::new();

        for &slot_id in &config.seed_slot_ids {
            resolved.insert(slot_id);
            if let Some(word) = config.seed_word(slot_id) {
                used.insert(&word);
            }
        }

        SearchState {
            config,
            grid: config.grid.clone(),
            used,
            resolved,
            matcher: PatternMatcher::new(config.lexicon),
            scores: vec![None; config.slots.len()],
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn used(&self) -> &UsedWords {
        &self.used
    }

    pub fn is_resolved(&self, slot_id: SlotId) -> bool {
        self.resolved.contains(slot_id)
    }

    pub fn pattern(&self, slot_id: SlotId) -> Pattern {
        Pattern::from_slot(&self.config.slots[slot_id], &self.grid)
    }

    pub fn word(&self, slot_id: SlotId, word_id: WordId) -> &'a Word {
        self.matcher.word(self.config.slots[slot_id].len(), word_id)
    }

    /// The slot's candidates for the current grid, alphabetically.
    pub fn candidates(&mut self, slot_id: SlotId) -> Vec<WordId> {
        let pattern = self.pattern(slot_id);
        self.matcher.candidates(&pattern, &self.used)
    }

    pub fn candidate_count(&mut self, slot_id: SlotId) -> usize {
        let pattern = self.pattern(slot_id);
        self.matcher.candidate_count(&pattern, &self.used, None)
    }

    /// Every unresolved slot with its current candidate count, in slot id order.
    pub fn open_slots(&mut self) -> Vec<OpenSlot> {
        (0..self.config.slots.len())
            .filter(|&slot_id| !self.resolved.contains(slot_id))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|slot_id| OpenSlot { slot_id, candidate_count: self.candidate_count(slot_id) })
            .collect()
    }

    /// The slot's lookahead evaluation, computed on first use and cached until a placement near it
    /// changes.
    pub fn slot_score(&mut self, slot_id: SlotId) -> SlotScore {
        if let Some(score) = self.scores[slot_id] {
            return score;
        }

        let ctx = ScoringContext {
            slots: &self.config.slots,
            resolved: &self.resolved,
            grid: &self.grid,
            used: &self.used,
        };
        let score = score_slot(&ctx, &mut self.matcher, slot_id);
        self.scores[slot_id] = Some(score);

        score
    }

    /// Lookahead scores for specific candidates of a slot, in the order given. Not cached.
    pub fn score_candidates(&mut self, slot_id: SlotId, candidates: &[WordId]) -> Vec<ScoredCandidate> {
        let ctx = ScoringContext {
            slots: &self.config.slots,
            resolved: &self.resolved,
            grid: &self.grid,
            used: &self.used,
        };
        score_candidates(&ctx, &mut self.matcher, slot_id, candidates)
    }

    /// Clear cached evaluations that a change to this slot could affect: its crossings (their
    /// patterns changed) and every slot of the same length (their used-word exclusions changed).
    fn invalidate_around(&mut self, slot_id: SlotId) {
        let length = self.config.slots[slot_id].len();

        for &neighbor_id in self.config.index.neighbors(slot_id) {
            self.scores[neighbor_id] = None;
        }
        for slot in &self.config.slots {
            if slot.len() == length {
                self.scores[slot.id] = None;
            }
        }
    }

    fn place(&mut self, slot_id: SlotId, word_id: WordId) -> PlacedWord {
        let word = self.word(slot_id, word_id);
        let placement = self.grid.place(&self.config.slots[slot_id].cells, &word.letters);
        self.used.insert(&word.string);
        self.resolved.insert(slot_id);
        self.invalidate_around(slot_id);

        trace!("Placed {} at {}", word.string, self.config.slots[slot_id].label());

        PlacedWord { slot_id, word_id, placement }
    }

    fn undo(&mut self, placed: PlacedWord) {
        let word = self.word(placed.slot_id, placed.word_id);
        self.grid.undo(placed.placement);
        self.used.remove(&word.string);
        self.resolved.remove(placed.slot_id);
        self.invalidate_around(placed.slot_id);

        trace!("Removed {} from {}", word.string, self.config.slots[placed.slot_id].label());
    }

    fn choice(&self, slot_id: SlotId, word: String) -> Choice {
        let slot = &self.config.slots[slot_id];
        Choice { slot_id, number: slot.number, direction: slot.direction, word }
    }
}

/// One level of the search: a selected slot, its ordered candidates, and what's currently placed.
struct Frame {
    slot_id: SlotId,
    candidates: Vec<WordId>,
    next_idx: usize,
    placed: Option<PlacedWord>,
}

fn check_interrupts(options: &FillOptions, deadline: Option<Instant>) -> Result<(), FillFailure> {
    if let Some(cancel) = &options.cancel {
        if cancel.is_cancelled() {
            return Err(FillFailure::Cancelled);
        }
    }
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Err(FillFailure::Timeout);
        }
    }
    Ok(())
}

/// Run the search loop on an existing state. On success the state is left fully placed and the
/// choices made are returned in order; on `Exhausted` the state has been rolled back to exactly
/// where it started.
fn run_search(
    state: &mut SearchState<'_, '_>,
    selection: &dyn SlotSelection,
    ordering: &dyn CandidateOrdering,
    options: &FillOptions,
    reporter: &mut dyn ProgressReporter,
    statistics: &mut Statistics,
    deadline: Option<Instant>,
) -> Result<Vec<Choice>, FillFailure> {
    let mut stack: Vec<Frame> = vec![];
    let report_interval = options.report_interval.max(1);

    'slot_selection: loop {
        statistics.states += 1;
        statistics.max_depth = statistics.max_depth.max(stack.len());

        check_interrupts(options, deadline)?;

        if statistics.states % report_interval == 0 {
            if let Err(err) = reporter.update(&state.grid.render()) {
                debug!("Ignoring progress reporter error: {err}");
            }
        }

        let open_slots = state.open_slots();
        if open_slots.is_empty() {
            return Ok(stack
                .iter()
                .filter_map(|frame| frame.placed.as_ref())
                .map(|placed| state.choice(placed.slot_id, state.word(placed.slot_id, placed.word_id).string.clone()))
                .collect());
        }

        let slot_id = selection.choose(state, &open_slots);
        let candidates = state.candidates(slot_id);
        let candidates = ordering.order(state, slot_id, candidates);

        if statistics.states % report_interval == 0 {
            let message = format!("Analyzing {} ({} candidates)", state.config.slots[slot_id].label(), candidates.len());
            if let Err(err) = reporter.status(&message) {
                debug!("Ignoring progress reporter error: {err}");
            }
        }

        trace!(
            "Selected {} ({}) with {} candidates at depth {}",
            state.config.slots[slot_id].label(),
            state.pattern(slot_id),
            candidates.len(),
            stack.len(),
        );

        stack.push(Frame { slot_id, candidates, next_idx: 0, placed: None });

        // Try the next candidate for the deepest slot, unwinding any slots that have run out.
        loop {
            let Some(frame) = stack.last_mut() else {
                return Err(FillFailure::Exhausted);
            };

            if let Some(placed) = frame.placed.take() {
                state.undo(placed);
                statistics.backtracks += 1;

                if let Some(max_backtracks) = options.max_backtracks {
                    if statistics.backtracks > max_backtracks as u64 {
                        return Err(FillFailure::ExceededBacktrackLimit(statistics.backtracks));
                    }
                }
            }

            if let Some(&word_id) = frame.candidates.get(frame.next_idx) {
                frame.next_idx += 1;
                frame.placed = Some(state.place(frame.slot_id, word_id));
                continue 'slot_selection;
            }

            trace!("Exhausted {}, backtracking", state.config.slots[frame.slot_id].label());
            stack.pop();
        }
    }
}

/// Search for a valid fill using custom slot selection and candidate ordering.
pub fn find_fill_with(
    config: &GridConfig<'_>,
    selection: &dyn SlotSelection,
    ordering: &dyn CandidateOrdering,
    options: &FillOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let deadline = options.timeout.map(|timeout| start + timeout);
    let mut statistics = Statistics::default();
    let mut state = SearchState::new(config);

    info!(
        "Starting fill: {} slots, {} seeded, {} words in lexicon",
        config.slots.len(),
        config.seed_slot_ids.len(),
        config.lexicon.len(),
    );

    let result = run_search(&mut state, selection, ordering, options, reporter, &mut statistics, deadline);
    statistics.duration = start.elapsed();

    match result {
        Ok(placed_choices) => {
            info!("Found fill: {statistics:?}");
            debug!("Pattern cache: {:?}", state.matcher);

            let mut choices: Vec<Choice> = config
                .seed_slot_ids
                .iter()
                .filter_map(|&slot_id| config.seed_word(slot_id).map(|word| state.choice(slot_id, word)))
                .collect();
            choices.extend(placed_choices);

            Ok(FillSuccess { grid: state.grid, choices, statistics })
        }
        Err(failure) => {
            info!("Fill failed ({failure}): {statistics:?}");
            Err(failure)
        }
    }
}

/// Search for a valid fill for the given grid config, using the strategies named in `options`.
pub fn find_fill(
    config: &GridConfig<'_>,
    options: &FillOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<FillSuccess, FillFailure> {
    find_fill_with(config, &options.slot_strategy, &options.order_strategy, options, reporter)
}

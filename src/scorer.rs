//! Lookahead scoring for slots and their candidates.
//!
//! A candidate's score is the number of options left in its most-squeezed open crossing once the
//! candidate is tentatively written in (its weakest link). A slot's score is the best score over
//! its candidates. This is a one-step max-min estimate of how likely a placement is to dead-end a
//! neighbor, without doing full constraint propagation.

use std::collections::HashMap;

use bit_set::BitSet;
use log::trace;

use crate::grid::Grid;
use crate::lexicon::WordId;
use crate::pattern::{Pattern, PatternMatcher, UsedWords};
use crate::slots::{SlotId, WordSlot};

/// Score given to a candidate whose slot has no open crossings, since nothing can be squeezed.
pub const UNCONSTRAINED_SCORE: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub word_id: WordId,
    pub score: usize,
}

/// The result of evaluating a slot against the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotScore {
    /// The first candidate (in the order scored) that achieves `best_score`.
    pub best_candidate: Option<WordId>,

    /// The maximum candidate score, or 0 if the slot has no candidates at all.
    pub best_score: usize,

    /// How many candidates the slot has right now.
    pub candidate_count: usize,
}

/// The parts of the search state the scorer reads.
pub struct ScoringContext<'s> {
    pub slots: &'s [WordSlot],
    pub resolved: &'s BitSet,
    pub grid: &'s Grid,
    pub used: &'s UsedWords,
}

struct OpenCrossing {
    cell_idx: usize,
    other_slot_cell: usize,
    pattern: Pattern,
}

/// Score each of the given candidates for a slot.
pub fn score_candidates(
    ctx: &ScoringContext<'_>,
    matcher: &mut PatternMatcher<'_>,
    slot_id: SlotId,
    candidates: &[WordId],
) -> Vec<ScoredCandidate> {
    let slot = &ctx.slots[slot_id];

    let open_crossings: Vec<OpenCrossing> = slot
        .crossing_cells()
        .filter(|(_, crossing)| !ctx.resolved.contains(crossing.other_slot_id))
        .map(|(cell_idx, crossing)| OpenCrossing {
            cell_idx,
            other_slot_cell: crossing.other_slot_cell,
            pattern: Pattern::from_slot(&ctx.slots[crossing.other_slot_id], ctx.grid),
        })
        .collect();

    // Many candidates put the same letter in the same crossing cell, so build each tentative
    // crossing pattern once per (crossing, letter) pair.
    let mut tentatives: HashMap<(usize, char), Pattern> = HashMap::new();

    candidates
        .iter()
        .map(|&word_id| {
            let word = matcher.word(slot.len(), word_id);

            let score = open_crossings
                .iter()
                .enumerate()
                .map(|(crossing_idx, crossing)| {
                    let letter = word.letters[crossing.cell_idx];
                    let tentative = tentatives.entry((crossing_idx, letter)).or_insert_with(|| {
                        match crossing.pattern.get(crossing.other_slot_cell) {
                            Some(_) => crossing.pattern.clone(),
                            None => crossing.pattern.with_letter(crossing.other_slot_cell, letter),
                        }
                    });

                    // The candidate itself would be used up by the placement.
                    matcher.candidate_count(tentative, ctx.used, Some(word))
                })
                .min()
                .unwrap_or(UNCONSTRAINED_SCORE);

            ScoredCandidate { word_id, score }
        })
        .collect()
}

/// Pick the best of a list of scored candidates: the maximum score, first one wins ties.
pub fn best_of(scored: &[ScoredCandidate]) -> SlotScore {
    let mut best: Option<ScoredCandidate> = None;

    for &candidate in scored {
        if best.map(|best| candidate.score > best.score).unwrap_or(true) {
            best = Some(candidate);
        }
    }

    SlotScore {
        best_candidate: best.map(|best| best.word_id),
        best_score: best.map(|best| best.score).unwrap_or(0),
        candidate_count: scored.len(),
    }
}

/// Evaluate a slot: find its candidates for the current grid and score each one.
pub fn score_slot(ctx: &ScoringContext<'_>, matcher: &mut PatternMatcher<'_>, slot_id: SlotId) -> SlotScore {
    let slot = &ctx.slots[slot_id];
    let pattern = Pattern::from_slot(slot, ctx.grid);
    let candidates = matcher.candidates(&pattern, ctx.used);

    let result = best_of(&score_candidates(ctx, matcher, slot_id, &candidates));
    trace!(
        "Scored {} ({pattern}): {} candidates, best score {}",
        slot.label(),
        result.candidate_count,
        result.best_score,
    );

    result
}

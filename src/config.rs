use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use instant::Duration;
use log::{debug, info};

use crate::errors::FillError;
use crate::grid::{number_grid, Grid, Numbering};
use crate::lexicon::Lexicon;
use crate::pattern::Pattern;
use crate::search::{OrderStrategy, SlotStrategy};
use crate::slots::{extract_slots, IntersectionIndex, SlotId, WordSlot};

/// The validated, static parts of a fill request: the starting grid, its slots, and the lexicon
/// they'll be filled from. Building one runs every pre-flight check, so a `GridConfig` that exists
/// is always searchable.
pub struct GridConfig<'a> {
    pub grid: Grid,
    pub slots: Vec<WordSlot>,
    pub index: IntersectionIndex,
    pub lexicon: &'a Lexicon,

    /// Slots whose every cell was already lettered in the input. These are treated as fixed
    /// entries: they aren't searched and don't need to be in the lexicon.
    pub seed_slot_ids: Vec<SlotId>,
}

impl Debug for GridConfig<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("grid", &self.grid)
            .field("slots", &self.slots)
            .field("seed_slot_ids", &self.seed_slot_ids)
            .field("lexicon", &self.lexicon)
            .finish()
    }
}

impl GridConfig<'_> {
    /// The entry in the grid for a seed slot.
    pub fn seed_word(&self, slot_id: SlotId) -> Option<String> {
        Pattern::from_slot(&self.slots[slot_id], &self.grid).to_word()
    }
}

/// Generate a GridConfig for a grid and its numbering, failing fast if the grid has no slots, two
/// prefilled slots hold the same word, or the lexicon can't cover every slot length that still
/// needs filling.
pub fn generate_grid_config<'a>(
    grid: Grid,
    numbering: &Numbering,
    lexicon: &'a Lexicon,
) -> Result<GridConfig<'a>, FillError> {
    let slots = extract_slots(&grid, numbering)?;

    let seed_slot_ids: Vec<SlotId> = slots
        .iter()
        .filter(|slot| Pattern::from_slot(slot, &grid).is_complete())
        .map(|slot| slot.id)
        .collect();

    let mut seed_words: HashSet<String> = HashSet::with_capacity(seed_slot_ids.len());
    for &slot_id in &seed_slot_ids {
        if let Some(word) = Pattern::from_slot(&slots[slot_id], &grid).to_word() {
            if !seed_words.insert(word.clone()) {
                return Err(FillError::DuplicateEntry { word });
            }
        }
    }

    lexicon.check_coverage(
        slots
            .iter()
            .filter(|slot| !seed_slot_ids.contains(&slot.id))
            .map(WordSlot::len),
    )?;

    let index = IntersectionIndex::new(&slots);

    debug!(
        "Generated grid config: {} slots ({} seeded), {} open cells",
        slots.len(),
        seed_slot_ids.len(),
        grid.open_cell_count(),
    );

    Ok(GridConfig { grid, slots, index, lexicon, seed_slot_ids })
}

/// Generate a GridConfig from a string template, with . representing empty cells, # representing
/// blocks, and letters representing themselves. The numbering is computed from the grid.
pub fn generate_grid_config_from_template<'a>(
    template: &str,
    lexicon: &'a Lexicon,
) -> Result<GridConfig<'a>, FillError> {
    let grid = Grid::from_template(template)?;
    let numbering = number_grid(&grid);
    info!("Parsed {}x{} grid with {} numbered cells", grid.height(), grid.width(), numbering.len());

    generate_grid_config(grid, &numbering, lexicon)
}

/// A cancellation token that can be shared with another thread and checked during the search.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-request knobs for `find_fill`.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// How to pick the next slot to fill.
    pub slot_strategy: SlotStrategy,

    /// How to order a slot's candidates.
    pub order_strategy: OrderStrategy,

    /// Give up with `FillFailure::Timeout` once this much time has passed.
    pub timeout: Option<Duration>,

    /// Give up with `FillFailure::ExceededBacktrackLimit` after this many backtracks.
    pub max_backtracks: Option<usize>,

    pub cancel: Option<CancelFlag>,

    /// Send a progress snapshot every N slot selections.
    pub report_interval: u64,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            slot_strategy: SlotStrategy::FewestCandidates,
            order_strategy: OrderStrategy::Alphabetical,
            timeout: None,
            max_backtracks: None,
            cancel: None,
            report_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_slots_skip_coverage_check() {
        // The top row is already complete, and there are no 4-letter words.
        let lexicon = Lexicon::from_words(["AB", "BC", "CD", "DE"]);
        let config = generate_grid_config_from_template(
            "
            ABCD
            .##.
            ",
            &lexicon,
        )
        .unwrap();

        assert_eq!(config.seed_slot_ids, vec![0]);
        assert_eq!(config.seed_word(0), Some("ABCD".to_string()));
    }

    #[test]
    fn test_coverage_is_checked_for_open_slots() {
        let lexicon = Lexicon::from_words(["AB", "BC"]);
        let err = generate_grid_config_from_template("AB..\n....", &lexicon).unwrap_err();

        match err {
            FillError::LexiconCoverage { lengths } => assert_eq!(lengths, vec![4]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_prefilled_entry_is_rejected() {
        let lexicon = Lexicon::from_words(["AB", "XY"]);
        let err = generate_grid_config_from_template("AB\n##\nAB", &lexicon).unwrap_err();

        match &err {
            FillError::DuplicateEntry { word } => assert_eq!(word, "AB"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), "F009");
    }

    #[test]
    fn test_grid_errors_surface_before_coverage() {
        let lexicon = Lexicon::from_words(["AB"]);
        assert!(matches!(generate_grid_config_from_template("##\n##", &lexicon), Err(FillError::EmptyGrid)));
        assert!(matches!(generate_grid_config_from_template(".#\n#.", &lexicon), Err(FillError::NoSlots)));
    }

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}

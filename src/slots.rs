use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};

use log::debug;
use smallvec::SmallVec;

use crate::errors::FillError;
use crate::grid::{Grid, GridCoord, Numbering};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the extracted slot list.
pub type SlotId = usize;

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Across => "across",
            Direction::Down => "down",
        })
    }
}

impl Direction {
    fn step(self) -> (usize, usize) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }
}

/// A crossing between one slot and another, referencing the other slot's id and the location of
/// the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A word slot: a maximal run of open cells in one direction, starting at a numbered cell. The
/// geometry never changes once extracted; only the letters in the grid do.
#[derive(Clone, PartialEq, Eq)]
pub struct WordSlot {
    pub id: SlotId,
    pub number: u32,
    pub direction: Direction,
    pub cells: SmallVec<[GridCoord; MAX_SLOT_LENGTH]>,

    /// For each cell, the slot running the other way through it, if any.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl Debug for WordSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordSlot")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("start_cell", &self.start_cell())
            .field("length", &self.len())
            .finish()
    }
}

impl WordSlot {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn start_cell(&self) -> GridCoord {
        self.cells[0]
    }

    /// Human-readable label like "12 across".
    pub fn label(&self) -> String {
        format!("{} {}", self.number, self.direction)
    }

    /// Iterate over the crossings of this slot as (cell index in this slot, crossing).
    pub fn crossing_cells(&self) -> impl Iterator<Item = (usize, &Crossing)> + '_ {
        self.crossings
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| crossing.as_ref().map(|crossing| (cell_idx, crossing)))
    }
}

/// Walk from `start` in `direction` until a block or the edge of the grid.
fn walk_run(grid: &Grid, start: GridCoord, direction: Direction) -> SmallVec<[GridCoord; MAX_SLOT_LENGTH]> {
    let (d_row, d_col) = direction.step();
    let mut cells: SmallVec<[GridCoord; MAX_SLOT_LENGTH]> = SmallVec::new();
    let mut coord = start;

    while grid.is_open(coord) {
        cells.push(coord);
        coord = (coord.0 + d_row, coord.1 + d_col);
    }

    cells
}

/// Convert a grid and its numbering into word slots. Slots are ordered by clue number, with the
/// across slot before the down slot for a cell that starts both; slot ids follow that order.
///
/// The numbering has to cover exactly the cells that start a run of two or more open cells.
pub fn extract_slots(grid: &Grid, numbering: &Numbering) -> Result<Vec<WordSlot>, FillError> {
    if grid.open_cell_count() == 0 {
        return Err(FillError::EmptyGrid);
    }

    let mut starts: Vec<(u32, GridCoord)> = Vec::with_capacity(numbering.len());
    for (&(row, col), &number) in numbering {
        if grid.get((row, col)).is_none() {
            return Err(FillError::InvalidNumbering { number, row, col, reason: "outside the grid" });
        }
        if !grid.is_open((row, col)) {
            return Err(FillError::InvalidNumbering { number, row, col, reason: "numbered cell is a block" });
        }
        if !grid.starts_across((row, col)) && !grid.starts_down((row, col)) {
            return Err(FillError::InvalidNumbering { number, row, col, reason: "numbered cell starts no slot" });
        }
        starts.push((number, (row, col)));
    }
    starts.sort_unstable();

    // Every run start needs a number, or its slot would never be filled.
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let starts_run = grid.starts_across((row, col)) || grid.starts_down((row, col));
            if starts_run && !numbering.contains_key(&(row, col)) {
                return Err(FillError::UnnumberedRunStart { row, col });
            }
        }
    }

    let mut slots: Vec<WordSlot> = vec![];

    for (number, start) in starts {
        for direction in [Direction::Across, Direction::Down] {
            let starts_run = match direction {
                Direction::Across => grid.starts_across(start),
                Direction::Down => grid.starts_down(start),
            };
            if !starts_run {
                continue;
            }

            let cells = walk_run(grid, start, direction);
            slots.push(WordSlot {
                id: slots.len(),
                number,
                direction,
                crossings: cells.iter().map(|_| None).collect(),
                cells,
            });
        }
    }

    if slots.is_empty() {
        return Err(FillError::NoSlots);
    }

    link_crossings(&mut slots);

    debug!("Extracted {} slots from a {}x{} grid", slots.len(), grid.height(), grid.width());

    Ok(slots)
}

/// Fill in the `crossings` field of each slot, using a map from cell location to the slots
/// that pass through it.
fn link_crossings(slots: &mut [WordSlot]) {
    // (slot id, cell index within slot)
    let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();

    for slot in slots.iter() {
        for (cell_idx, &loc) in slot.cells.iter().enumerate() {
            entries_by_loc.entry(loc).or_default().push((slot.id, cell_idx));
        }
    }

    for slot in slots.iter_mut() {
        for (cell_idx, loc) in slot.cells.iter().enumerate() {
            slot.crossings[cell_idx] = entries_by_loc[loc]
                .iter()
                .find(|&&(other_slot_id, _)| other_slot_id != slot.id)
                .map(|&(other_slot_id, other_slot_cell)| Crossing { other_slot_id, other_slot_cell });
        }
    }
}

/// Return every other slot whose cells share at least one coordinate with `slot`. This works
/// from the cell geometry directly, so it doesn't depend on `crossings` having been linked.
pub fn intersecting<'a>(slot: &WordSlot, all_slots: &'a [WordSlot]) -> Vec<&'a WordSlot> {
    all_slots
        .iter()
        .filter(|other| other.id != slot.id && other.cells.iter().any(|cell| slot.cells.contains(cell)))
        .collect()
}

/// Precomputed adjacency between slots, since the geometry never changes during a fill.
#[derive(Debug, Clone)]
pub struct IntersectionIndex {
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
}

impl IntersectionIndex {
    pub fn new(slots: &[WordSlot]) -> IntersectionIndex {
        let neighbors = slots
            .iter()
            .map(|slot| {
                let mut ids: SmallVec<[SlotId; MAX_SLOT_LENGTH]> =
                    slot.crossing_cells().map(|(_, crossing)| crossing.other_slot_id).collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            })
            .collect();

        IntersectionIndex { neighbors }
    }

    /// Ids of the slots crossing the given slot, in ascending order.
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }
}

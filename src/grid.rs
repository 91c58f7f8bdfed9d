use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

use smallvec::SmallVec;

use crate::errors::FillError;
use crate::MAX_SLOT_LENGTH;

/// Zero-indexed (row, col) coords for a cell in the grid, where row = 0 is the top row.
pub type GridCoord = (usize, usize);

/// The glyph used for blocks in templates and rendered grids.
pub const BLOCK_GLYPH: char = '#';

/// The placeholder glyph used for empty cells in templates and rendered grids.
pub const EMPTY_GLYPH: char = '.';

/// Map of slot-starting cells to their clue numbers.
pub type Numbering = BTreeMap<GridCoord, u32>;

/// The state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Block,
    Empty,
    Letter(char),
}

impl Cell {
    pub fn is_block(self) -> bool {
        matches!(self, Cell::Block)
    }

    pub fn letter(self) -> Option<char> {
        match self {
            Cell::Letter(letter) => Some(letter),
            _ => None,
        }
    }
}

/// Uppercase a single glyph. Letters whose uppercase form is more than one char (like 'ß') keep
/// only the first char, so that word lengths never change during normalization.
pub fn normalize_glyph(glyph: char) -> char {
    glyph.to_uppercase().next().unwrap_or(glyph)
}

/// Normalize a word the same way grid letters are normalized.
pub fn normalize_word(word: &str) -> String {
    word.chars().map(normalize_glyph).collect()
}

/// A rectangular grid of cells. This is mutated in place during a fill, and every mutation is
/// recorded in a `Placement` so that it can be undone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cells", &self.render())
            .finish()
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// The cells written by a single slot placement. Cells that were already lettered when the
/// placement was made aren't included, so undoing only clears what this placement wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    written: SmallVec<[GridCoord; MAX_SLOT_LENGTH]>,
}

impl Placement {
    pub fn written_cells(&self) -> &[GridCoord] {
        &self.written
    }
}

impl Grid {
    /// Create a grid where every cell is empty.
    pub fn new(height: usize, width: usize) -> Grid {
        Grid { width, height, cells: vec![Cell::Empty; width * height] }
    }

    /// Build a grid from rows of cells. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Grid, FillError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);

        if height == 0 || width == 0 {
            return Err(FillError::MalformedGrid { reason: "grid has no cells".to_string() });
        }

        if let Some((row_idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(FillError::MalformedGrid {
                reason: format!("row {row_idx} has {} cells, expected {width}", row.len()),
            });
        }

        let cells = rows
            .into_iter()
            .flatten()
            .map(|cell| match cell {
                Cell::Letter(letter) => Cell::Letter(normalize_glyph(letter)),
                other => other,
            })
            .collect();

        Ok(Grid { width, height, cells })
    }

    /// Build a grid from rows of optional glyphs, the shape a web front end usually sends:
    /// `None` or `#` is a block, `Some('.')`/`Some('_')`/`Some(' ')` is empty, anything else is a
    /// letter.
    pub fn from_glyph_rows(rows: &[Vec<Option<char>>]) -> Result<Grid, FillError> {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|glyph| match glyph {
                        None => Ok(Cell::Block),
                        Some(glyph) => cell_from_glyph(*glyph),
                    })
                    .collect::<Result<Vec<Cell>, FillError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Grid::from_rows(rows)
    }

    /// Parse a grid from a string template, with . (or _) representing empty cells, # representing
    /// blocks, and letters representing themselves. Blank lines and surrounding whitespace are
    /// ignored, so templates can be indented inside raw strings.
    pub fn from_template(template: &str) -> Result<Grid, FillError> {
        let rows = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(cell_from_glyph).collect::<Result<Vec<Cell>, FillError>>())
            .collect::<Result<Vec<_>, _>>()?;

        Grid::from_rows(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Return the cell at the given coords, or `None` if they're out of bounds.
    pub fn get(&self, (row, col): GridCoord) -> Option<Cell> {
        if row < self.height && col < self.width {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// Is this cell inside the grid and not a block?
    pub fn is_open(&self, coord: GridCoord) -> bool {
        self.get(coord).map(|cell| !cell.is_block()).unwrap_or(false)
    }

    pub fn letter(&self, coord: GridCoord) -> Option<char> {
        self.get(coord).and_then(Cell::letter)
    }

    /// How many cells are not blocks?
    pub fn open_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_block()).count()
    }

    /// True when no open cell is left empty.
    pub fn is_complete(&self) -> bool {
        !self.cells.contains(&Cell::Empty)
    }

    /// Write a word into the given cells. Only empty cells are written; a cell that already holds
    /// a letter has to agree with the word already, since placements only ever happen at
    /// mutually-consistent positions.
    pub fn place(&mut self, cells: &[GridCoord], word: &[char]) -> Placement {
        debug_assert_eq!(cells.len(), word.len(), "word length doesn't match slot length");

        let mut written: SmallVec<[GridCoord; MAX_SLOT_LENGTH]> = SmallVec::new();

        for (&(row, col), &letter) in cells.iter().zip(word) {
            let cell = &mut self.cells[row * self.width + col];
            match *cell {
                Cell::Empty => {
                    *cell = Cell::Letter(letter);
                    written.push((row, col));
                }
                Cell::Letter(existing) => {
                    debug_assert_eq!(existing, letter, "placement conflicts with ({row}, {col})");
                }
                Cell::Block => {
                    debug_assert!(false, "placement over a block at ({row}, {col})");
                }
            }
        }

        Placement { written }
    }

    /// Revert a placement, restoring every cell it wrote to empty.
    pub fn undo(&mut self, placement: Placement) {
        for (row, col) in placement.written {
            self.cells[row * self.width + col] = Cell::Empty;
        }
    }

    /// Render each row as a string of glyphs.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Block => BLOCK_GLYPH,
                        Cell::Empty => EMPTY_GLYPH,
                        Cell::Letter(letter) => *letter,
                    })
                    .collect()
            })
            .collect()
    }

    /// Turn the grid into a string in the same format `from_template` accepts.
    pub fn render(&self) -> String {
        self.rows().join("\n")
    }

    fn starts_run(&self, (row, col): GridCoord, (d_row, d_col): (usize, usize)) -> bool {
        if !self.is_open((row, col)) {
            return false;
        }

        let before_is_blocked = if d_row == 1 {
            row == 0 || !self.is_open((row - 1, col))
        } else {
            col == 0 || !self.is_open((row, col - 1))
        };
        let after_is_open = self.is_open((row + d_row, col + d_col));

        before_is_blocked && after_is_open
    }

    /// Does this cell start an across run of two or more open cells?
    pub fn starts_across(&self, coord: GridCoord) -> bool {
        self.starts_run(coord, (0, 1))
    }

    /// Does this cell start a down run of two or more open cells?
    pub fn starts_down(&self, coord: GridCoord) -> bool {
        self.starts_run(coord, (1, 0))
    }
}

fn cell_from_glyph(glyph: char) -> Result<Cell, FillError> {
    match glyph {
        BLOCK_GLYPH => Ok(Cell::Block),
        EMPTY_GLYPH | '_' | ' ' => Ok(Cell::Empty),
        glyph if glyph.is_alphanumeric() => Ok(Cell::Letter(normalize_glyph(glyph))),
        glyph => Err(FillError::MalformedGrid { reason: format!("unexpected glyph {glyph:?}") }),
    }
}

/// Standard crossword numbering: scanning in row-major order, each open cell that starts an
/// across or down run of length >= 2 gets the next number, starting at 1.
pub fn number_grid(grid: &Grid) -> Numbering {
    let mut numbering = Numbering::new();
    let mut next_number = 1;

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            if grid.starts_across((row, col)) || grid.starts_down((row, col)) {
                numbering.insert((row, col), next_number);
                next_number += 1;
            }
        }
    }

    numbering
}

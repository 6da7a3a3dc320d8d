//! The static shape of a puzzle: which cells are open, the slots that need words, and where those
//! slots cross.

use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::Error;
use crate::{SlotId, MAX_SLOT_LENGTH};

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A run of open cells that needs exactly one word. Two slots are the same slot iff their start
/// cell, direction and length all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    pub fn new(row: usize, column: usize, direction: Direction, length: usize) -> Slot {
        Slot { row, column, direction, length }
    }

    /// The coords of the cell at `cell_idx` within this slot.
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.column + cell_idx),
            Direction::Down => (self.row + cell_idx, self.column),
        }
    }

    /// Does every cell of this slot lie inside a `width` x `height` grid? Coordinates that would
    /// overflow count as outside.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        let Some(last_offset) = self.length.checked_sub(1) else {
            return false;
        };
        let (last_row, last_column) = match self.direction {
            Direction::Across => (Some(self.row), self.column.checked_add(last_offset)),
            Direction::Down => (self.row.checked_add(last_offset), Some(self.column)),
        };
        last_row.map_or(false, |row| row < height)
            && last_column.map_or(false, |column| column < width)
    }

    /// Generate the coords for each cell of this slot.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell(cell_idx))
    }
}

/// Which cells of a rectangular grid can hold letters.
#[derive(Clone, PartialEq, Eq)]
pub struct Structure {
    width: usize,
    height: usize,
    open: Vec<bool>,
}

impl Debug for Structure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Structure {}x{}", self.width, self.height)?;
        for row in 0..self.height {
            for column in 0..self.width {
                write!(f, "{}", if self.is_open((row, column)) { '_' } else { '#' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Structure {
    /// Build a structure from rows of open/blocked flags. Short rows are padded with blocked
    /// cells to the width of the longest row.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Structure, Error> {
        let height = rows.len();
        let width = rows.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);

        let mut open = vec![false; width * height];
        for (row_idx, row) in rows.iter().enumerate() {
            for (column_idx, &cell) in row.as_ref().iter().enumerate() {
                open[row_idx * width + column_idx] = cell;
            }
        }

        if !open.iter().any(|&cell| cell) {
            return Err(Error::EmptyStructure);
        }

        Ok(Structure { width, height, open })
    }

    /// Parse a structure from text, with `_` or `.` marking open cells and any other character
    /// marking a block. Surrounding whitespace on each line is ignored, as are blank lines.
    pub fn parse(template: &str) -> Result<Structure, Error> {
        let rows: Vec<Vec<bool>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|c| c == '_' || c == '.').collect())
            .collect();

        Structure::from_rows(&rows)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Structure, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Structure::parse(&contents)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cells outside the grid count as blocked.
    pub fn is_open(&self, (row, column): GridCoord) -> bool {
        row < self.height && column < self.width && self.open[row * self.width + column]
    }

    /// Every maximal run of two or more open cells, ordered by start cell (row-major), with the
    /// across slot first when an across and a down slot start in the same cell.
    fn infer_slots(&self) -> Vec<Slot> {
        let mut slots = vec![];

        for row in 0..self.height {
            for column in 0..self.width {
                if !self.is_open((row, column)) {
                    continue;
                }

                if column == 0 || !self.is_open((row, column - 1)) {
                    let length = (column..self.width)
                        .take_while(|&c| self.is_open((row, c)))
                        .count();
                    if length > 1 {
                        slots.push(Slot::new(row, column, Direction::Across, length));
                    }
                }

                if row == 0 || !self.is_open((row - 1, column)) {
                    let length = (row..self.height)
                        .take_while(|&r| self.is_open((r, column)))
                        .count();
                    if length > 1 {
                        slots.push(Slot::new(row, column, Direction::Down, length));
                    }
                }
            }
        }

        slots
    }
}

/// The constraint between two crossing slots: the letter at `offset` in one slot's word has to
/// equal the letter at `other_offset` in the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub offset: usize,
    pub other_offset: usize,
}

impl Overlap {
    /// The same overlap seen from the other slot.
    pub fn swapped(self) -> Overlap {
        Overlap {
            offset: self.other_offset,
            other_offset: self.offset,
        }
    }
}

/// For every ordered pair of slots, where (if anywhere) they cross.
pub struct OverlapIndex {
    slot_count: usize,
    overlaps: Vec<Option<Overlap>>,
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
}

impl Debug for OverlapIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapIndex")
            .field("slot_count", &self.slot_count)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}

impl OverlapIndex {
    /// Build the index by mapping each cell to the slots passing through it. A cell shared by two
    /// slots running the same way is malformed input; an across and a down slot can only ever
    /// share a single cell.
    fn build(slots: &[Slot]) -> Result<OverlapIndex, Error> {
        let slot_count = slots.len();

        let mut entries_by_cell: FxHashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            FxHashMap::default();
        for (slot_id, slot) in slots.iter().enumerate() {
            for (cell_idx, cell) in slot.cells().enumerate() {
                entries_by_cell.entry(cell).or_default().push((slot_id, cell_idx));
            }
        }

        let mut index = OverlapIndex {
            slot_count,
            overlaps: vec![None; slot_count * slot_count],
            neighbors: (0..slot_count).map(|_| SmallVec::new()).collect(),
        };

        // Walk the slots rather than the map so that errors are reported deterministically.
        for (slot_id, slot) in slots.iter().enumerate() {
            for (cell_idx, cell) in slot.cells().enumerate() {
                for &(other_slot_id, other_cell_idx) in &entries_by_cell[&cell] {
                    if other_slot_id <= slot_id {
                        continue;
                    }
                    if slots[other_slot_id].direction == slot.direction {
                        return Err(Error::ParallelOverlap(slot_id, other_slot_id, cell));
                    }

                    let overlap = Overlap {
                        offset: cell_idx,
                        other_offset: other_cell_idx,
                    };
                    index.overlaps[slot_id * slot_count + other_slot_id] = Some(overlap);
                    index.overlaps[other_slot_id * slot_count + slot_id] = Some(overlap.swapped());
                    index.neighbors[slot_id].push(other_slot_id);
                    index.neighbors[other_slot_id].push(slot_id);
                }
            }
        }

        for neighbors in &mut index.neighbors {
            neighbors.sort_unstable();
        }

        Ok(index)
    }

    /// Panics if either id is out of range; see `GridConfig::try_overlap` for a checked lookup.
    pub fn get(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<Overlap> {
        assert!(slot_id < self.slot_count && other_slot_id < self.slot_count);
        self.overlaps[slot_id * self.slot_count + other_slot_id]
    }

    /// The slots crossing `slot_id`, in ascending id order.
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// Every ordered pair of crossing slots.
    pub fn arcs(&self) -> impl Iterator<Item = (SlotId, SlotId)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(slot_id, neighbors)| neighbors.iter().map(move |&other| (slot_id, other)))
    }
}

/// A struct representing the aspects of a grid that are static during filling.
pub struct GridConfig {
    structure: Structure,
    slots: Vec<Slot>,
    overlaps: OverlapIndex,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.structure.width)
            .field("height", &self.structure.height)
            .field("slots", &self.slots)
            .finish()
    }
}

impl GridConfig {
    /// Generate a GridConfig whose slots are every across and down run in the structure.
    pub fn from_structure(structure: Structure) -> Result<GridConfig, Error> {
        let slots = structure.infer_slots();
        GridConfig::from_slots(structure, slots)
    }

    /// Generate a GridConfig with the given slots, checking that they fit the structure and cross
    /// each other at most once.
    pub fn from_slots(structure: Structure, slots: Vec<Slot>) -> Result<GridConfig, Error> {
        let mut seen: FxHashSet<Slot> = FxHashSet::default();

        for &slot in &slots {
            if slot.length == 0 {
                return Err(Error::EmptySlot(slot));
            }
            if !slot.fits_within(structure.width, structure.height) {
                return Err(Error::SlotOutOfBounds(slot));
            }
            if let Some(cell) = slot.cells().find(|&cell| !structure.is_open(cell)) {
                return Err(Error::SlotCoversBlockedCell { slot, cell });
            }
            if !seen.insert(slot) {
                return Err(Error::DuplicateSlot(slot));
            }
        }

        let overlaps = OverlapIndex::build(&slots)?;

        Ok(GridConfig { structure, slots, overlaps })
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Panics if `slot_id` is out of range.
    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slots[slot_id]
    }

    pub fn try_slot(&self, slot_id: SlotId) -> Result<&Slot, Error> {
        self.slots.get(slot_id).ok_or(Error::UnknownSlot(slot_id))
    }

    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slots.iter().position(|s| s == slot)
    }

    pub fn overlaps(&self) -> &OverlapIndex {
        &self.overlaps
    }

    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<Overlap> {
        self.overlaps.get(slot_id, other_slot_id)
    }

    pub fn try_overlap(
        &self,
        slot_id: SlotId,
        other_slot_id: SlotId,
    ) -> Result<Option<Overlap>, Error> {
        self.try_slot(slot_id)?;
        self.try_slot(other_slot_id)?;
        Ok(self.overlap(slot_id, other_slot_id))
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        self.overlaps.neighbors(slot_id)
    }
}

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::id::AgentId;

/// Integer cell coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in cells.
    pub fn distance_to(self, cx: f64, cy: f64) -> f64 {
        let dx = f64::from(self.x) - cx;
        let dy = f64::from(self.y) - cy;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Occupancy map from cell to the agent standing on it.
///
/// Cells hold `AgentId` back-references only; the population owns the agents.
/// Storage is row-major, one slot per cell.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    width: i32,
    height: i32,
    cells: Vec<Option<AgentId>>,
}

impl SpatialGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let cells = vec![None; width as usize * height as usize];
        Self {
            width: width as i32,
            height: height as i32,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn slot(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// The agent on `(x, y)`, if any. Out-of-bounds cells are empty.
    pub fn occupant_at(&self, x: i32, y: i32) -> Option<AgentId> {
        self.slot(x, y).and_then(|i| self.cells[i])
    }

    pub fn place(&mut self, id: AgentId, x: i32, y: i32) -> Result<(), SimError> {
        let slot = self.slot(x, y).ok_or(SimError::OutOfBounds { x, y })?;
        match self.cells[slot] {
            Some(other) if other != id => Err(SimError::CellOccupied { x, y }),
            _ => {
                self.cells[slot] = Some(id);
                Ok(())
            }
        }
    }

    /// Clear a cell. Vacating an empty or out-of-bounds cell is a no-op.
    pub fn vacate(&mut self, x: i32, y: i32) {
        if let Some(slot) = self.slot(x, y) {
            self.cells[slot] = None;
        }
    }

    /// Move `id` from `old` to `new`. On error the grid is left untouched.
    pub fn move_agent(&mut self, id: AgentId, old: Position, new: Position) -> Result<(), SimError> {
        let slot = self
            .slot(new.x, new.y)
            .ok_or(SimError::OutOfBounds { x: new.x, y: new.y })?;
        if let Some(other) = self.cells[slot] {
            if other != id {
                return Err(SimError::CellOccupied { x: new.x, y: new.y });
            }
        }
        self.vacate(old.x, old.y);
        self.cells[slot] = Some(id);
        Ok(())
    }

    /// Whether `id`, standing on `old`, may step to `new`.
    ///
    /// Scans the footprint's row at `new.y` (skipping column `old.x`) and its
    /// column at `new.x` (skipping row `old.y`). This is two 1-D scans, not a
    /// rectangle overlap: diagonal neighbours are never examined.
    pub fn is_move_valid(&self, id: AgentId, old: Position, new: Position, half_extent: i32) -> bool {
        if !self.in_bounds(new.x, new.y) {
            return false;
        }
        let blocked = |x: i32, y: i32| matches!(self.occupant_at(x, y), Some(other) if other != id);

        for x in new.x - half_extent..=new.x + half_extent {
            if x != old.x && blocked(x, new.y) {
                return false;
            }
        }
        for y in new.y - half_extent..=new.y + half_extent {
            if y != old.y && blocked(new.x, y) {
                return false;
            }
        }
        true
    }

    /// Whether a new agent dropped on `(x, y)` would touch anyone, using the
    /// same row/column footprint scans as movement, centre cell included.
    pub fn placement_collides(&self, x: i32, y: i32, half_extent: i32) -> bool {
        (x - half_extent..=x + half_extent).any(|i| self.occupant_at(i, y).is_some())
            || (y - half_extent..=y + half_extent).any(|j| self.occupant_at(x, j).is_some())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Every occupied cell with its occupant, row by row.
    pub fn occupants(&self) -> impl Iterator<Item = (Position, AgentId)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|id| (Position::new((i % width) as i32, (i / width) as i32), id))
        })
    }
}

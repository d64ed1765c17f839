use std::collections::HashMap;

use gridfill_primitives::{CellAddress, Value};

use crate::error::{FillError, Result};

/// Read access to cell values.
pub trait CellSource {
    /// Value at `addr`, `Value::Empty` when unset.
    fn get(&self, addr: &CellAddress) -> Value;
}

/// Write access to cell values.
pub trait CellSink {
    fn set(&mut self, addr: CellAddress, value: Value);
}

/// Sparse in-memory grid. Setting a cell to an empty value removes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGrid {
    cells: HashMap<CellAddress, Value>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cells(cells: HashMap<CellAddress, Value>) -> Self {
        let mut grid = Self::new();
        for (addr, value) in cells {
            grid.set(addr, value);
        }
        grid
    }

    /// Place `values` downward from `start`. Values that would land past
    /// the last row are an error; the ones before it stay placed.
    pub fn set_column(
        &mut self,
        start: CellAddress,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<()> {
        for (i, value) in values.into_iter().enumerate() {
            let row = step(start.row, i).ok_or(FillError::OutOfGrid { start, axis: "row" })?;
            self.set(CellAddress::new(row, start.col), value);
        }
        Ok(())
    }

    /// Place `values` rightward from `start`, like [`Self::set_column`].
    pub fn set_row(
        &mut self,
        start: CellAddress,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<()> {
        for (i, value) in values.into_iter().enumerate() {
            let col = step(start.col, i).ok_or(FillError::OutOfGrid {
                start,
                axis: "column",
            })?;
            self.set(CellAddress::new(start.row, col), value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellAddress, &Value)> {
        self.cells.iter()
    }
}

impl CellSource for MemoryGrid {
    fn get(&self, addr: &CellAddress) -> Value {
        self.cells.get(addr).cloned().unwrap_or(Value::Empty)
    }
}

impl CellSink for MemoryGrid {
    fn set(&mut self, addr: CellAddress, value: Value) {
        if value.is_empty() {
            self.cells.remove(&addr);
        } else {
            self.cells.insert(addr, value);
        }
    }
}

fn step(from: u32, offset: usize) -> Option<u32> {
    from.checked_add(u32::try_from(offset).ok()?)
}

use crate::error::{BfError, BfResult};
use crate::math::{unbalanced_wrapping_add, unbalanced_wrapping_sub};

pub const MEMORY_SIZE: usize = 30000;

/// Tape of the interpreters. `index` never leaves `0..MEMORY_SIZE`.
pub struct Memory {
    index: usize,
    cells: Box<[u8]>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            index: 0,
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self) -> u8 {
        self.cells[self.index]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.index] = value;
    }

    pub fn add(&mut self, count: usize) {
        self.set(unbalanced_wrapping_add(self.get(), count));
    }

    pub fn sub(&mut self, count: usize) {
        self.set(unbalanced_wrapping_sub(self.get(), count));
    }

    pub fn move_pointer(&mut self, forward: bool, amount: usize, pc: usize) -> BfResult<()> {
        self.index = self.cell_at(forward, amount, pc)?;
        Ok(())
    }

    /// Index of the cell `amount` cells away from the data pointer.
    pub fn cell_at(&self, forward: bool, amount: usize, pc: usize) -> BfResult<usize> {
        let target = if forward {
            self.index.checked_add(amount)
        } else {
            self.index.checked_sub(amount)
        };

        match target {
            Some(target) if target < self.cells.len() => Ok(target),
            _ => Err(BfError::Bf(format!(
                "data pointer out of bounds at pc={pc}"
            ))),
        }
    }

    /// Adds the current cell onto `target` and clears the current cell.
    pub fn move_data_to(&mut self, target: usize) {
        let value = self.get();
        self.cells[target] = self.cells[target].wrapping_add(value);
        self.set(0);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

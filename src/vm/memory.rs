// VM Memory: fixed 32768-word store holding raw 16-bit program words

use super::error::{LoadError, VMFault};
use crate::config::MEMORY_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<u16>,
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl Memory {
    /// Zero-filled memory
    pub fn new() -> Self {
        Memory {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Copies a program image to address 0; the tail stays zero
    pub fn from_image(words: &[u16]) -> Result<Self, LoadError> {
        if words.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge(words.len()));
        }
        let mut memory = Memory::new();
        memory.cells[..words.len()].copy_from_slice(words);
        Ok(memory)
    }

    pub fn read(&self, address: usize) -> Result<u16, VMFault> {
        self.cells
            .get(address)
            .copied()
            .ok_or(VMFault::AddressOutOfRange(address))
    }

    pub fn write(&mut self, address: usize, value: u16) -> Result<(), VMFault> {
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(VMFault::AddressOutOfRange(address))?;
        *cell = value;
        Ok(())
    }

    pub fn view(&self) -> &[u16] {
        &self.cells
    }
}

// VM Register bank: eight general purpose 15-bit registers

use super::error::RegisterError;
use crate::config::{MODULUS, REGISTER_COUNT};

/// Storage for all VM registers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registers {
    data: [u16; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            data: [0; REGISTER_COUNT],
        }
    }

    /// Builds a bank from raw values, as restored from a checkpoint
    pub fn from_values(data: [u16; REGISTER_COUNT]) -> Self {
        Registers { data }
    }

    /// Get the value of a register
    pub fn get(&self, idx: usize) -> Result<u16, RegisterError> {
        self.data
            .get(idx)
            .copied()
            .ok_or(RegisterError::InvalidRegister(idx))
    }

    /// Set the value of a register; values wrap into the 15-bit range
    pub fn set(&mut self, idx: usize, value: u16) -> Result<(), RegisterError> {
        let slot = self
            .data
            .get_mut(idx)
            .ok_or(RegisterError::InvalidRegister(idx))?;
        *slot = (value as u32 % MODULUS) as u16;
        Ok(())
    }

    pub fn view(&self) -> &[u16] {
        &self.data
    }
}

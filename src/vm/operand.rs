// Address resolution: operand words become literal values, register reads, or write targets

use std::fmt;

use crate::config::{MAX_WORD, REGISTER_BASE, REGISTER_COUNT};
use crate::vm::error::VMFault;
use crate::vm::registers::Registers;

/// A decoded operand word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Register(usize),
}

/// Where a destination operand writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Memory(u16),
    Register(usize),
}

impl Operand {
    /// Decodes a raw operand word. Words past the last register are rejected.
    pub fn decode(raw: u16) -> Result<Self, VMFault> {
        if raw <= MAX_WORD {
            Ok(Operand::Literal(raw))
        } else if ((raw - REGISTER_BASE) as usize) < REGISTER_COUNT {
            Ok(Operand::Register((raw - REGISTER_BASE) as usize))
        } else {
            Err(VMFault::InvalidOperand(raw))
        }
    }

    /// The word this operand was decoded from
    pub fn raw(&self) -> u16 {
        match self {
            Operand::Literal(v) => *v,
            Operand::Register(r) => REGISTER_BASE + *r as u16,
        }
    }

    /// Gets the operand value, reading through a register when needed
    pub fn value(&self, registers: &Registers) -> Result<u16, VMFault> {
        match self {
            Operand::Literal(v) => Ok(*v),
            Operand::Register(r) => {
                let val = registers
                    .get(*r)
                    .map_err(|_| VMFault::InvalidRegister(self.raw()))?;
                log::trace!(target: "instructions", "Read reg{} = {}", r, val);
                Ok(val)
            }
        }
    }

    /// Treats the operand as a location rather than a value
    pub fn write_target(&self) -> WriteTarget {
        match self {
            Operand::Literal(addr) => WriteTarget::Memory(*addr),
            Operand::Register(r) => WriteTarget::Register(*r),
        }
    }

    /// `set` only ever names a register directly
    pub fn register_index(&self) -> Result<usize, VMFault> {
        match self {
            Operand::Register(r) => Ok(*r),
            Operand::Literal(v) => Err(VMFault::InvalidRegister(*v)),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Register(r) => write!(f, "reg{}", r),
        }
    }
}

/// Resolves a raw operand word to the value it denotes
pub fn resolve_value(raw: u16, registers: &Registers) -> Result<u16, VMFault> {
    Operand::decode(raw)?.value(registers)
}

/// Resolves a raw destination word to the location it names
pub fn resolve_write_target(raw: u16) -> Result<WriteTarget, VMFault> {
    Ok(Operand::decode(raw)?.write_target())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registers() -> Registers {
        Registers::from_values([10, 11, 12, 13, 14, 15, 16, 17])
    }

    #[test]
    fn test_literal_values_pass_through() {
        let regs = sample_registers();
        for w in [0u16, 1, 4, 1000, 32767] {
            assert_eq!(resolve_value(w, &regs).unwrap(), w);
        }
    }

    #[test]
    fn test_register_values_are_read() {
        let regs = sample_registers();
        for r in 0..8u16 {
            assert_eq!(
                resolve_value(32768 + r, &regs).unwrap(),
                regs.get(r as usize).unwrap()
            );
        }
    }

    #[test]
    fn test_invalid_operand_is_rejected() {
        let regs = sample_registers();
        assert_eq!(
            resolve_value(32776, &regs),
            Err(VMFault::InvalidOperand(32776))
        );
        assert_eq!(
            resolve_write_target(65535),
            Err(VMFault::InvalidOperand(65535))
        );
    }

    #[test]
    fn test_write_targets() {
        assert_eq!(resolve_write_target(300).unwrap(), WriteTarget::Memory(300));
        assert_eq!(
            resolve_write_target(32770).unwrap(),
            WriteTarget::Register(2)
        );
    }

    #[test]
    fn test_register_index_rejects_literals() {
        assert_eq!(Operand::Register(3).register_index().unwrap(), 3);
        assert_eq!(
            Operand::Literal(3).register_index(),
            Err(VMFault::InvalidRegister(3))
        );
    }

    #[test]
    fn test_display_and_raw() {
        assert_eq!(Operand::Register(7).to_string(), "reg7");
        assert_eq!(Operand::Literal(6027).to_string(), "6027");
        assert_eq!(Operand::Register(1).raw(), 32769);
    }
}

use super::processor::{Flow, InstructionProcessor};
use crate::config::MODULUS;
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// Processor for modular arithmetic
pub struct ArithmeticOperations;

impl ArithmeticOperations {
    pub fn new() -> Self {
        ArithmeticOperations
    }
}

/// (b + c) mod 32768
pub fn wrapping_add(b: u16, c: u16) -> u16 {
    ((b as u32 + c as u32) % MODULUS) as u16
}

/// (b * c) mod 32768
pub fn wrapping_mult(b: u16, c: u16) -> u16 {
    ((b as u32 * c as u32) % MODULUS) as u16
}

impl InstructionProcessor for ArithmeticOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Add(..) | Instruction::Mult(..) | Instruction::Mod(..)
        )
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        let (a, b, c) = match instruction {
            Instruction::Add(a, b, c) | Instruction::Mult(a, b, c) | Instruction::Mod(a, b, c) => {
                (a, b.value(&state.registers)?, c.value(&state.registers)?)
            }
            _ => {
                return Err(VMFault::InvalidOpcode {
                    address: state.ip,
                    opcode: instruction.opcode(),
                });
            }
        };

        let result = match instruction {
            Instruction::Add(..) => wrapping_add(b, c),
            Instruction::Mult(..) => wrapping_mult(b, c),
            _ => {
                if c == 0 {
                    return Err(VMFault::DivisionByZero);
                }
                b % c
            }
        };
        state.write(a.write_target(), result)?;
        Ok(Flow::Next)
    }
}

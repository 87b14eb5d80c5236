use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::operand::WriteTarget;
use crate::vm::state::MachineState;

/// Processor for register assignment and comparisons
pub struct RegisterOperations;

impl RegisterOperations {
    pub fn new() -> Self {
        RegisterOperations
    }
}

impl InstructionProcessor for RegisterOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Set(..) | Instruction::Eq(..) | Instruction::Gt(..)
        )
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        match instruction {
            Instruction::Set(a, b) => {
                // The destination is a register index, never read through
                let reg = a.register_index()?;
                let val = b.value(&state.registers)?;
                state.write(WriteTarget::Register(reg), val)?;
            }
            Instruction::Eq(a, b, c) => {
                let lhs = b.value(&state.registers)?;
                let rhs = c.value(&state.registers)?;
                state.write(a.write_target(), (lhs == rhs) as u16)?;
            }
            Instruction::Gt(a, b, c) => {
                let lhs = b.value(&state.registers)?;
                let rhs = c.value(&state.registers)?;
                state.write(a.write_target(), (lhs > rhs) as u16)?;
            }
            _ => {
                return Err(VMFault::InvalidOpcode {
                    address: state.ip,
                    opcode: instruction.opcode(),
                });
            }
        }
        Ok(Flow::Next)
    }
}

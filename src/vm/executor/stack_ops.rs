use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// Processor for stack manipulation instructions
pub struct StackOperations;

impl StackOperations {
    pub fn new() -> Self {
        StackOperations
    }
}

impl InstructionProcessor for StackOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(instruction, Instruction::Push(_) | Instruction::Pop(_))
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        match instruction {
            Instruction::Push(a) => {
                let val = a.value(&state.registers)?;
                state.push(val)?;
                Ok(Flow::Next)
            }
            Instruction::Pop(a) => {
                // Empty stack is fatal; there is no default value
                let val = state.pop()?;
                state.write(a.write_target(), val)?;
                Ok(Flow::Next)
            }
            _ => Err(VMFault::InvalidOpcode {
                address: state.ip,
                opcode: instruction.opcode(),
            }),
        }
    }
}

use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::operand::WriteTarget;
use crate::vm::state::MachineState;

/// Processor for indirect memory reads and writes
pub struct MemoryOperations;

impl MemoryOperations {
    pub fn new() -> Self {
        MemoryOperations
    }
}

impl InstructionProcessor for MemoryOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(instruction, Instruction::Rmem(..) | Instruction::Wmem(..))
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        match instruction {
            Instruction::Rmem(a, b) => {
                let address = b.value(&state.registers)?;
                let val = state.memory.read(address as usize)?;
                state.write(a.write_target(), val)?;
            }
            Instruction::Wmem(a, b) => {
                // Unlike other destinations, a register here holds the address
                let address = a.value(&state.registers)?;
                let val = b.value(&state.registers)?;
                state.write(WriteTarget::Memory(address), val)?;
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

use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// Processor for character IO and noop
pub struct MiscellaneousOperations;

impl MiscellaneousOperations {
    pub fn new() -> Self {
        MiscellaneousOperations
    }
}

impl InstructionProcessor for MiscellaneousOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Out(_) | Instruction::In(_) | Instruction::Noop
        )
    }

    fn process(
        &self,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        match instruction {
            Instruction::Out(a) => {
                let code = a.value(&state.registers)?;
                let byte = u8::try_from(code).map_err(|_| VMFault::InvalidCharacter(code))?;
                io.write_char(byte)?;
            }
            Instruction::In(a) => {
                let byte = io.read_char()?.ok_or(VMFault::InputExhausted)?;
                state.write(a.write_target(), byte as u16)?;
            }
            Instruction::Noop => {}
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

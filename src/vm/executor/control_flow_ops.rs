use super::processor::{Flow, InstructionProcessor};
use crate::vm::dispatcher::HaltReason;
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// Processor for control flow operations
pub struct ControlFlowOperations;

impl ControlFlowOperations {
    pub fn new() -> Self {
        ControlFlowOperations
    }
}

impl InstructionProcessor for ControlFlowOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Halt
                | Instruction::Jmp(_)
                | Instruction::Jt(..)
                | Instruction::Jf(..)
                | Instruction::Call(_)
                | Instruction::Ret
        )
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        match instruction {
            Instruction::Halt => Ok(Flow::Halt(HaltReason::Requested)),
            Instruction::Jmp(a) => Ok(Flow::Jump(a.value(&state.registers)?)),
            Instruction::Jt(a, b) | Instruction::Jf(a, b) => {
                let cond = a.value(&state.registers)?;
                let target = b.value(&state.registers)?;
                let taken = match instruction {
                    Instruction::Jt(..) => cond != 0,
                    _ => cond == 0,
                };
                crate::debug_instructions!(
                    ip = state.ip;
                    "{}: condition = {}. Jumping to {}? {}",
                    instruction.name(),
                    cond,
                    target,
                    taken
                );
                Ok(if taken { Flow::Jump(target) } else { Flow::Next })
            }
            Instruction::Call(a) => {
                let target = a.value(&state.registers)?;
                let return_address = state.address_after(instruction.encoded_len())?;
                crate::debug_instructions!(
                    ip = state.ip;
                    "call: pushing return addr {} and jumping to {}",
                    return_address,
                    target
                );
                state.push(return_address)?;
                Ok(Flow::Jump(target))
            }
            Instruction::Ret => match state.pop() {
                Ok(address) => Ok(Flow::Jump(address)),
                // Returning with nothing on the stack ends the program
                Err(VMFault::StackUnderflow) => Ok(Flow::Halt(HaltReason::EmptyReturn)),
                Err(fault) => Err(fault),
            },
            _ => Err(VMFault::InvalidOpcode {
                address: state.ip,
                opcode: instruction.opcode(),
            }),
        }
    }
}

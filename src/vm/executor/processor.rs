use crate::vm::dispatcher::HaltReason;
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// What the dispatcher does with the instruction pointer after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to the word after the operands
    Next,
    Jump(u16),
    Halt(HaltReason),
}

/// A family of instructions sharing one handler
pub trait InstructionProcessor {
    fn can_process(&self, instruction: &Instruction) -> bool;

    fn process(
        &self,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault>;
}

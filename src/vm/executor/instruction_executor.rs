use crate::vm::error::VMFault;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

use super::arithmetic_ops::ArithmeticOperations;
use super::bitwise_ops::BitwiseOperations;
use super::control_flow_ops::ControlFlowOperations;
use super::memory_ops::MemoryOperations;
use super::misc_ops::MiscellaneousOperations;
use super::processor::{Flow, InstructionProcessor};
use super::register_ops::RegisterOperations;
use super::stack_ops::StackOperations;
use crate::vm::instruction::Instruction;

/// A struct that holds all instruction processors
pub struct InstructionExecutor {
    processors: Vec<Box<dyn InstructionProcessor>>,
}

impl Default for InstructionExecutor {
    fn default() -> Self {
        InstructionExecutor::new()
    }
}

impl InstructionExecutor {
    /// Create a new executor with all processors registered
    pub fn new() -> Self {
        let processors: Vec<Box<dyn InstructionProcessor>> = vec![
            Box::new(StackOperations::new()),
            Box::new(RegisterOperations::new()),
            Box::new(ArithmeticOperations::new()),
            Box::new(BitwiseOperations::new()),
            Box::new(MemoryOperations::new()),
            Box::new(ControlFlowOperations::new()),
            Box::new(MiscellaneousOperations::new()),
        ];

        InstructionExecutor { processors }
    }

    /// Execute a single instruction, delegating to the appropriate processor
    pub fn execute_instruction(
        &self,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
        instr: &Instruction,
    ) -> Result<Flow, VMFault> {
        for processor in &self.processors {
            if processor.can_process(instr) {
                return processor.process(state, io, instr);
            }
        }

        // No processor found to handle this instruction
        Err(VMFault::InvalidOpcode {
            address: state.ip,
            opcode: instr.opcode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::dispatcher::HaltReason;
    use crate::vm::executor::{Flow, InstructionExecutor};
    use crate::vm::instruction::{Instruction, OPCODE_TABLE};
    use crate::vm::io::BufferedIo;
    use crate::vm::memory::Memory;
    use crate::vm::operand::Operand;
    use crate::vm::state::MachineState;

    fn execute(state: &mut MachineState, instruction: Instruction) -> Flow {
        InstructionExecutor::new()
            .execute_instruction(state, &mut BufferedIo::with_input("x"), &instruction)
            .unwrap()
    }

    #[test]
    fn test_every_opcode_has_a_processor() {
        let executor = InstructionExecutor::new();
        for opcode in 0..OPCODE_TABLE.len() as u16 {
            // reg1 as every operand keeps mod away from zero
            let mut state = MachineState::new(
                Memory::from_image(&[opcode, 32769, 32769, 32769]).unwrap(),
            );
            state.registers.set(1, 3).unwrap();
            state.push(10).unwrap();
            let instr = Instruction::fetch(&state.memory, 0).unwrap();
            let result =
                executor.execute_instruction(&mut state, &mut BufferedIo::with_input("x"), &instr);
            assert!(result.is_ok(), "opcode {} failed: {:?}", opcode, result);
        }
    }

    #[test]
    fn test_stack_operations_delegation() {
        let mut state = MachineState::default();
        execute(&mut state, Instruction::Push(Operand::Literal(42)));
        execute(&mut state, Instruction::Pop(Operand::Register(0)));
        assert_eq!(state.registers.get(0).unwrap(), 42);
    }

    #[test]
    fn test_arithmetic_execution() {
        let mut state = MachineState::default();
        state.registers.set(1, 10).unwrap();
        state.registers.set(2, 5).unwrap();
        let flow = execute(
            &mut state,
            Instruction::Add(Operand::Register(0), Operand::Register(1), Operand::Register(2)),
        );
        assert_eq!(flow, Flow::Next);
        assert_eq!(state.registers.get(0).unwrap(), 15);
    }

    #[test]
    fn test_control_flow_delegation() {
        let mut state = MachineState::default();
        assert_eq!(
            execute(&mut state, Instruction::Halt),
            Flow::Halt(HaltReason::Requested)
        );
        assert_eq!(
            execute(&mut state, Instruction::Jmp(Operand::Literal(9))),
            Flow::Jump(9)
        );
    }
}

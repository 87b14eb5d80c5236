use super::processor::{Flow, InstructionProcessor};
use crate::config::MAX_WORD;
use crate::vm::error::VMFault;
use crate::vm::instruction::Instruction;
use crate::vm::io::IoChannel;
use crate::vm::state::MachineState;

/// Processor for 15-bit bitwise operations
pub struct BitwiseOperations;

impl BitwiseOperations {
    pub fn new() -> Self {
        BitwiseOperations
    }
}

/// 15-bit complement
pub fn complement(value: u16) -> u16 {
    !value & MAX_WORD
}

impl InstructionProcessor for BitwiseOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::And(..) | Instruction::Or(..) | Instruction::Not(..)
        )
    }

    fn process(
        &self,
        state: &mut MachineState,
        _io: &mut dyn IoChannel,
        instruction: &Instruction,
    ) -> Result<Flow, VMFault> {
        let regs = &state.registers;
        let (target, result) = match instruction {
            Instruction::And(a, b, c) => (a.write_target(), b.value(regs)? & c.value(regs)?),
            Instruction::Or(a, b, c) => (a.write_target(), b.value(regs)? | c.value(regs)?),
            Instruction::Not(a, b) => (a.write_target(), complement(b.value(regs)?)),
            _ => {
                return Err(VMFault::InvalidOpcode {
                    address: state.ip,
                    opcode: instruction.opcode(),
                });
            }
        };
        state.write(target, result)?;
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::io::BufferedIo;
    use crate::vm::operand::Operand;

    fn run(state: &mut MachineState, instruction: Instruction) {
        BitwiseOperations::new()
            .process(state, &mut BufferedIo::default(), &instruction)
            .unwrap();
    }

    #[test]
    fn test_and_or() {
        let mut state = MachineState::default();
        state.registers.set(1, 0b1010).unwrap();
        state.registers.set(2, 0b1100).unwrap();
        run(
            &mut state,
            Instruction::And(Operand::Register(0), Operand::Register(1), Operand::Register(2)),
        );
        assert_eq!(state.registers.get(0).unwrap(), 0b1000);
        run(
            &mut state,
            Instruction::Or(Operand::Register(0), Operand::Register(1), Operand::Register(2)),
        );
        assert_eq!(state.registers.get(0).unwrap(), 0b1110);
    }

    #[test]
    fn test_not_is_fifteen_bit() {
        let mut state = MachineState::default();
        run(
            &mut state,
            Instruction::Not(Operand::Register(0), Operand::Literal(0)),
        );
        assert_eq!(state.registers.get(0).unwrap(), 32767);
        run(
            &mut state,
            Instruction::Not(Operand::Register(0), Operand::Literal(21845)),
        );
        assert_eq!(state.registers.get(0).unwrap(), 32767 - 21845);
    }

    #[test]
    fn test_complement_is_self_inverse() {
        for x in 0..=MAX_WORD {
            assert_eq!(complement(complement(x)), x);
            assert_eq!(complement(x), 32767 - x);
        }
    }
}

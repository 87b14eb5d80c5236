// VM Instruction execution: one processor per instruction family, picked by the executor

pub mod arithmetic_ops;
pub mod bitwise_ops;
pub mod control_flow_ops;
pub mod instruction_executor;
pub mod memory_ops;
pub mod misc_ops;
pub mod processor;
pub mod register_ops;
pub mod stack_ops;

pub use crate::vm::instruction::Instruction;
pub use crate::vm::operand::Operand;
pub use instruction_executor::InstructionExecutor;
pub use processor::{Flow, InstructionProcessor};

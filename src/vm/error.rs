// VM Error types: register access errors, stack errors, VM faults, snapshot and image errors

use std::io;
use thiserror::Error;

/// Register Errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Invalid register index {0}")]
    InvalidRegister(usize),
}

/// Stack Errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StackError {
    #[error("Stack overflow")]
    Overflow,
    #[error("Stack underflow")]
    Underflow,
}

/// VM Errors. Every fault halts the machine.
#[derive(Error, Debug, PartialEq, Eq, Copy, Clone)]
pub enum VMFault {
    #[error("Invalid opcode {opcode} at address {address}")]
    InvalidOpcode { address: u16, opcode: u16 },
    #[error("Invalid operand encoding {0}")]
    InvalidOperand(u16),
    #[error("Operand {0} does not name a register")]
    InvalidRegister(u16),
    #[error("Call stack depth limit exceeded")]
    StackOverflow,
    #[error("Pop from an empty stack")]
    StackUnderflow,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Address {0} is outside of memory")]
    AddressOutOfRange(usize),
    #[error("Character code {0} cannot be written")]
    InvalidCharacter(u16),
    #[error("Input exhausted")]
    InputExhausted,
    #[error("I/O error: {0:?}")]
    Io(io::ErrorKind),
    #[error("Machine is not running")]
    NotRunning,
}

impl From<StackError> for VMFault {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Overflow => VMFault::StackOverflow,
            StackError::Underflow => VMFault::StackUnderflow,
        }
    }
}

impl From<io::Error> for VMFault {
    fn from(err: io::Error) -> Self {
        VMFault::Io(err.kind())
    }
}

/// Checkpoint decode/encode errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Malformed checkpoint: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Checkpoint I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Field `{field}` has {found} entries, expected {expected}")]
    Length {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Field `{field}` entry {index} holds {value}, outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        index: usize,
        value: i64,
        max: u16,
    },
    #[error("Checkpoint stack holds {depth} entries, limit is {limit}")]
    StackTooDeep { depth: usize, limit: usize },
}

/// Program image errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Program image has an odd byte count ({0})")]
    OddLength(usize),
    #[error("Program image holds {0} words, more than memory can hold")]
    TooLarge(usize),
    #[error("Could not read program image: {0}")]
    Io(#[from] io::Error),
}

/// Debug console command errors; the session stays open after one
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("`{0}` needs an argument: {1}")]
    MissingArgument(char, &'static str),
    #[error("`{0}` is not a number in 0..={1}")]
    BadNumber(String, u16),
    #[error("`{0}` is not a register (reg0..reg7)")]
    BadRegister(String),
}

//! Configuration constants for the virtual machine.

// Machine geometry
pub const MEMORY_SIZE: usize = 32768; // Addressable words
pub const REGISTER_COUNT: usize = 8;
pub const MODULUS: u32 = 32768; // All word arithmetic wraps here
pub const MAX_WORD: u16 = 32767;
pub const REGISTER_BASE: u16 = 32768; // Operands 32768..=32775 name registers

// VM configuration
pub const MAX_CALL_STACK_DEPTH: usize = 1024; // Runaway-program cap for push/call

// Debugger defaults
pub const DEFAULT_CHECKPOINT_PATH: &str = "checkpoint.json";
pub const DEFAULT_TRACE_PATH: &str = "trace.log";

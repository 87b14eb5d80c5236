pub mod config;
pub mod disasm;
pub mod logging;
pub mod vm;

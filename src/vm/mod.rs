// VM module entry point

pub mod debugger;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod instruction;
pub mod io;
pub mod loader;
pub mod memory;
pub mod operand;
pub mod registers;
pub mod snapshot;
pub mod stack;
pub mod state;
pub mod trace;

pub use debugger::{DebugController, SuspendSignal};
pub use dispatcher::{Dispatcher, HaltReason, Status};
pub use error::VMFault;
pub use state::MachineState;

// Fetch-decode-execute loop over a MachineState

use log::{error, info};

use super::error::VMFault;
use super::executor::{Flow, InstructionExecutor};
use super::instruction::Instruction;
use super::io::IoChannel;
use super::state::MachineState;

/// Why the machine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The program executed `halt`
    Requested,
    /// `ret` found the stack empty
    EmptyReturn,
    /// Halted from the debug console
    Debugger,
    Fault(VMFault),
}

impl HaltReason {
    pub fn is_fault(&self) -> bool {
        matches!(self, HaltReason::Fault(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Suspended,
    Halted(HaltReason),
}

/// Owns control state; the machine state itself is passed in by the caller
pub struct Dispatcher {
    status: Status,
    executor: InstructionExecutor,
    steps: u64,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            status: Status::Running,
            executor: InstructionExecutor::new(),
            steps: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Number of instructions completed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn suspend(&mut self) {
        if self.status == Status::Running {
            crate::debug_vm!("Suspended after {} steps", self.steps);
            self.status = Status::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.status == Status::Suspended {
            crate::debug_vm!("Resumed");
            self.status = Status::Running;
        }
    }

    pub fn halt(&mut self, reason: HaltReason) {
        match reason {
            HaltReason::Fault(fault) => error!(target: "vm", "Machine halted: {}", fault),
            other => info!(target: "vm", "Machine halted: {:?}", other),
        }
        self.status = Status::Halted(reason);
    }

    /// Executes the instruction at the instruction pointer.
    ///
    /// Returns the instruction that ran. Any fault halts the machine before it
    /// is returned, leaving the state as it was when the fault was raised.
    pub fn step(
        &mut self,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
    ) -> Result<Instruction, VMFault> {
        if self.status != Status::Running {
            return Err(VMFault::NotRunning);
        }

        match self.execute(state, io) {
            Ok(instr) => {
                self.steps += 1;
                Ok(instr)
            }
            Err(fault) => {
                self.halt(HaltReason::Fault(fault));
                Err(fault)
            }
        }
    }

    fn execute(
        &mut self,
        state: &mut MachineState,
        io: &mut dyn IoChannel,
    ) -> Result<Instruction, VMFault> {
        let instr = Instruction::fetch(&state.memory, state.ip)?;
        crate::debug_instructions!(ip = state.ip; "{:?}", instr);

        match self.executor.execute_instruction(state, io, &instr)? {
            Flow::Next => state.ip = state.address_after(instr.encoded_len())?,
            Flow::Jump(target) => state.ip = target,
            Flow::Halt(reason) => {
                let _ = io.flush();
                self.halt(reason);
            }
        }
        Ok(instr)
    }

    /// Steps until the machine stops running
    pub fn run(&mut self, state: &mut MachineState, io: &mut dyn IoChannel) -> Status {
        while self.is_running() {
            let _ = self.step(state, io);
        }
        let _ = io.flush();
        self.status
    }
}

// VM State: memory, registers, stack and instruction pointer, the unit of checkpointing

use super::error::VMFault;
use super::memory::Memory;
use super::operand::WriteTarget;
use super::registers::Registers;
use super::stack::CallStack;
use crate::config::{self, MAX_WORD, MODULUS};

/// Complete machine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub memory: Memory,
    pub registers: Registers,
    pub stack: CallStack,
    pub ip: u16, // Instruction pointer
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState::new(Memory::new())
    }
}

impl MachineState {
    /// Boot state for a loaded memory image
    pub fn new(memory: Memory) -> Self {
        MachineState::with_stack_depth(memory, config::MAX_CALL_STACK_DEPTH)
    }

    pub fn with_stack_depth(memory: Memory, max_depth: usize) -> Self {
        MachineState {
            memory,
            registers: Registers::new(),
            stack: CallStack::with_depth(max_depth),
            ip: 0,
        }
    }

    /// Writes a value to a destination operand's location
    pub fn write(&mut self, target: WriteTarget, value: u16) -> Result<(), VMFault> {
        let value = (value as u32 % MODULUS) as u16;
        match target {
            WriteTarget::Memory(addr) => self.memory.write(addr as usize, value),
            WriteTarget::Register(r) => self
                .registers
                .set(r, value)
                .map_err(|_| VMFault::InvalidRegister(r as u16)),
        }
    }

    /// Push a value, faulting once the depth cap is reached
    pub fn push(&mut self, value: u16) -> Result<(), VMFault> {
        self.stack.push(value).map_err(VMFault::from)
    }

    pub fn pop(&mut self) -> Result<u16, VMFault> {
        self.stack.pop().map_err(VMFault::from)
    }

    /// Address of the word following an instruction of `len` words at ip.
    /// Running off the end of memory faults.
    pub fn address_after(&self, len: u16) -> Result<u16, VMFault> {
        let next = self.ip as usize + len as usize;
        if next > MAX_WORD as usize {
            return Err(VMFault::AddressOutOfRange(next));
        }
        Ok(next as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_state_init() {
        let vm = MachineState::default();
        assert_eq!(vm.ip, 0);
        assert!(vm.stack.is_empty());
        assert_eq!(vm.stack.max_depth(), config::MAX_CALL_STACK_DEPTH);
        assert_eq!(vm.registers.view(), &[0; 8]);
    }

    #[test]
    fn test_write_targets() {
        let mut vm = MachineState::default();
        vm.write(WriteTarget::Register(3), 42).unwrap();
        vm.write(WriteTarget::Memory(1000), 7).unwrap();
        assert_eq!(vm.registers.get(3).unwrap(), 42);
        assert_eq!(vm.memory.read(1000).unwrap(), 7);
    }

    #[test]
    fn test_stack_faults() {
        let mut vm = MachineState::with_stack_depth(Memory::new(), 1);
        assert_eq!(vm.pop(), Err(VMFault::StackUnderflow));
        vm.push(5).unwrap();
        assert_eq!(vm.push(6), Err(VMFault::StackOverflow));
    }

    #[test]
    fn test_address_after_stops_at_memory_end() {
        let mut vm = MachineState::default();
        vm.ip = 32765;
        assert_eq!(vm.address_after(2), Ok(32767));
        assert_eq!(vm.address_after(3), Err(VMFault::AddressOutOfRange(32768)));
        vm.ip = 32767;
        assert_eq!(vm.address_after(1), Err(VMFault::AddressOutOfRange(32768)));
    }
}

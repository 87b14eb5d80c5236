// Checkpoint format: memory, stack, registers and instruction pointer as a JSON record

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::error::SnapshotError;
use super::memory::Memory;
use super::registers::Registers;
use super::stack::CallStack;
use super::state::MachineState;
use crate::config::{self, MAX_WORD, MEMORY_SIZE, REGISTER_COUNT};

/// Portable copy of a MachineState.
///
/// Entries are wide signed integers; negative or oversized values are
/// rejected by `load` with `SnapshotError::OutOfRange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub memory: Vec<i64>,
    pub stack: Vec<i64>,
    pub registers: Vec<i64>,
    pub offset: i64,
}

/// Copies the state out into a snapshot
pub fn save(state: &MachineState) -> Snapshot {
    Snapshot {
        memory: state.memory.view().iter().map(|&w| w as i64).collect(),
        stack: state.stack.view().iter().map(|&w| w as i64).collect(),
        registers: state.registers.view().iter().map(|&w| w as i64).collect(),
        offset: state.ip as i64,
    }
}

/// Rebuilds a state with the default stack depth cap
pub fn load(snapshot: &Snapshot) -> Result<MachineState, SnapshotError> {
    load_with_depth(snapshot, config::MAX_CALL_STACK_DEPTH)
}

/// Rebuilds a state, validating every field before anything is constructed
pub fn load_with_depth(
    snapshot: &Snapshot,
    max_depth: usize,
) -> Result<MachineState, SnapshotError> {
    check_len("memory", &snapshot.memory, MEMORY_SIZE)?;
    check_len("registers", &snapshot.registers, REGISTER_COUNT)?;

    // Memory keeps raw image words, so any 16-bit value is legal there
    let memory = check_range("memory", &snapshot.memory, u16::MAX)?;
    let registers = check_range("registers", &snapshot.registers, MAX_WORD)?;
    let stack = check_range("stack", &snapshot.stack, MAX_WORD)?;
    let offset = check_range("offset", &[snapshot.offset], MAX_WORD)?[0];

    let mut call_stack = CallStack::with_depth(max_depth);
    for value in stack {
        call_stack
            .push(value)
            .map_err(|_| SnapshotError::StackTooDeep {
                depth: snapshot.stack.len(),
                limit: max_depth,
            })?;
    }

    let mut register_values = [0u16; REGISTER_COUNT];
    register_values.copy_from_slice(&registers);

    Ok(MachineState {
        memory: Memory::from_image(&memory).map_err(|_| SnapshotError::Length {
            field: "memory",
            expected: MEMORY_SIZE,
            found: memory.len(),
        })?,
        registers: Registers::from_values(register_values),
        stack: call_stack,
        ip: offset,
    })
}

fn check_len(field: &'static str, values: &[i64], expected: usize) -> Result<(), SnapshotError> {
    if values.len() != expected {
        return Err(SnapshotError::Length {
            field,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

fn check_range(field: &'static str, values: &[i64], max: u16) -> Result<Vec<u16>, SnapshotError> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if (0..=max as i64).contains(&value) {
                Ok(value as u16)
            } else {
                Err(SnapshotError::OutOfRange {
                    field,
                    index,
                    value,
                    max,
                })
            }
        })
        .collect()
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Writes a checkpoint of `state` to `path`
pub fn write_checkpoint(state: &MachineState, path: &Path) -> Result<(), SnapshotError> {
    let json = save(state).to_json()?;
    fs::write(path, json)?;
    info!(target: "snapshot", "Checkpoint written to {} (ip {})", path.display(), state.ip);
    Ok(())
}

/// Reads and validates a checkpoint from `path`
pub fn read_checkpoint(path: &Path, max_depth: usize) -> Result<MachineState, SnapshotError> {
    let text = fs::read_to_string(path)?;
    let state = load_with_depth(&Snapshot::from_json(&text)?, max_depth)?;
    info!(target: "snapshot", "Checkpoint loaded from {} (ip {})", path.display(), state.ip);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_state() -> MachineState {
        let mut state =
            MachineState::new(Memory::from_image(&[9, 32768, 32769, 4, 19, 32768, 0]).unwrap());
        state.registers.set(0, 4).unwrap();
        state.registers.set(7, 25734).unwrap();
        state.push(6048).unwrap();
        state.push(12).unwrap();
        state.memory.write(30000, 65535).unwrap();
        state.ip = 6027;
        state
    }

    #[test]
    fn test_round_trip() {
        let state = busy_state();
        assert_eq!(load(&save(&state)).unwrap(), state);
    }

    #[test]
    fn test_round_trip_through_json() {
        let state = busy_state();
        let json = save(&state).to_json().unwrap();
        let restored = load(&Snapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        use crate::vm::dispatcher::{Dispatcher, HaltReason, Status};
        use crate::vm::io::BufferedIo;

        // 0: push 'A'; 2: call 10; 4: out 'C'; 6: pop reg0; 8: halt; 9: noop
        // 10: out 'B'; 12: ret
        let image = [2, 65, 17, 10, 19, 67, 3, 32768, 0, 21, 19, 66, 18];
        let boot = MachineState::new(Memory::from_image(&image).unwrap());

        let mut whole = boot.clone();
        let mut whole_io = BufferedIo::default();
        Dispatcher::new().run(&mut whole, &mut whole_io);

        let mut first = boot;
        let mut first_io = BufferedIo::default();
        let mut dispatcher = Dispatcher::new();
        for _ in 0..3 {
            dispatcher.step(&mut first, &mut first_io).unwrap();
        }
        assert_eq!(first.stack.view(), &[65, 4]);
        assert_eq!(first.ip, 12);

        let json = save(&first).to_json().unwrap();
        let mut resumed = load(&Snapshot::from_json(&json).unwrap()).unwrap();
        let mut second_io = BufferedIo::default();
        let status = Dispatcher::new().run(&mut resumed, &mut second_io);

        assert_eq!(status, Status::Halted(HaltReason::Requested));
        let mut combined = first_io.output.clone();
        combined.extend_from_slice(&second_io.output);
        assert_eq!(combined, whole_io.output);
        assert_eq!(whole_io.output_string(), "BC");
        assert_eq!(resumed, whole);
        assert_eq!(resumed.registers.get(0).unwrap(), 65);
    }

    #[test]
    fn test_json_field_names() {
        let json = save(&MachineState::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["memory"].as_array().unwrap().len(), MEMORY_SIZE);
        assert_eq!(value["registers"].as_array().unwrap().len(), 8);
        assert!(value["stack"].as_array().unwrap().is_empty());
        assert_eq!(value["offset"], 0);
    }

    #[test]
    fn test_missing_field() {
        let result = Snapshot::from_json(r#"{"memory": [], "stack": [], "registers": []}"#);
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_non_integer_values() {
        let result = Snapshot::from_json(
            r#"{"memory": [1.5], "stack": [], "registers": [], "offset": 0}"#,
        );
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_wrong_lengths() {
        let mut snapshot = save(&MachineState::default());
        snapshot.registers.pop();
        assert!(matches!(
            load(&snapshot),
            Err(SnapshotError::Length {
                field: "registers",
                expected: 8,
                found: 7
            })
        ));
    }

    #[test]
    fn test_out_of_range_values() {
        let mut snapshot = save(&MachineState::default());
        snapshot.registers[2] = 32768;
        assert!(matches!(
            load(&snapshot),
            Err(SnapshotError::OutOfRange {
                field: "registers",
                index: 2,
                ..
            })
        ));

        let mut snapshot = save(&MachineState::default());
        snapshot.stack.push(-1);
        assert!(matches!(
            load(&snapshot),
            Err(SnapshotError::OutOfRange { field: "stack", .. })
        ));

        let mut snapshot = save(&MachineState::default());
        snapshot.offset = 40000;
        assert!(matches!(
            load(&snapshot),
            Err(SnapshotError::OutOfRange { field: "offset", .. })
        ));

        let mut snapshot = save(&MachineState::default());
        snapshot.memory[5] = 70000;
        assert!(matches!(
            load(&snapshot),
            Err(SnapshotError::OutOfRange { field: "memory", index: 5, .. })
        ));
    }

    #[test]
    fn test_stack_deeper_than_limit() {
        let snapshot = save(&busy_state());
        assert!(matches!(
            load_with_depth(&snapshot, 1),
            Err(SnapshotError::StackTooDeep { depth: 2, limit: 1 })
        ));
        let state = load_with_depth(&snapshot, 2).unwrap();
        assert_eq!(state.stack.max_depth(), 2);
    }

    #[test]
    fn test_checkpoint_file() {
        let path = std::env::temp_dir().join(format!(
            "synacor-vm-snapshot-{}.json",
            std::process::id()
        ));
        let state = busy_state();
        write_checkpoint(&state, &path).unwrap();
        let restored = read_checkpoint(&path, config::MAX_CALL_STACK_DEPTH).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(restored, state);
    }
}

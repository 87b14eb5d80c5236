// Instruction trace: one line per executed instruction

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::instruction::Instruction;
use super::state::MachineState;

/// Append-only text sink for trace records
pub struct TraceSink {
    out: Box<dyn Write>,
    records: u64,
}

impl TraceSink {
    pub fn new(out: Box<dyn Write>) -> Self {
        TraceSink { out, records: 0 }
    }

    /// Appends to `path`, creating it only when the first record is written
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        TraceSink::new(Box::new(LazyFile {
            path: path.into(),
            file: None,
        }))
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Writes `ip: name operands [raw] | registers | stack`, read after the instruction ran
    pub fn record(
        &mut self,
        address: u16,
        instr: &Instruction,
        state: &MachineState,
    ) -> io::Result<()> {
        let operands = instr.operands();
        let text: Vec<String> = std::iter::once(instr.name().to_string())
            .chain(operands.iter().map(|op| op.to_string()))
            .collect();
        let raw: Vec<String> = std::iter::once(instr.opcode())
            .chain(operands.iter().map(|op| op.raw()))
            .map(|w| w.to_string())
            .collect();

        writeln!(
            self.out,
            "{:5}: {} [{}] | regs {:?} | stack {:?}",
            address,
            text.join(" "),
            raw.join(" "),
            state.registers.view(),
            state.stack.view()
        )?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

struct LazyFile {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl Write for LazyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(BufWriter::new(file));
        }
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::operand::Operand;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Writer that keeps its bytes reachable after being boxed
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_record_format() {
        let buf = SharedBuf::default();
        let mut sink = TraceSink::new(Box::new(buf.clone()));
        let mut state = MachineState::default();
        state.registers.set(0, 4).unwrap();
        state.push(9).unwrap();

        let instr = Instruction::Add(
            Operand::Register(0),
            Operand::Register(1),
            Operand::Literal(4),
        );
        sink.record(0, &instr, &state).unwrap();

        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(
            text,
            "    0: add reg0 reg1 4 [9 32768 32769 4] | regs [4, 0, 0, 0, 0, 0, 0, 0] | stack [9]\n"
        );
        assert_eq!(sink.records(), 1);
    }

    #[test]
    fn test_file_sink_created_on_first_record() {
        let path = std::env::temp_dir().join(format!(
            "synacor-vm-trace-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut sink = TraceSink::to_file(&path);
        sink.flush().unwrap();
        assert!(!path.exists());

        sink.record(7, &Instruction::Noop, &MachineState::default())
            .unwrap();
        sink.flush().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.starts_with("    7: noop [21]"));
    }
}

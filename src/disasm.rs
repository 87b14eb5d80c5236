//! Text rendering of memory as instructions, built on the opcode table.

use crate::vm::instruction::{opcode_name, operand_count};
use crate::vm::operand::Operand;

/// Renders one line per instruction in `start..end`
pub fn disassemble(memory: &[u16], start: usize, end: usize) -> Vec<String> {
    let end = end.min(memory.len());
    let mut lines = Vec::new();
    let mut offset = start;

    while offset < end {
        let word = memory[offset];
        let decoded = opcode_name(word)
            .zip(operand_count(word))
            .filter(|(_, count)| offset + count < memory.len());

        match decoded {
            Some((name, count)) => {
                let raw = &memory[offset..=offset + count];
                let mut text = vec![name.to_string()];
                text.extend(raw[1..].iter().map(|&w| match Operand::decode(w) {
                    Ok(op) => op.to_string(),
                    Err(_) => format!("?{}", w),
                }));
                let raw: Vec<String> = raw.iter().map(|w| w.to_string()).collect();
                lines.push(format!(
                    "offset: {} - {} [{}]",
                    offset,
                    text.join(" "),
                    raw.join(" ")
                ));
                offset += 1 + count;
            }
            None => {
                lines.push(format!("offset: {} - data {}", offset, word));
                offset += 1;
            }
        }
    }
    lines
}

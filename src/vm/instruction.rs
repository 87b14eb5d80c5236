use crate::vm::error::VMFault;
use crate::vm::memory::Memory;
use crate::vm::operand::Operand;

/// Opcode table: mnemonic and operand count, indexed by opcode
pub const OPCODE_TABLE: [(&str, usize); 22] = [
    ("halt", 0),
    ("set", 2),
    ("push", 1),
    ("pop", 1),
    ("eq", 3),
    ("gt", 3),
    ("jmp", 1),
    ("jt", 2),
    ("jf", 2),
    ("add", 3),
    ("mult", 3),
    ("mod", 3),
    ("and", 3),
    ("or", 3),
    ("not", 2),
    ("rmem", 2),
    ("wmem", 2),
    ("call", 1),
    ("ret", 0),
    ("out", 1),
    ("in", 1),
    ("noop", 0),
];

/// Mnemonic for an opcode word, if it is one
pub fn opcode_name(opcode: u16) -> Option<&'static str> {
    OPCODE_TABLE.get(opcode as usize).map(|(name, _)| *name)
}

/// Number of operand words following an opcode word, if it is one
pub fn operand_count(opcode: u16) -> Option<usize> {
    OPCODE_TABLE.get(opcode as usize).map(|(_, count)| *count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Halt,
    Set(Operand, Operand),
    Push(Operand),
    Pop(Operand),
    Eq(Operand, Operand, Operand),
    Gt(Operand, Operand, Operand),
    Jmp(Operand),
    Jt(Operand, Operand),
    Jf(Operand, Operand),
    Add(Operand, Operand, Operand),
    Mult(Operand, Operand, Operand),
    Mod(Operand, Operand, Operand),
    And(Operand, Operand, Operand),
    Or(Operand, Operand, Operand),
    Not(Operand, Operand),
    Rmem(Operand, Operand),
    Wmem(Operand, Operand),
    Call(Operand),
    Ret,
    Out(Operand),
    In(Operand),
    Noop,
}

impl Instruction {
    /// Fetches and decodes the instruction stored at `address`
    pub fn fetch(memory: &Memory, address: u16) -> Result<Instruction, VMFault> {
        let base = address as usize;
        let opcode = memory.read(base)?;
        let count = operand_count(opcode).ok_or(VMFault::InvalidOpcode { address, opcode })?;

        let mut ops = [Operand::Literal(0); 3];
        for (i, slot) in ops.iter_mut().take(count).enumerate() {
            *slot = Operand::decode(memory.read(base + 1 + i)?)?;
        }
        let [a, b, c] = ops;

        use Instruction::*;
        let instr = match opcode {
            0 => Halt,
            1 => Set(a, b),
            2 => Push(a),
            3 => Pop(a),
            4 => Eq(a, b, c),
            5 => Gt(a, b, c),
            6 => Jmp(a),
            7 => Jt(a, b),
            8 => Jf(a, b),
            9 => Add(a, b, c),
            10 => Mult(a, b, c),
            11 => Mod(a, b, c),
            12 => And(a, b, c),
            13 => Or(a, b, c),
            14 => Not(a, b),
            15 => Rmem(a, b),
            16 => Wmem(a, b),
            17 => Call(a),
            18 => Ret,
            19 => Out(a),
            20 => In(a),
            21 => Noop,
            _ => return Err(VMFault::InvalidOpcode { address, opcode }),
        };
        Ok(instr)
    }

    pub fn opcode(&self) -> u16 {
        use Instruction::*;
        match self {
            Halt => 0,
            Set(..) => 1,
            Push(_) => 2,
            Pop(_) => 3,
            Eq(..) => 4,
            Gt(..) => 5,
            Jmp(_) => 6,
            Jt(..) => 7,
            Jf(..) => 8,
            Add(..) => 9,
            Mult(..) => 10,
            Mod(..) => 11,
            And(..) => 12,
            Or(..) => 13,
            Not(..) => 14,
            Rmem(..) => 15,
            Wmem(..) => 16,
            Call(_) => 17,
            Ret => 18,
            Out(_) => 19,
            In(_) => 20,
            Noop => 21,
        }
    }

    pub fn name(&self) -> &'static str {
        OPCODE_TABLE[self.opcode() as usize].0
    }

    /// Operands in encoding order
    pub fn operands(&self) -> Vec<Operand> {
        use Instruction::*;
        match *self {
            Halt | Ret | Noop => vec![],
            Push(a) | Pop(a) | Jmp(a) | Call(a) | Out(a) | In(a) => vec![a],
            Set(a, b) | Jt(a, b) | Jf(a, b) | Not(a, b) | Rmem(a, b) | Wmem(a, b) => vec![a, b],
            Eq(a, b, c)
            | Gt(a, b, c)
            | Add(a, b, c)
            | Mult(a, b, c)
            | Mod(a, b, c)
            | And(a, b, c)
            | Or(a, b, c) => vec![a, b, c],
        }
    }

    /// Encoded length in words, opcode included
    pub fn encoded_len(&self) -> u16 {
        1 + OPCODE_TABLE[self.opcode() as usize].1 as u16
    }
}

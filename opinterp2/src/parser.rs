use log::debug;
use util::{BfError, BfResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OpCode {
    IncPtr,
    DecPtr,
    IncData,
    DecData,
    Read,
    Write,
    JumpIfZero,
    JumpIfNotZero,
}

#[derive(Debug, Eq, PartialEq)]
pub enum Instruction {
    IncPtr { count: usize },
    DecPtr { count: usize },
    IncData { count: usize },
    DecData { count: usize },
    Read { count: usize },
    Write { count: usize },
    /// `destination` is the index of the matching `JumpIfNotZero`.
    JumpIfZero { destination: usize },
    /// `destination` is the index of the matching `JumpIfZero`.
    JumpIfNotZero { destination: usize },
}

impl Instruction {
    fn set_destination(&mut self, value: usize) {
        if let Instruction::JumpIfZero { destination } | Instruction::JumpIfNotZero { destination } =
            self
        {
            *destination = value;
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

pub fn parse(source_code: &str) -> BfResult<Program> {
    let opcodes = translate_to_opcodes(source_code);

    let mut instructions = vec![];
    let mut open_brackets = vec![];
    let mut pc = 0;

    while let Some(&opcode) = opcodes.get(pc) {
        match opcode {
            OpCode::JumpIfZero => {
                open_brackets.push((pc, instructions.len()));
                instructions.push(Instruction::JumpIfZero { destination: 0 });
                pc += 1;
            }
            OpCode::JumpIfNotZero => {
                let (_, open) = open_brackets
                    .pop()
                    .ok_or_else(|| BfError::Bf(format!("unmatched ']' at pc={pc}")))?;
                let close = instructions.len();
                instructions[open].set_destination(close);
                instructions.push(Instruction::JumpIfNotZero { destination: open });
                pc += 1;
            }
            opcode => {
                let count = opcodes[pc..]
                    .iter()
                    .take_while(|&&next| next == opcode)
                    .count();
                pc += count;

                instructions.push(match opcode {
                    OpCode::IncPtr => Instruction::IncPtr { count },
                    OpCode::DecPtr => Instruction::DecPtr { count },
                    OpCode::IncData => Instruction::IncData { count },
                    OpCode::DecData => Instruction::DecData { count },
                    OpCode::Read => Instruction::Read { count },
                    OpCode::Write => Instruction::Write { count },
                    OpCode::JumpIfZero | OpCode::JumpIfNotZero => {
                        unreachable!("brackets are never counted")
                    }
                });
            }
        }
    }

    if let Some((pc, _)) = open_brackets.first() {
        return Err(BfError::Bf(format!("unmatched '[' at pc={pc}")));
    }

    debug!(
        "folded {} opcodes into {} instructions",
        opcodes.len(),
        instructions.len()
    );

    Ok(Program { instructions })
}

fn translate_to_opcodes(source_code: &str) -> Vec<OpCode> {
    source_code
        .chars()
        .filter_map(|c| match c {
            '>' => Some(OpCode::IncPtr),
            '<' => Some(OpCode::DecPtr),
            '+' => Some(OpCode::IncData),
            '-' => Some(OpCode::DecData),
            ',' => Some(OpCode::Read),
            '.' => Some(OpCode::Write),
            '[' => Some(OpCode::JumpIfZero),
            ']' => Some(OpCode::JumpIfNotZero),
            _ => None,
        })
        .collect()
}

use log::debug;
use util::{BfError, BfResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Instruction {
    IncPtr,
    DecPtr,
    IncData,
    DecData,
    Read,
    Write,
    JumpIfZero,
    JumpIfNotZero,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// For a bracket at `i`, the index of its partner. Zero everywhere else.
    pub jump_table: Vec<usize>,
}

pub fn parse(source_code: &str) -> BfResult<Program> {
    let instructions: Vec<_> = source_code
        .chars()
        .filter_map(|c| match c {
            '>' => Some(Instruction::IncPtr),
            '<' => Some(Instruction::DecPtr),
            '+' => Some(Instruction::IncData),
            '-' => Some(Instruction::DecData),
            ',' => Some(Instruction::Read),
            '.' => Some(Instruction::Write),
            '[' => Some(Instruction::JumpIfZero),
            ']' => Some(Instruction::JumpIfNotZero),
            _ => None,
        })
        .collect();

    let jump_table = compute_jump_table(&instructions)?;
    debug!("parsed {} instructions", instructions.len());

    Ok(Program {
        instructions,
        jump_table,
    })
}

fn compute_jump_table(instructions: &[Instruction]) -> BfResult<Vec<usize>> {
    let mut jump_table = vec![0; instructions.len()];
    let mut open_brackets = vec![];

    for (pc, instruction) in instructions.iter().enumerate() {
        match instruction {
            Instruction::JumpIfZero => open_brackets.push(pc),
            Instruction::JumpIfNotZero => {
                let open = open_brackets
                    .pop()
                    .ok_or_else(|| BfError::Bf(format!("unmatched ']' at pc={pc}")))?;
                jump_table[open] = pc;
                jump_table[pc] = open;
            }
            _ => {}
        }
    }

    match open_brackets.first() {
        Some(pc) => Err(BfError::Bf(format!("unmatched '[' at pc={pc}"))),
        None => Ok(jump_table),
    }
}

#[test]
fn test_parse() {
    let program = parse(">a<+bcde-._,[]_1234567890か").unwrap();
    assert_eq!(
        program.instructions,
        vec![
            Instruction::IncPtr,
            Instruction::DecPtr,
            Instruction::IncData,
            Instruction::DecData,
            Instruction::Write,
            Instruction::Read,
            Instruction::JumpIfZero,
            Instruction::JumpIfNotZero,
        ]
    );
    assert_eq!(program.jump_table, vec![0, 0, 0, 0, 0, 0, 7, 6]);
}

#[test]
fn test_parse_nested_jumps() {
    let program = parse("[[-]>[-]]").unwrap();
    assert_eq!(program.jump_table, vec![8, 3, 0, 1, 0, 7, 0, 5, 0]);
}

#[test]
fn test_parse_unmatched_brackets() {
    assert_eq!(
        parse("+[[]").unwrap_err(),
        BfError::Bf("unmatched '[' at pc=1".to_owned())
    );
    assert_eq!(
        parse("[]]").unwrap_err(),
        BfError::Bf("unmatched ']' at pc=2".to_owned())
    );
}

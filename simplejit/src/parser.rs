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
}

pub fn parse(source_code: &str) -> Program {
    let instructions = source_code
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

    Program { instructions }
}

#[test]
fn test_parse() {
    let program = parse(">a<+bcde-._,[]_1234567890か");
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
}

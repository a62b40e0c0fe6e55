use log::debug;
use util::ast::{parse_ast, AstNode, AstSeq};
use util::BfResult;

#[derive(Debug, Eq, PartialEq)]
pub enum Instruction {
    IncPtr { count: u32 },
    DecPtr { count: u32 },
    IncData { count: u32 },
    DecData { count: u32 },
    Read { count: u32 },
    Write { count: u32 },
    JumpBegin,
    JumpEnd,
    SetDataToZero,
    MovePtrUntilZero { count: u32, forward: bool, amount: u32 },
    MoveData { count: u32, forward: bool, amount: u32 },
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

pub fn parse(source_code: &str) -> BfResult<Program> {
    let instructions = lower(parse_ast(source_code)?)?;
    debug!("lowered AST into {} instructions", instructions.len());

    Ok(Program { instructions })
}

fn lower(seq: AstSeq) -> BfResult<Vec<Instruction>> {
    let mut instructions = vec![];
    let mut stack = vec![seq.into_children().into_iter().peekable()];

    while let Some(nodes) = stack.last_mut() {
        let Some(node) = nodes.next() else {
            stack.pop();
            // The root sequence has no closing bracket.
            if !stack.is_empty() {
                instructions.push(Instruction::JumpEnd);
            }
            continue;
        };

        if let AstNode::Loop { seq } = node {
            instructions.push(Instruction::JumpBegin);
            stack.push(seq.into_children().into_iter().peekable());
            continue;
        }

        let mut count = 1usize;
        while nodes.next_if_eq(&node).is_some() {
            count += 1;
        }
        let count = u32::try_from(count)?;

        let instruction = match node {
            AstNode::IncPtr => Instruction::IncPtr { count },
            AstNode::DecPtr => Instruction::DecPtr { count },
            AstNode::IncData => Instruction::IncData { count },
            AstNode::DecData => Instruction::DecData { count },
            AstNode::Read => Instruction::Read { count },
            AstNode::Write => Instruction::Write { count },
            AstNode::SetDataToZero => Instruction::SetDataToZero,
            AstNode::MovePtrUntilZero { forward, amount } => Instruction::MovePtrUntilZero {
                count,
                forward,
                amount,
            },
            AstNode::MoveData { forward, amount } => Instruction::MoveData {
                count,
                forward,
                amount,
            },
            AstNode::Loop { .. } => unreachable!(),
        };
        instructions.push(instruction);
    }

    Ok(instructions)
}

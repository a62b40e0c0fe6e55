//! Lowers the optimized AST into a flat instruction list for the VM.

use std::iter::Peekable;
use std::vec::IntoIter;

use log::debug;
use util::ast::{parse_ast, AstNode, AstSeq};
use util::BfResult;

#[derive(Debug, Eq, PartialEq)]
pub enum Instruction {
    IncPtr {
        count: usize,
    },
    DecPtr {
        count: usize,
    },
    IncData {
        count: usize,
    },
    DecData {
        count: usize,
    },
    Read {
        count: usize,
    },
    Write {
        count: usize,
    },
    /// `destination` is the index of the matching `JumpEnd`.
    JumpBegin {
        destination: usize,
    },
    /// `destination` is the index of the matching `JumpBegin`.
    JumpEnd {
        destination: usize,
    },
    SetDataToZero,
    MovePtrUntilZero {
        count: usize,
        forward: bool,
        amount: usize,
    },
    MoveData {
        count: usize,
        forward: bool,
        amount: usize,
    },
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

pub fn parse(source_code: &str) -> BfResult<Program> {
    let instructions = lower(parse_ast(source_code)?);
    debug!("lowered AST into {} instructions", instructions.len());

    Ok(Program { instructions })
}

fn lower(seq: AstSeq) -> Vec<Instruction> {
    let mut instructions = vec![];
    // Nodes left to lower in each open loop, and where its JumpBegin sits.
    let mut stack = vec![(seq.into_children().into_iter().peekable(), None)];

    while let Some((nodes, begin)) = stack.last_mut() {
        match nodes.next() {
            Some(AstNode::Loop { seq }) => {
                let begin = instructions.len();
                instructions.push(Instruction::JumpBegin { destination: 0 });
                stack.push((seq.into_children().into_iter().peekable(), Some(begin)));
            }
            Some(node) => {
                let count = 1 + count_repeats(nodes, &node);
                instructions.push(lower_node(node, count));
            }
            None => {
                if let Some(begin) = *begin {
                    let end = instructions.len();
                    instructions.push(Instruction::JumpEnd { destination: begin });
                    instructions[begin] = Instruction::JumpBegin { destination: end };
                }
                stack.pop();
            }
        }
    }

    instructions
}

/// Consumes the nodes equal to `node` that directly follow it.
fn count_repeats(nodes: &mut Peekable<IntoIter<AstNode>>, node: &AstNode) -> usize {
    let mut count = 0;
    while nodes.next_if(|next| next == node).is_some() {
        count += 1;
    }
    count
}

fn lower_node(node: AstNode, count: usize) -> Instruction {
    match node {
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
            amount: amount as usize,
        },
        AstNode::MoveData { forward, amount } => Instruction::MoveData {
            count,
            forward,
            amount: amount as usize,
        },
        AstNode::Loop { .. } => unreachable!("loops are lowered by lower"),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, Instruction, Program};
    use util::BfError;

    #[test]
    fn test_parse_keeps_only_commands() {
        let program = parse(">a<+bcde-,_.[]._1[.]234567890か").unwrap();
        assert_eq!(
            program,
            Program {
                instructions: vec![
                    Instruction::IncPtr { count: 1 },
                    Instruction::DecPtr { count: 1 },
                    Instruction::IncData { count: 1 },
                    Instruction::DecData { count: 1 },
                    Instruction::Read { count: 1 },
                    Instruction::Write { count: 1 },
                    Instruction::JumpBegin { destination: 7 },
                    Instruction::JumpEnd { destination: 6 },
                    Instruction::Write { count: 1 },
                    Instruction::JumpBegin { destination: 11 },
                    Instruction::Write { count: 1 },
                    Instruction::JumpEnd { destination: 9 },
                ],
            }
        );
    }

    #[test]
    fn test_parse_folds_runs() {
        let program = parse(">>[>>><<+---,,],..").unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instruction::IncPtr { count: 2 },
                Instruction::JumpBegin { destination: 7 },
                Instruction::IncPtr { count: 3 },
                Instruction::DecPtr { count: 2 },
                Instruction::IncData { count: 1 },
                Instruction::DecData { count: 3 },
                Instruction::Read { count: 2 },
                Instruction::JumpEnd { destination: 1 },
                Instruction::Read { count: 1 },
                Instruction::Write { count: 2 },
            ]
        );
    }

    #[test]
    fn test_parse_nested_loops() {
        let program = parse(".[..[.....]...]..").unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instruction::Write { count: 1 },
                Instruction::JumpBegin { destination: 7 },
                Instruction::Write { count: 2 },
                Instruction::JumpBegin { destination: 5 },
                Instruction::Write { count: 5 },
                Instruction::JumpEnd { destination: 3 },
                Instruction::Write { count: 3 },
                Instruction::JumpEnd { destination: 1 },
                Instruction::Write { count: 2 },
            ]
        );
    }

    #[test]
    fn test_parse_loop_idioms() {
        assert_eq!(
            parse("[>][>]").unwrap().instructions,
            vec![Instruction::MovePtrUntilZero {
                count: 2,
                forward: true,
                amount: 1,
            }]
        );
        assert_eq!(
            parse("[+][-]").unwrap().instructions,
            vec![Instruction::SetDataToZero]
        );
        assert_eq!(
            parse("[-<<+>>]").unwrap().instructions,
            vec![Instruction::MoveData {
                count: 1,
                forward: false,
                amount: 2,
            }]
        );
    }

    #[test]
    fn test_adjacent_loops_are_not_folded() {
        let program = parse("[.][.]").unwrap();
        assert_eq!(program.instructions.len(), 6);
    }

    #[test]
    fn test_parse_reports_unmatched_brackets() {
        assert_eq!(
            parse("+[").unwrap_err(),
            BfError::Bf("Unmatched '[' at index 1.".to_owned())
        );
        assert_eq!(
            parse("+]").unwrap_err(),
            BfError::Bf("Unmatched ']' at index 1.".to_owned())
        );
    }

    #[test]
    fn test_parse_deep_nesting() {
        let depth = 100_000;
        let source_code = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let program = parse(&source_code).unwrap();

        assert_eq!(program.instructions.len(), 2 * depth);
        assert_eq!(
            program.instructions[0],
            Instruction::JumpBegin {
                destination: 2 * depth - 1
            }
        );
        assert_eq!(
            program.instructions[depth],
            Instruction::JumpEnd {
                destination: depth - 1
            }
        );
    }
}

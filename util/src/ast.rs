//! Tree form of a brainfuck program, used by the VMs that optimize loops.
//!
//! Loops become [`AstNode::Loop`] nodes, so bracket matching is settled once
//! here and the later stages only have to recognise loop idioms.

use std::mem;

use log::debug;

use crate::error::{BfError, BfResult};

#[derive(Debug, Eq, PartialEq)]
pub enum AstNode {
    IncPtr,
    DecPtr,
    IncData,
    DecData,
    Read,
    Write,
    Loop { seq: AstSeq },
    /// `[-]` or `[+]`, and any loop whose body only changes the current cell
    /// in one direction.
    SetDataToZero,
    /// `[>]`, `[<<]`, ...: scan for a zero cell `amount` cells at a time.
    MovePtrUntilZero { forward: bool, amount: u32 },
    /// `[->+<]` and friends: add the current cell to the cell `amount` away
    /// and clear it.
    MoveData { forward: bool, amount: u32 },
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct AstSeq {
    pub children: Vec<AstNode>,
}

impl AstSeq {
    pub fn into_children(mut self) -> Vec<AstNode> {
        mem::take(&mut self.children)
    }
}

// Nested loops are flattened onto a work list so dropping a deep tree does
// not recurse once per level.
impl Drop for AstSeq {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let AstNode::Loop { mut seq } = node {
                pending.append(&mut seq.children);
            }
        }
    }
}

pub fn parse_ast(source_code: &str) -> BfResult<AstSeq> {
    let seq = optimize_loops(create_ast(source_code)?);
    debug!("built AST with {} top level nodes", seq.children.len());

    Ok(seq)
}

/// Builds the tree with an explicit stack of open loops, so nesting depth is
/// only limited by memory.
pub fn create_ast(source_code: &str) -> BfResult<AstSeq> {
    // Index of each open '[' and the children of the sequence around it.
    let mut open_loops: Vec<(usize, Vec<AstNode>)> = vec![];
    let mut children = vec![];

    for (i, c) in source_code.char_indices() {
        let node = match c {
            '>' => AstNode::IncPtr,
            '<' => AstNode::DecPtr,
            '+' => AstNode::IncData,
            '-' => AstNode::DecData,
            ',' => AstNode::Read,
            '.' => AstNode::Write,
            '[' => {
                open_loops.push((i, mem::take(&mut children)));
                continue;
            }
            ']' => {
                let (_, parent) = open_loops
                    .pop()
                    .ok_or_else(|| BfError::Bf(format!("Unmatched ']' at index {i}.")))?;
                AstNode::Loop {
                    seq: AstSeq {
                        children: mem::replace(&mut children, parent),
                    },
                }
            }
            _ => continue,
        };
        children.push(node);
    }

    match open_loops.last() {
        Some((i, _)) => Err(BfError::Bf(format!("Unmatched '[' at index {i}."))),
        None => Ok(AstSeq { children }),
    }
}

/// Rewrites loop idioms bottom up. Inner loops are finished before the loop
/// that contains them is matched against the idioms.
pub fn optimize_loops(seq: AstSeq) -> AstSeq {
    let mut stack = vec![(seq.into_children().into_iter(), vec![])];

    while let Some((nodes, optimized)) = stack.last_mut() {
        match nodes.next() {
            Some(AstNode::Loop { seq }) => {
                stack.push((seq.into_children().into_iter(), vec![]));
            }
            Some(node) => optimized.push(node),
            None => {
                let children = mem::take(optimized);
                stack.pop();

                match stack.last_mut() {
                    Some((_, parent)) => parent.push(optimize_loop(children)),
                    None => return AstSeq { children },
                }
            }
        }
    }

    AstSeq::default()
}

fn optimize_loop(children: Vec<AstNode>) -> AstNode {
    if let Some((forward, amount)) = move_ptr_until_zero_pattern(&children) {
        AstNode::MovePtrUntilZero { forward, amount }
    } else if set_data_to_zero_pattern(&children) {
        AstNode::SetDataToZero
    } else if let Some((forward, amount)) = move_data_pattern(&children) {
        AstNode::MoveData { forward, amount }
    } else {
        AstNode::Loop {
            seq: AstSeq { children },
        }
    }
}

fn move_ptr_until_zero_pattern(nodes: &[AstNode]) -> Option<(bool, u32)> {
    let forward = match nodes.first()? {
        AstNode::IncPtr => true,
        AstNode::DecPtr => false,
        _ => return None,
    };

    if nodes.iter().all(|node| node == &nodes[0]) {
        Some((forward, nodes.len().try_into().ok()?))
    } else {
        None
    }
}

fn set_data_to_zero_pattern(nodes: &[AstNode]) -> bool {
    match nodes.first() {
        Some(first @ (AstNode::IncData | AstNode::DecData)) => {
            nodes.iter().all(|node| node == first)
        }
        _ => false,
    }
}

fn move_data_pattern(nodes: &[AstNode]) -> Option<(bool, u32)> {
    // The decrement may come before or after the transfer.
    let body = match nodes {
        [AstNode::DecData, body @ ..] => body,
        [body @ .., AstNode::DecData] => body,
        _ => return None,
    };

    let forward = match body.first()? {
        AstNode::IncPtr => true,
        AstNode::DecPtr => false,
        _ => return None,
    };
    let there = |node: &AstNode| {
        matches!(
            (forward, node),
            (true, AstNode::IncPtr) | (false, AstNode::DecPtr)
        )
    };
    let back = |node: &AstNode| {
        matches!(
            (forward, node),
            (true, AstNode::DecPtr) | (false, AstNode::IncPtr)
        )
    };

    let amount = body.iter().take_while(|&node| there(node)).count();
    let [AstNode::IncData, rest @ ..] = &body[amount..] else {
        return None;
    };

    if rest.len() == amount && rest.iter().all(|node| back(node)) {
        Some((forward, amount.try_into().ok()?))
    } else {
        None
    }
}

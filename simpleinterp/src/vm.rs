use std::io::{Read, Write};

use util::{BfError, BfResult, Memory};

use crate::parser::{Instruction, Program};

pub fn run(program: &Program, stdin: &mut dyn Read, stdout: &mut dyn Write) -> BfResult<()> {
    run_with_memory(program, &mut Memory::new(), stdin, stdout)
}

fn run_with_memory(
    program: &Program,
    memory: &mut Memory,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> BfResult<()> {
    let instructions = &program.instructions;
    let mut pc = 0;

    while let Some(instruction) = instructions.get(pc) {
        match instruction {
            Instruction::IncPtr => memory.move_pointer(true, 1, pc)?,
            Instruction::DecPtr => memory.move_pointer(false, 1, pc)?,
            Instruction::IncData => memory.add(1),
            Instruction::DecData => memory.sub(1),
            Instruction::Read => {
                let mut c = [0; 1];
                stdin.read_exact(&mut c)?;
                memory.set(c[0]);
            }
            Instruction::Write => {
                stdout.write_all(&[memory.get()])?;
                stdout.flush()?;
            }
            Instruction::JumpIfZero => {
                if memory.get() == 0 {
                    pc = find_closing_bracket(instructions, pc)?;
                }
            }
            Instruction::JumpIfNotZero => {
                if memory.get() != 0 {
                    pc = find_opening_bracket(instructions, pc)?;
                }
            }
        }

        pc += 1;
    }

    Ok(())
}

fn find_closing_bracket(instructions: &[Instruction], pc: usize) -> BfResult<usize> {
    let mut nesting = 0usize;
    for (i, instruction) in instructions.iter().enumerate().skip(pc) {
        match instruction {
            Instruction::JumpIfZero => nesting += 1,
            Instruction::JumpIfNotZero => {
                nesting -= 1;
                if nesting == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }

    Err(BfError::Bf(format!("unmatched '[' at pc={pc}")))
}

fn find_opening_bracket(instructions: &[Instruction], pc: usize) -> BfResult<usize> {
    let mut nesting = 0usize;
    for (i, instruction) in instructions[..=pc].iter().enumerate().rev() {
        match instruction {
            Instruction::JumpIfNotZero => nesting += 1,
            Instruction::JumpIfZero => {
                nesting -= 1;
                if nesting == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }

    Err(BfError::Bf(format!("unmatched ']' at pc={pc}")))
}

use std::io::{Read, Write};

use util::{BfResult, Memory};

use crate::parser::{Instruction, Program};

pub fn run(program: &Program, stdin: &mut dyn Read, stdout: &mut dyn Write) -> BfResult<()> {
    let mut memory = Memory::new();
    let mut pc = 0;

    while let Some(instruction) = program.instructions.get(pc) {
        match *instruction {
            Instruction::IncPtr { count } => memory.move_pointer(true, count, pc)?,
            Instruction::DecPtr { count } => memory.move_pointer(false, count, pc)?,
            Instruction::IncData { count } => memory.add(count),
            Instruction::DecData { count } => memory.sub(count),
            Instruction::Read { count } => {
                let mut c = [0; 1];
                for _ in 0..count {
                    stdin.read_exact(&mut c)?;
                }
                memory.set(c[0]);
            }
            Instruction::Write { count } => {
                let value = memory.get();
                for _ in 0..count {
                    stdout.write_all(&[value])?;
                }
                stdout.flush()?;
            }
            Instruction::JumpIfZero { destination } => {
                if memory.get() == 0 {
                    pc = destination;
                }
            }
            Instruction::JumpIfNotZero { destination } => {
                if memory.get() != 0 {
                    pc = destination;
                }
            }
        }

        pc += 1;
    }

    Ok(())
}

use std::io::{Read, Write};

use util::{BfResult, Memory};

use crate::parser::{Instruction, Program};

pub fn run(program: &Program, stdin: &mut dyn Read, stdout: &mut dyn Write) -> BfResult<()> {
    let mut memory = Memory::new();
    let mut pc = 0;

    while let Some(instruction) = program.instructions.get(pc) {
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
                    pc = program.jump_table[pc];
                }
            }
            Instruction::JumpIfNotZero => {
                if memory.get() != 0 {
                    pc = program.jump_table[pc];
                }
            }
        }

        pc += 1;
    }

    Ok(())
}

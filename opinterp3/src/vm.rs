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
                for _ in 0..count {
                    memory.set(read(stdin)?);
                }
            }
            Instruction::Write { count } => {
                for _ in 0..count {
                    write(stdout, memory.get())?;
                }
            }
            Instruction::JumpBegin { destination } => {
                if memory.get() == 0 {
                    pc = destination;
                }
            }
            Instruction::JumpEnd { destination } => {
                if memory.get() != 0 {
                    pc = destination;
                }
            }
            Instruction::SetDataToZero => memory.set(0),
            Instruction::MovePtrUntilZero {
                count,
                forward,
                amount,
            } => {
                for _ in 0..count {
                    while memory.get() != 0 {
                        memory.move_pointer(forward, amount, pc)?;
                    }
                }
            }
            Instruction::MoveData {
                count,
                forward,
                amount,
            } => {
                for _ in 0..count {
                    if memory.get() != 0 {
                        let target = memory.cell_at(forward, amount, pc)?;
                        memory.move_data_to(target);
                    }
                }
            }
        }

        pc += 1;
    }

    Ok(())
}

fn read(stdin: &mut dyn Read) -> BfResult<u8> {
    let mut c = [0; 1];
    stdin.read_exact(&mut c)?;

    Ok(c[0])
}

fn write(stdout: &mut dyn Write, byte: u8) -> BfResult<()> {
    stdout.write_all(&[byte])?;
    stdout.flush()?;

    Ok(())
}

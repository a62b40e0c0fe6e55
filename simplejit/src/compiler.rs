use log::debug;
use util::asm::{CompiledProgram, Emitter};
use util::BfResult;

use crate::parser::{Instruction, Program};

/// Emits one fixed machine-code sequence per instruction.
pub fn compile(program: &Program) -> BfResult<CompiledProgram> {
    let mut emitter = Emitter::new()?;

    for (i, instruction) in program.instructions.iter().enumerate() {
        match instruction {
            Instruction::IncPtr => emitter.move_ptr(true, 1)?,
            Instruction::DecPtr => emitter.move_ptr(false, 1)?,
            Instruction::IncData => emitter.add_data(1),
            Instruction::DecData => emitter.sub_data(1),
            Instruction::Read => emitter.read(),
            Instruction::Write => emitter.write(),
            Instruction::JumpIfZero => emitter.jump_begin(i),
            Instruction::JumpIfNotZero => emitter.jump_end(i)?,
        }
    }

    let compiled_program = emitter.finish()?;
    debug!(
        "compiled {} instructions into {} bytes",
        program.instructions.len(),
        compiled_program.code_size()
    );

    Ok(compiled_program)
}

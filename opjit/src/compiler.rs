use log::debug;
use util::asm::{CompiledProgram, Emitter};
use util::BfResult;

use crate::parser::{Instruction, Program};

pub fn compile(program: &Program) -> BfResult<CompiledProgram> {
    let mut emitter = Emitter::new()?;

    for (i, instruction) in program.instructions.iter().enumerate() {
        match *instruction {
            Instruction::IncPtr { count } => emitter.move_ptr(true, count)?,
            Instruction::DecPtr { count } => emitter.move_ptr(false, count)?,
            Instruction::IncData { count } => emitter.add_data(count),
            Instruction::DecData { count } => emitter.sub_data(count),
            Instruction::Read { count } => {
                for _ in 0..count {
                    emitter.read();
                }
            }
            Instruction::Write { count } => {
                for _ in 0..count {
                    emitter.write();
                }
            }
            Instruction::JumpBegin => emitter.jump_begin(i),
            Instruction::JumpEnd => emitter.jump_end(i)?,
            Instruction::SetDataToZero => emitter.set_data_to_zero(),
            // After the first scan the cell is zero, so repeats are no-ops.
            Instruction::MovePtrUntilZero {
                forward, amount, ..
            } => emitter.move_ptr_until_zero(forward, amount)?,
            Instruction::MoveData {
                forward, amount, ..
            } => emitter.move_data(forward, amount)?,
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

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::parser::{parse, Instruction, Program};
    use crate::run;
    use std::io;
    use util::asm::Runtime;
    use util::{BfError, MEMORY_SIZE};

    fn run_str(source_code: &str, input: &[u8]) -> Result<Vec<u8>, BfError> {
        let mut stdout = vec![];
        run(source_code, &mut &input[..], &mut stdout)?;
        Ok(stdout)
    }

    fn memory_after(source_code: &str) -> Vec<u8> {
        let compiled_program = compile(&parse(source_code).unwrap()).unwrap();
        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        runtime.run(&compiled_program).unwrap();
        runtime.memory()[..8].to_vec()
    }

    #[test]
    fn test_counted_ops() {
        assert_eq!(memory_after(">>+++<-----"), vec![0, 251, 3, 0, 0, 0, 0, 0]);
        assert_eq!(
            memory_after(&"+".repeat(513)),
            vec![1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_loop_idioms() {
        assert_eq!(memory_after("+++>>++++<<[->>+<<]"), vec![0, 0, 7, 0, 0, 0, 0, 0]);
        assert_eq!(memory_after(">+++++[<+>-]"), vec![5, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            memory_after("+>>+>>+<<<<[>>]+"),
            vec![1, 0, 1, 0, 1, 0, 1, 0]
        );
        assert_eq!(memory_after("+++++[-]>+[+]"), vec![0; 8]);
    }

    #[test]
    fn test_counted_io() {
        assert_eq!(run_str(",,,...", b"xyz").unwrap(), b"zzz");
    }

    #[test]
    fn test_hello_world() {
        let source_code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        assert_eq!(run_str(source_code, b"").unwrap(), b"Hello World!\n");
    }

    #[test]
    fn test_idioms_check_bounds() {
        let out_of_bounds = BfError::Bf("data pointer out of bounds".to_owned());
        assert_eq!(run_str("+[<]", b"").unwrap_err(), out_of_bounds);
        assert_eq!(run_str("+[-<+>]", b"").unwrap_err(), out_of_bounds);
        assert_eq!(run_str("[-<+>].", b"").unwrap(), vec![0]);
    }

    #[test]
    fn test_large_offsets_reach_the_end_of_the_tape() {
        let source_code = format!("{}+.", ">".repeat(MEMORY_SIZE - 1));
        assert_eq!(run_str(&source_code, b"").unwrap(), vec![1]);

        let source_code = format!("{}+", ">".repeat(MEMORY_SIZE));
        assert!(run_str(&source_code, b"").is_err());
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_offsets_beyond_i32_are_rejected() {
        let program = Program {
            instructions: vec![Instruction::IncPtr { count: u32::MAX }],
        };
        assert!(matches!(compile(&program), Err(BfError::TryFromInt(_))));
    }

    #[test]
    fn test_unmatched_brackets() {
        let program = Program {
            instructions: vec![Instruction::JumpEnd],
        };
        assert_eq!(
            compile(&program).err(),
            Some(BfError::Bf(
                "Unmatched closing ']' at position 0.".to_owned()
            ))
        );
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 100_000;
        let source_code = format!("{}{}.", "[".repeat(depth), "]".repeat(depth));
        assert_eq!(run_str(&source_code, b"").unwrap(), vec![0]);
    }
}

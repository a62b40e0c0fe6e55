use std::io::{Read, Write};

use util::asm::Runtime;
use util::BfResult;

pub mod compiler;
pub mod parser;

#[cfg(not(any(
    target_arch = "x86_64",
    all(
        target_arch = "aarch64",
        any(target_os = "linux", target_os = "macos")
    )
)))]
compile_error!("Only x86-64 and AArch64 (Linux, macOS) are supported.");

pub fn run(source_code: &str, stdin: &mut dyn Read, stdout: &mut dyn Write) -> BfResult<()> {
    let program = parser::parse(source_code)?;
    let compiled_program = compiler::compile(&program)?;

    Runtime::new(stdin, stdout).run(&compiled_program)
}

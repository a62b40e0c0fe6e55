#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub mod asm;
pub mod ast;
pub mod error;
pub mod math;
pub mod memory;
mod run;

pub use error::{BfError, BfResult};
pub use math::{unbalanced_wrapping_add, unbalanced_wrapping_sub};
pub use memory::{Memory, MEMORY_SIZE};
pub use run::{init_logger, run_main, Args, RunFunction};

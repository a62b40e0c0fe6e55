//! Machine code generation shared by the JIT compilers.
//!
//! Every compiled program is a single function
//!
//! ```text
//! extern "C" fn(io: *mut c_void, memory_start: *mut u8, memory_end: *const u8) -> u8
//! ```
//!
//! The data pointer lives in a callee-saved register for the whole run, next
//! to the tape bounds and the I/O context. Each pointer move is checked
//! against the bounds, and `,`/`.` call back into Rust through
//! [`read_callback`] and [`write_callback`]. The returned byte is one of the
//! `STATUS_*` constants; [`Runtime::run`] turns it back into a [`BfResult`].

use std::ffi::c_void;
use std::io::{self, Read, Write};
use std::mem;

use dynasmrt::{
    dynasm, AssemblyOffset, DynamicLabel, DynasmApi, DynasmLabelApi, ExecutableBuffer,
};
use log::debug;

use crate::error::{BfError, BfResult};
use crate::memory::MEMORY_SIZE;

#[cfg(target_arch = "aarch64")]
pub use dynasmrt::aarch64::Assembler;
#[cfg(target_arch = "x86_64")]
pub use dynasmrt::x64::Assembler;

pub const STATUS_OK: u8 = 0;
pub const STATUS_OUT_OF_BOUNDS: u8 = 1;
pub const STATUS_IO_ERROR: u8 = 2;

#[cfg(all(target_arch = "x86_64", not(target_os = "windows")))]
macro_rules! dasm {
    ($assembler:ident $($t:tt)*) => {
        dynasm!($assembler
            ; .arch x64
            ; .alias reg_io, r12
            ; .alias reg_data_ptr, r13
            ; .alias reg_mem_start, r14
            ; .alias reg_mem_end, r15
            ; .alias reg_arg1, rdi
            ; .alias reg_arg2, rsi
            ; .alias reg_arg3, rdx
            ; .alias reg_temp_low, r10b
            ; .alias reg_addr, r11
            $($t)*
        )
    }
}
// Four pushes plus the return address leave the stack 8 bytes off a 16 byte
// boundary.
#[cfg(all(target_arch = "x86_64", not(target_os = "windows")))]
const STACK_OFFSET: i32 = 0x8;

#[cfg(all(target_arch = "x86_64", target_os = "windows"))]
macro_rules! dasm {
    ($assembler:ident $($t:tt)*) => {
        dynasm!($assembler
            ; .arch x64
            ; .alias reg_io, r12
            ; .alias reg_data_ptr, r13
            ; .alias reg_mem_start, r14
            ; .alias reg_mem_end, r15
            ; .alias reg_arg1, rcx
            ; .alias reg_arg2, rdx
            ; .alias reg_arg3, r8
            ; .alias reg_temp_low, r10b
            ; .alias reg_addr, r11
            $($t)*
        )
    }
}
// 32 bytes of shadow space for the callbacks, plus 8 to realign after the
// four pushes.
#[cfg(all(target_arch = "x86_64", target_os = "windows"))]
const STACK_OFFSET: i32 = 0x28;

#[cfg(target_arch = "aarch64")]
macro_rules! dasm {
    ($assembler:ident $($t:tt)*) => {
        dynasm!($assembler
            ; .arch aarch64
            ; .alias reg_frame_ptr, x29
            ; .alias reg_link, x30
            ; .alias reg_data_ptr, x19
            ; .alias reg_mem_start, x20
            ; .alias reg_mem_end, x21
            ; .alias reg_io, x22
            ; .alias reg_arg1, x0
            ; .alias reg_arg2, x1
            ; .alias reg_arg3, x2
            ; .alias reg_arg2_low, w1
            ; .alias reg_return, w0
            ; .alias reg_temp, x9
            ; .alias reg_temp_low, w9
            ; .alias reg_temp2_low, w10
            ; .alias reg_addr, x11
            $($t)*
        )
    }
}
// x19-x22 plus the frame record, rounded up to keep sp 16 byte aligned.
#[cfg(target_arch = "aarch64")]
const FRAME_SIZE: u32 = 0x30;

#[cfg(target_arch = "aarch64")]
macro_rules! mov_u64 {
    ($assembler:ident, $destination:ident, $immediate:expr) => {
        let immediate: u64 = $immediate;
        let part1 = (immediate & 0xffff) as u32;
        let part2 = ((immediate >> 0x10) & 0xffff) as u32;
        let part3 = ((immediate >> 0x20) & 0xffff) as u32;
        let part4 = ((immediate >> 0x30) & 0xffff) as u32;

        dasm!($assembler
            ; movz $destination, part1
            ; movk $destination, part2, lsl 16
            ; movk $destination, part3, lsl 32
            ; movk $destination, part4, lsl 48
        )
    };
}

// add/sub only encode a 12 bit immediate, so larger values are split.
#[cfg(target_arch = "aarch64")]
macro_rules! add_sub_u32 {
    ($assembler:ident, $operation:ident, $destination:ident, $source:ident, $immediate:expr) => {
        const MAX_IMMEDIATE: u32 = 0xfff;
        let mut remaining: u32 = $immediate;
        let chunk = remaining.min(MAX_IMMEDIATE);
        dasm!($assembler
            ; $operation $destination, $source, chunk
        );
        remaining -= chunk;

        while remaining > 0 {
            let chunk = remaining.min(MAX_IMMEDIATE);
            dasm!($assembler
                ; $operation $destination, $destination, chunk
            );
            remaining -= chunk;
        }
    };
}

type EntryPoint = extern "C" fn(*mut c_void, *mut u8, *const u8) -> u8;

/// Labels of one `[` that is still waiting for its `]`.
pub struct LabelPair {
    begin_label: DynamicLabel,
    end_label: DynamicLabel,
    position: usize,
}

/// Emits the body of a compiled program one operation at a time.
pub struct Emitter {
    assembler: Assembler,
    start: AssemblyOffset,
    exit_label: DynamicLabel,
    out_of_bounds_label: DynamicLabel,
    open_bracket_stack: Vec<LabelPair>,
}

impl Emitter {
    pub fn new() -> BfResult<Emitter> {
        let mut assembler = Assembler::new()?;
        let start = assembler.offset();
        let exit_label = assembler.new_dynamic_label();
        let out_of_bounds_label = assembler.new_dynamic_label();

        let mut emitter = Emitter {
            assembler,
            start,
            exit_label,
            out_of_bounds_label,
            open_bracket_stack: vec![],
        };
        emitter.prologue();

        Ok(emitter)
    }

    fn prologue(&mut self) {
        let assembler = &mut self.assembler;

        // Back up non-volatile registers for the caller, then take the
        // arguments.
        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; push reg_io
            ; push reg_data_ptr
            ; push reg_mem_start
            ; push reg_mem_end
            ; sub rsp, STACK_OFFSET
            ; mov reg_io, reg_arg1
            ; mov reg_data_ptr, reg_arg2
            ; mov reg_mem_start, reg_arg2
            ; mov reg_mem_end, reg_arg3
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; sub sp, sp, FRAME_SIZE
            ; stp reg_frame_ptr, reg_link, [sp, 0x20]
            ; add reg_frame_ptr, sp, 0x20
            ; stp reg_data_ptr, reg_mem_start, [sp]
            ; stp reg_mem_end, reg_io, [sp, 0x10]
            ; mov reg_io, reg_arg1
            ; mov reg_data_ptr, reg_arg2
            ; mov reg_mem_start, reg_arg2
            ; mov reg_mem_end, reg_arg3
        );
    }

    fn epilogue(&mut self) {
        let assembler = &mut self.assembler;
        let exit_label = self.exit_label;
        let out_of_bounds_label = self.out_of_bounds_label;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; xor eax, eax
            ; =>exit_label
            ; add rsp, STACK_OFFSET
            ; pop reg_mem_end
            ; pop reg_mem_start
            ; pop reg_data_ptr
            ; pop reg_io
            ; ret
            ; =>out_of_bounds_label
            ; mov eax, DWORD STATUS_OUT_OF_BOUNDS as i32
            ; jmp =>exit_label
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; movz reg_return, 0
            ; =>exit_label
            ; ldp reg_mem_end, reg_io, [sp, 0x10]
            ; ldp reg_data_ptr, reg_mem_start, [sp]
            ; ldp reg_frame_ptr, reg_link, [sp, 0x20]
            ; add sp, sp, FRAME_SIZE
            ; ret
            ; =>out_of_bounds_label
            ; movz reg_return, STATUS_OUT_OF_BOUNDS as u32
            ; b =>exit_label
        );
    }

    /// Moves the data pointer and leaves through the out of bounds exit if it
    /// left the tape.
    pub fn move_ptr(&mut self, forward: bool, amount: u32) -> BfResult<()> {
        let assembler = &mut self.assembler;
        let out_of_bounds_label = self.out_of_bounds_label;

        #[cfg(target_arch = "x86_64")]
        {
            let amount = i32::try_from(amount)?;
            if forward {
                dasm!(assembler
                    ; add reg_data_ptr, DWORD amount
                    ; cmp reg_data_ptr, reg_mem_end
                    ; jae =>out_of_bounds_label
                );
            } else {
                dasm!(assembler
                    ; sub reg_data_ptr, DWORD amount
                    ; cmp reg_data_ptr, reg_mem_start
                    ; jb =>out_of_bounds_label
                );
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if forward {
                add_sub_u32!(assembler, add, reg_data_ptr, reg_data_ptr, amount);
                dasm!(assembler
                    ; cmp reg_data_ptr, reg_mem_end
                    ; b.hs =>out_of_bounds_label
                );
            } else {
                add_sub_u32!(assembler, sub, reg_data_ptr, reg_data_ptr, amount);
                dasm!(assembler
                    ; cmp reg_data_ptr, reg_mem_start
                    ; b.lo =>out_of_bounds_label
                );
            }
        }

        Ok(())
    }

    pub fn add_data(&mut self, count: u32) {
        let assembler = &mut self.assembler;
        // Whole multiples of 256 leave the cell unchanged.
        let wrapped_count = (count % 256) as u8;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            // Reinterpret as i8, using the same bytes as before.
            ; add BYTE [reg_data_ptr], BYTE wrapped_count as i8
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; ldrb reg_temp_low, [reg_data_ptr]
            ; add reg_temp_low, reg_temp_low, wrapped_count as u32
            ; strb reg_temp_low, [reg_data_ptr]
        );
    }

    pub fn sub_data(&mut self, count: u32) {
        let assembler = &mut self.assembler;
        let wrapped_count = (count % 256) as u8;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            // Reinterpret as i8, using the same bytes as before.
            ; sub BYTE [reg_data_ptr], BYTE wrapped_count as i8
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; ldrb reg_temp_low, [reg_data_ptr]
            ; sub reg_temp_low, reg_temp_low, wrapped_count as u32
            ; strb reg_temp_low, [reg_data_ptr]
        );
    }

    pub fn set_data_to_zero(&mut self) {
        let assembler = &mut self.assembler;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; mov BYTE [reg_data_ptr], 0
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; strb wzr, [reg_data_ptr]
        );
    }

    pub fn read(&mut self) {
        let assembler = &mut self.assembler;
        let exit_label = self.exit_label;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; mov reg_arg1, reg_io
            ; mov reg_arg2, reg_data_ptr
            // Reinterpret as i64, using the same bytes as before.
            ; mov rax, QWORD read_callback as *const () as i64
            ; call rax
            ; test al, al
            ; jnz =>exit_label
        );
        #[cfg(target_arch = "aarch64")]
        {
            dasm!(assembler
                ; mov reg_arg1, reg_io
                ; mov reg_arg2, reg_data_ptr
            );
            mov_u64!(assembler, reg_temp, read_callback as *const () as u64);
            dasm!(assembler
                ; blr reg_temp
                ; tst reg_return, 0xff
                ; b.ne =>exit_label
            );
        }
    }

    pub fn write(&mut self) {
        let assembler = &mut self.assembler;
        let exit_label = self.exit_label;

        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; mov reg_arg1, reg_io
            ; movzx reg_arg2, BYTE [reg_data_ptr]
            // Reinterpret as i64, using the same bytes as before.
            ; mov rax, QWORD write_callback as *const () as i64
            ; call rax
            ; test al, al
            ; jnz =>exit_label
        );
        #[cfg(target_arch = "aarch64")]
        {
            dasm!(assembler
                ; mov reg_arg1, reg_io
                ; ldrb reg_arg2_low, [reg_data_ptr]
            );
            mov_u64!(assembler, reg_temp, write_callback as *const () as u64);
            dasm!(assembler
                ; blr reg_temp
                ; tst reg_return, 0xff
                ; b.ne =>exit_label
            );
        }
    }

    /// `[` at instruction `position`.
    pub fn jump_begin(&mut self, position: usize) {
        let begin_label = self.assembler.new_dynamic_label();
        let end_label = self.assembler.new_dynamic_label();
        self.open_bracket_stack.push(LabelPair {
            begin_label,
            end_label,
            position,
        });

        let assembler = &mut self.assembler;
        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; cmp BYTE [reg_data_ptr], 0
            ; jz =>end_label
            ; =>begin_label
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; ldrb reg_temp_low, [reg_data_ptr]
            ; cmp reg_temp_low, 0
            ; b.eq =>end_label
            ; =>begin_label
        );
    }

    /// `]` at instruction `position`.
    pub fn jump_end(&mut self, position: usize) -> BfResult<()> {
        let LabelPair {
            begin_label,
            end_label,
            ..
        } = self.open_bracket_stack.pop().ok_or_else(|| {
            BfError::Bf(format!("Unmatched closing ']' at position {position}."))
        })?;

        let assembler = &mut self.assembler;
        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; cmp BYTE [reg_data_ptr], 0
            ; jnz =>begin_label
            ; =>end_label
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; ldrb reg_temp_low, [reg_data_ptr]
            ; cmp reg_temp_low, 0
            ; b.ne =>begin_label
            ; =>end_label
        );

        Ok(())
    }

    /// `[>]`-style scan: step by `amount` until the current cell is zero.
    pub fn move_ptr_until_zero(&mut self, forward: bool, amount: u32) -> BfResult<()> {
        let begin_loop = self.assembler.new_dynamic_label();
        let end_loop = self.assembler.new_dynamic_label();

        let assembler = &mut self.assembler;
        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; =>begin_loop
            ; cmp BYTE [reg_data_ptr], 0
            ; jz =>end_loop
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; =>begin_loop
            ; ldrb reg_temp_low, [reg_data_ptr]
            ; cmp reg_temp_low, 0
            ; b.eq =>end_loop
        );

        self.move_ptr(forward, amount)?;

        let assembler = &mut self.assembler;
        #[cfg(target_arch = "x86_64")]
        dasm!(assembler
            ; jmp =>begin_loop
            ; =>end_loop
        );
        #[cfg(target_arch = "aarch64")]
        dasm!(assembler
            ; b =>begin_loop
            ; =>end_loop
        );

        Ok(())
    }

    /// `[->+<]`-style transfer: add the current cell to the cell `amount`
    /// away and clear it. Nothing happens, and nothing is checked, when the
    /// current cell is already zero.
    pub fn move_data(&mut self, forward: bool, amount: u32) -> BfResult<()> {
        let skip_move = self.assembler.new_dynamic_label();
        let out_of_bounds_label = self.out_of_bounds_label;
        let assembler = &mut self.assembler;

        #[cfg(target_arch = "x86_64")]
        {
            let amount = i32::try_from(amount)?;
            dasm!(assembler
                ; cmp BYTE [reg_data_ptr], 0
                ; jz =>skip_move
                ; mov reg_temp_low, BYTE [reg_data_ptr]
            );

            if forward {
                dasm!(assembler
                    ; lea reg_addr, [reg_data_ptr + amount]
                    ; cmp reg_addr, reg_mem_end
                    ; jae =>out_of_bounds_label
                );
            } else {
                dasm!(assembler
                    ; lea reg_addr, [reg_data_ptr - amount]
                    ; cmp reg_addr, reg_mem_start
                    ; jb =>out_of_bounds_label
                );
            }

            dasm!(assembler
                ; add BYTE [reg_addr], reg_temp_low
                ; mov BYTE [reg_data_ptr], 0
                ; =>skip_move
            );
        }
        #[cfg(target_arch = "aarch64")]
        {
            dasm!(assembler
                ; ldrb reg_temp_low, [reg_data_ptr]
                ; cmp reg_temp_low, 0
                ; b.eq =>skip_move
            );

            if forward {
                add_sub_u32!(assembler, add, reg_addr, reg_data_ptr, amount);
                dasm!(assembler
                    ; cmp reg_addr, reg_mem_end
                    ; b.hs =>out_of_bounds_label
                );
            } else {
                add_sub_u32!(assembler, sub, reg_addr, reg_data_ptr, amount);
                dasm!(assembler
                    ; cmp reg_addr, reg_mem_start
                    ; b.lo =>out_of_bounds_label
                );
            }

            dasm!(assembler
                ; ldrb reg_temp2_low, [reg_addr]
                ; add reg_temp2_low, reg_temp2_low, reg_temp_low
                ; strb reg_temp2_low, [reg_addr]
                ; strb wzr, [reg_data_ptr]
                ; =>skip_move
            );
        }

        Ok(())
    }

    pub fn finish(mut self) -> BfResult<CompiledProgram> {
        if let Some(LabelPair { position, .. }) = self.open_bracket_stack.first() {
            return Err(BfError::Bf(format!(
                "Unmatched opening '[' at position {position}."
            )));
        }

        self.epilogue();

        let start = self.start;
        let buffer = self.assembler.finalize()?;
        debug!("compiled {} bytes of machine code", buffer.len());

        Ok(CompiledProgram { buffer, start })
    }
}

/// Executable code of one brainfuck program. It holds no pointers into a
/// [`Runtime`], so the same program can be run any number of times.
pub struct CompiledProgram {
    buffer: ExecutableBuffer,
    start: AssemblyOffset,
}

impl CompiledProgram {
    pub fn code_size(&self) -> usize {
        self.buffer.len()
    }

    fn entry_point(&self) -> EntryPoint {
        // SAFETY: `start` is the offset `Emitter::new` emitted the prologue
        // at, and the code follows the `EntryPoint` calling convention.
        unsafe { mem::transmute::<*const u8, EntryPoint>(self.buffer.ptr(self.start)) }
    }
}

struct RuntimeIo<'a> {
    stdin: &'a mut dyn Read,
    stdout: &'a mut dyn Write,
    error: Option<io::Error>,
}

/// Tape and I/O handles a compiled program runs against.
pub struct Runtime<'a> {
    memory: Box<[u8]>,
    io: RuntimeIo<'a>,
}

impl<'a> Runtime<'a> {
    pub fn new(stdin: &'a mut dyn Read, stdout: &'a mut dyn Write) -> Self {
        Self {
            memory: vec![0; MEMORY_SIZE].into_boxed_slice(),
            io: RuntimeIo {
                stdin,
                stdout,
                error: None,
            },
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn run(&mut self, compiled_program: &CompiledProgram) -> BfResult<()> {
        let entry_point = compiled_program.entry_point();
        let cells = self.memory.as_mut_ptr_range();
        let io = (&mut self.io as *mut RuntimeIo).cast::<c_void>();

        match entry_point(io, cells.start, cells.end) {
            STATUS_OK => Ok(()),
            STATUS_OUT_OF_BOUNDS => Err(BfError::Bf("data pointer out of bounds".to_owned())),
            STATUS_IO_ERROR => Err(self
                .io
                .error
                .take()
                .map_or_else(|| BfError::Io("I/O failed".to_owned()), BfError::from)),
            status => Err(BfError::Assembler(format!(
                "compiled program returned unknown status {status}"
            ))),
        }
    }
}

extern "C" fn read_callback(io: *mut c_void, cell: *mut u8) -> u8 {
    // SAFETY: compiled code passes back the pointers `Runtime::run` handed to
    // the entry point, and `cell` is within the tape.
    let (io, cell) = unsafe { (&mut *io.cast::<RuntimeIo>(), &mut *cell) };

    let mut c = [0; 1];
    match io.stdin.read_exact(&mut c) {
        Ok(()) => {
            *cell = c[0];
            STATUS_OK
        }
        Err(err) => {
            io.error = Some(err);
            STATUS_IO_ERROR
        }
    }
}

extern "C" fn write_callback(io: *mut c_void, byte: u8) -> u8 {
    // SAFETY: see `read_callback`.
    let io = unsafe { &mut *io.cast::<RuntimeIo>() };

    match io
        .stdout
        .write_all(&[byte])
        .and_then(|()| io.stdout.flush())
    {
        Ok(()) => STATUS_OK,
        Err(err) => {
            io.error = Some(err);
            STATUS_IO_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Emitter, Runtime};
    use crate::error::BfError;
    use crate::memory::MEMORY_SIZE;
    use std::io;

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_program_runs() {
        let compiled = Emitter::new().unwrap().finish().unwrap();
        assert!(compiled.code_size() > 0);

        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        runtime.run(&compiled).unwrap();
        assert!(runtime.memory().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_data_and_pointer_ops() {
        let mut emitter = Emitter::new().unwrap();
        emitter.add_data(300);
        emitter.move_ptr(true, 2).unwrap();
        emitter.sub_data(1);
        emitter.move_ptr(false, 1).unwrap();
        emitter.add_data(7);
        emitter.set_data_to_zero();
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        runtime.run(&compiled).unwrap();
        assert_eq!(&runtime.memory()[..3], &[44, 0, 255]);
    }

    #[test]
    fn test_io_round_trip() {
        let mut emitter = Emitter::new().unwrap();
        emitter.read();
        emitter.add_data(1);
        emitter.write();
        emitter.write();
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (&b"A"[..], vec![]);
        Runtime::new(&mut stdin, &mut stdout).run(&compiled).unwrap();
        assert_eq!(stdout, b"BB");
    }

    #[test]
    fn test_program_can_run_twice() {
        let mut emitter = Emitter::new().unwrap();
        emitter.add_data(b'x' as u32);
        emitter.write();
        let compiled = emitter.finish().unwrap();

        for _ in 0..2 {
            let (mut stdin, mut stdout) = (io::empty(), vec![]);
            Runtime::new(&mut stdin, &mut stdout).run(&compiled).unwrap();
            assert_eq!(stdout, b"x");
        }
    }

    #[test]
    fn test_pointer_below_tape_is_reported() {
        let mut emitter = Emitter::new().unwrap();
        emitter.move_ptr(false, 1).unwrap();
        emitter.add_data(1);
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        let err = runtime.run(&compiled).unwrap_err();
        assert_eq!(err, BfError::Bf("data pointer out of bounds".to_owned()));
        assert!(runtime.memory().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_pointer_above_tape_is_reported() {
        let mut emitter = Emitter::new().unwrap();
        emitter.move_ptr(true, (MEMORY_SIZE - 1) as u32).unwrap();
        emitter.add_data(9);
        emitter.move_ptr(true, 1).unwrap();
        emitter.add_data(1);
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        assert!(matches!(runtime.run(&compiled), Err(BfError::Bf(_))));
        assert_eq!(runtime.memory()[MEMORY_SIZE - 1], 9);
    }

    #[test]
    fn test_end_of_input_is_an_io_error() {
        let mut emitter = Emitter::new().unwrap();
        emitter.read();
        emitter.add_data(1);
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (io::empty(), vec![]);
        let mut runtime = Runtime::new(&mut stdin, &mut stdout);
        assert!(matches!(runtime.run(&compiled), Err(BfError::Io(_))));
        assert_eq!(runtime.memory()[0], 0);
    }

    #[test]
    fn test_write_failure_is_an_io_error() {
        let mut emitter = Emitter::new().unwrap();
        emitter.write();
        let compiled = emitter.finish().unwrap();

        let (mut stdin, mut stdout) = (io::empty(), FailingWriter);
        let err = Runtime::new(&mut stdin, &mut stdout)
            .run(&compiled)
            .unwrap_err();
        assert_eq!(err, BfError::Io("closed".to_owned()));
    }

    #[test]
    fn test_unmatched_brackets_are_rejected() {
        let mut emitter = Emitter::new().unwrap();
        assert_eq!(
            emitter.jump_end(3).err(),
            Some(BfError::Bf(
                "Unmatched closing ']' at position 3.".to_owned()
            ))
        );

        let mut emitter = Emitter::new().unwrap();
        emitter.jump_begin(1);
        assert_eq!(
            emitter.finish().err(),
            Some(BfError::Bf(
                "Unmatched opening '[' at position 1.".to_owned()
            ))
        );
    }
}

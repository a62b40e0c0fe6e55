use std::error::Error;
use std::fmt;
use std::io;
use std::num::TryFromIntError;

use dynasmrt::{relocations::Relocation, Assembler};

#[derive(Debug, Eq, PartialEq)]
pub enum BfError {
    /// The brainfuck program itself is wrong: unmatched brackets or a data
    /// pointer that leaves the tape.
    Bf(String),
    TryFromInt(TryFromIntError),
    Io(String),
    Assembler(String),
}

impl fmt::Display for BfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bf(message) => write!(f, "{message}"),
            Self::TryFromInt(err) => write!(f, "{err}"),
            Self::Io(message) => write!(f, "{message}"),
            Self::Assembler(message) => write!(f, "{message}"),
        }
    }
}

impl Error for BfError {}

impl From<TryFromIntError> for BfError {
    fn from(err: TryFromIntError) -> Self {
        BfError::TryFromInt(err)
    }
}

impl From<io::Error> for BfError {
    fn from(err: io::Error) -> Self {
        BfError::Io(format!("{err}"))
    }
}

// `Assembler::finalize` hands the assembler back when it cannot commit.
impl<R> From<Assembler<R>> for BfError
where
    R: fmt::Debug + Relocation,
{
    fn from(err: Assembler<R>) -> Self {
        BfError::Assembler(format!("{err:?}"))
    }
}

pub type BfResult<T> = Result<T, BfError>;

#[cfg(test)]
mod tests {
    use super::BfError;
    use std::io;

    #[test]
    fn test_io_error_keeps_message() {
        let err: BfError = io::Error::new(io::ErrorKind::UnexpectedEof, "no more input").into();
        assert_eq!(err, BfError::Io("no more input".to_owned()));
        assert_eq!(err.to_string(), "no more input");
    }

    #[test]
    fn test_try_from_int_error_converts() {
        let err: BfError = i32::try_from(u32::MAX).unwrap_err().into();
        assert!(matches!(err, BfError::TryFromInt(_)));
    }
}

//! Errors raised while loading or running a program.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {token:?} is not an 8-bit binary number")]
    Parse { line: usize, token: String },

    #[error("image of {len} bytes does not fit in memory")]
    ImageTooLarge { len: usize },

    #[error("unknown opcode {opcode:#010b} at {pc:#04x}")]
    UnknownOpcode { opcode: u8, pc: u8 },

    #[error("register index {index} out of bounds at {pc:#04x}")]
    InvalidRegister { index: u8, pc: u8 },

    #[error("stack is empty")]
    StackEmpty,

    #[error("console write failed: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    /// Name of the stage that failed, used as a prefix in diagnostics.
    pub fn subsystem(&self) -> &'static str {
        match self {
            Error::Io { .. } | Error::Parse { .. } | Error::ImageTooLarge { .. } => "load",
            Error::UnknownOpcode { .. }
            | Error::InvalidRegister { .. }
            | Error::StackEmpty
            | Error::Output(_) => "run",
        }
    }
}

use std::convert::TryFrom;
use std::fmt;

use crate::error::Error;

/// LS-8 opcodes. The top two bits of each encoding hold the operand count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Ldi = 0b10000010,
    Prn = 0b01000111,
    Mul = 0b10100010,
    Hlt = 0b00000001,
    Pop = 0b01000110,
    Push = 0b01000101,
}

impl Opcode {
    /// Encoded length in bytes, operands included.
    pub fn size(self) -> u8 {
        ((self as u8) >> 6) + 1
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    /// The error carries `pc: 0`; `Core::step` replaces it with the fetch address.
    fn try_from(byte: u8) -> Result<Self, Error> {
        Ok(match byte {
            0b10000010 => Opcode::Ldi,
            0b01000111 => Opcode::Prn,
            0b10100010 => Opcode::Mul,
            0b00000001 => Opcode::Hlt,
            0b01000110 => Opcode::Pop,
            0b01000101 => Opcode::Push,
            x => return Err(Error::UnknownOpcode { opcode: x, pc: 0 }),
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Mul => "MUL",
            Opcode::Hlt => "HLT",
            Opcode::Pop => "POP",
            Opcode::Push => "PUSH",
        };
        f.write_str(name)
    }
}

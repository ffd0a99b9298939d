use std::fmt::{Display, Formatter};

mod constants {
    pub(crate) const READ_INPUT_REGISTERS: u8 = 4;
}

/// bit set in the function code of an exception response
pub(crate) const ERROR_DELIMITER: u8 = 0x80;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum FunctionCode {
    ReadInputRegisters = constants::READ_INPUT_REGISTERS,
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            FunctionCode::ReadInputRegisters => {
                write!(f, "READ INPUT REGISTERS ({:#04X})", self.get_value())
            }
        }
    }
}

impl FunctionCode {
    pub(crate) const fn get_value(self) -> u8 {
        self as u8
    }

    pub(crate) const fn as_error(self) -> u8 {
        self.get_value() | ERROR_DELIMITER
    }

    pub(crate) fn get(value: u8) -> Option<Self> {
        match value {
            constants::READ_INPUT_REGISTERS => Some(FunctionCode::ReadInputRegisters),
            _ => None,
        }
    }
}

use crate::error::InvalidRange;

/// Modbus unit identifier (slave address), just a type-safe wrapper around `u8`
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnitId {
    /// underlying raw value
    pub value: u8,
}

/// Start and count tuple of the input registers to read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRange {
    /// Starting address of the range
    pub start: u16,
    /// Count of registers in the range
    pub count: u16,
}

/// Data bytes of a read input registers response
///
/// The buffer is sized for this device's two register response, so a response
/// can never carry more than [`RawResponse::CAPACITY`] bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawResponse {
    bytes: [u8; RawResponse::CAPACITY],
    len: usize,
}

/// Temperature in degrees Celsius
///
/// A reading that could not be obtained is represented by [`Temperature::INVALID`],
/// which is never finite and therefore never equal to a real reading.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Temperature {
    /// degrees Celsius with tenths-of-degree resolution
    pub celsius: f32,
}

impl UnitId {
    /// create a new UnitId
    pub const fn new(value: u8) -> Self {
        Self { value }
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04X}", self.value)
    }
}

impl AddressRange {
    /// Create a new address range, validating that the response fits a [`RawResponse`]
    pub fn try_from(start: u16, count: u16) -> Result<Self, InvalidRange> {
        Self { start, count }.validate()
    }

    pub(crate) fn validate(self) -> Result<Self, InvalidRange> {
        if self.count == 0 {
            return Err(InvalidRange::CountOfZero);
        }

        if self.count > RawResponse::MAX_REGISTERS {
            return Err(InvalidRange::CountTooLarge(
                self.count,
                RawResponse::MAX_REGISTERS,
            ));
        }

        let max_start = u16::MAX - (self.count - 1);
        if self.start > max_start {
            return Err(InvalidRange::AddressOverflow(self.start, self.count));
        }

        Ok(self)
    }

    /// number of data bytes a response to this range carries
    pub(crate) fn byte_count(&self) -> usize {
        2 * self.count as usize
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "start: {:#06X} qty: {}", self.start, self.count)
    }
}

impl RawResponse {
    /// capacity of the response buffer in bytes
    pub const CAPACITY: usize = 4;
    /// number of registers that fit the response buffer
    pub const MAX_REGISTERS: u16 = (Self::CAPACITY / 2) as u16;

    /// copy the data bytes of a response, returning `None` if they exceed the capacity
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let mut bytes = [0; Self::CAPACITY];
        bytes.get_mut(..data.len())?.copy_from_slice(data);
        Some(Self {
            bytes,
            len: data.len(),
        })
    }

    /// the received data bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// number of data bytes received
    pub fn len(&self) -> usize {
        self.len
    }

    /// true if no data bytes were received
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// the first register as a signed big-endian word
    pub fn first_word(&self) -> Option<i16> {
        match self.as_bytes() {
            [high, low, ..] => Some(i16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }

    /// true if the first register is exactly `{0x00, 0x00}`
    ///
    /// The sensor answers with this value while it is still powering up, but it
    /// is also what a genuine 0.0 °C reading looks like.
    pub fn is_zero_reading(&self) -> bool {
        matches!(self.as_bytes(), [0x00, 0x00, ..])
    }
}

impl Temperature {
    /// sentinel used wherever a reading could not be obtained
    pub const INVALID: Temperature = Temperature { celsius: f32::NAN };

    /// create a temperature from degrees Celsius
    pub const fn from_celsius(celsius: f32) -> Self {
        Self { celsius }
    }

    /// decode a temperature from a signed tenths-of-degree register value
    pub fn from_tenths(raw: i16) -> Self {
        Self {
            celsius: f32::from(raw) / 10.0,
        }
    }

    /// true for any real reading, false for [`Temperature::INVALID`]
    pub fn is_valid(&self) -> bool {
        self.celsius.is_finite()
    }

    /// the temperature of a successful read, or [`Temperature::INVALID`]
    pub fn or_invalid<E>(result: &Result<Temperature, E>) -> Temperature {
        match result {
            Ok(x) => *x,
            Err(_) => Temperature::INVALID,
        }
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{:.1} °C", self.celsius)
        } else {
            f.write_str("invalid")
        }
    }
}

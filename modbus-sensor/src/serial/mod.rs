use std::time::{Duration, Instant};

pub(crate) mod frame;
pub(crate) mod transport;

#[cfg(feature = "serial")]
mod native;

#[cfg(feature = "serial")]
pub use native::NativePort;

/// Electrical protocol spoken on the serial channel
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SerialProtocol {
    /// Point-to-point RS-232
    Rs232,
    /// Half-duplex multi-drop RS-485
    #[default]
    Rs485,
}

/// Serial channel configuration, immutable once a session is initialized
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SerialSettings {
    /// Electrical protocol
    pub protocol: SerialProtocol,
    /// Baud rate of the channel
    pub baud_rate: u32,
    /// Ceiling on the time spent receiving a single response
    pub rx_timeout: Duration,
    /// Silence after which a response is considered complete, see `min_bytes_before_inter_byte`
    pub inter_byte_timeout: Duration,
    /// Number of bytes that must be buffered before `inter_byte_timeout` is applied
    ///
    /// Gaps before this many bytes have arrived are ignored, which protects against
    /// partial bursts and transmit echo on the half-duplex bus.
    pub min_bytes_before_inter_byte: usize,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            protocol: SerialProtocol::Rs485,
            baud_rate: crate::constants::serial::BAUD_RATE,
            rx_timeout: crate::constants::serial::RX_TIMEOUT,
            inter_byte_timeout: crate::constants::serial::INTER_BYTE_TIMEOUT,
            min_bytes_before_inter_byte: crate::constants::serial::MIN_BYTES_BEFORE_INTER_BYTE,
        }
    }
}

/// Byte level access to a serial channel
///
/// This is the capability set the transport is built on. Implement it to run the
/// library on top of a UART driver or to substitute an in-memory bus in tests.
pub trait SerialPort {
    /// Establish the channel using the protocol and baud rate in `settings`
    fn open(&mut self, settings: &SerialSettings) -> std::io::Result<()>;

    /// Release the channel
    ///
    /// May be called even if `open` never succeeded.
    fn close(&mut self) -> std::io::Result<()>;

    /// Read whatever bytes are available, at most `buffer.len()`
    ///
    /// Must not block for longer than roughly one character time and returns
    /// `Ok(0)` when nothing has been received. Timing is owned by the caller.
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize>;

    /// Write `data`, returning the number of bytes accepted by the channel
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize>;
}

impl<T: SerialPort + ?Sized> SerialPort for Box<T> {
    fn open(&mut self, settings: &SerialSettings) -> std::io::Result<()> {
        (**self).open(settings)
    }

    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }

    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        (**self).read(buffer)
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        (**self).write(data)
    }
}

/// Monotonic tick source used for every receive timeout
///
/// One tick is one millisecond; ticks are expressed as [`Duration`] since an arbitrary origin.
pub trait Clock {
    /// Current time since the clock's origin
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`]
#[derive(Copy, Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// create a clock whose origin is the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

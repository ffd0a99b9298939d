use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

use crate::serial::{SerialPort, SerialProtocol, SerialSettings};

/// How long a single poll of the OS port may block
///
/// Kept near one character time at the default baud rate so that the
/// transport, not the OS driver, decides when a response is complete.
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// [`SerialPort`] backed by an operating system serial device (e.g. `/dev/ttyUSB0` or `COM3`)
///
/// RS-485 direction control is expected to be handled by the adapter.
pub struct NativePort {
    path: String,
    port: Option<Box<dyn tokio_serial::SerialPort>>,
}

impl NativePort {
    /// create a port for the device at `path`; nothing is opened until the session is initialized
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            port: None,
        }
    }

    fn get(&mut self) -> std::io::Result<&mut Box<dyn tokio_serial::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| std::io::Error::from(ErrorKind::NotConnected))
    }
}

impl std::fmt::Debug for NativePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePort")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialPort for NativePort {
    fn open(&mut self, settings: &SerialSettings) -> std::io::Result<()> {
        if settings.protocol == SerialProtocol::Rs232 {
            tracing::debug!("opening {} as RS-232", self.path);
        }

        let port = tokio_serial::new(self.path.as_str(), settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(POLL_TIMEOUT)
            .open()
            .map_err(std::io::Error::from)?;

        // drop anything left on the line from before the port was opened
        if let Err(err) = port.clear(tokio_serial::ClearBuffer::All) {
            tracing::warn!("unable to clear {}: {}", self.path, err);
        }

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        // dropping the handle releases the device
        self.port = None;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        let port = self.get()?;
        match Read::read(&mut **port, buffer) {
            Ok(count) => Ok(count),
            Err(err) if err.kind() == ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let port = self.get()?;
        let count = Write::write(&mut **port, data)?;
        Write::flush(&mut **port)?;
        Ok(count)
    }
}

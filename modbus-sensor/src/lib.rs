//! Modbus RTU master for a single RS-485 temperature sensor, written for
//! blocking I/O on a single thread.
//!
//! # Features
//!
//! * Composite receive timeout that completes a response on line silence
//! * Panic-free parsing of the response frame with CRC-16 validation
//! * Retry policy that hides the sensor's all-zero power-up reading
//! * Scanner that locates the sensor on an unknown slave address
//! * Protocol decoding to the log at the application, frame and physical layers
//!
//! # Supported Functions
//!
//! * Read Input Registers
//!
//! # Example
//!
//! Locate the sensor, then read it once a second
//!
//! ```no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use modbus_sensor::*;
//!
//! let mut session = SessionBuilder::new()
//!     .init(NativePort::new("/dev/ttyUSB0"), SystemClock::new())?;
//!
//! let sensor = session.scan_for_temperature_sensor(ScanRange::default())?;
//! println!("sensor on slave {}", sensor.unit_id);
//!
//! loop {
//!     let result = session.request_receive_temperature();
//!     match result {
//!         Ok(temperature) => println!("{temperature}"),
//!         Err(err) => println!("error: {err}"),
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

/// Device constants of the deployed sensor and bus
pub mod constants;

mod client;
mod common;
mod decode;
mod error;
mod serial;
mod types;

#[cfg(test)]
mod mock;

pub use crate::client::*;
pub use crate::decode::*;
pub use crate::error::*;
pub use crate::serial::{Clock, SerialPort, SerialProtocol, SerialSettings, SystemClock};
pub use crate::types::*;

#[cfg(feature = "serial")]
pub use crate::serial::NativePort;

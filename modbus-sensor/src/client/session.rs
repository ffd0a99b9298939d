use std::time::Duration;

use crate::client::channel::ModbusClient;
use crate::client::policy::SensorReadPolicy;
use crate::client::scanner::{DeviceScanner, DiscoveredSensor, ScanRange};
use crate::decode::DecodeLevel;
use crate::error::RequestError;
use crate::serial::transport::SerialTransport;
use crate::serial::{Clock, SerialPort, SerialSettings};
use crate::types::{AddressRange, Temperature, UnitId};

/// Where the temperature lives on the sensor and how hard to try reading it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SensorSettings {
    /// slave address of the sensor
    pub unit_id: UnitId,
    /// input registers requested by each read, the first one holds the temperature
    pub registers: AddressRange,
    /// maximum number of requests issued by [`Session::request_receive_temperature`]
    pub max_retries: u8,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            unit_id: crate::constants::sensor::UNIT_ID,
            registers: AddressRange {
                start: crate::constants::sensor::TEMPERATURE_REGISTER,
                count: crate::constants::sensor::REGISTER_COUNT,
            },
            max_retries: crate::constants::sensor::MAX_RETRIES,
        }
    }
}

/// Collects the configuration of a [`Session`] and initializes it
///
/// ```no_run
/// # #[cfg(feature = "serial")]
/// # fn main() -> Result<(), modbus_sensor::RequestError> {
/// use std::time::Duration;
/// use modbus_sensor::*;
///
/// let mut session = SessionBuilder::new()
///     .rx_timeout(Duration::from_millis(1000))
///     .decode_level(AppDecodeLevel::DataValues.into())
///     .init(NativePort::new("/dev/ttyUSB0"), SystemClock::new())?;
///
/// let temperature = session.request_receive_temperature()?;
/// println!("{temperature}");
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "serial"))]
/// # fn main() {}
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct SessionBuilder {
    serial: SerialSettings,
    sensor: SensorSettings,
    decode: DecodeLevel,
}

impl SessionBuilder {
    /// builder holding the default settings of the deployed sensor
    pub fn new() -> Self {
        Self::default()
    }

    /// replace every serial setting at once
    pub fn serial_settings(mut self, settings: SerialSettings) -> Self {
        self.serial = settings;
        self
    }

    /// baud rate of the serial channel
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    /// ceiling on the time spent receiving a single response
    pub fn rx_timeout(mut self, timeout: Duration) -> Self {
        self.serial.rx_timeout = timeout;
        self
    }

    /// silence that completes a response once enough bytes are buffered
    pub fn inter_byte_timeout(mut self, timeout: Duration) -> Self {
        self.serial.inter_byte_timeout = timeout;
        self
    }

    /// register layout and retry limit of the sensor
    pub fn sensor_settings(mut self, settings: SensorSettings) -> Self {
        self.sensor = settings;
        self
    }

    /// protocol decoding written to the log
    pub fn decode_level(mut self, level: DecodeLevel) -> Self {
        self.decode = level;
        self
    }

    /// Open `port` and return the live session
    ///
    /// Fails with [`RequestError::Io`] if the port cannot be opened.
    pub fn init<P, C>(self, port: P, clock: C) -> Result<Session<P, C>, RequestError>
    where
        P: SerialPort,
        C: Clock,
    {
        let transport = SerialTransport::new(port, clock, self.serial, self.decode.physical);
        let mut session = Session {
            client: ModbusClient::new(transport, self.decode),
            sensor: self.sensor,
        };
        session.open()?;
        Ok(session)
    }
}

/// A serial channel to the temperature sensor and the operations performed over it
///
/// A session is live from [`SessionBuilder::init`] until [`Session::deinit`].
/// Reads and scans on a released session fail with [`RequestError::InvalidHandle`]
/// until it is brought back with [`Session::reinit`]. Dropping a live session
/// closes the port.
pub struct Session<P, C>
where
    P: SerialPort,
    C: Clock,
{
    client: ModbusClient<P, C>,
    sensor: SensorSettings,
}

impl<P, C> Session<P, C>
where
    P: SerialPort,
    C: Clock,
{
    fn open(&mut self) -> Result<(), RequestError> {
        if let Err(err) = self.client.transport().open() {
            tracing::warn!("unable to open serial port: {}", err);
            return Err(err.into());
        }
        tracing::info!(
            "session initialized (unit: {} {})",
            self.sensor.unit_id,
            self.sensor.registers
        );
        Ok(())
    }

    /// true between a successful init and the next deinit
    pub fn is_initialized(&self) -> bool {
        self.client.is_open()
    }

    /// Re-open the port of a released session with the settings it was built with
    pub fn reinit(&mut self) -> Result<(), RequestError> {
        if self.is_initialized() {
            return Err(RequestError::AlreadyInitialized);
        }
        self.open()
    }

    /// Close the port and release the session
    ///
    /// The session is released even when closing the port fails, in which case the
    /// failure is logged and returned. Releasing a session that is already released
    /// does nothing.
    pub fn deinit(&mut self) -> Result<(), RequestError> {
        if !self.is_initialized() {
            tracing::debug!("session already released");
            return Ok(());
        }
        match self.client.transport().close() {
            Ok(()) => {
                tracing::info!("session released");
                Ok(())
            }
            Err(err) => {
                tracing::warn!("error closing serial port: {}", err);
                Err(err.into())
            }
        }
    }

    /// Read the temperature, repeating the request on failure or on the sensor's power-up zero
    ///
    /// Combine with [`Temperature::or_invalid`] to obtain the invalid sentinel on failure.
    pub fn request_receive_temperature(&mut self) -> Result<Temperature, RequestError> {
        let policy = SensorReadPolicy::retrying(&self.sensor);
        policy.run(self.client()?)
    }

    /// Read the temperature with a single request and no zero handling
    pub fn read_first_attempt_only(&mut self) -> Result<Temperature, RequestError> {
        let policy = SensorReadPolicy::first_attempt_only(&self.sensor);
        policy.run(self.client()?)
    }

    /// Probe `range` for the first address answering with a meaningful reading
    pub fn scan_for_temperature_sensor(
        &mut self,
        range: ScanRange,
    ) -> Result<DiscoveredSensor, RequestError> {
        let scanner = DeviceScanner::new(range, self.sensor.registers);
        scanner.scan(self.client()?)
    }

    /// Direct access to the Modbus client of a live session
    pub fn client(&mut self) -> Result<&mut ModbusClient<P, C>, RequestError> {
        if !self.is_initialized() {
            return Err(RequestError::InvalidHandle);
        }
        Ok(&mut self.client)
    }

    /// settings of the sensor this session reads
    pub fn sensor_settings(&self) -> &SensorSettings {
        &self.sensor
    }
}

impl<P, C> Drop for Session<P, C>
where
    P: SerialPort,
    C: Clock,
{
    fn drop(&mut self) {
        if let Err(err) = self.client.transport().close() {
            tracing::warn!("error closing serial port: {}", err);
        }
    }
}

/// Serial channel parameters of the deployed sensor
pub mod serial {
    use std::time::Duration;

    /// Baud rate of the RS-485 bus
    pub const BAUD_RATE: u32 = 4800;
    /// Overall receive timeout of a single request (2000 ticks)
    pub const RX_TIMEOUT: Duration = Duration::from_millis(2000);
    /// Silence that ends a response once enough bytes were buffered (100 ticks)
    pub const INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(100);
    /// Length of the complete read input registers response for two registers
    pub const MIN_BYTES_BEFORE_INTER_BYTE: usize = 9;
}

/// Register layout and read policy of the temperature sensor
pub mod sensor {
    use crate::types::UnitId;

    /// Address the sensor is configured with on the bus
    pub const UNIT_ID: UnitId = UnitId::new(0x01);
    /// Input register holding the temperature in tenths of a degree
    pub const TEMPERATURE_REGISTER: u16 = 0x0001;
    /// Number of registers requested per read, the second one is ignored
    pub const REGISTER_COUNT: u16 = 2;
    /// Maximum number of requests issued by a single temperature read
    pub const MAX_RETRIES: u8 = 3;
}

/// Default address range probed when locating the sensor
pub mod scan {
    use crate::types::UnitId;

    /// first address probed
    pub const SLAVE_MIN: UnitId = UnitId::new(0x01);
    /// last address probed
    pub const SLAVE_MAX: UnitId = UnitId::new(0x0F);
}

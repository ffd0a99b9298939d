pub(crate) mod channel;
pub(crate) mod policy;
pub(crate) mod scanner;
pub(crate) mod session;

pub use channel::{decode_temperature, ModbusClient};
pub use scanner::{DiscoveredSensor, ScanRange};
pub use session::{SensorSettings, Session, SessionBuilder};

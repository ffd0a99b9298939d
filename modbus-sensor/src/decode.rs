/// Controls the decoding of transmitted and received data at the application, frame, and physical layer
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeLevel {
    /// Controls decoding of the request and the register values
    pub app: AppDecodeLevel,
    /// Controls decoding of the RTU frame (unit id, CRC and raw payload)
    pub frame: FrameDecodeLevel,
    /// Controls the logging of physical layer read/write
    pub physical: PhysDecodeLevel,
}

/// Controls how requests and responses are decoded at the INFO log level
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum AppDecodeLevel {
    /// Decode nothing
    #[default]
    Nothing,
    /// Decode the function code only
    FunctionCode,
    /// Decode the function code and the register range
    DataHeaders,
    /// Decode the function code, the register range and the actual register values
    DataValues,
}

/// Controls how the transmitted and received RTU frames are decoded at the INFO log level
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameDecodeLevel {
    /// Decode nothing
    #[default]
    Nothing,
    /// Decode the header
    Header,
    /// Decode the header and the raw payload as hexadecimal
    Payload,
}

/// Controls how data transmitted on the serial channel is logged
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhysDecodeLevel {
    /// Log nothing
    #[default]
    Nothing,
    /// Log only the length of data that is sent and received
    Length,
    /// Log the length and the actual data that is sent and received
    Data,
}

impl DecodeLevel {
    /// construct a `DecodeLevel` with nothing enabled
    pub fn nothing() -> Self {
        Self::default()
    }

    /// construct a `DecodeLevel` from its fields
    pub fn new(app: AppDecodeLevel, frame: FrameDecodeLevel, physical: PhysDecodeLevel) -> Self {
        DecodeLevel {
            app,
            frame,
            physical,
        }
    }

    /// construct a `DecodeLevel` with every layer fully decoded
    pub fn everything() -> Self {
        Self::new(
            AppDecodeLevel::DataValues,
            FrameDecodeLevel::Payload,
            PhysDecodeLevel::Data,
        )
    }
}

impl From<AppDecodeLevel> for DecodeLevel {
    fn from(app: AppDecodeLevel) -> Self {
        Self {
            app,
            frame: FrameDecodeLevel::Nothing,
            physical: PhysDecodeLevel::Nothing,
        }
    }
}

// Each level includes everything decoded by the levels declared before it,
// so the predicates below are ordering comparisons.

impl AppDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self >= AppDecodeLevel::FunctionCode
    }

    pub(crate) fn data_headers(self) -> bool {
        self >= AppDecodeLevel::DataHeaders
    }

    pub(crate) fn data_values(self) -> bool {
        self >= AppDecodeLevel::DataValues
    }
}

impl FrameDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self >= FrameDecodeLevel::Header
    }

    pub(crate) fn payload_enabled(self) -> bool {
        self >= FrameDecodeLevel::Payload
    }
}

impl PhysDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self >= PhysDecodeLevel::Length
    }

    pub(crate) fn data_enabled(self) -> bool {
        self >= PhysDecodeLevel::Data
    }
}

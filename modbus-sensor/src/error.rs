use crate::types::UnitId;

/// Top level error type returned by every operation on a [`Session`](crate::Session)
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// operation attempted before the session was initialized or after it was released
    #[error("no Modbus session is open")]
    InvalidHandle,
    /// init was requested while the session was still live
    #[error("the Modbus session is already initialized")]
    AlreadyInitialized,
    /// transport timeout, partial frame, or a frame rejected by the RTU codec
    #[error("{0}")]
    Io(#[from] IoFailure),
    /// no device answered meaningfully within the scanned address range
    #[error("no temperature sensor found (slaves {min}..{max})")]
    NotFound {
        /// first address probed
        min: UnitId,
        /// last address probed
        max: UnitId,
    },
    /// the request parameters cannot be encoded or would not fit a [`RawResponse`](crate::RawResponse)
    #[error("{0}")]
    BadRequest(#[from] InvalidRange),
}

/// Details of an I/O failure on the serial channel or in the RTU codec
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IoFailure {
    /// the receive timeout elapsed without a single byte arriving
    #[error("no response received before the receive timeout")]
    NoResponse,
    /// the underlying serial channel reported an error
    #[error("serial channel error: {0}")]
    Transport(std::io::ErrorKind),
    /// the channel accepted fewer bytes than were written
    #[error("short write: channel accepted {written} of {expected} bytes")]
    ShortWrite {
        /// bytes accepted by the channel
        written: usize,
        /// bytes in the request frame
        expected: usize,
    },
    /// the serial channel is not open
    #[error("the serial channel is not open")]
    NotOpen,
    /// the received bytes do not form a valid RTU frame
    #[error("bad frame: {0}")]
    BadFrame(#[from] FrameParseError),
    /// the frame was valid but does not answer the request that was made
    #[error("bad response: {0}")]
    BadResponse(#[from] AduParseError),
    /// the sensor only ever reported its power-up all-zero value
    #[error("sensor did not report a reading after power-up")]
    NotReady,
    /// a bug in the library while formatting a request
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

/// Errors that occur while delimiting a frame received on the serial channel
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameParseError {
    /// fewer bytes were received than the frame header announces
    #[error("received {0} bytes which is too short for an RTU frame")]
    FrameTooShort(usize),
    /// received CRC and calculated CRC differ
    #[error("received CRC ({0:#06X}) doesn't match the calculated CRC ({1:#06X})")]
    CrcValidationFailure(u16, u16),
}

/// Errors that occur while interpreting a validated response frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AduParseError {
    /// the responding unit is not the one that was addressed
    #[error("response from unit {actual} but request was sent to unit {expected}")]
    UnexpectedUnitId {
        /// unit id in the response
        actual: UnitId,
        /// unit id in the request
        expected: UnitId,
    },
    /// the device answered with an exception code
    #[error("device responded with exception code {0:#04X}")]
    ExceptionResponse(u8),
    /// function code is neither the expected one nor its exception variant
    #[error("received unknown response function code: {0:#04X}. Expected {1:#04X} or {2:#04X}")]
    UnknownResponseFunction(u8, u8, u8), // actual, expected, expected error
    /// byte count doesn't match what is expected based on the request
    #[error("byte count ({1}) doesn't match what is expected based on request ({0})")]
    RequestByteCountMismatch(usize, usize), // expected / actual
    /// bytes were received after the end of the frame
    #[error("response contains {0} extra trailing bytes")]
    TrailingBytes(usize),
}

/// Errors that indicate a bug in this library
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// the request did not fit the frame buffer
    #[error("insufficient space to format the request frame")]
    InsufficientWriteSpace,
}

/// Errors that result from a bad register range
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRange {
    /// range contains a count of zero
    #[error("range contains count == 0")]
    CountOfZero,
    /// start + count would overflow u16
    #[error("start == {0} and count = {1} would overflow the representation of u16")]
    AddressOverflow(u16, u16),
    /// the response would not fit the fixed response buffer
    #[error("count of {0} exceeds the maximum of {1} registers per request")]
    CountTooLarge(u16, u16), // count / max
}

impl From<FrameParseError> for RequestError {
    fn from(err: FrameParseError) -> Self {
        RequestError::Io(err.into())
    }
}

impl From<AduParseError> for RequestError {
    fn from(err: AduParseError) -> Self {
        RequestError::Io(err.into())
    }
}

impl From<std::io::Error> for IoFailure {
    fn from(err: std::io::Error) -> Self {
        IoFailure::Transport(err.kind())
    }
}

impl RequestError {
    /// true if the request reached the serial channel and failed there
    pub fn is_io_failure(&self) -> bool {
        matches!(self, RequestError::Io(_))
    }
}

use crate::common::function::FunctionCode;
use crate::decode::DecodeLevel;
use crate::error::{AduParseError, IoFailure, RequestError};
use crate::serial::frame::{self, constants};
use crate::serial::transport::SerialTransport;
use crate::serial::{Clock, SerialPort};
use crate::types::{AddressRange, RawResponse, Temperature, UnitId};

/// Anything that can answer a read input registers request
///
/// The read policy and the scanner are written against this trait rather than
/// the concrete client so their state transitions can be driven directly.
pub(crate) trait RegisterReader {
    fn read_input_registers(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<RawResponse, RequestError>;
}

/// Issues read input registers requests over a [`SerialTransport`]
///
/// Obtained from [`Session::client`](crate::Session::client).
pub struct ModbusClient<P, C> {
    transport: SerialTransport<P, C>,
    decode: DecodeLevel,
    rx_buffer: [u8; constants::MAX_FRAME_LENGTH],
}

impl<P, C> ModbusClient<P, C>
where
    P: SerialPort,
    C: Clock,
{
    pub(crate) fn new(transport: SerialTransport<P, C>, decode: DecodeLevel) -> Self {
        Self {
            transport,
            decode,
            rx_buffer: [0; constants::MAX_FRAME_LENGTH],
        }
    }

    pub(crate) fn transport(&mut self) -> &mut SerialTransport<P, C> {
        &mut self.transport
    }

    pub(crate) fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Read `range` from the input registers of `unit`
    ///
    /// Fails with [`RequestError::Io`] if no complete frame is received before the
    /// receive timeout, or if the frame is rejected by the RTU codec.
    pub fn read_input_registers(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<RawResponse, RequestError> {
        let range = range.validate()?;

        if self.decode.app.enabled() {
            if self.decode.app.data_headers() {
                tracing::info!(
                    "PDU TX - {} unit: {} {}",
                    FunctionCode::ReadInputRegisters,
                    unit,
                    range
                );
            } else {
                tracing::info!("PDU TX - {}", FunctionCode::ReadInputRegisters);
            }
        }

        let mut request = [0; constants::READ_REQUEST_LENGTH];
        let request =
            frame::format_read_input_registers(&mut request, unit, range, self.decode.frame)
                .map_err(IoFailure::from)?;
        self.transport.write(request)?;

        let count = self.transport.read(&mut self.rx_buffer)?;
        if count == 0 {
            return Err(IoFailure::NoResponse.into());
        }

        let received = self.rx_buffer.get(..count).unwrap_or_default();
        let data =
            frame::parse_read_input_registers_response(received, unit, range, self.decode.frame)?;

        let response = RawResponse::from_slice(data).ok_or(AduParseError::RequestByteCountMismatch(
            RawResponse::CAPACITY,
            data.len(),
        ))?;

        if self.decode.app.enabled() {
            if self.decode.app.data_values() {
                tracing::info!(
                    "PDU RX - {} unit: {} {}{}",
                    FunctionCode::ReadInputRegisters,
                    unit,
                    range,
                    RegisterDisplay::new(range, &response)
                );
            } else {
                tracing::info!("PDU RX - {}", FunctionCode::ReadInputRegisters);
            }
        }

        Ok(response)
    }
}

/// Interpret the first register as a signed big-endian word in tenths of a degree
///
/// `{0x00, 0x00}` decodes to 0.0 °C. Whether that value is genuine or the
/// sensor's power-up placeholder is decided by the read policy, not here.
/// Returns [`Temperature::INVALID`] if the response holds less than one register.
pub fn decode_temperature(response: &RawResponse) -> Temperature {
    match response.first_word() {
        Some(raw) => Temperature::from_tenths(raw),
        None => Temperature::INVALID,
    }
}

impl<P, C> RegisterReader for ModbusClient<P, C>
where
    P: SerialPort,
    C: Clock,
{
    fn read_input_registers(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<RawResponse, RequestError> {
        ModbusClient::read_input_registers(self, unit, range)
    }
}

struct RegisterDisplay<'a> {
    range: AddressRange,
    response: &'a RawResponse,
}

impl<'a> RegisterDisplay<'a> {
    fn new(range: AddressRange, response: &'a RawResponse) -> Self {
        Self { range, response }
    }
}

impl std::fmt::Display for RegisterDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (offset, word) in self.response.as_bytes().chunks_exact(2).enumerate() {
            let index = self.range.start.wrapping_add(offset as u16);
            write!(
                f,
                "\nindex: {} value: {:#06X}",
                index,
                u16::from_be_bytes([word[0], word[1]])
            )?;
        }
        Ok(())
    }
}

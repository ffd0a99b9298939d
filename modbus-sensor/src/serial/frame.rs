use crate::common::function::{FunctionCode, ERROR_DELIMITER};
use crate::decode::FrameDecodeLevel;
use crate::error::{AduParseError, FrameParseError, InternalError, IoFailure};
use crate::types::{AddressRange, UnitId};

use scursor::{ReadCursor, WriteCursor};

pub(crate) mod constants {
    pub(crate) const HEADER_LENGTH: usize = 1;
    pub(crate) const FUNCTION_CODE_LENGTH: usize = 1;
    pub(crate) const BYTE_COUNT_LENGTH: usize = 1;
    pub(crate) const CRC_LENGTH: usize = 2;
    pub(crate) const MAX_ADU_LENGTH: usize = 253;
    pub(crate) const MAX_FRAME_LENGTH: usize = HEADER_LENGTH + MAX_ADU_LENGTH + CRC_LENGTH;
    /// unit id, function code, start address, count, crc
    pub(crate) const READ_REQUEST_LENGTH: usize = HEADER_LENGTH + FUNCTION_CODE_LENGTH + 4 + CRC_LENGTH;
    /// unit id, function code | 0x80, exception code, crc
    pub(crate) const EXCEPTION_FRAME_LENGTH: usize =
        HEADER_LENGTH + FUNCTION_CODE_LENGTH + 1 + CRC_LENGTH;
}

/// precomputes the CRC table as a constant!
pub(crate) const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

/// Format a read input registers request ADU into `buffer`
pub(crate) fn format_read_input_registers(
    buffer: &mut [u8],
    unit: UnitId,
    range: AddressRange,
    level: FrameDecodeLevel,
) -> Result<&[u8], InternalError> {
    let length = {
        let mut cursor = WriteCursor::new(&mut *buffer);
        let overflow = |_| InternalError::InsufficientWriteSpace;
        cursor.write_u8(unit.value).map_err(overflow)?;
        cursor
            .write_u8(FunctionCode::ReadInputRegisters.get_value())
            .map_err(overflow)?;
        cursor.write_u16_be(range.start).map_err(overflow)?;
        cursor.write_u16_be(range.count).map_err(overflow)?;
        let end_pdu = cursor.position();
        let crc = CRC.checksum(
            cursor
                .get(0..end_pdu)
                .ok_or(InternalError::InsufficientWriteSpace)?,
        );
        cursor.write_u16_le(crc).map_err(overflow)?;
        cursor.position()
    };

    let frame = buffer
        .get(..length)
        .ok_or(InternalError::InsufficientWriteSpace)?;

    if level.enabled() {
        if let Some(payload) =
            frame.get(constants::HEADER_LENGTH..length - constants::CRC_LENGTH)
        {
            let crc = u16::from_le_bytes([frame[length - 2], frame[length - 1]]);
            tracing::info!("RTU TX - {}", RtuDisplay::new(level, unit, payload, crc));
        }
    }

    Ok(frame)
}

/// Validate a read input registers response and return its data bytes
///
/// `frame` must contain exactly one RTU frame: missing bytes and trailing bytes are both rejected.
pub(crate) fn parse_read_input_registers_response(
    frame: &[u8],
    unit: UnitId,
    range: AddressRange,
    level: FrameDecodeLevel,
) -> Result<&[u8], IoFailure> {
    let too_short = FrameParseError::FrameTooShort(frame.len());

    // length is implied by the function code and, for normal responses, the byte count
    let length = match frame {
        [_, function, ..] if function & ERROR_DELIMITER != 0 => constants::EXCEPTION_FRAME_LENGTH,
        [_, _, byte_count, ..] => {
            constants::HEADER_LENGTH
                + constants::FUNCTION_CODE_LENGTH
                + constants::BYTE_COUNT_LENGTH
                + *byte_count as usize
                + constants::CRC_LENGTH
        }
        _ => return Err(too_short.into()),
    };

    if frame.len() < length {
        return Err(too_short.into());
    }
    if frame.len() > length {
        return Err(AduParseError::TrailingBytes(frame.len() - length).into());
    }

    let (body, crc) = frame.split_at(length - constants::CRC_LENGTH);
    let received_crc = ReadCursor::new(crc)
        .read_u16_le()
        .map_err(|_| too_short)?;
    let expected_crc = CRC.checksum(body);
    if received_crc != expected_crc {
        return Err(FrameParseError::CrcValidationFailure(received_crc, expected_crc).into());
    }

    let mut cursor = ReadCursor::new(body);
    let received_unit = UnitId::new(cursor.read_u8().map_err(|_| too_short)?);

    if level.enabled() {
        if let Some(payload) = body.get(constants::HEADER_LENGTH..) {
            tracing::info!(
                "RTU RX - {}",
                RtuDisplay::new(level, received_unit, payload, received_crc)
            );
        }
    }

    if received_unit != unit {
        return Err(AduParseError::UnexpectedUnitId {
            actual: received_unit,
            expected: unit,
        }
        .into());
    }

    let function = cursor.read_u8().map_err(|_| too_short)?;
    let expected = FunctionCode::ReadInputRegisters;
    match FunctionCode::get(function) {
        Some(FunctionCode::ReadInputRegisters) => {}
        None if function == expected.as_error() => {
            let code = cursor.read_u8().map_err(|_| too_short)?;
            return Err(AduParseError::ExceptionResponse(code).into());
        }
        None => {
            return Err(AduParseError::UnknownResponseFunction(
                function,
                expected.get_value(),
                expected.as_error(),
            )
            .into());
        }
    }

    let byte_count = cursor.read_u8().map_err(|_| too_short)? as usize;
    if byte_count != range.byte_count() {
        return Err(AduParseError::RequestByteCountMismatch(range.byte_count(), byte_count).into());
    }

    cursor
        .read_bytes(byte_count)
        .map_err(|_| IoFailure::from(too_short))
}

pub(crate) struct RtuDisplay<'a> {
    level: FrameDecodeLevel,
    unit: UnitId,
    payload: &'a [u8],
    crc: u16,
}

impl<'a> RtuDisplay<'a> {
    pub(crate) fn new(level: FrameDecodeLevel, unit: UnitId, payload: &'a [u8], crc: u16) -> Self {
        RtuDisplay {
            level,
            unit,
            payload,
            crc,
        }
    }
}

impl std::fmt::Display for RtuDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "unit: {} crc: {:#06X} (payload len = {})",
            self.unit,
            self.crc,
            self.payload.len(),
        )?;
        if self.level.payload_enabled() {
            crate::common::phys::format_bytes(f, self.payload)?;
        }
        Ok(())
    }
}

use crate::client::channel::{decode_temperature, RegisterReader};
use crate::client::session::SensorSettings;
use crate::error::{AduParseError, IoFailure, RequestError};
use crate::types::{AddressRange, RawResponse, Temperature, UnitId};

/// Progress of a read through the retry loop
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RetryState {
    /// zero-based index of the current attempt
    pub(crate) attempt: u8,
    /// error of the most recent unsuccessful attempt
    pub(crate) last_error: Option<RequestError>,
}

impl RetryState {
    pub(crate) fn first() -> Self {
        Self {
            attempt: 0,
            last_error: None,
        }
    }

    fn is_first_attempt(&self) -> bool {
        self.attempt == 0
    }

    fn failed(self, err: RequestError) -> Self {
        Self {
            attempt: self.attempt,
            last_error: Some(err),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ReadState {
    /// issue a request for the current attempt
    Requesting(RetryState),
    /// a response arrived and must be checked for the power-up zero value
    ZeroCheck(RetryState, RawResponse),
    /// the current attempt did not produce a reading
    Retrying(RetryState),
    /// terminal, a reading was obtained
    Accepted(Temperature),
    /// terminal, every attempt was used up
    Failed(RequestError),
}

/// Turns one or more register reads into a temperature
///
/// After power-up the sensor answers with an all-zero payload until its first
/// conversion completes. An all-zero payload on the first attempt is therefore
/// discarded and the request repeated, while on any later attempt it is taken
/// as a genuine 0.0 °C. The retry loop issues requests back-to-back.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SensorReadPolicy {
    unit: UnitId,
    range: AddressRange,
    max_attempts: u8,
    skip_first_zero: bool,
}

impl SensorReadPolicy {
    pub(crate) fn retrying(settings: &SensorSettings) -> Self {
        Self {
            unit: settings.unit_id,
            range: settings.registers,
            max_attempts: settings.max_retries.max(1),
            skip_first_zero: true,
        }
    }

    /// a single request whose result is decoded as-is, an all-zero payload included
    pub(crate) fn first_attempt_only(settings: &SensorSettings) -> Self {
        Self {
            unit: settings.unit_id,
            range: settings.registers,
            max_attempts: 1,
            skip_first_zero: false,
        }
    }

    pub(crate) fn step<R>(&self, state: ReadState, reader: &mut R) -> ReadState
    where
        R: RegisterReader,
    {
        match state {
            ReadState::Requesting(retry) => {
                match reader.read_input_registers(self.unit, self.range) {
                    Ok(response) => {
                        tracing::info!("response bytes: {:02X?}", response.as_bytes());
                        ReadState::ZeroCheck(retry, response)
                    }
                    Err(err) => {
                        tracing::warn!(
                            "read attempt {} of {} failed: {}",
                            retry.attempt + 1,
                            self.max_attempts,
                            err
                        );
                        ReadState::Retrying(retry.failed(err))
                    }
                }
            }
            ReadState::ZeroCheck(retry, response) => {
                if self.skip_first_zero && retry.is_first_attempt() && response.is_zero_reading()
                {
                    tracing::info!("skipping first zero result");
                    return ReadState::Retrying(retry.failed(IoFailure::NotReady.into()));
                }

                let temperature = decode_temperature(&response);
                if temperature.is_valid() {
                    ReadState::Accepted(temperature)
                } else {
                    let err = AduParseError::RequestByteCountMismatch(
                        self.range.byte_count(),
                        response.len(),
                    );
                    ReadState::Retrying(retry.failed(err.into()))
                }
            }
            ReadState::Retrying(retry) => {
                let attempt = retry.attempt.saturating_add(1);
                if attempt < self.max_attempts {
                    ReadState::Requesting(RetryState {
                        attempt,
                        last_error: retry.last_error,
                    })
                } else {
                    ReadState::Failed(
                        retry
                            .last_error
                            .unwrap_or(RequestError::Io(IoFailure::NoResponse)),
                    )
                }
            }
            terminal @ (ReadState::Accepted(_) | ReadState::Failed(_)) => terminal,
        }
    }

    /// Drive the state machine to completion
    pub(crate) fn run<R>(&self, reader: &mut R) -> Result<Temperature, RequestError>
    where
        R: RegisterReader,
    {
        let mut state = ReadState::Requesting(RetryState::first());
        loop {
            state = self.step(state, reader);
            match state {
                ReadState::Accepted(temperature) => return Ok(temperature),
                ReadState::Failed(err) => return Err(err),
                _ => {}
            }
        }
    }
}

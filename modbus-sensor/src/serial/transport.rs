use std::io::ErrorKind;

use crate::common::phys::PhysDisplay;
use crate::decode::PhysDecodeLevel;
use crate::error::IoFailure;
use crate::serial::{Clock, SerialPort, SerialSettings};

/// Why a call to [`SerialTransport::read`] stopped collecting bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ReadEnd {
    /// the buffer is full
    Capacity,
    /// the overall receive timeout elapsed
    Timeout,
    /// enough bytes were buffered and the line went quiet
    Silence,
}

/// Byte oriented serial channel with the composite receive timeout
pub(crate) struct SerialTransport<P, C> {
    port: P,
    clock: C,
    settings: SerialSettings,
    decode: PhysDecodeLevel,
    is_open: bool,
}

impl<P, C> SerialTransport<P, C>
where
    P: SerialPort,
    C: Clock,
{
    pub(crate) fn new(port: P, clock: C, settings: SerialSettings, decode: PhysDecodeLevel) -> Self {
        Self {
            port,
            clock,
            settings,
            decode,
            is_open: false,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.is_open
    }

    pub(crate) fn open(&mut self) -> Result<(), IoFailure> {
        self.port.open(&self.settings)?;
        tracing::debug!(
            "serial port open ({:?}, {} baud)",
            self.settings.protocol,
            self.settings.baud_rate
        );
        self.is_open = true;
        Ok(())
    }

    /// Release the channel. Calling this on a channel that is not open does nothing.
    ///
    /// The channel is considered closed afterwards even if the port reports an error.
    pub(crate) fn close(&mut self) -> Result<(), IoFailure> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        self.port.close()?;
        tracing::debug!("serial port closed");
        Ok(())
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> Result<usize, IoFailure> {
        if !self.is_open {
            return Err(IoFailure::NotOpen);
        }

        if self.decode.enabled() {
            tracing::info!("PHYS TX - {}", PhysDisplay::new(self.decode, data));
        }

        let written = self.port.write(data)?;
        if written != data.len() {
            return Err(IoFailure::ShortWrite {
                written,
                expected: data.len(),
            });
        }
        Ok(written)
    }

    /// Fill `buffer` one byte at a time, returning the number of bytes received
    ///
    /// Stops when the buffer is full, when the receive timeout has elapsed since the
    /// call began, or when at least `min_bytes_before_inter_byte` bytes are buffered
    /// and nothing arrived within the inter-byte timeout.
    pub(crate) fn read(&mut self, buffer: &mut [u8]) -> Result<usize, IoFailure> {
        if !self.is_open {
            return Err(IoFailure::NotOpen);
        }

        let start = self.clock.now();
        let mut last_rx = start;
        let mut count = 0;

        let end = loop {
            let slot = match buffer.get_mut(count..count + 1) {
                Some(x) => x,
                None => break ReadEnd::Capacity,
            };

            let now = self.clock.now();
            if now.saturating_sub(start) >= self.settings.rx_timeout {
                break ReadEnd::Timeout;
            }
            if count >= self.settings.min_bytes_before_inter_byte
                && now.saturating_sub(last_rx) >= self.settings.inter_byte_timeout
            {
                break ReadEnd::Silence;
            }

            match self.port.read(slot) {
                Ok(0) => std::hint::spin_loop(),
                Ok(_) => {
                    count += 1;
                    last_rx = self.clock.now();
                }
                Err(err) if is_transient(err.kind()) => {}
                Err(err) => return Err(err.into()),
            }
        };

        tracing::trace!(
            "serial read stopped ({:?}) after {} ms with {} bytes",
            end,
            self.clock.now().saturating_sub(start).as_millis(),
            count
        );

        if self.decode.enabled() {
            if let Some(data) = buffer.get(..count) {
                tracing::info!("PHYS RX - {}", PhysDisplay::new(self.decode, data));
            }
        }

        Ok(count)
    }

    #[cfg(test)]
    pub(crate) fn port(&self) -> &P {
        &self.port
    }
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

use crate::client::channel::{decode_temperature, RegisterReader};
use crate::error::RequestError;
use crate::types::{AddressRange, Temperature, UnitId};

/// Inclusive range of slave addresses probed by a scan
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScanRange {
    /// first address probed
    pub min: UnitId,
    /// last address probed
    pub max: UnitId,
}

impl ScanRange {
    /// create a range from `min` to `max`, both inclusive
    ///
    /// A range where `min > max` is empty and every scan of it fails with
    /// [`RequestError::NotFound`].
    pub const fn new(min: UnitId, max: UnitId) -> Self {
        Self { min, max }
    }
}

impl Default for ScanRange {
    fn default() -> Self {
        Self::new(
            crate::constants::scan::SLAVE_MIN,
            crate::constants::scan::SLAVE_MAX,
        )
    }
}

impl std::fmt::Display for ScanRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// First sensor that answered a scan with a meaningful reading
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiscoveredSensor {
    /// slave address the sensor answered on
    pub unit_id: UnitId,
    /// temperature it reported
    pub temperature: Temperature,
}

/// Probes each address of a [`ScanRange`] in ascending order with a single request
///
/// There is no retry and no power-up zero handling: an address that answers with
/// an all-zero payload, or does not answer correctly, is treated as empty.
pub(crate) struct DeviceScanner {
    range: ScanRange,
    registers: AddressRange,
}

impl DeviceScanner {
    pub(crate) fn new(range: ScanRange, registers: AddressRange) -> Self {
        Self { range, registers }
    }

    pub(crate) fn scan<R>(&self, reader: &mut R) -> Result<DiscoveredSensor, RequestError>
    where
        R: RegisterReader,
    {
        tracing::info!("scanning for temperature sensor on slaves {}", self.range);

        for value in self.range.min.value..=self.range.max.value {
            let unit_id = UnitId::new(value);
            let response = match reader.read_input_registers(unit_id, self.registers) {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!("slave {}: {}", unit_id, err);
                    continue;
                }
            };

            if response.is_zero_reading() {
                tracing::debug!("slave {}: zero reading", unit_id);
                continue;
            }

            let temperature = decode_temperature(&response);
            if temperature.is_valid() {
                tracing::info!("found sensor on slave {}: {}", unit_id, temperature);
                return Ok(DiscoveredSensor {
                    unit_id,
                    temperature,
                });
            }
        }

        tracing::info!("no temperature sensor found on slaves {}", self.range);
        Err(RequestError::NotFound {
            min: self.range.min,
            max: self.range.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::ErrorKind;

    use super::*;
    use crate::error::IoFailure;
    use crate::types::RawResponse;

    const REGISTERS: AddressRange = AddressRange {
        start: 0x0001,
        count: 2,
    };

    /// answers from the addresses in `devices`, every other address times out
    #[derive(Default)]
    struct Bus {
        devices: HashMap<u8, Result<[u8; 4], RequestError>>,
        probed: Vec<u8>,
    }

    impl Bus {
        fn with(mut self, unit: u8, data: [u8; 4]) -> Self {
            self.devices.insert(unit, Ok(data));
            self
        }

        fn failing(mut self, unit: u8, err: RequestError) -> Self {
            self.devices.insert(unit, Err(err));
            self
        }
    }

    impl RegisterReader for Bus {
        fn read_input_registers(
            &mut self,
            unit: UnitId,
            _range: AddressRange,
        ) -> Result<RawResponse, RequestError> {
            self.probed.push(unit.value);
            match self.devices.get(&unit.value) {
                Some(Ok(data)) => Ok(RawResponse::from_slice(data).unwrap()),
                Some(Err(err)) => Err(*err),
                None => Err(IoFailure::NoResponse.into()),
            }
        }
    }

    fn scan(bus: &mut Bus, range: ScanRange) -> Result<DiscoveredSensor, RequestError> {
        DeviceScanner::new(range, REGISTERS).scan(bus)
    }

    #[test]
    fn first_meaningful_reading_wins() {
        let mut bus = Bus::default()
            .with(0x01, [0x00; 4])
            .with(0x02, [0x00; 4])
            .with(0x03, [0x00; 4])
            .with(0x04, [0x00; 4])
            .with(0x05, [0x00, 0x64, 0x00, 0x00])
            .with(0x06, [0x00, 0x19, 0x00, 0x00]);

        assert_eq!(
            scan(&mut bus, ScanRange::default()),
            Ok(DiscoveredSensor {
                unit_id: UnitId::new(0x05),
                temperature: Temperature::from_celsius(10.0),
            })
        );
        assert_eq!(bus.probed, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn errors_mean_no_device_at_that_address() {
        let mut bus = Bus::default()
            .failing(
                0x01,
                RequestError::Io(IoFailure::Transport(ErrorKind::BrokenPipe)),
            )
            .with(0x02, [0xFF, 0xF6, 0x00, 0x00]);

        assert_eq!(
            scan(&mut bus, ScanRange::default()),
            Ok(DiscoveredSensor {
                unit_id: UnitId::new(0x02),
                temperature: Temperature::from_celsius(-1.0),
            })
        );
    }

    #[test]
    fn exhausted_range_is_not_found() {
        let mut bus = Bus::default().with(0x03, [0x00; 4]).with(0x10, [0x00, 0x64, 0x00, 0x00]);

        assert_eq!(
            scan(&mut bus, ScanRange::default()),
            Err(RequestError::NotFound {
                min: UnitId::new(0x01),
                max: UnitId::new(0x0F),
            })
        );
        assert_eq!(bus.probed, (0x01..=0x0F).collect::<Vec<u8>>());
    }

    #[test]
    fn empty_range_probes_nothing() {
        let mut bus = Bus::default().with(0x05, [0x00, 0x64, 0x00, 0x00]);
        let range = ScanRange::new(UnitId::new(0x06), UnitId::new(0x05));

        assert_eq!(
            scan(&mut bus, range),
            Err(RequestError::NotFound {
                min: UnitId::new(0x06),
                max: UnitId::new(0x05),
            })
        );
        assert!(bus.probed.is_empty());
    }

    #[test]
    fn range_may_include_the_highest_address() {
        let mut bus = Bus::default().with(0xFF, [0x00, 0x01, 0x00, 0x00]);
        let range = ScanRange::new(UnitId::new(0xFE), UnitId::new(0xFF));

        assert_eq!(
            scan(&mut bus, range).map(|found| found.unit_id),
            Ok(UnitId::new(0xFF))
        );
    }
}

//! Sensor value decoding
//! Characteristic values are little-endian buffers: the calibration value is a
//! single `f64`, sensor samples are a run of `i16`.

use crate::core::bluetooth::constants::{BATTERY_DIVISOR, TEMPERATURE_DIVISOR};
use crate::error::ProbeError;

pub const TEMPERATURE: SensorChannel = SensorChannel::new("Temperature", TEMPERATURE_DIVISOR);
pub const BATTERY: SensorChannel = SensorChannel::new("Battery", BATTERY_DIVISOR);

/// Decodes every complete little-endian `i16` in `data`.
/// A trailing odd byte is ignored.
pub fn decode_i16_le(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Decodes the leading little-endian `f64` of `data`
pub fn decode_f64_le(data: &[u8]) -> Result<f64, ProbeError> {
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|head| head.try_into().ok())
        .ok_or_else(|| {
            ProbeError::Decode(format!(
                "calibration value needs 8 bytes, got {} ({:02x?})",
                data.len(),
                data
            ))
        })?;
    Ok(f64::from_le_bytes(bytes))
}

/// A polled sensor value and how to scale its raw samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorChannel {
    pub label: &'static str,
    pub divisor: i16,
}

impl SensorChannel {
    pub const fn new(label: &'static str, divisor: i16) -> Self {
        Self { label, divisor }
    }

    /// Decodes a raw buffer into readings. Scaling truncates toward zero.
    pub fn readings(&self, data: &[u8]) -> Vec<SensorReading> {
        decode_i16_le(data)
            .into_iter()
            .map(|raw| SensorReading {
                raw,
                scaled: raw / self.divisor,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub raw: i16,
    pub scaled: i16,
}

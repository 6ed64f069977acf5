//! # SoC Topology
//!
//! Static description of the chip being sampled: the discrete operating frequencies of each
//! frequency domain and the number of cores per cluster. It is discovered once when a sampler is
//! constructed and never changes afterwards.
//!
//! The frequency tables are stored by the power manager as packed 8-byte records (frequency then
//! voltage, both little-endian `u32`). Chips up to the M3 generation store the frequency in Hz,
//! later chips in kHz; [`frequency_scale`] picks the divisor that turns either into MHz.

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::error::{Error, Result};

/// Divisor turning a Hz table entry into MHz
pub const HZ_SCALE: u32 = 1_000_000;

/// Divisor turning a kHz table entry into MHz
pub const KHZ_SCALE: u32 = 1_000;

const RECORD_LEN: usize = 8;

/// Static chip description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocInfo {
    /// Marketing name, e.g. "Apple M2 Pro"
    pub chip_name: String,
    /// Efficiency-cluster operating points in MHz, ascending
    pub e_cpu_freqs: Vec<u32>,
    /// Performance-cluster operating points in MHz, ascending
    pub p_cpu_freqs: Vec<u32>,
    /// GPU operating points in MHz, ascending; entry 0 is not a usable operating point
    pub gpu_freqs: Vec<u32>,
    pub e_cores: usize,
    pub p_cores: usize,
    pub gpu_cores: usize,
    /// Installed memory in GB
    pub memory_gb: u64,
}

impl SocInfo {
    /// Check that every table can feed the frequency estimator.
    ///
    /// The GPU table needs one extra entry because its first state is dropped before estimation.
    pub fn validate(&self) -> Result<()> {
        for table in [&self.e_cpu_freqs, &self.p_cpu_freqs] {
            if table.len() < 2 {
                return Err(Error::InsufficientFrequencyTable { len: table.len() });
            }
        }
        if self.gpu_freqs.len() < 3 {
            return Err(Error::InsufficientFrequencyTable {
                len: self.gpu_freqs.len().saturating_sub(1),
            });
        }
        Ok(())
    }

    /// GPU operating points without the unusable state 0.
    pub fn usable_gpu_freqs(&self) -> &[u32] {
        self.gpu_freqs.get(1..).unwrap_or(&[])
    }
}

/// One-shot provider of the static chip description.
pub trait TopologyProvider {
    fn discover(&self) -> Result<SocInfo>;
}

/// A topology that is already known, e.g. loaded from a fixture.
impl TopologyProvider for SocInfo {
    fn discover(&self) -> Result<SocInfo> {
        Ok(self.clone())
    }
}

/// Decode a packed voltage-state table into MHz values.
///
/// A trailing partial record is decoded from whatever bytes are present, matching how the power
/// manager pads some tables.
pub fn decode_frequency_table(bytes: &[u8], scale: u32) -> Result<Vec<u32>> {
    if scale == 0 {
        return Err(Error::invalid_data("frequency scale must not be zero"));
    }

    Ok(bytes
        .chunks(RECORD_LEN)
        .map(|chunk| {
            let mut raw = [0u8; 4];
            let len = chunk.len().min(4);
            raw[..len].copy_from_slice(&chunk[..len]);
            u32::from_le_bytes(raw) / scale
        })
        .collect())
}

/// Pick the table divisor for a chip name.
///
/// M1 through M3 chips report Hz, newer generations report kHz.
pub fn frequency_scale(chip_name: &str) -> u32 {
    if is_hz_generation(chip_name) {
        HZ_SCALE
    } else {
        KHZ_SCALE
    }
}

fn is_hz_generation(chip_name: &str) -> bool {
    chip_name
        .as_bytes()
        .windows(2)
        .any(|pair| matches!(pair[0], b'm' | b'M') && matches!(pair[1], b'1'..=b'3'))
}

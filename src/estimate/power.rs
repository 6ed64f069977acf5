use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// Unit an energy channel declares for its counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    MilliJoules,
    MicroJoules,
    NanoJoules,
}

impl EnergyUnit {
    /// Divisor bringing a per-second rate in this unit onto the common output scale.
    pub fn divisor(self) -> f64 {
        match self {
            EnergyUnit::MilliJoules => 1e3,
            EnergyUnit::MicroJoules => 1e6,
            EnergyUnit::NanoJoules => 1e9,
        }
    }
}

impl FromStr for EnergyUnit {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        match label.trim() {
            "mJ" => Ok(EnergyUnit::MilliJoules),
            "uJ" | "µJ" => Ok(EnergyUnit::MicroJoules),
            "nJ" => Ok(EnergyUnit::NanoJoules),
            other => Err(Error::InvalidEnergyUnit(other.to_string())),
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnergyUnit::MilliJoules => "mJ",
            EnergyUnit::MicroJoules => "uJ",
            EnergyUnit::NanoJoules => "nJ",
        };
        f.write_str(label)
    }
}

/// Average power of an energy delta over the elapsed window.
///
/// An empty window yields 0.
pub fn estimate(energy: i64, unit: EnergyUnit, elapsed: Duration) -> f32 {
    let seconds = elapsed.as_millis() as f64 / 1000.0;
    if seconds == 0.0 {
        return 0.0;
    }

    let rate = energy as f64 / seconds;
    (rate / unit.divisor()) as f32
}

/// Like [`estimate`], but takes the unit label as reported by the channel.
///
/// Unknown labels are logged and produce 0 so that one odd channel never stops a cycle.
pub fn estimate_labelled(energy: i64, label: &str, elapsed: Duration) -> f32 {
    match label.parse::<EnergyUnit>() {
        Ok(unit) => estimate(energy, unit, elapsed),
        Err(err) => {
            warn!(%err, "reporting zero power for channel");
            0.0
        }
    }
}

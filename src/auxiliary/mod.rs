//! # Auxiliary Readers
//!
//! Point-in-time readings that the sampler merges into a reporting cycle without sub-sampling:
//! memory and swap occupancy, total system power, and the cumulative byte counters of network
//! interfaces and drives. The counters are turned into per-cycle deltas by the sampler's
//! [`DeltaTracker`](crate::tracker::DeltaTracker)s.
//!
//! Any read failure aborts the current cycle with
//! [`Error::AuxiliaryReadFailed`](crate::error::Error::AuxiliaryReadFailed).

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use crate::error::Result;
use crate::metrics::MemoryUsage;

pub use crate::metrics::Volume;

/// Cumulative byte counters of one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub upload: u64,
    pub download: u64,
    /// Carries the IPv4 default route. Tunnels and bridges layered on top of it do not.
    pub primary: bool,
}

impl InterfaceCounters {
    pub fn new(name: impl Into<String>, upload: u64, download: u64) -> Self {
        Self { name: name.into(), upload, download, primary: false }
    }

    /// Mark the interface as the one carrying the default route.
    pub fn as_primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// Cumulative byte counters of the drive a volume lives on.
///
/// Several volumes on one drive report the same counters under their own names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveCounters {
    /// BSD name of the volume, as in [`Volume::name`]
    pub name: String,
    pub read: u64,
    pub write: u64,
}

impl DriveCounters {
    pub fn new(name: impl Into<String>, read: u64, write: u64) -> Self {
        Self { name: name.into(), read, write }
    }
}

/// Platform readers for everything the sampler does not take from the counter source.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuxiliaryReaders: Send + Sync {
    /// Re-enumerate mounted volumes. Called first in every cycle.
    async fn refresh_volumes(&self) -> Result<()>;

    /// Volumes found by the last refresh.
    fn volumes(&self) -> Vec<Volume>;

    async fn memory_usage(&self) -> Result<MemoryUsage>;

    async fn swap_usage(&self) -> Result<MemoryUsage>;

    /// Total system power in Watts.
    async fn system_power(&self) -> Result<f32>;

    async fn network_counters(&self) -> Result<Vec<InterfaceCounters>>;

    /// Drive counters for the volumes of the last refresh, keyed by volume name.
    async fn disk_counters(&self) -> Result<Vec<DriveCounters>>;
}

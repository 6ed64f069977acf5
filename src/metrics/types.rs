use serde::Serialize;

/// Average frequency and utilization of one frequency domain (a core, a cluster or the GPU).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClusterUsage {
    /// Residency-weighted average frequency in MHz
    pub freq_mhz: u32,
    /// Utilization fraction between 0.0 and 1.0, weighted by distance to the top frequency
    pub utilization: f32,
}

impl ClusterUsage {
    pub fn new(freq_mhz: u32, utilization: f32) -> Self {
        Self { freq_mhz, utilization }
    }
}

/// Used and total bytes of a memory pool (RAM or swap).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub used: u64,
    pub total: u64,
}

impl MemoryUsage {
    pub fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Build RAM usage from VM page counts. Active, wired and compressed pages count as used.
    pub fn from_page_counts(active: u64, wired: u64, compressed: u64, page_size: u64, total: u64) -> Self {
        let used = active
            .saturating_add(wired)
            .saturating_add(compressed)
            .saturating_mul(page_size);
        Self { used, total }
    }
}

/// Bytes moved over the network during one reporting cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkUsage {
    pub upload: i64,
    pub download: i64,
}

/// Bytes read from and written to one drive during one reporting cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskIo {
    pub read: i64,
    pub write: i64,
}

/// A mounted volume with its capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    /// BSD device name, e.g. `disk3s1s1`
    pub name: String,
    pub mount_point: String,
    pub total: u64,
    pub free: u64,
}

impl Volume {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

//! # Metrics Record
//!
//! [`Metrics`] is the single value handed to rendering once per reporting cycle. It carries
//! cluster and GPU frequency residency figures, per-core utilization, power estimates and the
//! point-in-time auxiliary readings (memory, swap, network and disk deltas, mounted volumes).
//!
//! A `Metrics` value is immutable once built. `all_power` is derived from the CPU, GPU and ANE
//! power figures when the record is constructed through [`MetricsBuilder::build`].
//!
//! ## Example
//!
//! ```rust
//! use statsbar::metrics::{ClusterUsage, Metrics};
//!
//! let metrics = Metrics::builder()
//!     .e_cpu_usage(ClusterUsage::new(1020, 0.25))
//!     .p_cpu_usage(ClusterUsage::new(3204, 0.75))
//!     .cpu_power(1.5)
//!     .gpu_power(0.5)
//!     .build();
//!
//! assert_eq!(metrics.all_power(), 2.0);
//! assert_eq!(metrics.cpu_usage_percent(), 50.0);
//! ```

mod types;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use serde::Serialize;

pub use types::{ClusterUsage, DiskIo, MemoryUsage, NetworkUsage, Volume};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One reporting-interval snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    e_cpu_usage: ClusterUsage,
    p_cpu_usage: ClusterUsage,
    e_cores: Vec<f32>,
    p_cores: Vec<f32>,
    gpu_usage: ClusterUsage,
    cpu_power: f32,
    gpu_power: f32,
    ane_power: f32,
    all_power: f32,
    sys_power: f32,
    mem_usage: MemoryUsage,
    swap_usage: MemoryUsage,
    network_usage: NetworkUsage,
    disk_usage: HashMap<String, DiskIo>,
    volumes: Vec<Volume>,
}

impl Metrics {
    pub fn builder() -> MetricsBuilder {
        MetricsBuilder::default()
    }

    /// Start a new builder carrying every field of this record.
    pub fn into_builder(self) -> MetricsBuilder {
        MetricsBuilder {
            e_cpu_usage: self.e_cpu_usage,
            p_cpu_usage: self.p_cpu_usage,
            e_cores: self.e_cores,
            p_cores: self.p_cores,
            gpu_usage: self.gpu_usage,
            cpu_power: self.cpu_power,
            gpu_power: self.gpu_power,
            ane_power: self.ane_power,
            sys_power: self.sys_power,
            mem_usage: self.mem_usage,
            swap_usage: self.swap_usage,
            network_usage: self.network_usage,
            disk_usage: self.disk_usage,
            volumes: self.volumes,
        }
    }

    pub fn e_cpu_usage(&self) -> ClusterUsage {
        self.e_cpu_usage
    }

    pub fn p_cpu_usage(&self) -> ClusterUsage {
        self.p_cpu_usage
    }

    /// Per-core utilization of the efficiency cluster, in core order
    pub fn e_cores(&self) -> &[f32] {
        &self.e_cores
    }

    /// Per-core utilization of the performance cluster, in core order
    pub fn p_cores(&self) -> &[f32] {
        &self.p_cores
    }

    pub fn gpu_usage(&self) -> ClusterUsage {
        self.gpu_usage
    }

    pub fn cpu_power(&self) -> f32 {
        self.cpu_power
    }

    pub fn gpu_power(&self) -> f32 {
        self.gpu_power
    }

    pub fn ane_power(&self) -> f32 {
        self.ane_power
    }

    /// CPU + GPU + ANE power, fixed when the record was built
    pub fn all_power(&self) -> f32 {
        self.all_power
    }

    /// Total system power in Watts, read separately from the SMC
    pub fn sys_power(&self) -> f32 {
        self.sys_power
    }

    pub fn mem_usage(&self) -> MemoryUsage {
        self.mem_usage
    }

    pub fn swap_usage(&self) -> MemoryUsage {
        self.swap_usage
    }

    pub fn network_usage(&self) -> NetworkUsage {
        self.network_usage
    }

    pub fn disk_usage(&self) -> &HashMap<String, DiskIo> {
        &self.disk_usage
    }

    /// Volumes mounted when the cycle started
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// E and P cluster frequencies in GHz.
    pub fn cpu_freqs_ghz(&self) -> [f64; 2] {
        [
            f64::from(self.e_cpu_usage.freq_mhz) / 1000.0,
            f64::from(self.p_cpu_usage.freq_mhz) / 1000.0,
        ]
    }

    /// Mean of the E and P cluster utilizations, as a percentage.
    pub fn cpu_usage_percent(&self) -> f64 {
        let e_cpu = f64::from(self.e_cpu_usage.utilization) * 100.0;
        let p_cpu = f64::from(self.p_cpu_usage.utilization) * 100.0;
        (e_cpu + p_cpu) / 2.0
    }

    /// `[utilization %, frequency GHz]` for the efficiency cluster.
    pub fn e_cpu_info(&self) -> [f64; 2] {
        cluster_info(self.e_cpu_usage)
    }

    /// `[utilization %, frequency GHz]` for the performance cluster.
    pub fn p_cpu_info(&self) -> [f64; 2] {
        cluster_info(self.p_cpu_usage)
    }

    pub fn gpu_freq_ghz(&self) -> f64 {
        f64::from(self.gpu_usage.freq_mhz) / 1000.0
    }

    pub fn gpu_usage_percent(&self) -> f64 {
        f64::from(self.gpu_usage.utilization) * 100.0
    }

    pub fn mem_used_gib(&self) -> f64 {
        self.mem_usage.used as f64 / GIB
    }

    /// Installed memory in whole GiB.
    pub fn total_memory_gib(&self) -> u64 {
        self.mem_usage.total / 1024 / 1024 / 1024
    }

    pub fn mem_usage_percent(&self) -> f64 {
        let total = self.total_memory_gib();
        if total == 0 {
            return 0.0;
        }
        self.mem_used_gib() * 100.0 / total as f64
    }

    pub fn swap_used_gib(&self) -> f64 {
        self.swap_usage.used as f64 / GIB
    }

    /// Swap size in whole GiB.
    pub fn total_swap_gib(&self) -> u64 {
        self.swap_usage.total / 1024 / 1024 / 1024
    }

    pub fn swap_usage_percent(&self) -> f64 {
        let used = self.swap_used_gib();
        let total = self.total_swap_gib();
        if used.is_nan() || used <= 0.0 || total == 0 {
            return 0.0;
        }
        used * 100.0 / total as f64
    }

    /// Bytes read through volume `key` during the cycle; 0 for volumes that were not reported.
    pub fn disk_read(&self, key: &str) -> i64 {
        self.disk_usage.get(key).map_or(0, |io| io.read)
    }

    /// Bytes written through volume `key` during the cycle; 0 for volumes that were not reported.
    pub fn disk_write(&self, key: &str) -> i64 {
        self.disk_usage.get(key).map_or(0, |io| io.write)
    }
}

fn cluster_info(usage: ClusterUsage) -> [f64; 2] {
    [
        f64::from(usage.utilization) * 100.0,
        f64::from(usage.freq_mhz) / 1000.0,
    ]
}

/// Builder for [`Metrics`]; `build` derives `all_power`.
#[derive(Debug, Clone, Default)]
pub struct MetricsBuilder {
    e_cpu_usage: ClusterUsage,
    p_cpu_usage: ClusterUsage,
    e_cores: Vec<f32>,
    p_cores: Vec<f32>,
    gpu_usage: ClusterUsage,
    cpu_power: f32,
    gpu_power: f32,
    ane_power: f32,
    sys_power: f32,
    mem_usage: MemoryUsage,
    swap_usage: MemoryUsage,
    network_usage: NetworkUsage,
    disk_usage: HashMap<String, DiskIo>,
    volumes: Vec<Volume>,
}

impl MetricsBuilder {
    pub fn e_cpu_usage(mut self, usage: ClusterUsage) -> Self {
        self.e_cpu_usage = usage;
        self
    }

    pub fn p_cpu_usage(mut self, usage: ClusterUsage) -> Self {
        self.p_cpu_usage = usage;
        self
    }

    pub fn e_cores(mut self, cores: Vec<f32>) -> Self {
        self.e_cores = cores;
        self
    }

    pub fn p_cores(mut self, cores: Vec<f32>) -> Self {
        self.p_cores = cores;
        self
    }

    pub fn gpu_usage(mut self, usage: ClusterUsage) -> Self {
        self.gpu_usage = usage;
        self
    }

    pub fn cpu_power(mut self, power: f32) -> Self {
        self.cpu_power = power;
        self
    }

    pub fn gpu_power(mut self, power: f32) -> Self {
        self.gpu_power = power;
        self
    }

    pub fn ane_power(mut self, power: f32) -> Self {
        self.ane_power = power;
        self
    }

    pub fn sys_power(mut self, power: f32) -> Self {
        self.sys_power = power;
        self
    }

    pub fn mem_usage(mut self, usage: MemoryUsage) -> Self {
        self.mem_usage = usage;
        self
    }

    pub fn swap_usage(mut self, usage: MemoryUsage) -> Self {
        self.swap_usage = usage;
        self
    }

    pub fn network_usage(mut self, usage: NetworkUsage) -> Self {
        self.network_usage = usage;
        self
    }

    pub fn disk_usage(mut self, usage: HashMap<String, DiskIo>) -> Self {
        self.disk_usage = usage;
        self
    }

    pub fn volumes(mut self, volumes: Vec<Volume>) -> Self {
        self.volumes = volumes;
        self
    }

    pub fn build(self) -> Metrics {
        Metrics {
            e_cpu_usage: self.e_cpu_usage,
            p_cpu_usage: self.p_cpu_usage,
            e_cores: self.e_cores,
            p_cores: self.p_cores,
            gpu_usage: self.gpu_usage,
            cpu_power: self.cpu_power,
            gpu_power: self.gpu_power,
            ane_power: self.ane_power,
            all_power: self.cpu_power + self.gpu_power + self.ane_power,
            sys_power: self.sys_power,
            mem_usage: self.mem_usage,
            swap_usage: self.swap_usage,
            network_usage: self.network_usage,
            disk_usage: self.disk_usage,
            volumes: self.volumes,
        }
    }
}

/// Render a per-second byte count the way the menu bar shows it.
pub fn format_rate(bytes: i64) -> String {
    const KIB: i64 = 1_024;
    const MIB: i64 = KIB * 1_024;
    const GIB_BYTES: i64 = MIB * 1_024;

    let kilobytes = bytes as f64 / KIB as f64;
    let megabytes = kilobytes / 1_024.0;
    let gigabytes = megabytes / 1_024.0;

    if (0..KIB).contains(&bytes) {
        "0 KB/s".to_string()
    } else if (KIB..MIB).contains(&bytes) {
        format!("{kilobytes:.0} KB/s")
    } else if (MIB..MIB * 100).contains(&bytes) {
        format!("{megabytes:.1} MB/s")
    } else if (MIB * 100..GIB_BYTES).contains(&bytes) {
        format!("{megabytes:.0} MB/s")
    } else if bytes >= GIB_BYTES {
        format!("{gigabytes:.1} GB/s")
    } else {
        // negative input
        format!("{kilobytes:.0} KB/s")
    }
}

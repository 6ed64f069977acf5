#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use statsbar::auxiliary::{AuxiliaryReaders, DriveCounters, InterfaceCounters, Volume};
use statsbar::metrics::MemoryUsage;
use statsbar::soc::SocInfo;
use statsbar::source::{
    CounterSource, Residency, Sample, CPU_CORE_SUBGROUP, CPU_GROUP, ENERGY_GROUP, GPU_GROUP, GPU_SUBGROUP,
};
use statsbar::{Error, Result};

pub const GB: u64 = 1024 * 1024 * 1024;

/// An M1-like chip with one E core and two P cores
pub fn create_test_soc() -> SocInfo {
    SocInfo {
        chip_name: "Apple M1".to_string(),
        e_cpu_freqs: vec![600, 2000],
        p_cpu_freqs: vec![1000, 3000],
        gpu_freqs: vec![0, 400, 1200],
        e_cores: 1,
        p_cores: 2,
        gpu_cores: 8,
        memory_gb: 16,
    }
}

pub fn core(channel: &str, states: &[(&str, i64)]) -> Sample {
    let states = states.iter().map(|(name, ticks)| Residency::new(*name, *ticks)).collect();
    Sample::residency(CPU_GROUP, CPU_CORE_SUBGROUP, channel, states)
}

pub fn gpu(states: &[(&str, i64)]) -> Sample {
    let states = states.iter().map(|(name, ticks)| Residency::new(*name, *ticks)).collect();
    Sample::residency(GPU_GROUP, GPU_SUBGROUP, "GPUPH", states)
}

pub fn energy(channel: &str, unit: &str, value: i64) -> Sample {
    Sample::energy(ENERGY_GROUP, "", channel, unit, value)
}

/// Every domain busy at its top operating point.
pub fn busy_frame() -> Vec<Sample> {
    vec![
        core("ECPU000", &[("IDLE", 50), ("V0P0", 50), ("V1P1", 0)]),
        core("PCPU000", &[("IDLE", 0), ("V0P0", 0), ("V1P1", 100)]),
        core("PCPU010", &[("IDLE", 0), ("V0P0", 0), ("V1P1", 100)]),
        gpu(&[("OFF", 0), ("P1", 0), ("P2", 100)]),
        energy("CPU Energy", "mJ", 100),
        energy("GPU Energy", "uJ", 50_000),
        energy("ANE0", "mJ", 25),
    ]
}

/// Every domain idle, no energy spent.
pub fn idle_frame() -> Vec<Sample> {
    vec![
        core("ECPU000", &[("IDLE", 100), ("V0P0", 0), ("V1P1", 0)]),
        core("PCPU000", &[("IDLE", 100), ("V0P0", 0), ("V1P1", 0)]),
        core("PCPU010", &[("IDLE", 100), ("V0P0", 0), ("V1P1", 0)]),
        gpu(&[("OFF", 100), ("P1", 0), ("P2", 0)]),
        energy("CPU Energy", "mJ", 0),
        energy("GPU Energy", "uJ", 0),
        energy("ANE0", "mJ", 0),
    ]
}

/// Hands out the scripted frames in order, one per delta, repeating the last one.
pub struct ScriptedSource {
    frames: Vec<Vec<Sample>>,
    deltas: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Vec<Sample>>) -> Self {
        Self { frames, deltas: AtomicUsize::new(0) }
    }
}

impl CounterSource for ScriptedSource {
    type Snapshot = ();

    fn snapshot(&self) -> Result<()> {
        Ok(())
    }

    fn delta(&self, _previous: &(), _current: &()) -> Result<Vec<Sample>> {
        let index = self.deltas.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .frames
            .get(index)
            .or_else(|| self.frames.last())
            .cloned()
            .unwrap_or_default())
    }
}

/// Deterministic auxiliary readings. Network and disk counters grow by `traffic_step` bytes per read.
pub struct FakeAuxiliary {
    traffic_step: u64,
    network_reads: AtomicUsize,
    disk_reads: AtomicUsize,
    fail_memory_on: Option<usize>,
    memory_reads: AtomicUsize,
    refresh_delay: Duration,
    volumes: Mutex<Vec<Volume>>,
}

impl FakeAuxiliary {
    pub fn new() -> Self {
        Self {
            traffic_step: 1000,
            network_reads: AtomicUsize::new(0),
            disk_reads: AtomicUsize::new(0),
            fail_memory_on: None,
            memory_reads: AtomicUsize::new(0),
            refresh_delay: Duration::ZERO,
            volumes: Mutex::new(Vec::new()),
        }
    }

    /// Make every volume refresh take `delay`.
    pub fn slow_volumes(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Fail the `read`-th memory read, counting from 1.
    pub fn failing_memory_on(mut self, read: usize) -> Self {
        self.fail_memory_on = Some(read);
        self
    }
}

impl Default for FakeAuxiliary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuxiliaryReaders for FakeAuxiliary {
    async fn refresh_volumes(&self) -> Result<()> {
        tokio::time::sleep(self.refresh_delay).await;
        *self.volumes.lock() = vec![Volume {
            name: "disk3s1s1".to_string(),
            mount_point: "/".to_string(),
            total: 500 * GB,
            free: 120 * GB,
        }];
        Ok(())
    }

    fn volumes(&self) -> Vec<Volume> {
        self.volumes.lock().clone()
    }

    async fn memory_usage(&self) -> Result<MemoryUsage> {
        let read = self.memory_reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_memory_on == Some(read) {
            return Err(Error::AuxiliaryReadFailed("host_statistics64 failed".to_string()));
        }
        Ok(MemoryUsage::new(6 * GB, 16 * GB))
    }

    async fn swap_usage(&self) -> Result<MemoryUsage> {
        Ok(MemoryUsage::new(GB, 2 * GB))
    }

    async fn system_power(&self) -> Result<f32> {
        Ok(7.5)
    }

    async fn network_counters(&self) -> Result<Vec<InterfaceCounters>> {
        let reads = self.network_reads.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        Ok(vec![
            InterfaceCounters::new("en0", reads * self.traffic_step, reads * self.traffic_step * 2).as_primary(),
            InterfaceCounters::new("utun3", reads * self.traffic_step, reads * self.traffic_step),
            InterfaceCounters::new("lo0", reads * 99, reads * 99),
        ])
    }

    async fn disk_counters(&self) -> Result<Vec<DriveCounters>> {
        let reads = self.disk_reads.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        Ok(self
            .volumes
            .lock()
            .iter()
            .map(|volume| DriveCounters::new(volume.name.clone(), reads * 4096, 8192))
            .collect())
    }
}

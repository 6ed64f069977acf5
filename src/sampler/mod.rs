//! # Sampler
//!
//! One [`Sampler`] drives one sampling session. Construction acquires everything that is fixed
//! for the session (the counter source, the chip topology, the auxiliary readers) and fails if
//! any of it is unusable. Each [`Sampler::get_metrics`] call then runs one reporting cycle:
//!
//! 1. refresh the volume list while
//! 2. taking `measures` sub-samples, `duration / measures` apart, each diffed against the previous
//!    raw snapshot,
//! 3. classify every channel delta and feed it to the frequency or power estimator,
//! 4. merge the sub-samples with the [`Aggregator`],
//! 5. overlay memory, swap, system power and the network and disk byte deltas.
//!
//! The raw snapshot that closes a cycle is the baseline of the next one, so consecutive cycles
//! cover contiguous windows. The very first sub-sample of a session diffs against a snapshot
//! taken at the start of the call. A failed cycle drops the baseline; the next call starts over.
//!
//! `get_metrics` takes `&mut self`, so calls on one sampler are serialized by construction.


use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use crate::aggregate::Aggregator;
use crate::auxiliary::{AuxiliaryReaders, DriveCounters, InterfaceCounters, Volume};
use crate::config::SamplerConfig;
use crate::error::Result;
use crate::estimate::{frequency, power};
use crate::metrics::{ClusterUsage, DiskIo, Metrics, NetworkUsage};
use crate::soc::{SocInfo, TopologyProvider};
use crate::source::{ChannelClassifier, ChannelKind, Cluster, CounterSource, Sample, SamplePayload};
use crate::tracker::DuplexTracker;

/// Orchestrates reporting cycles over one counter source.
pub struct Sampler<S: CounterSource, A: AuxiliaryReaders> {
    source: S,
    soc: SocInfo,
    aux: A,
    config: SamplerConfig,
    classifier: ChannelClassifier,
    aggregator: Aggregator,
    baseline: Option<(S::Snapshot, Instant)>,
    network: DuplexTracker,
    disks: DuplexTracker,
}

impl<S: CounterSource, A: AuxiliaryReaders> Sampler<S, A> {
    /// Build a sampler from an already discovered topology.
    pub fn new(source: S, soc: SocInfo, aux: A, config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        soc.validate()?;

        let aggregator = Aggregator::new(soc.e_cores, soc.p_cores);
        Ok(Self {
            source,
            soc,
            aux,
            config,
            classifier: ChannelClassifier::new(),
            aggregator,
            baseline: None,
            network: DuplexTracker::new(),
            disks: DuplexTracker::new(),
        })
    }

    /// Build a sampler, discovering the topology through `topology`.
    pub fn with_topology<T>(source: S, topology: &T, aux: A, config: SamplerConfig) -> Result<Self>
    where
        T: TopologyProvider + ?Sized,
    {
        let soc = topology.discover()?;
        Self::new(source, soc, aux, config)
    }

    pub fn soc(&self) -> &SocInfo {
        &self.soc
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn auxiliary(&self) -> &A {
        &self.aux
    }

    /// Run one reporting cycle.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_metrics(&mut self) -> Result<Metrics> {
        let result = self.run_cycle().await;
        if result.is_err() {
            self.baseline = None;
        }
        result
    }

    async fn run_cycle(&mut self) -> Result<Metrics> {
        let baseline = self.baseline.take();
        // volume enumeration can stall on slow mounts and must not delay the sub-samples
        let ((), (sub_samples, closing)) =
            futures::try_join!(self.aux.refresh_volumes(), self.sub_sample_window(baseline))?;
        self.baseline = Some(closing);

        let merged = self.aggregator.aggregate(&sub_samples);

        let (mem_usage, swap_usage, sys_power, interfaces, drives) = futures::try_join!(
            self.aux.memory_usage(),
            self.aux.swap_usage(),
            self.aux.system_power(),
            self.aux.network_counters(),
            self.aux.disk_counters()
        )?;

        let volumes = self.aux.volumes();
        let network_usage = network_usage(&mut self.network, self.config.network_interface.as_deref(), &interfaces);
        let disk_usage = disk_usage(&mut self.disks, &drives, &volumes);

        let metrics = merged
            .into_builder()
            .mem_usage(mem_usage)
            .swap_usage(swap_usage)
            .sys_power(sys_power)
            .network_usage(network_usage)
            .disk_usage(disk_usage)
            .volumes(volumes)
            .build();

        debug!(
            e_cpu_mhz = metrics.e_cpu_usage().freq_mhz,
            p_cpu_mhz = metrics.p_cpu_usage().freq_mhz,
            gpu_mhz = metrics.gpu_usage().freq_mhz,
            all_power = metrics.all_power(),
            "cycle complete"
        );
        Ok(metrics)
    }

    /// Take `measures` sub-samples starting from `baseline`, returning them with the closing snapshot.
    async fn sub_sample_window(
        &self,
        baseline: Option<(S::Snapshot, Instant)>,
    ) -> Result<(Vec<Metrics>, (S::Snapshot, Instant))> {
        let interval = self.config.sub_sample_interval();
        let (mut previous, mut taken_at) = match baseline {
            Some(baseline) => baseline,
            None => (self.source.snapshot()?, Instant::now()),
        };

        let mut sub_samples = Vec::with_capacity(self.config.measures as usize);
        for _ in 0..self.config.measures {
            tokio::time::sleep(interval).await;

            let current = self.source.snapshot()?;
            let now = Instant::now();
            let samples = self.source.delta(&previous, &current)?;
            sub_samples.push(self.sub_sample(&samples, now.duration_since(taken_at))?);

            previous = current;
            taken_at = now;
        }
        Ok((sub_samples, (previous, taken_at)))
    }

    /// Turn the channel deltas of one sub-sample into a partial record.
    fn sub_sample(&self, samples: &[Sample], elapsed: Duration) -> Result<Metrics> {
        let mut e_cores: Vec<ClusterUsage> = Vec::with_capacity(self.soc.e_cores);
        let mut p_cores: Vec<ClusterUsage> = Vec::with_capacity(self.soc.p_cores);
        let mut gpu_usage = ClusterUsage::default();
        let mut cpu_power = 0.0f32;
        let mut gpu_power = 0.0f32;
        let mut ane_power = 0.0f32;

        for sample in samples {
            let Some(kind) = self.classifier.kind_of(&sample.group, &sample.subgroup, &sample.channel) else {
                trace!(group = %sample.group, subgroup = %sample.subgroup, channel = %sample.channel, "skipping unclassified channel");
                continue;
            };

            match (kind, &sample.payload) {
                (ChannelKind::CoreResidency(Cluster::Efficiency), SamplePayload::Residency(states)) => {
                    e_cores.push(frequency::estimate(states, &self.soc.e_cpu_freqs)?);
                },
                (ChannelKind::CoreResidency(Cluster::Performance), SamplePayload::Residency(states)) => {
                    p_cores.push(frequency::estimate(states, &self.soc.p_cpu_freqs)?);
                },
                (ChannelKind::ComplexResidency(_), _) => {},
                (ChannelKind::GpuResidency, SamplePayload::Residency(states)) => {
                    gpu_usage = frequency::estimate(states, self.soc.usable_gpu_freqs())?;
                },
                (ChannelKind::CpuEnergy, SamplePayload::Energy(energy)) => {
                    cpu_power += power::estimate_labelled(*energy, &sample.unit, elapsed);
                },
                (ChannelKind::GpuEnergy, SamplePayload::Energy(energy)) => {
                    gpu_power += power::estimate_labelled(*energy, &sample.unit, elapsed);
                },
                (ChannelKind::AneEnergy, SamplePayload::Energy(energy)) => {
                    ane_power += power::estimate_labelled(*energy, &sample.unit, elapsed);
                },
                (kind, _) => {
                    trace!(?kind, channel = %sample.channel, "payload does not match channel kind");
                },
            }
        }

        Ok(Metrics::builder()
            .e_cpu_usage(Aggregator::cluster(&e_cores, &self.soc.e_cpu_freqs))
            .p_cpu_usage(Aggregator::cluster(&p_cores, &self.soc.p_cpu_freqs))
            .e_cores(e_cores.iter().map(|core| core.utilization).collect())
            .p_cores(p_cores.iter().map(|core| core.utilization).collect())
            .gpu_usage(gpu_usage)
            .cpu_power(cpu_power)
            .gpu_power(gpu_power)
            .ane_power(ane_power)
            .build())
    }
}

/// Sum the traffic of the selected interfaces.
///
/// With no interface configured only the interface carrying the default route counts, so VPN
/// tunnels and bridges do not count the same bytes twice. Interfaces that disappeared are
/// forgotten.
fn network_usage(tracker: &mut DuplexTracker, wanted: Option<&str>, interfaces: &[InterfaceCounters]) -> NetworkUsage {
    let selected: Vec<&InterfaceCounters> = interfaces
        .iter()
        .filter(|iface| match wanted {
            Some(name) => iface.name == name,
            None => iface.primary,
        })
        .collect();

    let mut usage = NetworkUsage::default();
    for iface in &selected {
        let (upload, download) = tracker.next(iface.name.as_str(), iface.upload, iface.download);
        usage.upload = usage.upload.saturating_add(upload);
        usage.download = usage.download.saturating_add(download);
    }

    let live: HashSet<&str> = selected.iter().map(|iface| iface.name.as_str()).collect();
    tracker.evict_missing(&live);
    usage
}

/// Per-volume byte deltas. Entries of volumes that are no longer mounted are forgotten.
fn disk_usage(tracker: &mut DuplexTracker, drives: &[DriveCounters], volumes: &[Volume]) -> HashMap<String, DiskIo> {
    let live: HashSet<&str> = volumes.iter().map(|volume| volume.name.as_str()).collect();

    let usage = drives
        .iter()
        .filter(|drive| live.contains(drive.name.as_str()))
        .map(|drive| {
            let (read, write) = tracker.next(drive.name.as_str(), drive.read, drive.write);
            (drive.name.clone(), DiskIo { read, write })
        })
        .collect();

    tracker.evict_missing(&live);
    usage
}

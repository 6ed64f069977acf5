use crate::error::{Error, Result};
use crate::source::{CPU_COMPLEX_SUBGROUP, CPU_CORE_SUBGROUP, CPU_GROUP, ENERGY_GROUP, GPU_GROUP, GPU_SUBGROUP};

/// Core cluster of a heterogeneous CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cluster {
    Efficiency,
    Performance,
}

/// Every channel kind the sampler knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Residency of a single core; the slot is its encounter order within the cluster
    CoreResidency(Cluster),
    /// Residency of a whole cluster complex, reported next to the per-core channels
    ComplexResidency(Cluster),
    GpuResidency,
    CpuEnergy,
    GpuEnergy,
    AneEnergy,
}

impl ChannelKind {
    pub fn is_energy(self) -> bool {
        matches!(self, ChannelKind::CpuEnergy | ChannelKind::GpuEnergy | ChannelKind::AneEnergy)
    }
}

/// Maps (group, subgroup, channel) name triples onto [`ChannelKind`]s.
///
/// The name patterns are fixed. [`kind_of`](Self::kind_of) answers `None` for a channel that
/// matches none of them; [`classify`](Self::classify) reports it as a
/// [`ClassificationMiss`](Error::ClassificationMiss).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelClassifier;

impl ChannelClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Allocation-free lookup for the per-sub-sample path.
    pub fn kind_of(&self, group: &str, subgroup: &str, channel: &str) -> Option<ChannelKind> {
        match (group, subgroup) {
            (CPU_GROUP, CPU_CORE_SUBGROUP) => cluster_of(channel).map(ChannelKind::CoreResidency),
            (CPU_GROUP, CPU_COMPLEX_SUBGROUP) => cluster_of(channel).map(ChannelKind::ComplexResidency),
            (GPU_GROUP, GPU_SUBGROUP) if channel == "GPUPH" => Some(ChannelKind::GpuResidency),
            (ENERGY_GROUP, _) => energy_kind(channel),
            _ => None,
        }
    }

    pub fn classify(&self, group: &str, subgroup: &str, channel: &str) -> Result<ChannelKind> {
        self.kind_of(group, subgroup, channel)
            .ok_or_else(|| Error::classification_miss(group, subgroup, channel))
    }
}

fn cluster_of(channel: &str) -> Option<Cluster> {
    if channel.contains("ECPU") {
        Some(Cluster::Efficiency)
    } else if channel.contains("PCPU") {
        Some(Cluster::Performance)
    } else {
        None
    }
}

fn energy_kind(channel: &str) -> Option<ChannelKind> {
    match channel {
        "CPU Energy" => Some(ChannelKind::CpuEnergy),
        "GPU Energy" => Some(ChannelKind::GpuEnergy),
        _ if channel.starts_with("ANE") => Some(ChannelKind::AneEnergy),
        _ => None,
    }
}

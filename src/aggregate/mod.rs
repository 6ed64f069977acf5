//! # Aggregation
//!
//! Two levels of merging happen in a reporting cycle:
//!
//! 1. Within a sub-sample, the per-core estimates of a cluster are averaged into one cluster
//!    figure ([`Aggregator::cluster`]), floored to the cluster's lowest operating point.
//! 2. Across sub-samples, the per-sub-sample [`Metrics`] are merged into the record of the cycle
//!    ([`Aggregator::aggregate`]). Frequencies and utilizations are averaged; power figures are
//!    summed.

#[cfg(test)]
mod tests;

use crate::metrics::{ClusterUsage, Metrics};

/// Merges sub-sample records for a chip with a fixed core layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    e_cores: usize,
    p_cores: usize,
}

impl Aggregator {
    pub fn new(e_cores: usize, p_cores: usize) -> Self {
        Self { e_cores, p_cores }
    }

    pub fn e_cores(&self) -> usize {
        self.e_cores
    }

    pub fn p_cores(&self) -> usize {
        self.p_cores
    }

    /// Average the per-core estimates of one cluster.
    ///
    /// The frequency is floored to the first entry of `freqs`. A cluster without any core
    /// estimate reports zero for both fields.
    pub fn cluster(cores: &[ClusterUsage], freqs: &[u32]) -> ClusterUsage {
        if cores.is_empty() {
            return ClusterUsage::default();
        }

        let count = cores.len() as f32;
        let avg_freq = cores.iter().map(|core| core.freq_mhz as f32).sum::<f32>() / count;
        let avg_usage = cores.iter().map(|core| core.utilization).sum::<f32>() / count;
        let min_freq = freqs.first().copied().unwrap_or(0) as f32;

        ClusterUsage::new(avg_freq.max(min_freq) as u32, avg_usage)
    }

    /// Merge the sub-samples of one reporting cycle.
    ///
    /// Per-core arrays keep the layout given at construction; a sub-sample with fewer cores than
    /// expected contributes zero for the missing ones. Only the cluster, GPU, per-core and power
    /// fields are merged, auxiliary readings are left at their defaults.
    pub fn aggregate(&self, samples: &[Metrics]) -> Metrics {
        let mut e_cores = vec![0.0f32; self.e_cores];
        let mut p_cores = vec![0.0f32; self.p_cores];

        if samples.is_empty() {
            return Metrics::builder().e_cores(e_cores).p_cores(p_cores).build();
        }

        let count = samples.len();
        for sample in samples {
            accumulate(&mut e_cores, sample.e_cores());
            accumulate(&mut p_cores, sample.p_cores());
        }
        for slot in e_cores.iter_mut().chain(p_cores.iter_mut()) {
            *slot /= count as f32;
        }

        Metrics::builder()
            .e_cpu_usage(mean(samples.iter().map(Metrics::e_cpu_usage), count))
            .p_cpu_usage(mean(samples.iter().map(Metrics::p_cpu_usage), count))
            .gpu_usage(mean(samples.iter().map(Metrics::gpu_usage), count))
            .e_cores(e_cores)
            .p_cores(p_cores)
            .cpu_power(samples.iter().map(Metrics::cpu_power).sum())
            .gpu_power(samples.iter().map(Metrics::gpu_power).sum())
            .ane_power(samples.iter().map(Metrics::ane_power).sum())
            .build()
    }
}

fn accumulate(totals: &mut [f32], cores: &[f32]) {
    for (total, core) in totals.iter_mut().zip(cores) {
        *total += core;
    }
}

fn mean(usages: impl Iterator<Item = ClusterUsage>, count: usize) -> ClusterUsage {
    let (freq, utilization) = usages.fold((0u64, 0.0f32), |(freq, utilization), usage| {
        (freq + u64::from(usage.freq_mhz), utilization + usage.utilization)
    });

    ClusterUsage::new((freq / count as u64) as u32, utilization / count as f32)
}

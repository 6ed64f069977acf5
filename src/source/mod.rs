//! # Counter Sources
//!
//! A [`CounterSource`] hands out raw snapshots of the hardware report channels and turns two of
//! them into a list of [`Sample`]s. Each sample names its channel by a (group, subgroup, channel)
//! triple and carries either a state-residency table or an accumulated energy value.
//!
//! The sampler never looks at the names directly; [`ChannelClassifier`] maps every triple to a
//! closed [`ChannelKind`] once, and everything downstream matches on that enum.

mod classify;

#[cfg(test)]
mod tests;

pub use classify::{ChannelClassifier, ChannelKind, Cluster};

use crate::error::Result;

/// Group holding the energy counters
pub const ENERGY_GROUP: &str = "Energy Model";
/// Group holding CPU residency tables
pub const CPU_GROUP: &str = "CPU Stats";
/// Group holding GPU residency tables
pub const GPU_GROUP: &str = "GPU Stats";

pub const CPU_COMPLEX_SUBGROUP: &str = "CPU Complex Performance States";
pub const CPU_CORE_SUBGROUP: &str = "CPU Core Performance States";
pub const GPU_SUBGROUP: &str = "GPU Performance States";

/// A channel group (optionally narrowed to one subgroup) to subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGroup {
    pub group: &'static str,
    pub subgroup: Option<&'static str>,
}

/// Channel groups the sampler needs.
pub const DEFAULT_CHANNEL_GROUPS: [ChannelGroup; 4] = [
    ChannelGroup { group: ENERGY_GROUP, subgroup: None },
    ChannelGroup { group: CPU_GROUP, subgroup: Some(CPU_COMPLEX_SUBGROUP) },
    ChannelGroup { group: CPU_GROUP, subgroup: Some(CPU_CORE_SUBGROUP) },
    ChannelGroup { group: GPU_GROUP, subgroup: Some(GPU_SUBGROUP) },
];

/// Ticks spent in one named performance or idle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residency {
    pub state: String,
    pub ticks: i64,
}

impl Residency {
    pub fn new(state: impl Into<String>, ticks: i64) -> Self {
        Self { state: state.into(), ticks }
    }
}

/// Delta payload of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplePayload {
    /// Per-state residency, in the order the hardware enumerates its states
    Residency(Vec<Residency>),
    /// Energy accumulated during the window, in the sample's unit
    Energy(i64),
}

/// One channel's delta between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub group: String,
    pub subgroup: String,
    pub channel: String,
    /// Unit label of energy channels ("mJ", "uJ", "nJ"); empty for residency channels
    pub unit: String,
    pub payload: SamplePayload,
}

impl Sample {
    pub fn residency(group: &str, subgroup: &str, channel: &str, states: Vec<Residency>) -> Self {
        Self {
            group: group.to_string(),
            subgroup: subgroup.to_string(),
            channel: channel.to_string(),
            unit: String::new(),
            payload: SamplePayload::Residency(states),
        }
    }

    pub fn energy(group: &str, subgroup: &str, channel: &str, unit: &str, value: i64) -> Self {
        Self {
            group: group.to_string(),
            subgroup: subgroup.to_string(),
            channel: channel.to_string(),
            unit: unit.to_string(),
            payload: SamplePayload::Energy(value),
        }
    }
}

/// Provider of raw counter snapshots.
///
/// Implementations own whatever platform handles the subscription needs and release them when
/// dropped. A source is opened once per sampling session; opening failures surface as
/// [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable).
pub trait CounterSource: Send + Sync {
    /// Opaque point-in-time capture of every subscribed channel
    type Snapshot: Send + Sync;

    fn snapshot(&self) -> Result<Self::Snapshot>;

    /// Structural difference `current - previous`, one entry per channel.
    fn delta(&self, previous: &Self::Snapshot, current: &Self::Snapshot) -> Result<Vec<Sample>>;
}

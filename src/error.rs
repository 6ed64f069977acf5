/// Errors produced by the sampling engine and its platform collaborators.
///
/// Construction-time failures (`SourceUnavailable`, `InsufficientFrequencyTable`) prevent a
/// [`Sampler`](crate::sampler::Sampler) from being built. Per-cycle failures abort only the cycle in
/// which they occur and are handed back to the caller, who decides whether to call again.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Counter source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Frequency table needs at least 2 entries, got {len}")]
    InsufficientFrequencyTable { len: usize },

    #[error("No classification for channel {group}/{subgroup}/{channel}")]
    ClassificationMiss {
        group: String,
        subgroup: String,
        channel: String,
    },

    #[error("Auxiliary read failed: {0}")]
    AuxiliaryReadFailed(String),

    #[error("Invalid energy unit: {0}")]
    InvalidEnergyUnit(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Feature not available: {0}")]
    NotAvailable(String),

    #[error("System call error: {0}")]
    System(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn source_unavailable<S: Into<String>>(msg: S) -> Self {
        Error::SourceUnavailable(msg.into())
    }

    pub(crate) fn classification_miss(group: &str, subgroup: &str, channel: &str) -> Self {
        Error::ClassificationMiss {
            group: group.to_string(),
            subgroup: subgroup.to_string(),
            channel: channel.to_string(),
        }
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn auxiliary<S: Into<String>>(msg: S) -> Self {
        Error::AuxiliaryReadFailed(msg.into())
    }

    pub(crate) fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub(crate) fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Error::InvalidData(msg.into())
    }

    pub(crate) fn not_available<S: Into<String>>(msg: S) -> Self {
        Error::NotAvailable(msg.into())
    }

    pub(crate) fn system<S: Into<String>>(msg: S) -> Self {
        Error::System(msg.into())
    }

    /// Whether the error only concerns a single channel and sampling can carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ClassificationMiss { .. } | Error::InvalidEnergyUnit(_))
    }
}

/// Result type for statsbar operations
pub type Result<T> = std::result::Result<T, Error>;

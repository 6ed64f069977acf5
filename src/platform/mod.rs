//! # Platform Layer
//!
//! Binds the platform-independent engine to the running machine. Only macOS on Apple Silicon
//! publishes the counters the sampler needs; elsewhere [`open_session`] reports
//! [`Error::NotAvailable`](crate::error::Error::NotAvailable).

#[cfg(target_os = "macos")]
pub mod macos;

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::session::SamplingSession;

/// Sampler over this machine's IOReport channels.
#[cfg(target_os = "macos")]
pub type LocalSampler = crate::sampler::Sampler<macos::IoReportSource, macos::SystemReaders>;

/// Discover the chip, subscribe to its counters and build a sampler.
#[cfg(target_os = "macos")]
pub fn open_sampler(config: SamplerConfig) -> Result<LocalSampler> {
    let source = macos::IoReportSource::open(&crate::source::DEFAULT_CHANNEL_GROUPS)?;
    crate::sampler::Sampler::with_topology(source, &macos::IoKitTopology, macos::SystemReaders::new(), config)
}

/// Open a sampler on this machine and start a session on it. Must be called within a tokio
/// runtime.
#[cfg(target_os = "macos")]
pub fn open_session(config: SamplerConfig) -> Result<SamplingSession> {
    Ok(SamplingSession::spawn(open_sampler(config)?))
}

#[cfg(not(target_os = "macos"))]
pub fn open_session(_config: SamplerConfig) -> Result<SamplingSession> {
    Err(crate::error::Error::not_available("hardware counters are only published on macOS"))
}

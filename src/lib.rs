//! Statsbar - sampling and metric derivation for Apple Silicon hardware counters
//!
//! This crate turns the cumulative residency and energy counters that Apple Silicon publishes
//! through IOReport into one compact [`Metrics`](metrics::Metrics) record per reporting interval:
//! average cluster and GPU frequencies, utilization, and CPU/GPU/ANE power, together with memory,
//! swap, system power and network/disk throughput.
//!
//! # Layout
//!
//! - [`source`]: the counter-source seam and channel classification
//! - [`estimate`]: residency-to-frequency and energy-to-power estimators
//! - [`aggregate`]: merging of the sub-samples of one cycle
//! - [`tracker`]: deltas of cumulative byte counters
//! - [`sampler`]: the reporting cycle itself
//! - [`session`]: a background task that runs cycles until stopped
//! - [`platform`]: the macOS implementations behind the seams
//!
//! Everything except [`platform`] is platform independent and can be driven by test doubles.
//!
//! # Examples
//!
//! ```no_run
//! use statsbar::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = statsbar::platform::open_session(SamplerConfig::default())?;
//!
//!     if let Some(update) = session.next_update().await {
//!         let metrics = update?;
//!         println!(
//!             "E {:.0}% P {:.0}% GPU {:.0}% {:.2} W",
//!             metrics.e_cpu_info()[0],
//!             metrics.p_cpu_info()[0],
//!             metrics.gpu_usage_percent(),
//!             metrics.all_power()
//!         );
//!     }
//!
//!     session.stop().await
//! }
//! ```
//!
//! # Error Handling
//!
//! Construction errors (no counter source, unusable frequency tables) are fatal for a sampler.
//! Errors raised during a cycle abort only that cycle:
//!
//! ```rust
//! use statsbar::{Error, Result};
//!
//! fn check(result: Result<()>) -> bool {
//!     match result {
//!         Err(err) if err.is_recoverable() => true,
//!         Err(Error::AuxiliaryReadFailed(_)) => false,
//!         other => other.is_ok(),
//!     }
//! }
//!
//! assert!(check(Ok(())));
//! ```

pub mod aggregate;
pub mod auxiliary;
pub mod config;
pub mod error;
pub mod estimate;
pub mod metrics;
pub mod platform;
pub mod sampler;
pub mod session;
pub mod smc;
pub mod soc;
pub mod source;
pub mod tracker;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::auxiliary::AuxiliaryReaders;
    pub use crate::config::SamplerConfig;
    pub use crate::metrics::{ClusterUsage, Metrics};
    pub use crate::sampler::Sampler;
    pub use crate::session::{SamplingSession, SessionState};
    pub use crate::soc::{SocInfo, TopologyProvider};
    pub use crate::source::CounterSource;
    pub use crate::Error;
    pub use crate::Result;
}

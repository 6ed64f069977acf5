//! # Estimators
//!
//! Pure conversions from a single channel delta to a physical quantity:
//!
//! - [`frequency::estimate`] turns a state-residency delta and a table of operating points into an
//!   average frequency and a utilization fraction.
//! - [`power::estimate`] turns an energy delta and the elapsed window into an average power.
//!
//! Neither function keeps state; the sampler calls them once per classified channel and
//! sub-sample.

pub mod frequency;
pub mod power;


pub use power::EnergyUnit;

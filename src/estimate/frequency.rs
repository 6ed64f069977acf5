use crate::error::{Error, Result};
use crate::metrics::ClusterUsage;
use crate::source::Residency;

/// State names that precede the operating points in a residency table
pub const IDLE_STATES: [&str; 3] = ["IDLE", "DOWN", "OFF"];

/// Estimate the average frequency and utilization of one frequency domain.
///
/// `residency` lists the domain's states in hardware order: an idle-like prefix followed by one
/// entry per operating point. `freqs` holds those operating points in ascending MHz.
///
/// The returned utilization is scaled by how close the achieved frequency is to the table
/// maximum, so a domain that is busy at its lowest operating point reports less than one running
/// flat out.
///
/// ```rust
/// use statsbar::estimate::frequency::estimate;
/// use statsbar::source::Residency;
///
/// let residency = vec![Residency::new("IDLE", 100), Residency::new("V0P0", 300)];
/// let usage = estimate(&residency, &[1000, 2000]).unwrap();
///
/// assert_eq!(usage.freq_mhz, 1000);
/// assert_eq!(usage.utilization, 0.375);
/// ```
pub fn estimate(residency: &[Residency], freqs: &[u32]) -> Result<ClusterUsage> {
    if freqs.len() < 2 {
        return Err(Error::InsufficientFrequencyTable { len: freqs.len() });
    }

    let Some(offset) = residency.iter().position(|state| !is_idle(&state.state)) else {
        return Ok(ClusterUsage::default());
    };

    let active: i64 = residency[offset..].iter().map(|state| state.ticks).sum();
    let total: i64 = residency.iter().map(|state| state.ticks).sum();

    let mut avg_freq = 0.0f64;
    if active != 0 {
        for (i, freq) in freqs.iter().enumerate() {
            let ticks = residency.get(offset + i).map_or(0, |state| state.ticks);
            avg_freq += ticks as f64 / active as f64 * f64::from(*freq);
        }
    }

    let usage_ratio = if total == 0 { 0.0 } else { active as f64 / total as f64 };

    let min_freq = f64::from(freqs[0]);
    let max_freq = f64::from(freqs[freqs.len() - 1]);
    let from_max = if max_freq == 0.0 {
        0.0
    } else {
        avg_freq.max(min_freq) * usage_ratio / max_freq
    };

    Ok(ClusterUsage::new(avg_freq as u32, from_max as f32))
}

fn is_idle(state: &str) -> bool {
    IDLE_STATES.contains(&state)
}

//! Chip topology discovery through sysctl and the IOKit registry.

use tracing::{debug, warn};

use super::cf::{data_bytes, dict_get, number_i64, ServiceIter};
use super::sysctl;
use crate::error::{Error, Result};
use crate::soc::{decode_frequency_table, frequency_scale, SocInfo, TopologyProvider, HZ_SCALE};

const PMGR_PARENT_CLASS: &str = "AppleARMIODevice";
const PMGR_NAME: &str = "pmgr";
const E_CPU_STATES: &str = "voltage-states1-sram";
const P_CPU_STATES: &str = "voltage-states5-sram";
const GPU_STATES: &str = "voltage-states9-sram";

/// Reads the topology of the machine this process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoKitTopology;

impl TopologyProvider for IoKitTopology {
    fn discover(&self) -> Result<SocInfo> {
        let chip_name = sysctl::string_by_name("machdep.cpu.brand_string")?;
        let p_cores = sysctl::by_name::<u32>("hw.perflevel0.logicalcpu")? as usize;
        let e_cores = sysctl::by_name::<u32>("hw.perflevel1.logicalcpu").unwrap_or(0) as usize;
        let memory_gb = sysctl::by_name::<u64>("hw.memsize")? / 1024 / 1024 / 1024;

        let scale = frequency_scale(&chip_name);
        let (e_cpu_freqs, p_cpu_freqs, gpu_freqs) = read_frequency_tables(scale)?;

        let soc = SocInfo {
            chip_name,
            e_cpu_freqs,
            p_cpu_freqs,
            gpu_freqs,
            e_cores,
            p_cores,
            gpu_cores: gpu_core_count(),
            memory_gb,
        };
        debug!(chip = %soc.chip_name, e_cores, p_cores, "discovered SoC topology");
        Ok(soc)
    }
}

fn read_frequency_tables(cpu_scale: u32) -> Result<(Vec<u32>, Vec<u32>, Vec<u32>)> {
    for entry in ServiceIter::matching(PMGR_PARENT_CLASS)? {
        if entry.name().as_deref() != Some(PMGR_NAME) {
            continue;
        }

        let props = entry.properties()?;
        let table = |key: &str, scale: u32| -> Result<Vec<u32>> {
            let value = unsafe { dict_get(props.as_ptr(), key)? };
            match value.and_then(|data| unsafe { data_bytes(data) }) {
                Some(bytes) => decode_frequency_table(&bytes, scale),
                None => Err(Error::source_unavailable(format!("power manager has no {} table", key))),
            }
        };

        // the GPU table is stored in Hz on every generation
        return Ok((table(E_CPU_STATES, cpu_scale)?, table(P_CPU_STATES, cpu_scale)?, table(GPU_STATES, HZ_SCALE)?));
    }

    Err(Error::source_unavailable("power manager registry entry not found"))
}

fn gpu_core_count() -> usize {
    let count = ServiceIter::matching("AGXAccelerator").ok().and_then(|mut services| {
        services.find_map(|gpu| {
            let value = gpu.property("gpu-core-count").ok()??;
            unsafe { number_i64(value.as_ptr()) }
        })
    });

    match count.and_then(|count| usize::try_from(count).ok()) {
        Some(count) => count,
        None => {
            warn!("could not read the GPU core count");
            0
        },
    }
}

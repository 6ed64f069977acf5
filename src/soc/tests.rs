use super::*;

fn packed(entries: &[(u32, u32)]) -> Vec<u8> {
    entries
        .iter()
        .flat_map(|(freq, volt)| freq.to_le_bytes().into_iter().chain(volt.to_le_bytes()))
        .collect()
}

fn soc(e: Vec<u32>, p: Vec<u32>, gpu: Vec<u32>) -> SocInfo {
    SocInfo {
        chip_name: "Apple M1".to_string(),
        e_cpu_freqs: e,
        p_cpu_freqs: p,
        gpu_freqs: gpu,
        e_cores: 4,
        p_cores: 4,
        gpu_cores: 8,
        memory_gb: 16,
    }
}

#[test]
fn test_decode_hz_table() {
    let bytes = packed(&[(600_000_000, 800), (972_000_000, 850), (2_064_000_000, 1000)]);
    let table = decode_frequency_table(&bytes, HZ_SCALE).unwrap();
    assert_eq!(table, vec![600, 972, 2064]);
}

#[test]
fn test_decode_khz_table() {
    let bytes = packed(&[(1_260_000, 700), (4_512_000, 1100)]);
    let table = decode_frequency_table(&bytes, KHZ_SCALE).unwrap();
    assert_eq!(table, vec![1260, 4512]);
}

#[test]
fn test_decode_partial_trailing_record() {
    let mut bytes = packed(&[(2_000_000, 0)]);
    bytes.extend_from_slice(&3_000_000u32.to_le_bytes());
    let table = decode_frequency_table(&bytes, KHZ_SCALE).unwrap();
    assert_eq!(table, vec![2000, 3000]);
}

#[test]
fn test_decode_rejects_zero_scale() {
    assert!(matches!(decode_frequency_table(&[0; 8], 0), Err(Error::InvalidData(_))));
}

#[test]
fn test_frequency_scale_by_generation() {
    assert_eq!(frequency_scale("Apple M1"), HZ_SCALE);
    assert_eq!(frequency_scale("Apple M2 Max"), HZ_SCALE);
    assert_eq!(frequency_scale("Apple M3 Pro"), HZ_SCALE);
    assert_eq!(frequency_scale("Apple M4"), KHZ_SCALE);
    assert_eq!(frequency_scale(""), KHZ_SCALE);
}

#[test]
fn test_validate_accepts_usable_tables() {
    let info = soc(vec![600, 2064], vec![600, 3228], vec![0, 389, 1296]);
    assert!(info.validate().is_ok());
    assert_eq!(info.usable_gpu_freqs(), &[389, 1296]);
}

#[test]
fn test_validate_rejects_short_cpu_table() {
    let info = soc(vec![600], vec![600, 3228], vec![0, 389, 1296]);
    assert!(matches!(info.validate(), Err(Error::InsufficientFrequencyTable { len: 1 })));
}

#[test]
fn test_validate_rejects_short_gpu_table() {
    let info = soc(vec![600, 2064], vec![600, 3228], vec![0, 389]);
    assert!(matches!(info.validate(), Err(Error::InsufficientFrequencyTable { len: 1 })));
}

#[test]
fn test_soc_info_as_topology_provider() {
    let info = soc(vec![600, 2064], vec![600, 3228], vec![0, 389, 1296]);
    assert_eq!(info.discover().unwrap(), info);
}

use std::collections::HashMap;

use super::*;

const GB: u64 = 1024 * 1024 * 1024;

#[test]
fn test_all_power_derived_at_build() {
    let metrics = Metrics::builder().cpu_power(2.5).gpu_power(1.25).ane_power(0.25).sys_power(9.0).build();

    assert_eq!(metrics.all_power(), 4.0);
    assert_eq!(metrics.sys_power(), 9.0, "system power is not part of the sum");
}

#[test]
fn test_into_builder_keeps_fields() {
    let mut disks = HashMap::new();
    disks.insert("disk0".to_string(), DiskIo { read: 10, write: 20 });

    let metrics = Metrics::builder()
        .e_cpu_usage(ClusterUsage::new(972, 0.1))
        .e_cores(vec![0.1, 0.2])
        .cpu_power(1.0)
        .disk_usage(disks)
        .build();

    let rebuilt = metrics.clone().into_builder().gpu_power(3.0).build();
    assert_eq!(rebuilt.e_cpu_usage(), metrics.e_cpu_usage());
    assert_eq!(rebuilt.e_cores(), &[0.1, 0.2]);
    assert_eq!(rebuilt.disk_read("disk0"), 10);
    assert_eq!(rebuilt.all_power(), 4.0);
}

#[test]
fn test_cluster_helpers() {
    let metrics = Metrics::builder()
        .e_cpu_usage(ClusterUsage::new(1500, 0.5))
        .p_cpu_usage(ClusterUsage::new(3000, 1.0))
        .gpu_usage(ClusterUsage::new(1296, 0.25))
        .build();

    assert_eq!(metrics.cpu_freqs_ghz(), [1.5, 3.0]);
    assert_eq!(metrics.cpu_usage_percent(), 75.0);
    assert_eq!(metrics.e_cpu_info(), [50.0, 1.5]);
    assert_eq!(metrics.p_cpu_info(), [100.0, 3.0]);
    assert_eq!(metrics.gpu_freq_ghz(), 1.296);
    assert_eq!(metrics.gpu_usage_percent(), 25.0);
}

#[test]
fn test_memory_helpers() {
    let metrics = Metrics::builder()
        .mem_usage(MemoryUsage::new(4 * GB, 16 * GB))
        .swap_usage(MemoryUsage::new(GB, 2 * GB))
        .build();

    assert_eq!(metrics.mem_used_gib(), 4.0);
    assert_eq!(metrics.total_memory_gib(), 16);
    assert_eq!(metrics.mem_usage_percent(), 25.0);
    assert_eq!(metrics.swap_used_gib(), 1.0);
    assert_eq!(metrics.total_swap_gib(), 2);
    assert_eq!(metrics.swap_usage_percent(), 50.0);
}

#[test]
fn test_swap_percent_without_swap() {
    let metrics = Metrics::builder().swap_usage(MemoryUsage::new(0, 0)).build();
    assert_eq!(metrics.swap_usage_percent(), 0.0);

    // swap in use but less than one GiB allocated
    let metrics = Metrics::builder().swap_usage(MemoryUsage::new(1024, 512 * 1024 * 1024)).build();
    assert_eq!(metrics.swap_usage_percent(), 0.0);
}

#[test]
fn test_memory_percent_without_total() {
    let metrics = Metrics::default();
    assert_eq!(metrics.mem_usage_percent(), 0.0);
}

#[test]
fn test_disk_lookup_for_unknown_drive() {
    let metrics = Metrics::default();
    assert_eq!(metrics.disk_read("disk9"), 0);
    assert_eq!(metrics.disk_write("disk9"), 0);
}

#[test]
fn test_memory_from_page_counts() {
    let usage = MemoryUsage::from_page_counts(100, 50, 10, 16384, 8 * GB);
    assert_eq!(usage.used, 160 * 16384);
    assert_eq!(usage.total, 8 * GB);
}

#[test]
fn test_format_rate() {
    assert_eq!(format_rate(0), "0 KB/s");
    assert_eq!(format_rate(1023), "0 KB/s");
    assert_eq!(format_rate(12 * 1024), "12 KB/s");
    assert_eq!(format_rate(3 * 1024 * 1024 + 400 * 1024), "3.4 MB/s");
    assert_eq!(format_rate(150 * 1024 * 1024), "150 MB/s");
    assert_eq!(format_rate(1024 * 1024 * 1024 + 200 * 1024 * 1024), "1.2 GB/s");
}

#[test]
fn test_metrics_serialize() {
    let metrics = Metrics::builder().cpu_power(1.0).network_usage(NetworkUsage { upload: 5, download: 7 }).build();
    let json = serde_json::to_value(&metrics).unwrap();

    assert_eq!(json["all_power"], 1.0);
    assert_eq!(json["network_usage"]["upload"], 5);
    assert_eq!(json["network_usage"]["download"], 7);
}

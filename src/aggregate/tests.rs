use super::*;

fn sub_sample(e: ClusterUsage, p: ClusterUsage, gpu: ClusterUsage, power: (f32, f32, f32)) -> Metrics {
    Metrics::builder()
        .e_cpu_usage(e)
        .p_cpu_usage(p)
        .gpu_usage(gpu)
        .e_cores(vec![0.5, 0.25])
        .p_cores(vec![1.0, 0.0, 0.5])
        .cpu_power(power.0)
        .gpu_power(power.1)
        .ane_power(power.2)
        .build()
}

#[test]
fn test_cluster_mean_of_cores() {
    let cores = [ClusterUsage::new(1000, 0.2), ClusterUsage::new(2000, 0.4)];
    let cluster = Aggregator::cluster(&cores, &[600, 2400]);

    assert_eq!(cluster.freq_mhz, 1500);
    assert!((cluster.utilization - 0.3).abs() < 1e-6);
}

#[test]
fn test_cluster_floored_to_min_frequency() {
    let cores = [ClusterUsage::new(0, 0.0), ClusterUsage::new(200, 0.01)];
    let cluster = Aggregator::cluster(&cores, &[600, 2400]);

    assert_eq!(cluster.freq_mhz, 600);
    assert!((cluster.utilization - 0.005).abs() < 1e-6);
}

#[test]
fn test_cluster_without_cores() {
    let cluster = Aggregator::cluster(&[], &[600, 2400]);
    assert_eq!(cluster, ClusterUsage::default());
}

#[test]
fn test_identical_sub_samples() {
    let aggregator = Aggregator::new(2, 3);
    let sample = sub_sample(
        ClusterUsage::new(972, 0.25),
        ClusterUsage::new(3204, 0.5),
        ClusterUsage::new(1296, 0.125),
        (1.5, 0.25, 0.0625),
    );
    let samples = vec![sample.clone(); 4];

    let merged = aggregator.aggregate(&samples);

    assert_eq!(merged.e_cpu_usage(), sample.e_cpu_usage());
    assert_eq!(merged.p_cpu_usage(), sample.p_cpu_usage());
    assert_eq!(merged.gpu_usage(), sample.gpu_usage());
    assert_eq!(merged.e_cores(), sample.e_cores());
    assert_eq!(merged.p_cores(), sample.p_cores());
    assert_eq!(merged.cpu_power(), 6.0);
    assert_eq!(merged.gpu_power(), 1.0);
    assert_eq!(merged.ane_power(), 0.25);
    assert_eq!(merged.all_power(), 7.25);
}

#[test]
fn test_frequency_mean_is_integer_division() {
    let aggregator = Aggregator::new(0, 0);
    let samples = vec![
        Metrics::builder().gpu_usage(ClusterUsage::new(1000, 0.5)).build(),
        Metrics::builder().gpu_usage(ClusterUsage::new(1001, 0.0)).build(),
    ];

    let merged = aggregator.aggregate(&samples);
    assert_eq!(merged.gpu_usage(), ClusterUsage::new(1000, 0.25));
}

#[test]
fn test_missing_cores_count_as_zero() {
    let aggregator = Aggregator::new(2, 2);
    let samples = vec![
        Metrics::builder().e_cores(vec![0.5, 0.5]).p_cores(vec![1.0, 1.0]).build(),
        Metrics::builder().e_cores(vec![0.5]).p_cores(vec![]).build(),
    ];

    let merged = aggregator.aggregate(&samples);
    assert_eq!(merged.e_cores(), &[0.5, 0.25]);
    assert_eq!(merged.p_cores(), &[0.5, 0.5]);
}

#[test]
fn test_extra_cores_are_ignored() {
    let aggregator = Aggregator::new(1, 0);
    let samples = vec![Metrics::builder().e_cores(vec![0.5, 0.9]).build()];

    let merged = aggregator.aggregate(&samples);
    assert_eq!(merged.e_cores(), &[0.5]);
    assert!(merged.p_cores().is_empty());
}

#[test]
fn test_no_sub_samples() {
    let aggregator = Aggregator::new(4, 4);
    let merged = aggregator.aggregate(&[]);

    assert_eq!(merged.e_cpu_usage(), ClusterUsage::default());
    assert_eq!(merged.gpu_usage(), ClusterUsage::default());
    assert_eq!(merged.e_cores(), &[0.0; 4]);
    assert_eq!(merged.p_cores(), &[0.0; 4]);
    assert_eq!(merged.all_power(), 0.0);
}

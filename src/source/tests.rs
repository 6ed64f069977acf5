use super::*;
use crate::error::Error;

#[test]
fn test_core_channels() {
    let classifier = ChannelClassifier::new();

    assert_eq!(
        classifier.classify(CPU_GROUP, CPU_CORE_SUBGROUP, "ECPU000").unwrap(),
        ChannelKind::CoreResidency(Cluster::Efficiency)
    );
    assert_eq!(
        classifier.classify(CPU_GROUP, CPU_CORE_SUBGROUP, "PCPU130").unwrap(),
        ChannelKind::CoreResidency(Cluster::Performance)
    );
}

#[test]
fn test_complex_channels() {
    let classifier = ChannelClassifier::new();

    assert_eq!(
        classifier.classify(CPU_GROUP, CPU_COMPLEX_SUBGROUP, "ECPU").unwrap(),
        ChannelKind::ComplexResidency(Cluster::Efficiency)
    );
    assert_eq!(
        classifier.classify(CPU_GROUP, CPU_COMPLEX_SUBGROUP, "PCPU1").unwrap(),
        ChannelKind::ComplexResidency(Cluster::Performance)
    );
}

#[test]
fn test_gpu_channel() {
    let classifier = ChannelClassifier::new();

    assert_eq!(classifier.classify(GPU_GROUP, GPU_SUBGROUP, "GPUPH").unwrap(), ChannelKind::GpuResidency);
    assert!(classifier.classify(GPU_GROUP, GPU_SUBGROUP, "GPU_SW").is_err());
}

#[test]
fn test_energy_channels() {
    let classifier = ChannelClassifier::new();

    assert_eq!(classifier.classify(ENERGY_GROUP, "", "CPU Energy").unwrap(), ChannelKind::CpuEnergy);
    assert_eq!(classifier.classify(ENERGY_GROUP, "", "GPU Energy").unwrap(), ChannelKind::GpuEnergy);
    assert_eq!(classifier.classify(ENERGY_GROUP, "", "ANE0").unwrap(), ChannelKind::AneEnergy);
    assert!(ChannelKind::AneEnergy.is_energy());
    assert!(!ChannelKind::GpuResidency.is_energy());
}

#[test]
fn test_unknown_channel_is_a_miss() {
    let classifier = ChannelClassifier::new();

    let err = classifier.classify(ENERGY_GROUP, "", "DRAM").unwrap_err();
    assert!(err.is_recoverable());
    match err {
        Error::ClassificationMiss { group, channel, .. } => {
            assert_eq!(group, ENERGY_GROUP);
            assert_eq!(channel, "DRAM");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(classifier.classify(CPU_GROUP, CPU_CORE_SUBGROUP, "CPU0").is_err());
    assert!(classifier.classify("Interrupt Statistics", "", "ECPU000").is_err());
}

#[test]
fn test_lookup_agrees_with_classify() {
    let classifier = ChannelClassifier::new();
    let channels = [
        (CPU_GROUP, CPU_CORE_SUBGROUP, "PCPU020"),
        (CPU_GROUP, CPU_COMPLEX_SUBGROUP, "ECPU"),
        (GPU_GROUP, GPU_SUBGROUP, "GPUPH"),
        (ENERGY_GROUP, "", "ANE0"),
        (ENERGY_GROUP, "", "DRAM"),
        (GPU_GROUP, GPU_SUBGROUP, "GPU_SW"),
    ];

    for (group, subgroup, channel) in channels {
        assert_eq!(classifier.kind_of(group, subgroup, channel), classifier.classify(group, subgroup, channel).ok());
    }
    assert_eq!(classifier.kind_of(ENERGY_GROUP, "", "DRAM"), None);
}

#[test]
fn test_default_groups_cover_every_kind() {
    let groups: Vec<_> = DEFAULT_CHANNEL_GROUPS.iter().map(|g| (g.group, g.subgroup)).collect();

    assert!(groups.contains(&(ENERGY_GROUP, None)));
    assert!(groups.contains(&(CPU_GROUP, Some(CPU_CORE_SUBGROUP))));
    assert!(groups.contains(&(CPU_GROUP, Some(CPU_COMPLEX_SUBGROUP))));
    assert!(groups.contains(&(GPU_GROUP, Some(GPU_SUBGROUP))));
}

#[test]
fn test_sample_constructors() {
    let sample = Sample::energy(ENERGY_GROUP, "", "CPU Energy", "mJ", 42);
    assert_eq!(sample.payload, SamplePayload::Energy(42));
    assert_eq!(sample.unit, "mJ");

    let sample = Sample::residency(GPU_GROUP, GPU_SUBGROUP, "GPUPH", vec![Residency::new("OFF", 3)]);
    assert!(sample.unit.is_empty());
    assert_eq!(sample.payload, SamplePayload::Residency(vec![Residency::new("OFF", 3)]));
}

//! [`CounterSource`] backed by the IOReport library.

use std::ptr;

use tracing::{debug, warn};

use super::bindings::*;
use super::cf::{cf_string, dict_get, string_from_cf, CfOwned};
use crate::error::{Error, Result};
use crate::source::{ChannelGroup, CounterSource, Residency, Sample};

const CHANNELS_KEY: &str = "IOReportChannels";

/// A subscription to a fixed set of IOReport channel groups.
pub struct IoReportSource {
    channels: CfOwned,
    subscription: CfOwned,
}

/// One raw IOReport sample dictionary.
pub struct IoReportSnapshot(CfOwned);

impl IoReportSource {
    /// Subscribe to `groups`. Groups this machine does not publish are skipped; the source is
    /// unavailable only when none of them exist.
    pub fn open(groups: &[ChannelGroup]) -> Result<Self> {
        let mut found = Vec::with_capacity(groups.len());
        for group in groups {
            match copy_group(group)? {
                Some(channels) => found.push(channels),
                None => warn!(group = group.group, subgroup = ?group.subgroup, "IOReport channel group not found"),
            }
        }

        let Some((first, rest)) = found.split_first() else {
            return Err(Error::source_unavailable("none of the requested IOReport groups exist"));
        };
        for other in rest {
            unsafe { IOReportMergeChannels(first.as_ptr(), other.as_ptr(), ptr::null()) };
        }

        let channels = unsafe {
            let count = CFDictionaryGetCount(first.as_ptr());
            CfOwned::from_create(CFDictionaryCreateMutableCopy(kCFAllocatorDefault, count, first.as_ptr()))
        }
        .ok_or_else(|| Error::source_unavailable("could not copy the IOReport channel dictionary"))?;

        if unsafe { dict_get(channels.as_ptr(), CHANNELS_KEY)? }.is_none() {
            return Err(Error::source_unavailable("IOReport channel dictionary has no channels"));
        }

        let mut subscribed: CFMutableDictionaryRef = ptr::null_mut();
        let subscription = unsafe {
            let sub = IOReportCreateSubscription(ptr::null(), channels.as_mut_ptr(), &mut subscribed, 0, ptr::null());
            // only the subscription handle is needed
            drop(CfOwned::from_create(subscribed));
            CfOwned::from_create(sub)
        }
        .ok_or_else(|| Error::source_unavailable("IOReportCreateSubscription failed"))?;

        debug!(groups = found.len(), "IOReport subscription created");
        Ok(Self { channels, subscription })
    }
}

fn copy_group(group: &ChannelGroup) -> Result<Option<CfOwned>> {
    let name = cf_string(group.group)?;
    let subgroup = group.subgroup.map(cf_string).transpose()?;
    let subgroup_ptr = subgroup.as_ref().map_or(ptr::null(), CfOwned::as_ptr);

    Ok(unsafe { CfOwned::from_create(IOReportCopyChannelsInGroup(name.as_ptr(), subgroup_ptr, 0, 0, 0)) })
}

impl CounterSource for IoReportSource {
    type Snapshot = IoReportSnapshot;

    fn snapshot(&self) -> Result<IoReportSnapshot> {
        let sample = unsafe {
            CfOwned::from_create(IOReportCreateSamples(
                self.subscription.as_ptr(),
                self.channels.as_mut_ptr(),
                ptr::null(),
            ))
        };
        sample
            .map(IoReportSnapshot)
            .ok_or_else(|| Error::source_unavailable("IOReportCreateSamples returned nothing"))
    }

    fn delta(&self, previous: &IoReportSnapshot, current: &IoReportSnapshot) -> Result<Vec<Sample>> {
        let delta = unsafe {
            CfOwned::from_create(IOReportCreateSamplesDelta(previous.0.as_ptr(), current.0.as_ptr(), ptr::null()))
        }
        .ok_or_else(|| Error::source_unavailable("IOReportCreateSamplesDelta returned nothing"))?;

        let Some(items) = (unsafe { dict_get(delta.as_ptr(), CHANNELS_KEY)? }) else {
            return Ok(Vec::new());
        };

        let count = unsafe { CFArrayGetCount(items) };
        let mut samples = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        for index in 0..count {
            let item = unsafe { CFArrayGetValueAtIndex(items, index) };
            if let Some(sample) = unsafe { read_channel(item) } {
                samples.push(sample);
            }
        }
        Ok(samples)
    }
}

/// Convert one channel of a delta dictionary. Formats other than state and simple are skipped.
unsafe fn read_channel(item: CFDictionaryRef) -> Option<Sample> {
    if item.is_null() {
        return None;
    }

    let group = string_from_cf(IOReportChannelGetGroup(item)).unwrap_or_default();
    let subgroup = string_from_cf(IOReportChannelGetSubGroup(item)).unwrap_or_default();
    let channel = string_from_cf(IOReportChannelGetChannelName(item)).unwrap_or_default();

    match IOReportChannelGetFormat(item) {
        kIOReportFormatState => {
            let states = (0..IOReportStateGetCount(item))
                .map(|index| {
                    let name = string_from_cf(IOReportStateGetNameForIndex(item, index)).unwrap_or_default();
                    Residency::new(name, IOReportStateGetResidency(item, index))
                })
                .collect();
            Some(Sample::residency(&group, &subgroup, &channel, states))
        },
        kIOReportFormatSimple => {
            let unit = string_from_cf(IOReportChannelGetUnitLabel(item)).unwrap_or_default();
            let value = IOReportSimpleGetIntegerValue(item, 0);
            Some(Sample::energy(&group, &subgroup, &channel, &unit, value))
        },
        _ => None,
    }
}

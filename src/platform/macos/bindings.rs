//! Raw FFI declarations for the macOS frameworks the platform layer talks to.
//!
//! - CoreFoundation for the property lists IOKit and IOReport hand back
//! - IOKit for the registry, the SMC connection and block storage statistics
//! - the private IOReport library for energy and residency channels
//! - Mach host functions for VM statistics
//!
//! Nothing here is safe to call directly; the wrappers in the sibling modules own the pointers
//! and release them.

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals, dead_code)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

//------------------------------------------------------------------------------
// CoreFoundation
//------------------------------------------------------------------------------

pub type CFTypeRef = *const c_void;
pub type CFAllocatorRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFDictionaryRef = *const c_void;
pub type CFMutableDictionaryRef = *mut c_void;
pub type CFArrayRef = *const c_void;
pub type CFDataRef = *const c_void;
pub type CFNumberRef = *const c_void;
pub type CFIndex = isize;
pub type CFTypeID = usize;
pub type Boolean = u8;

pub const kCFAllocatorDefault: CFAllocatorRef = std::ptr::null();
pub const kCFStringEncodingUTF8: u32 = 0x0800_0100;
pub const kCFNumberSInt64Type: CFIndex = 4;

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFRelease(cf: CFTypeRef);

    pub fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    pub fn CFStringGetTypeID() -> CFTypeID;
    pub fn CFDictionaryGetTypeID() -> CFTypeID;
    pub fn CFDataGetTypeID() -> CFTypeID;
    pub fn CFNumberGetTypeID() -> CFTypeID;

    pub fn CFStringCreateWithCString(alloc: CFAllocatorRef, cstr: *const c_char, encoding: u32) -> CFStringRef;
    pub fn CFStringGetLength(string: CFStringRef) -> CFIndex;
    pub fn CFStringGetMaximumSizeForEncoding(length: CFIndex, encoding: u32) -> CFIndex;
    pub fn CFStringGetCString(string: CFStringRef, buffer: *mut c_char, size: CFIndex, encoding: u32) -> Boolean;

    pub fn CFDictionaryGetValue(dict: CFDictionaryRef, key: *const c_void) -> *const c_void;
    pub fn CFDictionaryGetCount(dict: CFDictionaryRef) -> CFIndex;
    pub fn CFDictionaryCreateMutableCopy(
        alloc: CFAllocatorRef,
        capacity: CFIndex,
        dict: CFDictionaryRef,
    ) -> CFMutableDictionaryRef;

    pub fn CFArrayGetCount(array: CFArrayRef) -> CFIndex;
    pub fn CFArrayGetValueAtIndex(array: CFArrayRef, idx: CFIndex) -> *const c_void;

    pub fn CFDataGetLength(data: CFDataRef) -> CFIndex;
    pub fn CFDataGetBytePtr(data: CFDataRef) -> *const u8;

    pub fn CFNumberGetValue(number: CFNumberRef, number_type: CFIndex, value: *mut c_void) -> Boolean;
}

//------------------------------------------------------------------------------
// IOKit
//------------------------------------------------------------------------------

pub type io_object_t = c_uint;
pub type io_iterator_t = io_object_t;
pub type io_registry_entry_t = io_object_t;
pub type io_connect_t = c_uint;
pub type kern_return_t = c_int;
pub type mach_port_t = c_uint;

pub const KERN_SUCCESS: kern_return_t = 0;
pub const kIOMainPortDefault: mach_port_t = 0;
pub const kIOServicePlane: &[u8] = b"IOService\0";

/// Size of the buffer `IORegistryEntryGetName` writes into
pub const IO_NAME_LEN: usize = 128;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    pub fn IOServiceMatching(name: *const c_char) -> CFMutableDictionaryRef;
    /// Consumes one reference of `matching`.
    pub fn IOServiceGetMatchingServices(
        main_port: mach_port_t,
        matching: CFDictionaryRef,
        existing: *mut io_iterator_t,
    ) -> kern_return_t;
    pub fn IOIteratorNext(iterator: io_iterator_t) -> io_object_t;
    pub fn IOObjectRelease(object: io_object_t) -> kern_return_t;

    pub fn IORegistryEntryGetName(entry: io_registry_entry_t, name: *mut c_char) -> kern_return_t;
    pub fn IORegistryEntryGetChildEntry(
        entry: io_registry_entry_t,
        plane: *const c_char,
        child: *mut io_registry_entry_t,
    ) -> kern_return_t;
    pub fn IORegistryEntryGetParentEntry(
        entry: io_registry_entry_t,
        plane: *const c_char,
        parent: *mut io_registry_entry_t,
    ) -> kern_return_t;
    pub fn IOObjectConformsTo(object: io_object_t, class_name: *const c_char) -> u32;
    pub fn IOBSDNameMatching(main_port: mach_port_t, options: u32, bsd_name: *const c_char) -> CFMutableDictionaryRef;
    /// Consumes one reference of `matching`.
    pub fn IOServiceGetMatchingService(main_port: mach_port_t, matching: CFDictionaryRef) -> io_object_t;
    pub fn IORegistryEntryCreateCFProperties(
        entry: io_registry_entry_t,
        properties: *mut CFMutableDictionaryRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> kern_return_t;
    pub fn IORegistryEntryCreateCFProperty(
        entry: io_registry_entry_t,
        key: CFStringRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> CFTypeRef;

    pub fn IOServiceOpen(
        service: io_object_t,
        owning_task: mach_port_t,
        connect_type: u32,
        connect: *mut io_connect_t,
    ) -> kern_return_t;
    pub fn IOServiceClose(connect: io_connect_t) -> kern_return_t;
    pub fn IOConnectCallStructMethod(
        connection: io_connect_t,
        selector: u32,
        input: *const c_void,
        input_size: usize,
        output: *mut c_void,
        output_size: *mut usize,
    ) -> kern_return_t;
}

//------------------------------------------------------------------------------
// IOReport
//------------------------------------------------------------------------------

pub type IOReportSubscriptionRef = *const c_void;

pub const kIOReportFormatSimple: c_int = 1;
pub const kIOReportFormatState: c_int = 2;

#[link(name = "IOReport", kind = "dylib")]
extern "C" {
    /// Returns a retained dictionary, or null when the group does not exist.
    pub fn IOReportCopyChannelsInGroup(
        group: CFStringRef,
        subgroup: CFStringRef,
        a: u64,
        b: u64,
        c: u64,
    ) -> CFDictionaryRef;
    /// Appends the channels of `b` to `a`.
    pub fn IOReportMergeChannels(a: CFDictionaryRef, b: CFDictionaryRef, nil: CFTypeRef);
    pub fn IOReportCreateSubscription(
        a: *const c_void,
        desired: CFMutableDictionaryRef,
        subscribed: *mut CFMutableDictionaryRef,
        channel_id: u64,
        b: CFTypeRef,
    ) -> IOReportSubscriptionRef;
    pub fn IOReportCreateSamples(
        subscription: IOReportSubscriptionRef,
        channels: CFMutableDictionaryRef,
        a: CFTypeRef,
    ) -> CFDictionaryRef;
    pub fn IOReportCreateSamplesDelta(previous: CFDictionaryRef, current: CFDictionaryRef, a: CFTypeRef) -> CFDictionaryRef;

    pub fn IOReportChannelGetGroup(item: CFDictionaryRef) -> CFStringRef;
    pub fn IOReportChannelGetSubGroup(item: CFDictionaryRef) -> CFStringRef;
    pub fn IOReportChannelGetChannelName(item: CFDictionaryRef) -> CFStringRef;
    pub fn IOReportChannelGetUnitLabel(item: CFDictionaryRef) -> CFStringRef;
    pub fn IOReportChannelGetFormat(item: CFDictionaryRef) -> c_int;

    pub fn IOReportSimpleGetIntegerValue(item: CFDictionaryRef, index: i32) -> i64;
    pub fn IOReportStateGetCount(item: CFDictionaryRef) -> i32;
    pub fn IOReportStateGetNameForIndex(item: CFDictionaryRef, index: i32) -> CFStringRef;
    pub fn IOReportStateGetResidency(item: CFDictionaryRef, index: i32) -> i64;
}

//------------------------------------------------------------------------------
// SMC
//------------------------------------------------------------------------------

pub const KERNEL_INDEX_SMC: u32 = 2;
pub const SMC_CMD_READ_BYTES: u8 = 5;
pub const SMC_CMD_READ_KEYINFO: u8 = 9;
pub const SMC_KEY_NOT_FOUND: u8 = 132;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SmcVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SmcPLimitData {
    pub version: u16,
    pub length: u16,
    pub cpu_plimit: u32,
    pub gpu_plimit: u32,
    pub mem_plimit: u32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SmcKeyInfo {
    pub data_size: u32,
    pub data_type: u32,
    pub data_attributes: u8,
}

/// Argument and result of every AppleSMC struct call.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SmcKeyData {
    pub key: u32,
    pub vers: SmcVersion,
    pub p_limit_data: SmcPLimitData,
    pub key_info: SmcKeyInfo,
    pub result: u8,
    pub status: u8,
    pub data8: u8,
    pub data32: u32,
    pub bytes: [u8; 32],
}

//------------------------------------------------------------------------------
// Mach host statistics
//------------------------------------------------------------------------------

pub const HOST_VM_INFO64: c_int = 4;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct vm_statistics64 {
    pub free_count: u32,
    pub active_count: u32,
    pub inactive_count: u32,
    pub wire_count: u32,
    pub zero_fill_count: u64,
    pub reactivations: u64,
    pub pageins: u64,
    pub pageouts: u64,
    pub faults: u64,
    pub cow_faults: u64,
    pub lookups: u64,
    pub hits: u64,
    pub purges: u64,
    pub purgeable_count: u32,
    pub speculative_count: u32,
    pub decompressions: u64,
    pub compressions: u64,
    pub swapins: u64,
    pub swapouts: u64,
    pub compressor_page_count: u32,
    pub throttled_count: u32,
    pub external_page_count: u32,
    pub internal_page_count: u32,
    pub total_uncompressed_pages_in_compressor: u64,
}

/// `vm_statistics64` size in `integer_t` units
pub const HOST_VM_INFO64_COUNT: u32 =
    (std::mem::size_of::<vm_statistics64>() / std::mem::size_of::<c_int>()) as u32;

extern "C" {
    pub static mach_task_self_: mach_port_t;

    pub fn mach_host_self() -> mach_port_t;
    pub fn mach_port_deallocate(task: mach_port_t, name: mach_port_t) -> kern_return_t;
    pub fn host_statistics64(
        host: mach_port_t,
        flavor: c_int,
        info: *mut c_int,
        count: *mut u32,
    ) -> kern_return_t;
}

//------------------------------------------------------------------------------
// sysctl structures
//------------------------------------------------------------------------------

pub const CTL_VM: c_int = 2;
pub const VM_SWAPUSAGE: c_int = 5;

pub const CTL_NET: c_int = 4;
pub const PF_ROUTE: c_int = 17;
pub const NET_RT_IFLIST2: c_int = 6;
pub const NET_RT_FLAGS: c_int = 2;
pub const RTM_IFINFO2: u8 = 0x12;
pub const RTF_GATEWAY: c_int = 0x2;
pub const RTA_DST: c_int = 0x1;
pub const AF_INET: u8 = 2;

/// Volume is hidden from the Finder
pub const MNT_DONTBROWSE: u32 = 0x0010_0000;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct xsw_usage {
    pub xsu_total: u64,
    pub xsu_avail: u64,
    pub xsu_used: u64,
    pub xsu_pagesize: u32,
    pub xsu_encrypted: u32,
}

/// Leading fields shared by every routing message.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct if_msghdr {
    pub ifm_msglen: u16,
    pub ifm_version: u8,
    pub ifm_type: u8,
}

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy)]
pub struct timeval32 {
    pub tv_sec: i32,
    pub tv_usec: i32,
}

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy)]
pub struct if_data64 {
    pub ifi_type: u8,
    pub ifi_typelen: u8,
    pub ifi_physical: u8,
    pub ifi_addrlen: u8,
    pub ifi_hdrlen: u8,
    pub ifi_recvquota: u8,
    pub ifi_xmitquota: u8,
    pub ifi_unused1: u8,
    pub ifi_mtu: u32,
    pub ifi_metric: u32,
    pub ifi_baudrate: u64,
    pub ifi_ipackets: u64,
    pub ifi_ierrors: u64,
    pub ifi_opackets: u64,
    pub ifi_oerrors: u64,
    pub ifi_collisions: u64,
    pub ifi_ibytes: u64,
    pub ifi_obytes: u64,
    pub ifi_imcasts: u64,
    pub ifi_omcasts: u64,
    pub ifi_iqdrops: u64,
    pub ifi_noproto: u64,
    pub ifi_recvtiming: u32,
    pub ifi_xmittiming: u32,
    pub ifi_lastchange: timeval32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct if_msghdr2 {
    pub ifm_msglen: u16,
    pub ifm_version: u8,
    pub ifm_type: u8,
    pub ifm_addrs: c_int,
    pub ifm_flags: c_int,
    pub ifm_index: u16,
    pub ifm_snd_len: c_int,
    pub ifm_snd_maxlen: c_int,
    pub ifm_snd_drops: c_int,
    pub ifm_timer: c_int,
    pub ifm_data: if_data64,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct rt_metrics {
    pub rmx_locks: u32,
    pub rmx_mtu: u32,
    pub rmx_hopcount: u32,
    pub rmx_expire: i32,
    pub rmx_recvpipe: u32,
    pub rmx_sendpipe: u32,
    pub rmx_ssthresh: u32,
    pub rmx_rtt: u32,
    pub rmx_rttvar: u32,
    pub rmx_pksent: u32,
    pub rmx_state: u32,
    pub rmx_filler: [u32; 3],
}

/// Header of a routing table entry in a `NET_RT_FLAGS` dump. Socket addresses follow it.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct rt_msghdr {
    pub rtm_msglen: u16,
    pub rtm_version: u8,
    pub rtm_type: u8,
    pub rtm_index: u16,
    pub rtm_flags: c_int,
    pub rtm_addrs: c_int,
    pub rtm_pid: i32,
    pub rtm_seq: c_int,
    pub rtm_errno: c_int,
    pub rtm_use: c_int,
    pub rtm_inits: u32,
    pub rtm_rmx: rt_metrics,
}

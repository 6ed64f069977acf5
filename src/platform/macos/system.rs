//! [`AuxiliaryReaders`] over mach, sysctl, getfsstat and the IOKit registry.

use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task;
use tracing::{debug, trace, warn};

use super::bindings::*;
use super::cf::{dict_get, number_i64, IoObject};
use super::smc::SmcConnection;
use super::sysctl;
use crate::auxiliary::{AuxiliaryReaders, DriveCounters, InterfaceCounters, Volume};
use crate::error::{Error, Result};
use crate::metrics::MemoryUsage;
use crate::smc::SYSTEM_POWER_KEY;

const VOLUMES_PREFIX: &str = "/Volumes/";
const FALLBACK_PAGE_SIZE: u64 = 16_384;
const BLOCK_STORAGE_DRIVER: &CStr = c"IOBlockStorageDriver";

/// Auxiliary readers for the local machine.
///
/// Every read is a blocking system call, so each one runs on tokio's blocking pool.
pub struct SystemReaders {
    inner: Arc<Readers>,
}

struct Readers {
    smc: Option<SmcConnection>,
    volumes: Mutex<Vec<Volume>>,
    page_size: u64,
}

impl SystemReaders {
    /// Open the readers. A machine without a usable SMC reports 0 W system power.
    pub fn new() -> Self {
        let smc = match SmcConnection::open() {
            Ok(conn) => Some(conn),
            Err(err) => {
                warn!(%err, "SMC unavailable, system power will read as 0");
                None
            },
        };

        let page_size = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            size if size > 0 => size as u64,
            _ => FALLBACK_PAGE_SIZE,
        };

        Self { inner: Arc::new(Readers { smc, volumes: Mutex::new(Vec::new()), page_size }) }
    }

    /// Run `read` on the blocking pool, labelling its failure with `what`.
    async fn blocking<T, F>(&self, what: &'static str, read: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Readers) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        task::spawn_blocking(move || read(&inner))
            .await
            .map_err(|err| Error::auxiliary(format!("{what}: reader task failed: {err}")))?
            .map_err(|err| Error::auxiliary(format!("{what}: {err}")))
    }
}

impl Default for SystemReaders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuxiliaryReaders for SystemReaders {
    async fn refresh_volumes(&self) -> Result<()> {
        self.blocking("volumes", |readers| {
            let volumes = read_volumes()?;
            trace!(count = volumes.len(), "volumes refreshed");
            *readers.volumes.lock() = volumes;
            Ok(())
        })
        .await
    }

    fn volumes(&self) -> Vec<Volume> {
        self.inner.volumes.lock().clone()
    }

    async fn memory_usage(&self) -> Result<MemoryUsage> {
        self.blocking("memory", |readers| read_memory(readers.page_size)).await
    }

    async fn swap_usage(&self) -> Result<MemoryUsage> {
        self.blocking("swap", |_| {
            let swap: xsw_usage = sysctl::by_mib(&mut [CTL_VM, VM_SWAPUSAGE])?;
            Ok(MemoryUsage::new(swap.xsu_used, swap.xsu_total))
        })
        .await
    }

    async fn system_power(&self) -> Result<f32> {
        self.blocking("system power", |readers| match &readers.smc {
            Some(smc) => smc.read_float(SYSTEM_POWER_KEY),
            None => Ok(0.0),
        })
        .await
    }

    async fn network_counters(&self) -> Result<Vec<InterfaceCounters>> {
        self.blocking("network", |_| read_interfaces()).await
    }

    async fn disk_counters(&self) -> Result<Vec<DriveCounters>> {
        self.blocking("disk", |readers| {
            let names: Vec<String> = readers.volumes.lock().iter().map(|volume| volume.name.clone()).collect();
            read_drives(&names)
        })
        .await
    }
}

//------------------------------------------------------------------------------
// Memory
//------------------------------------------------------------------------------

fn read_memory(page_size: u64) -> Result<MemoryUsage> {
    let total: u64 = sysctl::by_name("hw.memsize")?;

    let host = scopeguard::guard(unsafe { mach_host_self() }, |host| unsafe {
        mach_port_deallocate(mach_task_self_, host);
    });

    let mut stats = vm_statistics64::default();
    let mut count = HOST_VM_INFO64_COUNT;
    let kr = unsafe { host_statistics64(*host, HOST_VM_INFO64, &mut stats as *mut vm_statistics64 as *mut c_int, &mut count) };
    if kr != KERN_SUCCESS {
        return Err(Error::system(format!("host_statistics64 failed: {}", kr)));
    }

    Ok(MemoryUsage::from_page_counts(
        u64::from(stats.active_count),
        u64::from(stats.wire_count),
        u64::from(stats.compressor_page_count),
        page_size,
        total,
    ))
}

//------------------------------------------------------------------------------
// Volumes
//------------------------------------------------------------------------------

fn read_volumes() -> Result<Vec<Volume>> {
    let count = unsafe { libc::getfsstat(ptr::null_mut(), 0, libc::MNT_NOWAIT) };
    if count < 0 {
        return Err(Error::system(format!("getfsstat failed: {}", std::io::Error::last_os_error())));
    }

    let mut buffer: Vec<libc::statfs> = vec![unsafe { mem::zeroed() }; count as usize];
    let size = (buffer.len() * mem::size_of::<libc::statfs>()) as c_int;
    let count = unsafe { libc::getfsstat(buffer.as_mut_ptr(), size, libc::MNT_NOWAIT) };
    if count < 0 {
        return Err(Error::system(format!("getfsstat failed: {}", std::io::Error::last_os_error())));
    }
    buffer.truncate(count as usize);

    Ok(buffer
        .iter()
        .filter_map(|fs| {
            let mount_point = c_chars_to_string(&fs.f_mntonname);
            let block_size = u64::from(fs.f_bsize);
            let total = fs.f_blocks.saturating_mul(block_size);
            if !is_user_volume(&mount_point, fs.f_flags, total) {
                return None;
            }

            let device = c_chars_to_string(&fs.f_mntfromname);
            Some(Volume {
                name: device.trim_start_matches("/dev/").to_string(),
                mount_point,
                total,
                free: fs.f_bavail.saturating_mul(block_size),
            })
        })
        .collect())
}

/// The root volume and anything mounted under `/Volumes`, minus hidden, recovery and empty ones.
fn is_user_volume(mount_point: &str, flags: u32, total: u64) -> bool {
    let listed = mount_point == "/" || mount_point.starts_with(VOLUMES_PREFIX);
    let recovery = mount_point.rsplit('/').next() == Some("Recovery");
    listed && !recovery && flags & MNT_DONTBROWSE == 0 && total > 0
}

fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

//------------------------------------------------------------------------------
// Network
//------------------------------------------------------------------------------

fn read_interfaces() -> Result<Vec<InterfaceCounters>> {
    let table = sysctl::bytes_by_mib(&mut [CTL_NET, PF_ROUTE, 0, 0, NET_RT_IFLIST2, 0])?;
    let routes = sysctl::bytes_by_mib(&mut [CTL_NET, PF_ROUTE, 0, c_int::from(AF_INET), NET_RT_FLAGS, RTF_GATEWAY])?;
    let primary = default_route_index(&routes);

    let counters = parse_interface_table(&table)
        .into_iter()
        .filter_map(|(index, upload, download)| {
            let counters = InterfaceCounters::new(interface_name(index)?, upload, download);
            Some(if Some(index) == primary { counters.as_primary() } else { counters })
        })
        .collect::<Vec<_>>();
    debug!(interfaces = counters.len(), ?primary, "read interface counters");
    Ok(counters)
}

/// Interface index of the IPv4 default route in a `NET_RT_FLAGS` dump.
fn default_route_index(routes: &[u8]) -> Option<u16> {
    let header_len = mem::size_of::<rt_msghdr>();
    let mut offset = 0;

    while offset + header_len <= routes.len() {
        let header: rt_msghdr = unsafe { ptr::read_unaligned(routes[offset..].as_ptr() as *const rt_msghdr) };
        let len = usize::from(header.rtm_msglen);
        if len == 0 {
            break;
        }

        if header.rtm_flags & RTF_GATEWAY != 0 && header.rtm_addrs & RTA_DST != 0 {
            let dst = routes.get(offset + header_len..(offset + len).min(routes.len())).unwrap_or(&[]);
            if is_default_destination(dst) {
                return Some(header.rtm_index);
            }
        }
        offset += len;
    }
    None
}

/// `0.0.0.0`, which the kernel may also encode as an empty socket address.
fn is_default_destination(sockaddr: &[u8]) -> bool {
    match sockaddr {
        [0, ..] => true,
        [_, family, _, _, a, b, c, d, ..] if *family == AF_INET => [a, b, c, d].iter().all(|&&byte| byte == 0),
        _ => false,
    }
}

/// Walk a `NET_RT_IFLIST2` dump, returning `(index, bytes out, bytes in)` per interface.
fn parse_interface_table(table: &[u8]) -> Vec<(u16, u64, u64)> {
    let mut interfaces = Vec::new();
    let mut offset = 0;

    while offset + mem::size_of::<if_msghdr>() <= table.len() {
        let header: if_msghdr = unsafe { ptr::read_unaligned(table[offset..].as_ptr() as *const if_msghdr) };
        let len = usize::from(header.ifm_msglen);
        if len == 0 {
            break;
        }

        if header.ifm_type == RTM_IFINFO2 && offset + mem::size_of::<if_msghdr2>() <= table.len() {
            let msg: if_msghdr2 = unsafe { ptr::read_unaligned(table[offset..].as_ptr() as *const if_msghdr2) };
            let data = msg.ifm_data;
            let (obytes, ibytes) = (data.ifi_obytes, data.ifi_ibytes);
            interfaces.push((msg.ifm_index, obytes, ibytes));
        }
        offset += len;
    }
    interfaces
}

fn interface_name(index: u16) -> Option<String> {
    let mut buffer = [0 as c_char; libc::IF_NAMESIZE];
    let name = unsafe { libc::if_indextoname(c_uint::from(index), buffer.as_mut_ptr()) };
    if name.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
}

//------------------------------------------------------------------------------
// Drives
//------------------------------------------------------------------------------

/// Statistics of the block storage driver under each volume, keyed by the volume's name.
fn read_drives(volumes: &[String]) -> Result<Vec<DriveCounters>> {
    let mut drives = Vec::with_capacity(volumes.len());

    for volume in volumes {
        let Some(driver) = IoObject::media_by_bsd_name(volume)?.and_then(block_storage_driver) else {
            trace!(volume = %volume, "no block storage driver");
            continue;
        };

        let props = driver.properties()?;
        let Some(stats) = (unsafe { dict_get(props.as_ptr(), "Statistics")? }) else {
            continue;
        };
        if unsafe { CFGetTypeID(stats) != CFDictionaryGetTypeID() } {
            continue;
        }

        let counter = |key: &str| -> Result<u64> {
            let value = unsafe { dict_get(stats, key)? };
            Ok(value
                .and_then(|number| unsafe { number_i64(number) })
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0))
        };
        drives.push(DriveCounters::new(volume.clone(), counter("Bytes (Read)")?, counter("Bytes (Write)")?));
    }

    Ok(drives)
}

/// Climb the service plane from a media object to the driver of its physical disk.
///
/// APFS volumes sit several levels below it: volume, container, container scheme, partition.
fn block_storage_driver(media: IoObject) -> Option<IoObject> {
    let mut entry = media;
    loop {
        if entry.conforms_to(BLOCK_STORAGE_DRIVER) {
            return Some(entry);
        }
        entry = entry.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_volume_filter() {
        assert!(is_user_volume("/", 0, 1));
        assert!(is_user_volume("/Volumes/Backup", 0, 1));
        assert!(!is_user_volume("/System/Volumes/Data", 0, 1));
        assert!(!is_user_volume("/Volumes/Recovery", 0, 1));
        assert!(!is_user_volume("/Volumes/Hidden", MNT_DONTBROWSE, 1));
        assert!(!is_user_volume("/Volumes/Empty", 0, 0));
    }

    #[test]
    fn test_interface_table_stops_on_truncated_input() {
        assert!(parse_interface_table(&[]).is_empty());
        // a zero-length message would never advance
        assert!(parse_interface_table(&[0u8; 64]).is_empty());
    }

    fn route(index: u16, flags: c_int, dst: &[u8]) -> Vec<u8> {
        let header_len = mem::size_of::<rt_msghdr>();
        let len = (header_len + dst.len()) as u16;
        let mut bytes = vec![0u8; header_len];
        let mut put = |offset: usize, field: &[u8]| bytes[offset..offset + field.len()].copy_from_slice(field);
        put(mem::offset_of!(rt_msghdr, rtm_msglen), &len.to_ne_bytes());
        put(mem::offset_of!(rt_msghdr, rtm_index), &index.to_ne_bytes());
        put(mem::offset_of!(rt_msghdr, rtm_flags), &flags.to_ne_bytes());
        put(mem::offset_of!(rt_msghdr, rtm_addrs), &RTA_DST.to_ne_bytes());
        bytes.extend_from_slice(dst);
        bytes
    }

    fn sockaddr_in(addr: [u8; 4]) -> Vec<u8> {
        let mut bytes = vec![16, AF_INET, 0, 0];
        bytes.extend_from_slice(&addr);
        bytes.extend_from_slice(&[0; 8]);
        bytes
    }

    #[test]
    fn test_default_route_picks_gateway_to_any() {
        let mut routes = route(9, RTF_GATEWAY, &sockaddr_in([10, 8, 0, 0]));
        routes.extend(route(4, RTF_GATEWAY, &sockaddr_in([0, 0, 0, 0])));
        assert_eq!(default_route_index(&routes), Some(4));
    }

    #[test]
    fn test_default_route_accepts_empty_destination() {
        let routes = route(6, RTF_GATEWAY, &[0, 0, 0, 0]);
        assert_eq!(default_route_index(&routes), Some(6));
    }

    #[test]
    fn test_no_default_route() {
        assert_eq!(default_route_index(&[]), None);
        assert_eq!(default_route_index(&route(3, RTF_GATEWAY, &sockaddr_in([192, 168, 1, 0]))), None);
        // a direct route to the default destination has no gateway
        assert_eq!(default_route_index(&route(3, 0, &sockaddr_in([0, 0, 0, 0]))), None);
    }

    #[cfg(target_os = "macos")]
    #[tokio::test]
    #[ignore = "reads the counters of the machine running the tests"]
    async fn test_reads_local_machine() {
        let readers = SystemReaders::new();
        let memory = readers.memory_usage().await.unwrap();
        assert!(memory.total > 0);
        assert!(memory.used <= memory.total);

        readers.refresh_volumes().await.unwrap();
        let volumes = readers.volumes();
        let drives = readers.disk_counters().await.unwrap();
        assert!(drives.iter().all(|drive| volumes.iter().any(|volume| volume.name == drive.name)));
    }
}

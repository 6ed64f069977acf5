//! AppleSMC user-client connection.

use std::mem;
use std::os::raw::c_void;

use parking_lot::Mutex;
use tracing::debug;

use super::bindings::*;
use super::cf::{IoObject, ServiceIter};
use crate::error::{Error, Result};
use crate::smc::{code_to_string, decode_value, four_char_code, KeyInfo, KeyInfoCache};

const SMC_SERVICE: &str = "AppleSMC";
const SMC_ENDPOINT: &str = "AppleSMCKeysEndpoint";

/// An open connection to the SMC. Closed on drop.
pub struct SmcConnection {
    conn: io_connect_t,
    keys: Mutex<KeyInfoCache>,
}

impl SmcConnection {
    pub fn open() -> Result<Self> {
        let mut fallback: Option<IoObject> = None;
        let mut endpoint: Option<IoObject> = None;
        for service in ServiceIter::matching(SMC_SERVICE)? {
            if service.name().as_deref() == Some(SMC_ENDPOINT) {
                endpoint = Some(service);
                break;
            }
            fallback.get_or_insert(service);
        }

        let device = endpoint
            .or(fallback)
            .ok_or_else(|| Error::not_available("no AppleSMC service"))?;

        let mut conn: io_connect_t = 0;
        let kr = unsafe { IOServiceOpen(device.raw(), mach_task_self_, 0, &mut conn) };
        if kr != KERN_SUCCESS {
            return Err(Error::not_available(format!("IOServiceOpen on AppleSMC failed: {}", kr)));
        }

        debug!(service = ?device.name(), "SMC connection opened");
        Ok(Self { conn, keys: Mutex::new(KeyInfoCache::new()) })
    }

    /// Read a float key such as `PSTR`.
    pub fn read_float(&self, key: &str) -> Result<f32> {
        let code = four_char_code(key)?;
        let conn = self.conn;
        let info = self.keys.lock().get_or_fetch(code, |code| read_key_info(conn, code))?;

        let input = SmcKeyData {
            key: code,
            key_info: SmcKeyInfo {
                data_size: info.data_size,
                data_type: info.data_type,
                data_attributes: info.data_attributes,
            },
            data8: SMC_CMD_READ_BYTES,
            ..Default::default()
        };
        let output = call(conn, &input)?;

        let len = (info.data_size as usize).min(output.bytes.len());
        decode_value(&info, &output.bytes[..len])
    }
}

fn read_key_info(conn: io_connect_t, code: u32) -> Result<KeyInfo> {
    let input = SmcKeyData { key: code, data8: SMC_CMD_READ_KEYINFO, ..Default::default() };
    let output = call(conn, &input)?;
    Ok(KeyInfo {
        data_size: output.key_info.data_size,
        data_type: output.key_info.data_type,
        data_attributes: output.key_info.data_attributes,
    })
}

fn call(conn: io_connect_t, input: &SmcKeyData) -> Result<SmcKeyData> {
    let mut output = SmcKeyData::default();
    let mut output_size = mem::size_of::<SmcKeyData>();

    let kr = unsafe {
        IOConnectCallStructMethod(
            conn,
            KERNEL_INDEX_SMC,
            input as *const SmcKeyData as *const c_void,
            mem::size_of::<SmcKeyData>(),
            &mut output as *mut SmcKeyData as *mut c_void,
            &mut output_size,
        )
    };

    if kr != KERN_SUCCESS {
        return Err(Error::system(format!("SMC call for {} failed: {:#x}", code_to_string(input.key), kr)));
    }
    match output.result {
        0 => Ok(output),
        SMC_KEY_NOT_FOUND => Err(Error::invalid_data(format!("SMC key {} not found", code_to_string(input.key)))),
        other => Err(Error::system(format!("SMC returned {} for {}", other, code_to_string(input.key)))),
    }
}

impl Drop for SmcConnection {
    fn drop(&mut self) {
        unsafe { IOServiceClose(self.conn) };
    }
}

//! # SMC Keys
//!
//! The System Management Controller exposes sensor values under four-character keys. Reading a
//! key takes two round trips: one for the key's metadata ([`KeyInfo`]) and one for its bytes.
//! Metadata never changes for the lifetime of a connection, so it is memoized in a
//! [`KeyInfoCache`] owned by that connection.
//!
//! This module only holds the platform-independent part: key packing, the cache and value
//! decoding. The connection itself lives in the macOS platform layer.


use std::collections::HashMap;

use crate::error::{Error, Result};

/// Total system power in Watts
pub const SYSTEM_POWER_KEY: &str = "PSTR";

/// Data type tag of little-endian 32-bit floats
pub const FLOAT_TYPE: &str = "flt ";

/// Pack a four-character key into the big-endian integer the SMC expects.
///
/// ```rust
/// use statsbar::smc::four_char_code;
///
/// assert_eq!(four_char_code("PSTR").unwrap(), 0x5053_5452);
/// assert!(four_char_code("PST").is_err());
/// ```
pub fn four_char_code(key: &str) -> Result<u32> {
    let bytes: [u8; 4] = key
        .as_bytes()
        .try_into()
        .map_err(|_| Error::invalid_data(format!("SMC key must be 4 bytes, got {:?}", key)))?;

    if !bytes.is_ascii() {
        return Err(Error::invalid_data(format!("SMC key must be ASCII, got {:?}", key)));
    }

    Ok(u32::from_be_bytes(bytes))
}

/// Inverse of [`four_char_code`].
pub fn code_to_string(code: u32) -> String {
    String::from_utf8_lossy(&code.to_be_bytes()).into_owned()
}

/// Metadata of one SMC key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInfo {
    /// Number of value bytes
    pub data_size: u32,
    /// Four-character type tag, packed like a key
    pub data_type: u32,
    pub data_attributes: u8,
}

impl KeyInfo {
    pub fn type_name(&self) -> String {
        code_to_string(self.data_type)
    }
}

/// Per-connection memo of key metadata.
#[derive(Debug, Default)]
pub struct KeyInfoCache {
    entries: HashMap<u32, KeyInfo>,
}

impl KeyInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u32) -> Option<KeyInfo> {
        self.entries.get(&key).copied()
    }

    /// Return the cached metadata for `key`, fetching and storing it on a miss.
    ///
    /// A failed fetch is not cached.
    pub fn get_or_fetch<F>(&mut self, key: u32, fetch: F) -> Result<KeyInfo>
    where
        F: FnOnce(u32) -> Result<KeyInfo>,
    {
        if let Some(info) = self.get(key) {
            return Ok(info);
        }

        let info = fetch(key)?;
        self.entries.insert(key, info);
        Ok(info)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Decode the raw bytes of a key as a float.
pub fn decode_value(info: &KeyInfo, bytes: &[u8]) -> Result<f32> {
    let type_name = info.type_name();
    if type_name != FLOAT_TYPE {
        return Err(Error::invalid_data(format!("unsupported SMC data type {:?}", type_name)));
    }

    match bytes.get(..4) {
        Some(&[b0, b1, b2, b3]) if info.data_size == 4 => Ok(f32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(Error::invalid_data(format!(
            "SMC float needs 4 bytes, key declares {} and {} were read",
            info.data_size,
            bytes.len()
        ))),
    }
}

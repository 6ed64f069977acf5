//! Owning wrappers around CoreFoundation and IOKit handles, plus the few property-list
//! accessors the platform layer needs.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

use super::bindings::*;
use crate::error::{Error, Result};

/// A CoreFoundation object this process holds one reference to.
#[derive(Debug)]
pub struct CfOwned(CFTypeRef);

// CF objects are reference counted atomically; the wrapped values are never mutated after creation.
unsafe impl Send for CfOwned {}
unsafe impl Sync for CfOwned {}

impl CfOwned {
    /// Take ownership of a pointer returned by a `Create` or `Copy` function.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a CF object whose reference the caller owns.
    pub unsafe fn from_create(ptr: CFTypeRef) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr))
        }
    }

    pub fn as_ptr(&self) -> CFTypeRef {
        self.0
    }

    pub fn as_mut_ptr(&self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl Drop for CfOwned {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) };
    }
}

/// Create a CFString from a Rust string.
pub fn cf_string(value: &str) -> Result<CfOwned> {
    let cstr = CString::new(value).map_err(|_| Error::invalid_data(format!("interior NUL in {:?}", value)))?;
    unsafe {
        CfOwned::from_create(CFStringCreateWithCString(kCFAllocatorDefault, cstr.as_ptr(), kCFStringEncodingUTF8))
            .ok_or_else(|| Error::system(format!("CFStringCreateWithCString failed for {:?}", value)))
    }
}

/// Copy a borrowed CFString into a Rust string.
///
/// # Safety
///
/// `string` must be null or a valid CFString.
pub unsafe fn string_from_cf(string: CFStringRef) -> Option<String> {
    if string.is_null() || CFGetTypeID(string) != CFStringGetTypeID() {
        return None;
    }

    let max = CFStringGetMaximumSizeForEncoding(CFStringGetLength(string), kCFStringEncodingUTF8) + 1;
    let mut buffer = vec![0 as c_char; usize::try_from(max).ok()?];
    if CFStringGetCString(string, buffer.as_mut_ptr(), max, kCFStringEncodingUTF8) == 0 {
        return None;
    }

    Some(CStr::from_ptr(buffer.as_ptr()).to_string_lossy().into_owned())
}

/// Look up `key` in a dictionary. The returned value is borrowed from `dict`.
///
/// # Safety
///
/// `dict` must be a valid CFDictionary.
pub unsafe fn dict_get(dict: CFDictionaryRef, key: &str) -> Result<Option<CFTypeRef>> {
    let key = cf_string(key)?;
    let value = CFDictionaryGetValue(dict, key.as_ptr());
    Ok((!value.is_null()).then_some(value))
}

/// Copy the bytes of a borrowed CFData.
///
/// # Safety
///
/// `data` must be null or a valid CF object.
pub unsafe fn data_bytes(data: CFTypeRef) -> Option<Vec<u8>> {
    if data.is_null() || CFGetTypeID(data) != CFDataGetTypeID() {
        return None;
    }

    let len = usize::try_from(CFDataGetLength(data)).ok()?;
    let ptr = CFDataGetBytePtr(data);
    if ptr.is_null() {
        return Some(Vec::new());
    }
    Some(std::slice::from_raw_parts(ptr, len).to_vec())
}

/// Read a borrowed CFNumber as a signed 64-bit integer.
///
/// # Safety
///
/// `number` must be null or a valid CF object.
pub unsafe fn number_i64(number: CFTypeRef) -> Option<i64> {
    if number.is_null() || CFGetTypeID(number) != CFNumberGetTypeID() {
        return None;
    }

    let mut value = 0i64;
    let ok = CFNumberGetValue(number, kCFNumberSInt64Type, &mut value as *mut i64 as *mut c_void);
    (ok != 0).then_some(value)
}

/// An IOKit object handle released on drop.
#[derive(Debug)]
pub struct IoObject(io_object_t);

impl IoObject {
    pub fn raw(&self) -> io_object_t {
        self.0
    }

    /// Registry name of the entry.
    pub fn name(&self) -> Option<String> {
        let mut buffer = [0 as c_char; IO_NAME_LEN];
        let kr = unsafe { IORegistryEntryGetName(self.0, buffer.as_mut_ptr()) };
        if kr != KERN_SUCCESS {
            return None;
        }
        Some(unsafe { CStr::from_ptr(buffer.as_ptr()) }.to_string_lossy().into_owned())
    }

    /// All registry properties of the entry.
    pub fn properties(&self) -> Result<CfOwned> {
        let mut props: CFMutableDictionaryRef = std::ptr::null_mut();
        let kr = unsafe { IORegistryEntryCreateCFProperties(self.0, &mut props, kCFAllocatorDefault, 0) };
        if kr != KERN_SUCCESS {
            return Err(Error::system(format!("IORegistryEntryCreateCFProperties failed: {}", kr)));
        }
        unsafe { CfOwned::from_create(props) }.ok_or_else(|| Error::system("registry entry has no properties"))
    }

    /// A single registry property, if present.
    pub fn property(&self, key: &str) -> Result<Option<CfOwned>> {
        let key = cf_string(key)?;
        Ok(unsafe { CfOwned::from_create(IORegistryEntryCreateCFProperty(self.0, key.as_ptr(), kCFAllocatorDefault, 0)) })
    }

    /// Parent in the service plane.
    pub fn parent(&self) -> Option<IoObject> {
        let mut parent: io_registry_entry_t = 0;
        let kr = unsafe { IORegistryEntryGetParentEntry(self.0, kIOServicePlane.as_ptr() as *const c_char, &mut parent) };
        (kr == KERN_SUCCESS && parent != 0).then_some(IoObject(parent))
    }

    pub fn conforms_to(&self, class: &CStr) -> bool {
        unsafe { IOObjectConformsTo(self.0, class.as_ptr()) != 0 }
    }

    /// The media object published under a BSD device name such as `disk3s1s1`.
    pub fn media_by_bsd_name(name: &str) -> Result<Option<IoObject>> {
        let name = CString::new(name).map_err(|_| Error::invalid_data(format!("interior NUL in {:?}", name)))?;
        let matching = unsafe { IOBSDNameMatching(kIOMainPortDefault, 0, name.as_ptr()) };
        if matching.is_null() {
            return Err(Error::system(format!("IOBSDNameMatching failed for {:?}", name)));
        }
        match unsafe { IOServiceGetMatchingService(kIOMainPortDefault, matching) } {
            0 => Ok(None),
            entry => Ok(Some(IoObject(entry))),
        }
    }
}

impl Drop for IoObject {
    fn drop(&mut self) {
        unsafe { IOObjectRelease(self.0) };
    }
}

/// Iterator over the registry entries matching a service class.
pub struct ServiceIter(io_iterator_t);

impl ServiceIter {
    pub fn matching(class: &str) -> Result<Self> {
        let class = CString::new(class).map_err(|_| Error::invalid_data(format!("interior NUL in {:?}", class)))?;
        let matching = unsafe { IOServiceMatching(class.as_ptr()) };
        if matching.is_null() {
            return Err(Error::system(format!("IOServiceMatching failed for {:?}", class)));
        }

        let mut iter: io_iterator_t = 0;
        let kr = unsafe { IOServiceGetMatchingServices(kIOMainPortDefault, matching, &mut iter) };
        if kr != KERN_SUCCESS {
            return Err(Error::system(format!("IOServiceGetMatchingServices failed for {:?}: {}", class, kr)));
        }
        Ok(Self(iter))
    }
}

impl Iterator for ServiceIter {
    type Item = IoObject;

    fn next(&mut self) -> Option<IoObject> {
        match unsafe { IOIteratorNext(self.0) } {
            0 => None,
            entry => Some(IoObject(entry)),
        }
    }
}

impl Drop for ServiceIter {
    fn drop(&mut self) {
        unsafe { IOObjectRelease(self.0) };
    }
}

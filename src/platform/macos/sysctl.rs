//! Typed `sysctl` reads.

use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::{c_int, c_void};
use std::ptr;

use crate::error::{Error, Result};

/// Read a fixed-size value by name.
pub fn by_name<T: Copy + Default>(name: &str) -> Result<T> {
    let cname = CString::new(name).map_err(|_| Error::invalid_data(format!("interior NUL in {:?}", name)))?;
    let mut value = T::default();
    let mut size = mem::size_of::<T>();

    let rc = unsafe {
        libc::sysctlbyname(cname.as_ptr(), &mut value as *mut T as *mut c_void, &mut size, ptr::null_mut(), 0)
    };
    if rc != 0 {
        return Err(Error::system(format!("sysctlbyname({}) failed: {}", name, std::io::Error::last_os_error())));
    }
    if size != mem::size_of::<T>() {
        return Err(Error::invalid_data(format!("sysctl {} returned {} bytes", name, size)));
    }
    Ok(value)
}

/// Read a string value by name.
pub fn string_by_name(name: &str) -> Result<String> {
    let bytes = bytes_by_name(name)?;
    let value = CStr::from_bytes_until_nul(&bytes)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
    Ok(value)
}

fn bytes_by_name(name: &str) -> Result<Vec<u8>> {
    let cname = CString::new(name).map_err(|_| Error::invalid_data(format!("interior NUL in {:?}", name)))?;
    let mut size = 0usize;

    let rc = unsafe { libc::sysctlbyname(cname.as_ptr(), ptr::null_mut(), &mut size, ptr::null_mut(), 0) };
    if rc != 0 {
        return Err(Error::system(format!("sysctlbyname({}) failed: {}", name, std::io::Error::last_os_error())));
    }

    let mut buffer = vec![0u8; size];
    let rc = unsafe {
        libc::sysctlbyname(cname.as_ptr(), buffer.as_mut_ptr() as *mut c_void, &mut size, ptr::null_mut(), 0)
    };
    if rc != 0 {
        return Err(Error::system(format!("sysctlbyname({}) failed: {}", name, std::io::Error::last_os_error())));
    }
    buffer.truncate(size);
    Ok(buffer)
}

/// Read a fixed-size value by MIB.
pub fn by_mib<T: Copy + Default>(mib: &mut [c_int]) -> Result<T> {
    let mut value = T::default();
    let mut size = mem::size_of::<T>();

    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as u32,
            &mut value as *mut T as *mut c_void,
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(Error::system(format!("sysctl {:?} failed: {}", mib, std::io::Error::last_os_error())));
    }
    Ok(value)
}

/// Read a variable-size table by MIB, sizing the buffer with a first probing call.
pub fn bytes_by_mib(mib: &mut [c_int]) -> Result<Vec<u8>> {
    let mut size = 0usize;
    let rc = unsafe { libc::sysctl(mib.as_mut_ptr(), mib.len() as u32, ptr::null_mut(), &mut size, ptr::null_mut(), 0) };
    if rc != 0 {
        return Err(Error::system(format!("sysctl {:?} failed: {}", mib, std::io::Error::last_os_error())));
    }

    let mut buffer = vec![0u8; size];
    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as u32,
            buffer.as_mut_ptr() as *mut c_void,
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(Error::system(format!("sysctl {:?} failed: {}", mib, std::io::Error::last_os_error())));
    }
    buffer.truncate(size);
    Ok(buffer)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named pipe instances carrying an explicit security descriptor.
//!
//! tokio only accepts raw `SECURITY_ATTRIBUTES`, so this is the one module
//! in the workspace allowed to use `unsafe`.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::io;
use std::ptr;

use tokio::net::windows::named_pipe::{NamedPipeServer, ServerOptions};
use windows_sys::Win32::Foundation::LocalFree;
use windows_sys::Win32::Security::Authorization::ConvertStringSecurityDescriptorToSecurityDescriptorW;
use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;

const SDDL_REVISION_1: u32 = 1;

/// Creates remote-rejecting pipe instances whose DACL is a fixed SDDL string.
#[derive(Debug, Clone)]
pub struct PipeSecurity {
    /// NUL-terminated UTF-16
    sddl: Vec<u16>,
}

impl PipeSecurity {
    pub fn new(sddl: &str) -> Self {
        Self { sddl: sddl.encode_utf16().chain(std::iter::once(0)).collect() }
    }

    /// Create one pipe instance. `first` fails if the name is already owned.
    pub fn create(&self, name: &str, first: bool) -> io::Result<NamedPipeServer> {
        let mut options = ServerOptions::new();
        options.first_pipe_instance(first).reject_remote_clients(true);

        let mut descriptor: *mut c_void = ptr::null_mut();
        // SAFETY: `sddl` is NUL-terminated and outlives the call. On success
        // the system allocates the descriptor; it is freed below.
        let converted = unsafe {
            ConvertStringSecurityDescriptorToSecurityDescriptorW(
                self.sddl.as_ptr(),
                SDDL_REVISION_1,
                &mut descriptor,
                ptr::null_mut(),
            )
        };
        if converted == 0 || descriptor.is_null() {
            return Err(io::Error::last_os_error());
        }

        let mut attributes = SECURITY_ATTRIBUTES {
            nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
            lpSecurityDescriptor: descriptor,
            bInheritHandle: 0,
        };
        // SAFETY: `attributes` and the descriptor it points to are valid for
        // the duration of the call; the pipe keeps its own copy.
        let created = unsafe {
            options.create_with_security_attributes_raw(
                name,
                (&mut attributes as *mut SECURITY_ATTRIBUTES).cast::<c_void>(),
            )
        };
        // SAFETY: allocated by ConvertStringSecurityDescriptorToSecurityDescriptorW
        // and not used after this point.
        unsafe { LocalFree(descriptor) };
        created
    }
}

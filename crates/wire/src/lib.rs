// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the privileged service and the user-session agent.
//!
//! Wire format: 4-byte length prefix (little-endian, signed 32-bit) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod endpoint;
mod request;
mod response;
mod wire;

pub use endpoint::{Endpoint, DEFAULT_ENDPOINT_NAME};
pub use request::{CommandRequest, DEFAULT_TIMEOUT_MS};
pub use response::CommandResponse;
pub use wire::{
    decode, encode, read_frame, read_message, read_request, read_response, write_frame,
    write_message, write_request, write_response, ProtocolError, MAX_FRAME_SIZE,
};

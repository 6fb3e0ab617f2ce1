// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex wire protocol for the Session Gateway.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod event;
pub mod frame;
pub mod operation;
pub mod request;
pub mod response;

pub use event::{Event, FileChangeKind, PortEventKind, ProcessStream};
pub use frame::{decode, encode, read_message, read_request, write_message, write_response, ProtocolError};
pub use operation::{DirEntry, Encoding, MountNode, Operation};
pub use request::Request;
pub use response::{Response, ResponseError};

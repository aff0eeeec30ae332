// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error surface of the backend.

use std::io;

use thiserror::Error;

/// Errors surfaced by connection setup, window and buffer creation, and the
/// dispatch loop.
///
/// Transport failures are unrecoverable: the dispatch thread exits and the
/// process is expected to shut down. Resource failures (a buffer that could
/// not be allocated, a device that could not be opened) are returned to the
/// caller of the operation and leave the rest of the display usable.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Connecting to the compositor failed.
    #[error("failed to connect to the compositor")]
    Connect(#[from] wayland_client::ConnectError),

    /// The transport socket failed; the connection is dead.
    #[error("wayland transport failure")]
    Transport(#[from] wayland_client::backend::WaylandError),

    /// Dispatching buffered events failed; the connection is dead.
    #[error("event dispatch failure")]
    Dispatch(#[from] wayland_client::DispatchError),

    /// The compositor does not advertise a required global.
    #[error("compositor does not advertise {0}")]
    GlobalMissing(&'static str),

    /// An operating-system call failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The compositor rejected a dmabuf buffer import.
    #[error("compositor rejected the dmabuf buffer parameters")]
    BufferImport,

    /// The dispatch thread has exited; no further requests can be served.
    #[error("display connection is shut down")]
    ConnectionClosed,
}

impl From<rustix::io::Errno> for DisplayError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(errno.into())
    }
}

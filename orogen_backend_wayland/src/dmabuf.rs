// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware buffer import through `zwp_linux_dmabuf_v1`.
//!
//! Import is asynchronous on the wire: the parameters object answers with
//! either a `created` or a `failed` event, delivered on the dispatch thread.
//! [`ImportState`] turns that into a blocking call for the importing thread,
//! which must therefore never be the dispatch thread itself.

use std::os::fd::OwnedFd;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use wayland_client::protocol::wl_buffer::WlBuffer;

use orogen_core::format::PixelFormat;

use crate::error::DisplayError;
use crate::shm::SlotState;

/// One memory plane of a dmabuf image.
#[derive(Debug)]
pub struct DmabufPlane {
    /// Descriptor of the plane's memory; ownership passes to the import.
    pub fd: OwnedFd,
    /// Byte offset of the plane within the descriptor.
    pub offset: u32,
    /// Row stride in bytes.
    pub stride: u32,
    /// DRM format modifier, linear if zero.
    pub modifier: u64,
}

/// A compositor-importable hardware buffer.
///
/// Attachable to widget surfaces; the compositor's release event marks the
/// underlying memory reusable, queryable through [`Self::in_use`].
#[derive(Debug)]
pub struct DmabufBuffer {
    pub(crate) buffer: WlBuffer,
    pub(crate) state: Arc<SlotState>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl DmabufBuffer {
    pub(crate) fn new(
        buffer: WlBuffer,
        state: Arc<SlotState>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Self {
        Self {
            buffer,
            state,
            width,
            height,
            format,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// True while the compositor may still read the buffer's memory.
    #[must_use]
    pub fn in_use(&self) -> bool {
        self.state.busy()
    }
}

impl Drop for DmabufBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

/// Rendezvous between the importing thread and the dispatch thread.
#[derive(Debug, Default)]
pub(crate) struct ImportState {
    outcome: Mutex<Option<Result<WlBuffer, ()>>>,
    done: Condvar,
}

/// The dispatch thread must answer well inside this; a miss means it exited.
const IMPORT_TIMEOUT: Duration = Duration::from_secs(5);

impl ImportState {
    pub(crate) fn fulfill(&self, outcome: Result<WlBuffer, ()>) {
        let mut slot = self.outcome.lock().expect("import outcome lock");
        *slot = Some(outcome);
        self.done.notify_all();
    }

    /// Blocks until the compositor answered the import.
    pub(crate) fn wait(&self) -> Result<WlBuffer, DisplayError> {
        let mut slot = self.outcome.lock().expect("import outcome lock");
        while slot.is_none() {
            let (guard, timed_out) = self
                .done
                .wait_timeout(slot, IMPORT_TIMEOUT)
                .expect("import outcome lock");
            slot = guard;
            if timed_out.timed_out() && slot.is_none() {
                return Err(DisplayError::ConnectionClosed);
            }
        }
        match slot.take() {
            Some(Ok(buffer)) => Ok(buffer),
            Some(Err(())) => Err(DisplayError::BufferImport),
            None => unreachable!("loop above exits only with an outcome"),
        }
    }
}

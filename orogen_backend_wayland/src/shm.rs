// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-memory buffer allocation.
//!
//! A [`BufferSet`] is a small array of equally sized pixel buffers carved out
//! of one anonymous memory file and exposed to the compositor through a
//! `wl_shm_pool`. Slots are handed out round-robin, skipping any slot the
//! compositor still holds; a slot becomes free again when its `wl_buffer`
//! release event arrives on the dispatch thread.

#![allow(
    unsafe_code,
    reason = "mapping the anonymous memory file requires memmap2's unsafe constructor"
)]

use std::fs::File;
use std::io;
use std::os::fd::AsFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::MmapMut;
use wayland_client::QueueHandle;
use wayland_client::protocol::{wl_buffer::WlBuffer, wl_shm, wl_shm::WlShm};

use orogen_core::format::PixelFormat;

use crate::display::DisplayContext;
use crate::error::DisplayError;

/// Release tracking for one slot, shared with the dispatch thread.
///
/// Set on submission, cleared by the buffer's release event.
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    busy: AtomicBool,
}

impl SlotState {
    pub(crate) fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub(crate) fn set_busy(&self) {
        self.busy.store(true, Ordering::Release);
    }

    pub(crate) fn busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Slot {
    buffer: WlBuffer,
    offset: usize,
    state: Arc<SlotState>,
}

/// A round-robin set of shared-memory pixel buffers.
#[derive(Debug)]
pub(crate) struct BufferSet {
    map: MmapMut,
    slots: Vec<Slot>,
    next: usize,
    width: u32,
    height: u32,
    stride: u32,
    slot_len: usize,
    format: PixelFormat,
}

/// Round-robin slot selection: the first non-busy slot at or after `next`,
/// wrapping, or `None` when every slot is busy.
fn next_free_slot(next: usize, count: usize, busy: impl Fn(usize) -> bool) -> Option<usize> {
    (0..count)
        .map(|step| (next + step) % count)
        .find(|&index| !busy(index))
}

/// Looks the format's shm wire code up in the pixel-format table.
fn shm_format(format: PixelFormat) -> Result<wl_shm::Format, DisplayError> {
    let unsupported = |what: &'static str| {
        DisplayError::Io(io::Error::new(io::ErrorKind::Unsupported, what))
    };
    let code = format
        .shm_code()
        .ok_or_else(|| unsupported("planar formats cannot back an shm pool"))?;
    wl_shm::Format::try_from(code)
        .map_err(|_| unsupported("format has no wl_shm counterpart"))
}

impl BufferSet {
    /// Allocates `count` buffers of `width` x `height` in `format`.
    ///
    /// The backing pool object is destroyed once the buffers exist; the
    /// compositor keeps the mapping alive through the buffers themselves.
    pub(crate) fn allocate(
        shm: &WlShm,
        qh: &QueueHandle<DisplayContext>,
        width: u32,
        height: u32,
        format: PixelFormat,
        count: usize,
    ) -> Result<Self, DisplayError> {
        debug_assert!(count >= 1, "a buffer set needs at least one slot");
        let wl_format = shm_format(format)?;
        let stride = format.stride(width);
        let slot_len = format.buffer_size(width, height) as usize;
        let total = slot_len * count;

        let memfd = rustix::fs::memfd_create("orogen-buffer", rustix::fs::MemfdFlags::CLOEXEC)?;
        rustix::fs::ftruncate(&memfd, total as u64)?;
        let file = File::from(memfd);
        // SAFETY: the file is a freshly created anonymous memory file sized
        // above; no other mapping of it exists.
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(DisplayError::Io)?;

        let too_large = || DisplayError::Io(io::Error::other("buffer set too large"));
        let pool_len = i32::try_from(total).map_err(|_| too_large())?;
        let slot_len_i = i32::try_from(slot_len).map_err(|_| too_large())?;
        let width_i = i32::try_from(width).map_err(|_| too_large())?;
        let height_i = i32::try_from(height).map_err(|_| too_large())?;
        let stride_i = i32::try_from(stride).map_err(|_| too_large())?;
        let pool = shm.create_pool(file.as_fd(), pool_len, qh, ());

        let slots = (0..count)
            .map(|index| {
                let offset = index * slot_len;
                let state = Arc::new(SlotState::default());
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "index * slot_len is bounded by pool_len above"
                )]
                let buffer = pool.create_buffer(
                    index as i32 * slot_len_i,
                    width_i,
                    height_i,
                    stride_i,
                    wl_format,
                    qh,
                    Arc::clone(&state),
                );
                Slot {
                    buffer,
                    offset,
                    state,
                }
            })
            .collect();
        pool.destroy();

        Ok(Self {
            map,
            slots,
            next: 0,
            width,
            height,
            stride,
            slot_len,
            format,
        })
    }

    /// Picks the next free slot, round-robin, or `None` when the compositor
    /// still holds every buffer.
    pub(crate) fn acquire(&mut self) -> Option<usize> {
        next_free_slot(self.next, self.slots.len(), |index| {
            self.slots[index].state.busy()
        })
    }

    /// Pixel bytes of `index`'s slot.
    pub(crate) fn slot_bytes(&mut self, index: usize) -> &mut [u8] {
        let offset = self.slots[index].offset;
        &mut self.map[offset..offset + self.slot_len]
    }

    pub(crate) fn buffer(&self, index: usize) -> &WlBuffer {
        &self.slots[index].buffer
    }

    /// Marks `index` as handed to the compositor and advances the rotation.
    pub(crate) fn mark_submitted(&mut self, index: usize) {
        self.slots[index].state.set_busy();
        self.next = (index + 1) % self.slots.len();
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn stride(&self) -> u32 {
        self.stride
    }

    pub(crate) fn format(&self) -> PixelFormat {
        self.format
    }
}

impl Drop for BufferSet {
    fn drop(&mut self) {
        for slot in &self.slots {
            slot.buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_slots_alternate() {
        // Submission advances next past the chosen slot, so with nothing
        // busy a two-slot set alternates 0, 1, 0, 1.
        let mut next = 0;
        let mut picks = Vec::new();
        for _ in 0..4 {
            let slot = next_free_slot(next, 2, |_| false).expect("free slot");
            picks.push(slot);
            next = (slot + 1) % 2;
        }
        assert_eq!(picks, [0, 1, 0, 1]);
    }

    #[test]
    fn busy_slots_are_skipped() {
        assert_eq!(next_free_slot(0, 3, |index| index == 0), Some(1));
        assert_eq!(next_free_slot(2, 3, |index| index == 2), Some(0));
    }

    #[test]
    fn no_slot_when_all_busy() {
        assert_eq!(next_free_slot(0, 2, |_| true), None);
    }

    #[test]
    fn shm_formats_derive_from_the_pixel_format_table() {
        assert_eq!(shm_format(PixelFormat::Argb8888).ok(), Some(wl_shm::Format::Argb8888));
        assert_eq!(shm_format(PixelFormat::Xrgb8888).ok(), Some(wl_shm::Format::Xrgb8888));
        assert_eq!(shm_format(PixelFormat::Rgb565).ok(), Some(wl_shm::Format::Rgb565));
        assert_eq!(shm_format(PixelFormat::Yuyv).ok(), Some(wl_shm::Format::Yuyv));
        assert_eq!(shm_format(PixelFormat::Gray8).ok(), Some(wl_shm::Format::R8));
        assert!(shm_format(PixelFormat::Nv12).is_err());
        assert!(shm_format(PixelFormat::Nv16).is_err());
    }
}

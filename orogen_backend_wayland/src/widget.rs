// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widgets: sub-areas of a window with their own buffers and event handler.
//!
//! Every window has an implicit root widget covering the whole surface. A
//! created [`Widget`] is backed by a desynchronized subsurface, so its
//! content can be swapped without re-committing the window, which is what
//! video-style producers need.

use std::io;
use std::sync::{Arc, Mutex};

use wayland_client::Proxy;
use wayland_client::protocol::{
    wl_subsurface::WlSubsurface, wl_surface::WlSurface,
};
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;

use orogen_core::event::WidgetEvent;
use orogen_core::format::PixelFormat;

use crate::dmabuf::DmabufBuffer;
use crate::error::DisplayError;
use crate::shm::BufferSet;
use crate::window::WindowId;

/// Identifier of a widget within its window.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct WidgetId(pub u64);

/// The implicit widget covering a window's main surface.
pub const ROOT_WIDGET: WidgetId = WidgetId(0);

/// Receives input events routed to one widget.
///
/// Invoked synchronously on the dispatch thread. The return value names the
/// widget that should hold focus for the event's device class from now on;
/// `None` clears that focus.
pub trait EventSink: Send {
    /// Handles one event.
    fn on_event(&mut self, event: &WidgetEvent) -> Option<WidgetId>;
}

impl<F> EventSink for F
where
    F: FnMut(&WidgetEvent) -> Option<WidgetId> + Send,
{
    fn on_event(&mut self, event: &WidgetEvent) -> Option<WidgetId> {
        self(event)
    }
}

/// Mutable pixel access to one buffer slot.
#[derive(Debug)]
pub struct Canvas<'a> {
    bytes: &'a mut [u8],
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(
        bytes: &'a mut [u8],
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
    ) -> Self {
        Self {
            bytes,
            width,
            height,
            stride,
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

    /// Row stride of the first plane, bytes.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The raw bytes of the buffer, all planes.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// Fills a 32-bit-per-pixel canvas with one packed color.
    ///
    /// No effect on formats with other pixel sizes.
    pub fn fill(&mut self, packed: u32) {
        if self.format.bytes_per_pixel() != 4 {
            return;
        }
        for pixel in self.bytes.chunks_exact_mut(4) {
            pixel.copy_from_slice(&packed.to_le_bytes());
        }
    }
}

/// Marks a surface's whole content as damaged.
///
/// `damage_buffer` needs `wl_surface` version 4; older compositors get the
/// surface-coordinate variant, which covers the same area here.
pub(crate) fn damage_whole(surface: &WlSurface) {
    if surface.version() >= 4 {
        surface.damage_buffer(0, 0, i32::MAX, i32::MAX);
    } else {
        surface.damage(0, 0, i32::MAX, i32::MAX);
    }
}

/// Surface-to-widget resolution record, attached to every surface the
/// backend creates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SurfaceTag {
    pub(crate) window: WindowId,
    pub(crate) widget: WidgetId,
}

pub(crate) struct WidgetInner {
    pub(crate) id: WidgetId,
    pub(crate) surface: WlSurface,
    subsurface: WlSubsurface,
    viewport: Option<WpViewport>,
    buffers: Mutex<Option<BufferSet>>,
    pub(crate) sink: Mutex<Option<Box<dyn EventSink>>>,
}

impl std::fmt::Debug for WidgetInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetInner").field("id", &self.id).finish()
    }
}

impl WidgetInner {
    pub(crate) fn new(
        id: WidgetId,
        surface: WlSurface,
        subsurface: WlSubsurface,
        viewport: Option<WpViewport>,
        buffers: Option<BufferSet>,
    ) -> Self {
        Self {
            id,
            surface,
            subsurface,
            viewport,
            buffers: Mutex::new(buffers),
            sink: Mutex::new(None),
        }
    }

    /// Invokes the widget's handler, or `None` when it has no handler.
    pub(crate) fn deliver(&self, event: &WidgetEvent) -> Option<Option<WidgetId>> {
        let mut sink = self.sink.lock().expect("widget sink lock");
        sink.as_mut().map(|sink| sink.on_event(event))
    }

    pub(crate) fn destroy_protocol_objects(&self) {
        if let Some(viewport) = &self.viewport {
            viewport.destroy();
        }
        self.subsurface.destroy();
        self.surface.destroy();
        *self.buffers.lock().expect("widget buffer lock") = None;
    }
}

/// A sub-area of a window, presented on its own subsurface.
///
/// Created through [`Window::create_widget`](crate::window::Window::create_widget).
#[derive(Debug)]
pub struct Widget {
    pub(crate) inner: Arc<WidgetInner>,
    pub(crate) window: Arc<crate::window::WindowInner>,
}

impl Widget {
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.inner.id
    }

    /// Installs the widget's event handler, replacing any previous one.
    pub fn set_event_handler(&self, sink: impl EventSink + 'static) {
        *self.inner.sink.lock().expect("widget sink lock") = Some(Box::new(sink));
    }

    /// Paints the next free buffer slot and presents it.
    ///
    /// Returns `Ok(false)` without painting when the compositor still holds
    /// every slot; the caller should retry after its next frame.
    pub fn update(
        &self,
        paint: impl FnOnce(&mut Canvas<'_>),
    ) -> Result<bool, DisplayError> {
        let mut buffers = self.inner.buffers.lock().expect("widget buffer lock");
        let Some(set) = buffers.as_mut() else {
            return Err(DisplayError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "widget was created without pixel buffers",
            )));
        };
        let Some(slot) = set.acquire() else {
            return Ok(false);
        };
        let (width, height, stride, format) =
            (set.width(), set.height(), set.stride(), set.format());
        let mut canvas = Canvas::new(set.slot_bytes(slot), width, height, stride, format);
        paint(&mut canvas);

        self.inner.surface.attach(Some(set.buffer(slot)), 0, 0);
        damage_whole(&self.inner.surface);
        set.mark_submitted(slot);
        self.inner.surface.commit();
        self.window.flush()?;
        Ok(true)
    }

    /// Presents an imported hardware buffer on the widget's surface.
    ///
    /// The buffer stays in use until the compositor releases it; check
    /// [`DmabufBuffer::in_use`] before rewriting its memory.
    pub fn attach_dmabuf(&self, buffer: &DmabufBuffer) -> Result<(), DisplayError> {
        self.inner.surface.attach(Some(&buffer.buffer), 0, 0);
        damage_whole(&self.inner.surface);
        buffer.state.set_busy();
        self.inner.surface.commit();
        self.window.flush()
    }

    /// Moves the widget within its window.
    ///
    /// Takes effect on the window's next frame.
    pub fn set_position(&self, x: i32, y: i32) {
        self.inner.subsurface.set_position(x, y);
        self.window.schedule_redraw();
    }

    /// Removes the widget from its window and releases its resources.
    pub fn destroy(self) {
        self.window.remove_widget(self.inner.id);
        self.inner.destroy_protocol_objects();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_fill_writes_every_pixel() {
        let mut bytes = [0_u8; 16];
        let mut canvas = Canvas::new(&mut bytes, 2, 2, 8, PixelFormat::Argb8888);
        canvas.fill(0xAABB_CCDD);
        for pixel in bytes.chunks_exact(4) {
            assert_eq!(pixel, 0xAABB_CCDD_u32.to_le_bytes());
        }
    }

    #[test]
    fn canvas_fill_leaves_non_rgb32_formats_alone() {
        let mut bytes = [7_u8; 8];
        let mut canvas = Canvas::new(&mut bytes, 2, 2, 4, PixelFormat::Rgb565);
        canvas.fill(0);
        assert_eq!(bytes, [7_u8; 8]);
    }

    #[test]
    fn closures_are_event_sinks() {
        let mut sink = |event: &WidgetEvent| -> Option<WidgetId> {
            let _ = event;
            Some(WidgetId(3))
        };
        let event = WidgetEvent::Keyboard(orogen_core::event::KeyboardEvent::Enter);
        assert_eq!(EventSink::on_event(&mut sink, &event), Some(WidgetId(3)));
    }
}

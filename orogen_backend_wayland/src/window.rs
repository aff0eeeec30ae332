// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toplevel windows and their render loop.
//!
//! A window owns one `xdg_toplevel`, a two-slot shared-memory buffer set,
//! and a render thread driven by the redraw state machine. Frame pacing is
//! compositor-driven: every submitted frame requests a one-shot frame
//! callback, and the acknowledgement (delivered on the dispatch thread)
//! releases the next redraw.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::Duration;

use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, QueueHandle};
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;
use wayland_protocols::xdg::shell::client::{
    xdg_surface::XdgSurface, xdg_toplevel::XdgToplevel,
};

use orogen_core::event::WidgetEvent;
use orogen_core::format::PixelFormat;
use orogen_core::pacing::FrameRate;
use orogen_core::worker::{RedrawHandle, RenderWorker};

use crate::display::{DisplayContext, DisplayShared, Globals};
use crate::error::DisplayError;
use crate::shm::BufferSet;
use crate::widget::{
    Canvas, EventSink, ROOT_WIDGET, SurfaceTag, Widget, WidgetId, WidgetInner, damage_whole,
};

/// Identifier of a window within its display.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct WindowId(pub u64);

/// Parameters for window creation.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub app_id: String,
    /// Initial width, used until the compositor configures a size.
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl WindowConfig {
    #[must_use]
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        let title = title.into();
        Self {
            app_id: format!("org.forest.{}", title.to_lowercase().replace(' ', "-")),
            title,
            width,
            height,
            format: PixelFormat::Argb8888,
        }
    }
}

/// Window slots per buffer set. One can be in flight while the render
/// thread paints the other.
const WINDOW_BUFFER_COUNT: usize = 2;

/// How long window creation waits for the compositor's first configure.
const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Configure {
    configured: bool,
    width: u32,
    height: u32,
}

pub(crate) struct WindowInner {
    id: WindowId,
    conn: Connection,
    qh: QueueHandle<DisplayContext>,
    globals: Globals,
    pub(crate) surface: WlSurface,
    xdg_surface: XdgSurface,
    toplevel: XdgToplevel,
    viewport: Option<WpViewport>,
    format: PixelFormat,
    configure: Mutex<Configure>,
    configured: Condvar,
    close_requested: AtomicBool,
    visible: AtomicBool,
    buffers: Mutex<Option<BufferSet>>,
    widgets: Mutex<Vec<Arc<WidgetInner>>>,
    root_sink: Mutex<Option<Box<dyn EventSink>>>,
    redraw: OnceLock<RedrawHandle>,
    pacing: Mutex<FrameRate>,
    next_widget: AtomicU64,
}

impl std::fmt::Debug for WindowInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowInner").field("id", &self.id).finish()
    }
}

impl WindowInner {
    pub(crate) fn new(
        id: WindowId,
        conn: Connection,
        qh: QueueHandle<DisplayContext>,
        globals: Globals,
        surface: WlSurface,
        xdg_surface: XdgSurface,
        toplevel: XdgToplevel,
        viewport: Option<WpViewport>,
        config: &WindowConfig,
    ) -> Self {
        Self {
            id,
            conn,
            qh,
            globals,
            surface,
            xdg_surface,
            toplevel,
            viewport,
            format: config.format,
            configure: Mutex::new(Configure {
                configured: false,
                width: config.width,
                height: config.height,
            }),
            configured: Condvar::new(),
            close_requested: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            buffers: Mutex::new(None),
            widgets: Mutex::new(Vec::new()),
            root_sink: Mutex::new(None),
            redraw: OnceLock::new(),
            pacing: Mutex::new(FrameRate::new()),
            next_widget: AtomicU64::new(1),
        }
    }

    pub(crate) fn id(&self) -> WindowId {
        self.id
    }

    pub(crate) fn attach_worker(&self, handle: RedrawHandle) {
        let _ = self.redraw.set(handle);
    }

    pub(crate) fn flush(&self) -> Result<(), DisplayError> {
        self.conn.flush()?;
        Ok(())
    }

    pub(crate) fn schedule_redraw(&self) {
        if let Some(redraw) = self.redraw.get() {
            redraw.schedule();
        }
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        let configure = self.configure.lock().expect("configure lock");
        (configure.width, configure.height)
    }

    fn visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
        self.schedule_redraw();
    }

    /// Handles `xdg_surface.configure`; called on the dispatch thread after
    /// the acknowledgement has been sent.
    pub(crate) fn configure_acked(&self) {
        let mut configure = self.configure.lock().expect("configure lock");
        configure.configured = true;
        self.configured.notify_all();
    }

    /// Applies a toplevel size from the compositor. Zero means "your
    /// choice", which keeps the current size.
    pub(crate) fn apply_toplevel_size(&self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let (width, height) = (width as u32, height as u32);
        let changed = {
            let mut configure = self.configure.lock().expect("configure lock");
            let changed = (configure.width, configure.height) != (width, height);
            configure.width = width;
            configure.height = height;
            changed
        };
        if changed {
            self.schedule_redraw();
        }
    }

    pub(crate) fn request_close(&self) {
        self.close_requested.store(true, Ordering::Release);
    }

    pub(crate) fn close_was_requested(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }

    /// Blocks until the compositor's first configure has been acknowledged.
    pub(crate) fn wait_configured(&self) -> bool {
        let mut configure = self.configure.lock().expect("configure lock");
        while !configure.configured {
            let (guard, timed_out) = self
                .configured
                .wait_timeout(configure, CONFIGURE_TIMEOUT)
                .expect("configure lock");
            configure = guard;
            if timed_out.timed_out() && !configure.configured {
                return false;
            }
        }
        true
    }

    /// Applies a frame acknowledgement. `timestamp_ms` is the compositor's
    /// presentation clock.
    pub(crate) fn frame_done(&self, timestamp_ms: u32) {
        self.pacing
            .lock()
            .expect("pacing lock")
            .record(u64::from(timestamp_ms) * 1_000);
        if let Some(redraw) = self.redraw.get() {
            redraw.frame_complete();
        }
    }

    pub(crate) fn frames_per_second(&self) -> Option<f64> {
        self.pacing.lock().expect("pacing lock").frames_per_second()
    }

    /// Paints and submits one frame. Runs on the render thread.
    pub(crate) fn render_frame(
        &self,
        paint: &mut (dyn FnMut(&mut Canvas<'_>) + Send),
        handle: &RedrawHandle,
    ) -> Result<(), DisplayError> {
        if !self.visible() {
            // An invisible window presents no content and submits no frame,
            // so no acknowledgement is expected either.
            self.surface.attach(None, 0, 0);
            self.surface.commit();
            return self.flush();
        }

        let (width, height) = self.size();
        let mut buffers = self.buffers.lock().expect("window buffer lock");
        let stale = buffers
            .as_ref()
            .is_some_and(|set| (set.width(), set.height()) != (width, height));
        if stale {
            *buffers = None;
        }
        if buffers.is_none() {
            *buffers = Some(BufferSet::allocate(
                &self.globals.shm,
                &self.qh,
                width,
                height,
                self.format,
                WINDOW_BUFFER_COUNT,
            )?);
            if let Some(viewport) = &self.viewport
                && let (Ok(width), Ok(height)) = (i32::try_from(width), i32::try_from(height))
            {
                viewport.set_destination(width, height);
            }
        }
        let set = buffers.as_mut().expect("buffer set allocated above");

        let Some(slot) = set.acquire() else {
            // Both slots with the compositor; the pending acknowledgement
            // will release one and re-run us through the parked request.
            log::debug!("window {:?}: every buffer in use, skipping frame", self.id);
            return Ok(());
        };
        let (stride, format) = (set.stride(), set.format());
        let mut canvas = Canvas::new(set.slot_bytes(slot), width, height, stride, format);
        paint(&mut canvas);

        self.surface.attach(Some(set.buffer(slot)), 0, 0);
        damage_whole(&self.surface);
        set.mark_submitted(slot);
        self.surface.frame(&self.qh, self.id);
        self.surface.commit();
        handle.frame_submitted();
        drop(buffers);
        self.flush()
    }

    /// Routes `event` to one of the window's widgets.
    ///
    /// Returns the handler's focus answer, or `None` when the target widget
    /// does not exist or declares no handler.
    pub(crate) fn deliver(
        &self,
        widget: WidgetId,
        event: &WidgetEvent,
    ) -> Option<Option<WidgetId>> {
        if widget == ROOT_WIDGET {
            let mut sink = self.root_sink.lock().expect("root sink lock");
            return sink.as_mut().map(|sink| sink.on_event(event));
        }
        let target = self.widget_by_id(widget)?;
        target.deliver(event)
    }

    /// True while `id` names the root widget or a live child widget.
    pub(crate) fn has_widget(&self, id: WidgetId) -> bool {
        id == ROOT_WIDGET
            || self
                .widgets
                .lock()
                .expect("widget list lock")
                .iter()
                .any(|widget| widget.id == id)
    }

    fn widget_by_id(&self, id: WidgetId) -> Option<Arc<WidgetInner>> {
        self.widgets
            .lock()
            .expect("widget list lock")
            .iter()
            .find(|widget| widget.id == id)
            .cloned()
    }

    pub(crate) fn set_root_sink(&self, sink: Box<dyn EventSink>) {
        *self.root_sink.lock().expect("root sink lock") = Some(sink);
    }

    pub(crate) fn remove_widget(&self, id: WidgetId) {
        self.widgets
            .lock()
            .expect("widget list lock")
            .retain(|widget| widget.id != id);
    }

    /// Destroys every protocol object of the window, widgets included.
    pub(crate) fn destroy_protocol_objects(&self) {
        let widgets = std::mem::take(&mut *self.widgets.lock().expect("widget list lock"));
        for widget in widgets {
            widget.destroy_protocol_objects();
        }
        if let Some(viewport) = &self.viewport {
            viewport.destroy();
        }
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        *self.buffers.lock().expect("window buffer lock") = None;
        self.surface.destroy();
    }
}

/// A clonable handle that can only request redraws.
///
/// Safe to capture in event handlers and other threads.
#[derive(Clone, Debug)]
pub struct RedrawScheduler {
    inner: Arc<WindowInner>,
}

impl RedrawScheduler {
    /// Requests a redraw of the window.
    pub fn schedule(&self) {
        self.inner.schedule_redraw();
    }
}

/// A toplevel window with its own render thread.
///
/// Dropping the window tears it down; [`Window::close`] does the same
/// explicitly.
#[derive(Debug)]
pub struct Window {
    inner: Arc<WindowInner>,
    worker: Option<RenderWorker>,
    shared: Arc<DisplayShared>,
}

impl Window {
    pub(crate) fn new(
        inner: Arc<WindowInner>,
        worker: RenderWorker,
        shared: Arc<DisplayShared>,
    ) -> Self {
        Self {
            inner,
            worker: Some(worker),
            shared,
        }
    }

    #[must_use]
    pub fn id(&self) -> WindowId {
        self.inner.id()
    }

    /// Requests a redraw; requests are coalesced while a frame is in flight.
    pub fn schedule_redraw(&self) {
        self.inner.schedule_redraw();
    }

    /// A clonable handle for requesting redraws from elsewhere.
    #[must_use]
    pub fn scheduler(&self) -> RedrawScheduler {
        RedrawScheduler {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn set_title(&self, title: &str) {
        self.inner.toplevel.set_title(title.into());
        let _ = self.inner.flush();
    }

    /// Hides or shows the window's content without destroying it.
    pub fn set_visible(&self, visible: bool) {
        self.inner.set_visible(visible);
    }

    /// Installs the root widget's event handler.
    pub fn set_event_handler(&self, sink: impl EventSink + 'static) {
        self.inner.set_root_sink(Box::new(sink));
    }

    /// True once the compositor asked the window to close.
    #[must_use]
    pub fn close_requested(&self) -> bool {
        self.inner.close_was_requested()
    }

    /// Current content size, pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    /// Smoothed presentation rate, once two frames have been acknowledged.
    #[must_use]
    pub fn frames_per_second(&self) -> Option<f64> {
        self.inner.frames_per_second()
    }

    /// Creates a widget of `width` x `height` at (`x`, `y`), backed by its
    /// own buffer set in `format`.
    pub fn create_widget(
        &self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Widget, DisplayError> {
        let inner = &self.inner;
        let id = WidgetId(inner.next_widget.fetch_add(1, Ordering::Relaxed));
        let tag = SurfaceTag {
            window: inner.id,
            widget: id,
        };
        let surface = inner.globals.compositor.create_surface(&inner.qh, tag);
        // Widgets present content only. An empty input region keeps pointer
        // hit-testing on the window's main surface, so enter events carry
        // the root surface even over a widget.
        let region = inner.globals.compositor.create_region(&inner.qh, ());
        surface.set_input_region(Some(&region));
        region.destroy();
        let subsurface = inner.globals.subcompositor.get_subsurface(
            &surface,
            &inner.surface,
            &inner.qh,
            (),
        );
        subsurface.set_position(x, y);
        subsurface.set_desync();
        let viewport = inner
            .globals
            .viewporter
            .as_ref()
            .map(|viewporter| viewporter.get_viewport(&surface, &inner.qh, ()));
        if let Some(viewport) = &viewport
            && let (Ok(width), Ok(height)) = (i32::try_from(width), i32::try_from(height))
        {
            viewport.set_destination(width, height);
        }

        let buffers = match BufferSet::allocate(
            &inner.globals.shm,
            &inner.qh,
            width,
            height,
            format,
            WINDOW_BUFFER_COUNT,
        ) {
            Ok(set) => Some(set),
            // Planar formats are dmabuf-only; the widget starts bufferless
            // and gets frames through attach_dmabuf.
            Err(DisplayError::Io(err)) if err.kind() == std::io::ErrorKind::Unsupported => None,
            Err(err) => {
                if let Some(viewport) = &viewport {
                    viewport.destroy();
                }
                subsurface.destroy();
                surface.destroy();
                return Err(err);
            }
        };

        let widget = Arc::new(WidgetInner::new(id, surface, subsurface, viewport, buffers));
        inner
            .widgets
            .lock()
            .expect("widget list lock")
            .push(Arc::clone(&widget));
        inner.flush()?;
        Ok(Widget {
            inner: widget,
            window: Arc::clone(inner),
        })
    }

    /// Tears the window down: stops the render thread, detaches the window
    /// from input routing, destroys its protocol objects, and waits for a
    /// synchronous round-trip so the compositor no longer references any of
    /// its buffers.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.terminate();
        self.shared.remove_window(self.inner.id());
        self.inner.destroy_protocol_objects();
        if let Err(err) = self.shared.sync_barrier() {
            log::warn!("window teardown round-trip failed: {err}");
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.teardown();
    }
}

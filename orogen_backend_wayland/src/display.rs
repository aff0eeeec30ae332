// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection bootstrap and the dispatch thread.
//!
//! [`Display::connect`] binds the compositor globals over a pair of
//! round-trips, then hands the event queue to a dedicated dispatch thread.
//! The thread owns the connection's read side exclusively and multiplexes it
//! with every registered auxiliary source:
//!
//! 1. drain already-buffered events until a read can be prepared,
//! 2. flush outgoing requests (failure is fatal),
//! 3. block on the poll set,
//! 4. dispatch ready auxiliary sources,
//! 5. read from the connection if it was ready, otherwise cancel the
//!    prepared read, then dispatch whatever was buffered.
//!
//! No other thread may read or dispatch; all other threads only issue
//! requests and flush.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{Builder, JoinHandle};
use std::time::Duration;

use wayland_client::backend::WaylandError;
use wayland_client::protocol::{
    wl_buffer::{self, WlBuffer},
    wl_callback::{self, WlCallback},
    wl_compositor::WlCompositor,
    wl_output::{self, WlOutput},
    wl_region::WlRegion,
    wl_registry::{self, WlRegistry},
    wl_seat::WlSeat,
    wl_shm::WlShm,
    wl_shm_pool::WlShmPool,
    wl_subcompositor::WlSubcompositor,
    wl_subsurface::WlSubsurface,
    wl_surface::{self, WlSurface},
};
use wayland_client::{
    Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum, delegate_noop,
    event_created_child,
};
use wayland_protocols::wp::linux_dmabuf::zv1::client::{
    zwp_linux_buffer_params_v1::{self, ZwpLinuxBufferParamsV1},
    zwp_linux_dmabuf_v1::ZwpLinuxDmabufV1,
};
use wayland_protocols::wp::viewporter::client::{
    wp_viewport::WpViewport, wp_viewporter::WpViewporter,
};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};

use orogen_core::event::WidgetEvent;
use orogen_core::format::PixelFormat;
use orogen_core::worker::RenderWorker;

use crate::dmabuf::{DmabufBuffer, DmabufPlane, ImportState};
use crate::error::DisplayError;
use crate::event_loop::{EventSource, PollSet, Ready, SourceRegistry};
use crate::output::{OutputId, OutputInfo, Transform};
use crate::seat::Seat;
use crate::shm::SlotState;
use crate::widget::{Canvas, ROOT_WIDGET, SurfaceTag};
use crate::window::{Window, WindowConfig, WindowId, WindowInner};

/// The globals a display needs. Viewporter and dmabuf are optional.
#[derive(Clone, Debug)]
pub(crate) struct Globals {
    pub(crate) compositor: WlCompositor,
    pub(crate) subcompositor: WlSubcompositor,
    pub(crate) shm: WlShm,
    pub(crate) wm_base: XdgWmBase,
    pub(crate) viewporter: Option<WpViewporter>,
    pub(crate) dmabuf: Option<ZwpLinuxDmabufV1>,
}

#[derive(Debug, Default)]
struct PendingGlobals {
    compositor: Option<WlCompositor>,
    subcompositor: Option<WlSubcompositor>,
    shm: Option<WlShm>,
    wm_base: Option<XdgWmBase>,
    viewporter: Option<WpViewporter>,
    dmabuf: Option<ZwpLinuxDmabufV1>,
}

impl PendingGlobals {
    fn take_bound(&mut self) -> Result<Globals, DisplayError> {
        Ok(Globals {
            compositor: self
                .compositor
                .take()
                .ok_or(DisplayError::GlobalMissing("wl_compositor"))?,
            subcompositor: self
                .subcompositor
                .take()
                .ok_or(DisplayError::GlobalMissing("wl_subcompositor"))?,
            shm: self.shm.take().ok_or(DisplayError::GlobalMissing("wl_shm"))?,
            wm_base: self
                .wm_base
                .take()
                .ok_or(DisplayError::GlobalMissing("xdg_wm_base"))?,
            viewporter: self.viewporter.take(),
            dmabuf: self.dmabuf.take(),
        })
    }
}

/// Round-trip rendezvous used by teardown barriers.
#[derive(Debug, Default)]
pub(crate) struct SyncPoint {
    done: Mutex<bool>,
    signal: Condvar,
}

const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

impl SyncPoint {
    fn signal(&self) {
        *self.done.lock().expect("sync point lock") = true;
        self.signal.notify_all();
    }

    fn wait(&self) -> Result<(), DisplayError> {
        let mut done = self.done.lock().expect("sync point lock");
        while !*done {
            let (guard, timed_out) = self
                .signal
                .wait_timeout(done, SYNC_TIMEOUT)
                .expect("sync point lock");
            done = guard;
            if timed_out.timed_out() && !*done {
                return Err(DisplayError::ConnectionClosed);
            }
        }
        Ok(())
    }
}

/// State shared between the application-facing handles and the dispatch
/// thread.
pub(crate) struct DisplayShared {
    conn: Connection,
    qh: QueueHandle<DisplayContext>,
    globals: OnceLock<Globals>,
    windows: Mutex<Vec<Arc<WindowInner>>>,
    outputs: Mutex<Vec<OutputInfo>>,
    sources: SourceRegistry,
    wake: OwnedFd,
    running: AtomicBool,
    next_window: AtomicU64,
}

impl std::fmt::Debug for DisplayShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayShared")
            .field("running", &self.running)
            .finish()
    }
}

impl DisplayShared {
    pub(crate) fn globals(&self) -> &Globals {
        self.globals.get().expect("globals are bound during connect")
    }

    pub(crate) fn window(&self, id: WindowId) -> Option<Arc<WindowInner>> {
        self.windows
            .lock()
            .expect("window list lock")
            .iter()
            .find(|window| window.id() == id)
            .cloned()
    }

    pub(crate) fn remove_window(&self, id: WindowId) {
        self.windows
            .lock()
            .expect("window list lock")
            .retain(|window| window.id() != id);
    }

    fn update_output(&self, id: OutputId, apply: impl FnOnce(&mut OutputInfo)) {
        let mut outputs = self.outputs.lock().expect("output list lock");
        if let Some(info) = outputs.iter_mut().find(|info| info.id == id) {
            apply(info);
        }
    }

    /// Issues a synchronous round-trip and waits for its completion on the
    /// dispatch thread.
    pub(crate) fn sync_barrier(&self) -> Result<(), DisplayError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(DisplayError::ConnectionClosed);
        }
        let point = Arc::new(SyncPoint::default());
        self.conn.display().sync(&self.qh, Arc::clone(&point));
        self.conn.flush()?;
        point.wait()
    }
}

/// Broadcast access to window root widgets, handed to auxiliary event
/// sources on the dispatch thread.
pub struct EventRouter<'a> {
    windows: &'a Mutex<Vec<Arc<WindowInner>>>,
}

impl std::fmt::Debug for EventRouter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter").finish_non_exhaustive()
    }
}

impl<'a> EventRouter<'a> {
    pub(crate) fn new(windows: &'a Mutex<Vec<Arc<WindowInner>>>) -> Self {
        Self { windows }
    }

    /// Offers `event` to every window's root widget in list order, stopping
    /// at the first handler that claims it. Returns whether it was claimed.
    pub fn broadcast(&mut self, event: &WidgetEvent) -> bool {
        let windows: Vec<Arc<WindowInner>> = self
            .windows
            .lock()
            .expect("window list lock")
            .clone();
        for window in windows {
            if let Some(answer) = window.deliver(ROOT_WIDGET, event)
                && answer.is_some()
            {
                return true;
            }
        }
        false
    }
}

/// Dispatch-thread state: protocol event handling, seats, bound outputs.
pub(crate) struct DisplayContext {
    pub(crate) shared: Arc<DisplayShared>,
    pub(crate) seats: Vec<Seat>,
    outputs: Vec<WlOutput>,
    pending: PendingGlobals,
    /// Set whenever a registry pass binds something; re-arms the bootstrap
    /// round-trip loop.
    saw_global: bool,
}

impl std::fmt::Debug for DisplayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayContext")
            .field("seats", &self.seats.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

impl DisplayContext {
    fn new(shared: Arc<DisplayShared>) -> Self {
        Self {
            shared,
            seats: Vec::new(),
            outputs: Vec::new(),
            pending: PendingGlobals::default(),
            saw_global: false,
        }
    }
}

fn token_of(fd: BorrowedFd<'_>) -> u64 {
    fd.as_raw_fd() as u64
}

/// A connection to the compositor, with its dispatch thread.
///
/// Dropping the display shuts the dispatch thread down; windows created from
/// it must be closed first.
#[derive(Debug)]
pub struct Display {
    shared: Arc<DisplayShared>,
    thread: Option<JoinHandle<()>>,
}

impl Display {
    /// Connects to the compositor named by the environment and starts the
    /// dispatch thread.
    pub fn connect() -> Result<Self, DisplayError> {
        let conn = Connection::connect_to_env()?;
        let mut queue: EventQueue<DisplayContext> = conn.new_event_queue();
        let qh = queue.handle();

        let poll = PollSet::new()?;
        let wake = rustix::event::eventfd(
            0,
            rustix::event::EventfdFlags::CLOEXEC | rustix::event::EventfdFlags::NONBLOCK,
        )?;
        let shared = Arc::new(DisplayShared {
            conn: conn.clone(),
            qh,
            globals: OnceLock::new(),
            windows: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
            sources: SourceRegistry::new(poll),
            wake,
            running: AtomicBool::new(true),
            next_window: AtomicU64::new(1),
        });

        let mut ctx = DisplayContext::new(Arc::clone(&shared));
        let _registry = conn.display().get_registry(&shared.qh, ());
        // Globals arrive in waves: binding an output or seat triggers its
        // initial burst (modes, capabilities), which can itself advertise
        // more. Round-trip until a pass binds nothing new.
        queue.roundtrip(&mut ctx)?;
        while std::mem::take(&mut ctx.saw_global) {
            queue.roundtrip(&mut ctx)?;
        }
        let globals = ctx.pending.take_bound()?;
        let _ = shared.globals.set(globals);

        let backend = conn.backend();
        let conn_fd = backend.poll_fd();
        shared.sources.poll().add(conn_fd, token_of(conn_fd))?;
        shared
            .sources
            .poll()
            .add(shared.wake.as_fd(), token_of(shared.wake.as_fd()))?;

        let thread_shared = Arc::clone(&shared);
        let thread = Builder::new()
            .name("orogen-dispatch".into())
            .spawn(move || run_dispatch(thread_shared, queue, ctx))?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Creates a window whose frames are painted by `paint` on the window's
    /// render thread.
    pub fn create_window(
        &self,
        config: &WindowConfig,
        paint: impl FnMut(&mut Canvas<'_>) + Send + 'static,
    ) -> Result<Window, DisplayError> {
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(DisplayError::ConnectionClosed);
        }
        let shared = &self.shared;
        let globals = shared.globals();
        let id = WindowId(shared.next_window.fetch_add(1, Ordering::Relaxed));
        let tag = SurfaceTag {
            window: id,
            widget: ROOT_WIDGET,
        };
        let surface = globals.compositor.create_surface(&shared.qh, tag);
        let xdg_surface = globals.wm_base.get_xdg_surface(&surface, &shared.qh, id);
        let toplevel = xdg_surface.get_toplevel(&shared.qh, id);
        toplevel.set_title(config.title.clone());
        toplevel.set_app_id(config.app_id.clone());
        let viewport = globals
            .viewporter
            .as_ref()
            .map(|viewporter| viewporter.get_viewport(&surface, &shared.qh, ()));

        let inner = Arc::new(WindowInner::new(
            id,
            shared.conn.clone(),
            shared.qh.clone(),
            globals.clone(),
            surface,
            xdg_surface,
            toplevel,
            viewport,
            config,
        ));
        shared
            .windows
            .lock()
            .expect("window list lock")
            .push(Arc::clone(&inner));
        inner.surface.commit();
        inner.flush()?;

        if !inner.wait_configured() {
            shared.remove_window(id);
            inner.destroy_protocol_objects();
            return Err(DisplayError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "compositor never configured the window",
            )));
        }

        let mut paint = paint;
        let render_inner = Arc::clone(&inner);
        let worker = RenderWorker::spawn(&format!("orogen-render-{}", id.0), move |handle| {
            if let Err(err) = render_inner.render_frame(&mut paint, handle) {
                log::warn!("window {:?}: frame failed: {err}", render_inner.id());
            }
        })
        .map_err(|err| {
            shared.remove_window(id);
            inner.destroy_protocol_objects();
            DisplayError::Io(err)
        })?;
        inner.attach_worker(worker.handle());
        inner.schedule_redraw();

        Ok(Window::new(inner, worker, Arc::clone(shared)))
    }

    /// Snapshot of the advertised outputs.
    #[must_use]
    pub fn outputs(&self) -> Vec<OutputInfo> {
        self.shared.outputs.lock().expect("output list lock").clone()
    }

    /// Watches an auxiliary event source on the dispatch thread.
    ///
    /// Fails if the source's descriptor is already registered.
    pub fn register_source(&self, source: Box<dyn EventSource>) -> Result<(), DisplayError> {
        self.shared.sources.register(source)
    }

    /// Stops watching the source registered under `fd` and drops it.
    pub fn unregister_source(&self, fd: RawFd) -> Result<(), DisplayError> {
        self.shared.sources.unregister(fd)
    }

    /// Imports a set of dmabuf planes as a presentable buffer.
    ///
    /// Blocks until the compositor accepts or rejects the parameters. Must
    /// not be called from a widget event handler, which runs on the dispatch
    /// thread.
    pub fn import_dmabuf(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: Vec<DmabufPlane>,
    ) -> Result<DmabufBuffer, DisplayError> {
        let Some(dmabuf) = self.shared.globals().dmabuf.as_ref() else {
            return Err(DisplayError::GlobalMissing("zwp_linux_dmabuf_v1"));
        };
        let import = Arc::new(ImportState::default());
        let params = dmabuf.create_params(&self.shared.qh, Arc::clone(&import));
        for (index, plane) in planes.iter().enumerate() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "plane counts are tiny and the modifier halves are exact"
            )]
            params.add(
                plane.fd.as_fd(),
                index as u32,
                plane.offset,
                plane.stride,
                (plane.modifier >> 32) as u32,
                (plane.modifier & 0xffff_ffff) as u32,
            );
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "buffer dimensions fit the protocol's i32"
        )]
        params.create(
            width as i32,
            height as i32,
            format.drm_fourcc(),
            zwp_linux_buffer_params_v1::Flags::empty(),
        );
        self.shared.conn.flush()?;
        let result = import.wait();
        params.destroy();
        let buffer = result?;
        let state = buffer
            .data::<Arc<SlotState>>()
            .cloned()
            .unwrap_or_default();
        Ok(DmabufBuffer::new(buffer, state, width, height, format))
    }

    /// Stops the dispatch thread and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shared.running.store(false, Ordering::Release);
        if let Err(err) = rustix::io::write(&self.shared.wake, &1_u64.to_ne_bytes()) {
            log::warn!("failed to wake the dispatch thread: {err}");
        }
        if thread.join().is_err() {
            log::error!("dispatch thread panicked");
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_dispatch(
    shared: Arc<DisplayShared>,
    mut queue: EventQueue<DisplayContext>,
    mut ctx: DisplayContext,
) {
    if let Err(err) = dispatch_loop(&shared, &mut queue, &mut ctx) {
        log::error!("dispatch thread exiting on fatal error: {err}");
    }
    shared.running.store(false, Ordering::Release);
}

fn dispatch_loop(
    shared: &DisplayShared,
    queue: &mut EventQueue<DisplayContext>,
    ctx: &mut DisplayContext,
) -> Result<(), DisplayError> {
    let backend = shared.conn.backend();
    let conn_token = token_of(backend.poll_fd());
    let wake_token = token_of(shared.wake.as_fd());
    let mut ready: Vec<Ready> = Vec::new();

    loop {
        // Events the library already buffered must be drained before a read
        // can be prepared, or the read would race against them.
        let guard = loop {
            match queue.prepare_read() {
                Some(guard) => break guard,
                None => {
                    queue.dispatch_pending(ctx)?;
                }
            }
        };
        shared.conn.flush()?;

        ready.clear();
        shared.sources.poll().wait(&mut ready)?;

        let mut display_readable = false;
        let mut woken = false;
        for report in &ready {
            if report.token == conn_token {
                display_readable = true;
            } else if report.token == wake_token {
                woken = true;
            } else {
                let mut router = EventRouter::new(&shared.windows);
                shared.sources.dispatch(report.token, &mut router, report.readiness);
            }
        }

        if display_readable {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(err)) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) => return Err(err.into()),
            }
            queue.dispatch_pending(ctx)?;
        } else {
            // Dropping the guard cancels the prepared read.
            drop(guard);
        }

        if woken {
            let mut drain = [0_u8; 8];
            let _ = rustix::io::read(&shared.wake, &mut drain);
            if !shared.running.load(Ordering::Acquire) {
                return Ok(());
            }
        }
    }
}

impl Dispatch<WlRegistry, ()> for DisplayContext {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                let bound = match interface.as_str() {
                    "wl_compositor" => {
                        state.pending.compositor =
                            Some(registry.bind(name, version.min(4), qh, ()));
                        true
                    }
                    "wl_subcompositor" => {
                        state.pending.subcompositor = Some(registry.bind(name, 1, qh, ()));
                        true
                    }
                    "wl_shm" => {
                        state.pending.shm = Some(registry.bind(name, 1, qh, ()));
                        true
                    }
                    "xdg_wm_base" => {
                        state.pending.wm_base =
                            Some(registry.bind(name, version.min(2), qh, ()));
                        true
                    }
                    "wp_viewporter" => {
                        state.pending.viewporter = Some(registry.bind(name, 1, qh, ()));
                        true
                    }
                    "zwp_linux_dmabuf_v1" => {
                        state.pending.dmabuf =
                            Some(registry.bind(name, version.min(3), qh, ()));
                        true
                    }
                    "wl_output" => {
                        let output: WlOutput = registry.bind(name, version.min(3), qh, name);
                        state.outputs.push(output);
                        state
                            .shared
                            .outputs
                            .lock()
                            .expect("output list lock")
                            .push(OutputInfo::new(OutputId(name)));
                        true
                    }
                    "wl_seat" => {
                        let seat: WlSeat = registry.bind(name, version.min(5), qh, name);
                        state.seats.push(Seat::new(seat, name));
                        true
                    }
                    _ => false,
                };
                state.saw_global |= bound;
            }
            wl_registry::Event::GlobalRemove { name } => {
                if let Some(index) = state
                    .outputs
                    .iter()
                    .position(|output| output.data::<u32>() == Some(&name))
                {
                    let output = state.outputs.swap_remove(index);
                    if output.version() >= 3 {
                        output.release();
                    }
                    state
                        .shared
                        .outputs
                        .lock()
                        .expect("output list lock")
                        .retain(|info| info.id != OutputId(name));
                }
                if let Some(index) = state
                    .seats
                    .iter()
                    .position(|seat| seat.registry_name == name)
                {
                    let mut seat = state.seats.swap_remove(index);
                    seat.release_devices();
                    if seat.seat.version() >= 5 {
                        seat.seat.release();
                    }
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<WlOutput, u32> for DisplayContext {
    fn event(
        state: &mut Self,
        _: &WlOutput,
        event: wl_output::Event,
        name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let id = OutputId(*name);
        match event {
            wl_output::Event::Geometry {
                transform: WEnum::Value(transform),
                ..
            } => {
                state
                    .shared
                    .update_output(id, |info| info.transform = Transform::from_wayland(transform));
            }
            wl_output::Event::Mode {
                flags: WEnum::Value(flags),
                width,
                height,
                ..
            } if flags.contains(wl_output::Mode::Current) => {
                state.shared.update_output(id, |info| {
                    info.width = width;
                    info.height = height;
                });
            }
            wl_output::Event::Scale { factor } => {
                state.shared.update_output(id, |info| info.scale = factor);
            }
            _ => {}
        }
    }
}

impl Dispatch<XdgWmBase, ()> for DisplayContext {
    fn event(
        _: &mut Self,
        wm_base: &XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, WindowId> for DisplayContext {
    fn event(
        state: &mut Self,
        xdg_surface: &XdgSurface,
        event: xdg_surface::Event,
        window: &WindowId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg_surface.ack_configure(serial);
            if let Some(window) = state.shared.window(*window) {
                window.configure_acked();
            }
        }
    }
}

impl Dispatch<XdgToplevel, WindowId> for DisplayContext {
    fn event(
        state: &mut Self,
        _: &XdgToplevel,
        event: xdg_toplevel::Event,
        window: &WindowId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(window) = state.shared.window(*window) else {
            return;
        };
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                window.apply_toplevel_size(width, height);
            }
            xdg_toplevel::Event::Close => {
                window.request_close();
            }
            _ => {}
        }
    }
}

impl Dispatch<WlSurface, SurfaceTag> for DisplayContext {
    fn event(
        _: &mut Self,
        _: &WlSurface,
        _: wl_surface::Event,
        _: &SurfaceTag,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

/// Frame callbacks carry their window; the acknowledgement drives pacing.
impl Dispatch<WlCallback, WindowId> for DisplayContext {
    fn event(
        state: &mut Self,
        _: &WlCallback,
        event: wl_callback::Event,
        window: &WindowId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            if let Some(window) = state.shared.window(*window) {
                window.frame_done(callback_data);
            } else {
                // The window died between submission and acknowledgement;
                // teardown already waited for its barrier.
                log::debug!("frame acknowledgement for a closed window {window:?}");
            }
        }
    }
}

impl Dispatch<WlCallback, Arc<SyncPoint>> for DisplayContext {
    fn event(
        _: &mut Self,
        _: &WlCallback,
        event: wl_callback::Event,
        point: &Arc<SyncPoint>,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            point.signal();
        }
    }
}

impl Dispatch<WlBuffer, Arc<SlotState>> for DisplayContext {
    fn event(
        _: &mut Self,
        _: &WlBuffer,
        event: wl_buffer::Event,
        slot: &Arc<SlotState>,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            slot.release();
        }
    }
}

impl Dispatch<ZwpLinuxBufferParamsV1, Arc<ImportState>> for DisplayContext {
    fn event(
        _: &mut Self,
        _: &ZwpLinuxBufferParamsV1,
        event: zwp_linux_buffer_params_v1::Event,
        import: &Arc<ImportState>,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwp_linux_buffer_params_v1::Event::Created { buffer } => {
                import.fulfill(Ok(buffer));
            }
            zwp_linux_buffer_params_v1::Event::Failed => {
                import.fulfill(Err(()));
            }
            _ => {}
        }
    }

    event_created_child!(DisplayContext, ZwpLinuxBufferParamsV1, [
        zwp_linux_buffer_params_v1::EVT_CREATED_OPCODE => (WlBuffer, Arc::new(SlotState::default())),
    ]);
}

delegate_noop!(DisplayContext: WlCompositor);
delegate_noop!(DisplayContext: WlRegion);
delegate_noop!(DisplayContext: WlSubcompositor);
delegate_noop!(DisplayContext: ignore WlShm);
delegate_noop!(DisplayContext: WlShmPool);
delegate_noop!(DisplayContext: WlSubsurface);
delegate_noop!(DisplayContext: WpViewporter);
delegate_noop!(DisplayContext: WpViewport);
delegate_noop!(DisplayContext: ignore ZwpLinuxDmabufV1);

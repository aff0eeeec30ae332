// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for Orogen.
//!
//! A [`Display`] owns the compositor connection and a dispatch thread that
//! multiplexes it with auxiliary input sources. Windows created from it each
//! run their own render thread, paced by compositor frame callbacks so at
//! most one frame per window is ever in flight.
//!
//! ```no_run
//! use orogen_backend_wayland::{Display, WindowConfig};
//!
//! # fn main() -> Result<(), orogen_backend_wayland::DisplayError> {
//! let display = Display::connect()?;
//! let window = display.create_window(&WindowConfig::new("demo", 640, 480), |canvas| {
//!     canvas.fill(0xFF10_1010);
//! })?;
//! window.schedule_redraw();
//! # Ok(())
//! # }
//! ```
//!
//! Input events are routed per device class to the widget holding that
//! class's focus, falling back to the window's root widget; handlers return
//! the widget that should hold focus next. Devices without surface
//! addressing ([`SpacenavSource`], [`JoystickSource`]) broadcast to every
//! window's root widget instead.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod display;
mod dmabuf;
mod error;
mod event_loop;
mod output;
mod seat;
mod shm;
mod sources;
mod widget;
mod window;

pub use display::{Display, EventRouter};
pub use dmabuf::{DmabufBuffer, DmabufPlane};
pub use error::DisplayError;
pub use event_loop::{EventSource, Readiness, SourceAction};
pub use output::{OutputId, OutputInfo, Transform};
pub use sources::{
    JOYSTICK_DEVICE, JoystickSource, SPACENAV_SOCKET, SpacenavSource,
};
pub use widget::{Canvas, EventSink, ROOT_WIDGET, Widget, WidgetId};
pub use window::{RedrawScheduler, Window, WindowConfig, WindowId};

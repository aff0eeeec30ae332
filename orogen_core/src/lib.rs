// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for threaded, frame-paced windowing.
//!
//! `orogen_core` holds the platform-independent half of the Orogen windowing
//! layer. A platform backend (such as `orogen_backend_wayland`) owns the
//! display connection and its dispatch thread; this crate owns the machinery
//! each window uses to turn redraw requests into exactly-once frame
//! submissions, and the types that flow between the dispatch thread and
//! application widgets.
//!
//! # Architecture
//!
//! Each window runs the same loop between three threads:
//!
//! ```text
//!   caller thread                render thread            dispatch thread
//!   -------------                -------------            ---------------
//!   schedule() ───────────────►  wait / take
//!                                redraw callback
//!                                  └─ frame_submitted()
//!                                                    ◄─── frame_complete()
//!                                (woken again iff a request
//!                                 arrived while in flight)
//! ```
//!
//! **[`redraw`]**: the explicit redraw state machine: `Idle`, `Scheduled`,
//! `InFlight`, `InFlightPending`, `Terminating`. Coalescing and the
//! one-frame-in-flight rule are encoded in the transition methods.
//!
//! **[`worker`]** (`std` feature): [`RenderWorker`](worker::RenderWorker)
//! wraps the state machine in a `Mutex`/`Condvar` pair and a dedicated
//! thread running the redraw callback.
//!
//! **[`event`]**: typed widget events per device class (pointer, keyboard,
//! touch, spacenav, joystick).
//!
//! **[`focus`]**: [`FocusMap`](focus::FocusMap): the per-device-class focus
//! reference and its resolution rules.
//!
//! **[`format`]**: pixel formats with DRM fourcc and shared-memory layout
//! information.
//!
//! **[`pacing`]**: exponentially averaged frame-rate estimation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables the [`worker`] module.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(feature = "std")]
extern crate std;

pub mod event;
pub mod focus;
pub mod format;
pub mod pacing;
pub mod redraw;
#[cfg(feature = "std")]
pub mod worker;

// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-worker thread around the redraw state machine.
//!
//! Each window owns one [`RenderWorker`]: a dedicated thread that sleeps on a
//! condition variable until a redraw is scheduled, runs the window's redraw
//! callback with no lock held, and exits cooperatively on termination.
//!
//! [`RedrawHandle`] is the cheaply clonable control surface shared with the
//! rest of the system: the application schedules redraws through it, the
//! redraw callback reports frame submission, and the backend's dispatch
//! thread reports compositor acknowledgements.
//!
//! A callback already in progress is never interrupted; termination is
//! observed when the render thread next returns to its wait loop, and
//! [`RenderWorker::terminate`] joins the thread before returning.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{Builder, JoinHandle};

use crate::redraw::RedrawState;

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<RedrawState>,
    wake: Condvar,
}

/// Locks the state, recovering from a poisoned lock.
///
/// A poisoned lock means a redraw callback panicked; the state machine itself
/// is always left consistent (transitions are single assignments), so the
/// remaining threads keep going rather than cascading the panic.
fn lock_state(shared: &Shared) -> MutexGuard<'_, RedrawState> {
    match shared.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Control handle for one window's redraw loop.
///
/// Clones share the same underlying state. All methods are safe to call from
/// any thread.
#[derive(Clone, Debug)]
pub struct RedrawHandle {
    shared: Arc<Shared>,
}

impl RedrawHandle {
    /// Requests a redraw.
    ///
    /// Requests arriving while a redraw is already queued are coalesced;
    /// requests arriving while a frame is in flight are parked and released
    /// by the next [`frame_complete`](Self::frame_complete).
    pub fn schedule(&self) {
        let wake = {
            let mut state = lock_state(&self.shared);
            state.schedule()
        };
        if wake {
            self.shared.wake.notify_one();
        }
    }

    /// Records that the redraw callback has submitted a frame.
    ///
    /// Must be called by the redraw callback (or the submit path it invokes)
    /// once per produced frame, after the commit has been issued.
    pub fn frame_submitted(&self) {
        lock_state(&self.shared).submit();
    }

    /// Applies a compositor frame acknowledgement.
    ///
    /// Called by the backend when the compositor signals that the previously
    /// submitted frame was processed. Releases a parked redraw, if any.
    pub fn frame_complete(&self) {
        let wake = {
            let mut state = lock_state(&self.shared);
            state.frame_complete()
        };
        if wake {
            self.shared.wake.notify_one();
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RedrawState {
        *lock_state(&self.shared)
    }
}

/// A per-window render thread driven by a [`RedrawHandle`].
///
/// The callback runs once per taken redraw request with no lock held; it is
/// expected to paint and submit a frame, reporting the submission through
/// the handle it receives.
#[derive(Debug)]
pub struct RenderWorker {
    handle: RedrawHandle,
    thread: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Spawns the render thread.
    ///
    /// `name` is used for the OS thread name. The worker starts idle; the
    /// first [`RedrawHandle::schedule`] wakes it.
    pub fn spawn<F>(name: &str, mut callback: F) -> io::Result<Self>
    where
        F: FnMut(&RedrawHandle) + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let handle = RedrawHandle {
            shared: Arc::clone(&shared),
        };
        let thread_handle = handle.clone();

        let thread = Builder::new().name(name.into()).spawn(move || {
            let shared = &thread_handle.shared;
            let mut state = lock_state(shared);
            loop {
                while !state.wakes_render_thread() {
                    state = match shared.wake.wait(state) {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                }
                if *state == RedrawState::Terminating {
                    break;
                }
                let taken = state.take();
                debug_assert!(taken, "woken without a queued redraw");
                drop(state);

                callback(&thread_handle);

                state = lock_state(shared);
            }
        })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Returns a clone of the control handle.
    #[must_use]
    pub fn handle(&self) -> RedrawHandle {
        self.handle.clone()
    }

    /// Asks the render thread to exit and joins it.
    ///
    /// Returns only after the thread has exited, regardless of the state the
    /// window was in. A callback in progress completes first.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        {
            let mut state = lock_state(&self.handle.shared);
            state.terminate();
        }
        self.handle.shared.wake.notify_one();
        // A panicking callback already tore the window down; nothing left to
        // unwind here.
        let _ = thread.join();
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::RenderWorker;
    use crate::redraw::RedrawState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    const TICK: Duration = Duration::from_secs(2);

    /// Worker whose callback submits a frame and reports each invocation on
    /// a channel.
    fn submitting_worker() -> (RenderWorker, Arc<AtomicUsize>, mpsc::Receiver<()>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let (tx, rx) = mpsc::channel();
        let worker = RenderWorker::spawn("test-render", move |handle| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
            handle.frame_submitted();
            tx.send(()).expect("test receiver alive");
        })
        .expect("spawn worker");
        (worker, calls, rx)
    }

    #[test]
    fn single_schedule_runs_exactly_one_callback() {
        let (worker, calls, rx) = submitting_worker();
        let handle = worker.handle();

        handle.schedule();
        rx.recv_timeout(TICK).expect("callback ran");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Acknowledge; no further callback may appear.
        handle.frame_complete();
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(handle.state(), RedrawState::Idle);

        worker.terminate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schedules_during_flight_coalesce_into_one_follow_up() {
        let (worker, calls, rx) = submitting_worker();
        let handle = worker.handle();

        handle.schedule();
        rx.recv_timeout(TICK).expect("first callback");
        // Frame is now in flight; two further requests must coalesce.
        handle.schedule();
        handle.schedule();
        assert_eq!(handle.state(), RedrawState::InFlightPending);

        handle.frame_complete();
        rx.recv_timeout(TICK).expect("follow-up callback");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.frame_complete();
        assert_eq!(handle.state(), RedrawState::Idle);
        worker.terminate();
    }

    #[test]
    fn callback_count_is_bounded_by_schedule_count() {
        let (worker, calls, rx) = submitting_worker();
        let handle = worker.handle();
        let schedules = 16;

        for _ in 0..schedules {
            handle.schedule();
            // Acknowledge whenever a frame went out so the loop can make
            // progress in arbitrary interleavings.
            if let Ok(()) = rx.recv_timeout(Duration::from_millis(20)) {
                handle.frame_complete();
            }
        }
        // Drain any trailing callback.
        while rx.recv_timeout(Duration::from_millis(100)).is_ok() {
            handle.frame_complete();
        }

        let ran = calls.load(Ordering::SeqCst);
        assert!(ran >= 1, "at least one callback must run");
        assert!(ran <= schedules, "coalescing may never add callbacks");
        worker.terminate();
    }

    #[test]
    fn terminate_returns_with_no_work_queued() {
        let (worker, calls, _rx) = submitting_worker();
        worker.terminate();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn terminate_returns_while_frame_in_flight() {
        let (worker, _calls, rx) = submitting_worker();
        let handle = worker.handle();
        handle.schedule();
        rx.recv_timeout(TICK).expect("callback ran");
        assert_eq!(handle.state(), RedrawState::InFlight);
        // No acknowledgement will ever arrive; terminate must still return.
        worker.terminate();
    }

    #[test]
    fn terminate_waits_for_callback_in_progress() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let finished = Arc::new(AtomicUsize::new(0));
        let finished_cb = Arc::clone(&finished);

        let worker = RenderWorker::spawn("test-render", move |_handle| {
            entered_tx.send(()).expect("test receiver alive");
            release_rx.recv().expect("release signal");
            finished_cb.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn worker");

        worker.handle().schedule();
        entered_rx.recv_timeout(TICK).expect("callback entered");
        release_tx.send(()).expect("worker alive");
        worker.terminate();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_joins_the_thread() {
        let (worker, _calls, _rx) = submitting_worker();
        drop(worker);
    }
}

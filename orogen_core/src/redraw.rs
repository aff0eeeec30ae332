// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-window redraw state machine.
//!
//! Each window owns one [`RedrawState`] that mediates between three parties:
//! any thread requesting a redraw ([`schedule`](RedrawState::schedule)), the
//! window's render thread ([`take`](RedrawState::take) /
//! [`submit`](RedrawState::submit)), and the dispatch thread delivering
//! compositor frame acknowledgements
//! ([`frame_complete`](RedrawState::frame_complete)).
//!
//! The states make two invariants unrepresentable:
//!
//! - a follow-up request can only exist while a frame is in flight
//!   ([`InFlightPending`](RedrawState::InFlightPending)), and
//! - a queued redraw can only exist while no frame is in flight
//!   ([`Scheduled`](RedrawState::Scheduled)).
//!
//! Together they give the coalescing guarantee: any number of `schedule`
//! calls while a frame is in flight collapse into exactly one follow-up
//! frame, never more and never fewer.
//!
//! The machine itself is lock-free data; callers serialize access. The
//! [`worker`](crate::worker) module wraps it in a `Mutex`/`Condvar` pair.

/// Redraw lifecycle of a single window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RedrawState {
    /// Nothing requested, nothing in flight.
    #[default]
    Idle,
    /// A redraw has been requested and the render thread has not yet taken it.
    Scheduled,
    /// A frame has been submitted and awaits compositor acknowledgement.
    InFlight,
    /// In flight, plus a follow-up request arrived meanwhile.
    InFlightPending,
    /// The render thread has been asked to exit.
    Terminating,
}

impl RedrawState {
    /// Requests a redraw.
    ///
    /// Returns `true` when the render thread must be woken: only the
    /// `Idle → Scheduled` edge wakes it. A request arriving while a frame is
    /// in flight is parked as `InFlightPending`; there is nothing to wake
    /// until the acknowledgement arrives. Repeat requests and requests after
    /// termination are no-ops.
    #[must_use]
    pub fn schedule(&mut self) -> bool {
        match *self {
            Self::Idle => {
                *self = Self::Scheduled;
                true
            }
            Self::InFlight => {
                *self = Self::InFlightPending;
                false
            }
            Self::Scheduled | Self::InFlightPending | Self::Terminating => false,
        }
    }

    /// Consumes a queued redraw on the render thread.
    ///
    /// Returns `true` and moves `Scheduled → Idle` when a request was
    /// pending; otherwise leaves the state untouched.
    #[must_use]
    pub fn take(&mut self) -> bool {
        if *self == Self::Scheduled {
            *self = Self::Idle;
            true
        } else {
            false
        }
    }

    /// Marks a frame as submitted to the compositor.
    ///
    /// Called from the redraw callback after the commit. A `schedule` that
    /// raced in between [`take`](Self::take) and the commit is carried over
    /// into `InFlightPending` so it is not lost. Submitting while a frame is
    /// already in flight is a contract violation: it debug-asserts and is
    /// otherwise ignored.
    pub fn submit(&mut self) {
        match *self {
            Self::Idle => *self = Self::InFlight,
            Self::Scheduled => *self = Self::InFlightPending,
            Self::InFlight | Self::InFlightPending => {
                debug_assert!(false, "frame submitted while one is already in flight");
            }
            Self::Terminating => {}
        }
    }

    /// Applies a compositor frame acknowledgement.
    ///
    /// Returns `true` when the render thread must be woken because a parked
    /// request was released (`InFlightPending → Scheduled`). An
    /// acknowledgement while no frame is in flight is a contract violation:
    /// it debug-asserts and is otherwise ignored.
    #[must_use]
    pub fn frame_complete(&mut self) -> bool {
        match *self {
            Self::InFlight => {
                *self = Self::Idle;
                false
            }
            Self::InFlightPending => {
                *self = Self::Scheduled;
                true
            }
            Self::Idle | Self::Scheduled => {
                debug_assert!(false, "frame acknowledgement while no frame is in flight");
                false
            }
            Self::Terminating => false,
        }
    }

    /// Asks the render thread to exit. Valid in every state.
    pub fn terminate(&mut self) {
        *self = Self::Terminating;
    }

    /// Whether the render thread has work: a queued redraw or termination.
    ///
    /// This is the wait predicate for the render thread's condition variable.
    #[must_use]
    pub const fn wakes_render_thread(self) -> bool {
        matches!(self, Self::Scheduled | Self::Terminating)
    }

    /// Whether a frame is currently awaiting acknowledgement.
    #[must_use]
    pub const fn in_flight(self) -> bool {
        matches!(self, Self::InFlight | Self::InFlightPending)
    }
}

#[cfg(test)]
mod tests {
    use super::RedrawState;

    #[test]
    fn schedule_from_idle_wakes_render_thread() {
        let mut state = RedrawState::Idle;
        assert!(state.schedule());
        assert_eq!(state, RedrawState::Scheduled);
    }

    #[test]
    fn repeated_schedules_coalesce() {
        let mut state = RedrawState::Idle;
        assert!(state.schedule());
        assert!(!state.schedule());
        assert!(!state.schedule());
        assert_eq!(state, RedrawState::Scheduled);
    }

    #[test]
    fn schedule_while_in_flight_parks_one_follow_up() {
        let mut state = RedrawState::InFlight;
        assert!(!state.schedule());
        assert_eq!(state, RedrawState::InFlightPending);
        assert!(!state.schedule());
        assert_eq!(state, RedrawState::InFlightPending);
    }

    #[test]
    fn take_consumes_only_scheduled() {
        let mut state = RedrawState::Scheduled;
        assert!(state.take());
        assert_eq!(state, RedrawState::Idle);
        assert!(!state.take());
    }

    #[test]
    fn submit_after_raced_schedule_keeps_the_request() {
        // schedule() landed between take() and the commit; the request must
        // survive as a parked follow-up.
        let mut state = RedrawState::Scheduled;
        state.submit();
        assert_eq!(state, RedrawState::InFlightPending);
    }

    #[test]
    fn acknowledgement_returns_to_idle() {
        let mut state = RedrawState::InFlight;
        assert!(!state.frame_complete());
        assert_eq!(state, RedrawState::Idle);
    }

    #[test]
    fn acknowledgement_releases_parked_request() {
        let mut state = RedrawState::InFlightPending;
        assert!(state.frame_complete());
        assert_eq!(state, RedrawState::Scheduled);
    }

    #[test]
    fn full_cycle_schedule_submit_ack() {
        let mut state = RedrawState::Idle;
        assert!(state.schedule());
        assert!(state.take());
        state.submit();
        assert_eq!(state, RedrawState::InFlight);
        assert!(!state.frame_complete());
        assert_eq!(state, RedrawState::Idle);
    }

    #[test]
    fn terminate_wins_from_any_state() {
        for start in [
            RedrawState::Idle,
            RedrawState::Scheduled,
            RedrawState::InFlight,
            RedrawState::InFlightPending,
        ] {
            let mut state = start;
            state.terminate();
            assert_eq!(state, RedrawState::Terminating);
            assert!(state.wakes_render_thread());
        }
    }

    #[test]
    fn terminating_ignores_everything_else() {
        let mut state = RedrawState::Terminating;
        assert!(!state.schedule());
        assert!(!state.take());
        state.submit();
        assert!(!state.frame_complete());
        assert_eq!(state, RedrawState::Terminating);
    }

    #[test]
    fn in_flight_predicate_matches_busy_states() {
        assert!(RedrawState::InFlight.in_flight());
        assert!(RedrawState::InFlightPending.in_flight());
        assert!(!RedrawState::Idle.in_flight());
        assert!(!RedrawState::Scheduled.in_flight());
    }
}

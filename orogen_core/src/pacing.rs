// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame timing measurement.

/// Exponential moving average of the interval between presented frames.
///
/// Fed with the compositor's frame-callback timestamps; smooths over a
/// 16-sample horizon so a single late frame does not spike the reported
/// rate. Fixed-point arithmetic, no division until the rate is read.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameRate {
    /// Timestamp of the last observed frame, microseconds.
    last_us: u64,
    /// Accumulated interval, scaled by the averaging window.
    acc: u64,
}

impl FrameRate {
    /// Averaging window as a power of two.
    const WINDOW_SHIFT: u32 = 4;
    const ROUND: u64 = 1 << (Self::WINDOW_SHIFT - 1);

    #[must_use]
    pub const fn new() -> Self {
        Self { last_us: 0, acc: 0 }
    }

    /// Records a frame presented at `timestamp_us` microseconds.
    ///
    /// The first observation only establishes the reference point.
    pub const fn record(&mut self, timestamp_us: u64) {
        if self.last_us == 0 {
            self.last_us = timestamp_us;
            return;
        }
        let delta = timestamp_us.wrapping_sub(self.last_us);
        self.last_us = timestamp_us;
        self.acc = self.acc + delta - self.smoothed_interval_us();
    }

    /// The smoothed frame interval in microseconds.
    #[must_use]
    pub const fn smoothed_interval_us(&self) -> u64 {
        (self.acc + Self::ROUND) >> Self::WINDOW_SHIFT
    }

    /// Frames per second, or `None` before two frames have been observed.
    #[must_use]
    pub fn frames_per_second(&self) -> Option<f64> {
        let interval = self.smoothed_interval_us();
        if interval == 0 {
            return None;
        }
        Some(1_000_000.0 / interval as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameRate;

    #[test]
    fn no_rate_before_two_frames() {
        let mut rate = FrameRate::new();
        assert_eq!(rate.frames_per_second(), None);
        rate.record(1_000_000);
        assert_eq!(rate.frames_per_second(), None);
    }

    #[test]
    fn steady_cadence_converges_to_the_true_rate() {
        let mut rate = FrameRate::new();
        // 60 Hz cadence, 16667 us per frame.
        for n in 0..200_u64 {
            rate.record(1_000_000 + n * 16_667);
        }
        let fps = rate.frames_per_second().expect("rate available");
        assert!((fps - 60.0).abs() < 0.5, "fps was {fps}");
    }

    #[test]
    fn one_late_frame_moves_the_average_slowly() {
        let mut rate = FrameRate::new();
        for n in 0..200_u64 {
            rate.record(n * 16_667);
        }
        let before = rate.frames_per_second().expect("rate available");
        // One frame three intervals late.
        rate.record(200 * 16_667 + 50_000);
        let after = rate.frames_per_second().expect("rate available");
        assert!(after < before);
        assert!(before - after < 10.0, "single frame moved rate by {}", before - after);
    }

    #[test]
    fn cadence_change_is_tracked() {
        let mut rate = FrameRate::new();
        let mut t = 0_u64;
        for _ in 0..200 {
            t += 16_667;
            rate.record(t);
        }
        // Drop to 30 Hz.
        for _ in 0..200 {
            t += 33_333;
            rate.record(t);
        }
        let fps = rate.frames_per_second().expect("rate available");
        assert!((fps - 30.0).abs() < 0.5, "fps was {fps}");
    }
}

//! Iteration timing for the batch-fit progress bar.
//!
//! Enabled only with the `progress` feature. [`IterTimer`] keeps an
//! exponential moving average of per-site fit durations so the progress
//! line shows a stable rate estimate even when individual sites vary
//! (sites with many period variants cost noticeably more than bare
//! sowing-only records).
use std::time::{Duration, Instant};

/// Per-iteration duration tracker with EMA smoothing.
///
/// The update rule is `ema ← α·dt + (1−α)·ema` with `α ∈ (0, 1]`; the
/// first tick seeds the average with the first sample.
pub struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

impl IterTimer {
    pub fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    /// Record one iteration boundary; returns the raw duration of the
    /// iteration that just finished.
    #[inline]
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.count += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };
        dt
    }

    /// Smoothed per-iteration duration.
    #[inline]
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }
}

/// Compact human-readable duration: `253µs`, `42ms`, `3.14s`.
#[inline]
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            format!("{:.2}s", d.as_secs_f32())
        }
    }
}

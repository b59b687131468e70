//! Delay and animation-speed discipline.
//!
//! Nominal durations are identical on both peers: they either travel in the
//! action message or are the same constants in the host and guest paths.
//! Only the speed adjustment is local, so each peer can run at its own
//! animation speed while replaying the same timeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Slowest allowed speed multiplier.
pub const MIN_SPEED: f64 = 0.25;

/// Fastest allowed speed multiplier.
pub const MAX_SPEED: f64 = 10.0;

/// Animation speed multiplier (1.0 = normal).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Speed(f64);

impl Speed {
    pub const NORMAL: Speed = Speed(1.0);

    /// Create a speed, clamping to `[MIN_SPEED, MAX_SPEED]`.
    ///
    /// Non-finite input falls back to normal speed.
    #[must_use]
    pub fn new(multiplier: f64) -> Self {
        if !multiplier.is_finite() {
            return Self::NORMAL;
        }
        Self(multiplier.clamp(MIN_SPEED, MAX_SPEED))
    }

    #[must_use]
    pub fn multiplier(self) -> f64 {
        self.0
    }

    /// Scale a nominal duration by this speed.
    #[must_use]
    pub fn adjust(self, nominal_ms: u64) -> u64 {
        speed_adjusted_delay(nominal_ms, self)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// `round(nominal_ms / speed)`.
///
/// Zero stays zero, and a faster speed never yields a longer delay.
///
/// ```
/// use battle_sync::sync::timing::{speed_adjusted_delay, Speed};
///
/// assert_eq!(speed_adjusted_delay(300, Speed::new(2.0)), 150);
/// assert_eq!(speed_adjusted_delay(0, Speed::new(0.5)), 0);
/// ```
#[must_use]
pub fn speed_adjusted_delay(nominal_ms: u64, speed: Speed) -> u64 {
    if nominal_ms == 0 {
        return 0;
    }
    (nominal_ms as f64 / speed.multiplier()).round() as u64
}

/// Suspend the current task for `ms` milliseconds.
///
/// A zero delay still yields once so sibling tasks in a join make progress.
pub async fn delay(ms: u64) {
    if ms == 0 {
        tokio::task::yield_now().await;
        return;
    }
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

use std::time::Instant;

/// Upper bound on a single step, so a stalled frame doesn't explode the simulation.
pub const DEFAULT_MAX_DELTA: f32 = 0.5;

// A simple struct to help with timing
pub struct Timer {
    last_instant: Instant,
    max_delta: f32,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_DELTA)
    }

    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            last_instant: Instant::now(),
            max_delta,
        }
    }

    // Calculate the delta time since the last call, clamped to max_delta
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now - self.last_instant;
        self.last_instant = now;
        clamp_delta(dt.as_secs_f32(), self.max_delta)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps `dt` to `[0, max_delta]`. A `max_delta` that isn't positive (or is
/// NaN) falls back to `DEFAULT_MAX_DELTA`.
pub fn clamp_delta(dt: f32, max_delta: f32) -> f32 {
    let max_delta = if max_delta > 0.0 { max_delta } else { DEFAULT_MAX_DELTA };
    dt.max(0.0).min(max_delta)
}

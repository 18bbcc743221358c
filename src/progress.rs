// ── Progress animation ────────────────────────────────────────────────────────
//
// The loader's progress bar is an animation, not a measurement: every monitor
// tick moves it forward by a fixed step and it wraps back to zero.  Nothing
// here knows about the target process.

/// Upper bound of the progress bar range (`PBM_SETRANGE` 0..=100).
pub(crate) const RANGE_MAX: u32 = 100;

/// Positions advanced per monitor tick.
pub(crate) const TICK_STEP: u32 = 5;

/// Position of the animated progress bar, always in `0..RANGE_MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ProgressTicker {
    position: u32,
}

impl ProgressTicker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick and return the new position.
    pub(crate) fn advance(&mut self) -> u32 {
        self.position = (self.position + TICK_STEP) % RANGE_MAX;
        self.position
    }
}

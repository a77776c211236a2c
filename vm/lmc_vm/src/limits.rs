//! Resource limits.

/// Instruction budget for one ordinary run call.
pub const TICK_BUDGET: u64 = 3_072_000;

/// Budget multiplier for runs entered at address 0 (the startup call).
pub const STARTUP_BUDGET_FACTOR: u64 = 60;

/// Hard cap on simultaneously live pair cells per machine.
pub const MAX_LIVE_CELLS: usize = 10_000_000;

/// Per-machine resource limits.
///
/// The defaults carry the standard game values; tests shrink them so
/// exhaustion is cheap to reach.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Limits {
    /// Instructions allowed per run entered anywhere but address 0; the
    /// startup entry gets this times [`STARTUP_BUDGET_FACTOR`].
    pub instructions: u64,
    /// Live pair cap.
    pub cells: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { instructions: TICK_BUDGET, cells: MAX_LIVE_CELLS }
    }
}

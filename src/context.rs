//! Simulation time: cycle counter, quarter index, phase flag, run mode

/// Number of cycles in a quarter
pub const CYCLES_PER_QUARTER: i32 = 25;
/// Number of quarters in an alpha cycle (trial)
pub const QUARTERS_PER_ALPHA: i32 = 4;

/// Whether the network is currently driving training or inference-only behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Training: learning averages and weight updates are active
    Train,
    /// Test: `updtActAvg` is forced off regardless of caller request
    Test,
}

/// Per-trial/per-cycle simulation clock, shared read-only by all layers during a step
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    /// Cycle within the current quarter, 0-based
    pub cycle: i32,
    /// Total cycles run since `AlphaCycInit`
    pub trial_cycle: i32,
    /// Quarter index within the alpha cycle, 0..=3
    pub quarter: i32,
    /// True once `quarter == 3` (the plus phase)
    pub plus_phase: bool,
    /// Current run mode
    pub mode: RunMode,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cycle: 0,
            trial_cycle: 0,
            quarter: 0,
            plus_phase: false,
            mode: RunMode::Train,
        }
    }
}

impl Context {
    /// Start a new alpha cycle (trial): reset cycle/quarter counters
    pub fn alpha_cyc_init(&mut self) {
        self.cycle = 0;
        self.trial_cycle = 0;
        self.quarter = 0;
        self.plus_phase = false;
    }

    /// Advance one cycle within the current quarter
    pub fn cycle_inc(&mut self) {
        self.cycle += 1;
        self.trial_cycle += 1;
    }

    /// Called at `QuarterFinal`: move to the next quarter, update `plus_phase`
    pub fn quarter_inc(&mut self) {
        self.quarter += 1;
        self.cycle = 0;
        self.plus_phase = self.quarter == QUARTERS_PER_ALPHA - 1;
    }

    /// True when `quarter` is the last minus-phase quarter (index 2)
    pub fn is_minus_phase_end(&self) -> bool {
        self.quarter == 2
    }

    /// True when the current quarter is the plus phase (index 3)
    pub fn is_plus_phase(&self) -> bool {
        self.plus_phase
    }
}

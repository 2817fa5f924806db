//! Hysteresis-gated phase machines that count repetitions.

pub mod flex;
pub mod split;

pub use flex::{FlexCounter, FlexPhase};
pub use split::{SplitCounter, SplitPhase};

use serde::Serialize;

/// Phase of either machine, as reported downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Up,
    Down,
    Standing,
    Descending,
    Bottom,
    Ascending,
    RepComplete,
}

impl From<FlexPhase> for Phase {
    fn from(phase: FlexPhase) -> Self {
        match phase {
            FlexPhase::Up => Phase::Up,
            FlexPhase::Down => Phase::Down,
        }
    }
}

impl From<SplitPhase> for Phase {
    fn from(phase: SplitPhase) -> Self {
        match phase {
            SplitPhase::Standing => Phase::Standing,
            SplitPhase::Descending => Phase::Descending,
            SplitPhase::Bottom => Phase::Bottom,
            SplitPhase::Ascending => Phase::Ascending,
            SplitPhase::RepComplete => Phase::RepComplete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Two-phase: angle held at or below the down threshold.
    Flexed,
    /// Two-phase: angle held at or above the up threshold.
    Extended,
    DescentStarted,
    BottomReached,
    AscentStarted,
    StoodUp,
    /// Angle recovered to standing before reaching the bottom.
    DescentAborted,
    Settled,
    /// A new descent began straight out of a completed rep.
    DescentResumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition<P> {
    pub from: P,
    pub to: P,
    pub timestamp_ms: u64,
    pub reason: TransitionReason,
}

impl<P: Into<Phase>> Transition<P> {
    pub fn erase(self) -> Transition<Phase> {
        Transition {
            from: self.from.into(),
            to: self.to.into(),
            timestamp_ms: self.timestamp_ms,
            reason: self.reason,
        }
    }
}

/// Result of feeding one frame to a phase machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseUpdate<P> {
    pub rep_count: u32,
    pub phase: P,
    pub rep_completed: bool,
    pub raw_angle: Option<f32>,
    pub smoothed_angle: Option<f32>,
    pub reliable: bool,
    pub transition: Option<Transition<P>>,
}

/// Consecutive-frame gate for one edge of a machine.
#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeCounter {
    count: u32,
}

impl EdgeCounter {
    /// Counts a qualifying frame or clears on a miss. Returns true once
    /// `required` consecutive qualifying frames have been seen.
    pub(crate) fn step(&mut self, qualifies: bool, required: u32) -> bool {
        if qualifies {
            self.count += 1;
        } else {
            self.count = 0;
        }
        self.count >= required
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn clear(&mut self) {
        self.count = 0;
    }
}

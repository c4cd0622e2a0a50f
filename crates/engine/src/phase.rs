//! The six turn sub-phases and their per-phase sub-state.
//!
//! Directly grounded on the ambient-stack reference engine's `phase.rs`:
//! a `Phase` enum with `.next()` plus a `PhaseState` wrapping per-phase
//! structs.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Event,
    Command,
    Deployment,
    Movement,
    Action,
    End,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Event => Phase::Command,
            Phase::Command => Phase::Deployment,
            Phase::Deployment => Phase::Movement,
            Phase::Movement => Phase::Action,
            Phase::Action => Phase::End,
            Phase::End => Phase::Event,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Phase::Event => "system-driven scenario events",
            Phase::Command => "command point generation",
            Phase::Deployment => "launch from USS Wasp",
            Phase::Movement => "unit movement, load/unload, hide/reveal",
            Phase::Action => "attacks and special abilities",
            Phase::End => "turn cleanup and handoff",
        }
    }
}

/// Per-phase sub-state. Most phases need none; kept as a wrapping enum
/// (rather than separate optional fields on `GameState`) so exactly one
/// variant is live at a time, mirroring the reference engine's
/// `PhaseState`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum PhaseState {
    #[default]
    None,
    Deployment(DeploymentState),
    Action(ActionPhaseState),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentState {
    /// Units launched from the Wasp this deployment phase, to prevent
    /// re-launching the same unit twice before Movement begins.
    pub launched_this_phase: Vec<crate::unit::UnitId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionPhaseState {
    /// Units that have already attacked this Action phase, tracked
    /// separately from `has_acted` so ability-only actions (which also set
    /// `has_acted`) don't get confused with attacks for flanking/ambush
    /// bookkeeping.
    pub attacked_units: Vec<crate::unit::UnitId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycle_returns_to_event() {
        let mut phase = Phase::Event;
        for _ in 0..6 {
            phase = phase.next();
        }
        assert_eq!(phase, Phase::Event);
    }

    #[test]
    fn default_phase_state_is_none() {
        assert!(matches!(PhaseState::default(), PhaseState::None));
    }
}

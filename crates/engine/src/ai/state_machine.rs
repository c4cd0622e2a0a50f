//! Strategic AI state machine.
//!
//! Grounded on the ambient-stack reference engine's own turn/phase state
//! machine shape (`phase.rs`): a closed enum plus a pure trigger-evaluation
//! function, kept here as a sibling state machine for the AI layer rather
//! than reusing `Phase` itself (different lifecycle, different owner).

use serde::{Deserialize, Serialize};

use crate::player::Side;
use crate::state::GameState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Preparation,
    ActiveDefense,
    GuerrillaWarfare,
    FinalStand,
}

impl Default for AiState {
    fn default() -> Self {
        AiState::Preparation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalPriority {
    GatherIntelligence,
    DenyTerrain,
    PreserveForce,
    DefendObjectives,
    InflictCasualties,
}

impl AiState {
    /// Ordered tactical priorities for this state.
    pub fn tactical_priorities(self) -> &'static [TacticalPriority] {
        use TacticalPriority::*;
        match self {
            AiState::Preparation => &[GatherIntelligence, DenyTerrain, PreserveForce],
            AiState::ActiveDefense => &[DefendObjectives, InflictCasualties, DenyTerrain],
            AiState::GuerrillaWarfare => &[InflictCasualties, PreserveForce, GatherIntelligence],
            AiState::FinalStand => &[DefendObjectives, InflictCasualties, PreserveForce],
        }
    }
}

/// A strategic assessment returned by one AI update cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategicAssessment {
    pub current_state: AiState,
    pub recommended_state: AiState,
    pub confidence: f64,
    pub turns_until_transition: u32,
    pub tactical_priorities: Vec<TacticalPriority>,
}

/// Raw inputs consulted by the trigger table, computed from `GameState` by
/// `assess` so the trigger-evaluation function itself stays pure and
/// testable independent of a live `GameState`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TriggerInputs {
    pub enemy_landed: bool,
    pub force_ratio: f64,
    pub territory_control: f64,
    pub objective_threat: f64,
    pub turn: u32,
    pub max_turns: u32,
}

/// Evaluate the trigger table against `inputs`, in priority order (first
/// matching row wins; `current` is returned unchanged if nothing fires).
pub fn recommend_state(current: AiState, inputs: TriggerInputs) -> AiState {
    if inputs.force_ratio < 0.2 {
        return AiState::FinalStand;
    }
    if inputs.objective_threat > 0.8 {
        return AiState::FinalStand;
    }
    if inputs.max_turns > 0 && inputs.turn as f64 >= 0.8 * inputs.max_turns as f64 {
        return AiState::FinalStand;
    }
    if inputs.force_ratio < 0.4 {
        return AiState::GuerrillaWarfare;
    }
    if inputs.territory_control < 0.5 {
        return AiState::GuerrillaWarfare;
    }
    if inputs.enemy_landed {
        return AiState::ActiveDefense;
    }
    current
}

fn gather_inputs(state: &GameState, side: Side) -> TriggerInputs {
    let friendly_alive = state.units_for_side(side).iter().filter(|u| u.is_alive()).count() as f64;
    let enemy_alive = state
        .units_for_side(side.opponent())
        .iter()
        .filter(|u| u.is_alive())
        .count() as f64;
    let total_alive = (friendly_alive + enemy_alive).max(1.0);
    let force_ratio = friendly_alive / total_alive;

    let objectives = state.map.objectives();
    let owned = objectives.iter().filter(|o| o.owner == Some(side)).count() as f64;
    let total_objectives = objectives.len().max(1) as f64;
    let territory_control = owned / total_objectives;

    let threatened = objectives
        .iter()
        .filter(|o| o.owner == Some(side))
        .filter(|o| {
            state
                .units_for_side(side.opponent())
                .iter()
                .any(|u| u.is_alive() && u.position.map(|p| p.distance(o.position) <= 2).unwrap_or(false))
        })
        .count() as f64;
    let objective_threat = if owned > 0.0 { threatened / owned } else { 0.0 };

    let enemy_landed = state
        .units_for_side(side.opponent())
        .iter()
        .any(|u| u.is_alive() && u.position.is_some());

    TriggerInputs {
        enemy_landed,
        force_ratio,
        territory_control,
        objective_threat,
        turn: state.turn,
        max_turns: state.max_turns,
    }
}

/// Run one AI state-machine update for `side`, deriving trigger inputs from
/// the live `state`.
pub fn assess(state: &GameState, side: Side, current: AiState) -> StrategicAssessment {
    let inputs = gather_inputs(state, side);
    let recommended = recommend_state(current, inputs);
    let confidence = if recommended == current { 0.9 } else { 0.6 };
    let turns_until_transition = if recommended == current { state.max_turns.saturating_sub(state.turn) } else { 0 };

    StrategicAssessment {
        current_state: current,
        recommended_state: recommended,
        confidence,
        turns_until_transition,
        tactical_priorities: recommended.tactical_priorities().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_force_ratio_forces_final_stand_over_everything_else() {
        let inputs = TriggerInputs { force_ratio: 0.1, enemy_landed: true, ..Default::default() };
        assert_eq!(recommend_state(AiState::Preparation, inputs), AiState::FinalStand);
    }

    #[test]
    fn enemy_landed_moves_preparation_to_active_defense() {
        let inputs = TriggerInputs {
            enemy_landed: true,
            force_ratio: 1.0,
            territory_control: 1.0,
            objective_threat: 0.0,
            turn: 1,
            max_turns: 20,
        };
        assert_eq!(recommend_state(AiState::Preparation, inputs), AiState::ActiveDefense);
    }

    #[test]
    fn no_trigger_fires_keeps_current_state() {
        let inputs = TriggerInputs {
            enemy_landed: false,
            force_ratio: 1.0,
            territory_control: 1.0,
            objective_threat: 0.0,
            turn: 1,
            max_turns: 20,
        };
        assert_eq!(recommend_state(AiState::Preparation, inputs), AiState::Preparation);
    }

    #[test]
    fn late_turn_forces_final_stand() {
        let inputs = TriggerInputs {
            enemy_landed: true,
            force_ratio: 1.0,
            territory_control: 1.0,
            objective_threat: 0.0,
            turn: 17,
            max_turns: 20,
        };
        assert_eq!(recommend_state(AiState::ActiveDefense, inputs), AiState::FinalStand);
    }
}

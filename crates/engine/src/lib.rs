//! Deterministic, headless simulation engine for an asymmetric amphibious
//! assault tactical wargame: a hex-grid world, a unit/entity model, a
//! turn/phase state machine with combat resolution, and a multi-layer AI
//! opponent.
//!
//! The crate's only supported entry point is the [`Engine`] facade; every
//! other module is an implementation detail reachable for advanced hosts
//! (replay tooling, test harnesses) but not required for normal play.

pub mod action;
pub mod ai;
pub mod apply;
pub mod combat;
pub mod dice;
pub mod error;
pub mod hex;
pub mod map;
pub mod phase;
pub mod player;
pub mod scenario;
pub mod special;
pub mod state;
pub mod terrain;
pub mod unit;
pub mod validate;

use action::{Action, ActionLogRecord, ActionResult, LegalAction};
use ai::{AiController, AiPersonality};
use error::ActionError;
use hex::PathResult;
use player::{Player, PlayerId, Side};
use state::GameState;
use unit::{UnitId, UnitInstance};

/// The single boundary this crate exposes. Owns no state
/// itself beyond the registered AI controllers — `GameState` is the
/// serializable, snapshot-able value the host holds and passes back in.
pub struct Engine {
    ai_controllers: std::collections::HashMap<PlayerId, AiController>,
}

impl Engine {
    /// Build an `Engine` plus its initial `GameState` from a scenario
    /// configuration. See `scenario::load_scenario` for the JSON record
    /// format.
    pub fn new(scenario_json: &str) -> Result<(Engine, GameState), ActionError> {
        let (state, personalities) = scenario::load_scenario_with_personalities(scenario_json)?;
        let mut engine = Engine {
            ai_controllers: std::collections::HashMap::new(),
        };
        for (side, personality) in personalities {
            let player_id = state
                .player_for_side(side)
                .map(|p| p.id)
                .unwrap_or(0);
            engine.register_ai_controller(player_id, side, personality);
        }
        tracing::info!(units = state.units.len(), rng_seed = state.rng.seed(), "engine initialized from scenario");
        Ok((engine, state))
    }

    /// Wrap an already-constructed `GameState`, e.g. one restored from a
    /// snapshot.
    pub fn from_state() -> Engine {
        Engine {
            ai_controllers: std::collections::HashMap::new(),
        }
    }

    // -- Queries --

    pub fn get_player<'a>(&self, state: &'a GameState, id: PlayerId) -> Option<&'a Player> {
        state.players.get(&id)
    }

    pub fn get_unit<'a>(&self, state: &'a GameState, id: UnitId) -> Option<&'a UnitInstance> {
        state.unit(id)
    }

    pub fn list_objectives<'a>(&self, state: &'a GameState) -> &'a [map::Objective] {
        state.map.objectives()
    }

    pub fn calculate_movement_path(&self, state: &GameState, unit_id: UnitId, target: hex::Hex) -> PathResult {
        match state.unit(unit_id).and_then(|u| u.position.map(|pos| (pos, u))) {
            Some((origin, unit)) => {
                state
                    .map
                    .find_path(origin, target, unit.stats().categories, Some(unit.effective_movement()))
            }
            None => PathResult::default(),
        }
    }

    pub fn can_attack(&self, state: &GameState, attacker_id: UnitId, defender_id: UnitId) -> (bool, Option<ActionError>) {
        let acting_side = match state.unit(attacker_id) {
            Some(u) => u.owner,
            None => return (false, Some(ActionError::UnitNotFound(attacker_id))),
        };
        match validate::validate_action(state, acting_side, &Action::Attack { attacker_id, defender_id }) {
            Ok(()) => (true, None),
            Err(err) => (false, Some(err)),
        }
    }

    /// Enumerate legal actions for `side`'s units, for tests and
    /// inspection tooling.
    pub fn list_legal_actions(&self, state: &GameState, side: Side) -> Vec<LegalAction> {
        let mut legal = Vec::new();
        for unit in state.units_for_side(side) {
            if !unit.is_alive() {
                continue;
            }
            if let Some(pos) = unit.position {
                for neighbor in pos.neighbors() {
                    let action = Action::Move { unit_id: unit.id, destination: neighbor };
                    if validate::validate_action(state, side, &action).is_ok() {
                        legal.push(LegalAction {
                            action,
                            description: format!("move unit {} to {:?}", unit.id, neighbor),
                        });
                    }
                }
            }
            for enemy in state.units_for_side(side.opponent()) {
                let action = Action::Attack { attacker_id: unit.id, defender_id: enemy.id };
                if validate::validate_action(state, side, &action).is_ok() {
                    legal.push(LegalAction {
                        action,
                        description: format!("unit {} attacks unit {}", unit.id, enemy.id),
                    });
                }
            }
        }
        legal.push(LegalAction { action: Action::EndPhase, description: "end the current phase".to_string() });
        legal
    }

    pub fn snapshot(&self, state: &GameState) -> Result<String, ActionError> {
        serde_json::to_string(state).map_err(|e| ActionError::Serialization(e.to_string()))
    }

    pub fn restore_snapshot(&self, json: &str) -> Result<GameState, ActionError> {
        serde_json::from_str(json).map_err(|e| ActionError::Deserialization(e.to_string()))
    }

    // -- Mutations --

    pub fn execute_action(&mut self, state: &mut GameState, side: Side, action: Action) -> Result<ActionResult, ActionError> {
        apply::apply_action(state, side, action)
    }

    pub fn advance_phase(&mut self, state: &mut GameState, side: Side) -> Result<ActionResult, ActionError> {
        apply::apply_action(state, side, Action::EndPhase)
    }

    pub fn register_ai_controller(&mut self, player_id: PlayerId, side: Side, personality: AiPersonality) {
        self.ai_controllers.insert(player_id, AiController::new(side, personality));
    }

    /// Run the registered AI controller for the active side and apply its
    /// batch of actions, returning one `ActionResult` per action actually
    /// applied.
    pub fn update_ai(&mut self, state: &mut GameState) -> Vec<ActionResult> {
        let active_side = state.active_side;
        let controller = self
            .ai_controllers
            .values_mut()
            .find(|c| c.side == active_side);
        match controller {
            Some(controller) => {
                let results = controller.update(state);
                tracing::debug!(side = ?active_side, actions = results.len(), "AI turn executed");
                results
            }
            None => Vec::new(),
        }
    }

    /// Build the persisted action-log record for an already-applied
    /// action.
    pub fn to_log_record(
        &self,
        state: &GameState,
        side: Side,
        result: &ActionResult,
        cp_before: u32,
        cp_after: u32,
    ) -> ActionLogRecord {
        let action = &result.applied.action;
        ActionLogRecord {
            turn: state.turn,
            phase: state.phase,
            acting_player: state.player_for_side(side).map(|p| p.id).unwrap_or(0),
            action_kind: action.kind_name(),
            acting_unit: action.acting_unit(),
            target_hex: match action {
                Action::Move { destination, .. } | Action::Unload { destination, .. } | Action::LaunchFromWasp { destination, .. } => Some(*destination),
                Action::SpecialAbilityAction { target_hex, .. } => *target_hex,
                _ => None,
            },
            target_unit: match action {
                Action::Attack { defender_id, .. } => Some(*defender_id),
                Action::Load { cargo_id, .. } | Action::Unload { cargo_id, .. } => Some(*cargo_id),
                Action::SpecialAbilityAction { target_unit, .. } => *target_unit,
                _ => None,
            },
            rolls: result.combat_outcome.as_ref().map(|c| c.dice_rolled.clone()),
            hits: result.combat_outcome.as_ref().map(|c| c.hits),
            damage: result.combat_outcome.as_ref().map(|c| c.damage),
            suppression_delta: result.combat_outcome.as_ref().map(|c| c.suppression_delta),
            destroyed: result.combat_outcome.as_ref().map(|c| c.destroyed),
            ability_name: match action {
                Action::SpecialAbilityAction { ability, .. } => Some(ability.name_alias()),
                _ => None,
            },
            cp_before,
            cp_after,
            message: format!("{} applied for {:?}", action.kind_name(), side),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scenario() -> &'static str {
        r#"{
            "map_width": 4,
            "map_height": 4,
            "units": [
                {"unit_type": "Marine", "side": "Assault", "col": 0, "row": 0},
                {"unit_type": "Infantry", "side": "Defender", "col": 1, "row": 0}
            ],
            "turn_limit": 10,
            "rng_seed": 7
        }"#
    }

    #[test]
    fn engine_new_builds_state_from_scenario() {
        let (_, state) = Engine::new(sample_scenario()).unwrap();
        assert_eq!(state.units.len(), 2);
    }

    #[test]
    fn execute_action_and_advance_phase_round_trip() {
        let (mut engine, mut state) = Engine::new(sample_scenario()).unwrap();
        state.phase = phase::Phase::Action;
        let units: Vec<UnitId> = state.units_for_side(Side::Assault).iter().map(|u| u.id).collect();
        let attacker = units[0];
        let defender = state.units_for_side(Side::Defender)[0].id;
        let result = engine.execute_action(&mut state, Side::Assault, Action::Attack { attacker_id: attacker, defender_id: defender });
        assert!(result.is_ok());

        state.phase = phase::Phase::End;
        let result = engine.advance_phase(&mut state, Side::Assault);
        assert!(result.is_ok());
        assert_eq!(state.phase, phase::Phase::Event);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let (engine, state) = Engine::new(sample_scenario()).unwrap();
        let snapshot = engine.snapshot(&state).unwrap();
        let restored = engine.restore_snapshot(&snapshot).unwrap();
        assert_eq!(restored.units.len(), state.units.len());
    }
}

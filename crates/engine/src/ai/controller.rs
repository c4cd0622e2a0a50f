//! AI controller: decision→action adapter with blacklist learning.
//!
//! Grounded on the ambient-stack reference engine's controller pattern of
//! wrapping engine mutation behind a learning adapter rather than letting
//! the AI call `apply_action` directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionResult};
use crate::ai::decision::{generate_decisions, AiPersonality, Decision, DecisionKind};
use crate::ai::state_machine::{assess, AiState};
use crate::apply::apply_action;
use crate::error::ActionError;
use crate::player::Side;
use crate::state::GameState;
use crate::unit::UnitId;
use crate::validate::validate_phase_legality;

const MAX_ACTIONS_PER_TURN: usize = 8;
const BLACKLIST_THRESHOLD: u32 = 3;

/// A coarse action-type key for blacklist bookkeeping, independent of the
/// action's payload (two `Move`s to different hexes are the same key).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionTypeKey {
    Move,
    Attack,
    Load,
    Unload,
    SpecialAbility,
    Reveal,
    Hide,
    LaunchFromWasp,
    RecoverToWasp,
    SecureObjective,
}

impl ActionTypeKey {
    fn from_action(action: &Action) -> ActionTypeKey {
        match action {
            Action::Move { .. } => ActionTypeKey::Move,
            Action::Attack { .. } => ActionTypeKey::Attack,
            Action::Load { .. } => ActionTypeKey::Load,
            Action::Unload { .. } => ActionTypeKey::Unload,
            Action::SpecialAbilityAction { .. } => ActionTypeKey::SpecialAbility,
            Action::Reveal { .. } => ActionTypeKey::Reveal,
            Action::Hide { .. } => ActionTypeKey::Hide,
            Action::LaunchFromWasp { .. } => ActionTypeKey::LaunchFromWasp,
            Action::RecoverToWasp { .. } => ActionTypeKey::RecoverToWasp,
            Action::SecureObjective { .. } => ActionTypeKey::SecureObjective,
            Action::EndPhase => unreachable!("AI controller never constructs EndPhase actions"),
        }
    }

    fn from_decision(kind: DecisionKind) -> Option<ActionTypeKey> {
        match kind {
            DecisionKind::MoveUnit | DecisionKind::Withdraw => Some(ActionTypeKey::Move),
            DecisionKind::AttackTarget => Some(ActionTypeKey::Attack),
            DecisionKind::HideUnit => Some(ActionTypeKey::Hide),
            DecisionKind::RevealUnit => Some(ActionTypeKey::Reveal),
            DecisionKind::SpecialAbility => Some(ActionTypeKey::SpecialAbility),
            DecisionKind::LoadTransport => Some(ActionTypeKey::Load),
            DecisionKind::UnloadTransport => Some(ActionTypeKey::Unload),
            DecisionKind::LaunchFromWasp => Some(ActionTypeKey::LaunchFromWasp),
            DecisionKind::RecoverToWasp => Some(ActionTypeKey::RecoverToWasp),
            DecisionKind::SecureObjective => Some(ActionTypeKey::SecureObjective),
        }
    }

    /// Fallback chain tried on blacklist or conversion failure.
    fn fallback_chain(self) -> &'static [ActionTypeKey] {
        use ActionTypeKey::*;
        match self {
            Attack => &[Move],
            Move => &[Attack],
            SpecialAbility => &[Attack, Move],
            Load | Unload => &[Move],
            SecureObjective => &[Move, Attack],
            Reveal | Hide | LaunchFromWasp | RecoverToWasp => &[],
        }
    }
}

/// Per-(unit, action-type) failure counters and the resulting blacklist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiController {
    pub side: Side,
    pub personality: AiPersonality,
    pub state: AiState,
    fundamental_failure_counts: HashMap<(UnitId, ActionTypeKey), u32>,
    blacklist: std::collections::HashSet<(UnitId, ActionTypeKey)>,
}

impl AiController {
    pub fn new(side: Side, personality: AiPersonality) -> Self {
        AiController {
            side,
            personality,
            state: AiState::Preparation,
            fundamental_failure_counts: HashMap::new(),
            blacklist: std::collections::HashSet::new(),
        }
    }

    /// Whether `(unit_id, key)` has tripped the fundamental-failure
    /// blacklist, public for test harnesses and host introspection tooling.
    pub fn is_blacklisted(&self, unit_id: UnitId, key: ActionTypeKey) -> bool {
        self.blacklist.contains(&(unit_id, key))
    }

    /// Update the fundamental-failure counters and blacklist for
    /// `(unit_id, key)` from an action outcome. Public so a host or test
    /// harness driving actions outside `update()`'s own decision loop can
    /// still feed the same learning rule.
    pub fn record_outcome(&mut self, unit_id: UnitId, key: ActionTypeKey, error: Option<&ActionError>) {
        match error {
            None => {
                self.fundamental_failure_counts.remove(&(unit_id, key));
            }
            Some(err) if err.is_fundamental() => {
                let count = self.fundamental_failure_counts.entry((unit_id, key)).or_insert(0);
                *count += 1;
                if *count >= BLACKLIST_THRESHOLD {
                    self.blacklist.insert((unit_id, key));
                }
            }
            Some(_) => {}
        }
    }

    /// Run one full AI turn: assess the strategic state, generate
    /// decisions, convert and apply up to `MAX_ACTIONS_PER_TURN` of them,
    /// and update the blacklist from the results.
    pub fn update(&mut self, state: &mut GameState) -> Vec<ActionResult> {
        let assessment = assess(state, self.side, self.state);
        self.state = assessment.recommended_state;

        let decisions = generate_decisions(state, self.side, &assessment.tactical_priorities, &self.personality);

        let mut results = Vec::new();
        for decision in decisions {
            if results.len() >= MAX_ACTIONS_PER_TURN {
                break;
            }
            if let Some(result) = self.try_decision(state, &decision) {
                results.push(result);
            }
        }
        results
    }

    fn try_decision(&mut self, state: &mut GameState, decision: &Decision) -> Option<ActionResult> {
        let Some(key) = ActionTypeKey::from_decision(decision.kind) else {
            return None;
        };

        let action = if self.is_blacklisted(decision.acting_unit, key) {
            self.fallback_action(state, decision, key)?
        } else {
            convert_decision(state, decision).or_else(|| self.fallback_action(state, decision, key))?
        };

        // Re-filter against current phase legality only; deeper rejections
        // (missing ability, bad target, insufficient CP/SP, …) fall through
        // to `apply_action` below so the blacklist can learn from them.
        if validate_phase_legality(state, &action).is_err() {
            return None;
        }

        let action_key = ActionTypeKey::from_action(&action);
        match apply_action(state, self.side, action) {
            Ok(result) => {
                self.record_outcome(decision.acting_unit, action_key, None);
                Some(result)
            }
            Err(err) => {
                self.record_outcome(decision.acting_unit, action_key, Some(&err));
                None
            }
        }
    }

    fn fallback_action(&self, state: &GameState, decision: &Decision, failed_key: ActionTypeKey) -> Option<Action> {
        for &candidate_key in failed_key.fallback_chain() {
            if self.is_blacklisted(decision.acting_unit, candidate_key) {
                continue;
            }
            if let Some(action) = synthesize_fallback(state, decision.acting_unit, candidate_key) {
                return Some(action);
            }
        }
        None
    }
}

/// Convert a decision into a concrete engine action. Returns `None` if the
/// decision lacks the fields its action kind requires.
fn convert_decision(state: &GameState, decision: &Decision) -> Option<Action> {
    match decision.kind {
        DecisionKind::MoveUnit | DecisionKind::Withdraw => Some(Action::Move {
            unit_id: decision.acting_unit,
            destination: decision.target_hex?,
        }),
        DecisionKind::AttackTarget => Some(Action::Attack {
            attacker_id: decision.acting_unit,
            defender_id: decision.target_unit?,
        }),
        DecisionKind::HideUnit => Some(Action::Hide { unit_id: decision.acting_unit }),
        DecisionKind::RevealUnit => Some(Action::Reveal { unit_id: decision.acting_unit }),
        DecisionKind::SpecialAbility => Some(Action::SpecialAbilityAction {
            unit_id: decision.acting_unit,
            ability: decision.ability?,
            target_hex: decision.target_hex,
            target_unit: decision.target_unit,
        }),
        DecisionKind::LoadTransport => Some(Action::Load {
            carrier_id: decision.acting_unit,
            cargo_id: decision.target_unit?,
        }),
        DecisionKind::UnloadTransport => Some(Action::Unload {
            carrier_id: decision.acting_unit,
            cargo_id: decision.target_unit?,
            destination: decision.target_hex?,
        }),
        DecisionKind::LaunchFromWasp => Some(Action::LaunchFromWasp {
            wasp_id: decision.acting_unit,
            aircraft_id: decision.target_unit?,
            destination: decision.target_hex?,
        }),
        DecisionKind::RecoverToWasp => Some(Action::RecoverToWasp {
            wasp_id: decision.acting_unit,
            aircraft_id: decision.target_unit?,
        }),
        DecisionKind::SecureObjective => Some(Action::SecureObjective { unit_id: decision.acting_unit }),
    }
    .filter(|_| state.unit(decision.acting_unit).is_some())
}

/// Build a simple synthetic action of `key`'s kind for `unit_id`: nearest
/// free adjacent hex for Move, nearest in-range enemy for Attack.
fn synthesize_fallback(state: &GameState, unit_id: UnitId, key: ActionTypeKey) -> Option<Action> {
    let unit = state.unit(unit_id)?;
    let pos = unit.position?;
    match key {
        ActionTypeKey::Move => {
            let destination = pos
                .neighbors()
                .into_iter()
                .find(|h| state.map.movement_cost(*h, unit.stats().categories).is_some() && !unit_at(state, *h))?;
            Some(Action::Move { unit_id, destination })
        }
        ActionTypeKey::Attack => {
            let stats = unit.stats();
            let defender_id = state
                .units_for_side(unit.owner.opponent())
                .into_iter()
                .filter(|e| e.is_alive())
                .filter(|e| e.position.map(|p| pos.distance(p) as u32 <= stats.attack_range).unwrap_or(false))
                .min_by_key(|e| e.position.map(|p| pos.distance(p)).unwrap_or(i32::MAX))?
                .id;
            Some(Action::Attack { attacker_id: unit_id, defender_id })
        }
        _ => None,
    }
}

fn unit_at(state: &GameState, hex: crate::hex::Hex) -> bool {
    state.units.values().any(|u| u.is_alive() && u.position == Some(hex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::map::{Map, OffshoreEdge};
    use crate::phase::{ActionPhaseState, Phase, PhaseState};
    use crate::player::Player;
    use crate::unit::{UnitInstance, UnitType};
    use std::collections::HashMap as StdHashMap;

    fn build_state() -> GameState {
        let mut players = StdHashMap::new();
        players.insert(1, Player::new(1, Side::Assault));
        players.insert(2, Player::new(2, Side::Defender));
        GameState {
            id: 1,
            turn: 1,
            max_turns: 10,
            phase: Phase::Action,
            phase_state: PhaseState::Action(ActionPhaseState::default()),
            active_side: Side::Defender,
            players,
            units: StdHashMap::new(),
            map: Map::new(5, 5, OffshoreEdge::West),
            log: Vec::new(),
            is_game_over: false,
            winner: None,
            next_unit_id: 3,
            rng: crate::dice::DeterministicRng::new(4),
            undo_checkpoints: Vec::new(),
        }
    }

    #[test]
    fn blacklist_trips_after_three_fundamental_failures() {
        let mut controller = AiController::new(Side::Defender, AiPersonality::default());
        let key = ActionTypeKey::SpecialAbility;
        for _ in 0..3 {
            controller.record_outcome(1, key, Some(&ActionError::UnitDoesNotHaveAbility));
        }
        assert!(controller.is_blacklisted(1, key));
    }

    #[test]
    fn transient_failures_never_blacklist() {
        let mut controller = AiController::new(Side::Defender, AiPersonality::default());
        let key = ActionTypeKey::Move;
        for _ in 0..10 {
            controller.record_outcome(1, key, Some(&ActionError::OutOfRange));
        }
        assert!(!controller.is_blacklisted(1, key));
    }

    #[test]
    fn update_applies_at_most_eight_actions() {
        let mut state = build_state();
        for i in 1..=10u32 {
            let pos = Hex::from_offset((i % 5) as i32, (i / 5) as i32);
            state.units.insert(i, UnitInstance::new(i, UnitType::Infantry, Side::Defender, Some(pos)));
        }
        state.units.insert(99, UnitInstance::new(99, UnitType::Marine, Side::Assault, Some(Hex::from_offset(4, 4))));
        let mut controller = AiController::new(Side::Defender, AiPersonality::default());
        let results = controller.update(&mut state);
        assert!(results.len() <= MAX_ACTIONS_PER_TURN);
    }
}

//! Atomic action application.
//!
//! Grounded on the ambient-stack reference engine's `apply.rs`: validate,
//! then mutate, then log — never partially mutate on a validation failure.

use crate::action::{Action, ActionResult, AppliedAction, GameEvent, InverseAction};
use crate::combat;
use crate::error::ActionError;
use crate::phase::{ActionPhaseState, DeploymentState, Phase, PhaseState};
use crate::player::Side;
use crate::special;
use crate::state::GameState;
use crate::validate::validate_action;

/// Validate and apply `action` as `acting_side`. On success, appends to the
/// log and returns the structured result; on failure, `state` is
/// untouched.
pub fn apply_action(state: &mut GameState, acting_side: Side, action: Action) -> Result<ActionResult, ActionError> {
    validate_action(state, acting_side, &action).inspect_err(|err| {
        tracing::debug!(kind = action.kind_name(), unit = ?action.acting_unit(), %err, "action rejected");
    })?;
    tracing::trace!(kind = action.kind_name(), turn = state.turn, phase = ?state.phase, "applying action");

    let (events, combat_outcome, inverse) = match &action {
        Action::Move { unit_id, destination } => apply_move(state, *unit_id, *destination)?,
        Action::Attack { attacker_id, defender_id } => apply_attack(state, *attacker_id, *defender_id)?,
        Action::Load { carrier_id, cargo_id } => apply_load(state, *carrier_id, *cargo_id)?,
        Action::Unload { carrier_id, cargo_id, destination } => apply_unload(state, *carrier_id, *cargo_id, *destination)?,
        Action::SpecialAbilityAction { unit_id, ability, target_hex, target_unit } => {
            apply_special_ability(state, *unit_id, *ability, *target_hex, *target_unit)?
        }
        Action::Reveal { unit_id } => apply_reveal(state, *unit_id, false)?,
        Action::Hide { unit_id } => apply_reveal(state, *unit_id, true)?,
        Action::LaunchFromWasp { wasp_id, aircraft_id, destination } => {
            apply_launch(state, *wasp_id, *aircraft_id, *destination)?
        }
        Action::RecoverToWasp { wasp_id, aircraft_id } => apply_recover(state, *wasp_id, *aircraft_id)?,
        Action::SecureObjective { unit_id } => apply_secure_objective(state, *unit_id)?,
        Action::EndPhase => apply_end_phase(state)?,
    };

    state.check_victory();
    let mut events = events;
    if state.is_game_over && state.winner.is_none() {
        events.push(GameEvent::GameOverByTurnLimit);
    }

    let applied = AppliedAction { action, inverse };
    state.log.push(applied.clone());

    Ok(ActionResult {
        applied,
        events,
        combat_outcome,
    })
}

type ApplyOutput = (Vec<GameEvent>, Option<crate::action::CombatOutcome>, InverseAction);

fn apply_move(state: &mut GameState, unit_id: u32, destination: crate::hex::Hex) -> Result<ApplyOutput, ActionError> {
    let unit = state.unit(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?;
    let origin = unit.position.ok_or(ActionError::NoValidPath)?;

    let mover = state.unit_mut(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?;
    mover.position = Some(destination);
    mover.has_moved = true;

    let inverse = InverseAction::Simple(Box::new(Action::Move { unit_id, destination: origin }));
    Ok((Vec::new(), None, inverse))
}

fn apply_attack(state: &mut GameState, attacker_id: u32, defender_id: u32) -> Result<ApplyOutput, ActionError> {
    let outcome = combat::resolve_attack(state, attacker_id, defender_id)?;
    let mut events = Vec::new();
    if outcome.destroyed {
        events.push(GameEvent::UnitDestroyed { unit_id: defender_id });
    }
    Ok((events, Some(outcome), InverseAction::Irreversible))
}

fn apply_load(state: &mut GameState, carrier_id: u32, cargo_id: u32) -> Result<ApplyOutput, ActionError> {
    {
        let carrier = state.unit_mut(carrier_id).ok_or(ActionError::UnitNotFound(carrier_id))?;
        carrier.cargo.push(cargo_id);
    }
    let cargo = state.unit_mut(cargo_id).ok_or(ActionError::UnitNotFound(cargo_id))?;
    let origin = cargo.position;
    cargo.position = None;

    let inverse = match origin {
        Some(pos) => InverseAction::Simple(Box::new(Action::Unload { carrier_id, cargo_id, destination: pos })),
        None => InverseAction::Irreversible,
    };
    Ok((Vec::new(), None, inverse))
}

fn apply_unload(
    state: &mut GameState,
    carrier_id: u32,
    cargo_id: u32,
    destination: crate::hex::Hex,
) -> Result<ApplyOutput, ActionError> {
    {
        let carrier = state.unit_mut(carrier_id).ok_or(ActionError::UnitNotFound(carrier_id))?;
        carrier.cargo.retain(|&id| id != cargo_id);
    }
    let cargo = state.unit_mut(cargo_id).ok_or(ActionError::UnitNotFound(cargo_id))?;
    cargo.position = Some(destination);

    let inverse = InverseAction::Simple(Box::new(Action::Load { carrier_id, cargo_id }));
    Ok((Vec::new(), None, inverse))
}

fn apply_special_ability(
    state: &mut GameState,
    unit_id: u32,
    ability: crate::unit::SpecialAbility,
    target_hex: Option<crate::hex::Hex>,
    target_unit: Option<u32>,
) -> Result<ApplyOutput, ActionError> {
    let requirements = special::requirements_for(ability);
    let acting_side = state.unit(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?.owner;
    if requirements.cp_cost > 0 {
        let player = state
            .player_for_side_mut(acting_side)
            .ok_or(ActionError::Internal("missing player for side".to_string()))?;
        player.spend_command_points(requirements.cp_cost);
    }

    let events = special::apply_ability(state, unit_id, ability, target_hex, target_unit)?;
    Ok((events, None, InverseAction::Irreversible))
}

fn apply_reveal(state: &mut GameState, unit_id: u32, hidden: bool) -> Result<ApplyOutput, ActionError> {
    let unit = state.unit_mut(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?;
    unit.hidden = hidden;
    let inverse = if hidden {
        InverseAction::Simple(Box::new(Action::Reveal { unit_id }))
    } else {
        InverseAction::Simple(Box::new(Action::Hide { unit_id }))
    };
    Ok((Vec::new(), None, inverse))
}

fn apply_launch(
    state: &mut GameState,
    wasp_id: u32,
    aircraft_id: u32,
    destination: crate::hex::Hex,
) -> Result<ApplyOutput, ActionError> {
    {
        let wasp = state.unit_mut(wasp_id).ok_or(ActionError::UnitNotFound(wasp_id))?;
        wasp.cargo.retain(|&id| id != aircraft_id);
    }
    {
        let aircraft = state.unit_mut(aircraft_id).ok_or(ActionError::UnitNotFound(aircraft_id))?;
        aircraft.position = Some(destination);
    }
    if let PhaseState::Deployment(deployment) = &mut state.phase_state {
        deployment.launched_this_phase.push(aircraft_id);
    } else {
        state.phase_state = PhaseState::Deployment(DeploymentState {
            launched_this_phase: vec![aircraft_id],
        });
    }
    Ok((Vec::new(), None, InverseAction::Irreversible))
}

fn apply_recover(state: &mut GameState, wasp_id: u32, aircraft_id: u32) -> Result<ApplyOutput, ActionError> {
    {
        let wasp = state.unit_mut(wasp_id).ok_or(ActionError::UnitNotFound(wasp_id))?;
        wasp.cargo.push(aircraft_id);
    }
    let aircraft = state.unit_mut(aircraft_id).ok_or(ActionError::UnitNotFound(aircraft_id))?;
    aircraft.position = None;
    aircraft.has_acted = true;
    Ok((Vec::new(), None, InverseAction::Irreversible))
}

fn apply_secure_objective(state: &mut GameState, unit_id: u32) -> Result<ApplyOutput, ActionError> {
    let unit = state.unit(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?;
    let owner = unit.owner;
    let pos = unit.position.ok_or(ActionError::OutOfMapBounds)?;
    let player_id = state
        .player_for_side(owner)
        .ok_or(ActionError::Internal("missing player for side".to_string()))?
        .id;

    let objective = state
        .map
        .get_objective_mut(pos)
        .ok_or(ActionError::OutOfMapBounds)?;
    let previous_owner = objective.owner;
    objective.owner = Some(owner);
    let objective_id = objective.id;

    if let Some(player) = state.player_for_side_mut(owner) {
        if !player.objectives_owned.contains(&objective_id) {
            player.objectives_owned.push(objective_id);
        }
    }

    let events = if previous_owner != Some(owner) {
        vec![GameEvent::ObjectiveCaptured { objective_id, by: player_id }]
    } else {
        Vec::new()
    };
    Ok((events, None, InverseAction::Irreversible))
}

fn apply_end_phase(state: &mut GameState) -> Result<ApplyOutput, ActionError> {
    let from = state.phase;
    let to = from.next();
    state.phase = to;
    state.phase_state = match to {
        Phase::Deployment => PhaseState::Deployment(DeploymentState::default()),
        Phase::Action => PhaseState::Action(ActionPhaseState::default()),
        _ => PhaseState::None,
    };

    tracing::debug!(?from, ?to, turn = state.turn, "phase advanced");
    let mut events = vec![GameEvent::PhaseChanged { from, to }];

    if to == Phase::Command {
        for player in state.players.values_mut() {
            let amount = player.command_points_for_turn();
            player.grant_command_points(amount);
        }
    }

    if to == Phase::Event {
        state.turn += 1;
        for unit in state.units.values_mut() {
            unit.reset_turn_state();
        }
        for player in state.players.values_mut() {
            player.discard_overflow_cp(10);
            if let Some(wasp) = player.wasp_system_status.as_mut() {
                wasp.reset_turn_ammo_tracking();
            }
        }
        tracing::info!(turn = state.turn, active_side = ?state.active_side, "turn advanced");
        events.push(GameEvent::TurnChanged { turn: state.turn });
        if state.active_side == Side::Assault {
            state.active_side = Side::Defender;
        } else {
            state.active_side = Side::Assault;
        }
    }

    Ok((events, None, InverseAction::Irreversible))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::map::{Map, OffshoreEdge};
    use crate::player::Player;
    use crate::unit::{UnitInstance, UnitType};
    use std::collections::HashMap;

    fn build_state() -> GameState {
        let mut players = HashMap::new();
        players.insert(1, Player::new(1, Side::Assault));
        players.insert(2, Player::new(2, Side::Defender));
        GameState {
            id: 1,
            turn: 1,
            max_turns: 10,
            phase: Phase::Movement,
            phase_state: PhaseState::None,
            active_side: Side::Assault,
            players,
            units: HashMap::new(),
            map: Map::new(4, 4, OffshoreEdge::West),
            log: Vec::new(),
            is_game_over: false,
            winner: None,
            next_unit_id: 3,
            rng: crate::dice::DeterministicRng::new(1),
            undo_checkpoints: Vec::new(),
        }
    }

    #[test]
    fn move_updates_position_and_logs_inverse() {
        let mut state = build_state();
        let start = Hex::from_offset(0, 0);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, Some(start)));
        let destination = Hex::from_offset(1, 0);
        let result = apply_action(&mut state, Side::Assault, Action::Move { unit_id: 1, destination }).unwrap();
        assert_eq!(state.unit(1).unwrap().position, Some(destination));
        assert!(matches!(result.applied.inverse, InverseAction::Simple(_)));
    }

    #[test]
    fn end_phase_cycles_through_to_next_turn_and_swaps_active_side() {
        let mut state = build_state();
        state.phase = Phase::End;
        let result = apply_action(&mut state, Side::Assault, Action::EndPhase).unwrap();
        assert_eq!(state.phase, Phase::Event);
        assert_eq!(state.turn, 2);
        assert_eq!(state.active_side, Side::Defender);
        assert!(result.events.iter().any(|e| matches!(e, GameEvent::TurnChanged { .. })));
    }

    #[test]
    fn secure_objective_assigns_ownership() {
        let mut state = build_state();
        let pos = Hex::from_offset(1, 1);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, Some(pos)));
        state.map.add_objective(crate::map::Objective {
            id: crate::player::ObjectiveId(1),
            objective_type: crate::map::ObjectiveType::Port,
            position: pos,
            owner: None,
            priority: 1,
        });
        let result = apply_action(&mut state, Side::Assault, Action::SecureObjective { unit_id: 1 }).unwrap();
        assert_eq!(state.map.get_objective(pos).unwrap().owner, Some(Side::Assault));
        assert!(result.events.iter().any(|e| matches!(e, GameEvent::ObjectiveCaptured { .. })));
    }
}

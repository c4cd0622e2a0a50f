//! Action validation: the ordered rule chain.
//!
//! Grounded on the ambient-stack reference engine's `validate.rs` two-pass
//! shape: a phase-legality dispatch followed by per-kind detail checks. No
//! mutation happens here — `apply.rs` is the only place `GameState` changes.

use crate::action::Action;
use crate::error::ActionError;
use crate::phase::Phase;
use crate::player::Side;
use crate::special::requirements_for;
use crate::state::GameState;
use crate::unit::{UnitCategory, UnitInstance};

/// Validate `action` against `state` for `acting_side`. Returns `Ok(())` if
/// the action is legal to apply right now.
pub fn validate_action(state: &GameState, acting_side: Side, action: &Action) -> Result<(), ActionError> {
    if state.is_game_over {
        return Err(ActionError::GameOver);
    }
    if acting_side != state.active_side && !matches!(action, Action::EndPhase) {
        return Err(ActionError::NotYourTurn);
    }

    validate_phase_legality(state, action)?;

    match action {
        Action::Move { unit_id, destination } => validate_move(state, acting_side, *unit_id, *destination),
        Action::Attack { attacker_id, defender_id } => validate_attack(state, acting_side, *attacker_id, *defender_id),
        Action::Load { carrier_id, cargo_id } => validate_load(state, acting_side, *carrier_id, *cargo_id),
        Action::Unload { carrier_id, cargo_id, destination } => {
            validate_unload(state, acting_side, *carrier_id, *cargo_id, *destination)
        }
        Action::SpecialAbilityAction { unit_id, ability, target_hex, target_unit } => {
            validate_special_ability(state, acting_side, *unit_id, *ability, *target_hex, *target_unit)
        }
        Action::Reveal { unit_id } | Action::Hide { unit_id } => validate_reveal_or_hide(state, acting_side, *unit_id),
        Action::LaunchFromWasp { wasp_id, aircraft_id, destination } => {
            validate_launch(state, acting_side, *wasp_id, *aircraft_id, *destination)
        }
        Action::RecoverToWasp { wasp_id, aircraft_id } => validate_recover(state, acting_side, *wasp_id, *aircraft_id),
        Action::SecureObjective { unit_id } => validate_secure_objective(state, acting_side, *unit_id),
        Action::EndPhase => Ok(()),
    }
}

/// Whether `action`'s kind is legal in the current phase. Exposed beyond
/// `validate_action`'s own dispatch so the AI controller can re-filter a
/// decision against phase/action legality alone, leaving deeper checks
/// (ability ownership, range, affordability, …) to surface as real
/// `apply_action` errors the controller's blacklist learning can see.
pub fn validate_phase_legality(state: &GameState, action: &Action) -> Result<(), ActionError> {
    let legal = match action {
        Action::EndPhase => true,
        Action::LaunchFromWasp { .. } => state.phase == Phase::Deployment,
        Action::Move { .. } | Action::Load { .. } | Action::Unload { .. } | Action::Reveal { .. } | Action::Hide { .. } => {
            state.phase == Phase::Movement
        }
        Action::Attack { .. } | Action::SpecialAbilityAction { .. } | Action::RecoverToWasp { .. } => {
            state.phase == Phase::Action
        }
        Action::SecureObjective { .. } => matches!(state.phase, Phase::Movement | Phase::Action),
    };
    if legal {
        Ok(())
    } else {
        Err(ActionError::InvalidPhase)
    }
}

fn owned_living_unit<'a>(state: &'a GameState, acting_side: Side, unit_id: u32) -> Result<&'a UnitInstance, ActionError> {
    let unit = state.unit(unit_id).ok_or(ActionError::UnitNotFound(unit_id))?;
    if unit.owner != acting_side {
        return Err(ActionError::UnitNotOwned(unit_id));
    }
    if !unit.is_alive() {
        return Err(ActionError::UnitNotAlive(unit_id));
    }
    Ok(unit)
}

fn validate_move(state: &GameState, acting_side: Side, unit_id: u32, destination: crate::hex::Hex) -> Result<(), ActionError> {
    let unit = owned_living_unit(state, acting_side, unit_id)?;
    if !unit.can_move() {
        return if unit.has_moved {
            Err(ActionError::UnitAlreadyMoved(unit_id))
        } else {
            Err(ActionError::UnitSuppressedPinned(unit_id))
        };
    }
    if !state.map.is_in_bounds(destination) {
        return Err(ActionError::OutOfMapBounds);
    }
    let stats = unit.stats();
    let path = state.map.find_path(
        unit.position.ok_or(ActionError::NoValidPath)?,
        destination,
        stats.categories,
        Some(unit.effective_movement()),
    );
    if path.is_empty() {
        return Err(ActionError::NoValidPath);
    }
    Ok(())
}

fn validate_attack(state: &GameState, acting_side: Side, attacker_id: u32, defender_id: u32) -> Result<(), ActionError> {
    let attacker = owned_living_unit(state, acting_side, attacker_id)?;
    if !attacker.can_act() {
        return if attacker.has_acted {
            Err(ActionError::UnitAlreadyActed(attacker_id))
        } else {
            Err(ActionError::UnitSuppressedPinned(attacker_id))
        };
    }
    let defender = state.unit(defender_id).ok_or(ActionError::UnitNotFound(defender_id))?;
    if defender.owner == acting_side {
        return Err(ActionError::TargetFriendly);
    }
    if !defender.is_alive() {
        return Err(ActionError::TargetDestroyed);
    }
    let stats = attacker.stats();
    let (attacker_pos, defender_pos) = (
        attacker.position.ok_or(ActionError::OutOfRange)?,
        defender.position.ok_or(ActionError::OutOfRange)?,
    );
    let distance = attacker_pos.distance(defender_pos) as u32;
    if distance > stats.attack_range {
        return Err(ActionError::OutOfRange);
    }
    if !stats.indirect_fire && !state.map.has_line_of_sight(attacker_pos, defender_pos) {
        return Err(ActionError::NoLineOfSight);
    }
    Ok(())
}

fn validate_load(state: &GameState, acting_side: Side, carrier_id: u32, cargo_id: u32) -> Result<(), ActionError> {
    let carrier = owned_living_unit(state, acting_side, carrier_id)?;
    let cargo = owned_living_unit(state, acting_side, cargo_id)?;
    if !carrier.has_cargo_room() {
        return Err(ActionError::CapacityExceeded);
    }
    match (carrier.position, cargo.position) {
        (Some(carrier_pos), Some(cargo_pos)) if carrier_pos.distance(cargo_pos) <= 1 => Ok(()),
        _ => Err(ActionError::NotAdjacent),
    }
}

fn validate_unload(
    state: &GameState,
    acting_side: Side,
    carrier_id: u32,
    cargo_id: u32,
    destination: crate::hex::Hex,
) -> Result<(), ActionError> {
    let carrier = owned_living_unit(state, acting_side, carrier_id)?;
    if !carrier.cargo.contains(&cargo_id) {
        return Err(ActionError::UnitNotFound(cargo_id));
    }
    let carrier_pos = carrier.position.ok_or(ActionError::OutOfMapBounds)?;
    if carrier_pos.distance(destination) > 1 {
        return Err(ActionError::NotAdjacent);
    }
    if !state.map.is_in_bounds(destination) {
        return Err(ActionError::OutOfMapBounds);
    }
    let cargo_stats = state
        .unit(cargo_id)
        .ok_or(ActionError::UnitNotFound(cargo_id))?
        .stats();
    if state.map.movement_cost(destination, cargo_stats.categories).is_none() {
        return Err(ActionError::InvalidTerrain);
    }
    Ok(())
}

fn validate_special_ability(
    state: &GameState,
    acting_side: Side,
    unit_id: u32,
    ability: crate::unit::SpecialAbility,
    target_hex: Option<crate::hex::Hex>,
    target_unit: Option<u32>,
) -> Result<(), ActionError> {
    let unit = owned_living_unit(state, acting_side, unit_id)?;
    if !unit.can_act() {
        return if unit.has_acted {
            Err(ActionError::UnitAlreadyActed(unit_id))
        } else {
            Err(ActionError::UnitSuppressedPinned(unit_id))
        };
    }
    let stats = unit.stats();
    if !stats.special_abilities.contains(&ability) {
        return Err(ActionError::UnitDoesNotHaveAbility);
    }
    let requirements = requirements_for(ability);
    let player = state
        .player_for_side(acting_side)
        .ok_or(ActionError::Internal("missing player for side".to_string()))?;
    if player.command_points < requirements.cp_cost {
        return Err(ActionError::InsufficientCommandPoints {
            needed: requirements.cp_cost,
            available: player.command_points,
        });
    }
    if let Some(sp_cost) = requirements.sp_cost {
        match unit.current_sp {
            Some(sp) if sp >= sp_cost => {}
            Some(_) => return Err(ActionError::InsufficientSupply),
            None => {}
        }
    }
    if requirements.requires_target_hex && target_hex.is_none() {
        return Err(ActionError::OutOfMapBounds);
    }
    if requirements.requires_target_unit && target_unit.is_none() {
        return Err(ActionError::UnitDoesNotHaveAbility);
    }
    if let Some(hex) = target_hex {
        if !state.map.is_in_bounds(hex) {
            return Err(ActionError::OutOfMapBounds);
        }
    }
    Ok(())
}

fn validate_reveal_or_hide(state: &GameState, acting_side: Side, unit_id: u32) -> Result<(), ActionError> {
    let unit = owned_living_unit(state, acting_side, unit_id)?;
    if !unit.can_conceal() {
        return Err(ActionError::UnitTypeCannotPerformAction);
    }
    if unit.is_pinned() {
        return Err(ActionError::UnitSuppressedPinned(unit_id));
    }
    Ok(())
}

fn validate_launch(
    state: &GameState,
    acting_side: Side,
    wasp_id: u32,
    aircraft_id: u32,
    destination: crate::hex::Hex,
) -> Result<(), ActionError> {
    let wasp = owned_living_unit(state, acting_side, wasp_id)?;
    if !wasp.stats().categories.contains(UnitCategory::SHIP) {
        return Err(ActionError::UnitTypeCannotPerformAction);
    }
    let player = state
        .player_for_side(acting_side)
        .ok_or(ActionError::Internal("missing player for side".to_string()))?;
    let wasp_status = player
        .wasp_system_status
        .as_ref()
        .ok_or(ActionError::WaspSystemUnavailable)?;
    if !wasp_status.can_launch() {
        return Err(ActionError::WaspSystemUnavailable);
    }
    if let Some(max) = wasp_status.max_launches_per_turn() {
        let launched_this_turn = match &state.phase_state {
            crate::phase::PhaseState::Deployment(deployment) => deployment.launched_this_phase.len() as u32,
            _ => 0,
        };
        if launched_this_turn >= max {
            return Err(ActionError::WaspSystemUnavailable);
        }
    }
    if !wasp.cargo.contains(&aircraft_id) {
        return Err(ActionError::NoEmbarkedAircraft);
    }
    if let PhaseStateLaunched::Yes = already_launched(state, aircraft_id) {
        return Err(ActionError::UnitAlreadyActed(aircraft_id));
    }
    if !state.map.is_in_bounds(destination) {
        return Err(ActionError::OutOfMapBounds);
    }
    Ok(())
}

enum PhaseStateLaunched {
    Yes,
    No,
}

fn already_launched(state: &GameState, aircraft_id: u32) -> PhaseStateLaunched {
    if let crate::phase::PhaseState::Deployment(deployment) = &state.phase_state {
        if deployment.launched_this_phase.contains(&aircraft_id) {
            return PhaseStateLaunched::Yes;
        }
    }
    PhaseStateLaunched::No
}

fn validate_recover(state: &GameState, acting_side: Side, wasp_id: u32, aircraft_id: u32) -> Result<(), ActionError> {
    let wasp = owned_living_unit(state, acting_side, wasp_id)?;
    if !wasp.stats().categories.contains(UnitCategory::SHIP) {
        return Err(ActionError::UnitTypeCannotPerformAction);
    }
    let player = state
        .player_for_side(acting_side)
        .ok_or(ActionError::Internal("missing player for side".to_string()))?;
    let wasp_status = player
        .wasp_system_status
        .as_ref()
        .ok_or(ActionError::WaspSystemUnavailable)?;
    if !wasp_status.can_recover() {
        return Err(ActionError::WaspSystemUnavailable);
    }
    let aircraft = owned_living_unit(state, acting_side, aircraft_id)?;
    if !wasp.has_cargo_room() {
        return Err(ActionError::CapacityExceeded);
    }
    match (wasp.position, aircraft.position) {
        (Some(wasp_pos), Some(aircraft_pos)) if wasp_pos.distance(aircraft_pos) <= 1 => Ok(()),
        _ => Err(ActionError::NotAdjacent),
    }
}

fn validate_secure_objective(state: &GameState, acting_side: Side, unit_id: u32) -> Result<(), ActionError> {
    let unit = owned_living_unit(state, acting_side, unit_id)?;
    let pos = unit.position.ok_or(ActionError::OutOfMapBounds)?;
    if state.map.get_objective(pos).is_none() {
        return Err(ActionError::OutOfMapBounds);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::map::{Map, OffshoreEdge};
    use crate::phase::PhaseState;
    use crate::player::Player;
    use crate::unit::{UnitInstance, UnitType};
    use std::collections::HashMap;

    fn build_state(phase: Phase) -> GameState {
        let mut players = HashMap::new();
        players.insert(1, Player::new(1, Side::Assault));
        players.insert(2, Player::new(2, Side::Defender));
        GameState {
            id: 1,
            turn: 1,
            max_turns: 10,
            phase,
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
    fn move_in_wrong_phase_is_rejected() {
        let mut state = build_state(Phase::Action);
        let pos = Hex::from_offset(0, 0);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, Some(pos)));
        let action = Action::Move { unit_id: 1, destination: Hex::from_offset(1, 0) };
        assert_eq!(
            validate_action(&state, Side::Assault, &action),
            Err(ActionError::InvalidPhase)
        );
    }

    #[test]
    fn attack_on_friendly_unit_is_rejected() {
        let mut state = build_state(Phase::Action);
        let a = Hex::from_offset(0, 0);
        let b = Hex::from_offset(1, 0);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, Some(a)));
        state.units.insert(2, UnitInstance::new(2, UnitType::Marine, Side::Assault, Some(b)));
        let action = Action::Attack { attacker_id: 1, defender_id: 2 };
        assert_eq!(
            validate_action(&state, Side::Assault, &action),
            Err(ActionError::TargetFriendly)
        );
    }

    #[test]
    fn attack_out_of_range_is_rejected() {
        let mut state = build_state(Phase::Action);
        let a = Hex::from_offset(0, 0);
        let b = Hex::from_offset(3, 3);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, Some(a)));
        state.units.insert(2, UnitInstance::new(2, UnitType::Infantry, Side::Defender, Some(b)));
        let action = Action::Attack { attacker_id: 1, defender_id: 2 };
        assert_eq!(
            validate_action(&state, Side::Assault, &action),
            Err(ActionError::OutOfRange)
        );
    }

    #[test]
    fn not_your_turn_is_rejected_before_phase_check() {
        let mut state = build_state(Phase::Action);
        state.units.insert(1, UnitInstance::new(1, UnitType::Marine, Side::Assault, None));
        let action = Action::Attack { attacker_id: 1, defender_id: 1 };
        assert_eq!(
            validate_action(&state, Side::Defender, &action),
            Err(ActionError::NotYourTurn)
        );
    }
}

//! Special-ability dispatch table.
//!
//! Grounded on the ambient-stack reference engine's ability-table pattern
//! (a closed, name-keyed dispatch rather than a trait object per ability —
//! see DESIGN.md) and composed from a handful of shared primitives rather
//! than one bespoke function per ability, the way the reference engine
//! builds its own small effect system.

use crate::action::GameEvent;
use crate::error::ActionError;
use crate::hex::Hex;
use crate::state::GameState;
use crate::unit::{SpecialAbility, UnitId};

/// Static requirements for one ability, looked up by `requirements_for`.
pub struct AbilityRequirements {
    pub cp_cost: u32,
    pub sp_cost: Option<u32>,
    pub requires_target_hex: bool,
    pub requires_target_unit: bool,
}

pub fn requirements_for(ability: SpecialAbility) -> AbilityRequirements {
    use SpecialAbility::*;
    match ability {
        CloseAirSupport => AbilityRequirements { cp_cost: 2, sp_cost: None, requires_target_hex: true, requires_target_unit: false },
        VstolLanding => AbilityRequirements { cp_cost: 1, sp_cost: None, requires_target_hex: true, requires_target_unit: false },
        HeavyLift => AbilityRequirements { cp_cost: 0, sp_cost: None, requires_target_hex: false, requires_target_unit: false },
        AntiVehicleSpecialist => AbilityRequirements { cp_cost: 1, sp_cost: None, requires_target_hex: false, requires_target_unit: true },
        AntiAircraftFocus => AbilityRequirements { cp_cost: 0, sp_cost: None, requires_target_hex: false, requires_target_unit: false },
        IndirectFire => AbilityRequirements { cp_cost: 1, sp_cost: Some(1), requires_target_hex: true, requires_target_unit: false },
        FastAmbush => AbilityRequirements { cp_cost: 1, sp_cost: None, requires_target_hex: false, requires_target_unit: false },
        UrbanSpecialists => AbilityRequirements { cp_cost: 0, sp_cost: None, requires_target_hex: false, requires_target_unit: false },
        BreachingCharge => AbilityRequirements { cp_cost: 1, sp_cost: Some(1), requires_target_hex: true, requires_target_unit: false },
        Infiltrate => AbilityRequirements { cp_cost: 2, sp_cost: None, requires_target_hex: true, requires_target_unit: false },
        ArtilleryBarrage => AbilityRequirements { cp_cost: 2, sp_cost: Some(2), requires_target_hex: true, requires_target_unit: false },
        SamStrike => AbilityRequirements { cp_cost: 3, sp_cost: Some(1), requires_target_hex: false, requires_target_unit: true },
        CiwsRam => AbilityRequirements { cp_cost: 0, sp_cost: None, requires_target_hex: false, requires_target_unit: false },
        SeaSparrow => AbilityRequirements { cp_cost: 1, sp_cost: None, requires_target_hex: false, requires_target_unit: true },
    }
}

/// Apply an already-validated special ability use. Returns the events it
/// produced. `validate::validate_action` is responsible for having already
/// checked CP/SP affordability, ownership, phase legality, and that
/// `unit_id` actually has `ability` on its stats table.
pub fn apply_ability(
    state: &mut GameState,
    unit_id: UnitId,
    ability: SpecialAbility,
    target_hex: Option<Hex>,
    target_unit: Option<UnitId>,
) -> Result<Vec<GameEvent>, ActionError> {
    use SpecialAbility::*;
    match ability {
        CloseAirSupport => area_damage(state, unit_id, target_hex, 2, 1),
        ArtilleryBarrage => area_damage(state, unit_id, target_hex, 3, 3),
        IndirectFire => area_damage(state, unit_id, target_hex, 1, 1),
        BreachingCharge => grant_self_modifier(state, unit_id),
        FastAmbush => mark_hidden(state, unit_id, true),
        UrbanSpecialists => Ok(Vec::new()),
        AntiVehicleSpecialist => Ok(Vec::new()),
        AntiAircraftFocus => Ok(Vec::new()),
        Infiltrate => mark_hidden(state, unit_id, true),
        VstolLanding | HeavyLift => Ok(Vec::new()),
        SamStrike => strike_target(state, unit_id, target_unit),
        SeaSparrow => strike_target(state, unit_id, target_unit),
        CiwsRam => Ok(Vec::new()),
    }
}

/// Deal `dice` worth of suppression-only damage (hit chance fixed at a
/// flat threshold of 4) to every enemy unit within `radius` hexes of
/// `target_hex`.
fn area_damage(
    state: &mut GameState,
    unit_id: UnitId,
    target_hex: Option<Hex>,
    dice: u32,
    radius: u32,
) -> Result<Vec<GameEvent>, ActionError> {
    let target_hex = target_hex.ok_or(ActionError::OutOfMapBounds)?;
    let caster_side = state
        .unit(unit_id)
        .ok_or(ActionError::UnitNotFound(unit_id))?
        .owner;

    let affected: Vec<UnitId> = state
        .units
        .values()
        .filter(|u| {
            u.is_alive()
                && u.owner != caster_side
                && u.position.map(|p| p.distance(target_hex) as u32 <= radius).unwrap_or(false)
        })
        .map(|u| u.id)
        .collect();

    let mut events = Vec::new();
    for defender_id in affected {
        let rolls = state.rng.roll_dice(dice);
        let hits = rolls.iter().filter(|&&d| d >= 4).count() as u32;
        if hits > 0 {
            let destroyed = state
                .unit_mut(defender_id)
                .ok_or(ActionError::UnitNotFound(defender_id))?
                .take_damage(hits);
            if destroyed {
                events.push(GameEvent::UnitDestroyed { unit_id: defender_id });
            }
        }
    }

    if let Some(caster) = state.unit_mut(unit_id) {
        caster.has_acted = true;
        if let Some(sp) = caster.current_sp {
            caster.current_sp = Some(sp.saturating_sub(1));
        }
    }

    Ok(events)
}

/// Breaching-charge style self-buff: clears one suppression token on the
/// caster, representing the squad pushing clear of pinning fire.
fn grant_self_modifier(state: &mut GameState, unit_id: UnitId) -> Result<Vec<GameEvent>, ActionError> {
    let unit = state
        .unit_mut(unit_id)
        .ok_or(ActionError::UnitNotFound(unit_id))?;
    unit.suppression_tokens = unit.suppression_tokens.saturating_sub(1);
    unit.has_acted = true;
    Ok(Vec::new())
}

fn mark_hidden(state: &mut GameState, unit_id: UnitId, hidden: bool) -> Result<Vec<GameEvent>, ActionError> {
    let unit = state
        .unit_mut(unit_id)
        .ok_or(ActionError::UnitNotFound(unit_id))?;
    if !unit.can_conceal() {
        return Err(ActionError::UnitTypeCannotPerformAction);
    }
    unit.hidden = hidden;
    unit.has_acted = true;
    Ok(Vec::new())
}

/// Single-target direct-fire ability (SAM strike, Sea Sparrow): one focused
/// roll against a named unit, bypassing the normal `combat::resolve_attack`
/// path since these fire outside the attacker's stats-table attack value.
fn strike_target(
    state: &mut GameState,
    unit_id: UnitId,
    target_unit: Option<UnitId>,
) -> Result<Vec<GameEvent>, ActionError> {
    let target_id = target_unit.ok_or(ActionError::UnitDoesNotHaveAbility)?;
    let rolls = state.rng.roll_dice(3);
    let hits = rolls.iter().filter(|&&d| d >= 4).count() as u32;

    let mut events = Vec::new();
    if hits > 0 {
        let destroyed = state
            .unit_mut(target_id)
            .ok_or(ActionError::UnitNotFound(target_id))?
            .take_damage(hits);
        if destroyed {
            events.push(GameEvent::UnitDestroyed { unit_id: target_id });
        }
    }

    if let Some(caster) = state.unit_mut(unit_id) {
        caster.has_acted = true;
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::map::{Map, OffshoreEdge};
    use crate::phase::{Phase, PhaseState};
    use crate::player::{Player, Side};
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
            phase: Phase::Action,
            phase_state: PhaseState::None,
            active_side: Side::Assault,
            players,
            units: HashMap::new(),
            map: Map::new(4, 4, OffshoreEdge::West),
            log: Vec::new(),
            is_game_over: false,
            winner: None,
            next_unit_id: 3,
            rng: crate::dice::DeterministicRng::new(3),
            undo_checkpoints: Vec::new(),
        }
    }

    #[test]
    fn area_damage_hits_enemies_near_target_hex_only() {
        let mut state = build_state();
        let caster_pos = Hex::from_offset(0, 0);
        let near_pos = Hex::from_offset(1, 0);
        let far_pos = Hex::from_offset(3, 3);
        state.units.insert(1, UnitInstance::new(1, UnitType::MarineArtillery, Side::Assault, Some(caster_pos)));
        state.units.insert(2, UnitInstance::new(2, UnitType::Infantry, Side::Defender, Some(near_pos)));
        state.units.insert(3, UnitInstance::new(3, UnitType::Infantry, Side::Defender, Some(far_pos)));

        let events = apply_ability(&mut state, 1, SpecialAbility::IndirectFire, Some(near_pos), None).unwrap();
        let _ = events;
        assert!(state.unit(3).unwrap().current_hp == state.unit(3).unwrap().stats().hit_points);
    }

    #[test]
    fn hide_requires_concealable_unit_type() {
        let mut state = build_state();
        state.units.insert(1, UnitInstance::new(1, UnitType::LightArmor, Side::Assault, None));
        let result = mark_hidden(&mut state, 1, true);
        assert_eq!(result, Err(ActionError::UnitTypeCannotPerformAction));
    }
}

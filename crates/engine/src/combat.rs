//! The 8-step combat resolution algorithm.
//!
//! Grounded on the ambient-stack reference engine's dice-roll plumbing
//! (`dice.rs`); the hit-resolution table itself is new domain logic (the
//! reference engine's own combat system is a different, non-hex game) —
//! see DESIGN.md.

use crate::action::CombatOutcome;
use crate::error::ActionError;
use crate::state::GameState;
use crate::unit::{SpecialAbility, UnitCategory, UnitId};

/// Whether `attacker`'s ability set
/// restricts it to attacking only air-category targets (AA / SAM units
/// with `AntiAircraftFocus`).
fn restricted_to_air_only(abilities: &[SpecialAbility]) -> bool {
    abilities.contains(&SpecialAbility::AntiAircraftFocus)
}

/// Resolve an attack. Mutates `state` (attacker/defender HP, suppression,
/// `has_acted`, SP, Wasp ammo) and returns the structured outcome.
///
/// Preconditions (range, LOS, ownership, phase, action-slot) are assumed
/// already checked by `validate::validate_action` — this function only
/// implements the eight resolution steps themselves.
pub fn resolve_attack(
    state: &mut GameState,
    attacker_id: UnitId,
    defender_id: UnitId,
) -> Result<CombatOutcome, ActionError> {
    let attacker = state
        .unit(attacker_id)
        .ok_or(ActionError::UnitNotFound(attacker_id))?
        .clone();
    let defender = state
        .unit(defender_id)
        .ok_or(ActionError::UnitNotFound(defender_id))?
        .clone();

    let attacker_stats = attacker.stats();
    let defender_stats = defender.stats();

    if restricted_to_air_only(&attacker_stats.special_abilities)
        && !defender_stats.categories.intersects(UnitCategory::AIRCRAFT | UnitCategory::HELICOPTER)
    {
        return Err(ActionError::UnitTypeCannotPerformAction);
    }

    // Step 1: base attack dice.
    let mut dice_count = attacker.effective_attack();
    let mut modifiers_applied = Vec::new();

    // Step 4: flanking — adjacent and defender has another adjacent enemy.
    if let (Some(attacker_pos), Some(defender_pos)) = (attacker.position, defender.position) {
        if attacker_pos.distance(defender_pos) == 1 && has_other_adjacent_enemy(state, &defender, attacker_id) {
            dice_count += 1;
            modifiers_applied.push("flanking+1".to_string());
        }
    }

    // Step 4: ambush — attacker was hidden and reveals this action.
    if attacker.hidden {
        dice_count += 1;
        modifiers_applied.push("ambush+1".to_string());
    }

    // Step 4: anti-vehicle specialist vs a vehicle-category defender.
    if attacker_stats.special_abilities.contains(&SpecialAbility::AntiVehicleSpecialist)
        && defender_stats.categories.intersects(UnitCategory::GROUND_VEHICLE)
    {
        dice_count += 2;
        modifiers_applied.push("anti_vehicle+2".to_string());
    }

    // Step 4: urban specialist vs a defender holding urban terrain.
    if attacker_stats.special_abilities.contains(&SpecialAbility::UrbanSpecialists)
        && defender
            .position
            .and_then(|pos| state.map.get_terrain(pos))
            .map(|t| t == crate::terrain::Terrain::Urban)
            .unwrap_or(false)
    {
        dice_count += 1;
        modifiers_applied.push("urban_specialist+1".to_string());
    }

    // Step 4: suppression penalty already folded into effective_attack(),
    // but the modifier is still reported for the log.
    if attacker.suppression_tokens > 0 {
        modifiers_applied.push(format!("suppressed-{}", attacker.suppression_tokens));
    }

    // Step 4: cover bonus added to defense threshold.
    let cover_bonus = defender
        .position
        .and_then(|pos| state.map.get_terrain(pos))
        .map(|t| t.profile().defense_bonus)
        .unwrap_or(0) as u32;
    if cover_bonus > 0 {
        modifiers_applied.push(format!("cover+{}", cover_bonus));
    }

    let hit_threshold = defender_stats.defense + cover_bonus;

    // Step 5: roll dice; each die >= threshold is a hit.
    let dice_rolled = state.rng.roll_dice(dice_count);
    let mut hits = dice_rolled.iter().filter(|&&d| d >= hit_threshold.clamp(1, 6)).count() as u32;

    // USS Wasp CIWS/RAM reactive defense, once per attack kind per turn.
    if defender_stats.special_abilities.contains(&SpecialAbility::CiwsRam) && hits > 0 {
        if let Some(player) = state.player_for_side_mut(defender.owner) {
            if let Some(wasp) = player.wasp_system_status.as_mut() {
                if wasp.try_consume_ammo(attacker_stats.attack_kind) {
                    let defense_rolls = state.rng.roll_dice(hits);
                    let negated = defense_rolls.iter().filter(|&&d| d >= 5).count() as u32;
                    hits = hits.saturating_sub(negated);
                    if negated > 0 {
                        modifiers_applied.push(format!("ciws_ram_negated-{}", negated));
                    }
                }
            }
        }
    }

    // Step 6: apply hits.
    let damage = hits;
    let destroyed = if damage > 0 {
        state
            .unit_mut(defender_id)
            .ok_or(ActionError::UnitNotFound(defender_id))?
            .take_damage(damage)
    } else {
        false
    };
    let suppression_delta = if damage > 0 && !destroyed { 1 } else { 0 };
    tracing::debug!(
        attacker_id, defender_id, dice = ?dice_rolled, hits, damage, destroyed,
        "attack resolved"
    );

    // USS Wasp is both a unit (HP/destruction) and a per-player subsystem
    // damage tracker — the two pools are kept in sync here rather than in
    // `take_damage`, since only the Wasp's owner,
    // not the unit itself, holds `wasp_system_status`.
    if damage > 0 && defender_stats.unit_type == crate::unit::UnitType::UssWasp {
        if let Some(player) = state.player_for_side_mut(defender.owner) {
            if let Some(wasp) = player.wasp_system_status.as_mut() {
                wasp.take_damage(damage);
            }
        }
    }

    // Step 7: mark attacker has_acted, consume SP, clear hidden (ambush
    // reveals the attacker).
    {
        let attacker_mut = state
            .unit_mut(attacker_id)
            .ok_or(ActionError::UnitNotFound(attacker_id))?;
        attacker_mut.has_acted = true;
        attacker_mut.attacked_this_turn = true;
        attacker_mut.hidden = false;
        if let Some(sp) = attacker_mut.current_sp {
            attacker_mut.current_sp = Some(sp.saturating_sub(1));
        }
    }

    Ok(CombatOutcome {
        dice_rolled,
        modifiers_applied,
        hits,
        damage,
        suppression_delta,
        destroyed,
    })
}

fn has_other_adjacent_enemy(
    state: &GameState,
    defender: &crate::unit::UnitInstance,
    excluding_attacker: UnitId,
) -> bool {
    let Some(defender_pos) = defender.position else {
        return false;
    };
    state.units.values().any(|u| {
        u.id != excluding_attacker
            && u.owner != defender.owner
            && u.is_alive()
            && u.position
                .map(|p| p.distance(defender_pos) == 1)
                .unwrap_or(false)
    })
}

//! Unit type definitions, stats, categories, and unit instances.
//!
//! Mirrors the ambient-stack reference engine's split between immutable
//! per-type `UnitStats` (a static table) and mutable per-instance
//! `UnitInstance` state — see DESIGN.md.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::hex::Hex;
use crate::player::Side;

pub type UnitId = u32;

/// Bitset of unit categories. Hand-rolled rather than pulled from a crate —
/// the category set is small, closed, and never serialized bit-for-bit
/// (each `UnitCategory` round-trips through serde as a named set of flags).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitCategory(u16);

impl UnitCategory {
    pub const NONE: UnitCategory = UnitCategory(0);
    pub const AIRCRAFT: UnitCategory = UnitCategory(1 << 0);
    pub const HELICOPTER: UnitCategory = UnitCategory(1 << 1);
    pub const LANDING_CRAFT: UnitCategory = UnitCategory(1 << 2);
    pub const GROUND_VEHICLE: UnitCategory = UnitCategory(1 << 3);
    pub const INFANTRY: UnitCategory = UnitCategory(1 << 4);
    pub const ARTILLERY: UnitCategory = UnitCategory(1 << 5);
    pub const SPECIAL_FORCES: UnitCategory = UnitCategory(1 << 6);
    pub const SHIP: UnitCategory = UnitCategory(1 << 7);

    pub fn contains(self, other: UnitCategory) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: UnitCategory) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for UnitCategory {
    type Output = UnitCategory;
    fn bitor(self, rhs: UnitCategory) -> UnitCategory {
        UnitCategory(self.0 | rhs.0)
    }
}

impl BitOrAssign for UnitCategory {
    fn bitor_assign(&mut self, rhs: UnitCategory) {
        self.0 |= rhs.0;
    }
}

/// All unit types modeled by this engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Marine,
    Infantry,
    MarineArtillery,
    LightArmor,
    MechInfantry,
    Harrier,
    Osprey,
    AttackHelicopter,
    AaTeam,
    SamTeam,
    SpecialForces,
    LandingCraftAir,
    UssWasp,
}

/// Attack-kind grouping used for the once-per-turn USS Wasp reactive-ammo
/// rule. Derived from a unit's primary category, not its exact type, so
/// new unit types slot into the existing kinds for free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Air,
    Sea,
    Ground,
}

/// Special abilities, keyed by a closed enum (never by raw string — see
/// DESIGN.md). `name_alias()` provides the stable string form for logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAbility {
    CloseAirSupport,
    VstolLanding,
    HeavyLift,
    AntiVehicleSpecialist,
    AntiAircraftFocus,
    IndirectFire,
    FastAmbush,
    UrbanSpecialists,
    BreachingCharge,
    Infiltrate,
    ArtilleryBarrage,
    SamStrike,
    CiwsRam,
    SeaSparrow,
}

impl SpecialAbility {
    /// Stable string alias for serialization/logging, independent of enum
    /// discriminant renumbering.
    pub fn name_alias(self) -> &'static str {
        match self {
            SpecialAbility::CloseAirSupport => "close_air_support",
            SpecialAbility::VstolLanding => "vstol_landing",
            SpecialAbility::HeavyLift => "heavy_lift",
            SpecialAbility::AntiVehicleSpecialist => "anti_vehicle_specialist",
            SpecialAbility::AntiAircraftFocus => "anti_aircraft_focus",
            SpecialAbility::IndirectFire => "indirect_fire",
            SpecialAbility::FastAmbush => "fast_ambush",
            SpecialAbility::UrbanSpecialists => "urban_specialists",
            SpecialAbility::BreachingCharge => "breaching_charge",
            SpecialAbility::Infiltrate => "infiltrate",
            SpecialAbility::ArtilleryBarrage => "artillery_barrage",
            SpecialAbility::SamStrike => "sam_strike",
            SpecialAbility::CiwsRam => "ciws_ram",
            SpecialAbility::SeaSparrow => "sea_sparrow",
        }
    }

    /// Case-insensitive lookup by alias, used by ability-name validation.
    pub fn from_name(name: &str) -> Option<SpecialAbility> {
        let lower = name.to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|a| a.name_alias() == lower)
    }

    pub fn all() -> &'static [SpecialAbility] {
        &[
            SpecialAbility::CloseAirSupport,
            SpecialAbility::VstolLanding,
            SpecialAbility::HeavyLift,
            SpecialAbility::AntiVehicleSpecialist,
            SpecialAbility::AntiAircraftFocus,
            SpecialAbility::IndirectFire,
            SpecialAbility::FastAmbush,
            SpecialAbility::UrbanSpecialists,
            SpecialAbility::BreachingCharge,
            SpecialAbility::Infiltrate,
            SpecialAbility::ArtilleryBarrage,
            SpecialAbility::SamStrike,
            SpecialAbility::CiwsRam,
            SpecialAbility::SeaSparrow,
        ]
    }
}

/// Static, immutable stats for a unit type. Never changes during a game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitStats {
    pub unit_type: UnitType,
    pub movement: u32,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    pub supply_points: Option<u32>,
    pub attack_range: u32,
    /// True for indirect-fire categories (mortar/long-range artillery
    /// equivalents) that ignore LOS blockers.
    pub indirect_fire: bool,
    pub categories: UnitCategory,
    pub cargo_capacity: u32,
    pub can_conceal: bool,
    pub special_abilities: Vec<SpecialAbility>,
    pub attack_kind: AttackKind,
}

pub fn get_unit_stats(unit_type: UnitType) -> UnitStats {
    use SpecialAbility::*;
    use UnitType::*;
    match unit_type {
        Marine => UnitStats {
            unit_type,
            movement: 3,
            attack: 2,
            defense: 2,
            hit_points: 3,
            supply_points: Some(4),
            attack_range: 1,
            indirect_fire: false,
            categories: UnitCategory::INFANTRY | UnitCategory::SPECIAL_FORCES,
            cargo_capacity: 0,
            can_conceal: true,
            special_abilities: vec![BreachingCharge, UrbanSpecialists],
            attack_kind: AttackKind::Ground,
        },
        Infantry => UnitStats {
            unit_type,
            movement: 2,
            attack: 2,
            defense: 2,
            hit_points: 3,
            supply_points: Some(4),
            attack_range: 1,
            indirect_fire: false,
            categories: UnitCategory::INFANTRY,
            cargo_capacity: 0,
            can_conceal: true,
            special_abilities: vec![UrbanSpecialists],
            attack_kind: AttackKind::Ground,
        },
        MarineArtillery => UnitStats {
            unit_type,
            movement: 1,
            attack: 3,
            defense: 1,
            hit_points: 2,
            supply_points: Some(3),
            attack_range: 10,
            indirect_fire: true,
            categories: UnitCategory::ARTILLERY,
            cargo_capacity: 0,
            can_conceal: false,
            special_abilities: vec![IndirectFire, ArtilleryBarrage],
            attack_kind: AttackKind::Ground,
        },
        LightArmor => UnitStats {
            unit_type,
            movement: 4,
            attack: 3,
            defense: 3,
            hit_points: 3,
            supply_points: Some(5),
            attack_range: 1,
            indirect_fire: false,
            categories: UnitCategory::GROUND_VEHICLE,
            cargo_capacity: 0,
            can_conceal: false,
            special_abilities: vec![AntiVehicleSpecialist],
            attack_kind: AttackKind::Ground,
        },
        MechInfantry => UnitStats {
            unit_type,
            movement: 3,
            attack: 2,
            defense: 3,
            hit_points: 3,
            supply_points: Some(4),
            attack_range: 1,
            indirect_fire: false,
            categories: UnitCategory::GROUND_VEHICLE | UnitCategory::INFANTRY,
            cargo_capacity: 2,
            can_conceal: false,
            special_abilities: vec![HeavyLift],
            attack_kind: AttackKind::Ground,
        },
        Harrier => UnitStats {
            unit_type,
            movement: 6,
            attack: 4,
            defense: 2,
            hit_points: 2,
            supply_points: None,
            attack_range: 3,
            indirect_fire: false,
            categories: UnitCategory::AIRCRAFT,
            cargo_capacity: 0,
            can_conceal: false,
            special_abilities: vec![CloseAirSupport, VstolLanding],
            attack_kind: AttackKind::Air,
        },
        Osprey => UnitStats {
            unit_type,
            movement: 5,
            attack: 0,
            defense: 1,
            hit_points: 2,
            supply_points: None,
            attack_range: 0,
            indirect_fire: false,
            categories: UnitCategory::AIRCRAFT | UnitCategory::LANDING_CRAFT,
            cargo_capacity: 2,
            can_conceal: false,
            special_abilities: vec![HeavyLift, VstolLanding],
            attack_kind: AttackKind::Air,
        },
        AttackHelicopter => UnitStats {
            unit_type,
            movement: 5,
            attack: 3,
            defense: 2,
            hit_points: 2,
            supply_points: None,
            attack_range: 2,
            indirect_fire: false,
            categories: UnitCategory::HELICOPTER,
            cargo_capacity: 0,
            can_conceal: false,
            special_abilities: vec![CloseAirSupport],
            attack_kind: AttackKind::Air,
        },
        AaTeam => UnitStats {
            unit_type,
            movement: 1,
            attack: 3,
            defense: 2,
            hit_points: 2,
            supply_points: Some(3),
            attack_range: 3,
            indirect_fire: false,
            categories: UnitCategory::ARTILLERY,
            cargo_capacity: 0,
            can_conceal: true,
            special_abilities: vec![AntiAircraftFocus],
            attack_kind: AttackKind::Ground,
        },
        SamTeam => UnitStats {
            unit_type,
            movement: 1,
            attack: 4,
            defense: 1,
            hit_points: 2,
            supply_points: Some(2),
            attack_range: 4,
            indirect_fire: false,
            categories: UnitCategory::ARTILLERY,
            cargo_capacity: 0,
            can_conceal: true,
            special_abilities: vec![SamStrike, AntiAircraftFocus],
            attack_kind: AttackKind::Ground,
        },
        SpecialForces => UnitStats {
            unit_type,
            movement: 3,
            attack: 3,
            defense: 2,
            hit_points: 2,
            supply_points: Some(3),
            attack_range: 1,
            indirect_fire: false,
            categories: UnitCategory::SPECIAL_FORCES,
            cargo_capacity: 0,
            can_conceal: true,
            special_abilities: vec![Infiltrate, FastAmbush],
            attack_kind: AttackKind::Ground,
        },
        LandingCraftAir => UnitStats {
            unit_type,
            movement: 4,
            attack: 0,
            defense: 1,
            hit_points: 2,
            supply_points: None,
            attack_range: 0,
            indirect_fire: false,
            categories: UnitCategory::LANDING_CRAFT,
            cargo_capacity: 3,
            can_conceal: false,
            special_abilities: vec![HeavyLift],
            attack_kind: AttackKind::Sea,
        },
        UssWasp => UnitStats {
            unit_type,
            movement: 1,
            attack: 0,
            defense: 4,
            hit_points: 10,
            supply_points: None,
            attack_range: 0,
            indirect_fire: false,
            categories: UnitCategory::SHIP,
            cargo_capacity: 6,
            can_conceal: false,
            special_abilities: vec![CiwsRam, SeaSparrow],
            attack_kind: AttackKind::Sea,
        },
    }
}

impl UnitType {
    pub fn all() -> &'static [UnitType] {
        use UnitType::*;
        &[
            Marine,
            Infantry,
            MarineArtillery,
            LightArmor,
            MechInfantry,
            Harrier,
            Osprey,
            AttackHelicopter,
            AaTeam,
            SamTeam,
            SpecialForces,
            LandingCraftAir,
            UssWasp,
        ]
    }
}

/// Suppression ladder, driven purely by `suppression_tokens` (0/1/2) rather
/// than a separately-tracked enum, so it can never desync from the token
/// count. See `UnitInstance::status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    Normal,
    Suppressed,
    Pinned,
    Destroyed,
}

/// A specific unit instance in play.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitInstance {
    pub id: UnitId,
    pub unit_type: UnitType,
    pub owner: Side,
    pub position: Option<Hex>,
    pub current_hp: u32,
    pub current_sp: Option<u32>,
    pub suppression_tokens: u8,
    pub has_moved: bool,
    pub has_acted: bool,
    pub hidden: bool,
    pub attacked_this_turn: bool,
    pub cargo: Vec<UnitId>,
}

impl UnitInstance {
    pub fn new(id: UnitId, unit_type: UnitType, owner: Side, position: Option<Hex>) -> Self {
        let stats = get_unit_stats(unit_type);
        UnitInstance {
            id,
            unit_type,
            owner,
            position,
            current_hp: stats.hit_points,
            current_sp: stats.supply_points,
            suppression_tokens: 0,
            has_moved: false,
            has_acted: false,
            hidden: false,
            attacked_this_turn: false,
            cargo: Vec::new(),
        }
    }

    pub fn stats(&self) -> UnitStats {
        get_unit_stats(self.unit_type)
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn status(&self) -> UnitStatus {
        if !self.is_alive() {
            UnitStatus::Destroyed
        } else {
            match self.suppression_tokens {
                0 => UnitStatus::Normal,
                1 => UnitStatus::Suppressed,
                _ => UnitStatus::Pinned,
            }
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.status() == UnitStatus::Pinned
    }

    /// `stats.atk` minus a suppression penalty (1 die per suppression token).
    pub fn effective_attack(&self) -> u32 {
        self.stats().attack.saturating_sub(self.suppression_tokens as u32)
    }

    /// `stats.mv` minus a suppression penalty, 0 if pinned.
    pub fn effective_movement(&self) -> u32 {
        if self.is_pinned() {
            return 0;
        }
        self.stats()
            .movement
            .saturating_sub(self.suppression_tokens as u32)
    }

    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.has_acted && !self.is_pinned()
    }

    pub fn can_move(&self) -> bool {
        self.is_alive() && !self.has_moved && !self.is_pinned()
    }

    pub fn cargo_len(&self) -> usize {
        self.cargo.len()
    }

    pub fn has_cargo_room(&self) -> bool {
        (self.cargo.len() as u32) < self.stats().cargo_capacity
    }

    /// Subtract HP, clamp at 0, add one suppression token (cap 2) if the
    /// unit survives. Returns `true` if the unit was destroyed by this hit.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.current_hp = self.current_hp.saturating_sub(amount);
        if self.current_hp == 0 {
            return true;
        }
        self.suppression_tokens = (self.suppression_tokens + 1).min(2);
        false
    }

    /// Clears `has_moved`/`has_acted`/`attacked_this_turn`; drops one
    /// suppression token if the unit did not attack last turn.
    pub fn reset_turn_state(&mut self) {
        if !self.attacked_this_turn && self.suppression_tokens > 0 {
            self.suppression_tokens -= 1;
        }
        self.has_moved = false;
        self.has_acted = false;
        self.attacked_this_turn = false;
    }

    pub fn can_conceal(&self) -> bool {
        self.stats().can_conceal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_bitset_intersects_and_contains() {
        let infantry = UnitCategory::INFANTRY;
        let mixed = UnitCategory::INFANTRY | UnitCategory::GROUND_VEHICLE;
        assert!(mixed.contains(infantry));
        assert!(mixed.intersects(UnitCategory::GROUND_VEHICLE));
        assert!(!infantry.intersects(UnitCategory::AIRCRAFT));
    }

    #[test]
    fn ability_lookup_is_case_insensitive() {
        assert_eq!(
            SpecialAbility::from_name("Heavy_Lift"),
            Some(SpecialAbility::HeavyLift)
        );
        assert_eq!(SpecialAbility::from_name("not_a_real_ability"), None);
    }

    #[test]
    fn take_damage_adds_suppression_until_destroyed() {
        let mut unit = UnitInstance::new(1, UnitType::Marine, Side::Assault, None);
        assert!(!unit.take_damage(1));
        assert_eq!(unit.suppression_tokens, 1);
        assert!(!unit.take_damage(1));
        assert_eq!(unit.suppression_tokens, 2);
        assert!(unit.is_pinned());
        assert!(unit.take_damage(1));
        assert_eq!(unit.current_hp, 0);
        assert_eq!(unit.status(), UnitStatus::Destroyed);
    }

    #[test]
    fn pinned_unit_cannot_move_or_act() {
        let mut unit = UnitInstance::new(1, UnitType::Marine, Side::Assault, None);
        unit.suppression_tokens = 2;
        assert!(!unit.can_act());
        assert!(!unit.can_move());
        assert_eq!(unit.effective_movement(), 0);
    }

    #[test]
    fn reset_turn_state_drops_token_only_if_no_attack() {
        let mut unit = UnitInstance::new(1, UnitType::Marine, Side::Assault, None);
        unit.suppression_tokens = 1;
        unit.attacked_this_turn = true;
        unit.reset_turn_state();
        assert_eq!(unit.suppression_tokens, 1);

        unit.suppression_tokens = 1;
        unit.attacked_this_turn = false;
        unit.reset_turn_state();
        assert_eq!(unit.suppression_tokens, 0);
    }

    #[test]
    fn reset_turn_state_is_idempotent_without_intervening_turn() {
        let mut unit = UnitInstance::new(1, UnitType::Marine, Side::Assault, None);
        unit.has_moved = true;
        unit.has_acted = true;
        unit.reset_turn_state();
        let after_one = unit.clone();
        unit.reset_turn_state();
        assert_eq!(after_one.has_moved, unit.has_moved);
        assert_eq!(after_one.has_acted, unit.has_acted);
        assert_eq!(after_one.suppression_tokens, unit.suppression_tokens);
    }
}

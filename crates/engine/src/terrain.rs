//! Terrain types and their static combat/movement properties.

use serde::{Deserialize, Serialize};

use crate::unit::UnitCategory;

/// Closed terrain enum. Each variant's properties are looked up through
/// `TerrainProfile`, mirroring the unit-stats static-table pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    DeepWater,
    ShallowWater,
    Beach,
    Clear,
    LightWoods,
    HeavyWoods,
    Urban,
    Hills,
    Mountains,
}

impl Terrain {
    pub fn all() -> &'static [Terrain] {
        &[
            Terrain::DeepWater,
            Terrain::ShallowWater,
            Terrain::Beach,
            Terrain::Clear,
            Terrain::LightWoods,
            Terrain::HeavyWoods,
            Terrain::Urban,
            Terrain::Hills,
            Terrain::Mountains,
        ]
    }

    pub fn profile(self) -> TerrainProfile {
        match self {
            Terrain::DeepWater => TerrainProfile {
                move_cost_ground: None,
                move_cost_amphibious: Some(1),
                defense_bonus: 0,
                blocks_los: false,
                concealment_bonus: 0,
                landing_allowed: false,
                is_water: true,
            },
            Terrain::ShallowWater => TerrainProfile {
                move_cost_ground: None,
                move_cost_amphibious: Some(1),
                defense_bonus: 0,
                blocks_los: false,
                concealment_bonus: 0,
                landing_allowed: true,
                is_water: true,
            },
            Terrain::Beach => TerrainProfile {
                move_cost_ground: Some(1),
                move_cost_amphibious: Some(1),
                defense_bonus: 0,
                blocks_los: false,
                concealment_bonus: 0,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::Clear => TerrainProfile {
                move_cost_ground: Some(1),
                move_cost_amphibious: Some(1),
                defense_bonus: 0,
                blocks_los: false,
                concealment_bonus: 0,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::LightWoods => TerrainProfile {
                move_cost_ground: Some(2),
                move_cost_amphibious: Some(2),
                defense_bonus: 1,
                blocks_los: false,
                concealment_bonus: 1,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::HeavyWoods => TerrainProfile {
                move_cost_ground: Some(3),
                move_cost_amphibious: Some(3),
                defense_bonus: 2,
                blocks_los: true,
                concealment_bonus: 2,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::Urban => TerrainProfile {
                move_cost_ground: Some(2),
                move_cost_amphibious: Some(2),
                defense_bonus: 2,
                blocks_los: false,
                concealment_bonus: 1,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::Hills => TerrainProfile {
                move_cost_ground: Some(2),
                move_cost_amphibious: Some(2),
                defense_bonus: 1,
                blocks_los: false,
                concealment_bonus: 1,
                landing_allowed: true,
                is_water: false,
            },
            Terrain::Mountains => TerrainProfile {
                move_cost_ground: Some(3),
                move_cost_amphibious: Some(3),
                defense_bonus: 2,
                blocks_los: true,
                concealment_bonus: 1,
                landing_allowed: false,
                is_water: false,
            },
        }
    }
}

/// Static per-terrain data, analogous to `UnitStats` for units.
#[derive(Clone, Copy, Debug)]
pub struct TerrainProfile {
    /// Cost for non-amphibious ground categories to enter; `None` if
    /// impassable to them.
    pub move_cost_ground: Option<u32>,
    /// Cost for amphibious/sea/air categories to enter.
    pub move_cost_amphibious: Option<u32>,
    pub defense_bonus: i32,
    pub blocks_los: bool,
    pub concealment_bonus: i32,
    pub landing_allowed: bool,
    pub is_water: bool,
}

impl TerrainProfile {
    /// Movement cost for a unit with the given categories, or `None` if
    /// impassable to all of them (caller maps this to `InvalidTerrain`).
    pub fn movement_cost_for(&self, categories: UnitCategory) -> Option<u32> {
        if categories.intersects(UnitCategory::AIRCRAFT | UnitCategory::HELICOPTER) {
            // Aircraft ignore ground terrain cost entirely; see map.rs for
            // the landing-zone check that still applies when they disembark.
            return Some(1);
        }
        if categories.intersects(UnitCategory::SHIP | UnitCategory::LANDING_CRAFT) {
            return self.move_cost_amphibious.filter(|_| self.is_water);
        }
        // Ground categories: amphibious-capable landing craft already
        // handled above; everything else must use the ground cost table and
        // cannot enter water at all.
        if self.is_water {
            return None;
        }
        self.move_cost_ground
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_unit_cannot_enter_water() {
        let profile = Terrain::DeepWater.profile();
        assert_eq!(profile.movement_cost_for(UnitCategory::INFANTRY), None);
    }

    #[test]
    fn aircraft_ignore_ground_cost() {
        let profile = Terrain::Mountains.profile();
        assert_eq!(profile.movement_cost_for(UnitCategory::AIRCRAFT), Some(1));
    }

    #[test]
    fn landing_craft_can_enter_shallow_water() {
        let profile = Terrain::ShallowWater.profile();
        assert_eq!(
            profile.movement_cost_for(UnitCategory::LANDING_CRAFT),
            Some(1)
        );
    }

    #[test]
    fn mountains_block_los_and_landing() {
        let profile = Terrain::Mountains.profile();
        assert!(profile.blocks_los);
        assert!(!profile.landing_allowed);
    }
}

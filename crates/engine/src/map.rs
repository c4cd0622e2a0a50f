//! The static game board: a rectangular hex grid of terrain plus objectives.

use serde::{Deserialize, Serialize};

use crate::hex::{self, Hex, PathResult};
use crate::player::{ObjectiveId, Side};
use crate::terrain::Terrain;
use crate::unit::UnitCategory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveType {
    Port,
    Airfield,
    CommsHub,
    CivicCenter,
    HighValueTarget,
    LandingZone,
    DefensivePosition,
    SupplyDepot,
    CommandPost,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub objective_type: ObjectiveType,
    pub position: Hex,
    pub owner: Option<Side>,
    pub priority: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HexCell {
    terrain: Terrain,
    objective: Option<ObjectiveId>,
    fortifications: Vec<String>,
}

/// Which long edge of the rectangle is the offshore (amphibious approach)
/// zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffshoreEdge {
    West,
    East,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Map {
    pub width: i32,
    pub height: i32,
    offshore_edge: OffshoreEdge,
    cells: Vec<HexCell>,
    objectives: Vec<Objective>,
}

impl Map {
    /// Construct a rectangular map of `width`x`height` "odd-r" offset hexes,
    /// all `Clear` terrain, with no objectives. Scenario setup overwrites
    /// individual hexes afterward.
    pub fn new(width: i32, height: i32, offshore_edge: OffshoreEdge) -> Self {
        let count = (width * height).max(0) as usize;
        Map {
            width,
            height,
            offshore_edge,
            cells: vec![
                HexCell {
                    terrain: Terrain::Clear,
                    objective: None,
                    fortifications: Vec::new(),
                };
                count
            ],
            objectives: Vec::new(),
        }
    }

    fn index_of(&self, hex: Hex) -> Option<usize> {
        let (col, row) = hex.to_offset();
        if col < 0 || row < 0 || col >= self.width || row >= self.height {
            return None;
        }
        Some((row * self.width + col) as usize)
    }

    pub fn is_in_bounds(&self, hex: Hex) -> bool {
        self.index_of(hex).is_some()
    }

    pub fn all_hexes(&self) -> Vec<Hex> {
        let mut out = Vec::with_capacity(self.cells.len());
        for row in 0..self.height {
            for col in 0..self.width {
                out.push(Hex::from_offset(col, row));
            }
        }
        out
    }

    pub fn set_terrain(&mut self, hex: Hex, terrain: Terrain) {
        if let Some(idx) = self.index_of(hex) {
            self.cells[idx].terrain = terrain;
        }
    }

    pub fn get_terrain(&self, hex: Hex) -> Option<Terrain> {
        self.index_of(hex).map(|idx| self.cells[idx].terrain)
    }

    /// Movement cost to enter `hex` for a unit with `categories`, or `None`
    /// if impassable. `None` also covers out-of-bounds hexes.
    pub fn movement_cost(&self, hex: Hex, categories: UnitCategory) -> Option<u32> {
        let terrain = self.get_terrain(hex)?;
        terrain.profile().movement_cost_for(categories)
    }

    pub fn defense_bonus(&self, hex: Hex) -> i32 {
        self.get_terrain(hex)
            .map(|t| t.profile().defense_bonus)
            .unwrap_or(0)
    }

    pub fn concealment(&self, hex: Hex) -> i32 {
        self.get_terrain(hex)
            .map(|t| t.profile().concealment_bonus)
            .unwrap_or(0)
    }

    pub fn blocks_los(&self, hex: Hex) -> bool {
        self.get_terrain(hex)
            .map(|t| t.profile().blocks_los)
            .unwrap_or(false)
    }

    pub fn landing_allowed(&self, hex: Hex) -> bool {
        self.get_terrain(hex)
            .map(|t| t.profile().landing_allowed)
            .unwrap_or(false)
    }

    /// The offshore zone is the column of hexes along the designated long
    /// edge.
    pub fn is_offshore_zone(&self, hex: Hex) -> bool {
        let Some(idx) = self.index_of(hex) else {
            return false;
        };
        let col = (idx as i32) % self.width;
        match self.offshore_edge {
            OffshoreEdge::West => col == 0,
            OffshoreEdge::East => col == self.width - 1,
        }
    }

    pub fn get_objective(&self, hex: Hex) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.position == hex)
    }

    pub fn get_objective_mut(&mut self, hex: Hex) -> Option<&mut Objective> {
        self.objectives.iter_mut().find(|o| o.position == hex)
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Add an objective. Fails silently (returns `false`) if the hex
    /// already has one or is out of bounds — setup code is expected to
    /// validate this itself via `get_objective` before calling.
    pub fn add_objective(&mut self, objective: Objective) -> bool {
        if !self.is_in_bounds(objective.position) {
            return false;
        }
        if self.get_objective(objective.position).is_some() {
            return false;
        }
        if let Some(idx) = self.index_of(objective.position) {
            self.cells[idx].objective = Some(objective.id);
        }
        self.objectives.push(objective);
        true
    }

    /// Whether `target` is in line-of-sight from `origin`: the line between
    /// them contains no LOS-blocking hex other than the endpoints
    /// themselves. Heavy Woods blocks LOS *through* it but does not block
    /// LOS to/from an adjacent hex — that distinction falls out naturally
    /// since adjacent hexes have no intermediate cells.
    pub fn has_line_of_sight(&self, origin: Hex, target: Hex) -> bool {
        let line = origin.line_to(target);
        if line.len() <= 2 {
            return true;
        }
        line[1..line.len() - 1]
            .iter()
            .all(|hex| !self.blocks_los(*hex))
    }

    /// A* path-find for a unit with the given categories, honoring terrain
    /// movement cost and map bounds. `max_cost` is typically the unit's
    /// effective movement allowance.
    pub fn find_path(
        &self,
        start: Hex,
        goal: Hex,
        categories: UnitCategory,
        max_cost: Option<u32>,
    ) -> PathResult {
        hex::a_star(start, goal, max_cost, |hex| self.movement_cost(hex, categories))
    }
}

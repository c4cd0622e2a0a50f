//! Scenario configuration loading.
//!
//! Grounded on the ambient-stack reference engine's setup-record pattern:
//! a serde-derived config struct loaded via `serde_json`, producing
//! field-named `ActionError::SetupError` diagnostics on malformed input,
//! never a panic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ai::AiPersonality;
use crate::dice::DeterministicRng;
use crate::error::ActionError;
use crate::hex::Hex;
use crate::map::{Map, Objective, ObjectiveType, OffshoreEdge};
use crate::phase::{Phase, PhaseState};
use crate::player::{Player, Side, WaspSystemStatus};
use crate::state::GameState;
use crate::terrain::Terrain;
use crate::unit::UnitType;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioHex {
    pub col: i32,
    pub row: i32,
    pub terrain: Terrain,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioObjective {
    pub id: u32,
    pub objective_type: ObjectiveType,
    pub col: i32,
    pub row: i32,
    pub priority: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioUnit {
    pub unit_type: UnitType,
    pub side: Side,
    pub col: i32,
    pub row: i32,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub map_width: i32,
    pub map_height: i32,
    #[serde(default)]
    pub offshore_edge: ScenarioOffshoreEdge,
    #[serde(default)]
    pub hexes: Vec<ScenarioHex>,
    #[serde(default)]
    pub objectives: Vec<ScenarioObjective>,
    pub units: Vec<ScenarioUnit>,
    pub turn_limit: u32,
    pub rng_seed: Option<u64>,
    #[serde(default)]
    pub ai_personalities: HashMap<Side, AiPersonality>,
    #[serde(default)]
    pub wasp_structural_hp: Option<u32>,
    #[serde(default)]
    pub wasp_defensive_ammo: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum ScenarioOffshoreEdge {
    #[default]
    West,
    East,
}

impl From<ScenarioOffshoreEdge> for OffshoreEdge {
    fn from(value: ScenarioOffshoreEdge) -> Self {
        match value {
            ScenarioOffshoreEdge::West => OffshoreEdge::West,
            ScenarioOffshoreEdge::East => OffshoreEdge::East,
        }
    }
}

/// Parse and validate a scenario configuration from JSON text, building a
/// fresh `GameState`. Malformed input produces a field-named
/// `ActionError::SetupError`, never a panic.
pub fn load_scenario(json: &str) -> Result<GameState, ActionError> {
    load_scenario_with_personalities(json).map(|(state, _)| state)
}

/// Like [`load_scenario`], but also returns the per-side AI personalities
/// named in the config, for `Engine::new` to auto-register.
pub fn load_scenario_with_personalities(
    json: &str,
) -> Result<(GameState, HashMap<Side, AiPersonality>), ActionError> {
    let config: ScenarioConfig =
        serde_json::from_str(json).map_err(|e| ActionError::SetupError(e.to_string()))?;
    let personalities = config.ai_personalities.clone();
    let state = build_game_state(config)?;
    Ok((state, personalities))
}

fn build_game_state(config: ScenarioConfig) -> Result<GameState, ActionError> {
    if config.map_width <= 0 || config.map_height <= 0 {
        return Err(ActionError::SetupError("map dimensions must be positive".to_string()));
    }
    if config.units.is_empty() {
        return Err(ActionError::SetupError("units: scenario must place at least one unit".to_string()));
    }

    let mut map = Map::new(config.map_width, config.map_height, config.offshore_edge.into());
    for hex_cfg in &config.hexes {
        map.set_terrain(Hex::from_offset(hex_cfg.col, hex_cfg.row), hex_cfg.terrain);
    }
    for (index, objective_cfg) in config.objectives.iter().enumerate() {
        let position = Hex::from_offset(objective_cfg.col, objective_cfg.row);
        if !map.is_in_bounds(position) {
            return Err(ActionError::SetupError(format!(
                "objectives[{index}]: position ({}, {}) is out of map bounds",
                objective_cfg.col, objective_cfg.row
            )));
        }
        let added = map.add_objective(Objective {
            id: crate::player::ObjectiveId(objective_cfg.id),
            objective_type: objective_cfg.objective_type,
            position,
            owner: None,
            priority: objective_cfg.priority,
        });
        if !added {
            return Err(ActionError::SetupError(format!(
                "objectives[{index}]: duplicate objective position or id"
            )));
        }
    }

    let mut players = HashMap::new();
    players.insert(1, Player::new(1, Side::Assault));
    players.insert(2, Player::new(2, Side::Defender));
    if let Some(assault) = players.get_mut(&1) {
        assault.wasp_system_status = Some(WaspSystemStatus::new(
            config.wasp_structural_hp.unwrap_or(10),
            config.wasp_defensive_ammo.unwrap_or(4),
        ));
    }

    let mut units = HashMap::new();
    let mut next_unit_id = 1u32;
    for (index, unit_cfg) in config.units.iter().enumerate() {
        let position = Hex::from_offset(unit_cfg.col, unit_cfg.row);
        if !map.is_in_bounds(position) {
            return Err(ActionError::SetupError(format!(
                "units[{index}]: position ({}, {}) is out of map bounds",
                unit_cfg.col, unit_cfg.row
            )));
        }
        let unit_id = next_unit_id;
        next_unit_id += 1;
        let mut instance = crate::unit::UnitInstance::new(unit_id, unit_cfg.unit_type, unit_cfg.side, Some(position));
        instance.hidden = unit_cfg.hidden && instance.can_conceal();
        units.insert(unit_id, instance);

        let player_id = match unit_cfg.side {
            Side::Assault => 1,
            Side::Defender => 2,
        };
        if let Some(player) = players.get_mut(&player_id) {
            player.units.push(unit_id);
        }
    }

    let rng = match config.rng_seed {
        Some(seed) => DeterministicRng::new(seed),
        None => DeterministicRng::new(0),
    };

    Ok(GameState {
        id: 1,
        turn: 1,
        max_turns: config.turn_limit,
        phase: Phase::Event,
        phase_state: PhaseState::None,
        active_side: Side::Assault,
        players,
        units,
        map,
        log: Vec::new(),
        is_game_over: false,
        winner: None,
        next_unit_id,
        rng,
        undo_checkpoints: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "map_width": 4,
            "map_height": 4,
            "units": [
                {"unit_type": "Marine", "side": "Assault", "col": 0, "row": 0},
                {"unit_type": "Infantry", "side": "Defender", "col": 3, "row": 3}
            ],
            "turn_limit": 20,
            "rng_seed": 42
        }"#
    }

    #[test]
    fn loads_a_minimal_scenario() {
        let state = load_scenario(sample_json()).unwrap();
        assert_eq!(state.units.len(), 2);
        assert_eq!(state.max_turns, 20);
        assert!(state.player_for_side(Side::Assault).unwrap().wasp_system_status.is_some());
    }

    #[test]
    fn rejects_out_of_bounds_unit_placement() {
        let bad = r#"{
            "map_width": 2,
            "map_height": 2,
            "units": [{"unit_type": "Marine", "side": "Assault", "col": 9, "row": 9}],
            "turn_limit": 10
        }"#;
        let result = load_scenario(bad);
        assert!(matches!(result, Err(ActionError::SetupError(_))));
    }

    #[test]
    fn rejects_malformed_json_without_panicking() {
        let result = load_scenario("{ not json");
        assert!(matches!(result, Err(ActionError::SetupError(_))));
    }
}

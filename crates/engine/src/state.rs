//! Top-level game state: owns the map, players, unit arena, and log.
//!
//! Grounded on the ambient-stack reference engine's `state.rs` struct
//! shape (`action_log`, `rng_seed`/`rng_counter`, `undo_checkpoints`),
//! with domain fields replaced for this game's state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::AppliedAction;
use crate::dice::DeterministicRng;
use crate::map::Map;
use crate::phase::{Phase, PhaseState};
use crate::player::{Player, PlayerId, Side};
use crate::unit::{UnitId, UnitInstance};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub id: u64,
    pub turn: u32,
    pub max_turns: u32,
    pub phase: Phase,
    pub phase_state: PhaseState,
    pub active_side: Side,
    /// Arena: `Player`s live here exclusively, everything else holds a
    /// `PlayerId` and resolves through this map (see DESIGN.md).
    pub players: HashMap<PlayerId, Player>,
    /// Arena: `UnitInstance`s live here exclusively, whether currently on
    /// the map or embarked as cargo on another unit.
    pub units: HashMap<UnitId, UnitInstance>,
    pub map: Map,
    pub log: Vec<AppliedAction>,
    pub is_game_over: bool,
    pub winner: Option<PlayerId>,
    pub next_unit_id: UnitId,
    pub rng: DeterministicRng,
    pub undo_checkpoints: Vec<usize>,
}

impl GameState {
    pub fn player_for_side(&self, side: Side) -> Option<&Player> {
        self.players.values().find(|p| p.side == side)
    }

    pub fn player_for_side_mut(&mut self, side: Side) -> Option<&mut Player> {
        self.players.values_mut().find(|p| p.side == side)
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.player_for_side(self.active_side)
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitInstance> {
        self.units.get_mut(&id)
    }

    /// Whether `id` is currently embarked as cargo on some other unit.
    pub fn is_in_cargo(&self, id: UnitId) -> bool {
        self.units.values().any(|u| u.cargo.contains(&id))
    }

    /// The unit currently carrying `id`, if any.
    pub fn carrier_of(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.values().find(|u| u.cargo.contains(&id))
    }

    pub fn units_for_side(&self, side: Side) -> Vec<&UnitInstance> {
        self.units.values().filter(|u| u.owner == side).collect()
    }

    pub fn record_checkpoint(&mut self) {
        self.undo_checkpoints.push(self.log.len());
    }

    pub fn check_victory(&mut self) {
        if self.is_game_over {
            return;
        }
        if self.turn > self.max_turns {
            self.is_game_over = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::OffshoreEdge;

    fn empty_state() -> GameState {
        GameState {
            id: 1,
            turn: 1,
            max_turns: 10,
            phase: Phase::Event,
            phase_state: PhaseState::None,
            active_side: Side::Assault,
            players: HashMap::new(),
            units: HashMap::new(),
            map: Map::new(2, 2, OffshoreEdge::West),
            log: Vec::new(),
            is_game_over: false,
            winner: None,
            next_unit_id: 1,
            rng: DeterministicRng::new(1),
            undo_checkpoints: Vec::new(),
        }
    }

    #[test]
    fn active_player_resolves_by_side() {
        let mut state = empty_state();
        state
            .players
            .insert(1, Player::new(1, Side::Assault));
        assert_eq!(state.active_player().unwrap().id, 1);
    }

    #[test]
    fn game_over_when_turn_exceeds_max() {
        let mut state = empty_state();
        state.turn = 11;
        state.check_victory();
        assert!(state.is_game_over);
    }

    #[test]
    fn carrier_of_finds_the_cargo_holder() {
        use crate::unit::{UnitInstance, UnitType};
        let mut state = empty_state();
        let mut carrier = UnitInstance::new(1, UnitType::Osprey, Side::Assault, None);
        carrier.cargo.push(2);
        state.units.insert(1, carrier);
        state
            .units
            .insert(2, UnitInstance::new(2, UnitType::Marine, Side::Assault, None));
        assert_eq!(state.carrier_of(2).unwrap().id, 1);
        assert!(state.is_in_cargo(2));
    }
}

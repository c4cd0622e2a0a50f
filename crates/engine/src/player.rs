//! Players, per-side resources, and USS Wasp subsystem status.

use serde::{Deserialize, Serialize};

use crate::unit::UnitId;

pub type PlayerId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Assault,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Assault => Side::Defender,
            Side::Defender => Side::Assault,
        }
    }
}

/// One of the three gated Wasp subsystems. `Destroyed` is reported
/// separately since it ends the game rather than merely gating launches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    Operational,
    Limited,
    Damaged,
    Offline,
}

/// USS Wasp composite subsystem status, degrading with cumulative
/// structural damage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaspSystemStatus {
    pub flight_deck: SystemStatus,
    pub well_deck: SystemStatus,
    pub c2: SystemStatus,
    pub structural_hp: u32,
    pub max_structural_hp: u32,
    pub defensive_ammo: u32,
    pub destroyed: bool,
    /// Attack kinds (by `AttackKind`, stored as a small inline set since the
    /// domain only ever has three) that have already consumed a defensive
    /// ammo round this turn. Cleared at End phase.
    pub ammo_used_kinds_this_turn: Vec<crate::unit::AttackKind>,
}

impl WaspSystemStatus {
    pub fn new(max_structural_hp: u32, defensive_ammo: u32) -> Self {
        let mut status = WaspSystemStatus {
            flight_deck: SystemStatus::Operational,
            well_deck: SystemStatus::Operational,
            c2: SystemStatus::Operational,
            structural_hp: max_structural_hp,
            max_structural_hp,
            defensive_ammo,
            destroyed: false,
            ammo_used_kinds_this_turn: Vec::new(),
        };
        status.recompute();
        status
    }

    /// Cumulative damage taken so far (keyed by damage taken, not
    /// remaining HP).
    fn damage_taken(&self) -> u32 {
        self.max_structural_hp.saturating_sub(self.structural_hp)
    }

    /// Recompute `flight_deck`/`well_deck`/`c2`/`destroyed` from
    /// `structural_hp` against the damage table. Called after every hit.
    pub fn recompute(&mut self) {
        let damage = self.damage_taken();
        let (flight_deck, well_deck, c2, destroyed) = match damage {
            0..=3 => (SystemStatus::Operational, SystemStatus::Operational, SystemStatus::Operational, false),
            4..=5 => (SystemStatus::Limited, SystemStatus::Operational, SystemStatus::Operational, false),
            6..=7 => (SystemStatus::Damaged, SystemStatus::Limited, SystemStatus::Limited, false),
            8..=9 => (SystemStatus::Offline, SystemStatus::Damaged, SystemStatus::Limited, false),
            _ => (SystemStatus::Offline, SystemStatus::Offline, SystemStatus::Offline, true),
        };
        self.flight_deck = flight_deck;
        self.well_deck = well_deck;
        self.c2 = c2;
        self.destroyed = destroyed;
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.structural_hp = self.structural_hp.saturating_sub(amount);
        self.recompute();
    }

    pub fn can_launch(&self) -> bool {
        !self.destroyed && !matches!(self.flight_deck, SystemStatus::Offline)
    }

    /// Launches permitted per turn at the current flight-deck status: a
    /// degraded deck throttles sortie rate before it goes fully offline.
    /// `None` means unlimited.
    pub fn max_launches_per_turn(&self) -> Option<u32> {
        match self.flight_deck {
            SystemStatus::Operational => None,
            SystemStatus::Limited => Some(1),
            SystemStatus::Damaged => Some(0),
            SystemStatus::Offline => Some(0),
        }
    }

    pub fn can_recover(&self) -> bool {
        !self.destroyed && !matches!(self.well_deck, SystemStatus::Offline)
    }

    /// CP contribution from C2 status.
    pub fn command_points_generated(&self) -> u32 {
        match self.c2 {
            SystemStatus::Operational => 3,
            SystemStatus::Limited | SystemStatus::Damaged => 2,
            SystemStatus::Offline => 0,
        }
    }

    /// Consume one defensive-ammo charge for `kind` if this is the first
    /// use of that kind this turn. Returns whether the reactive defense
    /// fires (ammo available for a first use, or already paid for this
    /// turn) per the "once per turn per attack kind" rule.
    pub fn try_consume_ammo(&mut self, kind: crate::unit::AttackKind) -> bool {
        let already_used = self
            .ammo_used_kinds_this_turn
            .iter()
            .any(|k| kind_eq(*k, kind));
        if already_used {
            return true;
        }
        if self.defensive_ammo == 0 {
            return false;
        }
        self.defensive_ammo -= 1;
        self.ammo_used_kinds_this_turn.push(kind);
        true
    }

    pub fn reset_turn_ammo_tracking(&mut self) {
        self.ammo_used_kinds_this_turn.clear();
    }
}

fn kind_eq(a: crate::unit::AttackKind, b: crate::unit::AttackKind) -> bool {
    use crate::unit::AttackKind::*;
    matches!((a, b), (Air, Air) | (Sea, Sea) | (Ground, Ground))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectiveId(pub u32);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub side: Side,
    pub command_points: u32,
    pub units: Vec<UnitId>,
    pub objectives_owned: Vec<ObjectiveId>,
    pub wasp_system_status: Option<WaspSystemStatus>,
}

impl Player {
    pub fn new(id: PlayerId, side: Side) -> Self {
        Player {
            id,
            side,
            command_points: 0,
            units: Vec::new(),
            objectives_owned: Vec::new(),
            wasp_system_status: None,
        }
    }

    /// CP generated at Command phase: Assault depends on Wasp C2 status,
    /// Defender is a flat constant.
    pub fn command_points_for_turn(&self) -> u32 {
        match self.side {
            Side::Assault => self
                .wasp_system_status
                .as_ref()
                .map(|w| w.command_points_generated())
                .unwrap_or(0),
            Side::Defender => 2,
        }
    }

    /// Overflow CP is discarded at End phase; callers call this instead of
    /// carrying a balance forward unbounded (there is no cap named in the
    /// spec beyond "discarded", so this is a no-op placeholder kept
    /// symmetrical with `grant_command_points` for call-site clarity).
    pub fn discard_overflow_cp(&mut self, cap: u32) {
        if self.command_points > cap {
            self.command_points = cap;
        }
    }

    pub fn grant_command_points(&mut self, amount: u32) {
        self.command_points += amount;
    }

    pub fn spend_command_points(&mut self, amount: u32) -> bool {
        if self.command_points < amount {
            return false;
        }
        self.command_points -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::AttackKind;

    #[test]
    fn wasp_status_matches_damage_table() {
        let mut wasp = WaspSystemStatus::new(10, 4);
        assert_eq!(wasp.flight_deck, SystemStatus::Operational);

        wasp.take_damage(4);
        assert_eq!(wasp.flight_deck, SystemStatus::Limited);
        assert_eq!(wasp.well_deck, SystemStatus::Operational);

        wasp.take_damage(2);
        assert_eq!(wasp.flight_deck, SystemStatus::Damaged);
        assert_eq!(wasp.well_deck, SystemStatus::Limited);
        assert_eq!(wasp.c2, SystemStatus::Limited);

        wasp.take_damage(2);
        assert_eq!(wasp.flight_deck, SystemStatus::Offline);

        wasp.take_damage(1);
        assert!(wasp.destroyed);
    }

    #[test]
    fn wasp_ammo_is_once_per_turn_per_kind() {
        let mut wasp = WaspSystemStatus::new(10, 1);
        assert!(wasp.try_consume_ammo(AttackKind::Air));
        assert_eq!(wasp.defensive_ammo, 0);
        // Same kind again this turn: already paid for, still "fires".
        assert!(wasp.try_consume_ammo(AttackKind::Air));
        // Different kind this turn: no ammo left.
        assert!(!wasp.try_consume_ammo(AttackKind::Sea));

        wasp.reset_turn_ammo_tracking();
        assert!(!wasp.try_consume_ammo(AttackKind::Sea));
    }

    #[test]
    fn command_points_follow_c2_status() {
        let mut player = Player::new(1, Side::Assault);
        player.wasp_system_status = Some(WaspSystemStatus::new(10, 4));
        assert_eq!(player.command_points_for_turn(), 3);

        player.wasp_system_status.as_mut().unwrap().take_damage(4);
        assert_eq!(player.command_points_for_turn(), 2);

        let defender = Player::new(2, Side::Defender);
        assert_eq!(defender.command_points_for_turn(), 2);
    }
}

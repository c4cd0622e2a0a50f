//! Action types, results, the event log, and the undo system.
//!
//! Directly grounded on the ambient-stack reference engine's `action.rs`.

use serde::{Deserialize, Serialize};

use crate::hex::Hex;
use crate::phase::Phase;
use crate::player::PlayerId;
use crate::unit::{SpecialAbility, UnitId};

/// All possible player/AI actions. Every interaction with the engine beyond
/// read-only queries is an `Action`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Action {
    Move {
        unit_id: UnitId,
        destination: Hex,
    },
    Attack {
        attacker_id: UnitId,
        defender_id: UnitId,
    },
    Load {
        carrier_id: UnitId,
        cargo_id: UnitId,
    },
    Unload {
        carrier_id: UnitId,
        cargo_id: UnitId,
        destination: Hex,
    },
    SpecialAbilityAction {
        unit_id: UnitId,
        ability: SpecialAbility,
        target_hex: Option<Hex>,
        target_unit: Option<UnitId>,
    },
    Reveal {
        unit_id: UnitId,
    },
    Hide {
        unit_id: UnitId,
    },
    LaunchFromWasp {
        wasp_id: UnitId,
        aircraft_id: UnitId,
        destination: Hex,
    },
    RecoverToWasp {
        wasp_id: UnitId,
        aircraft_id: UnitId,
    },
    SecureObjective {
        unit_id: UnitId,
    },
    EndPhase,
}

impl Action {
    /// The acting unit, if this action names exactly one (used for
    /// dispatch-table logic shared by several validation rules).
    pub fn acting_unit(&self) -> Option<UnitId> {
        match self {
            Action::Move { unit_id, .. }
            | Action::SpecialAbilityAction { unit_id, .. }
            | Action::Reveal { unit_id }
            | Action::Hide { unit_id }
            | Action::SecureObjective { unit_id } => Some(*unit_id),
            Action::Attack { attacker_id, .. } => Some(*attacker_id),
            Action::Load { carrier_id, .. } => Some(*carrier_id),
            Action::Unload { carrier_id, .. } => Some(*carrier_id),
            Action::LaunchFromWasp { aircraft_id, .. } => Some(*aircraft_id),
            Action::RecoverToWasp { aircraft_id, .. } => Some(*aircraft_id),
            Action::EndPhase => None,
        }
    }

    /// Human-readable action kind name, stable for logs independent of enum
    /// discriminant order.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::Move { .. } => "Move",
            Action::Attack { .. } => "Attack",
            Action::Load { .. } => "Load",
            Action::Unload { .. } => "Unload",
            Action::SpecialAbilityAction { .. } => "SpecialAbility",
            Action::Reveal { .. } => "Reveal",
            Action::Hide { .. } => "Hide",
            Action::LaunchFromWasp { .. } => "LaunchFromWasp",
            Action::RecoverToWasp { .. } => "RecoverToWasp",
            Action::SecureObjective { .. } => "SecureObjective",
            Action::EndPhase => "EndPhase",
        }
    }
}

/// Outcome of a resolved attack, returned inline in the action log record
/// and consumed by the AI controller for learning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub dice_rolled: Vec<u32>,
    pub modifiers_applied: Vec<String>,
    pub hits: u32,
    pub damage: u32,
    pub suppression_delta: u8,
    pub destroyed: bool,
}

/// Narrative events for the event log and any UI/analytics consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: Phase, to: Phase },
    TurnChanged { turn: u32 },
    UnitDestroyed { unit_id: UnitId },
    ObjectiveCaptured { objective_id: crate::player::ObjectiveId, by: PlayerId },
    WaspSystemDegraded { system: String },
    VictoryAchieved { winner: PlayerId },
    GameOverByTurnLimit,
}

/// The result of successfully applying an action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionResult {
    pub applied: AppliedAction,
    pub events: Vec<GameEvent>,
    pub combat_outcome: Option<CombatOutcome>,
}

/// A record of an applied action, retained in `GameState::action_log` for
/// undo and replay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppliedAction {
    pub action: Action,
    pub inverse: InverseAction,
}

/// How to reverse an applied action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum InverseAction {
    Simple(Box<Action>),
    /// Combat and anything touching RNG state cannot be undone — the dice
    /// trace is consumed.
    Irreversible,
}

/// A legal action with a human-readable description, returned by
/// `Engine::legal_actions` for hosts/tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegalAction {
    pub action: Action,
    pub description: String,
}

/// The persisted/exported action log record format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionLogRecord {
    pub turn: u32,
    pub phase: Phase,
    pub acting_player: PlayerId,
    pub action_kind: &'static str,
    pub acting_unit: Option<UnitId>,
    pub target_hex: Option<Hex>,
    pub target_unit: Option<UnitId>,
    pub rolls: Option<Vec<u32>>,
    pub hits: Option<u32>,
    pub damage: Option<u32>,
    pub suppression_delta: Option<u8>,
    pub destroyed: Option<bool>,
    pub ability_name: Option<&'static str>,
    pub cp_before: u32,
    pub cp_after: u32,
    pub message: String,
}

//! Closed action-error enum. The engine never panics on player/AI input —
//! see DESIGN.md for the propagation policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("action not legal in the current phase")]
    InvalidPhase,

    #[error("unit {0} not found")]
    UnitNotFound(u32),

    #[error("unit {0} is not alive")]
    UnitNotAlive(u32),

    #[error("unit {0} is not owned by the acting player")]
    UnitNotOwned(u32),

    #[error("unit {0} has already moved this turn")]
    UnitAlreadyMoved(u32),

    #[error("unit {0} has already acted this turn")]
    UnitAlreadyActed(u32),

    #[error("unit {0} is suppressed or pinned and cannot act")]
    UnitSuppressedPinned(u32),

    #[error("target is out of range")]
    OutOfRange,

    #[error("no line of sight to target")]
    NoLineOfSight,

    #[error("terrain is invalid for this unit")]
    InvalidTerrain,

    #[error("no valid path to destination")]
    NoValidPath,

    #[error("cargo capacity exceeded")]
    CapacityExceeded,

    #[error("target is friendly")]
    TargetFriendly,

    #[error("target is already destroyed")]
    TargetDestroyed,

    #[error("target is not adjacent")]
    NotAdjacent,

    #[error("unit does not have the requested ability")]
    UnitDoesNotHaveAbility,

    #[error("unknown ability name: {0}")]
    UnknownAbility(String),

    #[error("this unit type cannot perform this action")]
    UnitTypeCannotPerformAction,

    #[error("insufficient command points: need {needed}, have {available}")]
    InsufficientCommandPoints { needed: u32, available: u32 },

    #[error("insufficient supply points")]
    InsufficientSupply,

    #[error("no embarked aircraft to launch")]
    NoEmbarkedAircraft,

    #[error("USS Wasp subsystem is unavailable")]
    WaspSystemUnavailable,

    #[error("target hex is out of map bounds")]
    OutOfMapBounds,

    #[error("the game is over")]
    GameOver,

    // -- Ambient-stack supplementary variants: setup/serialization
    // boundaries, not part of the §4.5 validation chain itself. --
    #[error("scenario setup error: {0}")]
    SetupError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("internal engine error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Whether this failure belongs to the AI controller's "fundamental"
    /// set: a failure here means this (unit, action type) pair can never
    /// succeed, as opposed to a transient failure (out of range, already
    /// acted) that may succeed later.
    pub fn is_fundamental(&self) -> bool {
        matches!(
            self,
            ActionError::UnitDoesNotHaveAbility
                | ActionError::UnitTypeCannotPerformAction
                | ActionError::NoEmbarkedAircraft
                | ActionError::UnknownAbility(_)
                | ActionError::UnitNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamental_vs_transient_classification() {
        assert!(ActionError::UnitDoesNotHaveAbility.is_fundamental());
        assert!(ActionError::UnitTypeCannotPerformAction.is_fundamental());
        assert!(!ActionError::OutOfRange.is_fundamental());
        assert!(!ActionError::InsufficientCommandPoints {
            needed: 1,
            available: 0
        }
        .is_fundamental());
    }

    #[test]
    fn messages_are_stable_independent_of_kind() {
        let err = ActionError::UnitNotFound(7);
        assert_eq!(err.to_string(), "unit 7 not found");
    }
}

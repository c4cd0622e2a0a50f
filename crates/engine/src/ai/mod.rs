//! The AI opponent: a strategic state machine, a utility-based decision
//! maker, and a controller that adapts decisions into validated engine
//! actions.

pub mod controller;
pub mod decision;
pub mod state_machine;

pub use controller::AiController;
pub use decision::AiPersonality;
pub use state_machine::AiState;

//! Core intake dialogue state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, ReplyMarkup};
pub use event::{Command, Event};
pub use state::{IntakeContext, SessionState};
pub use transition::transition;
#[allow(unused_imports)] // Public API re-exports
pub use transition::{TransitionError, TransitionResult};

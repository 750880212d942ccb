//! `gk-behavior`: what agents decide each tick.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`decision`] | `Decision`, `Feedback`, `Preparation`                     |
//! | [`context`]  | `DecisionContext<'a>`: read-only view of the world        |
//! | [`model`]    | `DecisionModel` trait                                     |
//! | [`demand`]   | `DemandModel`: the default stochastic model               |
//! | [`scripted`] | `ScriptedModel`: replays a fixed order script             |
//! | [`error`]    | `BehaviorError`, `BehaviorResult<T>`                      |
//!
//! Models never touch world state.  They read a [`DecisionContext`], draw
//! from the [`AgentRng`](gk_core::AgentRng) stream they are handed, and
//! return decisions the lifecycle machine stages into the tick.

pub mod context;
pub mod decision;
pub mod demand;
pub mod error;
pub mod model;
pub mod scripted;

#[cfg(test)]
mod tests;

pub use context::DecisionContext;
pub use decision::{Decision, Feedback, Preparation};
pub use demand::DemandModel;
pub use error::{BehaviorError, BehaviorResult};
pub use model::DecisionModel;
pub use scripted::ScriptedModel;

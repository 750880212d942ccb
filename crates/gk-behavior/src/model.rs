//! The `DecisionModel` trait: the engine's extension point for behavior.

use gk_core::{AgentRng, SiteId};
use gk_setup::Instruction;
use gk_world::{Customer, KitchenStaff, Order};

use crate::{Decision, DecisionContext, Feedback, Preparation};

/// Pluggable agent behavior.
///
/// Each method receives the stream it must draw from; the caller picks the
/// stream by `(owner, purpose)` so a model's output depends only on the seed
/// and the inputs, never on evaluation order.
///
/// Implementations must be `Send + Sync`: the clock may ask for decisions of
/// different agents from several threads.
pub trait DecisionModel: Send + Sync + 'static {
    /// Customers arriving at `site` this tick.  Returns only `Browse` and
    /// `PlaceOrder` decisions.
    fn arrivals(&self, site: SiteId, ctx: &DecisionContext<'_>, rng: &mut AgentRng) -> Vec<Decision>;

    /// Give a waiting customer the chance to cancel.  Only called while the
    /// order is still before dispatch.
    fn reconsider(
        &self,
        _customer: &Customer,
        _order:    &Order,
        _ctx:      &DecisionContext<'_>,
        _rng:      &mut AgentRng,
    ) -> Option<Decision> {
        None
    }

    /// Whether a driver can be found for a ready order this tick.
    fn driver_available(&self, _order: &Order, _ctx: &DecisionContext<'_>, _rng: &mut AgentRng) -> bool {
        true
    }

    /// Rating left after delivery, if any.
    fn feedback(
        &self,
        _order:    &Order,
        _customer: &Customer,
        _ctx:      &DecisionContext<'_>,
        _rng:      &mut AgentRng,
    ) -> Option<Feedback> {
        None
    }

    /// Ticks the kitchen's staff takes for one step.  Never below 1.
    fn preparation_ticks(
        &self,
        instruction: &Instruction,
        _staff:      &KitchenStaff,
        _rng:        &mut AgentRng,
    ) -> Preparation {
        Preparation { ticks: instruction.expected_duration.max(1), rework: false }
    }
}

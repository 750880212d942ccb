use std::collections::BTreeMap;

use gk_core::{AgentRng, SiteId, Tick};

use crate::{Decision, DecisionContext, DecisionModel};

/// Replays a fixed list of arrivals.  Drivers are always available, nobody
/// cancels or leaves feedback, and steps take exactly their expected time.
///
/// Used to drive scenario runs whose outcome must not depend on sampling.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    script: BTreeMap<(Tick, SiteId), Vec<Decision>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `decision` to arrive at `site` on `tick`.  Several arrivals at the
    /// same place and time keep their insertion order.
    pub fn at(mut self, tick: Tick, site: SiteId, decision: Decision) -> Self {
        self.script.entry((tick, site)).or_default().push(decision);
        self
    }

    pub fn len(&self) -> usize {
        self.script.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl DecisionModel for ScriptedModel {
    fn arrivals(&self, site: SiteId, ctx: &DecisionContext<'_>, _rng: &mut AgentRng) -> Vec<Decision> {
        self.script
            .get(&(ctx.tick, site))
            .map(|d| d.iter().copied().filter(Decision::is_arrival).collect())
            .unwrap_or_default()
    }
}

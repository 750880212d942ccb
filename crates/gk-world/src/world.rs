//! The committed simulation state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, error};

use gk_core::{AgentId, KitchenId, OrderId, Tick};
use gk_kitchen::StationBoard;
use gk_setup::SimulationSetup;

use crate::{
    Agent, AgentStore, DriverStatus, EventLog, KitchenStaff, Metrics, Order, OrderState, TickTxn, WorldError,
    WorldResult,
};

/// Everything that changes over a run.  Between ticks the world is always
/// fully consistent; it only changes through [`commit`](Self::commit).
#[derive(Debug, Clone)]
pub struct World {
    setup:           Arc<SimulationSetup>,
    /// Tick the next transaction will run at.
    now:             Tick,
    /// Non-terminal orders.
    orders:          BTreeMap<OrderId, Order>,
    /// Closed or cancelled orders, kept for the final report.
    archive:         BTreeMap<OrderId, Order>,
    /// `(tick, id)` in archive order, so ticks never decrease.
    archive_log:     Vec<(Tick, OrderId)>,
    agents:          AgentStore,
    board:           StationBoard,
    closed_kitchens: BTreeSet<KitchenId>,
    events:          EventLog,
    metrics:         Metrics,
    next_order:      OrderId,
}

impl World {
    /// A fresh world at tick 0 with one staff agent per kitchen.
    pub fn new(setup: Arc<SimulationSetup>) -> Self {
        let mut agents = AgentStore::default();
        for kitchen in &setup.kitchens {
            let id = agents.next_id();
            agents.push(Agent::KitchenStaff(KitchenStaff {
                id,
                kitchen: kitchen.id,
                position: setup.kitchen_location(kitchen.id),
                error_rate: setup.params.kitchen_error_rate,
                staffing_level: setup.params.staffing_level,
                steps_done: 0,
                reworks: 0,
            }));
        }
        let board = StationBoard::new(&setup);
        Self {
            setup,
            now: Tick::ZERO,
            orders: BTreeMap::new(),
            archive: BTreeMap::new(),
            archive_log: Vec::new(),
            agents,
            board,
            closed_kitchens: BTreeSet::new(),
            events: EventLog::default(),
            metrics: Metrics::default(),
            next_order: OrderId(0),
        }
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn setup(&self) -> &SimulationSetup {
        &self.setup
    }

    pub fn shared_setup(&self) -> Arc<SimulationSetup> {
        Arc::clone(&self.setup)
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn next_order_id(&self) -> OrderId {
        self.next_order
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn board(&self) -> &StationBoard {
        &self.board
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn is_kitchen_closed(&self, kitchen: KitchenId) -> bool {
        self.closed_kitchens.contains(&kitchen)
    }

    pub fn closed_kitchens(&self) -> impl Iterator<Item = KitchenId> + '_ {
        self.closed_kitchens.iter().copied()
    }

    pub fn active_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Any order, active or archived.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id).or_else(|| self.archive.get(&id))
    }

    /// Non-terminal orders in id order.
    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn archived_orders(&self) -> impl Iterator<Item = &Order> {
        self.archive.values()
    }

    /// Orders archived after `since`, or every archived order for `None`,
    /// in archive order.
    pub fn archived_since(&self, since: Option<Tick>) -> impl Iterator<Item = &Order> {
        let start = match since {
            Some(prev) => self.archive_log.partition_point(|&(t, _)| t <= prev),
            None => 0,
        };
        self.archive_log[start..].iter().filter_map(|(_, id)| self.archive.get(id))
    }

    /// All orders ever placed, in id order.
    pub fn all_orders(&self) -> Vec<&Order> {
        let mut all: Vec<&Order> = self.orders.values().chain(self.archive.values()).collect();
        all.sort_by_key(|o| o.id);
        all
    }

    pub fn active_order_count(&self) -> usize {
        self.orders.len()
    }

    /// Idle drivers in id order.
    pub fn idle_drivers(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().filter_map(|a| match a {
            Agent::Driver(d) if d.status == DriverStatus::Idle => Some(d.id),
            _ => None,
        })
    }

    // ── Commit ────────────────────────────────────────────────────────────

    /// Apply one tick's transaction.  Every check runs before anything is
    /// written, so a rejected transaction leaves the world untouched.
    ///
    /// Returns the ids of orders archived by this commit.
    pub fn commit(&mut self, txn: TickTxn) -> WorldResult<Vec<OrderId>> {
        self.validate(&txn)?;

        let TickTxn {
            tick,
            new_agents,
            agents,
            new_orders,
            orders,
            board,
            closures,
            events,
            metrics,
            ..
        } = txn;

        for agent in new_agents {
            self.agents.push(agent);
        }
        for (id, agent) in agents {
            if let Some(slot) = self.agents.get_mut(id) {
                *slot = agent;
            }
        }

        self.next_order = OrderId(self.next_order.0 + new_orders.len() as u64);
        let mut archived = Vec::new();
        for order in orders.into_values().chain(new_orders) {
            let id = order.id;
            if order.state.is_terminal() {
                self.orders.remove(&id);
                self.archive.insert(id, order);
                self.archive_log.push((tick, id));
                archived.push(id);
            } else {
                self.orders.insert(id, order);
            }
        }

        if let Some(board) = board {
            self.board = board;
        }
        self.closed_kitchens.extend(closures);
        self.events.extend(events);
        self.metrics += metrics;

        let retired = self.agents.retire_finished(tick);

        let next = tick.next();
        for agent in self.agents.iter_mut() {
            agent.tick(next);
        }
        self.now = next;

        if !archived.is_empty() || retired > 0 {
            debug!(
                tick = %tick,
                archived = archived.len(),
                active = self.orders.len(),
                retired,
                live_agents = self.agents.live_len(),
                "orders archived"
            );
        }
        Ok(archived)
    }

    fn validate(&self, txn: &TickTxn) -> WorldResult<()> {
        if txn.tick != self.now {
            return Err(WorldError::StaleTxn { expected: self.now, got: txn.tick });
        }

        for (i, order) in txn.new_orders.iter().enumerate() {
            let expected = self.next_order.0 + i as u64;
            if order.id.0 != expected {
                return Err(WorldError::IdGap { expected, got: order.id.0 });
            }
            check_order(OrderState::Placed, 0, order)?;
        }
        for (i, agent) in txn.new_agents.iter().enumerate() {
            let expected = self.agents.len() as u64 + i as u64;
            if agent.id().0 as u64 != expected {
                return Err(WorldError::IdGap { expected, got: agent.id().0 as u64 });
            }
        }

        for (id, order) in &txn.orders {
            let Some(before) = self.orders.get(id) else {
                return Err(WorldError::UnknownOrder(*id));
            };
            check_order(before.state, before.step, order)?;
        }
        for id in txn.agents.keys() {
            if !self.agents.is_live(*id) {
                return Err(WorldError::UnknownAgent(*id));
            }
        }

        if let Some(board) = &txn.board {
            board.check_invariants().inspect_err(|e| {
                error!(tick = %txn.tick, error = %e, "staged board rejected");
            })?;
        }
        Ok(())
    }
}

/// Lifecycle and recipe-step invariants for one order across a tick.
fn check_order(from: OrderState, from_step: usize, order: &Order) -> WorldResult<()> {
    if !from.can_reach(order.state) {
        return Err(WorldError::IllegalTransition {
            order: order.id,
            from:  from.name(),
            to:    order.state.name(),
        });
    }
    if order.step < from_step {
        return Err(WorldError::StepRegression { order: order.id, from: from_step, to: order.step });
    }
    if order.step > from_step + 1 {
        return Err(WorldError::StepSkipped { order: order.id, from: from_step, to: order.step });
    }
    if let OrderState::InPreparation(i) = order.state {
        if i != order.step {
            return Err(WorldError::StepSkipped { order: order.id, from: order.step, to: i });
        }
    }
    for step in 1..order.steps.len() {
        let Some(started) = order.steps[step].started else {
            continue;
        };
        let prev_done = order.steps[step - 1].completed;
        if prev_done.is_none_or(|done| done > started) {
            return Err(WorldError::StepOverlap { order: order.id, step, prev: step - 1 });
        }
    }
    Ok(())
}

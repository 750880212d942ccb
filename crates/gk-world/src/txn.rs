//! One tick's staged changes.
//!
//! Reads go through the transaction first and fall back to the committed
//! `World`; writes copy the entity into the transaction on first touch.
//! Nothing reaches the world until `World::commit`.

use std::collections::BTreeMap;

use gk_core::{AgentId, KitchenId, OrderId, Tick};
use gk_kitchen::StationBoard;

use crate::{Agent, Event, EventPayload, EventSubject, Metrics, Order, World};

#[derive(Debug)]
pub struct TickTxn {
    pub tick:              Tick,
    first_order:           u64,
    first_agent:           u32,
    pub(crate) new_agents: Vec<Agent>,
    pub(crate) agents:     BTreeMap<AgentId, Agent>,
    pub(crate) new_orders: Vec<Order>,
    pub(crate) orders:     BTreeMap<OrderId, Order>,
    pub(crate) board:      Option<StationBoard>,
    pub(crate) closures:   Vec<KitchenId>,
    pub(crate) events:     Vec<Event>,
    pub metrics:           Metrics,
}

impl TickTxn {
    pub fn begin(world: &World) -> Self {
        Self {
            tick:        world.now(),
            first_order: world.next_order_id().0,
            first_agent: world.agents().next_id().0,
            new_agents:  Vec::new(),
            agents:      BTreeMap::new(),
            new_orders:  Vec::new(),
            orders:      BTreeMap::new(),
            board:       None,
            closures:    Vec::new(),
            events:      Vec::new(),
            metrics:     Metrics::default(),
        }
    }

    // ── Agents ───────────────────────────────────────────────────────────

    /// Add an agent built around its freshly assigned id.
    pub fn spawn_agent(&mut self, build: impl FnOnce(AgentId) -> Agent) -> AgentId {
        let id = AgentId(self.first_agent + self.new_agents.len() as u32);
        self.new_agents.push(build(id));
        id
    }

    pub fn agent<'a>(&'a self, world: &'a World, id: AgentId) -> Option<&'a Agent> {
        if let Some(a) = self.new_agent_slot(id) {
            return self.new_agents.get(a);
        }
        self.agents.get(&id).or_else(|| world.agents().get(id))
    }

    pub fn agent_mut(&mut self, world: &World, id: AgentId) -> Option<&mut Agent> {
        if let Some(a) = self.new_agent_slot(id) {
            return self.new_agents.get_mut(a);
        }
        if !self.agents.contains_key(&id) {
            if !world.agents().is_live(id) {
                return None;
            }
            let current = world.agents().get(id)?.clone();
            self.agents.insert(id, current);
        }
        self.agents.get_mut(&id)
    }

    /// Agents added this tick.
    pub fn new_agents(&self) -> &[Agent] {
        &self.new_agents
    }

    fn new_agent_slot(&self, id: AgentId) -> Option<usize> {
        id.0.checked_sub(self.first_agent).map(|i| i as usize).filter(|&i| i < self.new_agents.len())
    }

    // ── Orders ───────────────────────────────────────────────────────────

    pub fn place_order(&mut self, build: impl FnOnce(OrderId) -> Order) -> OrderId {
        let id = OrderId(self.first_order + self.new_orders.len() as u64);
        self.new_orders.push(build(id));
        id
    }

    pub fn order<'a>(&'a self, world: &'a World, id: OrderId) -> Option<&'a Order> {
        if let Some(i) = self.new_order_slot(id) {
            return self.new_orders.get(i);
        }
        self.orders.get(&id).or_else(|| world.active_order(id))
    }

    /// Copy-on-write access to an active order.
    pub fn order_mut(&mut self, world: &World, id: OrderId) -> Option<&mut Order> {
        if let Some(i) = self.new_order_slot(id) {
            return self.new_orders.get_mut(i);
        }
        if !self.orders.contains_key(&id) {
            let current = world.active_order(id)?.clone();
            self.orders.insert(id, current);
        }
        self.orders.get_mut(&id)
    }

    pub fn new_orders(&self) -> &[Order] {
        &self.new_orders
    }

    /// Ids of every order touched this tick, ascending.
    pub fn touched_orders(&self) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = self.orders.keys().copied().collect();
        ids.extend(self.new_orders.iter().map(|o| o.id));
        ids
    }

    fn new_order_slot(&self, id: OrderId) -> Option<usize> {
        id.0.checked_sub(self.first_order).map(|i| i as usize).filter(|&i| i < self.new_orders.len())
    }

    // ── Everything else ──────────────────────────────────────────────────

    /// Stage the board produced by this tick's scheduling pass.
    pub fn stage_board(&mut self, board: StationBoard) {
        self.board = Some(board);
    }

    pub fn staged_board(&self) -> Option<&StationBoard> {
        self.board.as_ref()
    }

    pub fn close_kitchen(&mut self, kitchen: KitchenId) {
        if !self.closures.contains(&kitchen) {
            self.closures.push(kitchen);
            self.emit(EventSubject::Kitchen(kitchen), EventPayload::KitchenClosed);
        }
    }

    pub fn closures(&self) -> &[KitchenId] {
        &self.closures
    }

    pub fn emit(&mut self, subject: EventSubject, payload: EventPayload) {
        self.events.push(Event::new(self.tick, subject, payload));
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

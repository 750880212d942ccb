//! Simulation participants.
//!
//! Roles are variants of one [`Agent`] sum type sharing the capability set
//! `{tick, position, status}`; there is no trait object hierarchy.  Agents
//! live in an [`AgentStore`] and refer to everything else by id.

use std::collections::BTreeMap;

use gk_core::{AgentId, GeoPoint, KitchenId, OrderId, SiteId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Customer,
    Driver,
    KitchenStaff,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Customer => "customer",
            AgentRole::Driver => "driver",
            AgentRole::KitchenStaff => "kitchen_staff",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id:                AgentId,
    pub site:              SiteId,
    pub position:          GeoPoint,
    /// Shifts feedback ratings; drawn once at arrival from [-1, 1].
    pub satisfaction_bias: f64,
    pub arrived:           Tick,
    pub order:             Option<OrderId>,
    /// Order reached a terminal state.
    pub done:              bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverStatus {
    Idle,
    Delivering {
        order:    OrderId,
        from:     GeoPoint,
        to:       GeoPoint,
        departed: Tick,
        arrival:  Tick,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub id:         AgentId,
    pub site:       SiteId,
    pub home:       GeoPoint,
    pub position:   GeoPoint,
    pub status:     DriverStatus,
    pub deliveries: u32,
}

impl Driver {
    /// Fraction of the current trip covered at `now`, in [0, 1].
    pub fn progress(&self, now: Tick) -> f64 {
        match self.status {
            DriverStatus::Idle => 0.0,
            DriverStatus::Delivering { departed, arrival, .. } => now.progress_between(departed, arrival),
        }
    }
}

/// One per kitchen.  Carries the staffing parameters that perturb step
/// durations.
#[derive(Debug, Clone, PartialEq)]
pub struct KitchenStaff {
    pub id:             AgentId,
    pub kitchen:        KitchenId,
    pub position:       GeoPoint,
    pub error_rate:     f64,
    pub staffing_level: f64,
    pub steps_done:     u64,
    pub reworks:        u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Agent {
    Customer(Customer),
    Driver(Driver),
    KitchenStaff(KitchenStaff),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Agent::Customer(c) => c.id,
            Agent::Driver(d) => d.id,
            Agent::KitchenStaff(s) => s.id,
        }
    }

    pub fn role(&self) -> AgentRole {
        match self {
            Agent::Customer(_) => AgentRole::Customer,
            Agent::Driver(_) => AgentRole::Driver,
            Agent::KitchenStaff(_) => AgentRole::KitchenStaff,
        }
    }

    pub fn position(&self) -> GeoPoint {
        match self {
            Agent::Customer(c) => c.position,
            Agent::Driver(d) => d.position,
            Agent::KitchenStaff(s) => s.position,
        }
    }

    /// Short status label for snapshots.
    pub fn status(&self) -> &'static str {
        match self {
            Agent::Customer(c) if c.done => "done",
            Agent::Customer(c) if c.order.is_some() => "waiting",
            Agent::Customer(_) => "browsing",
            Agent::Driver(d) => match d.status {
                DriverStatus::Idle => "idle",
                DriverStatus::Delivering { .. } => "delivering",
            },
            Agent::KitchenStaff(_) => "on_shift",
        }
    }

    /// Advance per-tick state.  Drivers move along the straight line to
    /// their drop-off; other roles are stationary.
    pub fn tick(&mut self, now: Tick) {
        if let Agent::Driver(d) = self {
            if let DriverStatus::Delivering { from, to, .. } = d.status {
                d.position = from.lerp(to, d.progress(now));
            }
        }
    }

    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            Agent::Customer(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_driver(&self) -> Option<&Driver> {
        match self {
            Agent::Driver(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_staff(&self) -> Option<&KitchenStaff> {
        match self {
            Agent::KitchenStaff(s) => Some(s),
            _ => None,
        }
    }
}

/// Agents by id, split into live and retired.
///
/// Ids are handed out in spawn order and never reused.  A customer whose
/// order reached a terminal state (or who only browsed) is retired at the
/// end of the tick: it stays readable through [`get`](Self::get) but is no
/// longer ticked or iterated.  Drivers and staff are never retired.
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    live:        BTreeMap<AgentId, Agent>,
    retired:     BTreeMap<AgentId, Agent>,
    /// `(tick, id)` in retirement order, so ticks never decrease.
    retired_log: Vec<(Tick, AgentId)>,
    next:        u32,
}

impl AgentStore {
    /// Agents ever spawned, live or retired.
    pub fn len(&self) -> usize {
        self.next as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    pub fn next_id(&self) -> AgentId {
        AgentId(self.next)
    }

    /// Any agent, live or retired.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.live.get(&id).or_else(|| self.retired.get(&id))
    }

    pub fn is_live(&self, id: AgentId) -> bool {
        self.live.contains_key(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.live.get_mut(&id)
    }

    pub(crate) fn push(&mut self, agent: Agent) -> AgentId {
        let id = self.next_id();
        self.live.insert(id, agent);
        self.next += 1;
        id
    }

    /// Live agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.live.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.live.values_mut()
    }

    /// Agents retired after `since`, or all retired agents for `None`, in
    /// retirement order.
    pub fn retired_since(&self, since: Option<Tick>) -> impl Iterator<Item = &Agent> {
        let start = match since {
            Some(prev) => self.retired_log.partition_point(|&(t, _)| t <= prev),
            None => 0,
        };
        self.retired_log[start..].iter().filter_map(|(_, id)| self.retired.get(id))
    }

    /// Move every finished customer out of the live set.  Returns how many
    /// were retired.
    pub(crate) fn retire_finished(&mut self, tick: Tick) -> usize {
        let done: Vec<AgentId> = self
            .live
            .values()
            .filter_map(|a| match a {
                Agent::Customer(c) if c.done => Some(c.id),
                _ => None,
            })
            .collect();
        for id in &done {
            if let Some(agent) = self.live.remove(id) {
                self.retired.insert(*id, agent);
                self.retired_log.push((tick, *id));
            }
        }
        done.len()
    }

    pub fn customer(&self, id: AgentId) -> Option<&Customer> {
        self.get(id).and_then(Agent::as_customer)
    }

    pub fn driver(&self, id: AgentId) -> Option<&Driver> {
        self.get(id).and_then(Agent::as_driver)
    }

    /// The staff agent of a kitchen.  Staff occupy ids `0..kitchens`.
    pub fn staff(&self, kitchen: KitchenId) -> Option<&KitchenStaff> {
        self.get(AgentId(kitchen.0)).and_then(Agent::as_staff)
    }

    /// Live agents with `role`.
    pub fn count(&self, role: AgentRole) -> usize {
        self.live.values().filter(|a| a.role() == role).count()
    }
}

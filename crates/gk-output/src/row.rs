//! Flat rows for the five output tables.
//!
//! Entity references are written as the catalog's string keys rather than
//! arena indices so a table can be read without the setup directory.

use gk_core::Tick;
use gk_kitchen::{StationState, StationView};
use gk_setup::SimulationSetup;
use gk_sim::TickSummary;
use gk_world::{Agent, DriverStatus, Event, Order, OrderState};

/// One order as of a snapshot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub snapshot_tick: u64,
    pub order_id:      u64,
    pub customer_id:   u32,
    pub brand:         String,
    pub item:          String,
    /// `None` until a kitchen is assigned.
    pub kitchen:       Option<String>,
    pub state:         &'static str,
    pub cancel_reason: Option<&'static str>,
    pub step:          u32,
    pub steps_total:   u32,
    pub created:       u64,
    pub ready_at:      Option<u64>,
    pub dispatched_at: Option<u64>,
    pub delivered_at:  Option<u64>,
    pub closed_at:     Option<u64>,
    pub driver_id:     Option<u32>,
    pub eta_ticks:     Option<u64>,
    pub distance_m:    Option<f64>,
    pub rating:        Option<u8>,
    pub lat:           f64,
    pub lon:           f64,
}

impl OrderRow {
    pub fn new(tick: Tick, order: &Order, setup: &SimulationSetup) -> Self {
        let cancel_reason = match order.state {
            OrderState::Cancelled(r) => Some(r.as_str()),
            _ => None,
        };
        Self {
            snapshot_tick: tick.0,
            order_id: order.id.0,
            customer_id: order.customer.0,
            brand: setup.brand(order.brand).key.clone(),
            item: setup.menu_item(order.item).key.clone(),
            kitchen: (!order.kitchen.is_none()).then(|| setup.kitchen(order.kitchen).key.clone()),
            state: order.state.name(),
            cancel_reason,
            step: order.step as u32,
            steps_total: order.steps.len() as u32,
            created: order.created.0,
            ready_at: order.ready_at.map(|t| t.0),
            dispatched_at: order.dispatched_at.map(|t| t.0),
            delivered_at: order.delivered_at.map(|t| t.0),
            closed_at: order.closed_at.map(|t| t.0),
            driver_id: (!order.driver.is_none()).then_some(order.driver.0),
            eta_ticks: order.eta_ticks,
            distance_m: order.distance_m,
            rating: order.rating,
            lat: order.destination.lat,
            lon: order.destination.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub snapshot_tick: u64,
    pub station:       String,
    pub kitchen:       String,
    pub station_type:  String,
    pub capacity:      u32,
    pub occupied:      u32,
    /// `idle` or `busy`.
    pub state:         &'static str,
    /// Occupying order ids, `;`-separated in grant order.
    pub occupants:     String,
}

impl StationRow {
    pub fn new(tick: Tick, view: &StationView, setup: &SimulationSetup) -> Self {
        let (state, occupied) = match view.state {
            StationState::Idle => ("idle", 0),
            StationState::Busy(n) => ("busy", n),
        };
        let occupants = view
            .occupants
            .iter()
            .map(|o| o.0.to_string())
            .collect::<Vec<_>>()
            .join(";");
        Self {
            snapshot_tick: tick.0,
            station: setup.station(view.station).key.clone(),
            kitchen: setup.kitchen(view.kitchen).key.clone(),
            station_type: setup.station_type_name(view.station_type).to_owned(),
            capacity: view.capacity,
            occupied,
            state,
            occupants,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRow {
    pub snapshot_tick: u64,
    pub agent_id:      u32,
    pub role:          &'static str,
    pub status:        &'static str,
    pub lat:           f64,
    pub lon:           f64,
    /// The customer's order, or the order a driver is carrying.
    pub order_id:      Option<u64>,
}

impl AgentRow {
    pub fn new(tick: Tick, agent: &Agent) -> Self {
        let order_id = match agent {
            Agent::Customer(c) => c.order.map(|o| o.0),
            Agent::Driver(d) => match d.status {
                DriverStatus::Delivering { order, .. } => Some(order.0),
                DriverStatus::Idle => None,
            },
            Agent::KitchenStaff(_) => None,
        };
        let p = agent.position();
        Self {
            snapshot_tick: tick.0,
            agent_id: agent.id().0,
            role: agent.role().as_str(),
            status: agent.status(),
            lat: p.lat,
            lon: p.lon,
            order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub tick:         u64,
    pub subject_kind: &'static str,
    pub subject_id:   u64,
    pub kind:         &'static str,
    /// Payload as a JSON object.
    pub payload:      String,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        Self {
            tick: e.tick.0,
            subject_kind: e.subject.kind(),
            subject_id: e.subject.raw_id(),
            kind: e.payload.kind(),
            payload: e.payload_json(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:            u64,
    pub unix_time_secs:  i64,
    pub arrivals:        u64,
    pub orders_placed:   u64,
    pub cancelled:       u64,
    pub steps_started:   u64,
    pub steps_completed: u64,
    pub dispatched:      u64,
    pub delivered:       u64,
    pub closed:          u64,
    pub warnings:        u64,
    pub events:          u64,
    pub active_orders:   u64,
    pub queued_requests: u64,
    pub running_steps:   u64,
    pub busy_slots:      u32,
    pub total_slots:     u32,
    pub utilization:     f64,
}

impl TickSummaryRow {
    pub fn new(summary: &TickSummary, unix_time_secs: i64) -> Self {
        Self {
            tick: summary.tick.0,
            unix_time_secs,
            arrivals: summary.arrivals,
            orders_placed: summary.orders_placed,
            cancelled: summary.cancelled,
            steps_started: summary.steps_started,
            steps_completed: summary.steps_completed,
            dispatched: summary.dispatched,
            delivered: summary.delivered,
            closed: summary.closed,
            warnings: summary.warnings,
            events: summary.events as u64,
            active_orders: summary.active_orders as u64,
            queued_requests: summary.queued_requests as u64,
            running_steps: summary.running_steps as u64,
            busy_slots: summary.busy_slots,
            total_slots: summary.total_slots,
            utilization: summary.utilization(),
        }
    }
}

//! Append-only event log.

use serde::Serialize;

use gk_core::{
    AgentId, BrandId, KitchenId, MenuItemId, OrderId, SiteId, StationId, StationTypeId, Tick,
};

use crate::CancelReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventSubject {
    Order(OrderId),
    Kitchen(KitchenId),
    Station(StationId),
    Agent(AgentId),
    Site(SiteId),
}

impl EventSubject {
    pub fn kind(self) -> &'static str {
        match self {
            EventSubject::Order(_) => "order",
            EventSubject::Kitchen(_) => "kitchen",
            EventSubject::Station(_) => "station",
            EventSubject::Agent(_) => "agent",
            EventSubject::Site(_) => "site",
        }
    }

    pub fn raw_id(self) -> u64 {
        match self {
            EventSubject::Order(id) => id.0,
            EventSubject::Kitchen(id) => id.0 as u64,
            EventSubject::Station(id) => id.0 as u64,
            EventSubject::Agent(id) => id.0 as u64,
            EventSubject::Site(id) => id.0 as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    CustomerArrived { site: SiteId },
    OrderPlaced { customer: AgentId, brand: BrandId, item: MenuItemId },
    KitchenAssigned { kitchen: KitchenId, distance_m: f64 },
    StepQueued { step: usize, station_type: StationTypeId },
    StepStarted { step: usize, station: StationId, waited: u64, planned: u64 },
    StepCompleted { step: usize, station: StationId },
    OrderReady,
    DeliveryDispatched { driver: AgentId, eta_ticks: u64, distance_m: f64 },
    OrderDelivered { driver: AgentId },
    FeedbackReceived { rating: u8 },
    OrderClosed,
    OrderCancelled { reason: CancelReason },
    DriverSpawned { site: SiteId },
    /// Watchlist: an order has waited for a station past the threshold.
    QueueBacklog { waiting_ticks: u64 },
    /// A kitchen has been at full utilization for `saturated_ticks` ticks.
    ResourceExhaustion { saturated_ticks: u64, queued: usize },
    KitchenClosed,
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::CustomerArrived { .. } => "customer_arrived",
            EventPayload::OrderPlaced { .. } => "order_placed",
            EventPayload::KitchenAssigned { .. } => "kitchen_assigned",
            EventPayload::StepQueued { .. } => "step_queued",
            EventPayload::StepStarted { .. } => "step_started",
            EventPayload::StepCompleted { .. } => "step_completed",
            EventPayload::OrderReady => "order_ready",
            EventPayload::DeliveryDispatched { .. } => "delivery_dispatched",
            EventPayload::OrderDelivered { .. } => "order_delivered",
            EventPayload::FeedbackReceived { .. } => "feedback_received",
            EventPayload::OrderClosed => "order_closed",
            EventPayload::OrderCancelled { .. } => "order_cancelled",
            EventPayload::DriverSpawned { .. } => "driver_spawned",
            EventPayload::QueueBacklog { .. } => "queue_backlog",
            EventPayload::ResourceExhaustion { .. } => "resource_exhaustion",
            EventPayload::KitchenClosed => "kitchen_closed",
        }
    }

    /// Warnings are reported, never fatal.
    pub fn is_warning(&self) -> bool {
        matches!(self, EventPayload::QueueBacklog { .. } | EventPayload::ResourceExhaustion { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub tick:    Tick,
    pub subject: EventSubject,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(tick: Tick, subject: EventSubject, payload: EventPayload) -> Self {
        Self { tick, subject, payload }
    }

    /// Payload as a JSON object, for the snapshot writer.
    pub fn payload_json(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    /// Events appended at or after position `offset`.
    pub fn since(&self, offset: usize) -> &[Event] {
        &self.events[offset.min(self.events.len())..]
    }

    pub(crate) fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

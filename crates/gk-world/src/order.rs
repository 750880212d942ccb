//! Orders and their lifecycle states.

use serde::Serialize;

use gk_core::{AgentId, BrandId, GeoPoint, KitchenId, MenuItemId, OrderId, StationId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// No kitchen able to make the item is within delivery range.
    NoKitchenInRange,
    /// Distance or route could not be computed.
    Routing,
    KitchenClosed,
    /// The customer gave up waiting.
    Customer,
    /// Cancelled through the control API.
    External,
}

impl CancelReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CancelReason::NoKitchenInRange => "no_kitchen_in_range",
            CancelReason::Routing => "routing",
            CancelReason::KitchenClosed => "kitchen_closed",
            CancelReason::Customer => "customer",
            CancelReason::External => "external",
        }
    }
}

/// `Placed -> Queued -> InPreparation(0..n) -> Ready -> OutForDelivery ->
/// Delivered -> FeedbackReceived -> Closed`, with `Cancelled` reachable
/// from anything before `OutForDelivery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Placed,
    Queued,
    /// Working on (or waiting for a station for) step `i`.
    InPreparation(usize),
    Ready,
    OutForDelivery,
    Delivered,
    FeedbackReceived,
    Closed,
    Cancelled(CancelReason),
}

impl OrderState {
    pub fn name(self) -> &'static str {
        match self {
            OrderState::Placed => "placed",
            OrderState::Queued => "queued",
            OrderState::InPreparation(_) => "in_preparation",
            OrderState::Ready => "ready",
            OrderState::OutForDelivery => "out_for_delivery",
            OrderState::Delivered => "delivered",
            OrderState::FeedbackReceived => "feedback_received",
            OrderState::Closed => "closed",
            OrderState::Cancelled(_) => "cancelled",
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Closed | OrderState::Cancelled(_))
    }

    /// Still cancellable.
    #[inline]
    pub fn is_pre_dispatch(self) -> bool {
        matches!(
            self,
            OrderState::Placed | OrderState::Queued | OrderState::InPreparation(_) | OrderState::Ready
        )
    }

    fn rank(self) -> (u8, usize) {
        match self {
            OrderState::Placed => (0, 0),
            OrderState::Queued => (1, 0),
            OrderState::InPreparation(i) => (2, i),
            OrderState::Ready => (3, 0),
            OrderState::OutForDelivery => (4, 0),
            OrderState::Delivered => (5, 0),
            OrderState::FeedbackReceived => (6, 0),
            OrderState::Closed => (7, 0),
            OrderState::Cancelled(_) => (u8::MAX, 0),
        }
    }

    /// Whether `next` is reachable from `self` by zero or more forward
    /// transitions.  Several transitions may happen inside one tick, so this
    /// is reachability rather than single-step adjacency.
    pub fn can_reach(self, next: OrderState) -> bool {
        match (self, next) {
            (OrderState::Cancelled(_), n) => n == self,
            (_, OrderState::Cancelled(_)) => self.is_pre_dispatch(),
            _ => next.rank() >= self.rank(),
        }
    }
}

/// Timing of one recipe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepTiming {
    pub requested: Option<Tick>,
    pub started:   Option<Tick>,
    pub completed: Option<Tick>,
    /// Duration fixed at grant time, after staff perturbation.
    pub planned:   u64,
    pub station:   StationId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id:            OrderId,
    pub customer:      AgentId,
    pub brand:         BrandId,
    pub item:          MenuItemId,
    /// `KitchenId::NONE` until resolved.
    pub kitchen:       KitchenId,
    pub destination:   GeoPoint,
    pub created:       Tick,
    pub state:         OrderState,
    /// Current recipe step.  Only ever increases, by one at a time.
    pub step:          usize,
    pub steps:         Vec<StepTiming>,
    pub ready_at:      Option<Tick>,
    pub driver:        AgentId,
    pub dispatched_at: Option<Tick>,
    pub eta_ticks:     Option<u64>,
    pub distance_m:    Option<f64>,
    pub delivered_at:  Option<Tick>,
    pub rating:        Option<u8>,
    pub closed_at:     Option<Tick>,
    /// A backlog event has already been raised for this order.
    pub watchlisted:   bool,
}

impl Order {
    pub fn new(
        id: OrderId,
        customer: AgentId,
        brand: BrandId,
        item: MenuItemId,
        destination: GeoPoint,
        created: Tick,
        step_count: usize,
    ) -> Self {
        Self {
            id,
            customer,
            brand,
            item,
            kitchen: KitchenId::NONE,
            destination,
            created,
            state: OrderState::Placed,
            step: 0,
            steps: vec![StepTiming::default(); step_count],
            ready_at: None,
            driver: AgentId::NONE,
            dispatched_at: None,
            eta_ticks: None,
            distance_m: None,
            delivered_at: None,
            rating: None,
            closed_at: None,
            watchlisted: false,
        }
    }

    /// The current step holds a station slot.
    pub fn is_running_step(&self) -> bool {
        matches!(self.state, OrderState::InPreparation(_))
            && self.steps.get(self.step).is_some_and(|s| s.started.is_some() && s.completed.is_none())
    }

    /// The current step is waiting for a station.
    pub fn is_waiting_for_station(&self) -> bool {
        matches!(self.state, OrderState::Queued | OrderState::InPreparation(_))
            && self.steps.get(self.step).is_some_and(|s| s.started.is_none())
    }

    /// Ticks the current step has been waiting for a station.
    pub fn waiting_for(&self, now: Tick) -> u64 {
        match self.steps.get(self.step).and_then(|s| s.requested) {
            Some(t) if self.is_waiting_for_station() => now.since(t),
            _ => 0,
        }
    }

    /// End-to-end ticks from creation to delivery.
    pub fn fulfilment_ticks(&self) -> Option<u64> {
        self.delivered_at.map(|t| t.since(self.created))
    }
}

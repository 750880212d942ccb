//! The order lifecycle machine: one tick of transitions, staged into a
//! [`TickTxn`] against a private copy of the station board.
//!
//! Phases run in a fixed order and visit orders in ascending id, so the
//! staged transaction depends only on the committed world, the seed, and the
//! commands queued before the tick.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error, warn};

use gk_behavior::{Decision, DecisionContext, DecisionModel, Preparation};
use gk_core::{
    AgentId, BrandId, GeoPoint, KitchenId, MenuItemId, OrderId, RngRegistry, SiteId, StationId,
    StreamKey, StreamPurpose, Tick,
};
use gk_delivery::{DeliveryTracker, EtaJob, EtaParams, InFlight, estimate_batch};
use gk_kitchen::{Admission, StationBoard, StationRequest};
use gk_setup::SimulationSetup;
use gk_spatial::SpatialIndex;
use gk_world::{
    Agent, CancelReason, Customer, Driver, DriverStatus, EventPayload, EventSubject, Order,
    OrderState, TickTxn, World,
};

use crate::{SimError, SimResult};

/// Requests made between ticks.  Applied at the start of the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cancel { order: OrderId, reason: CancelReason },
    CloseKitchen(KitchenId),
}

pub(crate) struct PassOutput {
    pub txn:       TickTxn,
    /// Deliveries started this tick.
    pub trips:     Vec<(OrderId, InFlight)>,
    /// Deliveries handed over this tick.
    pub delivered: Vec<OrderId>,
}

pub(crate) struct TickPass<'a, D: DecisionModel> {
    now:        Tick,
    world:      &'a World,
    setup:      &'a SimulationSetup,
    model:      &'a D,
    spatial:    &'a SpatialIndex,
    eta:        &'a EtaParams,
    deliveries: &'a DeliveryTracker,
    rngs:       &'a mut RngRegistry,
    txn:        TickTxn,
    board:      StationBoard,
    trips:      Vec<(OrderId, InFlight)>,
    delivered:  Vec<OrderId>,
}

impl<'a, D: DecisionModel> TickPass<'a, D> {
    pub fn new(
        world:      &'a World,
        model:      &'a D,
        spatial:    &'a SpatialIndex,
        eta:        &'a EtaParams,
        deliveries: &'a DeliveryTracker,
        rngs:       &'a mut RngRegistry,
    ) -> Self {
        Self {
            now: world.now(),
            world,
            setup: world.setup(),
            model,
            spatial,
            eta,
            deliveries,
            rngs,
            txn: TickTxn::begin(world),
            board: world.board().clone(),
            trips: Vec::new(),
            delivered: Vec::new(),
        }
    }

    pub fn run(mut self, commands: Vec<Command>) -> SimResult<PassOutput> {
        // Decisions.
        self.apply_commands(commands)?;
        self.arrivals()?;
        self.reconsider()?;

        // Lifecycle.
        self.hand_over();
        self.close_out();
        self.complete_steps()?;
        self.assign_new_orders()?;

        // Scheduler.
        self.schedule()?;
        self.watch_queues();
        self.watch_saturation()?;

        // Routing.
        self.dispatch()?;

        let TickPass { mut txn, board, trips, delivered, .. } = self;
        txn.stage_board(board);
        Ok(PassOutput { txn, trips, delivered })
    }

    #[inline]
    fn ctx(&self) -> DecisionContext<'a> {
        DecisionContext::new(self.world)
    }

    fn order(&self, id: OrderId) -> SimResult<&Order> {
        self.txn.order(self.world, id).ok_or(SimError::UnknownOrder(id))
    }

    fn order_mut(&mut self, id: OrderId) -> SimResult<&mut Order> {
        self.txn.order_mut(self.world, id).ok_or(SimError::UnknownOrder(id))
    }

    /// Committed active orders plus those placed this tick, ascending.
    fn live_order_ids(&self) -> Vec<OrderId> {
        self.world
            .active_orders()
            .map(|o| o.id)
            .chain(self.txn.new_orders().iter().map(|o| o.id))
            .collect()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    fn apply_commands(&mut self, commands: Vec<Command>) -> SimResult<()> {
        let world = self.world;
        for cmd in commands {
            match cmd {
                Command::Cancel { order, reason } => {
                    self.cancel(order, reason)?;
                }
                Command::CloseKitchen(kitchen) => {
                    if world.is_kitchen_closed(kitchen) {
                        continue;
                    }
                    self.txn.close_kitchen(kitchen);
                    let affected: Vec<OrderId> = world
                        .active_orders()
                        .filter(|o| o.kitchen == kitchen && o.state.is_pre_dispatch())
                        .map(|o| o.id)
                        .collect();
                    for id in &affected {
                        self.cancel(*id, CancelReason::KitchenClosed)?;
                    }
                    warn!(kitchen = %kitchen, cancelled = affected.len(), tick = %self.now, "kitchen closed");
                }
            }
        }
        Ok(())
    }

    /// Cancel a pre-dispatch order, giving back whatever it holds on the
    /// board.  Returns whether the order was cancelled.
    fn cancel(&mut self, id: OrderId, reason: CancelReason) -> SimResult<bool> {
        let Some(order) = self.txn.order(self.world, id) else {
            return Ok(false);
        };
        if !order.state.is_pre_dispatch() {
            debug!(order = %id, state = order.state.name(), "cancel ignored");
            return Ok(false);
        }
        let (kitchen, customer) = (order.kitchen, order.customer);
        if !kitchen.is_none() {
            self.board.release(kitchen, id)?;
            self.board.withdraw(kitchen, id)?;
        }

        let now = self.now;
        let order = self.order_mut(id)?;
        order.state = OrderState::Cancelled(reason);
        order.closed_at = Some(now);
        self.txn.emit(EventSubject::Order(id), EventPayload::OrderCancelled { reason });
        self.txn.metrics.orders_cancelled += 1;
        self.finish_customer(customer);
        Ok(true)
    }

    fn finish_customer(&mut self, customer: AgentId) {
        if let Some(Agent::Customer(c)) = self.txn.agent_mut(self.world, customer) {
            c.done = true;
        }
    }

    // ── Decisions ─────────────────────────────────────────────────────────

    fn arrivals(&mut self) -> SimResult<()> {
        let ctx = self.ctx();
        let setup = self.setup;
        for site in &setup.sites {
            let key = StreamKey::site(site.id, StreamPurpose::Arrivals);
            let decisions = self.model.arrivals(site.id, &ctx, self.rngs.stream(key));
            for decision in decisions {
                match decision {
                    Decision::Browse { position, satisfaction_bias } => {
                        self.spawn_customer(site.id, position, satisfaction_bias, None);
                    }
                    Decision::PlaceOrder { position, satisfaction_bias, brand, item } => {
                        let known = setup.menu_items.get(item.index()).is_some_and(|m| m.brand == brand);
                        if !known {
                            warn!(site = %site.id, brand = %brand, item = %item, "arrival ordered an unknown item");
                        }
                        let choice = known.then_some((brand, item));
                        self.spawn_customer(site.id, position, satisfaction_bias, choice);
                    }
                    Decision::Cancel { .. } => {}
                }
            }
        }
        Ok(())
    }

    fn spawn_customer(
        &mut self,
        site:     SiteId,
        position: GeoPoint,
        bias:     f64,
        choice:   Option<(BrandId, MenuItemId)>,
    ) {
        let now = self.now;
        let customer = self.txn.spawn_agent(|id| {
            Agent::Customer(Customer {
                id,
                site,
                position,
                satisfaction_bias: bias,
                arrived: now,
                order: None,
                done: choice.is_none(),
            })
        });
        self.txn.emit(EventSubject::Agent(customer), EventPayload::CustomerArrived { site });
        self.txn.metrics.customers_arrived += 1;

        let Some((brand, item)) = choice else {
            return;
        };
        let steps = self.setup.menu_item(item).instructions.len();
        let order = self
            .txn
            .place_order(|id| Order::new(id, customer, brand, item, position, now, steps));
        if let Some(Agent::Customer(c)) = self.txn.agent_mut(self.world, customer) {
            c.order = Some(order);
        }
        self.txn.emit(EventSubject::Order(order), EventPayload::OrderPlaced { customer, brand, item });
        self.txn.metrics.orders_placed += 1;
    }

    /// Every waiting customer may give up.
    fn reconsider(&mut self) -> SimResult<()> {
        let ctx = self.ctx();
        let world = self.world;
        for committed in world.active_orders() {
            let id = committed.id;
            let Some(customer) = world.agents().customer(committed.customer) else {
                continue;
            };
            let Some(order) = self.txn.order(world, id) else {
                continue;
            };
            if !order.state.is_pre_dispatch() {
                continue;
            }
            let stream = self.rngs.agent(customer.id, StreamPurpose::Cancellation);
            if let Some(Decision::Cancel { order, reason }) = self.model.reconsider(customer, order, &ctx, stream) {
                if order == id {
                    self.cancel(id, reason)?;
                }
            }
        }
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// `OutForDelivery -> Delivered` for every trip that has arrived.
    fn hand_over(&mut self) {
        let now = self.now;
        for id in self.deliveries.due(now) {
            let Some(order) = self.txn.order_mut(self.world, id) else {
                continue;
            };
            if order.state != OrderState::OutForDelivery {
                continue;
            }
            order.state = OrderState::Delivered;
            order.delivered_at = Some(now);
            let driver = order.driver;

            if let Some(Agent::Driver(d)) = self.txn.agent_mut(self.world, driver) {
                d.status = DriverStatus::Idle;
                d.position = d.home;
                d.deliveries += 1;
            }
            self.txn.emit(EventSubject::Order(id), EventPayload::OrderDelivered { driver });
            self.txn.metrics.orders_delivered += 1;
            self.delivered.push(id);
        }
    }

    /// Delivered orders from earlier ticks collect feedback or close;
    /// orders with feedback close one tick later.
    fn close_out(&mut self) {
        let ctx = self.ctx();
        let world = self.world;
        let now = self.now;
        for order in world.active_orders() {
            let id = order.id;
            match order.state {
                OrderState::Delivered if order.delivered_at.is_some_and(|t| t < now) => {
                    let feedback = world.agents().customer(order.customer).and_then(|c| {
                        let stream = self.rngs.agent(c.id, StreamPurpose::Feedback);
                        self.model.feedback(order, c, &ctx, stream)
                    });
                    match feedback {
                        Some(f) => {
                            if let Some(o) = self.txn.order_mut(world, id) {
                                o.state = OrderState::FeedbackReceived;
                                o.rating = Some(f.rating);
                            }
                            self.txn.emit(EventSubject::Order(id), EventPayload::FeedbackReceived { rating: f.rating });
                            self.txn.metrics.feedback_received += 1;
                            self.txn.metrics.rating_sum += f.rating as u64;
                        }
                        None => self.close(id, order.customer),
                    }
                }
                OrderState::FeedbackReceived => self.close(id, order.customer),
                _ => {}
            }
        }
    }

    fn close(&mut self, id: OrderId, customer: AgentId) {
        let now = self.now;
        if let Some(o) = self.txn.order_mut(self.world, id) {
            o.state = OrderState::Closed;
            o.closed_at = Some(now);
        }
        self.txn.emit(EventSubject::Order(id), EventPayload::OrderClosed);
        self.txn.metrics.orders_closed += 1;
        self.finish_customer(customer);
    }

    /// Finish running steps whose planned time is up, release their slots and
    /// ask for the next station in the same tick.
    fn complete_steps(&mut self) -> SimResult<()> {
        let now = self.now;
        let world = self.world;
        for committed in world.active_orders() {
            let id = committed.id;
            let order = self.order(id)?;
            if !order.is_running_step() {
                continue;
            }
            let step = order.step;
            let timing = order.steps[step];
            let Some(started) = timing.started else {
                continue;
            };
            if now.since(started) < timing.planned {
                continue;
            }
            let (kitchen, last) = (order.kitchen, step + 1 == order.steps.len());

            if self.board.release(kitchen, id)?.is_none() {
                error!(order = %id, kitchen = %kitchen, step, "running step without a slot");
                return Err(SimError::SlotMissing(id));
            }
            self.order_mut(id)?.steps[step].completed = Some(now);
            self.txn.emit(
                EventSubject::Order(id),
                EventPayload::StepCompleted { step, station: timing.station },
            );
            self.txn.metrics.steps_completed += 1;
            if let Some(Agent::KitchenStaff(s)) = self.txn.agent_mut(world, AgentId(kitchen.0)) {
                s.steps_done += 1;
            }

            if last {
                let order = self.order_mut(id)?;
                order.state = OrderState::Ready;
                order.ready_at = Some(now);
                self.txn.emit(EventSubject::Order(id), EventPayload::OrderReady);
            } else {
                let order = self.order_mut(id)?;
                order.step = step + 1;
                order.state = OrderState::InPreparation(step + 1);
                self.request_step(id, step + 1)?;
            }
        }
        Ok(())
    }

    /// Resolve the nearest capable kitchen for every order placed this tick.
    fn assign_new_orders(&mut self) -> SimResult<()> {
        let placed: Vec<OrderId> = self
            .txn
            .new_orders()
            .iter()
            .filter(|o| o.state == OrderState::Placed)
            .map(|o| o.id)
            .collect();
        for id in placed {
            self.assign(id)?;
        }
        Ok(())
    }

    fn assign(&mut self, id: OrderId) -> SimResult<()> {
        let (item, destination) = {
            let o = self.order(id)?;
            (o.item, o.destination)
        };
        let setup = self.setup;
        let world = self.world;
        let closing: Vec<KitchenId> = self.txn.closures().to_vec();
        let eligible = |k: KitchenId| {
            !world.is_kitchen_closed(k) && !closing.contains(&k) && setup.kitchen_can_prepare(k, item)
        };

        let nearest = match self.spatial.nearest_kitchens_where(destination, 1, eligible) {
            Ok(n) => n.first().copied(),
            Err(e) => {
                warn!(order = %id, error = %e, "kitchen lookup failed");
                self.txn.metrics.routing_failures += 1;
                self.cancel(id, CancelReason::Routing)?;
                return Ok(());
            }
        };
        let Some(nearest) = nearest else {
            self.cancel(id, CancelReason::NoKitchenInRange)?;
            return Ok(());
        };
        let distance_m = match self.spatial.distance(setup.kitchen_location(nearest.kitchen), destination) {
            Ok(d) => d,
            Err(e) => {
                warn!(order = %id, kitchen = %nearest.kitchen, error = %e, "distance computation failed");
                self.txn.metrics.routing_failures += 1;
                self.cancel(id, CancelReason::Routing)?;
                return Ok(());
            }
        };
        if distance_m > setup.params.max_delivery_distance_m {
            self.cancel(id, CancelReason::NoKitchenInRange)?;
            return Ok(());
        }

        let now = self.now;
        let order = self.order_mut(id)?;
        order.kitchen = nearest.kitchen;
        order.distance_m = Some(distance_m);
        order.state = OrderState::Queued;
        let no_steps = order.steps.is_empty();
        self.txn.emit(
            EventSubject::Order(id),
            EventPayload::KitchenAssigned { kitchen: nearest.kitchen, distance_m },
        );

        if no_steps {
            let order = self.order_mut(id)?;
            order.state = OrderState::Ready;
            order.ready_at = Some(now);
            self.txn.emit(EventSubject::Order(id), EventPayload::OrderReady);
            return Ok(());
        }
        self.request_step(id, 0)
    }

    fn request_step(&mut self, id: OrderId, step: usize) -> SimResult<()> {
        let now = self.now;
        let (kitchen, created, item) = {
            let o = self.order(id)?;
            (o.kitchen, o.created, o.item)
        };
        let station_type = self.setup.menu_item(item).instructions[step].station_type;
        let req = StationRequest { order: id, kitchen, station_type, step, created, requested: now };

        match self.board.request_start(req)? {
            Admission::Granted(station) => self.start_step(id, step, station, 0),
            Admission::Queued => {
                self.order_mut(id)?.steps[step].requested = Some(now);
                self.txn.emit(EventSubject::Order(id), EventPayload::StepQueued { step, station_type });
                Ok(())
            }
        }
    }

    fn start_step(&mut self, id: OrderId, step: usize, station: StationId, waited: u64) -> SimResult<()> {
        let now = self.now;
        let (kitchen, item) = {
            let o = self.order(id)?;
            (o.kitchen, o.item)
        };
        let (setup, world) = (self.setup, self.world);
        let instruction = &setup.menu_item(item).instructions[step];
        let prep = match world.agents().staff(kitchen) {
            Some(staff) => {
                let stream = self.rngs.agent(staff.id, StreamPurpose::Staff);
                self.model.preparation_ticks(instruction, staff, stream)
            }
            None => Preparation { ticks: instruction.expected_duration.max(1), rework: false },
        };
        if prep.rework {
            if let Some(Agent::KitchenStaff(s)) = self.txn.agent_mut(world, AgentId(kitchen.0)) {
                s.reworks += 1;
            }
        }

        let planned = prep.ticks.max(1);
        let order = self.order_mut(id)?;
        let timing = &mut order.steps[step];
        timing.requested.get_or_insert(now);
        timing.started = Some(now);
        timing.planned = planned;
        timing.station = station;
        order.step = step;
        order.state = OrderState::InPreparation(step);

        self.txn.emit(EventSubject::Order(id), EventPayload::StepStarted { step, station, waited, planned });
        self.txn.metrics.steps_started += 1;
        self.txn.metrics.queue_wait_ticks += waited;
        Ok(())
    }

    // ── Scheduler ─────────────────────────────────────────────────────────

    fn schedule(&mut self) -> SimResult<()> {
        let grants = self.board.evaluate(self.now);
        if !grants.is_empty() {
            debug!(tick = %self.now, grants = grants.len(), "queued steps started");
        }
        for g in grants {
            self.start_step(g.order, g.step, g.station, g.waited)?;
        }
        Ok(())
    }

    /// One backlog event per order once its station wait passes the
    /// threshold.  Waiting orders are never cancelled for it.
    fn watch_queues(&mut self) {
        let threshold = self.setup.params.queue_watch_threshold;
        if threshold == 0 {
            return;
        }
        let now = self.now;
        let world = self.world;
        for committed in world.active_orders() {
            let id = committed.id;
            let Some(order) = self.txn.order(world, id) else {
                continue;
            };
            if order.watchlisted || !order.is_waiting_for_station() {
                continue;
            }
            let waiting_ticks = order.waiting_for(now);
            if waiting_ticks <= threshold {
                continue;
            }
            if let Some(o) = self.txn.order_mut(world, id) {
                o.watchlisted = true;
            }
            warn!(order = %id, waiting_ticks, tick = %now, "order stuck in station queue");
            self.txn.emit(EventSubject::Order(id), EventPayload::QueueBacklog { waiting_ticks });
            self.txn.metrics.backlog_warnings += 1;
        }
    }

    fn watch_saturation(&mut self) -> SimResult<()> {
        let threshold = self.setup.params.saturation_warn_ticks;
        for (kitchen, saturated_ticks) in self.board.track_saturation(threshold) {
            let queued = self.board.kitchen(kitchen)?.stats().queued;
            warn!(kitchen = %kitchen, saturated_ticks, queued, "kitchen saturated");
            self.txn.emit(
                EventSubject::Kitchen(kitchen),
                EventPayload::ResourceExhaustion { saturated_ticks, queued },
            );
            self.txn.metrics.saturation_warnings += 1;
        }
        Ok(())
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Ready orders, oldest first, get a driver if one can be found this
    /// tick, then an ETA.
    fn dispatch(&mut self) -> SimResult<()> {
        let mut ready: Vec<(Tick, OrderId)> = self
            .live_order_ids()
            .into_iter()
            .filter_map(|id| {
                let o = self.txn.order(self.world, id)?;
                (o.state == OrderState::Ready).then(|| (o.ready_at.unwrap_or(o.created), id))
            })
            .collect();
        if ready.is_empty() {
            return Ok(());
        }
        ready.sort_unstable();

        let ctx = self.ctx();
        let setup = self.setup;
        let mut idle = self.idle_drivers();
        let mut jobs = Vec::new();
        let mut assigned = Vec::new();

        for (_, id) in ready {
            let order = self.txn.order(self.world, id).ok_or(SimError::UnknownOrder(id))?;
            let (customer, kitchen, destination) = (order.customer, order.kitchen, order.destination);
            let stream = self.rngs.agent(customer, StreamPurpose::Driver);
            if !self.model.driver_available(order, &ctx, stream) {
                continue;
            }

            let site = setup.kitchen(kitchen).site;
            let driver = match idle.get_mut(&site).and_then(BTreeSet::pop_first) {
                Some(d) => d,
                None => self.spawn_driver(site),
            };
            let traffic = StreamKey::agent(customer, StreamPurpose::Traffic);
            jobs.push(EtaJob {
                order: id,
                kitchen: setup.kitchen_location(kitchen),
                customer: destination,
                rng: self.rngs.checkout(traffic),
            });
            assigned.push((traffic, driver, kitchen));
        }
        if jobs.is_empty() {
            return Ok(());
        }

        let now = self.now;
        let results = estimate_batch(jobs, self.spatial, self.eta);
        let mut dispatched = 0usize;
        for ((job, result), (traffic, driver, kitchen)) in results.into_iter().zip(assigned) {
            let id = job.order;
            let (from, to) = (job.kitchen, job.customer);
            self.rngs.restore(traffic, job.rng);

            let estimate = match result {
                Ok(e) => e,
                Err(e) => {
                    warn!(order = %id, error = %e, "ETA computation failed");
                    self.txn.metrics.routing_failures += 1;
                    self.cancel(id, CancelReason::Routing)?;
                    continue;
                }
            };
            let arrival = now + estimate.ticks;
            let order = self.order_mut(id)?;
            order.state = OrderState::OutForDelivery;
            order.dispatched_at = Some(now);
            order.eta_ticks = Some(estimate.ticks);
            order.distance_m = Some(estimate.distance_m);
            order.driver = driver;

            if let Some(Agent::Driver(d)) = self.txn.agent_mut(self.world, driver) {
                d.status = DriverStatus::Delivering { order: id, from, to, departed: now, arrival };
                d.position = from;
            }
            self.txn.emit(
                EventSubject::Order(id),
                EventPayload::DeliveryDispatched {
                    driver,
                    eta_ticks: estimate.ticks,
                    distance_m: estimate.distance_m,
                },
            );
            self.txn.metrics.deliveries_dispatched += 1;
            self.txn.metrics.delivery_ticks += estimate.ticks;
            let trip = InFlight { driver, kitchen, from, to, departed: now, arrival, distance_m: estimate.distance_m };
            self.trips.push((id, trip));
            dispatched += 1;
        }
        if dispatched > 0 {
            debug!(tick = %now, dispatched, "deliveries dispatched");
        }
        Ok(())
    }

    /// Idle drivers per site as of this point in the tick, lowest id first.
    fn idle_drivers(&self) -> BTreeMap<SiteId, BTreeSet<AgentId>> {
        let mut pool: BTreeMap<SiteId, BTreeSet<AgentId>> = BTreeMap::new();
        let committed = self.world.agents().iter().map(Agent::id);
        let staged = self.txn.new_agents().iter().map(Agent::id);
        for id in committed.chain(staged) {
            if let Some(Agent::Driver(d)) = self.txn.agent(self.world, id) {
                if d.status == DriverStatus::Idle {
                    pool.entry(d.site).or_default().insert(d.id);
                }
            }
        }
        pool
    }

    fn spawn_driver(&mut self, site: SiteId) -> AgentId {
        let home = self.setup.site(site).location;
        let driver = self.txn.spawn_agent(|id| {
            Agent::Driver(Driver { id, site, home, position: home, status: DriverStatus::Idle, deliveries: 0 })
        });
        self.txn.emit(EventSubject::Agent(driver), EventPayload::DriverSpawned { site });
        self.txn.metrics.drivers_spawned += 1;
        driver
    }
}

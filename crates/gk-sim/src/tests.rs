//! Scenario tests for the tick loop.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use gk_behavior::{Decision, ScriptedModel};
    use gk_core::{BrandId, GeoPoint, MenuItemId, SiteId, Tick};
    use gk_setup::{
        BrandRecord, EngineParams, InstructionRecord, KitchenRecord, MenuItemRecord, SetupSource,
        SimulationSetup, SiteRecord, StationRecord,
    };

    use crate::{Sim, SimBuilder};

    pub const HUB: GeoPoint = GeoPoint { lat: 52.3676, lon: 4.9041 };

    /// Params with the noise switched off.
    pub fn quiet_params() -> EngineParams {
        EngineParams {
            traffic_variation: 0.0,
            weather_impact: 0.0,
            queue_watch_threshold: 0,
            saturation_warn_ticks: 0,
            ..EngineParams::default()
        }
    }

    /// One site, one kitchen with the given `(type, capacity)` stations, and a
    /// single brand whose items are lists of `(station type, ticks)` steps.
    pub fn single_kitchen(
        params:   EngineParams,
        stations: &[(&str, u32)],
        items:    &[&[(&str, u64)]],
    ) -> Arc<SimulationSetup> {
        let stations = stations
            .iter()
            .enumerate()
            .map(|(i, &(ty, capacity))| StationRecord {
                id: format!("st-{i}"),
                name: ty.to_owned(),
                station_type: ty.to_owned(),
                capacity,
            })
            .collect();
        let items = items
            .iter()
            .enumerate()
            .map(|(i, steps)| MenuItemRecord {
                id: format!("item-{i}"),
                name: format!("Item {i}"),
                description: String::new(),
                price: 10.0,
                image_url: None,
                ingredients: Vec::new(),
                instructions: steps
                    .iter()
                    .enumerate()
                    .map(|(s, &(ty, ticks))| InstructionRecord {
                        step: format!("step {s}"),
                        description: String::new(),
                        required_station: ty.to_owned(),
                        expected_duration: ticks,
                    })
                    .collect(),
            })
            .collect();
        let source = SetupSource {
            params,
            ingredients: Vec::new(),
            sites: vec![SiteRecord {
                id: "hub".into(),
                name: "Hub".into(),
                latitude: HUB.lat,
                longitude: HUB.lon,
                kitchens: vec![KitchenRecord {
                    id: "k0".into(),
                    name: "Kitchen 0".into(),
                    brands: vec!["brand".into()],
                    stations,
                }],
            }],
            brands: vec![BrandRecord {
                id: "brand".into(),
                name: "Brand".into(),
                description: String::new(),
                category: String::new(),
                items,
            }],
        };
        Arc::new(source.build().unwrap())
    }

    pub fn order_at(position: GeoPoint, item: usize) -> Decision {
        Decision::PlaceOrder {
            position,
            satisfaction_bias: 0.0,
            brand: BrandId(0),
            item: MenuItemId(item as u32),
        }
    }

    /// Script one order per `(tick, item)` pair, all at the hub.
    pub fn script(orders: &[(u64, usize)]) -> ScriptedModel {
        orders.iter().fold(ScriptedModel::new(), |m, &(t, item)| {
            m.at(Tick(t), SiteId(0), order_at(HUB, item))
        })
    }

    pub fn sim(setup: Arc<SimulationSetup>, model: ScriptedModel, ticks: u64) -> Sim<ScriptedModel> {
        SimBuilder::new(setup, model).duration(ticks).build().unwrap()
    }
}

#[cfg(test)]
mod preparation {
    use gk_core::{OrderId, Tick};
    use gk_world::OrderState;

    use super::helpers::{quiet_params, script, sim, single_kitchen};
    use crate::NoopObserver;

    #[test]
    fn three_steps_without_contention_take_their_sum() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 2), ("stove", 10), ("stove", 2)]]);
        let mut sim = sim(setup, script(&[(0, 0)]), 20);
        sim.run_ticks(15, &mut NoopObserver).unwrap();

        let order = sim.world().order(OrderId(0)).unwrap();
        let granted = order.steps[0].started.unwrap();
        assert_eq!(granted, Tick(0));
        assert_eq!(order.ready_at, Some(granted + 14));
        assert_eq!(order.steps[1].started, Some(Tick(2)));
        assert_eq!(order.steps[2].started, Some(Tick(12)));
        // Ready orders leave in the tick they become ready.
        assert_eq!(order.state, OrderState::OutForDelivery);
    }

    #[test]
    fn first_come_first_served_on_one_slot() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 3)]]);
        let mut sim = sim(setup, script(&[(0, 0), (1, 0)]), 10);
        sim.run_ticks(5, &mut NoopObserver).unwrap();

        let first = sim.world().order(OrderId(0)).unwrap();
        let second = sim.world().order(OrderId(1)).unwrap();
        assert_eq!(first.steps[0].started, Some(Tick(0)));
        assert_eq!(first.steps[0].completed, Some(Tick(3)));
        assert_eq!(second.steps[0].requested, Some(Tick(1)));
        assert_eq!(second.steps[0].started, first.steps[0].completed);
    }

    #[test]
    fn capacity_two_runs_two_orders_together() {
        let setup = single_kitchen(quiet_params(), &[("stove", 2)], &[&[("stove", 4)]]);
        let mut sim = sim(setup, script(&[(0, 0), (0, 0), (0, 0)]), 10);
        sim.run_ticks(2, &mut NoopObserver).unwrap();

        let started: Vec<_> = (0..3).map(|i| sim.world().order(OrderId(i)).unwrap().steps[0].started).collect();
        assert_eq!(started, vec![Some(Tick(0)), Some(Tick(0)), None]);
        assert_eq!(sim.world().board().total_queued(), 1);
    }

    #[test]
    fn board_never_oversubscribed() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1), ("oven", 1)], &[
            &[("stove", 2), ("oven", 3)],
            &[("oven", 1), ("stove", 1)],
        ]);
        let orders: Vec<(u64, usize)> = (0..12).map(|i| (i / 2, (i % 2) as usize)).collect();
        let mut sim = sim(setup, script(&orders), 60);
        for _ in 0..60 {
            sim.run_ticks(1, &mut NoopObserver).unwrap();
            for k in sim.world().board().stats() {
                assert!(k.busy_slots <= k.total_slots);
            }
        }
        assert_eq!(sim.world().metrics().orders_placed, 12);
        assert_eq!(sim.world().metrics().orders_delivered, 12);
    }
}

#[cfg(test)]
mod delivery {
    use gk_core::{GeoPoint, OrderId, Tick};
    use gk_world::{EventPayload, OrderState};

    use super::helpers::{HUB, quiet_params, script, sim, single_kitchen};
    use crate::{NoopObserver, SummaryCollector};

    #[test]
    fn order_goes_all_the_way_to_closed() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 2)]]);
        let mut sim = sim(setup, script(&[(0, 0)]), 12);
        let mut obs = SummaryCollector::default();
        sim.run(&mut obs).unwrap();

        let order = sim.world().order(OrderId(0)).unwrap();
        assert_eq!(order.state, OrderState::Closed);
        assert_eq!(order.ready_at, Some(Tick(2)));
        assert_eq!(order.dispatched_at, Some(Tick(2)));
        // Customer at the kitchen: base ticks only.
        assert_eq!(order.eta_ticks, Some(5));
        assert_eq!(order.delivered_at, Some(Tick(7)));
        assert_eq!(order.closed_at, Some(Tick(8)));
        assert_eq!(sim.world().active_order_count(), 0);
        assert!(sim.deliveries().is_empty());
        assert_eq!(obs.finished, Some(Tick(12)));
    }

    #[test]
    fn distance_adds_ticks() {
        let far = GeoPoint::new(HUB.lat + 0.017, HUB.lon); // ~1.9 km north
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 1)]]);
        let model = gk_behavior::ScriptedModel::new().at(Tick(0), gk_core::SiteId(0), super::helpers::order_at(far, 0));
        let mut sim = sim(setup, model, 5);
        sim.run_ticks(2, &mut NoopObserver).unwrap();

        let order = sim.world().order(OrderId(0)).unwrap();
        assert_eq!(order.state, OrderState::OutForDelivery);
        assert_eq!(order.eta_ticks, Some(5 + 6));
    }

    #[test]
    fn drivers_are_reused_once_idle() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 1)]]);
        let mut sim = sim(setup, script(&[(0, 0), (20, 0)]), 30);
        sim.run(&mut NoopObserver).unwrap();

        let spawned = sim
            .world()
            .events()
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::DriverSpawned { .. }))
            .count();
        assert_eq!(spawned, 1);
        let a = sim.world().order(OrderId(0)).unwrap().driver;
        let b = sim.world().order(OrderId(1)).unwrap().driver;
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_customers_are_cancelled() {
        let params = gk_setup::EngineParams { max_delivery_distance_m: 500.0, ..quiet_params() };
        let far = GeoPoint::new(HUB.lat + 0.05, HUB.lon);
        let setup = single_kitchen(params, &[("stove", 1)], &[&[("stove", 1)]]);
        let model = gk_behavior::ScriptedModel::new().at(Tick(0), gk_core::SiteId(0), super::helpers::order_at(far, 0));
        let mut sim = sim(setup, model, 3);
        sim.run(&mut NoopObserver).unwrap();

        let order = sim.world().order(OrderId(0)).unwrap();
        assert_eq!(order.state, OrderState::Cancelled(gk_world::CancelReason::NoKitchenInRange));
    }
}

#[cfg(test)]
mod control {
    use gk_core::{KitchenId, OrderId};
    use gk_world::{CancelReason, EventPayload, OrderState};

    use super::helpers::{quiet_params, script, sim, single_kitchen};
    use crate::{NoopObserver, SimError};

    #[test]
    fn cancel_releases_the_slot_for_the_next_order() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 10)]]);
        let mut sim = sim(setup, script(&[(0, 0), (0, 0)]), 20);
        sim.run_ticks(2, &mut NoopObserver).unwrap();
        assert_eq!(sim.world().board().total_queued(), 1);

        sim.cancel_order(OrderId(0), CancelReason::External).unwrap();
        sim.run_ticks(1, &mut NoopObserver).unwrap();

        let cancelled = sim.world().order(OrderId(0)).unwrap();
        assert_eq!(cancelled.state, OrderState::Cancelled(CancelReason::External));
        let next = sim.world().active_order(OrderId(1)).unwrap();
        assert_eq!(next.steps[0].started, Some(gk_core::Tick(2)));
        assert_eq!(sim.world().board().total_queued(), 0);
    }

    #[test]
    fn cancel_rejects_unknown_and_dispatched_orders() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 1)]]);
        let mut sim = sim(setup, script(&[(0, 0)]), 10);
        assert!(matches!(
            sim.cancel_order(OrderId(7), CancelReason::External),
            Err(SimError::UnknownOrder(_))
        ));
        sim.run_ticks(2, &mut NoopObserver).unwrap();
        assert!(matches!(
            sim.cancel_order(OrderId(0), CancelReason::External),
            Err(SimError::NotCancellable { state: "out_for_delivery", .. })
        ));
    }

    #[test]
    fn closing_a_kitchen_cancels_its_orders_and_refuses_new_ones() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 10)]]);
        let mut sim = sim(setup, script(&[(0, 0), (0, 0), (3, 0)]), 5);
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        sim.close_kitchen(KitchenId(0)).unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let w = sim.world();
        assert!(w.is_kitchen_closed(KitchenId(0)));
        for id in [0, 1] {
            assert_eq!(w.order(OrderId(id)).unwrap().state, OrderState::Cancelled(CancelReason::KitchenClosed));
        }
        assert_eq!(w.order(OrderId(2)).unwrap().state, OrderState::Cancelled(CancelReason::NoKitchenInRange));
        assert_eq!(w.board().stats()[0].busy_slots, 0);
        let closed = w.events().iter().filter(|e| e.payload == EventPayload::KitchenClosed).count();
        assert_eq!(closed, 1);
    }

    #[test]
    fn close_unknown_kitchen_fails() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 1)]]);
        let mut sim = sim(setup, script(&[]), 1);
        assert!(matches!(sim.close_kitchen(KitchenId(3)), Err(SimError::UnknownKitchen(_))));
    }
}

#[cfg(test)]
mod warnings {
    use gk_core::OrderId;
    use gk_world::{EventPayload, EventSubject};

    use super::helpers::{quiet_params, script, sim, single_kitchen};
    use crate::{NoopObserver, SummaryCollector};

    #[test]
    fn long_waits_are_watchlisted_once() {
        let params = gk_setup::EngineParams { queue_watch_threshold: 3, ..quiet_params() };
        let setup = single_kitchen(params, &[("stove", 1)], &[&[("stove", 10)]]);
        let mut sim = sim(setup, script(&[(0, 0), (0, 0)]), 10);
        sim.run(&mut NoopObserver).unwrap();

        let backlog: Vec<_> = sim
            .world()
            .events()
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::QueueBacklog { .. }))
            .collect();
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].subject, EventSubject::Order(OrderId(1)));
        assert_eq!(backlog[0].tick, gk_core::Tick(4));
        // Still waiting, never cancelled for it.
        assert!(sim.world().active_order(OrderId(1)).unwrap().state.is_pre_dispatch());
    }

    #[test]
    fn saturated_kitchen_raises_a_warning() {
        let params = gk_setup::EngineParams { saturation_warn_ticks: 5, ..quiet_params() };
        let setup = single_kitchen(params, &[("stove", 1)], &[&[("stove", 20)]]);
        let mut sim = sim(setup, script(&[(0, 0)]), 10);
        let mut obs = SummaryCollector::default();
        sim.run(&mut obs).unwrap();

        assert!(sim.world().metrics().saturation_warnings >= 1);
        assert!(obs.summaries.iter().any(|s| s.warnings > 0));
    }
}

#[cfg(test)]
mod observer {
    use gk_core::{SimConfig, Tick};

    use super::helpers::{quiet_params, script, single_kitchen};
    use crate::{SimBuilder, SummaryCollector};

    #[test]
    fn snapshots_on_interval_and_last_tick() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 2)]]);
        let config = SimConfig { duration_ticks: 25, snapshot_interval_ticks: 10, ..SimConfig::default() };
        let mut sim = SimBuilder::new(setup, script(&[(0, 0)])).config(config).build().unwrap();
        let mut obs = SummaryCollector::default();
        sim.run(&mut obs).unwrap();

        assert_eq!(obs.snapshots, vec![Tick(9), Tick(19), Tick(24)]);
        assert_eq!(obs.summaries.len(), 25);
        assert_eq!(obs.summaries[0].orders_placed, 1);
        assert_eq!(obs.summaries[0].busy_slots, 1);
        assert_eq!(obs.finished, Some(Tick(25)));
    }

    #[test]
    fn zero_duration_runs_nothing() {
        let setup = single_kitchen(quiet_params(), &[("stove", 1)], &[&[("stove", 2)]]);
        let mut sim = SimBuilder::new(setup, script(&[(0, 0)])).duration(0).build().unwrap();
        let mut obs = SummaryCollector::default();
        sim.run(&mut obs).unwrap();
        assert!(obs.summaries.is_empty());
        assert_eq!(sim.world().metrics().orders_placed, 0);
        assert_eq!(obs.finished, Some(Tick(0)));
    }
}

#[cfg(test)]
mod determinism {
    use std::sync::Arc;

    use gk_behavior::DemandModel;
    use gk_setup::{BrandTemplate, EngineParams, SiteTemplate, template_source};
    use gk_world::AgentRole;

    use crate::{NoopObserver, Sim, SimBuilder};

    fn busy_sim(seed: u64) -> Sim<DemandModel> {
        let mut source = template_source(&[SiteTemplate::Amsterdam], &[BrandTemplate::FastFood, BrandTemplate::Asian]);
        source.params = EngineParams {
            arrival_rate: 2.0,
            cancel_probability: 0.02,
            kitchen_error_rate: 0.1,
            ..EngineParams::default()
        };
        let setup = Arc::new(source.build().unwrap());
        let model = DemandModel::new(&setup).unwrap();
        SimBuilder::new(setup, model).duration(120).seed(seed).build().unwrap()
    }

    fn fingerprint(sim: &Sim<DemandModel>) -> Vec<String> {
        sim.world()
            .events()
            .iter()
            .map(|e| format!("{}|{:?}|{}", e.tick, e.subject, e.payload_json()))
            .collect()
    }

    #[test]
    fn same_seed_same_history() {
        let mut a = busy_sim(7);
        let mut b = busy_sim(7);
        a.run(&mut NoopObserver).unwrap();
        b.run(&mut NoopObserver).unwrap();
        assert!(a.world().metrics().orders_placed > 0);
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(a.world().metrics(), b.world().metrics());
    }

    #[test]
    fn different_seed_different_history() {
        let mut a = busy_sim(7);
        let mut b = busy_sim(8);
        a.run(&mut NoopObserver).unwrap();
        b.run(&mut NoopObserver).unwrap();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn only_waiting_customers_stay_live() {
        let mut sim = busy_sim(5);
        sim.run(&mut NoopObserver).unwrap();
        let world = sim.world();
        let agents = world.agents();
        assert!(agents.retired_len() > 0);
        assert_eq!(agents.count(AgentRole::Customer), world.active_order_count());
        assert_eq!(agents.len(), agents.live_len() + agents.retired_len());
        assert!(agents.iter().all(|a| a.as_customer().is_none_or(|c| !c.done)));
    }

    #[test]
    fn archived_customers_release_their_streams() {
        let mut sim = busy_sim(3);
        sim.run(&mut NoopObserver).unwrap();
        let archived = sim.world().archived_orders().count();
        assert!(archived > 0);
        // Sites, staff and live customers only: never one stream per order ever placed.
        let placed = sim.world().metrics().orders_placed as usize;
        assert!(sim.live_streams() < placed * 4);
    }
}

//! Unit tests for the decision models.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use gk_core::{AgentId, AgentRng, KitchenId, StationTypeId, StreamKey, StreamPurpose};
    use gk_setup::{BrandTemplate, EngineParams, Instruction, SiteTemplate, template_source};
    use gk_world::{KitchenStaff, World};

    pub fn world(params: EngineParams) -> World {
        let mut source = template_source(&[SiteTemplate::Amsterdam], &BrandTemplate::ALL);
        source.params = params;
        World::new(Arc::new(source.build().unwrap()))
    }

    pub fn rng(seed: u64) -> AgentRng {
        AgentRng::new(seed, StreamKey::agent(AgentId(0), StreamPurpose::Arrivals))
    }

    pub fn staff(error_rate: f64, staffing_level: f64) -> KitchenStaff {
        KitchenStaff {
            id: AgentId(0),
            kitchen: KitchenId(0),
            position: gk_core::GeoPoint::new(52.37, 4.9),
            error_rate,
            staffing_level,
            steps_done: 0,
            reworks: 0,
        }
    }

    pub fn instruction(ticks: u64) -> Instruction {
        Instruction {
            step:              "cook".into(),
            description:       String::new(),
            station_type:      StationTypeId(0),
            expected_duration: ticks,
        }
    }
}

#[cfg(test)]
mod demand {
    use super::helpers::{instruction, rng, staff, world};
    use crate::{Decision, DecisionContext, DecisionModel, DemandModel};
    use gk_core::{AgentId, GeoPoint, SiteId, Tick};
    use gk_setup::EngineParams;
    use gk_world::{CancelReason, Customer, Order, OrderState};

    fn params() -> EngineParams {
        EngineParams { arrival_rate: 4.0, order_probability: 1.0, ..EngineParams::default() }
    }

    #[test]
    fn same_seed_same_arrivals() {
        let w = world(params());
        let model = DemandModel::new(w.setup()).unwrap();
        let ctx = DecisionContext::new(&w);
        let a = model.arrivals(SiteId(0), &ctx, &mut rng(7));
        let b = model.arrivals(SiteId(0), &ctx, &mut rng(7));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_rate_means_no_arrivals() {
        let w = world(EngineParams { arrival_rate: 0.0, ..EngineParams::default() });
        let model = DemandModel::new(w.setup()).unwrap();
        let ctx = DecisionContext::new(&w);
        let mut r = rng(1);
        for _ in 0..50 {
            assert!(model.arrivals(SiteId(0), &ctx, &mut r).is_empty());
        }
    }

    #[test]
    fn arrivals_spawn_within_radius_and_order() {
        let w = world(params());
        let model = DemandModel::new(w.setup()).unwrap();
        let ctx = DecisionContext::new(&w);
        let center = w.setup().site(SiteId(0)).location;
        let radius = w.setup().params.customer_radius_m;
        let mut r = rng(3);
        let mut seen = 0;
        for _ in 0..100 {
            for d in model.arrivals(SiteId(0), &ctx, &mut r) {
                let Decision::PlaceOrder { position, satisfaction_bias, brand, item } = d else {
                    panic!("order_probability 1 produced {d:?}");
                };
                assert!(position.distance_m(center) <= radius + 1.0);
                assert!((-1.0..=1.0).contains(&satisfaction_bias));
                assert_eq!(w.setup().menu_item(item).brand, brand);
                seen += 1;
            }
        }
        // Poisson(4) over 100 ticks.
        assert!(seen > 250, "only {seen} arrivals");
    }

    #[test]
    fn no_appetite_means_browsing() {
        let w = world(EngineParams { order_probability: 0.0, ..params() });
        let model = DemandModel::new(w.setup()).unwrap();
        let ctx = DecisionContext::new(&w);
        let mut r = rng(5);
        let all: Vec<Decision> = (0..20).flat_map(|_| model.arrivals(SiteId(0), &ctx, &mut r)).collect();
        assert!(!all.is_empty());
        assert!(all.iter().all(|d| matches!(d, Decision::Browse { .. })));
    }

    #[test]
    fn price_sensitivity_favours_cheap_items() {
        let w = world(EngineParams { price_sensitivity: 20.0, ..params() });
        let setup = w.setup();
        let model = DemandModel::new(setup).unwrap();
        let ctx = DecisionContext::new(&w);
        let mut r = rng(11);
        let (mut cheap, mut dear) = (0u32, 0u32);
        for _ in 0..300 {
            for d in model.arrivals(SiteId(0), &ctx, &mut r) {
                if let Decision::PlaceOrder { brand, item, .. } = d {
                    let items = &setup.brand(brand).items;
                    let prices: Vec<f64> = items.iter().map(|&i| setup.menu_item(i).price).collect();
                    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
                    if setup.menu_item(item).price < mean {
                        cheap += 1;
                    } else if setup.menu_item(item).price > mean {
                        dear += 1;
                    }
                }
            }
        }
        assert!(cheap > dear, "cheap {cheap} vs dear {dear}");
    }

    #[test]
    fn default_preparation_is_expected_duration() {
        let w = world(EngineParams::default());
        let model = DemandModel::new(w.setup()).unwrap();
        let p = model.preparation_ticks(&instruction(10), &staff(0.0, 1.0), &mut rng(0));
        assert_eq!((p.ticks, p.rework), (10, false));
        let p = model.preparation_ticks(&instruction(0), &staff(0.0, 1.0), &mut rng(0));
        assert_eq!(p.ticks, 1);
    }

    #[test]
    fn understaffing_and_rework_lengthen_steps() {
        let w = world(EngineParams { error_penalty: 0.5, ..EngineParams::default() });
        let model = DemandModel::new(w.setup()).unwrap();
        let p = model.preparation_ticks(&instruction(10), &staff(0.0, 0.5), &mut rng(0));
        assert_eq!(p.ticks, 20);
        let p = model.preparation_ticks(&instruction(10), &staff(1.0, 1.0), &mut rng(0));
        assert_eq!((p.ticks, p.rework), (15, true));
    }

    fn delivered_order(eta: u64, delivered: u64) -> Order {
        let mut o = Order::new(
            gk_core::OrderId(0),
            AgentId(5),
            gk_core::BrandId(0),
            gk_core::MenuItemId(0),
            GeoPoint::new(52.37, 4.9),
            Tick(0),
            1,
        );
        o.state = OrderState::Delivered;
        o.eta_ticks = Some(eta);
        o.delivered_at = Some(Tick(delivered));
        o
    }

    fn customer(bias: f64) -> Customer {
        Customer {
            id: AgentId(5),
            site: SiteId(0),
            position: GeoPoint::new(52.37, 4.9),
            satisfaction_bias: bias,
            arrived: Tick(0),
            order: Some(gk_core::OrderId(0)),
            done: false,
        }
    }

    #[test]
    fn feedback_respects_rate_and_range() {
        let quiet = world(EngineParams { feedback_rate: 0.0, ..EngineParams::default() });
        let model = DemandModel::new(quiet.setup()).unwrap();
        let ctx = DecisionContext::new(&quiet);
        assert!(model.feedback(&delivered_order(5, 10), &customer(0.0), &ctx, &mut rng(2)).is_none());

        let chatty = world(EngineParams { feedback_rate: 1.0, ..EngineParams::default() });
        let model = DemandModel::new(chatty.setup()).unwrap();
        let ctx = DecisionContext::new(&chatty);
        let mut r = rng(2);
        for bias in [-1.0, 0.0, 1.0] {
            let f = model.feedback(&delivered_order(5, 500), &customer(bias), &ctx, &mut r).unwrap();
            assert!((1..=5).contains(&f.rating));
        }
        let late = model.feedback(&delivered_order(5, 5000), &customer(0.0), &ctx, &mut r).unwrap();
        assert_eq!(late.rating, 1);
    }

    #[test]
    fn reconsider_cancels_only_when_enabled() {
        let w = world(EngineParams { cancel_probability: 1.0, ..EngineParams::default() });
        let model = DemandModel::new(w.setup()).unwrap();
        let ctx = DecisionContext::new(&w);
        let mut order = delivered_order(1, 1);
        order.state = OrderState::Queued;
        let d = model.reconsider(&customer(0.0), &order, &ctx, &mut rng(0));
        assert_eq!(d, Some(Decision::Cancel { order: order.id, reason: CancelReason::Customer }));

        order.state = OrderState::OutForDelivery;
        assert!(model.reconsider(&customer(0.0), &order, &ctx, &mut rng(0)).is_none());
    }
}

#[cfg(test)]
mod scripted {
    use super::helpers::{rng, world};
    use crate::{Decision, DecisionContext, DecisionModel, ScriptedModel};
    use gk_core::{GeoPoint, SiteId, Tick};
    use gk_setup::EngineParams;

    #[test]
    fn replays_only_at_scripted_tick() {
        let w = world(EngineParams::default());
        let item = &w.setup().menu_items[0];
        let order = Decision::PlaceOrder {
            position:          GeoPoint::new(52.37, 4.9),
            satisfaction_bias: 0.0,
            brand:             item.brand,
            item:              item.id,
        };
        let model = ScriptedModel::new().at(Tick(0), SiteId(0), order).at(Tick(3), SiteId(0), order);
        assert_eq!(model.len(), 2);

        let ctx = DecisionContext::new(&w);
        assert_eq!(model.arrivals(SiteId(0), &ctx, &mut rng(0)), vec![order]);
        assert!(model.arrivals(SiteId(1), &ctx, &mut rng(0)).is_empty());
        assert!(model.driver_available(&gk_world::Order::new(
            gk_core::OrderId(0),
            gk_core::AgentId(0),
            item.brand,
            item.id,
            GeoPoint::new(52.37, 4.9),
            Tick(0),
            1,
        ), &ctx, &mut rng(0)));
    }
}

//! Unit tests for gk-delivery.

#[cfg(test)]
mod helpers {
    use gk_core::{AgentId, AgentRng, StreamKey, StreamPurpose};
    use gk_setup::{BrandTemplate, EngineParams, SiteTemplate, template_source};
    use gk_spatial::SpatialIndex;

    pub fn index() -> SpatialIndex {
        let setup = template_source(&[SiteTemplate::Amsterdam], &[BrandTemplate::FastFood]).build().unwrap();
        SpatialIndex::build(&setup, None).unwrap()
    }

    pub fn quiet_params() -> EngineParams {
        EngineParams {
            base_delivery_ticks: 5,
            ticks_per_km: 3.0,
            traffic_variation: 0.0,
            weather_impact: 0.0,
            ..EngineParams::default()
        }
    }

    pub fn rng(seed: u64) -> AgentRng {
        AgentRng::new(seed, StreamKey::agent(AgentId(1), StreamPurpose::Traffic))
    }
}

#[cfg(test)]
mod estimate {
    use super::helpers::{index, quiet_params, rng};
    use crate::{EtaJob, EtaParams, RoutingError, distance_factor, estimate_batch, estimate_delivery_time};
    use gk_core::{GeoPoint, OrderId};
    use gk_setup::EngineParams;
    use proptest::prelude::*;

    const KITCHEN: GeoPoint = GeoPoint { lat: 52.3676, lon: 4.9041 };

    #[test]
    fn distance_factor_rounds_up() {
        assert_eq!(distance_factor(0.0, 3.0), 0);
        assert_eq!(distance_factor(1.0, 3.0), 1);
        assert_eq!(distance_factor(1000.0, 3.0), 3);
        assert_eq!(distance_factor(1001.0, 3.0), 4);
        assert_eq!(distance_factor(f64::NAN, 3.0), 0);
    }

    #[test]
    fn noiseless_eta_is_base_plus_distance() {
        let idx = index();
        let p = EtaParams::new(&quiet_params()).unwrap();
        let customer = KITCHEN.offset(0.0, 2_000.0);
        let est = estimate_delivery_time(KITCHEN, customer, &idx, &p, &mut rng(0)).unwrap();
        assert!((est.distance_m - 2_000.0).abs() < 1.0);
        assert_eq!(est.ticks, 5 + distance_factor(est.distance_m, 3.0));
    }

    #[test]
    fn eta_never_below_one() {
        let idx = index();
        let params = EngineParams {
            base_delivery_ticks: 0,
            traffic_variation: 50.0,
            ..EngineParams::default()
        };
        let p = EtaParams::new(&params).unwrap();
        let mut r = rng(9);
        for _ in 0..200 {
            let est = estimate_delivery_time(KITCHEN, KITCHEN, &idx, &p, &mut r).unwrap();
            assert!(est.ticks >= 1);
        }
    }

    #[test]
    fn same_stream_same_eta() {
        let idx = index();
        let p = EtaParams::new(&EngineParams { weather_impact: 4.0, ..EngineParams::default() }).unwrap();
        let to = KITCHEN.offset(1.0, 3_500.0);
        let a = estimate_delivery_time(KITCHEN, to, &idx, &p, &mut rng(3)).unwrap();
        let b = estimate_delivery_time(KITCHEN, to, &idx, &p, &mut rng(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_variation_rejected() {
        let err = EtaParams::new(&EngineParams { traffic_variation: -1.0, ..EngineParams::default() });
        assert!(matches!(err, Err(RoutingError::Parameter { name: "traffic_variation", .. })));
    }

    #[test]
    fn non_finite_variation_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let err = EtaParams::new(&EngineParams { traffic_variation: bad, ..EngineParams::default() });
            assert!(matches!(err, Err(RoutingError::Parameter { name: "traffic_variation", .. })), "{bad}");
        }
        assert!(EtaParams::new(&EngineParams { traffic_variation: 0.0, ..EngineParams::default() }).is_ok());
    }

    #[test]
    fn batch_keeps_request_order() {
        let idx = index();
        let p = EtaParams::new(&quiet_params()).unwrap();
        let jobs: Vec<EtaJob> = (0..6)
            .map(|i| EtaJob {
                order:    OrderId(10 - i),
                kitchen:  KITCHEN,
                customer: KITCHEN.offset(0.5, 500.0 * (i + 1) as f64),
                rng:      rng(i),
            })
            .collect();
        let out = estimate_batch(jobs, &idx, &p);
        let ids: Vec<u64> = out.iter().map(|(j, _)| j.order.0).collect();
        assert_eq!(ids, vec![10, 9, 8, 7, 6, 5]);
        let ticks: Vec<u64> = out.iter().map(|(_, r)| r.as_ref().unwrap().ticks).collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }

    proptest! {
        #[test]
        fn distance_factor_monotone(a in 0.0f64..100_000.0, b in 0.0f64..100_000.0, tpk in 0.1f64..20.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(distance_factor(lo, tpk) <= distance_factor(hi, tpk));
        }

        #[test]
        fn noiseless_eta_monotone_in_distance(d1 in 0.0f64..20_000.0, d2 in 0.0f64..20_000.0) {
            let idx = index();
            let p = EtaParams::new(&quiet_params()).unwrap();
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let a = estimate_delivery_time(KITCHEN, KITCHEN.offset(2.0, near), &idx, &p, &mut rng(0)).unwrap();
            let b = estimate_delivery_time(KITCHEN, KITCHEN.offset(2.0, far), &idx, &p, &mut rng(0)).unwrap();
            prop_assert!(a.ticks <= b.ticks);
        }
    }
}

#[cfg(test)]
mod tracker {
    use crate::{DeliveryTracker, InFlight, RoutingError};
    use gk_core::{AgentId, GeoPoint, KitchenId, OrderId, Tick};

    fn trip(departed: u64, arrival: u64) -> InFlight {
        InFlight {
            driver:     AgentId(3),
            kitchen:    KitchenId(0),
            from:       GeoPoint::new(52.0, 4.0),
            to:         GeoPoint::new(52.0, 4.2),
            departed:   Tick(departed),
            arrival:    Tick(arrival),
            distance_m: 13_700.0,
        }
    }

    #[test]
    fn due_in_ascending_order_id() {
        let mut t = DeliveryTracker::new();
        t.dispatch(OrderId(9), trip(0, 3)).unwrap();
        t.dispatch(OrderId(2), trip(1, 3)).unwrap();
        t.dispatch(OrderId(5), trip(1, 8)).unwrap();
        assert!(t.due(Tick(2)).is_empty());
        assert_eq!(t.due(Tick(3)), vec![OrderId(2), OrderId(9)]);
        assert!(t.complete(OrderId(2)).is_some());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn duplicate_dispatch_rejected() {
        let mut t = DeliveryTracker::new();
        t.dispatch(OrderId(1), trip(0, 2)).unwrap();
        assert!(matches!(t.dispatch(OrderId(1), trip(0, 2)), Err(RoutingError::AlreadyInFlight(_))));
    }

    #[test]
    fn progress_and_position() {
        let tr = trip(10, 14);
        assert_eq!(tr.progress(Tick(10)), 0.0);
        assert_eq!(tr.progress(Tick(12)), 0.5);
        assert_eq!(tr.progress(Tick(99)), 1.0);
        assert!((tr.position(Tick(12)).lon - 4.1).abs() < 1e-12);
    }
}

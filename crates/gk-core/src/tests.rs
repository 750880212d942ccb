//! Unit tests for gk-core primitives.

#[cfg(test)]
mod ids {
    use crate::{KitchenId, OrderId, StationId};

    #[test]
    fn none_sentinel_is_max() {
        assert_eq!(KitchenId::NONE.0, u32::MAX);
        assert_eq!(OrderId::NONE.0, u64::MAX);
        assert!(StationId::default().is_none());
        assert!(!StationId(0).is_none());
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(KitchenId(3).to_string(), "kitchen#3");
        assert_eq!(OrderId(12).to_string(), "order#12");
    }

    #[test]
    fn try_from_usize() {
        assert_eq!(StationId::try_from(9usize).unwrap(), StationId(9));
        assert!(KitchenId::try_from(usize::MAX).is_err());
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn one_degree_latitude() {
        let a = GeoPoint::new(40.0, -74.0);
        let b = GeoPoint::new(41.0, -74.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 300.0, "got {d}");
    }

    #[test]
    fn offset_lands_at_requested_distance() {
        let origin = GeoPoint::new(40.7128, -74.0060);
        for bearing in [0.0, 1.0, 2.5, 4.0, 6.0] {
            let p = origin.offset(bearing, 2_500.0);
            let d = origin.distance_m(p);
            assert!((d - 2_500.0).abs() < 1.0, "bearing {bearing}: {d}");
        }
    }

    #[test]
    fn checked_rejects_out_of_range() {
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, f64::NAN).is_err());
        assert!(GeoPoint::checked(45.0, 179.9).is_ok());
    }

    #[test]
    fn lerp_clamps_to_the_segment() {
        let a = GeoPoint::new(52.0, 4.0);
        let b = GeoPoint::new(53.0, 5.0);
        let mid = a.lerp(b, 0.5);
        assert!((mid.lat - 52.5).abs() < 1e-12 && (mid.lon - 4.5).abs() < 1e-12);
        assert_eq!(a.lerp(b, -1.0), a);
        assert_eq!(a.lerp(b, 3.0), b);
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(10) + 4, Tick(14));
        assert_eq!(Tick(14).since(Tick(10)), 4);
        assert_eq!(Tick(3).since(Tick(10)), 0);
        assert_eq!(Tick(3).next(), Tick(4));
    }

    #[test]
    fn progress_between_saturates() {
        assert_eq!(Tick(5).progress_between(Tick(0), Tick(10)), 0.5);
        assert_eq!(Tick(0).progress_between(Tick(2), Tick(10)), 0.0);
        assert_eq!(Tick(30).progress_between(Tick(0), Tick(10)), 1.0);
        assert_eq!(Tick(4).progress_between(Tick(4), Tick(4)), 1.0);
    }

    #[test]
    fn clock_maps_ticks_to_wall_time() {
        let mut clock = SimClock::new(1_000, 60);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), Tick(2));
        assert_eq!(clock.current_unix_secs(), 1_120);
        assert_eq!(clock.ticks_for_secs(61), 2);
    }

    #[test]
    fn snapshot_ticks_include_last() {
        let cfg = SimConfig { duration_ticks: 25, snapshot_interval_ticks: 10, ..SimConfig::default() };
        let ticks: Vec<u64> = (0..25).filter(|&t| cfg.is_snapshot_tick(Tick(t))).collect();
        assert_eq!(ticks, vec![9, 19, 24]);
    }

    #[test]
    fn zero_interval_rejected() {
        let cfg = SimConfig { snapshot_interval_ticks: 0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, RngRegistry, SiteId, StreamKey, StreamOwner, StreamPurpose};

    #[test]
    fn same_key_same_sequence() {
        let mut a = RngRegistry::new(7);
        let mut b = RngRegistry::new(7);
        let key = StreamKey::agent(AgentId(3), StreamPurpose::Ordering);
        for _ in 0..50 {
            assert_eq!(a.stream(key).unit(), b.stream(key).unit());
        }
    }

    #[test]
    fn streams_independent_of_creation_order() {
        let k1 = StreamKey::agent(AgentId(1), StreamPurpose::Traffic);
        let k2 = StreamKey::site(SiteId(0), StreamPurpose::Arrivals);

        let mut a = RngRegistry::new(99);
        let a1 = a.stream(k1).unit();
        let a2 = a.stream(k2).unit();

        let mut b = RngRegistry::new(99);
        let b2 = b.stream(k2).unit();
        let b1 = b.stream(k1).unit();

        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
    }

    #[test]
    fn purposes_and_owners_diverge() {
        let mut r = RngRegistry::new(1);
        let x = r.agent(AgentId(0), StreamPurpose::Driver).unit();
        let y = r.agent(AgentId(0), StreamPurpose::Feedback).unit();
        let z = r.stream(StreamKey::site(SiteId(0), StreamPurpose::Driver)).unit();
        assert_ne!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn checkout_restore_continues_sequence() {
        let key = StreamKey::agent(AgentId(5), StreamPurpose::Traffic);
        let mut straight = RngRegistry::new(3);
        let expected: Vec<f64> = (0..4).map(|_| straight.stream(key).unit()).collect();

        let mut r = RngRegistry::new(3);
        let first = r.stream(key).unit();
        let mut taken = r.checkout(key);
        let second = taken.unit();
        r.restore(key, taken);
        let rest: Vec<f64> = (0..2).map(|_| r.stream(key).unit()).collect();

        assert_eq!(vec![first, second, rest[0], rest[1]], expected);
    }

    #[test]
    fn retire_drops_all_purposes() {
        let mut r = RngRegistry::new(0);
        r.agent(AgentId(2), StreamPurpose::Ordering);
        r.agent(AgentId(2), StreamPurpose::Feedback);
        r.agent(AgentId(3), StreamPurpose::Ordering);
        r.retire(StreamOwner::Agent(AgentId(2)));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn gen_bool_extremes() {
        let mut r = RngRegistry::new(0);
        let s = r.agent(AgentId(0), StreamPurpose::Driver);
        assert!(!s.gen_bool(0.0));
        assert!(s.gen_bool(1.0));
        assert!(!s.gen_bool(f64::NAN));
    }
}

//! Unit tests for the station scheduler.

#[cfg(test)]
mod helpers {
    use gk_core::{KitchenId, OrderId, StationTypeId, Tick};
    use gk_setup::{KitchenRecord, SetupSource, SimulationSetup, SiteRecord, StationRecord};

    use crate::StationRequest;

    /// One kitchen (plus an idle second one) with `(type, capacity)` stations.
    pub fn setup(stations: &[(&str, u32)]) -> SimulationSetup {
        let kitchen = |id: &str, stations: &[(&str, u32)]| KitchenRecord {
            id:       id.into(),
            name:     id.into(),
            brands:   vec![],
            stations: stations
                .iter()
                .enumerate()
                .map(|(i, &(ty, capacity))| StationRecord {
                    id: format!("{id}-{i}"),
                    name: ty.into(),
                    station_type: ty.into(),
                    capacity,
                })
                .collect(),
        };
        SetupSource {
            sites: vec![SiteRecord {
                id:        "s".into(),
                name:      "s".into(),
                latitude:  52.0,
                longitude: 4.0,
                kitchens:  vec![kitchen("k0", stations), kitchen("k1", &[("stove", 1)])],
            }],
            ..SetupSource::default()
        }
        .build()
        .unwrap()
    }

    pub fn ty(setup: &SimulationSetup, name: &str) -> StationTypeId {
        setup.station_type_id(name).unwrap()
    }

    pub fn req(order: u64, ty: StationTypeId, created: u64, requested: u64) -> StationRequest {
        StationRequest {
            order: OrderId(order),
            kitchen: KitchenId(0),
            station_type: ty,
            step: 0,
            created: Tick(created),
            requested: Tick(requested),
        }
    }
}

#[cfg(test)]
mod admission {
    use super::helpers::{req, setup, ty};
    use crate::{Admission, SchedulerError, StationBoard, StationState};
    use gk_core::{KitchenId, OrderId, StationId, Tick};

    #[test]
    fn fifo_by_creation_tick() {
        // One stove, capacity 1: order 1 (tick 0) before order 2 (tick 1).
        let s = setup(&[("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);

        assert_eq!(board.request_start(req(1, stove, 0, 0)).unwrap(), Admission::Granted(StationId(0)));
        assert_eq!(board.request_start(req(2, stove, 1, 1)).unwrap(), Admission::Queued);
        assert!(board.evaluate(Tick(1)).is_empty());

        assert_eq!(board.release(KitchenId(0), OrderId(1)).unwrap(), Some(StationId(0)));
        let grants = board.evaluate(Tick(5));
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].order, OrderId(2));
        assert_eq!(grants[0].waited, 4);
    }

    #[test]
    fn queue_order_is_request_then_creation_then_id() {
        let s = setup(&[("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);
        board.request_start(req(100, stove, 0, 0)).unwrap(); // holds the stove

        board.request_start(req(9, stove, 3, 4)).unwrap();
        board.request_start(req(7, stove, 2, 4)).unwrap();
        board.request_start(req(8, stove, 2, 4)).unwrap();
        board.request_start(req(5, stove, 9, 3)).unwrap();

        let kb = board.kitchen(KitchenId(0)).unwrap();
        let order: Vec<u64> = kb.queue(stove).map(|r| r.order.0).collect();
        assert_eq!(order, vec![5, 7, 8, 9]);
    }

    #[test]
    fn newcomer_does_not_jump_the_queue() {
        let s = setup(&[("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);
        board.request_start(req(1, stove, 0, 0)).unwrap();
        board.request_start(req(2, stove, 0, 0)).unwrap();
        board.release(KitchenId(0), OrderId(1)).unwrap();

        // The slot is free but order 2 is waiting.
        assert_eq!(board.request_start(req(3, stove, 1, 1)).unwrap(), Admission::Queued);
        let grants = board.evaluate(Tick(1));
        assert_eq!(grants.iter().map(|g| g.order.0).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn capacity_allows_parallel_work() {
        let s = setup(&[("workstation", 2), ("stove", 1)]);
        let ws = ty(&s, "workstation");
        let mut board = StationBoard::new(&s);
        assert!(matches!(board.request_start(req(1, ws, 0, 0)).unwrap(), Admission::Granted(_)));
        assert!(matches!(board.request_start(req(2, ws, 0, 0)).unwrap(), Admission::Granted(_)));
        assert_eq!(board.request_start(req(3, ws, 0, 0)).unwrap(), Admission::Queued);

        let kb = board.kitchen(KitchenId(0)).unwrap();
        assert_eq!(kb.stations()[0].state(), StationState::Busy(2));
        assert_eq!(kb.stations()[1].state(), StationState::Idle);
        let stats = kb.stats();
        assert_eq!((stats.busy_slots, stats.total_slots, stats.queued), (2, 3, 1));
        assert!((stats.utilization() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn lowest_index_free_station_wins() {
        let s = setup(&[("stove", 1), ("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);
        board.request_start(req(1, stove, 0, 0)).unwrap();
        board.request_start(req(2, stove, 0, 0)).unwrap();
        board.release(KitchenId(0), OrderId(1)).unwrap();
        assert_eq!(board.request_start(req(3, stove, 0, 1)).unwrap(), Admission::Granted(StationId(0)));
    }

    #[test]
    fn withdraw_removes_queued_request() {
        let s = setup(&[("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);
        board.request_start(req(1, stove, 0, 0)).unwrap();
        board.request_start(req(2, stove, 0, 0)).unwrap();
        assert!(board.withdraw(KitchenId(0), OrderId(2)).unwrap());
        assert!(!board.withdraw(KitchenId(0), OrderId(2)).unwrap());
        board.release(KitchenId(0), OrderId(1)).unwrap();
        assert!(board.evaluate(Tick(2)).is_empty());
        assert_eq!(board.total_queued(), 0);
    }

    #[test]
    fn rejects_duplicates_and_missing_types() {
        let s = setup(&[("stove", 1), ("oven", 1)]);
        let stove = ty(&s, "stove");
        let oven = ty(&s, "oven");
        let mut board = StationBoard::new(&s);
        board.request_start(req(1, stove, 0, 0)).unwrap();
        assert!(matches!(board.request_start(req(1, stove, 0, 0)), Err(SchedulerError::DuplicateRequest(_))));

        let mut r = req(2, oven, 0, 0);
        r.kitchen = KitchenId(1);
        assert!(matches!(board.request_start(r), Err(SchedulerError::NoStationOfType { .. })));
        r.kitchen = KitchenId(9);
        let err = board.request_start(r).unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownKitchen(_)));
        assert_eq!(err.to_string(), "kitchen#9 is not on the board");
    }
}

#[cfg(test)]
mod saturation {
    use super::helpers::{req, setup, ty};
    use crate::StationBoard;
    use gk_core::{KitchenId, OrderId};

    #[test]
    fn reported_once_per_episode() {
        let s = setup(&[("stove", 1)]);
        let stove = ty(&s, "stove");
        let mut board = StationBoard::new(&s);
        board.request_start(req(1, stove, 0, 0)).unwrap();

        assert!(board.track_saturation(3).is_empty());
        assert!(board.track_saturation(3).is_empty());
        assert_eq!(board.track_saturation(3), vec![(KitchenId(0), 3)]);
        assert!(board.track_saturation(3).is_empty());

        board.release(KitchenId(0), OrderId(1)).unwrap();
        assert!(board.track_saturation(3).is_empty());
        board.request_start(req(2, stove, 0, 0)).unwrap();
        for _ in 0..2 {
            assert!(board.track_saturation(3).is_empty());
        }
        assert_eq!(board.track_saturation(3).len(), 1);
    }
}

#[cfg(test)]
mod capacity_property {
    use proptest::prelude::*;

    use super::helpers::{req, setup, ty};
    use crate::{Admission, StationBoard};
    use gk_core::{KitchenId, OrderId, Tick};

    proptest! {
        /// Random arrivals and completions never push a station past capacity,
        /// and every order waits for a grant before it is released.
        #[test]
        fn occupancy_never_exceeds_capacity(ops in proptest::collection::vec((any::<bool>(), 0u8..3), 1..200)) {
            let s = setup(&[("stove", 2), ("oven", 1), ("stove", 1)]);
            let types = [ty(&s, "stove"), ty(&s, "oven"), ty(&s, "stove")];
            let mut board = StationBoard::new(&s);
            let mut running: Vec<OrderId> = Vec::new();
            let mut next = 0u64;

            for (t, (arrive, which)) in ops.into_iter().enumerate() {
                let now = Tick(t as u64);
                if arrive || running.is_empty() {
                    let r = req(next, types[which as usize], t as u64, t as u64);
                    if let Admission::Granted(_) = board.request_start(r).unwrap() {
                        running.push(r.order);
                    }
                    next += 1;
                } else {
                    let done = running.remove(which as usize % running.len());
                    prop_assert!(board.release(KitchenId(0), done).unwrap().is_some());
                }
                running.extend(board.evaluate(now).into_iter().map(|g| g.order));
                prop_assert!(board.check_invariants().is_ok());
                let kb = board.kitchen(KitchenId(0)).unwrap();
                for st in kb.stations() {
                    prop_assert!(st.occupied() <= st.capacity);
                }
            }
        }
    }
}

//! Station occupancy and request queues.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::{debug, error};

use gk_core::{KitchenId, OrderId, StationId, StationTypeId, Tick};
use gk_setup::SimulationSetup;

use crate::{
    Admission, Grant, KitchenStats, QueueKey, SchedulerError, SchedulerResult, StationRequest,
    StationSlot, StationView,
};

// ── KitchenBoard ──────────────────────────────────────────────────────────────

/// Scheduler state for one kitchen.  Kitchens share nothing, so boards can be
/// evaluated independently.
#[derive(Debug, Clone)]
pub struct KitchenBoard {
    kitchen:             KitchenId,
    stations:            Vec<StationSlot>,
    queues:              BTreeMap<StationTypeId, BTreeMap<QueueKey, StationRequest>>,
    /// Queued order -> where its request sits.
    queued:              FxHashMap<OrderId, (StationTypeId, QueueKey)>,
    /// Running order -> index into `stations`.
    running:             FxHashMap<OrderId, usize>,
    saturated_for:       u64,
    saturation_reported: bool,
}

impl KitchenBoard {
    pub fn new(setup: &SimulationSetup, kitchen: KitchenId) -> Self {
        let stations = setup
            .kitchen(kitchen)
            .stations
            .iter()
            .map(|&id| {
                let st = setup.station(id);
                StationSlot {
                    id,
                    station_type: st.station_type,
                    capacity: st.capacity,
                    occupants: Vec::with_capacity(st.capacity as usize),
                }
            })
            .collect();
        Self {
            kitchen,
            stations,
            queues: BTreeMap::new(),
            queued: FxHashMap::default(),
            running: FxHashMap::default(),
            saturated_for: 0,
            saturation_reported: false,
        }
    }

    #[inline]
    pub fn kitchen(&self) -> KitchenId {
        self.kitchen
    }

    pub fn stations(&self) -> &[StationSlot] {
        &self.stations
    }

    /// Ask for a slot.  Granted on the spot only if nobody of the same type
    /// is already waiting and a slot is free; otherwise the request joins the
    /// back of its queue and is picked up by [`evaluate`](Self::evaluate).
    pub fn request_start(&mut self, req: StationRequest) -> SchedulerResult<Admission> {
        if self.queued.contains_key(&req.order) || self.running.contains_key(&req.order) {
            return Err(SchedulerError::DuplicateRequest(req.order));
        }
        if !self.stations.iter().any(|s| s.station_type == req.station_type) {
            return Err(SchedulerError::NoStationOfType {
                kitchen:      self.kitchen,
                station_type: req.station_type,
            });
        }

        let nobody_waiting = self.queues.get(&req.station_type).is_none_or(|q| q.is_empty());
        if nobody_waiting {
            if let Some(slot) = self.free_slot(req.station_type) {
                return Ok(Admission::Granted(self.occupy(slot, req.order)));
            }
        }

        let key = req.key();
        self.queues.entry(req.station_type).or_default().insert(key, req);
        self.queued.insert(req.order, (req.station_type, key));
        Ok(Admission::Queued)
    }

    /// Free the slot held by `order`.
    pub fn release(&mut self, order: OrderId) -> Option<StationId> {
        let slot = self.running.remove(&order)?;
        let station = &mut self.stations[slot];
        station.occupants.retain(|&o| o != order);
        Some(station.id)
    }

    /// Drop a queued request (order cancelled).  Returns whether one existed.
    pub fn withdraw(&mut self, order: OrderId) -> bool {
        let Some((ty, key)) = self.queued.remove(&order) else {
            return false;
        };
        if let Some(q) = self.queues.get_mut(&ty) {
            q.remove(&key);
        }
        true
    }

    /// Grant queued requests, per type in queue order, while slots last.
    pub fn evaluate(&mut self, now: Tick) -> Vec<Grant> {
        let mut grants = Vec::new();
        let types: Vec<StationTypeId> = self.queues.keys().copied().collect();
        for ty in types {
            while let Some(slot) = self.free_slot(ty) {
                let Some((_, req)) = self.queues.get_mut(&ty).and_then(|q| q.pop_first()) else {
                    break;
                };
                self.queued.remove(&req.order);
                let station = self.occupy(slot, req.order);
                grants.push(Grant {
                    order: req.order,
                    kitchen: self.kitchen,
                    station,
                    step: req.step,
                    tick: now,
                    waited: now.since(req.requested),
                });
            }
        }
        if !grants.is_empty() {
            debug!(kitchen = %self.kitchen, grants = grants.len(), tick = %now, "queued steps granted");
        }
        grants
    }

    pub fn holds(&self, order: OrderId) -> Option<StationId> {
        self.running.get(&order).map(|&slot| self.stations[slot].id)
    }

    pub fn is_queued(&self, order: OrderId) -> bool {
        self.queued.contains_key(&order)
    }

    pub fn queue_len(&self, ty: StationTypeId) -> usize {
        self.queues.get(&ty).map_or(0, BTreeMap::len)
    }

    /// Queued requests of one type, head first.
    pub fn queue(&self, ty: StationTypeId) -> impl Iterator<Item = &StationRequest> {
        self.queues.get(&ty).into_iter().flat_map(|q| q.values())
    }

    pub fn stats(&self) -> KitchenStats {
        KitchenStats {
            kitchen:     self.kitchen,
            queued:      self.queued.len(),
            in_progress: self.running.len(),
            busy_slots:  self.stations.iter().map(StationSlot::occupied).sum(),
            total_slots: self.stations.iter().map(|s| s.capacity).sum(),
        }
    }

    /// Count consecutive fully-utilized ticks.  Returns the streak length
    /// once per episode, when it first reaches `threshold`.
    pub fn track_saturation(&mut self, threshold: u64) -> Option<u64> {
        let stats = self.stats();
        if stats.total_slots > 0 && stats.busy_slots == stats.total_slots {
            self.saturated_for += 1;
        } else {
            self.saturated_for = 0;
            self.saturation_reported = false;
        }
        if threshold > 0 && self.saturated_for >= threshold && !self.saturation_reported {
            self.saturation_reported = true;
            return Some(self.saturated_for);
        }
        None
    }

    pub fn check_invariants(&self) -> SchedulerResult<()> {
        for station in &self.stations {
            if station.occupants.len() > station.capacity as usize {
                error!(station = %station.id, kitchen = %self.kitchen, "station over capacity");
                return Err(SchedulerError::InvariantViolation {
                    station:  station.id,
                    occupied: station.occupants.len(),
                    capacity: station.capacity,
                });
            }
            for (i, order) in station.occupants.iter().enumerate() {
                if station.occupants[..i].contains(order) {
                    return Err(SchedulerError::DoubleBooking { order: *order, station: station.id });
                }
            }
        }
        Ok(())
    }

    pub fn station_views(&self) -> impl Iterator<Item = StationView> + '_ {
        self.stations.iter().map(move |s| StationView {
            station:      s.id,
            kitchen:      self.kitchen,
            station_type: s.station_type,
            capacity:     s.capacity,
            state:        s.state(),
            occupants:    s.occupants.clone(),
        })
    }

    fn free_slot(&self, ty: StationTypeId) -> Option<usize> {
        self.stations
            .iter()
            .position(|s| s.station_type == ty && s.has_free_slot())
    }

    fn occupy(&mut self, slot: usize, order: OrderId) -> StationId {
        let station = &mut self.stations[slot];
        station.occupants.push(order);
        self.running.insert(order, slot);
        station.id
    }
}

// ── StationBoard ──────────────────────────────────────────────────────────────

/// Every kitchen's board, indexed by `KitchenId`.
#[derive(Debug, Clone)]
pub struct StationBoard {
    kitchens: Vec<KitchenBoard>,
}

impl StationBoard {
    pub fn new(setup: &SimulationSetup) -> Self {
        Self {
            kitchens: setup.kitchens.iter().map(|k| KitchenBoard::new(setup, k.id)).collect(),
        }
    }

    pub fn kitchens(&self) -> &[KitchenBoard] {
        &self.kitchens
    }

    pub fn kitchen(&self, id: KitchenId) -> SchedulerResult<&KitchenBoard> {
        self.kitchens.get(id.index()).ok_or(SchedulerError::UnknownKitchen(id))
    }

    pub fn kitchen_mut(&mut self, id: KitchenId) -> SchedulerResult<&mut KitchenBoard> {
        self.kitchens.get_mut(id.index()).ok_or(SchedulerError::UnknownKitchen(id))
    }

    pub fn request_start(&mut self, req: StationRequest) -> SchedulerResult<Admission> {
        self.kitchen_mut(req.kitchen)?.request_start(req)
    }

    pub fn release(&mut self, kitchen: KitchenId, order: OrderId) -> SchedulerResult<Option<StationId>> {
        Ok(self.kitchen_mut(kitchen)?.release(order))
    }

    pub fn withdraw(&mut self, kitchen: KitchenId, order: OrderId) -> SchedulerResult<bool> {
        Ok(self.kitchen_mut(kitchen)?.withdraw(order))
    }

    /// Evaluate every kitchen.  Grants come back in kitchen order, then in
    /// each kitchen's own grant order, however the work was scheduled.
    pub fn evaluate(&mut self, now: Tick) -> Vec<Grant> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            let per_kitchen: Vec<Vec<Grant>> =
                self.kitchens.par_iter_mut().map(|k| k.evaluate(now)).collect();
            per_kitchen.into_iter().flatten().collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.kitchens.iter_mut().flat_map(|k| k.evaluate(now)).collect()
        }
    }

    pub fn check_invariants(&self) -> SchedulerResult<()> {
        self.kitchens.iter().try_for_each(KitchenBoard::check_invariants)
    }

    pub fn stats(&self) -> Vec<KitchenStats> {
        self.kitchens.iter().map(KitchenBoard::stats).collect()
    }

    /// Kitchens whose saturation streak just reached `threshold`.
    pub fn track_saturation(&mut self, threshold: u64) -> Vec<(KitchenId, u64)> {
        self.kitchens
            .iter_mut()
            .filter_map(|k| k.track_saturation(threshold).map(|n| (k.kitchen, n)))
            .collect()
    }

    pub fn station_views(&self) -> impl Iterator<Item = StationView> + '_ {
        self.kitchens.iter().flat_map(KitchenBoard::station_views)
    }

    pub fn total_queued(&self) -> usize {
        self.kitchens.iter().map(|k| k.queued.len()).sum()
    }

    pub fn total_running(&self) -> usize {
        self.kitchens.iter().map(|k| k.running.len()).sum()
    }
}

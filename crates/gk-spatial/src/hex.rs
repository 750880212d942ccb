//! Kitchens bucketed by H3 cell.
//!
//! A query starts at the cell containing the point and widens one grid ring
//! at a time.  Ring distance only approximates metric distance, so once `k`
//! candidates are in hand the search keeps widening until the nearest point
//! any unvisited ring could hold is provably farther than the current k-th
//! candidate.  Results are sorted by exact great-circle distance, ties by
//! `KitchenId`.
//!
//! If `max_ring` is reached first the query falls back to a full scan, so a
//! sparse network never returns a silently truncated answer.

use h3o::{CellIndex, LatLng, Resolution};
use rustc_hash::FxHashMap;

use gk_core::{GeoPoint, KitchenId};
use gk_setup::SimulationSetup;

use crate::{SpatialError, SpatialResult};

/// Fraction of the ideal ring lower bound trusted when pruning.  Covers H3's
/// cell-size distortion across a region.
const RING_BOUND_SAFETY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub kitchen:    KitchenId,
    pub distance_m: f64,
}

pub struct HexIndex {
    resolution: Resolution,
    max_ring:   u32,
    cells:      FxHashMap<CellIndex, Vec<KitchenId>>,
    positions:  Vec<GeoPoint>,
}

impl HexIndex {
    /// Index every kitchen at its site's coordinate.
    pub fn build(setup: &SimulationSetup, resolution: u8, max_ring: u32) -> SpatialResult<Self> {
        let resolution =
            Resolution::try_from(resolution).map_err(|_| SpatialError::InvalidResolution(resolution))?;
        let mut index = Self {
            resolution,
            max_ring,
            cells: FxHashMap::default(),
            positions: Vec::with_capacity(setup.kitchens.len()),
        };
        for kitchen in &setup.kitchens {
            let pos = setup.kitchen_location(kitchen.id);
            let cell = index.cell_of(pos)?;
            index.cells.entry(cell).or_default().push(kitchen.id);
            index.positions.push(pos);
        }
        Ok(index)
    }

    pub fn resolution(&self) -> u8 {
        u8::from(self.resolution)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_of(&self, p: GeoPoint) -> SpatialResult<CellIndex> {
        let ll = LatLng::new(p.lat, p.lon)
            .map_err(|_| SpatialError::InvalidCoordinate { lat: p.lat, lon: p.lon })?;
        Ok(ll.to_cell(self.resolution))
    }

    /// Raw 64-bit H3 index of the cell containing `p`.
    pub fn cell_id(&self, p: GeoPoint) -> SpatialResult<u64> {
        self.cell_of(p).map(u64::from)
    }

    pub fn kitchen_position(&self, kitchen: KitchenId) -> GeoPoint {
        self.positions[kitchen.index()]
    }

    pub fn nearest_kitchens(&self, p: GeoPoint, k: usize) -> SpatialResult<Vec<Neighbor>> {
        self.nearest_kitchens_where(p, k, |_| true)
    }

    /// Up to `k` nearest kitchens accepted by `eligible`.
    pub fn nearest_kitchens_where<F>(&self, p: GeoPoint, k: usize, eligible: F) -> SpatialResult<Vec<Neighbor>>
    where
        F: Fn(KitchenId) -> bool,
    {
        let origin = self.cell_of(p)?;
        if k == 0 || self.positions.is_empty() {
            return Ok(Vec::new());
        }
        let spacing = cell_spacing_m(origin);

        let mut found: Vec<Neighbor> = Vec::new();

        for ring in 0..=self.max_ring {
            for cell in ring_cells(origin, ring) {
                if let Some(kitchens) = self.cells.get(&cell) {
                    for &kitchen in kitchens {
                        if eligible(kitchen) {
                            found.push(Neighbor {
                                kitchen,
                                distance_m: p.distance_m(self.positions[kitchen.index()]),
                            });
                        }
                    }
                }
            }

            if found.len() >= k {
                sort_neighbors(&mut found);
                let kth = found[k - 1].distance_m;
                if ring_lower_bound_m(ring + 1, spacing) > kth {
                    found.truncate(k);
                    return Ok(found);
                }
            }
        }

        // Ring budget exhausted: answer exactly with a scan.
        let mut all: Vec<Neighbor> = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| Neighbor { kitchen: KitchenId(i as u32), distance_m: p.distance_m(pos) })
            .filter(|n| eligible(n.kitchen))
            .collect();
        sort_neighbors(&mut all);
        all.truncate(k);
        Ok(all)
    }
}

/// The cells exactly `ring` steps from `origin`.  The fast ring walk gives
/// up near pentagons; there the disk is filtered by grid distance instead.
pub(crate) fn ring_cells(origin: CellIndex, ring: u32) -> Vec<CellIndex> {
    if ring == 0 {
        return vec![origin];
    }
    match origin.grid_ring_fast(ring).collect::<Option<Vec<_>>>() {
        Some(cells) => cells,
        None => origin
            .grid_disk_distances_safe(ring)
            .filter(|&(_, d)| d == ring)
            .map(|(c, _)| c)
            .collect(),
    }
}

fn sort_neighbors(v: &mut [Neighbor]) {
    v.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m).then(a.kitchen.cmp(&b.kitchen)));
}

/// Centre-to-centre distance between `cell` and one of its neighbours.
fn cell_spacing_m(cell: CellIndex) -> f64 {
    let centre = LatLng::from(cell);
    let here = GeoPoint::new(centre.lat(), centre.lng());
    cell.grid_disk_safe(1)
        .filter(|&c| c != cell)
        .map(|c| {
            let ll = LatLng::from(c);
            here.distance_m(GeoPoint::new(ll.lat(), ll.lng()))
        })
        .fold(f64::INFINITY, f64::min)
}

/// Smallest distance from the query point to any point in a cell `ring`
/// steps away.  Ring `r` centres sit at least `r * spacing * sqrt(3)/2` from
/// the origin centre; the query point and the target may each lie up to one
/// circumradius (`spacing / sqrt(3)`) off their cell centres.
fn ring_lower_bound_m(ring: u32, spacing: f64) -> f64 {
    const HALF_SQRT3: f64 = 0.866_025_403_784_438_6;
    const INV_SQRT3: f64 = 0.577_350_269_189_625_8;
    let bound = spacing * (ring as f64 * HALF_SQRT3 - 2.0 * INV_SQRT3);
    (bound * RING_BOUND_SAFETY).max(0.0)
}

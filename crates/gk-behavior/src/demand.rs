//! The default stochastic demand model.

use std::f64::consts::TAU;

use rand_distr::{Poisson, WeightedIndex};
use tracing::debug;

use gk_core::{AgentRng, BrandId, GeoPoint, MenuItemId, SiteId};
use gk_setup::{EngineParams, Instruction, SimulationSetup};
use gk_world::{CancelReason, Customer, KitchenStaff, Order};

use crate::{
    BehaviorError, BehaviorResult, Decision, DecisionContext, DecisionModel, Feedback, Preparation,
};

/// Poisson arrivals per site, weighted brand and item choice, and the
/// per-tick probabilities from `EngineParams`.
///
/// Brand weights are the number of items a brand sells.  Within a brand an
/// item's weight is `1 / (1 + price_sensitivity * price / mean_price)`, so
/// cheaper items are preferred more strongly as sensitivity grows.
#[derive(Debug, Clone)]
pub struct DemandModel {
    params:       EngineParams,
    /// `None` when the arrival rate is zero.
    arrivals:     Option<Poisson<f64>>,
    brands:       Option<WeightedIndex<f64>>,
    brand_ids:    Vec<BrandId>,
    /// Per brand: item ids and their choice distribution.
    menus:        Vec<Option<(Vec<MenuItemId>, WeightedIndex<f64>)>>,
    /// Per menu item: sum of expected step durations.
    recipe_ticks: Vec<u64>,
}

impl DemandModel {
    pub fn new(setup: &SimulationSetup) -> BehaviorResult<Self> {
        let params = setup.params.clone();
        let arrivals = if params.arrival_rate > 0.0 {
            Some(Poisson::new(params.arrival_rate).map_err(|e| BehaviorError::Parameter {
                name:   "arrival_rate",
                reason: e.to_string(),
            })?)
        } else {
            None
        };

        let brand_ids: Vec<BrandId> = setup.brands.iter().map(|b| b.id).collect();
        let brands = WeightedIndex::new(setup.brands.iter().map(|b| b.items.len() as f64)).ok();
        let menus = setup
            .brands
            .iter()
            .map(|b| {
                let items = &b.items;
                if items.is_empty() {
                    return None;
                }
                let prices: Vec<f64> = items.iter().map(|&i| setup.menu_item(i).price).collect();
                let mean = prices.iter().sum::<f64>() / prices.len() as f64;
                let weights = prices.iter().map(|&p| {
                    if mean > 0.0 {
                        1.0 / (1.0 + params.price_sensitivity.max(0.0) * p / mean)
                    } else {
                        1.0
                    }
                });
                WeightedIndex::new(weights).ok().map(|w| (items.clone(), w))
            })
            .collect();
        let recipe_ticks = setup
            .menu_items
            .iter()
            .map(|m| m.instructions.iter().map(|i| i.expected_duration.max(1)).sum())
            .collect();

        debug!(
            arrival_rate = params.arrival_rate,
            brands = brand_ids.len(),
            "demand model ready"
        );
        Ok(Self { params, arrivals, brands, brand_ids, menus, recipe_ticks })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// A uniform point within `customer_radius_m` of `center`.
    fn spawn_position(&self, center: GeoPoint, rng: &mut AgentRng) -> GeoPoint {
        let r = self.params.customer_radius_m.max(0.0) * rng.unit().sqrt();
        let bearing = rng.unit() * TAU;
        center.offset(bearing, r)
    }

    fn choose(&self, rng: &mut AgentRng) -> Option<(BrandId, MenuItemId)> {
        let b = rng.sample(self.brands.as_ref()?);
        let (items, weights) = self.menus.get(b)?.as_ref()?;
        let i = rng.sample(weights);
        Some((self.brand_ids[b], items[i]))
    }
}

impl DecisionModel for DemandModel {
    fn arrivals(&self, site: SiteId, ctx: &DecisionContext<'_>, rng: &mut AgentRng) -> Vec<Decision> {
        let Some(poisson) = &self.arrivals else {
            return Vec::new();
        };
        let count: f64 = rng.sample(poisson);
        let center = ctx.setup().site(site).location;

        (0..count as u64)
            .map(|_| {
                let position = self.spawn_position(center, rng);
                let satisfaction_bias = rng.gen_range(-1.0..=1.0);
                let choice = if rng.gen_bool(self.params.order_probability) {
                    self.choose(rng)
                } else {
                    None
                };
                match choice {
                    Some((brand, item)) => Decision::PlaceOrder { position, satisfaction_bias, brand, item },
                    None => Decision::Browse { position, satisfaction_bias },
                }
            })
            .collect()
    }

    fn reconsider(
        &self,
        _customer: &Customer,
        order:     &Order,
        _ctx:      &DecisionContext<'_>,
        rng:       &mut AgentRng,
    ) -> Option<Decision> {
        if self.params.cancel_probability <= 0.0 || !order.state.is_pre_dispatch() {
            return None;
        }
        rng.gen_bool(self.params.cancel_probability)
            .then_some(Decision::Cancel { order: order.id, reason: CancelReason::Customer })
    }

    fn driver_available(&self, _order: &Order, _ctx: &DecisionContext<'_>, rng: &mut AgentRng) -> bool {
        rng.gen_bool(self.params.driver_availability)
    }

    /// Ratings start at 4, move with the customer's bias, and drop as the
    /// order runs late against its recipe time plus the quoted ETA.
    fn feedback(
        &self,
        order:    &Order,
        customer: &Customer,
        _ctx:     &DecisionContext<'_>,
        rng:      &mut AgentRng,
    ) -> Option<Feedback> {
        if !rng.gen_bool(self.params.feedback_rate) {
            return None;
        }
        let actual = order.fulfilment_ticks()? as f64;
        let expected = self.recipe_ticks.get(order.item.index()).copied().unwrap_or(0)
            + order.eta_ticks.unwrap_or(0);
        let expected = expected.max(1) as f64;
        let lateness = ((actual - expected) / expected).max(0.0);
        let noise = rng.unit() - 0.5;
        let score = 4.0 + customer.satisfaction_bias - 2.0 * lateness + noise;
        Some(Feedback { rating: score.round().clamp(1.0, 5.0) as u8 })
    }

    /// `ceil(expected / staffing_level)`, plus `ceil(expected * error_penalty)`
    /// when the step has to be reworked.
    fn preparation_ticks(
        &self,
        instruction: &Instruction,
        staff:       &KitchenStaff,
        rng:         &mut AgentRng,
    ) -> Preparation {
        let expected = instruction.expected_duration.max(1) as f64;
        let staffing = if staff.staffing_level > 0.0 { staff.staffing_level.min(1.0) } else { 1.0 };
        let mut ticks = (expected / staffing).ceil();
        let rework = staff.error_rate > 0.0 && rng.gen_bool(staff.error_rate);
        if rework {
            ticks += (expected * self.params.error_penalty.max(0.0)).ceil();
        }
        Preparation { ticks: (ticks as u64).max(1), rework }
    }
}

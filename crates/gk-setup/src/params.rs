//! Engine parameters, read from `simulation.json`.
//!
//! Every field has a default, so an absent file or `{}` is a valid
//! configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Run ──────────────────────────────────────────────────────────────
    pub seed:                    u64,
    pub tick_duration_secs:      u32,
    pub start_unix_secs:         i64,
    pub snapshot_interval_ticks: u64,
    pub log_interval_ticks:      u64,

    // ── Spatial ──────────────────────────────────────────────────────────
    /// H3 resolution, 0..=15.
    pub hex_resolution:          u8,
    /// Ring-expansion limit before falling back to a full scan.
    pub max_ring:                u32,
    /// Orders farther than this from every eligible kitchen are cancelled.
    pub max_delivery_distance_m: f64,

    // ── Demand ───────────────────────────────────────────────────────────
    /// Mean customer arrivals per site per tick (Poisson).
    pub arrival_rate:            f64,
    pub order_probability:       f64,
    pub price_sensitivity:       f64,
    pub customer_radius_m:       f64,
    /// Per-tick chance a waiting customer gives up before dispatch.
    pub cancel_probability:      f64,

    // ── Fulfilment ───────────────────────────────────────────────────────
    /// Per-tick chance a driver is found for a ready order.
    pub driver_availability:     f64,
    pub feedback_rate:           f64,
    pub kitchen_error_rate:      f64,
    /// Fraction of a step's duration added when the step has to be redone.
    pub error_penalty:           f64,
    /// In (0, 1]; step durations are divided by it.
    pub staffing_level:          f64,

    // ── Routing ──────────────────────────────────────────────────────────
    pub base_delivery_ticks:     u64,
    pub ticks_per_km:            f64,
    /// Standard deviation of traffic noise, ticks.
    pub traffic_variation:       f64,
    /// Upper bound of weather delay, ticks.
    pub weather_impact:          f64,

    // ── Watchlists ───────────────────────────────────────────────────────
    pub queue_watch_threshold:   u64,
    pub saturation_warn_ticks:   u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            seed:                    42,
            tick_duration_secs:      60,
            start_unix_secs:         0,
            snapshot_interval_ticks: 60,
            log_interval_ticks:      60,
            hex_resolution:          8,
            max_ring:                20,
            max_delivery_distance_m: 25_000.0,
            arrival_rate:            0.5,
            order_probability:       0.6,
            price_sensitivity:       1.0,
            customer_radius_m:       3_000.0,
            cancel_probability:      0.0,
            driver_availability:     0.8,
            feedback_rate:           0.3,
            kitchen_error_rate:      0.0,
            error_penalty:           0.5,
            staffing_level:          1.0,
            base_delivery_ticks:     5,
            ticks_per_km:            3.0,
            traffic_variation:       1.0,
            weather_impact:          0.0,
            queue_watch_threshold:   30,
            saturation_warn_ticks:   30,
        }
    }
}

impl EngineParams {
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, p) in [
            ("order_probability", self.order_probability),
            ("cancel_probability", self.cancel_probability),
            ("driver_availability", self.driver_availability),
            ("feedback_rate", self.feedback_rate),
            ("kitchen_error_rate", self.kitchen_error_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(name, format!("{p} is not a probability")));
            }
        }
        for (name, v) in [
            ("arrival_rate", self.arrival_rate),
            ("price_sensitivity", self.price_sensitivity),
            ("customer_radius_m", self.customer_radius_m),
            ("max_delivery_distance_m", self.max_delivery_distance_m),
            ("error_penalty", self.error_penalty),
            ("ticks_per_km", self.ticks_per_km),
            ("traffic_variation", self.traffic_variation),
            ("weather_impact", self.weather_impact),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(name, format!("{v} must be finite and >= 0")));
            }
        }
        if !(self.staffing_level > 0.0 && self.staffing_level <= 1.0) {
            return Err(invalid("staffing_level", format!("{} is outside (0, 1]", self.staffing_level)));
        }
        if self.hex_resolution > 15 {
            return Err(invalid("hex_resolution", format!("{} exceeds 15", self.hex_resolution)));
        }
        if self.tick_duration_secs == 0 {
            return Err(invalid("tick_duration_secs", "must be > 0".into()));
        }
        if self.snapshot_interval_ticks == 0 {
            return Err(invalid("snapshot_interval_ticks", "must be > 0".into()));
        }
        if self.log_interval_ticks == 0 {
            return Err(invalid("log_interval_ticks", "must be > 0".into()));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter { name, reason }
}

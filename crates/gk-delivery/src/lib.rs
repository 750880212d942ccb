//! `gk-delivery`: how long a delivery takes, and which ones are on the road.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`estimate`] | `EtaParams`, `distance_factor`, `estimate_delivery_time`  |
//! | [`tracker`]  | `DeliveryTracker`: in-flight deliveries by order          |
//! | [`error`]    | `RoutingError`, `RoutingResult<T>`                        |
//!
//! # Delivery model
//!
//! A delivery is a straight hand-off: the driver leaves the kitchen at the
//! dispatch tick and is at the customer `eta` ticks later.  In between,
//! [`DeliveryTracker::progress`] gives the fraction covered so snapshots can
//! place the driver along the way.

pub mod error;
pub mod estimate;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use error::{RoutingError, RoutingResult};
pub use estimate::{EtaJob, EtaParams, Estimate, distance_factor, estimate_batch, estimate_delivery_time};
pub use tracker::{DeliveryTracker, InFlight};

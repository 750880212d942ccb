//! `gk-core`: shared vocabulary for the ghost-kitchen simulation engine.
//!
//! Every other `gk-*` crate depends on this one.  It has no `gk-*`
//! dependencies of its own.
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`ids`]     | arena indices: `SiteId`, `KitchenId`, `StationId`, ...     |
//! | [`geo`]     | `GeoPoint`, haversine distance, radial offsets             |
//! | [`time`]    | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]     | `AgentRng`, `RngRegistry`, `StreamKey`, `StreamPurpose`    |
//! | [`error`]   | `CoreError`, `CoreResult`                                  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{AgentId, BrandId, IngredientId, KitchenId, MenuItemId, OrderId, SiteId, StationId, StationTypeId};
pub use rng::{AgentRng, RngRegistry, StreamKey, StreamOwner, StreamPurpose};
pub use time::{SimClock, SimConfig, Tick};

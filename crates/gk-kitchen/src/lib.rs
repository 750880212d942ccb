//! `gk-kitchen`: who gets which station slot, and when.
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`request`] | `StationRequest`, `QueueKey`, `Admission`, `Grant`           |
//! | [`station`] | `StationSlot`, `StationState` (Idle / Busy)                  |
//! | [`board`]   | `KitchenBoard` (one kitchen), `StationBoard` (all kitchens)  |
//! | [`stats`]   | `KitchenStats`, `StationView`                                |
//! | [`error`]   | `SchedulerError`, `SchedulerResult<T>`                       |
//!
//! # Admission policy
//!
//! Each kitchen keeps one queue per station type, ordered by
//! [`QueueKey`]: the tick the step was requested, then the order's creation
//! tick, then the order id.  Every evaluation walks each queue from the head
//! and grants while a station of that type has a free slot, taking the
//! lowest-index such station.  A request that cannot be served stays queued
//! until a slot frees up or the order is withdrawn.  Grants are never
//! preempted.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `StationBoard::evaluate` fans kitchens out over Rayon.    |

pub mod board;
pub mod error;
pub mod request;
pub mod station;
pub mod stats;

#[cfg(test)]
mod tests;

pub use board::{KitchenBoard, StationBoard};
pub use error::{SchedulerError, SchedulerResult};
pub use request::{Admission, Grant, QueueKey, StationRequest};
pub use station::{StationSlot, StationState};
pub use stats::{KitchenStats, StationView};

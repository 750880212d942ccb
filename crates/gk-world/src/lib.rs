//! `gk-world`: everything that changes during a run.
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`order`]  | `Order`, `OrderState`, `CancelReason`, `StepTiming`           |
//! | [`agent`]  | `Agent` (Customer / Driver / KitchenStaff), `AgentStore`      |
//! | [`event`]  | `Event`, `EventSubject`, `EventPayload`, `EventLog`           |
//! | [`metrics`]| `Metrics` running counters                                    |
//! | [`txn`]    | `TickTxn`: one tick's staged changes                          |
//! | [`world`]  | `World`: owner of all of the above, `commit`                  |
//! | [`error`]  | `WorldError`, `WorldResult<T>`                                |
//!
//! Components never mutate a `World` directly during a tick.  They read it,
//! stage their changes in a [`TickTxn`], and the clock commits the
//! transaction in one step, so no component ever observes a half-applied
//! tick.

pub mod agent;
pub mod error;
pub mod event;
pub mod metrics;
pub mod order;
pub mod txn;
pub mod world;


pub use agent::{Agent, AgentRole, AgentStore, Customer, Driver, DriverStatus, KitchenStaff};
pub use error::{WorldError, WorldResult};
pub use event::{Event, EventLog, EventPayload, EventSubject};
pub use metrics::Metrics;
pub use order::{CancelReason, Order, OrderState, StepTiming};
pub use txn::TickTxn;
pub use world::World;

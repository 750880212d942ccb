//! `gk-spatial`: where things are and how far apart.
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`hex`]     | `HexIndex`: kitchens bucketed by H3 cell, ring search       |
//! | [`network`] | `RoadNetwork` (CSR + R-tree), builder, CSV loader           |
//! | [`router`]  | `Router` trait, `GreatCircleRouter`, `RoadRouter`           |
//! | [`index`]   | `SpatialIndex`: hex index + router behind one handle        |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! Distances are metres throughout.  Converting distance to time is the
//! delivery crate's job, not this one's.

pub mod error;
pub mod hex;
pub mod index;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use hex::{HexIndex, Neighbor};
pub use index::SpatialIndex;
pub use network::{EdgeId, NodeId, RoadNetwork, RoadNetworkBuilder, load_road_network};
pub use router::{GreatCircleRouter, RoadRouter, Route, Router};

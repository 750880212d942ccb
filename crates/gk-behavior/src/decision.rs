use gk_core::{BrandId, GeoPoint, MenuItemId, OrderId};
use gk_world::CancelReason;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// A customer arrived and looked around without ordering.
    Browse { position: GeoPoint, satisfaction_bias: f64 },
    /// A customer arrived and ordered one item.
    PlaceOrder {
        position:          GeoPoint,
        satisfaction_bias: f64,
        brand:             BrandId,
        item:              MenuItemId,
    },
    Cancel { order: OrderId, reason: CancelReason },
}

impl Decision {
    pub fn is_arrival(&self) -> bool {
        matches!(self, Decision::Browse { .. } | Decision::PlaceOrder { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    /// 1 to 5 stars.
    pub rating: u8,
}

/// Outcome of a staff member working one recipe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preparation {
    pub ticks:  u64,
    /// The step had to be partly redone.
    pub rework: bool,
}

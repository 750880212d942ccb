//! Arena indices for every entity in the simulation.
//!
//! Relations between entities (kitchen to site, order to kitchen, station to
//! kitchen) are stored as these indices and resolved through the lookup
//! tables in `SimulationSetup` and `World`.  Nothing owns anything across an
//! entity boundary, so the Kitchen/Brand many-to-many association carries no
//! ownership cycle.

use std::fmt;

macro_rules! arena_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty) => $label:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel for "not assigned".
            pub const NONE: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_none(self) -> bool {
                self == Self::NONE
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::NONE
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

arena_id! {
    /// Index into `SimulationSetup::sites`.
    pub struct SiteId(u32) => "site";
}

arena_id! {
    /// Index into `SimulationSetup::kitchens`.
    pub struct KitchenId(u32) => "kitchen";
}

arena_id! {
    /// Index into `SimulationSetup::stations`.  Unique across all kitchens.
    pub struct StationId(u32) => "station";
}

arena_id! {
    /// Interned station capability tag ("stove", "workstation", ...).
    pub struct StationTypeId(u32) => "station-type";
}

arena_id! {
    pub struct BrandId(u32) => "brand";
}

arena_id! {
    /// Index into `SimulationSetup::menu_items`.  Unique across all brands.
    pub struct MenuItemId(u32) => "item";
}

arena_id! {
    pub struct IngredientId(u32) => "ingredient";
}

arena_id! {
    /// Index of a live agent (customer, driver, or kitchen staff) in the
    /// world's agent arena.
    pub struct AgentId(u32) => "agent";
}

arena_id! {
    /// Monotonic order number, assigned in creation order.  Creation order is
    /// also the scheduler's FIFO tie-break, so ids are never reused.
    pub struct OrderId(u64) => "order";
}

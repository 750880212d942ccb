//! The resolved, read-only setup graph.
//!
//! All cross references are arena indices into the flat `Vec`s of
//! [`SimulationSetup`].  The graph is built once and shared behind an `Arc`
//! for the whole run; nothing in the engine holds a `&mut` to it.

use gk_core::{
    BrandId, GeoPoint, IngredientId, KitchenId, MenuItemId, SiteId, StationId, StationTypeId,
};

use crate::EngineParams;

#[derive(Debug, Clone)]
pub struct Site {
    pub id:       SiteId,
    pub key:      String,
    pub name:     String,
    pub location: GeoPoint,
    pub kitchens: Vec<KitchenId>,
}

#[derive(Debug, Clone)]
pub struct Kitchen {
    pub id:       KitchenId,
    pub key:      String,
    pub name:     String,
    pub site:     SiteId,
    /// In declaration order.  The scheduler hands out the lowest free one.
    pub stations: Vec<StationId>,
    pub brands:   Vec<BrandId>,
}

#[derive(Debug, Clone)]
pub struct Station {
    pub id:           StationId,
    pub key:          String,
    pub name:         String,
    pub kitchen:      KitchenId,
    pub station_type: StationTypeId,
    pub capacity:     u32,
}

#[derive(Debug, Clone)]
pub struct Ingredient {
    pub id:          IngredientId,
    pub key:         String,
    pub name:        String,
    pub description: String,
    pub price:       f64,
    pub image_url:   Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct IngredientQuantity {
    pub ingredient: IngredientId,
    pub quantity:   f64,
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub step:              String,
    pub description:       String,
    pub station_type:      StationTypeId,
    pub expected_duration: u64,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub id:           MenuItemId,
    pub key:          String,
    pub brand:        BrandId,
    pub name:         String,
    pub description:  String,
    pub price:        f64,
    pub image_url:    Option<String>,
    pub ingredients:  Vec<IngredientQuantity>,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone)]
pub struct Brand {
    pub id:          BrandId,
    pub key:         String,
    pub name:        String,
    pub description: String,
    pub category:    String,
    pub items:       Vec<MenuItemId>,
    /// Reverse of `Kitchen::brands`, filled in at load.
    pub kitchens:    Vec<KitchenId>,
}

#[derive(Debug, Clone)]
pub struct SimulationSetup {
    pub sites:         Vec<Site>,
    pub kitchens:      Vec<Kitchen>,
    pub stations:      Vec<Station>,
    pub ingredients:   Vec<Ingredient>,
    pub brands:        Vec<Brand>,
    pub menu_items:    Vec<MenuItem>,
    /// Interned station type names, indexed by `StationTypeId`.
    pub station_types: Vec<String>,
    pub params:        EngineParams,
}

impl SimulationSetup {
    #[inline]
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.index()]
    }

    #[inline]
    pub fn kitchen(&self, id: KitchenId) -> &Kitchen {
        &self.kitchens[id.index()]
    }

    #[inline]
    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.index()]
    }

    #[inline]
    pub fn brand(&self, id: BrandId) -> &Brand {
        &self.brands[id.index()]
    }

    #[inline]
    pub fn menu_item(&self, id: MenuItemId) -> &MenuItem {
        &self.menu_items[id.index()]
    }

    pub fn station_type_name(&self, id: StationTypeId) -> &str {
        self.station_types.get(id.index()).map_or("?", String::as_str)
    }

    pub fn station_type_id(&self, name: &str) -> Option<StationTypeId> {
        self.station_types
            .iter()
            .position(|t| t == name)
            .and_then(|i| StationTypeId::try_from(i).ok())
    }

    /// Location of the site a kitchen belongs to.
    #[inline]
    pub fn kitchen_location(&self, id: KitchenId) -> GeoPoint {
        self.site(self.kitchen(id).site).location
    }

    pub fn kitchen_has_type(&self, kitchen: KitchenId, ty: StationTypeId) -> bool {
        self.kitchen(kitchen)
            .stations
            .iter()
            .any(|&s| self.station(s).station_type == ty)
    }

    /// Whether `kitchen` serves the item's brand and has every station type
    /// its recipe needs.
    pub fn kitchen_can_prepare(&self, kitchen: KitchenId, item: MenuItemId) -> bool {
        let item = self.menu_item(item);
        self.kitchen(kitchen).brands.contains(&item.brand)
            && item
                .instructions
                .iter()
                .all(|ins| self.kitchen_has_type(kitchen, ins.station_type))
    }

    pub fn capable_kitchens(&self, item: MenuItemId) -> impl Iterator<Item = KitchenId> + '_ {
        let brand = self.menu_item(item).brand;
        self.brand(brand)
            .kitchens
            .iter()
            .copied()
            .filter(move |&k| self.kitchen_can_prepare(k, item))
    }

    /// Total station slots across all kitchens.
    pub fn total_slots(&self) -> u64 {
        self.stations.iter().map(|s| s.capacity as u64).sum()
    }
}

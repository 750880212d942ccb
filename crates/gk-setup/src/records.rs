//! On-disk shapes.
//!
//! ```text
//! <setup>/
//!   simulation.json     EngineParams, every field optional
//!   ingredients.csv     id,name,description,price,image_url
//!   sites/*.json        SiteRecord, kitchens and stations nested
//!   brands/*.json       BrandRecord, menu items nested
//! ```
//!
//! Ids here are the catalog's string ids.  They are resolved to arena
//! indices exactly once, in [`SetupSource::build`](crate::SetupSource::build).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub id:          String,
    pub name:        String,
    #[serde(default)]
    pub description: String,
    pub price:       f64,
    #[serde(default)]
    pub image_url:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id:        String,
    pub name:      String,
    pub latitude:  f64,
    pub longitude: f64,
    #[serde(default)]
    pub kitchens:  Vec<KitchenRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenRecord {
    pub id:       String,
    pub name:     String,
    /// Ids of the brands this kitchen produces for.
    #[serde(default)]
    pub brands:   Vec<String>,
    #[serde(default)]
    pub stations: Vec<StationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id:           String,
    pub name:         String,
    pub station_type: String,
    /// Concurrent instructions; 1 when omitted.
    #[serde(default = "default_capacity")]
    pub capacity:     u32,
}

fn default_capacity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRecord {
    pub id:          String,
    pub name:        String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category:    String,
    #[serde(default)]
    pub items:       Vec<MenuItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRecord {
    pub id:           String,
    pub name:         String,
    #[serde(default)]
    pub description:  String,
    pub price:        f64,
    #[serde(default)]
    pub image_url:    Option<String>,
    #[serde(default)]
    pub ingredients:  Vec<IngredientQuantityRecord>,
    #[serde(default)]
    pub instructions: Vec<InstructionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQuantityRecord {
    pub ingredient_ref: String,
    pub quantity:       f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub step:              String,
    #[serde(default)]
    pub description:       String,
    pub required_station:  String,
    /// Ticks.
    pub expected_duration: u64,
}

//! Built-in starter setups for `ghost-kitchen init` and for tests.

use std::fmt;

use crate::records::{
    BrandRecord, IngredientQuantityRecord, IngredientRecord, InstructionRecord, KitchenRecord,
    MenuItemRecord, SiteRecord, StationRecord,
};
use crate::{EngineParams, SetupSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteTemplate {
    Amsterdam,
    Berlin,
    London,
}

impl SiteTemplate {
    pub const ALL: [SiteTemplate; 3] = [SiteTemplate::Amsterdam, SiteTemplate::Berlin, SiteTemplate::London];

    fn coordinates(self) -> (f64, f64) {
        match self {
            SiteTemplate::Amsterdam => (52.3676, 4.9041),
            SiteTemplate::Berlin => (52.5200, 13.4050),
            SiteTemplate::London => (51.5072, -0.1276),
        }
    }

    fn slug(self) -> &'static str {
        match self {
            SiteTemplate::Amsterdam => "amsterdam",
            SiteTemplate::Berlin => "berlin",
            SiteTemplate::London => "london",
        }
    }
}

impl fmt::Display for SiteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandTemplate {
    Asian,
    FastFood,
    Mexican,
}

impl BrandTemplate {
    pub const ALL: [BrandTemplate; 3] = [BrandTemplate::Asian, BrandTemplate::FastFood, BrandTemplate::Mexican];

    fn slug(self) -> &'static str {
        match self {
            BrandTemplate::Asian => "asian",
            BrandTemplate::FastFood => "fast-food",
            BrandTemplate::Mexican => "mexican",
        }
    }

    fn record(self) -> BrandRecord {
        let (name, category, items) = match self {
            BrandTemplate::Asian => (
                "Wok This Way",
                "asian",
                vec![
                    item("pad-thai", "Pad Thai", 12.5, &[("rice-noodles", 1.0), ("egg", 1.0)], &[
                        ("prep", "workstation", 3),
                        ("wok", "stove", 5),
                        ("plate", "workstation", 1),
                    ]),
                    item("spring-rolls", "Spring Rolls", 6.0, &[("rice-paper", 4.0)], &[
                        ("roll", "workstation", 4),
                        ("fry", "stove", 3),
                    ]),
                ],
            ),
            BrandTemplate::FastFood => (
                "Burger Lab",
                "fast-food",
                vec![
                    item("classic-burger", "Classic Burger", 11.0, &[("beef-patty", 1.0), ("bun", 1.0)], &[
                        ("assemble", "workstation", 2),
                        ("grill", "stove", 4),
                        ("wrap", "workstation", 1),
                    ]),
                    item("fries", "Fries", 4.0, &[("potato", 2.0)], &[("fry", "stove", 3)]),
                ],
            ),
            BrandTemplate::Mexican => (
                "Casa Tortilla",
                "mexican",
                vec![
                    item("burrito", "Burrito", 10.0, &[("tortilla", 1.0), ("beans", 1.0)], &[
                        ("fill", "workstation", 3),
                        ("sear", "stove", 2),
                        ("wrap", "workstation", 1),
                    ]),
                    item("quesadilla", "Quesadilla", 8.5, &[("tortilla", 2.0), ("cheese", 1.0)], &[
                        ("fill", "workstation", 2),
                        ("bake", "oven", 4),
                    ]),
                ],
            ),
        };
        BrandRecord {
            id: self.slug().to_owned(),
            name: name.to_owned(),
            description: format!("{name} delivery brand"),
            category: category.to_owned(),
            items,
        }
    }
}

impl fmt::Display for BrandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A starter network: every site gets two kitchens, and every selected brand
/// is served by at least one kitchen per site.
pub fn template_source(sites: &[SiteTemplate], brands: &[BrandTemplate]) -> SetupSource {
    let brand_keys: Vec<String> = brands.iter().map(|b| b.slug().to_owned()).collect();
    let (front, back) = brand_keys.split_at(brand_keys.len().div_ceil(2));
    let back = if back.is_empty() { front } else { back };

    let site_records = sites
        .iter()
        .map(|&site| {
            let (latitude, longitude) = site.coordinates();
            SiteRecord {
                id: site.slug().to_owned(),
                name: site.slug().to_owned(),
                latitude,
                longitude,
                kitchens: vec![
                    kitchen(site, "north", front, &[("workstation", 2), ("stove", 1), ("oven", 1)]),
                    kitchen(site, "south", back, &[("workstation", 1), ("stove", 1), ("oven", 1)]),
                ],
            }
        })
        .collect();

    SetupSource {
        params:      EngineParams::default(),
        ingredients: ingredients(),
        sites:       site_records,
        brands:      brands.iter().map(|b| b.record()).collect(),
    }
}

fn kitchen(site: SiteTemplate, name: &str, brands: &[String], stations: &[(&str, u32)]) -> KitchenRecord {
    KitchenRecord {
        id: format!("{}-{name}", site.slug()),
        name: format!("{} {name}", site.slug()),
        brands: brands.to_vec(),
        stations: stations
            .iter()
            .map(|&(ty, capacity)| StationRecord {
                id: format!("{}-{name}-{ty}", site.slug()),
                name: ty.to_owned(),
                station_type: ty.to_owned(),
                capacity,
            })
            .collect(),
    }
}

fn item(id: &str, name: &str, price: f64, ingredients: &[(&str, f64)], steps: &[(&str, &str, u64)]) -> MenuItemRecord {
    MenuItemRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        description: String::new(),
        price,
        image_url: None,
        ingredients: ingredients
            .iter()
            .map(|&(r, quantity)| IngredientQuantityRecord { ingredient_ref: r.to_owned(), quantity })
            .collect(),
        instructions: steps
            .iter()
            .map(|&(step, station, ticks)| InstructionRecord {
                step: step.to_owned(),
                description: String::new(),
                required_station: station.to_owned(),
                expected_duration: ticks,
            })
            .collect(),
    }
}

fn ingredients() -> Vec<IngredientRecord> {
    [
        ("rice-noodles", 0.8),
        ("egg", 0.3),
        ("rice-paper", 0.1),
        ("beef-patty", 2.0),
        ("bun", 0.4),
        ("potato", 0.2),
        ("tortilla", 0.3),
        ("beans", 0.5),
        ("cheese", 0.7),
    ]
    .into_iter()
    .map(|(id, price)| IngredientRecord {
        id: id.to_owned(),
        name: id.replace('-', " "),
        description: String::new(),
        price,
        image_url: None,
    })
    .collect()
}

//! Resolve string ids into arena indices and validate the result.

use std::collections::HashMap;

use tracing::{debug, info};

use gk_core::{
    BrandId, GeoPoint, IngredientId, KitchenId, MenuItemId, SiteId, StationId, StationTypeId,
};

use crate::model::{
    Brand, Ingredient, IngredientQuantity, Instruction, Kitchen, MenuItem, SimulationSetup, Site,
    Station,
};
use crate::records::{BrandRecord, IngredientRecord, SiteRecord};
use crate::{ConfigError, ConfigResult, EngineParams};

/// Unresolved setup, as read from disk or assembled in code.
#[derive(Debug, Clone, Default)]
pub struct SetupSource {
    pub params:      EngineParams,
    pub ingredients: Vec<IngredientRecord>,
    pub sites:       Vec<SiteRecord>,
    pub brands:      Vec<BrandRecord>,
}

impl SetupSource {
    /// Resolve and validate.  Any dangling reference is an error naming it.
    pub fn build(self) -> ConfigResult<SimulationSetup> {
        self.params.validate()?;

        let mut types = TypeInterner::default();

        // ── Ingredients ───────────────────────────────────────────────────
        let mut ingredient_ids: HashMap<String, IngredientId> = HashMap::new();
        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for rec in self.ingredients {
            let id = IngredientId(ingredients.len() as u32);
            unique(&mut ingredient_ids, "ingredient", &rec.id, id)?;
            ingredients.push(Ingredient {
                id,
                key: rec.id,
                name: rec.name,
                description: rec.description,
                price: rec.price,
                image_url: rec.image_url,
            });
        }

        // ── Brand ids first: kitchens reference them ──────────────────────
        let mut brand_ids: HashMap<String, BrandId> = HashMap::new();
        for (i, rec) in self.brands.iter().enumerate() {
            unique(&mut brand_ids, "brand", &rec.id, BrandId(i as u32))?;
        }
        let mut brand_kitchens: Vec<Vec<KitchenId>> = vec![Vec::new(); self.brands.len()];

        // ── Sites, kitchens, stations ─────────────────────────────────────
        let mut site_ids: HashMap<String, SiteId> = HashMap::new();
        let mut kitchen_ids: HashMap<String, KitchenId> = HashMap::new();
        let mut sites = Vec::with_capacity(self.sites.len());
        let mut kitchens = Vec::new();
        let mut stations = Vec::new();

        for rec in self.sites {
            let site_id = SiteId(sites.len() as u32);
            unique(&mut site_ids, "site", &rec.id, site_id)?;
            let location = GeoPoint::checked(rec.latitude, rec.longitude).map_err(|_| {
                ConfigError::InvalidCoordinate {
                    site: rec.id.clone(),
                    lat:  rec.latitude,
                    lon:  rec.longitude,
                }
            })?;

            let mut site_kitchens = Vec::with_capacity(rec.kitchens.len());
            for krec in rec.kitchens {
                let kitchen_id = KitchenId(kitchens.len() as u32);
                unique(&mut kitchen_ids, "kitchen", &krec.id, kitchen_id)?;

                let mut station_keys: HashMap<String, StationId> = HashMap::new();
                let mut kitchen_stations = Vec::with_capacity(krec.stations.len());
                for srec in krec.stations {
                    let station_id = StationId(stations.len() as u32);
                    unique(&mut station_keys, "station", &srec.id, station_id)?;
                    if srec.capacity == 0 {
                        return Err(ConfigError::ZeroCapacity { kitchen: krec.id, station: srec.id });
                    }
                    stations.push(Station {
                        id:           station_id,
                        key:          srec.id,
                        name:         srec.name,
                        kitchen:      kitchen_id,
                        station_type: types.intern(&srec.station_type),
                        capacity:     srec.capacity,
                    });
                    kitchen_stations.push(station_id);
                }

                let mut kitchen_brands = Vec::with_capacity(krec.brands.len());
                for bkey in &krec.brands {
                    let Some(&brand) = brand_ids.get(bkey) else {
                        return Err(ConfigError::UnknownBrand {
                            kitchen: krec.id.clone(),
                            brand:   bkey.clone(),
                        });
                    };
                    if !kitchen_brands.contains(&brand) {
                        kitchen_brands.push(brand);
                        brand_kitchens[brand.index()].push(kitchen_id);
                    }
                }

                kitchens.push(Kitchen {
                    id:       kitchen_id,
                    key:      krec.id,
                    name:     krec.name,
                    site:     site_id,
                    stations: kitchen_stations,
                    brands:   kitchen_brands,
                });
                site_kitchens.push(kitchen_id);
            }

            sites.push(Site {
                id: site_id,
                key: rec.id,
                name: rec.name,
                location,
                kitchens: site_kitchens,
            });
        }

        // ── Brands and menu items ─────────────────────────────────────────
        let mut item_ids: HashMap<String, MenuItemId> = HashMap::new();
        let mut brands = Vec::with_capacity(self.brands.len());
        let mut menu_items: Vec<MenuItem> = Vec::new();

        for (rec, serving) in self.brands.into_iter().zip(brand_kitchens) {
            let brand_id = BrandId(brands.len() as u32);
            let mut items = Vec::with_capacity(rec.items.len());

            for irec in rec.items {
                let item_id = MenuItemId(menu_items.len() as u32);
                unique(&mut item_ids, "menu item", &irec.id, item_id)?;

                let ingredients_resolved = irec
                    .ingredients
                    .iter()
                    .map(|q| match ingredient_ids.get(&q.ingredient_ref) {
                        Some(&ingredient) => Ok(IngredientQuantity { ingredient, quantity: q.quantity }),
                        None => Err(ConfigError::UnknownIngredient {
                            item:       irec.id.clone(),
                            ingredient: q.ingredient_ref.clone(),
                        }),
                    })
                    .collect::<ConfigResult<Vec<_>>>()?;

                let instructions = irec
                    .instructions
                    .into_iter()
                    .map(|ins| Instruction {
                        station_type:      types.intern(&ins.required_station),
                        step:              ins.step,
                        description:       ins.description,
                        expected_duration: ins.expected_duration,
                    })
                    .collect();

                menu_items.push(MenuItem {
                    id: item_id,
                    key: irec.id,
                    brand: brand_id,
                    name: irec.name,
                    description: irec.description,
                    price: irec.price,
                    image_url: irec.image_url,
                    ingredients: ingredients_resolved,
                    instructions,
                });
                items.push(item_id);
            }

            brands.push(Brand {
                id:          brand_id,
                key:         rec.id,
                name:        rec.name,
                description: rec.description,
                category:    rec.category,
                items,
                kitchens:    serving,
            });
        }

        let setup = SimulationSetup {
            sites,
            kitchens,
            stations,
            ingredients,
            brands,
            menu_items,
            station_types: types.names,
            params: self.params,
        };

        check_reachability(&setup)?;

        info!(
            sites = setup.sites.len(),
            kitchens = setup.kitchens.len(),
            stations = setup.stations.len(),
            brands = setup.brands.len(),
            menu_items = setup.menu_items.len(),
            "simulation setup validated"
        );
        Ok(setup)
    }
}

/// Every instruction's station type must exist in some kitchen serving the
/// brand, and every item must be preparable start to finish in one kitchen.
fn check_reachability(setup: &SimulationSetup) -> ConfigResult<()> {
    for item in &setup.menu_items {
        let brand = setup.brand(item.brand);
        for ins in &item.instructions {
            let reachable = brand
                .kitchens
                .iter()
                .any(|&k| setup.kitchen_has_type(k, ins.station_type));
            if !reachable {
                return Err(ConfigError::UnreachableStationType {
                    brand:        brand.key.clone(),
                    item:         item.key.clone(),
                    step:         ins.step.clone(),
                    station_type: setup.station_type_name(ins.station_type).to_owned(),
                });
            }
        }
        if setup.capable_kitchens(item.id).next().is_none() {
            return Err(ConfigError::NoCapableKitchen {
                brand: brand.key.clone(),
                item:  item.key.clone(),
            });
        }
        debug!(item = %item.key, brand = %brand.key, "menu item reachable");
    }
    Ok(())
}

fn unique<I: Copy>(
    seen: &mut HashMap<String, I>,
    kind: &'static str,
    key: &str,
    id: I,
) -> ConfigResult<()> {
    if seen.insert(key.to_owned(), id).is_some() {
        return Err(ConfigError::DuplicateId { kind, id: key.to_owned() });
    }
    Ok(())
}

#[derive(Default)]
struct TypeInterner {
    names: Vec<String>,
    ids:   HashMap<String, StationTypeId>,
}

impl TypeInterner {
    fn intern(&mut self, name: &str) -> StationTypeId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = StationTypeId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }
}

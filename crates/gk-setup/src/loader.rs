//! Read and write setup directories.
//!
//! Files under `sites/` and `brands/` are read in file-name order, so arena
//! indices (and with them every seeded stream) are stable across runs and
//! machines.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::records::{BrandRecord, IngredientRecord, SiteRecord};
use crate::{ConfigError, ConfigResult, EngineParams, SetupSource, SimulationSetup};

/// Free-form key/value options.  Only `ingredients_file` is interpreted;
/// anything else (store credentials, region, ...) is accepted and ignored.
pub type LoadOptions = BTreeMap<String, String>;

pub const SIMULATION_FILE: &str = "simulation.json";
pub const INGREDIENTS_FILE: &str = "ingredients.csv";
pub const SITES_DIR: &str = "sites";
pub const BRANDS_DIR: &str = "brands";

const KNOWN_OPTIONS: &[&str] = &["ingredients_file"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Load, resolve, and validate a setup directory.
pub fn load_setup_dir(dir: &Path, options: &LoadOptions) -> ConfigResult<SimulationSetup> {
    read_setup_dir(dir, options)?.build()
}

/// Read a setup directory without resolving references.
pub fn read_setup_dir(dir: &Path, options: &LoadOptions) -> ConfigResult<SetupSource> {
    if !dir.is_dir() {
        return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
    }
    for key in options.keys() {
        if KNOWN_OPTIONS.contains(&key.as_str()) {
            debug!(option = %key, "load option");
        } else {
            warn!(option = %key, "ignoring unrecognised load option");
        }
    }

    let sim_path = dir.join(SIMULATION_FILE);
    let params = if sim_path.is_file() {
        read_json::<EngineParams>(&sim_path)?
    } else {
        debug!(path = %sim_path.display(), "no simulation.json, using default parameters");
        EngineParams::default()
    };

    let ingredients_name = options
        .get("ingredients_file")
        .map_or(INGREDIENTS_FILE, String::as_str);
    let ingredients_path = dir.join(ingredients_name);
    let ingredients = if ingredients_path.is_file() {
        let file = fs::File::open(&ingredients_path).map_err(|e| io(&ingredients_path, e))?;
        read_ingredients(file, &ingredients_path)?
    } else {
        debug!(path = %ingredients_path.display(), "no ingredients file");
        Vec::new()
    };

    let sites: Vec<SiteRecord> = read_json_dir(&dir.join(SITES_DIR))?;
    let brands: Vec<BrandRecord> = read_json_dir(&dir.join(BRANDS_DIR))?;

    info!(
        dir = %dir.display(),
        sites = sites.len(),
        brands = brands.len(),
        ingredients = ingredients.len(),
        "read setup directory"
    );
    Ok(SetupSource { params, ingredients, sites, brands })
}

/// Parse `ingredients.csv` from any reader.  `origin` only labels errors.
pub fn read_ingredients<R: Read>(reader: R, origin: &Path) -> ConfigResult<Vec<IngredientRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<IngredientRecord>()
        .map(|row| row.map_err(|source| ConfigError::Csv { path: origin.to_path_buf(), source }))
        .collect()
}

/// Write `source` as a setup directory that [`read_setup_dir`] reads back.
/// Sites and brands get zero-padded file names to preserve their order.
pub fn write_setup_dir(source: &SetupSource, dir: &Path) -> ConfigResult<()> {
    fs::create_dir_all(dir.join(SITES_DIR)).map_err(|e| io(dir, e))?;
    fs::create_dir_all(dir.join(BRANDS_DIR)).map_err(|e| io(dir, e))?;

    write_json(&dir.join(SIMULATION_FILE), &source.params)?;

    let ingredients_path = dir.join(INGREDIENTS_FILE);
    let mut wtr = csv::Writer::from_path(&ingredients_path)
        .map_err(|source| ConfigError::Csv { path: ingredients_path.clone(), source })?;
    for rec in &source.ingredients {
        wtr.serialize(rec)
            .map_err(|source| ConfigError::Csv { path: ingredients_path.clone(), source })?;
    }
    wtr.flush().map_err(|e| io(&ingredients_path, e))?;

    for (i, site) in source.sites.iter().enumerate() {
        write_json(&dir.join(SITES_DIR).join(format!("{i:04}-{}.json", site.id)), site)?;
    }
    for (i, brand) in source.brands.iter().enumerate() {
        write_json(&dir.join(BRANDS_DIR).join(format!("{i:04}-{}.json", brand.id)), brand)?;
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let text = fs::read_to_string(path).map_err(|e| io(path, e))?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> ConfigResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, text).map_err(|e| io(path, e))
}

/// Every `*.json` in `dir`, sorted by file name.  A missing directory reads
/// as empty.
fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> ConfigResult<Vec<T>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "directory absent");
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| io(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| io(dir, e)))
        .collect::<ConfigResult<Vec<_>>>()?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    paths.iter().map(|p| read_json(p)).collect()
}

fn io(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io { path: path.to_path_buf(), source }
}

//! `gk-setup`: turns a configuration directory into an immutable
//! [`SimulationSetup`].
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`records`]    | serde shapes of the on-disk files                         |
//! | [`params`]     | `EngineParams` (`simulation.json`)                        |
//! | [`model`]      | resolved arena graph: `Site`, `Kitchen`, `Station`, ...   |
//! | [`assemble`]   | `SetupSource::build`: id resolution and validation        |
//! | [`template`]   | built-in starter networks for `init` and tests            |
//! | [`loader`]     | `load_setup_dir`, `read_setup_dir`, `write_setup_dir`     |
//! | [`error`]      | `ConfigError`, `ConfigResult<T>`                          |
//!
//! Every referential check runs before the engine is constructed, so a bad
//! setup never executes a single tick.

pub mod assemble;
pub mod error;
pub mod loader;
pub mod model;
pub mod params;
pub mod records;
pub mod template;


pub use assemble::SetupSource;
pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadOptions, load_setup_dir, read_setup_dir, write_setup_dir};
pub use model::{
    Brand, Ingredient, IngredientQuantity, Instruction, Kitchen, MenuItem, SimulationSetup, Site,
    Station,
};
pub use params::EngineParams;
pub use template::{BrandTemplate, SiteTemplate, template_source};
pub use records::{
    BrandRecord, IngredientQuantityRecord, IngredientRecord, InstructionRecord, KitchenRecord,
    MenuItemRecord, SiteRecord, StationRecord,
};

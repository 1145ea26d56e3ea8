pub mod climate;
pub mod config;
pub mod heightmap;
pub mod hex;
pub mod rivers;
pub mod rules;
pub mod terrain;
pub mod tile;
pub mod world;

pub use config::{ConfigError, GenerationParams, RuleSettings};
pub use hex::{Hex, HexDirection};
pub use rivers::{RiverReport, RiverSettings, simulate_rivers};
pub use terrain::{TerrainSettings, TerrainType, classify};
pub use tile::{HexMap, Tile, TileTag};
pub use world::{World, WorldGenError, generate_world};

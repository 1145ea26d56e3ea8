// src/world.rs
use crate::climate::apply_orographic_rainfall;
use crate::config::{ConfigError, GenerationParams};
use crate::heightmap::generate_field;
use crate::rivers::{
    FlowNetworkError, RiverError, RiverReport, simulate_rivers, validate_flow_network,
};
use crate::rules::{apply_coast_tags, apply_river_source_tags};
use crate::terrain::{ClassifyError, classify_tiles};
use crate::tile::{HexMap, MapError, Tile, TileTag};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Rivers(#[from] RiverError),
    #[error("generated flow network is inconsistent: {0}")]
    FlowNetwork(#[from] FlowNetworkError),
}

/// Готовая карта: тайлы с индексом и отчёт о реках
#[derive(Debug, Clone)]
pub struct World {
    pub map: HexMap,
    pub rivers: RiverReport,
}

/// Представление для внешнего рендера: список тайлов и индекс `"q_r" -> позиция`.
#[derive(Debug, Serialize)]
pub struct WorldExport<'a> {
    pub tiles: &'a [Tile],
    pub index: BTreeMap<String, usize>,
    pub rivers: &'a RiverReport,
}

impl World {
    #[must_use]
    pub fn export(&self) -> WorldExport<'_> {
        WorldExport {
            tiles: self.map.tiles(),
            index: self.map.keyed_index(),
            rivers: &self.rivers,
        }
    }

    #[must_use]
    pub fn count_tagged(&self, tag: TileTag) -> usize {
        self.map.iter().filter(|t| t.has_tag(tag)).count()
    }
}

/// Генерирует карту целиком
///
/// Этапы, каждый — единственный писатель своих полей:
/// 1. Поле высот и влажности (`heightmap`)
/// 2. Побережье (`rules`)
/// 3. Орографические осадки, меняют только влажность (`climate`)
/// 4. Тип местности (`terrain`)
/// 5. Истоки рек (`rules`)
/// 6. Речная сеть (`rivers`)
pub fn generate_world(params: &GenerationParams) -> Result<World, WorldGenError> {
    params.validate()?;
    let wind = params.wind()?;

    let tiles = generate_field(params);
    let mut map = HexMap::with_radius(tiles, params.radius)?;

    apply_coast_tags(&mut map, &params.rules);
    apply_orographic_rainfall(&mut map, wind, &params.rules);
    classify_tiles(&mut map, &params.terrain)?;
    apply_river_source_tags(&mut map, &params.rules, params.seed);

    let rivers = simulate_rivers(&mut map, &params.rivers)?;
    validate_flow_network(&map)?;

    let world = World { map, rivers };
    tracing::info!(
        target: "hexmapgen::world",
        seed = params.seed,
        tiles = world.map.len(),
        coast = world.count_tagged(TileTag::Coast),
        sources = world.count_tagged(TileTag::RiverSource),
        river_tiles = world.count_tagged(TileTag::River),
        rivers = world.rivers.paths.len(),
        "mapgen.world.generated"
    );
    Ok(world)
}

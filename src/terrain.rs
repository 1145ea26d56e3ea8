use crate::tile::{HexMap, TileTag};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    DeepOcean,
    Ocean,
    Beach,
    Desert,
    Scrubland,
    Grassland,
    Forest,
    Rainforest,
    Swamp,
    Hills,
    Mountain,
    Peak,
    Glacier,
}

impl TerrainType {
    #[must_use]
    pub fn is_ocean(self) -> bool {
        matches!(self, TerrainType::DeepOcean | TerrainType::Ocean)
    }

    /// Горные типы, которые не допускаются на побережье
    #[must_use]
    pub fn is_mountainous(self) -> bool {
        matches!(
            self,
            TerrainType::Mountain | TerrainType::Peak | TerrainType::Glacier
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationTier {
    Lowland,
    Upland,
    Highland,
    Peak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoistureTier {
    Arid,
    SemiArid,
    Humid,
    Wet,
}

const ELEVATION_TIERS: [ElevationTier; 4] = [
    ElevationTier::Lowland,
    ElevationTier::Upland,
    ElevationTier::Highland,
    ElevationTier::Peak,
];

const MOISTURE_TIERS: [MoistureTier; 4] = [
    MoistureTier::Arid,
    MoistureTier::SemiArid,
    MoistureTier::Humid,
    MoistureTier::Wet,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// Дыра в таблице типов: ошибка конфигурации, а не граничное условие
    #[error("terrain matrix has no entry for {elevation:?} × {moisture:?}")]
    UndefinedCell {
        elevation: ElevationTier,
        moisture: MoistureTier,
    },
    #[error("terrain matrix has {rows} elevation rows, expected 4")]
    RowCount { rows: usize },
}

/// Таблица `[ярус высоты][ярус влажности] -> тип местности`
///
/// Строки задаются в TOML как массивы имён; короткая строка означает
/// неопределённые ячейки, которые [`TerrainMatrix::validate`] сообщит как ошибку.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainMatrix(pub Vec<Vec<TerrainType>>);

impl TerrainMatrix {
    pub fn lookup(
        &self,
        elevation: ElevationTier,
        moisture: MoistureTier,
    ) -> Result<TerrainType, ClassifyError> {
        self.0
            .get(elevation as usize)
            .and_then(|row| row.get(moisture as usize))
            .copied()
            .ok_or(ClassifyError::UndefinedCell {
                elevation,
                moisture,
            })
    }

    /// Проверяет, что определена каждая пара ярусов.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.0.len() != ELEVATION_TIERS.len() {
            return Err(ClassifyError::RowCount { rows: self.0.len() });
        }
        for elevation in ELEVATION_TIERS {
            for moisture in MOISTURE_TIERS {
                self.lookup(elevation, moisture)?;
            }
        }
        Ok(())
    }
}

impl Default for TerrainMatrix {
    fn default() -> Self {
        use TerrainType::{
            Desert, Forest, Glacier, Grassland, Hills, Mountain, Peak, Rainforest, Scrubland,
            Swamp,
        };
        Self(vec![
            vec![Desert, Grassland, Forest, Swamp],
            vec![Scrubland, Grassland, Forest, Rainforest],
            vec![Hills, Hills, Mountain, Mountain],
            vec![Mountain, Peak, Peak, Glacier],
        ])
    }
}

/// Пороги классификации местности
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSettings {
    /// Ниже — глубокий океан
    #[serde(default = "default_deep_ocean_level")]
    pub deep_ocean_level: f32,

    /// Ниже — мелководье
    #[serde(default = "default_ocean_level")]
    pub ocean_level: f32,

    /// Прибрежные тайлы ниже этой высоты становятся пляжем
    #[serde(default = "default_beach_level")]
    pub beach_level: f32,

    /// Верхние границы ярусов Lowland, Upland, Highland (выше — Peak)
    #[serde(default = "default_elevation_tiers")]
    pub elevation_tiers: [f32; 3],

    /// Верхние границы ярусов Arid, SemiArid, Humid (выше — Wet)
    #[serde(default = "default_moisture_tiers")]
    pub moisture_tiers: [f32; 3],

    #[serde(default)]
    pub matrix: TerrainMatrix,
}

fn default_deep_ocean_level() -> f32 {
    0.1
}
fn default_ocean_level() -> f32 {
    0.2
}
fn default_beach_level() -> f32 {
    0.35
}
fn default_elevation_tiers() -> [f32; 3] {
    [0.45, 0.6, 0.8]
}
fn default_moisture_tiers() -> [f32; 3] {
    [0.25, 0.5, 0.75]
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            deep_ocean_level: default_deep_ocean_level(),
            ocean_level: default_ocean_level(),
            beach_level: default_beach_level(),
            elevation_tiers: default_elevation_tiers(),
            moisture_tiers: default_moisture_tiers(),
            matrix: TerrainMatrix::default(),
        }
    }
}

impl TerrainSettings {
    #[must_use]
    pub fn elevation_tier(&self, elevation: f32) -> ElevationTier {
        let i = self
            .elevation_tiers
            .iter()
            .take_while(|&&bound| elevation >= bound)
            .count();
        ELEVATION_TIERS[i]
    }

    #[must_use]
    pub fn moisture_tier(&self, moisture: f32) -> MoistureTier {
        let i = self
            .moisture_tiers
            .iter()
            .take_while(|&&bound| moisture >= bound)
            .count();
        MOISTURE_TIERS[i]
    }
}

/// Определяет тип местности по высоте, влажности и тегам. Чистая функция.
pub fn classify(
    elevation: f32,
    moisture: f32,
    tags: &[TileTag],
    settings: &TerrainSettings,
) -> Result<TerrainType, ClassifyError> {
    if elevation < settings.deep_ocean_level {
        return Ok(TerrainType::DeepOcean);
    }
    if elevation < settings.ocean_level {
        return Ok(TerrainType::Ocean);
    }

    // Ячейка матрицы обязана существовать даже там, где её перекроет пляж
    let terrain = settings.matrix.lookup(
        settings.elevation_tier(elevation),
        settings.moisture_tier(moisture),
    )?;

    let coastal = tags.contains(&TileTag::Coast);
    if coastal && elevation < settings.beach_level {
        return Ok(TerrainType::Beach);
    }
    // Горы на побережье понижаем до леса
    if coastal && terrain.is_mountainous() {
        return Ok(TerrainType::Forest);
    }
    Ok(terrain)
}

/// Назначает тип местности каждому тайлу карты.
pub fn classify_tiles(map: &mut HexMap, settings: &TerrainSettings) -> Result<(), ClassifyError> {
    for tile in map.tiles_mut() {
        tile.terrain = Some(classify(
            tile.elevation,
            tile.moisture,
            &tile.tags,
            settings,
        )?);
    }
    Ok(())
}

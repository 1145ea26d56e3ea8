// src/config.rs
//! Конфигурация генерации карты
//!
//! Этот модуль определяет все параметры процедурной генерации:
//! - Размер гексагональной сетки и масштабы шума
//! - Режим острова (порог отсечения) или плоской сетки с океаном
//! - Пороги правил разметки (побережье, истоки, орографические осадки)
//! - Классификацию местности и параметры речного стока
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::hex::HexDirection;
use crate::rivers::RiverSettings;
use crate::terrain::{ClassifyError, TerrainSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read generation config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse generation config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("radius must be positive, got {0}")]
    InvalidRadius(i32),
    #[error("`{name}` must be positive, got {value}")]
    InvalidScale { name: &'static str, value: f32 },
    #[error("`{name}` must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("`{name}` bounds must be ascending, got {bounds:?}")]
    UnorderedTiers { name: &'static str, bounds: [f32; 3] },
    #[error("wind direction ({0}, {1}) is not one of the six axial unit vectors")]
    UnknownWind(i32, i32),
    #[error("invalid terrain table: {0}")]
    Terrain(#[from] ClassifyError),
}

/// Пороги правил разметки тайлов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Сосед ниже этой высоты делает тайл прибрежным
    #[serde(default = "default_coast_threshold")]
    pub coast_threshold: f32,

    #[serde(default = "default_source_elevation")]
    pub source_elevation: f32,

    #[serde(default = "default_source_moisture")]
    pub source_moisture: f32,

    /// Вершины выше этого порога становятся истоками независимо от влажности
    #[serde(default = "default_source_peak_elevation")]
    pub source_peak_elevation: f32,

    /// Вероятность того, что подходящий тайл станет истоком (`1.0` = всегда)
    #[serde(default = "default_source_probability")]
    pub source_probability: f32,

    /// Минимальный перепад высоты, на который реагирует ветер
    #[serde(default = "default_rainfall_sensitivity")]
    pub rainfall_sensitivity: f32,

    /// Множитель перепада высоты при изменении влажности
    #[serde(default = "default_rainfall_gain")]
    pub rainfall_gain: f32,

    #[serde(default = "default_rainfall_max_delta")]
    pub rainfall_max_delta: f32,
}

fn default_coast_threshold() -> f32 {
    0.2
}
fn default_source_elevation() -> f32 {
    0.7
}
fn default_source_moisture() -> f32 {
    0.8
}
fn default_source_peak_elevation() -> f32 {
    0.9
}
fn default_source_probability() -> f32 {
    1.0
}
fn default_rainfall_sensitivity() -> f32 {
    0.02
}
fn default_rainfall_gain() -> f32 {
    1.5
}
fn default_rainfall_max_delta() -> f32 {
    0.5
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            coast_threshold: default_coast_threshold(),
            source_elevation: default_source_elevation(),
            source_moisture: default_source_moisture(),
            source_peak_elevation: default_source_peak_elevation(),
            source_probability: default_source_probability(),
            rainfall_sensitivity: default_rainfall_sensitivity(),
            rainfall_gain: default_rainfall_gain(),
            rainfall_max_delta: default_rainfall_max_delta(),
        }
    }
}

/// Основные параметры генерации карты
///
/// Полная конфигурация для генерации одного мира. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: u64,

    /// Радиус гексагональной сетки в гексах (по умолчанию 40)
    #[serde(default = "default_radius")]
    pub radius: i32,

    /// Масштаб шума высот
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,

    /// Масштаб шума влажности (обычно крупнее, чем у высот)
    #[serde(default = "default_moisture_noise_scale")]
    pub moisture_noise_scale: f32,

    /// Порог высоты:
    /// - `> 0.0` → тайлы ниже порога отбрасываются (остров),
    /// - `<= 0.0` → сохраняются все тайлы, низины становятся океаном.
    #[serde(default = "default_elevation_threshold")]
    pub elevation_threshold: f32,

    /// Направление, в котором дует ветер, как осевой вектор `[dq, dr]`
    /// (по умолчанию `[1, 0]` — с запада на восток)
    #[serde(default = "default_wind_direction")]
    pub wind_direction: (i32, i32),

    #[serde(default)]
    pub rules: RuleSettings,

    #[serde(default)]
    pub terrain: TerrainSettings,

    #[serde(default)]
    pub rivers: RiverSettings,
}

fn default_radius() -> i32 {
    40
}
fn default_noise_scale() -> f32 {
    0.07
}
fn default_moisture_noise_scale() -> f32 {
    0.03
}
fn default_elevation_threshold() -> f32 {
    0.2
}
fn default_wind_direction() -> (i32, i32) {
    (1, 0)
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            radius: default_radius(),
            noise_scale: default_noise_scale(),
            moisture_noise_scale: default_moisture_noise_scale(),
            elevation_threshold: default_elevation_threshold(),
            wind_direction: default_wind_direction(),
            rules: RuleSettings::default(),
            terrain: TerrainSettings::default(),
            rivers: RiverSettings::default(),
        }
    }
}

impl GenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # island.toml
    /// seed = 42
    /// radius = 24
    /// wind_direction = [1, 0]
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Направление ветра, если вектор допустим.
    pub fn wind(&self) -> Result<HexDirection, ConfigError> {
        let (dq, dr) = self.wind_direction;
        HexDirection::from_vector(self.wind_direction).ok_or(ConfigError::UnknownWind(dq, dr))
    }

    /// Проверяет параметры до генерации первого тайла.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius <= 0 {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        positive("noise_scale", self.noise_scale)?;
        positive("moisture_noise_scale", self.moisture_noise_scale)?;
        positive("rivers.source_flow", self.rivers.source_flow)?;
        // Значения <= 0 включают режим плоской сетки, поэтому проверяем только верхнюю границу
        if self.elevation_threshold.is_nan() || self.elevation_threshold > 1.0 {
            return Err(ConfigError::OutOfUnitRange {
                name: "elevation_threshold",
                value: self.elevation_threshold,
            });
        }
        self.wind()?;

        let rules = &self.rules;
        for (name, value) in [
            ("rules.coast_threshold", rules.coast_threshold),
            ("rules.source_elevation", rules.source_elevation),
            ("rules.source_moisture", rules.source_moisture),
            ("rules.source_peak_elevation", rules.source_peak_elevation),
            ("rules.source_probability", rules.source_probability),
            ("rules.rainfall_sensitivity", rules.rainfall_sensitivity),
            ("rules.rainfall_max_delta", rules.rainfall_max_delta),
            ("terrain.deep_ocean_level", self.terrain.deep_ocean_level),
            ("terrain.ocean_level", self.terrain.ocean_level),
            ("terrain.beach_level", self.terrain.beach_level),
            ("rivers.ocean_cutoff", self.rivers.ocean_cutoff),
        ] {
            unit_range(name, value)?;
        }
        positive("rules.rainfall_gain", rules.rainfall_gain)?;

        ascending("terrain.elevation_tiers", self.terrain.elevation_tiers)?;
        ascending("terrain.moisture_tiers", self.terrain.moisture_tiers)?;
        self.terrain.matrix.validate()?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidScale { name, value })
    }
}

fn unit_range(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn ascending(name: &'static str, bounds: [f32; 3]) -> Result<(), ConfigError> {
    if bounds.windows(2).all(|w| w[0] < w[1]) {
        Ok(())
    } else {
        Err(ConfigError::UnorderedTiers { name, bounds })
    }
}

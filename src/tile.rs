//! Тайл карты и индекс тайлов по координате

use crate::hex::Hex;
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Идентификатор речного пути: порядковый номер истока в порядке обработки.
pub type RiverId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileTag {
    Coast,
    RiverSource,
    River,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    #[serde(flatten)]
    pub coord: Hex,
    pub elevation: f32,
    pub moisture: f32,
    #[serde(rename = "type")]
    pub terrain: Option<TerrainType>,
    /// Теги только добавляются, но никогда не удаляются
    pub tags: Vec<TileTag>,
    pub flows_to: Vec<Hex>,
    /// Обратные ссылки на верхние по течению тайлы (не владение)
    pub flows_from: Vec<Hex>,
    pub flow_rate: f32,
    pub river_path_id: Option<RiverId>,
    pub parent_river_id: Option<RiverId>,
    pub river_order: Option<u32>,
    pub merge_count: u32,
}

impl Tile {
    #[must_use]
    pub fn new(coord: Hex, elevation: f32, moisture: f32) -> Self {
        Self {
            coord,
            elevation,
            moisture,
            terrain: None,
            tags: Vec::new(),
            flows_to: Vec::new(),
            flows_from: Vec::new(),
            flow_rate: 0.0,
            river_path_id: None,
            parent_river_id: None,
            river_order: None,
            merge_count: 0,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: TileTag) -> Self {
        self.add_tag(tag);
        self
    }

    #[must_use]
    pub fn has_tag(&self, tag: TileTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn add_tag(&mut self, tag: TileTag) {
        if !self.has_tag(tag) {
            self.tags.push(tag);
        }
    }

    /// Есть ли у тайла данные речной сети (пути, рёбра, расход).
    #[must_use]
    pub fn has_flow_data(&self) -> bool {
        !self.flows_to.is_empty()
            || !self.flows_from.is_empty()
            || self.river_path_id.is_some()
            || self.merge_count > 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("duplicate tile at {0}")]
    DuplicateTile(Hex),
    #[error("tile {coord} lies outside grid radius {radius}")]
    OutsideRadius { coord: Hex, radius: i32 },
}

/// Упорядоченный набор тайлов с единственным каноническим индексом `Hex -> позиция`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexMap {
    tiles: Vec<Tile>,
    index: HashMap<Hex, usize>,
}

impl HexMap {
    /// Строит карту из произвольного набора тайлов (например, тестовой фикстуры).
    pub fn new(tiles: Vec<Tile>) -> Result<Self, MapError> {
        let mut index = HashMap::with_capacity(tiles.len());
        for (i, tile) in tiles.iter().enumerate() {
            if index.insert(tile.coord, i).is_some() {
                return Err(MapError::DuplicateTile(tile.coord));
            }
        }
        Ok(Self { tiles, index })
    }

    /// Как [`HexMap::new`], но отклоняет тайлы за пределами радиуса.
    pub fn with_radius(tiles: Vec<Tile>, radius: i32) -> Result<Self, MapError> {
        if let Some(tile) = tiles.iter().find(|t| t.coord.length() > radius) {
            return Err(MapError::OutsideRadius {
                coord: tile.coord,
                radius,
            });
        }
        Self::new(tiles)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn get(&self, coord: Hex) -> Option<&Tile> {
        self.index.get(&coord).map(|&i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, coord: Hex) -> Option<&mut Tile> {
        self.index.get(&coord).map(|&i| &mut self.tiles[i])
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Изменяемый доступ к тайлам. Координаты менять нельзя: индекс не перестраивается.
    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Существующие соседи гекса в порядке [`crate::hex::DIRECTIONS`].
    pub fn neighbors(&self, coord: Hex) -> impl Iterator<Item = &Tile> + '_ {
        coord.neighbors().into_iter().filter_map(|n| self.get(n))
    }

    /// Индекс `"q_r" -> позиция тайла` для внешних потребителей
    #[must_use]
    pub fn keyed_index(&self) -> BTreeMap<String, usize> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (t.coord.to_string(), i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_a_set() {
        let mut tile = Tile::new(Hex::new(0, 0), 0.5, 0.5);
        tile.add_tag(TileTag::Coast);
        tile.add_tag(TileTag::Coast);
        tile.add_tag(TileTag::River);
        assert_eq!(tile.tags, vec![TileTag::Coast, TileTag::River]);
    }

    #[test]
    fn test_map_rejects_duplicates() {
        let tiles = vec![
            Tile::new(Hex::new(0, 0), 0.5, 0.5),
            Tile::new(Hex::new(0, 0), 0.7, 0.5),
        ];
        assert_eq!(
            HexMap::new(tiles).unwrap_err(),
            MapError::DuplicateTile(Hex::new(0, 0))
        );
    }

    #[test]
    fn test_map_rejects_tiles_outside_radius() {
        let tiles = vec![
            Tile::new(Hex::new(0, 0), 0.5, 0.5),
            Tile::new(Hex::new(2, 1), 0.5, 0.5),
        ];
        assert!(matches!(
            HexMap::with_radius(tiles, 2),
            Err(MapError::OutsideRadius { .. })
        ));
    }

    #[test]
    fn test_neighbors_skip_missing_tiles() {
        let map = HexMap::new(vec![
            Tile::new(Hex::new(0, 0), 0.5, 0.5),
            Tile::new(Hex::new(1, 0), 0.4, 0.5),
            Tile::new(Hex::new(5, 5), 0.4, 0.5),
        ])
        .unwrap();
        let found: Vec<Hex> = map.neighbors(Hex::new(0, 0)).map(|t| t.coord).collect();
        assert_eq!(found, vec![Hex::new(1, 0)]);
        assert_eq!(map.keyed_index()["5_5"], 2);
    }

    #[test]
    fn test_tile_serializes_with_flat_coords() {
        let tile = Tile::new(Hex::new(-1, 2), 0.25, 0.5).with_tag(TileTag::RiverSource);
        let json = serde_json::to_value(&tile).unwrap();
        assert_eq!(json["q"], -1);
        assert_eq!(json["r"], 2);
        assert_eq!(json["tags"][0], "river_source");
        assert!(json.get("flowsTo").is_some());
    }
}

//! Правила разметки тайлов: побережье и истоки рек

use crate::config::RuleSettings;
use crate::tile::{HexMap, TileTag};
use rand::{Rng, SeedableRng};

/// Сдвиг сида для вероятностного отбора истоков
const SOURCE_SEED_OFFSET: u64 = 3_000_000;

/// Помечает тайл как `coast`, если хотя бы один из шести соседей отсутствует
/// или лежит ниже `coast_threshold`.
///
/// Запускается после назначения высот и до классификации.
pub fn apply_coast_tags(map: &mut HexMap, rules: &RuleSettings) {
    let coastal: Vec<usize> = map
        .iter()
        .enumerate()
        .filter(|(_, tile)| {
            tile.coord.neighbors().iter().any(|&n| {
                map.get(n)
                    .is_none_or(|neighbor| neighbor.elevation < rules.coast_threshold)
            })
        })
        .map(|(i, _)| i)
        .collect();

    let count = coastal.len();
    let tiles = map.tiles_mut();
    for i in coastal {
        tiles[i].add_tag(TileTag::Coast);
    }
    tracing::debug!(target: "hexmapgen::rules", count, "rules.coast.tagged");
}

/// Может ли тайл стать истоком (без учёта вероятностного отбора)
fn is_source_candidate(
    elevation: f32,
    moisture: f32,
    ocean: bool,
    coast: bool,
    rules: &RuleSettings,
) -> bool {
    let wet_highland = elevation >= rules.source_elevation && moisture >= rules.source_moisture;
    let inland_peak = elevation >= rules.source_peak_elevation && !ocean && !coast;
    wet_highland || inland_peak
}

/// Помечает истоки рек. Требует уже классифицированных тайлов.
///
/// При `source_probability < 1.0` каждый кандидат проходит жребий из потока
/// ChaCha8, выведенного из `seed`, в порядке следования тайлов.
/// Вероятность вне `[0, 1]` прижимается к границе, `NaN` считается нулём.
pub fn apply_river_source_tags(map: &mut HexMap, rules: &RuleSettings, seed: u64) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed.wrapping_add(SOURCE_SEED_OFFSET));
    let probability = if rules.source_probability.is_nan() {
        0.0
    } else {
        rules.source_probability.clamp(0.0, 1.0)
    };
    let gated = probability < 1.0;
    let mut count = 0usize;

    for tile in map.tiles_mut() {
        let ocean = tile.terrain.is_some_and(|t| t.is_ocean());
        if !is_source_candidate(
            tile.elevation,
            tile.moisture,
            ocean,
            tile.has_tag(TileTag::Coast),
            rules,
        ) {
            continue;
        }
        if gated && !rng.gen_bool(f64::from(probability)) {
            continue;
        }
        tile.add_tag(TileTag::RiverSource);
        count += 1;
    }
    tracing::debug!(target: "hexmapgen::rules", count, "rules.river_source.tagged");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;
    use crate::terrain::TerrainType;
    use crate::tile::Tile;

    #[test]
    fn test_missing_and_low_neighbors_make_coast() {
        let mut tiles = Vec::new();
        for hex in crate::hex::hexes_in_radius(2).unwrap() {
            let elevation = if hex == Hex::new(1, 0) { 0.1 } else { 0.5 };
            tiles.push(Tile::new(hex, elevation, 0.5));
        }
        let mut map = HexMap::new(tiles).unwrap();
        apply_coast_tags(&mut map, &RuleSettings::default());

        // Кольцо радиуса 2 граничит с пустотой
        for tile in map.iter().filter(|t| t.coord.length() == 2) {
            assert!(tile.has_tag(TileTag::Coast), "{} should be coast", tile.coord);
        }
        // Центр граничит с низким (1,0)
        assert!(map.get(Hex::new(0, 0)).unwrap().has_tag(TileTag::Coast));
        // (-1,0) окружён сушей
        assert!(!map.get(Hex::new(-1, 0)).unwrap().has_tag(TileTag::Coast));
    }

    #[test]
    fn test_source_conditions() {
        let rules = RuleSettings::default();
        assert!(is_source_candidate(0.75, 0.85, false, false, &rules));
        assert!(!is_source_candidate(0.75, 0.5, false, false, &rules));
        assert!(is_source_candidate(0.92, 0.1, false, false, &rules));
        assert!(!is_source_candidate(0.92, 0.1, false, true, &rules));
        assert!(!is_source_candidate(0.92, 0.1, true, false, &rules));
        // Влажное нагорье — исток даже на побережье
        assert!(is_source_candidate(0.75, 0.85, false, true, &rules));
    }

    #[test]
    fn test_source_tags_respect_terrain() {
        let mut peak = Tile::new(Hex::new(0, 0), 0.95, 0.2);
        peak.terrain = Some(TerrainType::Peak);
        let mut wet = Tile::new(Hex::new(1, 0), 0.72, 0.9);
        wet.terrain = Some(TerrainType::Mountain);
        let mut low = Tile::new(Hex::new(2, 0), 0.4, 0.9);
        low.terrain = Some(TerrainType::Swamp);
        let mut map = HexMap::new(vec![peak, wet, low]).unwrap();

        apply_river_source_tags(&mut map, &RuleSettings::default(), 1);
        let sources: Vec<Hex> = map
            .iter()
            .filter(|t| t.has_tag(TileTag::RiverSource))
            .map(|t| t.coord)
            .collect();
        assert_eq!(sources, vec![Hex::new(0, 0), Hex::new(1, 0)]);
    }

    #[test]
    fn test_probability_gate_is_seeded() {
        let rules = RuleSettings {
            source_probability: 0.5,
            ..RuleSettings::default()
        };
        let build = || {
            let tiles = (0..64)
                .map(|q| Tile::new(Hex::new(q, 0), 0.8, 0.9))
                .collect();
            HexMap::new(tiles).unwrap()
        };
        let mut a = build();
        let mut b = build();
        apply_river_source_tags(&mut a, &rules, 42);
        apply_river_source_tags(&mut b, &rules, 42);
        assert_eq!(a, b);

        let tagged = a.iter().filter(|t| t.has_tag(TileTag::RiverSource)).count();
        assert!(tagged > 0 && tagged < 64);

        let none = RuleSettings {
            source_probability: 0.0,
            ..RuleSettings::default()
        };
        let mut c = build();
        apply_river_source_tags(&mut c, &none, 42);
        assert!(c.iter().all(|t| !t.has_tag(TileTag::RiverSource)));
    }

    #[test]
    fn test_probability_outside_unit_range_is_clamped() {
        let build = || {
            let tiles = (0..16)
                .map(|q| Tile::new(Hex::new(q, 0), 0.8, 0.9))
                .collect();
            HexMap::new(tiles).unwrap()
        };
        let tagged = |p: f32| {
            let rules = RuleSettings {
                source_probability: p,
                ..RuleSettings::default()
            };
            let mut map = build();
            apply_river_source_tags(&mut map, &rules, 7);
            map.iter().filter(|t| t.has_tag(TileTag::RiverSource)).count()
        };

        assert_eq!(tagged(-0.5), 0);
        assert_eq!(tagged(f32::NAN), 0);
        assert_eq!(tagged(1.5), 16);
    }
}

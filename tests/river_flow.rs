use hexmapgen::rivers::{PathEnd, upstream_lineage, validate_flow_network};
use hexmapgen::{Hex, HexMap, RiverSettings, Tile, TileTag, simulate_rivers};

const OCEAN: f32 = 0.1;

fn tile(q: i32, r: i32, elevation: f32, moisture: f32) -> Tile {
    Tile::new(Hex::new(q, r), elevation, moisture)
}

/// Ромб 5×5: океан по краю, исток B в (0,-1)
fn fixed_river_map() -> HexMap {
    let mut tiles = Vec::new();
    for r in -2i32..=2 {
        for q in -2i32..=2 {
            let interior = q.abs() < 2 && r.abs() < 2;
            if !interior {
                tiles.push(tile(q, r, OCEAN, 0.5));
            }
        }
    }
    tiles.extend([
        tile(-1, -1, 0.3, 0.2),
        tile(0, -1, 0.9, 0.9).with_tag(TileTag::RiverSource),
        tile(1, -1, 0.3, 0.2),
        tile(-1, 0, 0.4, 0.3),
        tile(0, 0, 0.8, 0.5),
        tile(1, 0, 0.7, 0.4),
        tile(-1, 1, 0.4, 0.3),
        tile(0, 1, 0.7, 0.6),
        tile(1, 1, 0.6, 0.4),
    ]);
    HexMap::new(tiles).unwrap()
}

/// Два истока, сливающиеся в (1,0) и стекающие в море в (2,0)
fn confluence_map() -> HexMap {
    HexMap::new(vec![
        tile(-1, 0, 0.9, 0.9).with_tag(TileTag::RiverSource),
        tile(0, 0, 0.7, 0.5),
        tile(1, -2, 0.9, 0.9).with_tag(TileTag::RiverSource),
        tile(1, -1, 0.7, 0.5),
        tile(1, 0, 0.5, 0.5),
        tile(2, 0, 0.05, 0.5),
    ])
    .unwrap()
}

#[test]
fn test_source_produces_river() {
    let mut map = fixed_river_map();
    simulate_rivers(&mut map, &RiverSettings::default()).unwrap();
    assert!(map.iter().any(|t| t.has_tag(TileTag::River)));
}

#[test]
fn test_source_flows_downhill_into_known_tile() {
    let mut map = fixed_river_map();
    simulate_rivers(&mut map, &RiverSettings::default()).unwrap();

    let source = map.get(Hex::new(0, -1)).unwrap();
    assert_eq!(source.flows_to.len(), 1);
    let target = map.get(source.flows_to[0]).expect("target must be indexed");
    assert!(target.elevation < 0.9);
    // Ничья между (0,-2) и (1,-2) решается меньшим ключом
    assert_eq!(target.coord, Hex::new(0, -2));
    assert_eq!(target.flows_from, vec![Hex::new(0, -1)]);
    assert_eq!(target.river_order, Some(1));
}

#[test]
fn test_ocean_tiles_never_flow() {
    let mut map = fixed_river_map();
    simulate_rivers(&mut map, &RiverSettings::default()).unwrap();
    for t in map.iter().filter(|t| t.elevation <= OCEAN) {
        assert!(t.flows_to.is_empty(), "ocean tile {} flows", t.coord);
    }
    assert_eq!(validate_flow_network(&map), Ok(()));
}

#[test]
fn test_confluence_bookkeeping() {
    let mut map = confluence_map();
    let report = simulate_rivers(&mut map, &RiverSettings::default()).unwrap();

    assert_eq!(report.paths.len(), 2);
    assert_eq!(report.paths[0].source, Hex::new(-1, 0));
    assert_eq!(report.paths[0].end, PathEnd::Sea);
    assert_eq!(
        report.paths[1].end,
        PathEnd::Confluence {
            into: 0,
            at: Hex::new(1, 0)
        }
    );

    let merge = map.get(Hex::new(1, 0)).unwrap();
    assert_eq!(merge.flows_from.len(), 2);
    assert!(merge.merge_count >= 2);
    assert_eq!(merge.parent_river_id, Some(1));
    assert_eq!(merge.river_path_id, Some(0));
    assert_eq!(merge.river_order, Some(2));
    assert_eq!(merge.flows_to, vec![Hex::new(2, 0)]);
    assert!((merge.flow_rate - 2.0).abs() < 1e-6);

    // Расход притока дошёл до устья, рёбра не продублированы
    let mouth = map.get(Hex::new(2, 0)).unwrap();
    assert!((mouth.flow_rate - 2.0).abs() < 1e-6);
    assert_eq!(mouth.flows_from, vec![Hex::new(1, 0)]);

    let tributary = map.get(Hex::new(1, -1)).unwrap();
    assert_eq!(tributary.river_path_id, Some(1));
    assert_eq!(tributary.river_order, Some(1));

    assert_eq!(validate_flow_network(&map), Ok(()));
}

#[test]
fn test_river_tag_matches_edges() {
    let mut map = confluence_map();
    simulate_rivers(&mut map, &RiverSettings::default()).unwrap();
    for t in map.iter() {
        let has_edges = !t.flows_to.is_empty() || !t.flows_from.is_empty();
        assert_eq!(t.has_tag(TileTag::River), has_edges, "tile {}", t.coord);
    }
}

#[test]
fn test_paths_descend_strictly() {
    let mut map = confluence_map();
    let report = simulate_rivers(&mut map, &RiverSettings::default()).unwrap();
    for path in &report.paths {
        let elevations: Vec<f32> = path
            .tiles
            .iter()
            .map(|&h| map.get(h).unwrap().elevation)
            .collect();
        assert!(elevations.windows(2).all(|w| w[1] < w[0]), "{elevations:?}");
    }
}

#[test]
fn test_lineage_reaches_source() {
    let mut map = confluence_map();
    simulate_rivers(&mut map, &RiverSettings::default()).unwrap();
    let lineage = upstream_lineage(&map, Hex::new(2, 0));
    assert_eq!(
        lineage,
        vec![Hex::new(2, 0), Hex::new(1, 0), Hex::new(0, 0), Hex::new(-1, 0)]
    );
    let origin = map.get(*lineage.last().unwrap()).unwrap();
    assert!(origin.has_tag(TileTag::RiverSource));
}

use crate::config::RuleSettings;
use crate::hex::HexDirection;
use crate::tile::HexMap;

/// Орографические осадки
///
/// Для каждого тайла берётся наветренный сосед (на шаг против ветра).
/// Если тайл выше соседа, воздух поднимается и влажность растёт; если ниже,
/// нисходящий поток сушит склон. Величина изменения пропорциональна перепаду
/// высот и ограничена `rainfall_max_delta`.
///
/// Высоты не меняются, поэтому результат не зависит от порядка обхода.
pub fn apply_orographic_rainfall(map: &mut HexMap, wind: HexDirection, rules: &RuleSettings) {
    let upwind = wind.opposite();

    let adjustments: Vec<(usize, f32)> = map
        .iter()
        .enumerate()
        .filter_map(|(i, tile)| {
            // Нет соседа — край сетки, осадки не меняются
            let windward = map.get(tile.coord.neighbor(upwind))?;
            let diff = tile.elevation - windward.elevation;
            if diff.abs() < rules.rainfall_sensitivity {
                return None;
            }
            let delta = (diff.abs() * rules.rainfall_gain).min(rules.rainfall_max_delta);
            Some((i, delta.copysign(diff)))
        })
        .collect();

    let adjusted = adjustments.len();
    let tiles = map.tiles_mut();
    for (i, delta) in adjustments {
        tiles[i].moisture = (tiles[i].moisture + delta).clamp(0.0, 1.0);
    }

    tracing::debug!(
        target: "hexmapgen::climate",
        wind = ?wind,
        adjusted,
        "rules.rainfall.applied"
    );
}

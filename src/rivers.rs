//! Симуляция речного стока по гексагональной сетке
//!
//! Алгоритм:
//! 1. Истоки (`river_source`) обрабатываются по возрастанию координатного ключа
//! 2. Из каждого ещё не посещённого истока путь идёт по наискорейшему спуску:
//!    к самому низкому соседу, строго ниже текущего тайла (ничьи — по меньшему ключу)
//! 3. Путь заканчивается у моря, в локальном минимуме или при слиянии
//!    с уже проложенной рекой другого истока
//! 4. При слиянии расход приходящего пути добавляется к тайлу слияния
//!    и ко всем тайлам ниже по течению
//!
//! Каждый тайл имеет не более одного ребра `flows_to`.

use crate::hex::Hex;
use crate::tile::{HexMap, RiverId, TileTag};
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Параметры речного стока
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverSettings {
    /// Тайлы на этой высоте и ниже считаются морем: путь здесь заканчивается
    #[serde(default = "default_ocean_cutoff")]
    pub ocean_cutoff: f32,

    /// Расход, который даёт каждый исток
    #[serde(default = "default_source_flow")]
    pub source_flow: f32,

    /// Предел длины пути в шагах (по умолчанию — число тайлов карты минус один)
    #[serde(default)]
    pub max_path_steps: Option<usize>,
}

fn default_ocean_cutoff() -> f32 {
    0.1
}
fn default_source_flow() -> f32 {
    1.0
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            ocean_cutoff: default_ocean_cutoff(),
            source_flow: default_source_flow(),
            max_path_steps: None,
        }
    }
}

/// Причина завершения речного пути
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathEnd {
    /// Дошли до моря
    Sea,
    /// Нет соседей ниже
    LocalMinimum,
    /// Влились в реку другого истока
    Confluence { into: RiverId, at: Hex },
    /// Следующий тайл уже был в этом пути; путь обрезан
    CycleGuard { at: Hex },
    /// Превышен предел длины пути
    StepLimit,
}

impl PathEnd {
    /// Аномалия: путь обрезан защитой, а не завершился естественно.
    #[must_use]
    pub fn is_anomaly(self) -> bool {
        matches!(self, PathEnd::CycleGuard { .. } | PathEnd::StepLimit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiverPath {
    pub id: RiverId,
    pub source: Hex,
    /// Тайлы от истока до конца пути включительно (при слиянии — включая тайл слияния)
    pub tiles: Vec<Hex>,
    pub end: PathEnd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiverReport {
    pub paths: Vec<RiverPath>,
}

impl RiverReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &RiverPath> {
        self.paths.iter().filter(|p| p.end.is_anomaly())
    }

    #[must_use]
    pub fn confluences(&self) -> usize {
        self.paths
            .iter()
            .filter(|p| matches!(p.end, PathEnd::Confluence { .. }))
            .count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RiverError {
    #[error("tile {0} already carries river data; rivers are simulated once per map")]
    AlreadySimulated(Hex),
}

/// Следующий шаг наискорейшего спуска: самый низкий сосед строго ниже `from`.
#[must_use]
pub fn steepest_descent(map: &HexMap, from: Hex) -> Option<Hex> {
    let elevation = map.get(from)?.elevation;
    map.neighbors(from)
        .filter(|n| n.elevation < elevation)
        .min_by(|a, b| {
            a.elevation
                .total_cmp(&b.elevation)
                .then_with(|| a.coord.cmp(&b.coord))
        })
        .map(|n| n.coord)
}

/// Прокладывает реки от всех истоков карты.
///
/// Изменяет только поля речной сети и добавляет тег `river`. Повторный
/// запуск на уже обработанной карте отклоняется.
pub fn simulate_rivers(
    map: &mut HexMap,
    settings: &RiverSettings,
) -> Result<RiverReport, RiverError> {
    if let Some(tile) = map.iter().find(|t| t.has_flow_data()) {
        return Err(RiverError::AlreadySimulated(tile.coord));
    }

    let mut sources: Vec<Hex> = map
        .iter()
        .filter(|t| t.has_tag(TileTag::RiverSource))
        .map(|t| t.coord)
        .collect();
    sources.sort_unstable();

    let mut report = RiverReport::default();
    let mut next_id: RiverId = 0;
    for source in sources {
        // Исток, уже поглощённый чужим путём, новую реку не начинает
        if map.get(source).is_some_and(|t| t.river_path_id.is_some()) {
            continue;
        }
        let path = trace_path(map, source, next_id, settings);
        if path.end.is_anomaly() {
            tracing::warn!(
                target: "hexmapgen::rivers",
                river = path.id,
                source = %path.source,
                end = ?path.end,
                "rivers.path.truncated"
            );
        }
        report.paths.push(path);
        next_id += 1;
    }

    tracing::debug!(
        target: "hexmapgen::rivers",
        paths = report.paths.len(),
        confluences = report.confluences(),
        anomalies = report.anomalies().count(),
        "rivers.simulated"
    );
    Ok(report)
}

fn trace_path(map: &mut HexMap, source: Hex, id: RiverId, settings: &RiverSettings) -> RiverPath {
    trace_path_by(map, source, id, settings, steepest_descent)
}

/// Прокладывает путь, выбирая следующий тайл через `descend`.
fn trace_path_by<F>(
    map: &mut HexMap,
    source: Hex,
    id: RiverId,
    settings: &RiverSettings,
    descend: F,
) -> RiverPath
where
    F: Fn(&HexMap, Hex) -> Option<Hex>,
{
    // Строгий спуск не может пройти больше тайлов, чем есть на карте
    let max_steps = settings
        .max_path_steps
        .unwrap_or_else(|| map.len().saturating_sub(1));
    let mut visited = HashSet::from([source]);
    let mut tiles = vec![source];

    if let Some(tile) = map.get_mut(source) {
        tile.river_path_id = Some(id);
        tile.river_order = Some(0);
        tile.flow_rate += settings.source_flow;
    }

    let mut current = source;
    let mut order = 0u32;
    let end = loop {
        let Some(tile) = map.get(current) else {
            break PathEnd::LocalMinimum;
        };
        if tile.elevation <= settings.ocean_cutoff {
            break PathEnd::Sea;
        }
        let flow = tile.flow_rate;
        let Some(target) = descend(map, current) else {
            break PathEnd::LocalMinimum;
        };
        if order as usize >= max_steps {
            break PathEnd::StepLimit;
        }
        if !visited.insert(target) {
            break PathEnd::CycleGuard { at: target };
        }

        link(map, current, target);
        tiles.push(target);

        let Some(next) = map.get_mut(target) else {
            break PathEnd::LocalMinimum;
        };
        let claimed = next.river_path_id;
        match claimed {
            Some(owner) if owner != id => {
                next.parent_river_id = Some(id);
                next.flow_rate += flow;
                propagate_flow(map, target, flow);
                break PathEnd::Confluence {
                    into: owner,
                    at: target,
                };
            }
            _ => {
                order += 1;
                next.river_path_id = Some(id);
                next.river_order = Some(order);
                next.flow_rate += flow;
                if next.has_tag(TileTag::RiverSource) {
                    next.flow_rate += settings.source_flow;
                }
                current = target;
            }
        }
    };

    RiverPath {
        id,
        source,
        tiles,
        end,
    }
}

/// Ребро `from -> to` и зеркальная обратная ссылка.
fn link(map: &mut HexMap, from: Hex, to: Hex) {
    if let Some(tile) = map.get_mut(from) {
        tile.flows_to.push(to);
        tile.add_tag(TileTag::River);
    }
    if let Some(tile) = map.get_mut(to) {
        tile.flows_from.push(from);
        tile.merge_count += 1;
        tile.add_tag(TileTag::River);
    }
}

/// Добавляет расход притока ко всем тайлам ниже точки слияния.
fn propagate_flow(map: &mut HexMap, confluence: Hex, flow: f32) {
    let mut seen = HashSet::from([confluence]);
    let mut current = confluence;
    while let Some(&next) = map.get(current).and_then(|t| t.flows_to.first()) {
        if !seen.insert(next) {
            break;
        }
        if let Some(tile) = map.get_mut(next) {
            tile.flow_rate += flow;
        }
        current = next;
    }
}

/// Цепочка вверх по течению по `flows_from` до истока.
///
/// При слиянии выбирается первая обратная ссылка, то есть путь-владелец.
/// Возвращает тайлы от `start` до истока включительно.
#[must_use]
pub fn upstream_lineage(map: &HexMap, start: Hex) -> Vec<Hex> {
    let mut lineage = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;
    while let Some(&prev) = map.get(current).and_then(|t| t.flows_from.first()) {
        if !seen.insert(prev) {
            break;
        }
        lineage.push(prev);
        current = prev;
    }
    lineage
}

/// Речная сеть как ориентированный граф; вес ребра — расход тайла-источника ребра.
#[must_use]
pub fn flow_graph(map: &HexMap) -> DiGraphMap<Hex, f32> {
    let mut graph = DiGraphMap::new();
    for tile in map.iter() {
        for &target in &tile.flows_to {
            graph.add_edge(tile.coord, target, tile.flow_rate);
        }
    }
    graph
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowNetworkError {
    #[error("edge {from} -> {to} points at a missing tile")]
    MissingTarget { from: Hex, to: Hex },
    #[error("edge {from} -> {to} does not descend ({from_elevation} -> {to_elevation})")]
    NotDownhill {
        from: Hex,
        to: Hex,
        from_elevation: f32,
        to_elevation: f32,
    },
    #[error("edge {from} -> {to} has no mirrored back-reference")]
    Unmirrored { from: Hex, to: Hex },
    #[error("flow network contains a cycle")]
    Cycle,
}

/// Проверяет инварианты речной сети: спуск по каждому ребру, зеркальные
/// обратные ссылки в обе стороны и отсутствие циклов.
pub fn validate_flow_network(map: &HexMap) -> Result<(), FlowNetworkError> {
    for tile in map.iter() {
        for &to in &tile.flows_to {
            let from = tile.coord;
            let target = map.get(to).ok_or(FlowNetworkError::MissingTarget { from, to })?;
            if target.elevation >= tile.elevation {
                return Err(FlowNetworkError::NotDownhill {
                    from,
                    to,
                    from_elevation: tile.elevation,
                    to_elevation: target.elevation,
                });
            }
            if !target.flows_from.contains(&from) {
                return Err(FlowNetworkError::Unmirrored { from, to });
            }
        }
        for &from in &tile.flows_from {
            let to = tile.coord;
            let mirrored = map.get(from).is_some_and(|t| t.flows_to.contains(&to));
            if !mirrored {
                return Err(FlowNetworkError::Unmirrored { from, to });
            }
        }
    }

    if petgraph::algo::is_cyclic_directed(&flow_graph(map)) {
        return Err(FlowNetworkError::Cycle);
    }
    Ok(())
}

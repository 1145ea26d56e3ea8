//! Осевые (axial) координаты гексагональной сетки
//!
//! Гекс адресуется парой `(q, r)`, третья координата выводится как `s = -q - r`.
//! Модуль не хранит состояния: соседи, расстояния, ключи и перечисление
//! гексов внутри радиуса.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Смещения шести соседей (pointy-top), в фиксированном порядке обхода.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

/// Координата гекса. Порядок — лексикографический по `(q, r)`, он же
/// «наименьший ключ» при разрешении ничьих.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    #[must_use]
    pub const fn offset(self, dq: i32, dr: i32) -> Self {
        Self::new(self.q + dq, self.r + dr)
    }

    #[must_use]
    pub fn neighbor(self, direction: HexDirection) -> Self {
        let (dq, dr) = direction.vector();
        self.offset(dq, dr)
    }

    /// Шесть соседей в порядке [`DIRECTIONS`].
    #[must_use]
    pub fn neighbors(self) -> [Hex; 6] {
        DIRECTIONS.map(|(dq, dr)| self.offset(dq, dr))
    }

    /// Расстояние до центра сетки в шагах.
    #[must_use]
    pub fn length(self) -> i32 {
        self.q.abs().max(self.r.abs()).max(self.s().abs())
    }

    #[must_use]
    pub fn distance(self, other: Hex) -> i32 {
        other.offset(-self.q, -self.r).length()
    }

    /// Центр гекса в декартовых координатах при единичном шаге между центрами.
    #[must_use]
    pub fn to_cartesian(self) -> (f32, f32) {
        let x = self.q as f32 + self.r as f32 * 0.5;
        let y = self.r as f32 * (3.0_f32.sqrt() * 0.5);
        (x, y)
    }
}

/// Ключ вида `"q_r"`
impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.q, self.r)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("hex radius must not be negative, got {0}")]
    NegativeRadius(i32),
    #[error("malformed hex key `{0}`, expected `q_r`")]
    MalformedKey(String),
}

impl FromStr for Hex {
    type Err = HexError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        // Отрицательные q дают ключи вида "-1_-2", поэтому режем по первому '_' после знака.
        let split_at = key
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '_')
            .map(|(i, _)| i)
            .ok_or_else(|| HexError::MalformedKey(key.to_string()))?;
        let (q, r) = (&key[..split_at], &key[split_at + 1..]);
        match (q.parse(), r.parse()) {
            (Ok(q), Ok(r)) => Ok(Hex::new(q, r)),
            _ => Err(HexError::MalformedKey(key.to_string())),
        }
    }
}

/// Одно из шести осевых направлений (используется для ветра)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexDirection {
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
    NorthEast,
}

impl HexDirection {
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::SouthEast,
        HexDirection::SouthWest,
        HexDirection::West,
        HexDirection::NorthWest,
        HexDirection::NorthEast,
    ];

    #[must_use]
    pub fn vector(self) -> (i32, i32) {
        DIRECTIONS[self as usize]
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 3) % 6]
    }

    /// Возвращает `None`, если вектор не является единичным осевым направлением.
    #[must_use]
    pub fn from_vector(vector: (i32, i32)) -> Option<Self> {
        DIRECTIONS
            .iter()
            .position(|&d| d == vector)
            .map(|i| Self::ALL[i])
    }
}

/// Все гексы с `|q|, |r|, |s| <= radius`, упорядоченные по `(q, r)`.
pub fn hexes_in_radius(radius: i32) -> Result<Vec<Hex>, HexError> {
    if radius < 0 {
        return Err(HexError::NegativeRadius(radius));
    }
    let mut hexes = Vec::with_capacity((3 * radius * (radius + 1) + 1) as usize);
    for q in -radius..=radius {
        let r_min = (-radius).max(-q - radius);
        let r_max = radius.min(-q + radius);
        for r in r_min..=r_max {
            hexes.push(Hex::new(q, r));
        }
    }
    Ok(hexes)
}

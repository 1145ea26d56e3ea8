use crate::config::GenerationParams;
use crate::hex::{Hex, hexes_in_radius};
use crate::tile::Tile;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Сдвиг сида для независимого шума влажности
const MOISTURE_SEED_OFFSET: u64 = 1_000_000;

/// Подъём внутренней части острова, чтобы центр не проваливался при слабом шуме
const INTERIOR_BOOST: f32 = 0.1;

/// Сглаженная косинусом маска острова: 1.0 в центре, 0.0 на краю.
#[must_use]
pub fn radial_falloff(normalized_distance: f32) -> f32 {
    let d = normalized_distance.clamp(0.0, 1.0);
    ((1.0 + (std::f32::consts::PI * d).cos()) * 0.5).powf(1.5)
}

fn make_noise(seed: u64) -> FastNoiseLite {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(seed as i32));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(4));
    // Частота 1.0: масштаб задаётся явным умножением координат
    noise.set_frequency(Some(1.0));
    noise
}

/// Шум в диапазоне [0, 1]
fn sample(noise: &FastNoiseLite, x: f32, y: f32) -> f32 {
    ((noise.get_noise_2d(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
}

struct Sampler {
    elevation: FastNoiseLite,
    moisture: FastNoiseLite,
    cos: f32,
    sin: f32,
    centroid: (f32, f32),
    max_distance: f32,
    noise_scale: f32,
    moisture_scale: f32,
}

impl Sampler {
    fn tile(&self, hex: Hex) -> Tile {
        let (q, r) = (hex.q as f32, hex.r as f32);
        // Поворот сетки отвязывает оси шума от осей гексов
        let rx = q * self.cos - r * self.sin;
        let ry = q * self.sin + r * self.cos;

        let (x, y) = hex.to_cartesian();
        let distance = (x - self.centroid.0).hypot(y - self.centroid.1);
        let normalized = if self.max_distance > 0.0 {
            distance / self.max_distance
        } else {
            0.0
        };

        let base = sample(&self.elevation, rx * self.noise_scale, ry * self.noise_scale);
        let elevation =
            (base * radial_falloff(normalized) + INTERIOR_BOOST * (1.0 - normalized)).clamp(0.0, 1.0);
        let moisture = sample(
            &self.moisture,
            rx * self.moisture_scale,
            ry * self.moisture_scale,
        );

        Tile::new(hex, elevation, moisture)
    }
}

/// Генерирует поле высот и влажности для всех гексов в радиусе
///
/// В режиме острова (`elevation_threshold > 0`) тайлы ниже порога
/// отбрасываются; иначе возвращается вся сетка.
/// Параметры должны быть предварительно проверены через [`GenerationParams::validate`].
#[must_use]
pub fn generate_field(params: &GenerationParams) -> Vec<Tile> {
    let hexes = hexes_in_radius(params.radius.max(0)).unwrap_or_default();
    if hexes.is_empty() {
        return Vec::new();
    }

    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(params.seed);
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);

    let count = hexes.len() as f32;
    let (sum_x, sum_y) = hexes.iter().fold((0.0, 0.0), |(sx, sy), h| {
        let (x, y) = h.to_cartesian();
        (sx + x, sy + y)
    });
    let centroid = (sum_x / count, sum_y / count);
    let max_distance = hexes
        .iter()
        .map(|h| {
            let (x, y) = h.to_cartesian();
            (x - centroid.0).hypot(y - centroid.1)
        })
        .fold(0.0_f32, f32::max);

    let sampler = Sampler {
        elevation: make_noise(params.seed),
        moisture: make_noise(params.seed.wrapping_add(MOISTURE_SEED_OFFSET)),
        cos: angle.cos(),
        sin: angle.sin(),
        centroid,
        max_distance,
        noise_scale: params.noise_scale,
        moisture_scale: params.moisture_noise_scale,
    };

    #[cfg(feature = "parallel")]
    let tiles: Vec<Tile> = hexes.par_iter().map(|&h| sampler.tile(h)).collect();
    #[cfg(not(feature = "parallel"))]
    let tiles: Vec<Tile> = hexes.iter().map(|&h| sampler.tile(h)).collect();

    let total = tiles.len();
    let tiles: Vec<Tile> = if params.elevation_threshold > 0.0 {
        tiles
            .into_iter()
            .filter(|t| t.elevation >= params.elevation_threshold)
            .collect()
    } else {
        tiles
    };

    tracing::debug!(
        target: "hexmapgen::heightmap",
        radius = params.radius,
        total,
        kept = tiles.len(),
        rotation = angle,
        "mapgen.field.generated"
    );
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64, threshold: f32) -> GenerationParams {
        GenerationParams {
            seed,
            radius: 10,
            elevation_threshold: threshold,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn test_falloff_shape() {
        assert!((radial_falloff(0.0) - 1.0).abs() < 1e-6);
        assert!(radial_falloff(1.0).abs() < 1e-6);
        assert!(radial_falloff(0.25) > radial_falloff(0.5));
        assert!(radial_falloff(0.5) > radial_falloff(0.75));
    }

    #[test]
    fn test_flat_grid_keeps_every_tile() {
        let tiles = generate_field(&params(3, 0.0));
        assert_eq!(tiles.len(), 331);
        for t in &tiles {
            assert!((0.0..=1.0).contains(&t.elevation));
            assert!((0.0..=1.0).contains(&t.moisture));
            assert_eq!(t.coord.q + t.coord.r + t.coord.s(), 0);
        }
    }

    #[test]
    fn test_rim_is_lower_than_interior_boost() {
        // На краю маска и подъём обнуляются
        let tiles = generate_field(&params(11, 0.0));
        let rim_max = tiles
            .iter()
            .filter(|t| t.coord.length() == 10)
            .map(|t| t.elevation)
            .fold(0.0_f32, f32::max);
        assert!(rim_max < 0.35, "rim elevation {rim_max} is too high");
    }

    #[test]
    fn test_island_mode_drops_low_tiles() {
        let tiles = generate_field(&params(5, 0.2));
        assert!(tiles.len() < 331);
        assert!(tiles.iter().all(|t| t.elevation >= 0.2));
    }

    #[test]
    fn test_same_seed_same_field() {
        assert_eq!(generate_field(&params(9, 0.0)), generate_field(&params(9, 0.0)));
        assert_ne!(generate_field(&params(9, 0.0)), generate_field(&params(10, 0.0)));
    }
}

//! Seeded Perlin noise
//!
//! Classic improved Perlin noise over the standard permutation table, with
//! the seed folded into the lattice hash. 2D samples are taken from the
//! `z = 0` slice of the 3D field.

use glam::{DVec2, DVec3};

use super::NoiseFn;

/// Configuration for fractal Perlin noise
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerlinConfig {
    /// Frequency of the first octave (lower = larger features)
    pub base_frequency: f64,
    /// Number of octaves
    pub octaves: usize,
    /// Amplitude decay per octave
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl Default for PerlinConfig {
    fn default() -> Self {
        Self {
            base_frequency: 1.0 / 256.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

// Ken Perlin's reference permutation; changing it changes every map
const PERM: [u32; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn hash(x: i64, y: i64, z: i64, seed: u32) -> u32 {
    let seed_hash = (seed.wrapping_mul(1103515245).wrapping_add(12345)) >> 16;
    let ix = ((x as u32) ^ seed_hash) & 255;
    let iy = ((y as u32) ^ (seed_hash >> 8)) & 255;
    let iz = ((z as u32) ^ (seed_hash >> 16)) & 255;
    let a = PERM[ix as usize];
    let b = PERM[((a + iy) & 255) as usize];
    PERM[((b + iz) & 255) as usize]
}

/// Dot product with one of the 12 cube edge gradients
#[inline]
fn gradient(hash_value: u32, x: f64, y: f64, z: f64) -> f64 {
    let h = hash_value & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        z
    } else {
        x
    };

    let sign_u = if (h & 1) == 0 { -u } else { u };
    let sign_v = if (h & 2) == 0 { -v } else { v };
    sign_u + sign_v
}

/// 6t⁵ - 15t⁴ + 10t³
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Single octave in `[-1, 1]`
fn perlin_3d(pos: DVec3, seed: u32) -> f64 {
    let floor = pos.floor();
    let (x0, y0, z0) = (floor.x as i64, floor.y as i64, floor.z as i64);
    let (x1, y1, z1) = (x0 + 1, y0 + 1, z0 + 1);
    let f = pos - floor;

    let u = fade(f.x);
    let v = fade(f.y);
    let w = fade(f.z);

    let g_aaa = gradient(hash(x0, y0, z0, seed), f.x, f.y, f.z);
    let g_baa = gradient(hash(x1, y0, z0, seed), f.x - 1.0, f.y, f.z);
    let g_aba = gradient(hash(x0, y1, z0, seed), f.x, f.y - 1.0, f.z);
    let g_bba = gradient(hash(x1, y1, z0, seed), f.x - 1.0, f.y - 1.0, f.z);
    let g_aab = gradient(hash(x0, y0, z1, seed), f.x, f.y, f.z - 1.0);
    let g_bab = gradient(hash(x1, y0, z1, seed), f.x - 1.0, f.y, f.z - 1.0);
    let g_abb = gradient(hash(x0, y1, z1, seed), f.x, f.y - 1.0, f.z - 1.0);
    let g_bbb = gradient(hash(x1, y1, z1, seed), f.x - 1.0, f.y - 1.0, f.z - 1.0);

    let x00 = lerp(g_aaa, g_baa, u);
    let x10 = lerp(g_aba, g_bba, u);
    let x01 = lerp(g_aab, g_bab, u);
    let x11 = lerp(g_abb, g_bbb, u);
    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Seeded fractal Perlin noise
///
/// As a [`NoiseFn`] it yields the fractal sum at `(x, y, 0)`, normalized to
/// roughly `[-1, 1]`, so about half of the plane samples below zero. That
/// makes it usable as a height function for
/// [`OceanLandProcessor`](crate::OceanLandProcessor) as is.
///
/// # Example
///
/// ```
/// use voronoi_cellmap::{NoiseFn, PerlinNoise};
///
/// let noise = PerlinNoise::new(7);
/// let a = noise.get(120.0, -33.5);
/// assert_eq!(a, PerlinNoise::new(7).get(120.0, -33.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerlinNoise {
    seed: u32,
    config: PerlinConfig,
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self::with_config(seed, PerlinConfig::default())
    }

    pub fn with_config(seed: u32, config: PerlinConfig) -> Self {
        Self { seed, config }
    }

    /// Noise seeded from a 64-bit map seed
    pub fn from_map_seed(seed: u64) -> Self {
        Self::new((seed ^ (seed >> 32)) as u32)
    }

    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    pub fn config(&self) -> &PerlinConfig {
        &self.config
    }

    /// Fractal noise at a 3D position, roughly in `[-1, 1]`
    pub fn fbm_3d(&self, position: DVec3) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.base_frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            total += perlin_3d(position * frequency, self.seed) * amplitude;
            max_value += amplitude;
            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_value == 0.0 {
            0.0
        } else {
            total / max_value
        }
    }

    /// Fractal noise at a 2D position, roughly in `[-1, 1]`
    #[inline]
    pub fn fbm_2d(&self, position: DVec2) -> f64 {
        self.fbm_3d(position.extend(0.0))
    }

    /// Fractal noise remapped to `[0, 1]`
    pub fn sample_unit(&self, position: DVec2) -> f64 {
        ((self.fbm_2d(position) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl NoiseFn for PerlinNoise {
    fn get(&self, x: f64, y: f64) -> f64 {
        self.fbm_2d(DVec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let noise = PerlinNoise::new(42);
        let position = DVec2::new(310.5, -70.25);
        assert_eq!(noise.fbm_2d(position), noise.fbm_2d(position));
        assert_eq!(noise.get(1.0, 2.0), PerlinNoise::new(42).get(1.0, 2.0));
    }

    #[test]
    fn test_range() {
        let noise = PerlinNoise::new(12345);
        for i in 0..200 {
            let p = DVec2::new(i as f64 * 37.3 - 3000.0, i as f64 * -11.9 + 50.0);
            let value = noise.fbm_2d(p);
            assert!(value.abs() <= 1.05, "{} at {} out of range", value, p);
            let unit = noise.sample_unit(p);
            assert!((0.0..=1.0).contains(&unit));
        }
    }

    #[test]
    fn test_different_seeds() {
        let position = DVec3::new(0.5, 0.5, 0.5);
        assert_ne!(perlin_3d(position, 42), perlin_3d(position, 999));
    }

    #[test]
    fn test_zero_on_lattice() {
        // Every gradient term vanishes at integer coordinates
        assert_eq!(perlin_3d(DVec3::new(3.0, -4.0, 0.0), 1), 0.0);
    }

    #[test]
    fn test_zero_octaves() {
        let config = PerlinConfig {
            octaves: 0,
            ..PerlinConfig::default()
        };
        assert_eq!(PerlinNoise::with_config(1, config).get(5.5, 5.5), 0.0);
    }

    #[test]
    fn test_from_map_seed() {
        assert_eq!(PerlinNoise::from_map_seed(0x0000_0001_0000_0001).seed(), 0);
        assert_eq!(PerlinNoise::from_map_seed(5).seed(), 5);
    }
}

//! Noise functions consumed by the processors
//!
//! Processors treat terrain as opaque `(x, y) -> f64` functions. Any closure
//! with that signature works, as do [`ConstantNoise`] and [`PerlinNoise`].

mod perlin;

pub use perlin::{PerlinConfig, PerlinNoise};

/// A 2D scalar field
pub trait NoiseFn {
    /// Sample the field at a world position
    fn get(&self, x: f64, y: f64) -> f64;
}

impl<F> NoiseFn for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn get(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// The same value everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantNoise(pub f64);

impl NoiseFn for ConstantNoise {
    #[inline]
    fn get(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_noise() {
        let slope = |x: f64, y: f64| x - 2.0 * y;
        assert_eq!(slope.get(4.0, 1.0), 2.0);
    }

    #[test]
    fn test_constant_noise() {
        let noise = ConstantNoise(-0.5);
        assert_eq!(noise.get(0.0, 0.0), -0.5);
        assert_eq!(noise.get(1e9, -1e9), -0.5);
    }
}

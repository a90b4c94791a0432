//! Elevation and population sampling.
//!
//! The generator never owns terrain data; it reads it through `Terrain`. Two
//! sources are provided: `Raster`, an RGBA8 framebuffer-style texture covering
//! city space (population in red, elevation in green), and `FlatTerrain`, a
//! constant field used by tests and demos.
//!
//! Values are byte intensities in `0..=255` for rasters. They are opaque to the
//! generator: only compared against the water level and multiplied in scoring.

use std::fmt;

use crate::geom::Point;

/// Sampling interface consumed by `crate::generator::RoadGenerator`.
pub trait Terrain {
    fn elevation(&self, p: Point) -> f64;
    fn population(&self, p: Point) -> f64;

    /// City-space extent the source was built for, if it has one.
    fn extent(&self) -> Option<(f64, f64)> {
        None
    }
}

impl<T: Terrain + ?Sized> Terrain for &T {
    fn elevation(&self, p: Point) -> f64 {
        (**self).elevation(p)
    }

    fn population(&self, p: Point) -> f64 {
        (**self).population(p)
    }

    fn extent(&self) -> Option<(f64, f64)> {
        (**self).extent()
    }
}

/// Raster construction failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterError {
    Empty,
    SizeMismatch { expected: usize, actual: usize },
    BadExtent,
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "raster has zero texels"),
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "raster buffer holds {actual} bytes, expected {expected} (4 per texel)"
            ),
            Self::BadExtent => write!(f, "raster extent must be finite and > 0"),
        }
    }
}

impl std::error::Error for RasterError {}

const POPULATION_CHANNEL: usize = 0;
const ELEVATION_CHANNEL: usize = 1;

/// RGBA8 texture stretched over `[0, city_width] × [0, city_height]`.
#[derive(Clone, Debug)]
pub struct Raster {
    data: Vec<u8>,
    width: usize,
    height: usize,
    city_width: f64,
    city_height: f64,
}

impl Raster {
    /// Wrap a row-major RGBA8 buffer of `width × height` texels.
    pub fn from_rgba(
        data: Vec<u8>,
        width: usize,
        height: usize,
        city_width: f64,
        city_height: f64,
    ) -> Result<Self, RasterError> {
        let texels = width.checked_mul(height).ok_or(RasterError::Empty)?;
        if texels == 0 {
            return Err(RasterError::Empty);
        }
        let expected = texels * 4;
        if data.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(city_width) || !ok(city_height) {
            return Err(RasterError::BadExtent);
        }
        Ok(Self {
            data,
            width,
            height,
            city_width,
            city_height,
        })
    }

    /// Build a raster from a per-texel `(population, elevation)` closure.
    ///
    /// The closure receives the city-space center of each texel.
    pub fn from_fn(
        width: usize,
        height: usize,
        city_width: f64,
        city_height: f64,
        mut f: impl FnMut(Point) -> (u8, u8),
    ) -> Result<Self, RasterError> {
        let mut data = Vec::with_capacity(width.saturating_mul(height).saturating_mul(4));
        let sx = city_width / width.max(1) as f64;
        let sy = city_height / height.max(1) as f64;
        for ty in 0..height {
            for tx in 0..width {
                let center = Point::new((tx as f64 + 0.5) * sx, (ty as f64 + 0.5) * sy);
                let (pop, elev) = f(center);
                data.extend_from_slice(&[pop, elev, 0, 255]);
            }
        }
        Self::from_rgba(data, width, height, city_width, city_height)
    }

    #[inline]
    pub fn texels(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of the texel under `p`, clamped into the texture.
    fn offset(&self, p: Point) -> usize {
        let tx = (p.x / self.city_width * self.width as f64).floor();
        let ty = (p.y / self.city_height * self.height as f64).floor();
        // NaN maps to 0 under `as`.
        let tx = (tx.max(0.0) as usize).min(self.width - 1);
        let ty = (ty.max(0.0) as usize).min(self.height - 1);
        4 * (tx + self.width * ty)
    }

    #[inline]
    fn channel(&self, p: Point, ch: usize) -> f64 {
        f64::from(self.data[self.offset(p) + ch])
    }
}

impl Terrain for Raster {
    fn elevation(&self, p: Point) -> f64 {
        self.channel(p, ELEVATION_CHANNEL)
    }

    fn population(&self, p: Point) -> f64 {
        self.channel(p, POPULATION_CHANNEL)
    }

    fn extent(&self) -> Option<(f64, f64)> {
        Some((self.city_width, self.city_height))
    }
}

/// Constant terrain; fits any city extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTerrain {
    pub elevation: f64,
    pub population: f64,
}

impl FlatTerrain {
    pub fn new(elevation: f64, population: f64) -> Self {
        Self {
            elevation,
            population,
        }
    }
}

impl Terrain for FlatTerrain {
    fn elevation(&self, _p: Point) -> f64 {
        self.elevation
    }

    fn population(&self, _p: Point) -> f64 {
        self.population
    }
}

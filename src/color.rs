//! Elevation to colour mapping for coloured mesh exports.

use crate::float_types::Real;

/// Linear RGB with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: Real,
    pub g: Real,
    pub b: Real,
}

impl Rgb {
    pub const fn new(r: Real, g: Real, b: Real) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: Real) -> Self {
        Self::new(v, v, v)
    }

    pub fn lerp(&self, other: &Rgb, t: Real) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn scaled(&self, k: Real) -> Rgb {
        Rgb::new(self.r * k, self.g * k, self.b * k)
    }

    /// Components as bytes, rounding and clamping.
    pub fn to_u8(&self) -> [u8; 3] {
        let q = |v: Real| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

/// A colour pinned at a normalized elevation in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: Real,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(position: Real, color: Rgb) -> Self {
        Self { position, color }
    }
}

const TERRAIN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, Rgb::new(0.4, 0.2, 0.1)),
    ColorStop::new(0.3, Rgb::new(0.2, 0.6, 0.1)),
    ColorStop::new(0.7, Rgb::new(0.8, 0.8, 0.6)),
    ColorStop::new(1.0, Rgb::new(1.0, 1.0, 1.0)),
];

const RAINBOW_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, Rgb::new(0.5, 0.0, 1.0)),
    ColorStop::new(0.2, Rgb::new(0.0, 0.0, 1.0)),
    ColorStop::new(0.4, Rgb::new(0.0, 1.0, 1.0)),
    ColorStop::new(0.6, Rgb::new(0.0, 1.0, 0.0)),
    ColorStop::new(0.8, Rgb::new(1.0, 1.0, 0.0)),
    ColorStop::new(1.0, Rgb::new(1.0, 0.0, 0.0)),
];

const GRAYSCALE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, Rgb::gray(0.0)),
    ColorStop::new(1.0, Rgb::gray(1.0)),
];

/// Named presets plus caller-supplied stops.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ColorScheme {
    /// Brown lowlands, green, sand, white peaks.
    #[default]
    Terrain,
    Rainbow,
    Grayscale,
    /// Stops in any order; they are sorted by position when the mapper is built.
    Custom(Vec<ColorStop>),
}

impl ColorScheme {
    /// Stops sorted by position.
    pub fn stops(&self) -> Vec<ColorStop> {
        match self {
            ColorScheme::Terrain => TERRAIN_STOPS.to_vec(),
            ColorScheme::Rainbow => RAINBOW_STOPS.to_vec(),
            ColorScheme::Grayscale => GRAYSCALE_STOPS.to_vec(),
            ColorScheme::Custom(stops) => {
                let mut stops = stops.clone();
                stops.sort_by(|a, b| a.position.total_cmp(&b.position));
                stops
            },
        }
    }
}

/// A named Phong material for one elevation band.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: Rgb,
    pub ambient: Rgb,
    pub specular: Rgb,
    pub shininess: Real,
    /// Elevation the material was sampled at.
    pub elevation: Real,
}

impl Material {
    pub const AMBIENT_FACTOR: Real = 0.3;
    pub const SPECULAR: Real = 0.1;
    pub const SHININESS: Real = 10.0;

    /// Derives ambient, specular and shininess from `diffuse` with the fixed shading convention.
    pub fn from_diffuse(elevation: Real, diffuse: Rgb) -> Self {
        Self {
            name: format!("elevation_{}m", elevation as i64),
            diffuse,
            ambient: diffuse.scaled(Self::AMBIENT_FACTOR),
            specular: Rgb::gray(Self::SPECULAR),
            shininess: Self::SHININESS,
            elevation,
        }
    }
}

/// Maps elevations in a known range to colours.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapper {
    stops: Vec<ColorStop>,
    min: Real,
    max: Real,
}

impl ColorMapper {
    pub fn new(scheme: &ColorScheme, min: Real, max: Real) -> Self {
        Self {
            stops: scheme.stops(),
            min,
            max,
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Elevation scaled to `[0, 1]`. A zero or inverted range maps everything to 0.
    pub fn normalize(&self, elevation: Real) -> Real {
        let range = self.max - self.min;
        if !(range > 0.0) {
            return 0.0;
        }
        ((elevation - self.min) / range).clamp(0.0, 1.0)
    }

    /// Colour for `elevation`. Out-of-range input takes the boundary colour.
    pub fn color_at(&self, elevation: Real) -> Rgb {
        self.color_at_normalized(self.normalize(elevation))
    }

    /// Colour at normalized position `t`, interpolating between the bracketing stops.
    pub fn color_at_normalized(&self, t: Real) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Rgb::gray(t),
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t >= lo.position && t <= hi.position {
                let span = hi.position - lo.position;
                if span <= 0.0 {
                    return hi.color;
                }
                return lo.color.lerp(&hi.color, (t - lo.position) / span);
            }
        }
        last.color
    }

    /// `count` materials evenly spaced over the range, lowest first.
    pub fn generate_elevation_materials(&self, count: usize) -> Vec<Material> {
        match count {
            0 => Vec::new(),
            1 => vec![Material::from_diffuse(self.min, self.color_at(self.min))],
            n => (0..n)
                .map(|i| {
                    let elevation = self.min + (self.max - self.min) * i as Real / (n - 1) as Real;
                    Material::from_diffuse(elevation, self.color_at(elevation))
                })
                .collect(),
        }
    }

    /// Index of the material band closest to `elevation` among `count` bands.
    pub fn band_index(&self, elevation: Real, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        let t = self.normalize(elevation);
        ((t * (count - 1) as Real).round() as usize).min(count - 1)
    }
}

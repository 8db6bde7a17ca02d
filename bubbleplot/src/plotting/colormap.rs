use std::str::FromStr;

use plotters::style::RGBColor;

use crate::errors::PlotError;

type Stop = (u8, u8, u8);

const VIRIDIS: &[Stop] = &[
    (68, 1, 84),
    (72, 40, 120),
    (62, 74, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (109, 205, 89),
    (180, 222, 44),
    (253, 231, 37),
];

const PLASMA: &[Stop] = &[
    (13, 8, 135),
    (84, 2, 163),
    (139, 10, 165),
    (185, 50, 137),
    (219, 92, 104),
    (244, 136, 73),
    (254, 188, 43),
    (240, 249, 33),
];

const MAGMA: &[Stop] = &[
    (0, 0, 4),
    (28, 16, 68),
    (79, 18, 123),
    (129, 37, 129),
    (181, 54, 122),
    (229, 80, 100),
    (251, 135, 97),
    (254, 194, 135),
    (252, 253, 191),
];

const INFERNO: &[Stop] = &[
    (0, 0, 4),
    (31, 12, 72),
    (85, 15, 109),
    (136, 34, 106),
    (186, 54, 85),
    (227, 89, 51),
    (249, 140, 10),
    (249, 201, 50),
    (252, 255, 164),
];

const CIVIDIS: &[Stop] = &[
    (0, 34, 78),
    (18, 53, 112),
    (59, 73, 108),
    (87, 93, 109),
    (112, 113, 115),
    (138, 134, 120),
    (165, 156, 116),
    (195, 179, 105),
    (225, 204, 85),
    (254, 232, 56),
];

const COOLWARM: &[Stop] = &[
    (59, 76, 192),
    (98, 130, 234),
    (141, 176, 254),
    (184, 208, 249),
    (221, 221, 221),
    (245, 196, 173),
    (244, 154, 123),
    (222, 96, 77),
    (180, 4, 38),
];

const RDBU: &[Stop] = &[
    (103, 0, 31),
    (178, 24, 43),
    (214, 96, 77),
    (244, 165, 130),
    (253, 219, 199),
    (247, 247, 247),
    (209, 229, 240),
    (146, 197, 222),
    (67, 147, 195),
    (33, 102, 172),
    (5, 48, 97),
];

const BLUES: &[Stop] = &[
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

const REDS: &[Stop] = &[
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

const PALETTES: &[(&str, &[Stop])] = &[
    ("viridis", VIRIDIS),
    ("plasma", PLASMA),
    ("magma", MAGMA),
    ("inferno", INFERNO),
    ("cividis", CIVIDIS),
    ("coolwarm", COOLWARM),
    ("rdbu", RDBU),
    ("blues", BLUES),
    ("reds", REDS),
];

/// Continuous colour scale, linear between anchor colours. Named like the
/// matplotlib maps; a `_r` suffix reverses the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    name: String,
    stops: &'static [Stop],
    reversed: bool,
}

impl ColorMap {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Colour at `t` in [0, 1]; values outside are clamped.
    pub fn at(&self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
        let t = if self.reversed { 1.0 - t } else { t };

        let segments = (self.stops.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - idx as f64;

        let (r0, g0, b0) = self.stops[idx];
        let (r1, g1, b1) = self.stops[idx + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Colour for `value` on the scale `[lo, hi]`. A degenerate scale maps to
    /// the middle colour.
    pub fn for_value(&self, value: f64, lo: f64, hi: f64) -> RGBColor {
        if (hi - lo).abs() < f64::EPSILON {
            return self.at(0.5);
        }
        self.at((value - lo) / (hi - lo))
    }

    pub fn available() -> Vec<&'static str> {
        PALETTES.iter().map(|(name, _)| *name).collect()
    }
}

impl FromStr for ColorMap {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (base, reversed) = match lowered.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lowered.as_str(), false),
        };
        PALETTES
            .iter()
            .find(|(name, _)| *name == base)
            .map(|(_, stops)| ColorMap {
                name: s.trim().to_string(),
                stops,
                reversed,
            })
            .ok_or_else(|| {
                PlotError::InvalidConfig(format!(
                    "unknown colour map `{s}` (available: {}, each also with a `_r` suffix)",
                    ColorMap::available().join(", ")
                ))
            })
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{CalheatError, CalheatResult};
use crate::grid::mapper::ValueRange;

/// Named sequential color scale.
///
/// Every renderer maps values through [`ColorScale::color_for`], so two panels using the same
/// scale and range show identical colors for identical values regardless of backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorScale {
    /// Yellow → orange → brown.
    #[default]
    YlOrBr,
    /// Yellow → green → blue.
    YlGnBu,
    /// Light → dark green.
    Greens,
    /// White → black.
    Greys,
    /// Perceptually uniform purple → yellow.
    Viridis,
}

const YL_OR_BR: &[Rgb8] = &[
    Rgb8::new(255, 255, 229),
    Rgb8::new(255, 247, 188),
    Rgb8::new(254, 227, 145),
    Rgb8::new(254, 196, 79),
    Rgb8::new(254, 153, 41),
    Rgb8::new(236, 112, 20),
    Rgb8::new(204, 76, 2),
    Rgb8::new(153, 52, 4),
    Rgb8::new(102, 37, 6),
];

const YL_GN_BU: &[Rgb8] = &[
    Rgb8::new(255, 255, 217),
    Rgb8::new(237, 248, 177),
    Rgb8::new(199, 233, 180),
    Rgb8::new(127, 205, 187),
    Rgb8::new(65, 182, 196),
    Rgb8::new(29, 145, 192),
    Rgb8::new(34, 94, 168),
    Rgb8::new(37, 52, 148),
    Rgb8::new(8, 29, 88),
];

const GREENS: &[Rgb8] = &[
    Rgb8::new(247, 252, 245),
    Rgb8::new(229, 245, 224),
    Rgb8::new(199, 233, 192),
    Rgb8::new(161, 217, 155),
    Rgb8::new(116, 196, 118),
    Rgb8::new(65, 171, 93),
    Rgb8::new(35, 139, 69),
    Rgb8::new(0, 109, 44),
    Rgb8::new(0, 68, 27),
];

const GREYS: &[Rgb8] = &[
    Rgb8::new(255, 255, 255),
    Rgb8::new(240, 240, 240),
    Rgb8::new(217, 217, 217),
    Rgb8::new(189, 189, 189),
    Rgb8::new(150, 150, 150),
    Rgb8::new(115, 115, 115),
    Rgb8::new(82, 82, 82),
    Rgb8::new(37, 37, 37),
    Rgb8::new(0, 0, 0),
];

const VIRIDIS: &[Rgb8] = &[
    Rgb8::new(0x44, 0x01, 0x54),
    Rgb8::new(0x48, 0x28, 0x78),
    Rgb8::new(0x3e, 0x49, 0x89),
    Rgb8::new(0x31, 0x68, 0x8e),
    Rgb8::new(0x26, 0x82, 0x8e),
    Rgb8::new(0x1f, 0x9e, 0x89),
    Rgb8::new(0x35, 0xb7, 0x79),
    Rgb8::new(0x6e, 0xce, 0x58),
    Rgb8::new(0xb5, 0xde, 0x2b),
    Rgb8::new(0xfd, 0xe7, 0x25),
];

impl ColorScale {
    /// All known scales.
    pub const ALL: [ColorScale; 5] = [
        ColorScale::YlOrBr,
        ColorScale::YlGnBu,
        ColorScale::Greens,
        ColorScale::Greys,
        ColorScale::Viridis,
    ];

    /// Identifier used in configuration files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ColorScale::YlOrBr => "YlOrBr",
            ColorScale::YlGnBu => "YlGnBu",
            ColorScale::Greens => "Greens",
            ColorScale::Greys => "Greys",
            ColorScale::Viridis => "Viridis",
        }
    }

    /// Evenly spaced color stops, lowest intensity first.
    pub fn stops(self) -> &'static [Rgb8] {
        match self {
            ColorScale::YlOrBr => YL_OR_BR,
            ColorScale::YlGnBu => YL_GN_BU,
            ColorScale::Greens => GREENS,
            ColorScale::Greys => GREYS,
            ColorScale::Viridis => VIRIDIS,
        }
    }

    /// Color used for the lowest value of any range.
    pub fn min_color(self) -> Rgb8 {
        self.sample(0.0)
    }

    /// Color used for the highest value of a non-degenerate range.
    pub fn max_color(self) -> Rgb8 {
        self.sample(1.0)
    }

    /// Piecewise-linear sample at `t` in `0..=1`.
    pub fn sample(self, t: f64) -> Rgb8 {
        let stops = self.stops();
        let last = stops.len() - 1;
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return stops[last];
        }
        stops[i].lerp(stops[i + 1], pos - i as f64)
    }

    /// Color of `value` scaled into `range`.
    pub fn color_for(self, value: f64, range: ValueRange) -> Rgb8 {
        self.sample(range.normalize(value))
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScale {
    type Err = CalheatError;

    fn from_str(s: &str) -> CalheatResult<Self> {
        let s = s.trim();
        ColorScale::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = ColorScale::ALL.iter().map(|c| c.name()).collect();
                CalheatError::validation(format!(
                    "unknown color scale \"{s}\" (known: {})",
                    known.join(", ")
                ))
            })
    }
}

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

use crate::data::model::Value;
use crate::view::ColorScheme;

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

/// Colour of a medal category; anything else (the sentinel) is grey.
pub fn medal_color(medal: &str) -> Color32 {
    match medal {
        "Gold" => Color32::from_rgb(255, 215, 0),
        "Silver" => Color32::from_rgb(192, 192, 192),
        "Bronze" => Color32::from_rgb(165, 42, 42),
        _ => Color32::from_rgb(128, 128, 128),
    }
}

/// Men blue, women pink.
pub fn sex_color(sex: &str) -> Color32 {
    match sex {
        "M" => Color32::from_rgb(0, 0, 255),
        "F" => Color32::from_rgb(255, 192, 203),
        _ => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Sequential scale
// ---------------------------------------------------------------------------

/// Viridis control points, dark to light.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Colour for `t` in `[0, 1]` on a viridis-like scale, mixed in linear RGB.
pub fn sequential(t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lo as f32;

    let linear = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = linear(VIRIDIS[lo]).mix(linear(VIRIDIS[lo + 1]), frac);
    to_color32(Srgb::from_linear(mixed))
}

// ---------------------------------------------------------------------------
// Color mapping: series value → Color32
// ---------------------------------------------------------------------------

/// Maps the series values of a chart to colours according to its scheme.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given series values.
    ///
    /// Under [`ColorScheme::Sequential`] the values are spread evenly along
    /// the scale in their sorted order.
    pub fn new(scheme: ColorScheme, values: &BTreeSet<Value>) -> Self {
        let last = values.len().saturating_sub(1).max(1) as f32;
        let mapping: BTreeMap<Value, Color32> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let text = v.to_string();
                let color = match scheme {
                    ColorScheme::BySex => sex_color(&text),
                    ColorScheme::ByMedal => medal_color(&text),
                    ColorScheme::Single([r, g, b]) => Color32::from_rgb(r, g, b),
                    ColorScheme::Sequential => sequential(i as f32 / last),
                };
                (v.clone(), color)
            })
            .collect();

        let default_color = match scheme {
            ColorScheme::Single([r, g, b]) => Color32::from_rgb(r, g, b),
            _ => Color32::LIGHT_BLUE,
        };
        ColorMap {
            mapping,
            default_color,
        }
    }

    /// Look up the colour for a given series value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

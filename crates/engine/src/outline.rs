use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Angle between two projections of one outline ring, in degrees.
pub const OUTLINE_ANGLE_STEP_DEG: u32 = 30;
/// Projections generated per ring.
pub const LAYERS_PER_RING: usize = (360 / OUTLINE_ANGLE_STEP_DEG) as usize;
/// Widest outline generated, in pixels. Larger widths are capped.
pub const MAX_OUTLINE_WIDTH: u32 = 64;

/// One zero-blur offset shadow of the synthetic outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowLayer {
    pub x: i32,
    pub y: i32,
    pub blur: u32,
    pub color: String,
}

impl Display for ShadowLayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px {}px {} {}", self.x, self.y, self.blur, self.color)
    }
}

/// Builds the ring halo that approximates a stroke around the glyphs.
///
/// For a width `w` (rounded, at least 1) every radius `1..=w` gets one layer
/// per [`OUTLINE_ANGLE_STEP_DEG`], so the result has exactly
/// `w * LAYERS_PER_RING` layers. Outline off or a non-positive width yields
/// no layers.
///
/// # Example
/// ```
/// use engine::outline::{LAYERS_PER_RING, outline_layers};
///
/// assert_eq!(outline_layers(true, 2.0, "#000").len(), 2 * LAYERS_PER_RING);
/// assert!(outline_layers(false, 2.0, "#000").is_empty());
/// assert!(outline_layers(true, 0.0, "#000").is_empty());
/// ```
pub fn outline_layers(enabled: bool, width: f64, color: &str) -> Vec<ShadowLayer> {
    if !enabled || !width.is_finite() || width <= 0.0 {
        return Vec::new();
    }
    let rings = (round_half_up(width).max(1.0) as u32).min(MAX_OUTLINE_WIDTH);

    let mut layers = Vec::with_capacity(rings as usize * LAYERS_PER_RING);
    for radius in 1..=rings {
        let radius = f64::from(radius);
        for step in 0..LAYERS_PER_RING as u32 {
            let angle = f64::from(step * OUTLINE_ANGLE_STEP_DEG) * PI / 180.0;
            layers.push(ShadowLayer {
                x: round_half_up(angle.cos() * radius) as i32,
                y: round_half_up(angle.sin() * radius) as i32,
                blur: 0,
                color: color.to_owned(),
            });
        }
    }
    layers
}

/// Renders layers as a `text-shadow` declaration, or `""` when there are none.
pub fn outline_css(layers: &[ShadowLayer]) -> String {
    if layers.is_empty() {
        return String::new();
    }
    let joined = layers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("text-shadow: {joined};")
}

// Ties round towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

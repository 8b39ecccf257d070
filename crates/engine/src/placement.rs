use serde::{Deserialize, Serialize};

use crate::time::deserialize_optional_number;

pub const DEFAULT_BOX_WIDTH: f64 = 0.7;
pub const DEFAULT_BOX_HEIGHT: f64 = 0.1;
pub const DEFAULT_BOX_LEFT: f64 = 0.5;
pub const DEFAULT_BOX_BOTTOM: f64 = 0.0;

const WIDTH_RANGE: (f64, f64) = (0.2, 0.95);
const HEIGHT_RANGE: (f64, f64) = (0.05, 0.8);
const LEFT_RANGE: (f64, f64) = (0.05, 0.95);
const BOTTOM_RANGE: (f64, f64) = (0.0, 0.8);

/// Axis-aligned rectangle in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Subtitle box placement as fractions of the preview area.
///
/// `left` is the horizontal position of the box center and `bottom` the gap
/// between the box and the bottom edge of the preview. Every constructor
/// clamps, so a value of this type is always inside its documented ranges:
///
/// | field    | range         | default |
/// |----------|---------------|---------|
/// | `width`  | `0.2..=0.95`  | `0.7`   |
/// | `height` | `0.05..=0.8`  | `0.1`   |
/// | `left`   | `0.05..=0.95` | `0.5`   |
/// | `bottom` | `0.0..=0.8`   | `0.0`   |
///
/// Missing, zero or non-finite inputs fall back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSubtitleBox")]
pub struct SubtitleBox {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub bottom: f64,
}

impl Default for SubtitleBox {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOX_WIDTH,
            height: DEFAULT_BOX_HEIGHT,
            left: DEFAULT_BOX_LEFT,
            bottom: DEFAULT_BOX_BOTTOM,
        }
    }
}

impl SubtitleBox {
    pub fn new(width: f64, height: f64, left: f64, bottom: f64) -> Self {
        Self {
            width: clamp_or_default(width, WIDTH_RANGE, DEFAULT_BOX_WIDTH),
            height: clamp_or_default(height, HEIGHT_RANGE, DEFAULT_BOX_HEIGHT),
            left: clamp_or_default(left, LEFT_RANGE, DEFAULT_BOX_LEFT),
            bottom: clamp_or_default(bottom, BOTTOM_RANGE, DEFAULT_BOX_BOTTOM),
        }
    }

    /// Measures a box drawn at `subtitle` inside `preview`.
    ///
    /// # Example
    /// ```
    /// use engine::placement::{PixelRect, SubtitleBox};
    ///
    /// let preview = PixelRect::new(0.0, 0.0, 1000.0, 500.0);
    /// let drawn = PixelRect::new(250.0, 400.0, 500.0, 50.0);
    /// let placed = SubtitleBox::from_pixels(preview, drawn);
    /// assert_eq!(placed, SubtitleBox::new(0.5, 0.1, 0.5, 0.1));
    /// ```
    pub fn from_pixels(preview: PixelRect, subtitle: PixelRect) -> Self {
        Self::new(
            subtitle.width / preview.width,
            subtitle.height / preview.height,
            (subtitle.center_x() - preview.x) / preview.width,
            (preview.bottom() - subtitle.bottom()) / preview.height,
        )
    }

    /// Pixel rectangle of this box inside `preview`.
    pub fn to_pixels(&self, preview: PixelRect) -> PixelRect {
        let width = self.width * preview.width;
        let height = self.height * preview.height;
        let center_x = preview.x + self.left * preview.width;
        let bottom = preview.bottom() - self.bottom * preview.height;
        PixelRect::new(center_x - width / 2.0, bottom - height, width, height)
    }

    /// Moves the box by a drag of `dx`/`dy` pixels (screen axes, y down).
    pub fn dragged_by(&self, dx: f64, dy: f64, preview: PixelRect) -> Self {
        let mut rect = self.to_pixels(preview);
        rect.x += dx;
        rect.y += dy;
        Self::from_pixels(preview, rect)
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSubtitleBox {
    #[serde(deserialize_with = "deserialize_optional_number")]
    width: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    height: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    left: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    bottom: Option<f64>,
}

impl From<RawSubtitleBox> for SubtitleBox {
    fn from(raw: RawSubtitleBox) -> Self {
        Self::new(
            raw.width.unwrap_or(0.0),
            raw.height.unwrap_or(0.0),
            raw.left.unwrap_or(0.0),
            raw.bottom.unwrap_or(0.0),
        )
    }
}

fn clamp_or_default(value: f64, (min, max): (f64, f64), default: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return default;
    }
    value.clamp(min, max)
}

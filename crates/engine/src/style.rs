use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::time::deserialize_optional_number;

pub const DEFAULT_FONT_FAMILY: &str = "system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif";
pub const DEFAULT_FONT_SIZE_PX: f64 = 28.0;
pub const DEFAULT_DONE_COLOR: &str = "#ffea00";
pub const DEFAULT_REST_COLOR: &str = "#ffffff";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";
pub const DEFAULT_BACKGROUND_OPACITY: f64 = 15.0;
pub const DEFAULT_BORDER_COLOR: &str = "#000000";

/// Raw values of the style controls, any of which may be unset.
///
/// Field names match the keys stored in project files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleControls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Percent, `0..=100`.
    #[serde(
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_on: Option<bool>,
}

/// Background color with alpha, rendered as `rgba(r, g, b, a)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Combines a `#rrggbb` color with `alpha`.
    ///
    /// Anything that is not a six-digit hex color yields black at `alpha`.
    ///
    /// # Example
    /// ```
    /// use engine::style::Rgba;
    ///
    /// assert_eq!(Rgba::from_hex("#FF8000", 0.5).to_string(), "rgba(255, 128, 0, 0.5)");
    /// assert_eq!(Rgba::from_hex("oops", 0.2).to_string(), "rgba(0, 0, 0, 0.2)");
    /// ```
    pub fn from_hex(hex: &str, alpha: f64) -> Self {
        let [r, g, b] = parse_hex_rgb(hex).unwrap_or([0, 0, 0]);
        Self { r, g, b, a: alpha }
    }
}

impl Display for Rgba {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Fully resolved overlay style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub font_family: String,
    pub font_size_px: f64,
    pub done_color: String,
    pub rest_color: String,
    pub background_rgba: Rgba,
    pub border_on: bool,
    pub border_color: String,
    pub border_width: f64,
    pub shadow_on: bool,
}

impl Default for Style {
    fn default() -> Self {
        resolve(&StyleControls::default())
    }
}

/// Resolves control values into a [`Style`].
///
/// Pure: the same controls always produce the same style. Unset, empty or
/// malformed values fall back to the documented defaults.
///
/// # Example
/// ```
/// use engine::style::{StyleControls, resolve};
///
/// let style = resolve(&StyleControls::default());
/// assert_eq!(style.font_size_px, 28.0);
/// assert_eq!(style.done_color, "#ffea00");
/// assert_eq!(style.background_rgba.to_string(), "rgba(0, 0, 0, 0.15)");
/// ```
pub fn resolve(controls: &StyleControls) -> Style {
    let font_family = controls
        .font_family
        .as_deref()
        .map(str::trim)
        .filter(|family| !family.is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY)
        .to_owned();
    let font_size_px = controls
        .font_size_px
        .filter(|size| size.is_finite() && *size > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE_PX);
    let opacity = controls
        .background_opacity
        .filter(|opacity| opacity.is_finite())
        .unwrap_or(DEFAULT_BACKGROUND_OPACITY)
        .clamp(0.0, 100.0)
        / 100.0;
    let background_hex = controls
        .background_color
        .as_deref()
        .unwrap_or(DEFAULT_BACKGROUND_COLOR);

    Style {
        font_family,
        font_size_px,
        done_color: color_or(controls.done_color.as_deref(), DEFAULT_DONE_COLOR),
        rest_color: color_or(controls.rest_color.as_deref(), DEFAULT_REST_COLOR),
        background_rgba: Rgba::from_hex(background_hex, opacity),
        border_on: controls.border_on.unwrap_or(false),
        border_color: color_or(controls.border_color.as_deref(), DEFAULT_BORDER_COLOR),
        border_width: controls
            .border_width
            .filter(|width| width.is_finite())
            .unwrap_or(0.0),
        shadow_on: controls.shadow_on.unwrap_or(false),
    }
}

impl StyleControls {
    /// Recovers control values from a resolved style.
    ///
    /// Used when a UI needs to repopulate its controls; the background is
    /// split back into a hex color and an opacity percentage.
    pub fn from_style(style: &Style) -> Self {
        let background = style.background_rgba;
        Self {
            font_family: Some(style.font_family.clone()),
            font_size_px: Some(style.font_size_px),
            done_color: Some(style.done_color.clone()),
            rest_color: Some(style.rest_color.clone()),
            background_color: Some(format!(
                "#{:02x}{:02x}{:02x}",
                background.r, background.g, background.b
            )),
            background_opacity: Some(background.a * 100.0),
            border_on: Some(style.border_on),
            border_color: Some(style.border_color.clone()),
            border_width: Some(style.border_width),
            shadow_on: Some(style.shadow_on),
        }
    }
}

/// Keeps the last resolved style and re-resolves only when controls change.
#[derive(Debug, Clone, Default)]
pub struct StyleCache {
    controls: StyleControls,
    style: Style,
}

impl StyleCache {
    pub fn new(controls: StyleControls) -> Self {
        let style = resolve(&controls);
        Self { controls, style }
    }

    /// Replaces the controls; returns `true` when the resolved style changed.
    pub fn update(&mut self, controls: StyleControls) -> bool {
        if controls == self.controls {
            return false;
        }
        let style = resolve(&controls);
        let changed = style != self.style;
        debug!(changed, "style controls updated");
        self.controls = controls;
        self.style = style;
        changed
    }

    pub fn controls(&self) -> &StyleControls {
        &self.controls
    }

    pub fn style(&self) -> &Style {
        &self.style
    }
}

fn color_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|color| is_hex_color(color))
        .unwrap_or(fallback)
        .to_owned()
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_hex_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

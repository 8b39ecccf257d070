//! Two-span karaoke line composed from a resolved style.

use serde::Serialize;
use tracing::trace;

use crate::outline::{ShadowLayer, outline_css, outline_layers};
use crate::reveal::{reveal_ratio, split_text};
use crate::segment::Segment;
use crate::style::Style;
use crate::timeline::locate_index;

/// Drop shadow applied to the whole line when the shadow control is on.
pub const LINE_DROP_SHADOW: &str = "0 2px 4px rgba(0,0,0,0.9),0 0 6px rgba(0,0,0,0.7)";
const LINE_PADDING: &str = "2px 6px";

/// What the display sink should show.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Overlay {
    #[default]
    Empty,
    Line(OverlayLine),
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        matches!(self, Overlay::Empty)
    }

    pub fn line(&self) -> Option<&OverlayLine> {
        match self {
            Overlay::Line(line) => Some(line),
            Overlay::Empty => None,
        }
    }

    /// Markup for the display, `""` for an empty overlay.
    pub fn to_markup(&self) -> String {
        self.line().map(OverlayLine::to_markup).unwrap_or_default()
    }
}

/// The line container and its `done`/`rest` children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLine {
    pub font_size_px: f64,
    pub font_family: String,
    pub background: String,
    /// `None` renders as `text-shadow:none`.
    pub drop_shadow: Option<&'static str>,
    pub done: OverlaySpan,
    pub rest: OverlaySpan,
}

/// One colored run of text. Both spans of a line share the same outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpan {
    pub text: String,
    pub color: String,
    pub outline: Vec<ShadowLayer>,
}

impl OverlaySpan {
    fn style_attr(&self) -> String {
        format!("color:{};{}", self.color, outline_css(&self.outline))
    }
}

impl OverlayLine {
    fn style_attr(&self) -> String {
        [
            format!("font-size:{}px", self.font_size_px),
            format!("font-family:{}", self.font_family),
            format!("background:{}", self.background),
            "border:none".to_owned(),
            "border-radius:0".to_owned(),
            format!("padding:{LINE_PADDING}"),
            format!("text-shadow:{}", self.drop_shadow.unwrap_or("none")),
        ]
        .join(";")
    }

    /// Serializes the line as HTML with escaped text and attributes.
    ///
    /// # Example
    /// ```
    /// use engine::overlay::render;
    /// use engine::style::Style;
    ///
    /// let markup = render(&Style::default(), "a<", "b").to_markup();
    /// assert!(markup.starts_with(r#"<span class="line" style="font-size:28px;"#));
    /// assert!(markup.contains(r#"<span class="done" style="color:#ffea00;">a&lt;</span>"#));
    /// ```
    pub fn to_markup(&self) -> String {
        format!(
            r#"<span class="line" style="{}"><span class="done" style="{}">{}</span><span class="rest" style="{}">{}</span></span>"#,
            escape_html(&self.style_attr()),
            escape_html(&self.done.style_attr()),
            escape_html(&self.done.text),
            escape_html(&self.rest.style_attr()),
            escape_html(&self.rest.text),
        )
    }
}

/// Builds the styled line for an already split text.
pub fn render(style: &Style, done: &str, rest: &str) -> Overlay {
    let outline = outline_layers(style.border_on, style.border_width, &style.border_color);

    Overlay::Line(OverlayLine {
        font_size_px: style.font_size_px,
        font_family: style.font_family.clone(),
        background: style.background_rgba.to_string(),
        drop_shadow: style.shadow_on.then_some(LINE_DROP_SHADOW),
        done: OverlaySpan {
            text: done.to_owned(),
            color: style.done_color.clone(),
            outline: outline.clone(),
        },
        rest: OverlaySpan {
            text: rest.to_owned(),
            color: style.rest_color.clone(),
            outline,
        },
    })
}

/// Runs the full pipeline for playback time `t`.
///
/// Locates the segment, computes the reveal split and renders it. Returns
/// [`Overlay::Empty`] when nothing is located or the segment text is empty.
///
/// # Example
/// ```
/// use engine::overlay::compose;
/// use engine::segment::Segment;
/// use engine::style::Style;
///
/// let segments = vec![Segment::new(0, 0.0, 2.0, "hello")];
/// let overlay = compose(&segments, &Style::default(), 1.0);
/// let line = overlay.line().unwrap();
/// assert_eq!((line.done.text.as_str(), line.rest.text.as_str()), ("he", "llo"));
/// ```
pub fn compose(segments: &[Segment], style: &Style, t: f64) -> Overlay {
    let Some(index) = locate_index(segments, t) else {
        return Overlay::Empty;
    };
    let segment = &segments[index];
    if segment.text.is_empty() {
        return Overlay::Empty;
    }

    let ratio = reveal_ratio(segment, t);
    let split = split_text(&segment.text, ratio);
    trace!(index, ratio, t, "overlay composed");
    render(style, split.done, split.rest)
}

/// Escapes `& < > " '` for HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{LINE_DROP_SHADOW, Overlay, compose, escape_html, render};
    use crate::segment::Segment;
    use crate::style::{Style, StyleControls, resolve};

    #[test]
    fn empty_segment_list_yields_empty_overlay() {
        for t in [0.0, 1.0, 1_000.0] {
            assert_eq!(compose(&[], &Style::default(), t), Overlay::Empty);
        }
        assert_eq!(Overlay::Empty.to_markup(), "");
    }

    #[test]
    fn empty_text_yields_empty_overlay() {
        let segments = vec![Segment::new(0, 0.0, 2.0, "")];

        assert!(compose(&segments, &Style::default(), 1.0).is_empty());
    }

    #[test]
    fn time_before_every_segment_clears_output() {
        let segments = vec![Segment::new(0, 3.0, 4.0, "later")];

        assert!(compose(&segments, &Style::default(), 1.0).is_empty());
    }

    #[test]
    fn gap_keeps_previous_line_fully_revealed() {
        let segments = vec![
            Segment::new(0, 0.0, 1.0, "first"),
            Segment::new(1, 5.0, 6.0, "second"),
        ];

        let overlay = compose(&segments, &Style::default(), 3.0);
        let line = overlay.line().expect("line");

        assert_eq!(line.done.text, "first");
        assert_eq!(line.rest.text, "");
    }

    #[test]
    fn spans_share_outline_and_use_their_own_colors() {
        let style = resolve(&StyleControls {
            border_on: Some(true),
            border_width: Some(2.0),
            border_color: Some("#123456".to_owned()),
            ..StyleControls::default()
        });

        let overlay = render(&style, "do", "ne");
        let line = overlay.line().expect("line");

        assert_eq!(line.done.outline.len(), 24);
        assert_eq!(line.done.outline, line.rest.outline);
        assert_eq!(line.done.color, "#ffea00");
        assert_eq!(line.rest.color, "#ffffff");
        assert!(overlay.to_markup().contains("text-shadow: 1px 0px 0 #123456"));
    }

    #[test]
    fn drop_shadow_is_binary() {
        let plain = render(&Style::default(), "", "x");
        let shadowed = render(
            &resolve(&StyleControls {
                shadow_on: Some(true),
                ..StyleControls::default()
            }),
            "",
            "x",
        );

        assert!(plain.to_markup().contains("text-shadow:none"));
        assert_eq!(
            shadowed.line().and_then(|line| line.drop_shadow),
            Some(LINE_DROP_SHADOW)
        );
    }

    #[test]
    fn line_markup_carries_container_properties() {
        let markup = render(&Style::default(), "he", "llo").to_markup();

        assert!(markup.contains("font-size:28px"));
        assert!(markup.contains("background:rgba(0, 0, 0, 0.15)"));
        assert!(markup.contains("border:none;border-radius:0;padding:2px 6px"));
        assert!(markup.contains(r#"<span class="rest" style="color:#ffffff;">llo</span>"#));
    }

    #[test]
    fn escaping_covers_quotes_and_ampersands() {
        assert_eq!(
            escape_html(r#"Tom & "Jerry" <'x'>"#),
            "Tom &amp; &quot;Jerry&quot; &lt;&#039;x&#039;&gt;"
        );
    }
}

use engine::placement::{PixelRect, SubtitleBox};
use engine::{Overlay, OverlaySink};

/// State of the overlay widget: the latest line handed over by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    latest: Overlay,
    markup: String,
    updates: u64,
}

impl OverlayState {
    /// Returns the overlay currently on screen.
    pub fn latest(&self) -> &Overlay {
        &self.latest
    }

    /// Markup for hosts that render HTML; empty when nothing is shown.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Number of overlays received so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl OverlaySink for OverlayState {
    fn show(&mut self, overlay: Overlay) {
        self.markup = overlay.to_markup();
        self.latest = overlay;
        self.updates += 1;
    }
}

/// Where the subtitle box lands inside the preview, in pixels.
pub fn overlay_rect(preview: PixelRect, subtitle_box: SubtitleBox) -> PixelRect {
    subtitle_box.to_pixels(preview)
}

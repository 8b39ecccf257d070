use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::overlay::{Overlay, compose};
use crate::segment::Segment;
use crate::style::Style;

/// Encoder quality requested for the final render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    High,
    #[default]
    Medium,
    Low,
}

impl ExportQuality {
    /// Parses `high`/`medium`/`low`; anything else is `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn encoder_preset(self) -> EncoderPreset {
        match self {
            Self::High => EncoderPreset {
                crf: 12,
                video_bitrate: "20M",
                preset: "slow",
            },
            Self::Medium => EncoderPreset {
                crf: 18,
                video_bitrate: "10M",
                preset: "medium",
            },
            Self::Low => EncoderPreset {
                crf: 23,
                video_bitrate: "5M",
                preset: "faster",
            },
        }
    }
}

/// Settings handed to the external video encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderPreset {
    pub crf: u8,
    pub video_bitrate: &'static str,
    pub preset: &'static str,
}

/// Frame schedule for rasterising the overlay over a whole video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameExportPlan {
    duration: f64,
    fps: f64,
    total_frames: u64,
}

/// One frame of the schedule with the overlay it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFrame {
    /// Zero-based frame index.
    pub index: u64,
    pub time: f64,
    pub file_name: String,
    pub overlay: Overlay,
}

impl FrameExportPlan {
    /// Plans `max(1, round(duration * fps))` frames.
    ///
    /// # Example
    /// ```
    /// use engine::export::FrameExportPlan;
    ///
    /// let plan = FrameExportPlan::new(2.0, 30.0).unwrap();
    /// assert_eq!(plan.total_frames(), 60);
    /// assert_eq!(plan.frame_file_name(0), "0001.png");
    /// assert!(FrameExportPlan::new(2.0, 0.0).is_err());
    /// ```
    pub fn new(duration: f64, fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(EngineError::InvalidFrameRate(fps));
        }
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        let total_frames = ((duration * fps).round() as u64).max(1);
        debug!(duration, fps, total_frames, "frame export planned");

        Ok(Self {
            duration,
            fps,
            total_frames,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn frame_time(&self, index: u64) -> f64 {
        index as f64 / self.fps
    }

    /// `%04d.png`, numbered from 1.
    pub fn frame_file_name(&self, index: u64) -> String {
        format!("{:04}.png", index + 1)
    }

    /// Overlay of every frame, in order.
    pub fn frames<'a>(
        &'a self,
        segments: &'a [Segment],
        style: &'a Style,
    ) -> impl Iterator<Item = ExportFrame> + 'a {
        (0..self.total_frames).map(move |index| {
            let time = self.frame_time(index);
            ExportFrame {
                index,
                time,
                file_name: self.frame_file_name(index),
                overlay: compose(segments, style, time),
            }
        })
    }
}

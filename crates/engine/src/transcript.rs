//! Newline-delimited JSON stream produced by the transcription service.

use std::io::BufRead;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::segment::{Segment, split_by_max_words};
use crate::time::deserialize_seconds;

/// Language reported when the service does not name one.
pub const UNKNOWN_LANGUAGE: &str = "auto";

/// One line of the transcript stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TranscriptEvent {
    Start {
        #[serde(rename = "totalSeconds", default, deserialize_with = "deserialize_seconds")]
        total_seconds: f64,
    },
    Progress {
        #[serde(default, deserialize_with = "deserialize_seconds")]
        progress: f64,
        #[serde(rename = "lastEnd", default, deserialize_with = "deserialize_seconds")]
        last_end: f64,
    },
    Done {
        #[serde(default)]
        result: TranscriptResult,
    },
    Error {
        #[serde(default, deserialize_with = "deserialize_message")]
        message: String,
    },
}

/// Payload of the final `done` event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TranscriptResult {
    #[serde(deserialize_with = "deserialize_message")]
    pub language: String,
    #[serde(deserialize_with = "deserialize_segments")]
    pub segments: Vec<Segment>,
}

/// Completed transcript ready to replace the segment store.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub language: String,
    pub segments: Vec<Segment>,
}

/// Iterator over the events of a stream.
///
/// Blank lines are skipped. Lines that do not decode, including lines that
/// are not valid UTF-8, are logged and skipped as well; only I/O failures
/// surface as errors.
#[derive(Debug)]
pub struct TranscriptReader<R> {
    reader: R,
    line: Vec<u8>,
    line_number: usize,
}

impl<R> TranscriptReader<R>
where
    R: BufRead,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R> Iterator for TranscriptReader<R>
where
    R: BufRead,
{
    type Item = Result<TranscriptEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(error) => return Some(Err(EngineError::TranscriptIo(error))),
            }
            self.line_number += 1;

            let trimmed = self.line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_slice::<TranscriptEvent>(trimmed) {
                Ok(event) => return Some(Ok(event)),
                Err(error) => {
                    warn!(line = self.line_number, %error, "skipping invalid transcript line");
                }
            }
        }
    }
}

/// Reads a stream to its `done` event.
///
/// `on_progress` receives percentages in `0..=100` that never decrease,
/// ending with `100` on success. Events after `done` are not read. Segments
/// are split with [`split_by_max_words`] when `max_words` is non-zero.
///
/// # Example
/// ```
/// use engine::transcript::collect_transcript;
///
/// let stream = concat!(
///     "{\"type\":\"start\",\"totalSeconds\":4}\n",
///     "{\"type\":\"progress\",\"progress\":50,\"lastEnd\":2}\n",
///     "{\"type\":\"done\",\"result\":{\"language\":\"es\",\"segments\":[{\"id\":0,\"start\":0,\"end\":2,\"text\":\"hola\"}]}}\n",
/// );
/// let mut seen = Vec::new();
/// let transcript = collect_transcript(stream.as_bytes(), 0, |pct| seen.push(pct)).unwrap();
/// assert_eq!(transcript.language, "es");
/// assert_eq!(seen, vec![0, 50, 100]);
/// ```
pub fn collect_transcript<R, F>(reader: R, max_words: u32, mut on_progress: F) -> Result<Transcript>
where
    R: BufRead,
    F: FnMut(u8),
{
    let mut last_progress = 0_u8;

    for event in TranscriptReader::new(reader) {
        match event? {
            TranscriptEvent::Start { total_seconds } => {
                debug!(total_seconds, "transcription started");
                on_progress(last_progress);
            }
            TranscriptEvent::Progress { progress, last_end } => {
                let percent = progress.clamp(0.0, 100.0).floor() as u8;
                last_progress = last_progress.max(percent);
                debug!(progress = last_progress, last_end, "transcription progress");
                on_progress(last_progress);
            }
            TranscriptEvent::Done { result } => {
                let language = if result.language.trim().is_empty() {
                    UNKNOWN_LANGUAGE.to_owned()
                } else {
                    result.language
                };
                let segments = split_by_max_words(&result.segments, max_words);
                info!(
                    %language,
                    segment_count = segments.len(),
                    max_words,
                    "transcription finished"
                );
                on_progress(100);
                return Ok(Transcript { language, segments });
            }
            TranscriptEvent::Error { message } => {
                warn!(%message, "transcription failed");
                return Err(EngineError::TranscriptionFailed { message });
            }
        }
    }

    Err(EngineError::TranscriptIncomplete)
}

fn deserialize_message<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_segments<'de, D>(deserializer: D) -> std::result::Result<Vec<Segment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Segment>>::deserialize(deserializer)?.unwrap_or_default())
}

//! Project documents and the on-disk project library.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::placement::SubtitleBox;
use crate::segment::Segment;
use crate::style::StyleControls;
use crate::time::deserialize_count;

pub const DEFAULT_PROJECT_NAME: &str = "Project";
const PROJECT_EXTENSION: &str = "json";
const FALLBACK_FILE_NAME: &str = "project";

/// Persisted editing session: segments, style, placement and metadata.
///
/// Every field has a default so partial or older documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub target: Option<String>,
    pub quality: Option<String>,
    /// `0` keeps segments whole.
    #[serde(deserialize_with = "deserialize_count")]
    pub max_words: u32,
    pub style: StyleControls,
    #[serde(rename = "box")]
    pub subtitle_box: SubtitleBox,
    #[serde(deserialize_with = "deserialize_segments")]
    pub segments: Vec<Segment>,
    /// Location of the last named copy written by [`ProjectLibrary::export_named`].
    pub path: Option<PathBuf>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: DEFAULT_PROJECT_NAME.to_owned(),
            created_at: None,
            language: None,
            target: None,
            quality: None,
            max_words: 0,
            style: StyleControls::default(),
            subtitle_box: SubtitleBox::default(),
            segments: Vec::new(),
            path: None,
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            language: self.language.clone(),
            target: self.target.clone(),
        }
    }
}

/// Listing entry returned by [`ProjectLibrary::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub target: Option<String>,
}

/// Reads one project document.
pub fn load_project_file(path: &Path) -> Result<Project> {
    let contents = fs::read_to_string(path).map_err(|source| EngineError::ProjectIo {
        context: "failed to read project file",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| EngineError::ProjectSerialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes one project document as pretty-printed JSON.
pub fn save_project_file(path: &Path, project: &Project) -> Result<()> {
    let json =
        serde_json::to_string_pretty(project).map_err(|source| EngineError::ProjectSerialization {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, json).map_err(|source| EngineError::ProjectIo {
        context: "failed to write project file",
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "project file written");
    Ok(())
}

/// Directory of `<id>.json` project documents.
#[derive(Debug, Clone)]
pub struct ProjectLibrary {
    root: PathBuf,
}

impl ProjectLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `project`, assigning an id and creation time when missing.
    ///
    /// Saving again under the same id overwrites the stored document.
    pub fn save(&self, project: &mut Project) -> Result<PathBuf> {
        if project.id.is_empty() {
            project.id = Uuid::new_v4().simple().to_string();
        }
        validate_project_id(&project.id)?;
        if project.created_at.is_none() {
            project.created_at = Some(Utc::now());
        }
        if project.name.trim().is_empty() {
            project.name = DEFAULT_PROJECT_NAME.to_owned();
        }

        self.ensure_root()?;
        let path = self.project_path(&project.id);
        save_project_file(&path, project)?;
        info!(
            id = %project.id,
            name = %project.name,
            segment_count = project.segments.len(),
            "project saved"
        );
        Ok(path)
    }

    /// Summaries of every readable project, newest first.
    ///
    /// A missing library directory lists as empty. Unreadable documents are
    /// logged and left out.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EngineError::ProjectIo {
                    context: "failed to list projects",
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROJECT_EXTENSION) {
                continue;
            }
            let project = match load_project_file(&path) {
                Ok(project) => project,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable project");
                    continue;
                }
            };
            let mut summary = project.summary();
            if summary.id.is_empty() {
                summary.id = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
            }
            summaries.push(summary);
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    pub fn load(&self, id: &str) -> Result<Project> {
        let path = self.existing_project_path(id)?;
        let mut project = load_project_file(&path)?;
        if project.id.is_empty() {
            project.id = id.to_owned();
        }
        debug!(id, segment_count = project.segments.len(), "project loaded");
        Ok(project)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.existing_project_path(id)?;
        fs::remove_file(&path).map_err(|source| EngineError::ProjectIo {
            context: "failed to delete project",
            path,
            source,
        })?;
        info!(id, "project deleted");
        Ok(())
    }

    /// Writes a copy named after the project into `directory`.
    ///
    /// The copy path is recorded in `project.path` and returned.
    pub fn export_named(&self, project: &mut Project, directory: &Path) -> Result<PathBuf> {
        fs::create_dir_all(directory).map_err(|source| EngineError::ProjectIo {
            context: "failed to create export directory",
            path: directory.to_path_buf(),
            source,
        })?;
        let path = directory
            .join(safe_file_name(&project.name))
            .with_extension(PROJECT_EXTENSION);
        project.path = Some(path.clone());
        save_project_file(&path, project)?;
        Ok(path)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| EngineError::ProjectIo {
            context: "failed to create project library",
            path: self.root.clone(),
            source,
        })
    }

    fn project_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{PROJECT_EXTENSION}"))
    }

    fn existing_project_path(&self, id: &str) -> Result<PathBuf> {
        validate_project_id(id)?;
        let path = self.project_path(id);
        if !path.is_file() {
            return Err(EngineError::ProjectNotFound { id: id.to_owned() });
        }
        Ok(path)
    }
}

/// Accepts ids made of ASCII letters, digits, `-` and `_`.
pub fn validate_project_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidProjectId { id: id.to_owned() })
    }
}

/// Collapses every run of characters outside `[A-Za-z0-9_-]` into one `_`.
///
/// # Example
/// ```
/// use engine::project::safe_file_name;
///
/// assert_eq!(safe_file_name("Mi canción: v2!"), "Mi_canci_n_v2_");
/// ```
pub fn safe_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() {
        return FALLBACK_FILE_NAME.to_owned();
    }
    out
}

fn deserialize_created_at<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        RawTimestamp::Other(_) => None,
    })
}

fn deserialize_segments<'de, D>(deserializer: D) -> std::result::Result<Vec<Segment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Segment>>::deserialize(deserializer)?.unwrap_or_default())
}

use std::fs;

use chrono::{Duration, Utc};
use engine::project::{Project, ProjectLibrary, load_project_file};
use engine::{EngineError, Segment, StyleControls};

fn sample_project(name: &str) -> Project {
    let mut project = Project::new(name);
    project.language = Some("es".to_owned());
    project.max_words = 4;
    project.style = StyleControls {
        font_size_px: Some(36.0),
        border_on: Some(true),
        border_width: Some(2.0),
        ..StyleControls::default()
    };
    project.segments = vec![
        Segment::new(0, 0.0, 1.5, "hola mundo"),
        Segment::new(1, 1.5, 3.0, "adiós"),
    ];
    project
}

#[test]
fn save_assigns_identity_and_load_returns_the_same_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = ProjectLibrary::new(dir.path().join("projects"));
    let mut project = sample_project("Canción");

    let path = library.save(&mut project).expect("save");

    assert!(!project.id.is_empty());
    assert!(project.created_at.is_some());
    assert_eq!(path, dir.path().join("projects").join(format!("{}.json", project.id)));
    assert_eq!(library.load(&project.id).expect("load"), project);
}

#[test]
fn list_is_newest_first_and_skips_broken_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = ProjectLibrary::new(dir.path());

    let mut older = sample_project("older");
    older.created_at = Some(Utc::now() - Duration::days(2));
    library.save(&mut older).expect("save older");
    let mut newer = sample_project("newer");
    library.save(&mut newer).expect("save newer");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("write broken");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");

    let names: Vec<String> = library
        .list()
        .expect("list")
        .into_iter()
        .map(|summary| summary.name)
        .collect();

    assert_eq!(names, vec!["newer".to_owned(), "older".to_owned()]);
}

#[test]
fn delete_removes_the_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = ProjectLibrary::new(dir.path());
    let mut project = sample_project("gone");
    library.save(&mut project).expect("save");

    library.delete(&project.id).expect("delete");

    assert!(matches!(
        library.load(&project.id),
        Err(EngineError::ProjectNotFound { .. })
    ));
    assert!(library.list().expect("list").is_empty());
}

#[test]
fn export_named_writes_a_sanitised_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = ProjectLibrary::new(dir.path().join("lib"));
    let mut project = sample_project("My song: live!");
    library.save(&mut project).expect("save");

    let out = library
        .export_named(&mut project, &dir.path().join("exports"))
        .expect("export");

    assert_eq!(out, dir.path().join("exports").join("My_song_live_.json"));
    assert_eq!(project.path.as_deref(), Some(out.as_path()));
    let copy = load_project_file(&out).expect("load copy");
    assert_eq!(copy.segments, project.segments);
}

#[test]
fn documents_written_by_other_tools_load_leniently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("external.json");
    fs::write(
        &path,
        r#"{
  "id": "0a1b",
  "name": "Proyecto",
  "createdAt": "2024-02-03T04:05:06.789Z",
  "language": null,
  "maxWords": null,
  "style": {"fontFamily": "Arial", "backgroundRgba": "rgba(0, 0, 0, 0.15)"},
  "box": {},
  "segments": [{"id": 0, "start": 0.0, "end": 1.0, "text": "hi"}]
}"#,
    )
    .expect("write");

    let project = load_project_file(&path).expect("load");

    assert_eq!(project.name, "Proyecto");
    assert_eq!(project.max_words, 0);
    assert_eq!(project.style.font_family.as_deref(), Some("Arial"));
    assert_eq!(project.segments.len(), 1);
}

mod config;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use engine::export::{ExportQuality, FrameExportPlan};
use engine::overlay::compose;
use engine::project::{Project, ProjectLibrary, load_project_file, save_project_file};
use engine::segment::split_by_max_words;
use engine::srt::render_srt;
use engine::style::resolve;
use engine::ticker::DEFAULT_FRAME_INTERVAL;
use engine::transcript::collect_transcript;
use engine::{
    ClockReading, Command, Engine, Event, FrameScheduler, FrameTick, MediaEvent, Overlay,
    PlaybackState, Segment, ThreadScheduler,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "karaoke", about = "Karaoke subtitle overlay tools", version)]
struct Cli {
    /// Config file (defaults to <config dir>/karaoke/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the overlay shown at a playback time
    Overlay {
        project: PathBuf,
        /// Playback time in seconds
        #[arg(long, allow_negative_numbers = true)]
        at: f64,
        /// Print the overlay as JSON instead of markup
        #[arg(long)]
        json: bool,
    },
    /// Write the segments as SubRip subtitles
    Srt {
        project: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-chunk segments into groups of at most N words
    Split {
        project: PathBuf,
        #[arg(long)]
        max_words: Option<u32>,
        /// Output file (overwrites the input when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a project from a newline-delimited JSON transcript stream
    ImportTranscript {
        /// Stream file (stdin when omitted)
        input: Option<PathBuf>,
        #[arg(long, default_value = engine::project::DEFAULT_PROJECT_NAME)]
        name: String,
        #[arg(long)]
        max_words: Option<u32>,
        /// Write the project here instead of the library
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the frame schedule of an overlay render
    Frames {
        project: PathBuf,
        #[arg(long)]
        fps: Option<f64>,
        /// Seconds to cover (defaults to the last segment end)
        #[arg(long)]
        duration: Option<f64>,
        /// high, medium or low
        #[arg(long)]
        quality: Option<String>,
    },
    /// Simulate playback and print every overlay change
    Play {
        project: PathBuf,
        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        rate: f64,
        /// Frame interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Manage the project library
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectsCommand {
    /// List stored projects, newest first
    List,
    /// Print a stored project as JSON
    Show { id: String },
    /// Delete a stored project
    Delete { id: String },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Overlay { project, at, json } => overlay(&config, &project, at, json),
        Commands::Srt { project, output } => srt(&project, output.as_deref()),
        Commands::Split {
            project,
            max_words,
            output,
        } => split(&project, max_words.unwrap_or(config.max_words), output.as_deref()),
        Commands::ImportTranscript {
            input,
            name,
            max_words,
            output,
        } => import_transcript(
            &config,
            input.as_deref(),
            name,
            max_words.unwrap_or(config.max_words),
            output.as_deref(),
        ),
        Commands::Frames {
            project,
            fps,
            duration,
            quality,
        } => frames(
            &config,
            &project,
            fps.unwrap_or(config.frame_rate),
            duration,
            quality.as_deref(),
        ),
        Commands::Play {
            project,
            rate,
            interval_ms,
        } => play(
            &config,
            &project,
            rate,
            interval_ms.map_or(DEFAULT_FRAME_INTERVAL, Duration::from_millis),
        ),
        Commands::Projects { command } => projects(&config, command),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn load_project(path: &Path) -> Result<Project> {
    load_project_file(path).with_context(|| format!("loading project {}", path.display()))
}

fn overlay(config: &Config, path: &Path, at: f64, json: bool) -> Result<()> {
    let project = load_project(path)?;
    let style = resolve(&config.style_for(&project.style));
    let overlay = compose(&project.segments, &style, at);

    if json {
        println!("{}", serde_json::to_string_pretty(&overlay)?);
    } else {
        println!("{}", overlay.to_markup());
    }
    Ok(())
}

fn srt(path: &Path, output: Option<&Path>) -> Result<()> {
    let project = load_project(path)?;
    let subtitles = render_srt(&project.segments);

    match output {
        Some(output) => {
            fs::write(output, subtitles)
                .with_context(|| format!("writing subtitles to {}", output.display()))?;
            info!(path = %output.display(), cues = project.segments.len(), "subtitles written");
        }
        None => io::stdout().write_all(subtitles.as_bytes())?,
    }
    Ok(())
}

fn split(path: &Path, max_words: u32, output: Option<&Path>) -> Result<()> {
    let mut project = load_project(path)?;
    let before = project.segments.len();
    project.segments = split_by_max_words(&project.segments, max_words);
    project.max_words = max_words;

    let target = output.unwrap_or(path);
    save_project_file(target, &project)
        .with_context(|| format!("saving project {}", target.display()))?;
    info!(
        max_words,
        before,
        after = project.segments.len(),
        path = %target.display(),
        "segments split"
    );
    Ok(())
}

fn import_transcript(
    config: &Config,
    input: Option<&Path>,
    name: String,
    max_words: u32,
    output: Option<&Path>,
) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let transcript = collect_transcript(reader, max_words, |progress| {
        info!(progress, "transcription progress");
    })
    .context("reading transcript stream")?;

    let mut project = Project::new(name);
    project.language = Some(transcript.language);
    project.max_words = max_words;
    project.segments = transcript.segments;

    let path = match output {
        Some(path) => {
            save_project_file(path, &project)
                .with_context(|| format!("saving project {}", path.display()))?;
            path.to_path_buf()
        }
        None => ProjectLibrary::new(config.projects_dir()?)
            .save(&mut project)
            .context("saving project to the library")?,
    };
    info!(segments = project.segments.len(), path = %path.display(), "transcript imported");
    println!("{}", path.display());
    Ok(())
}

fn frames(
    config: &Config,
    path: &Path,
    fps: f64,
    duration: Option<f64>,
    quality: Option<&str>,
) -> Result<()> {
    let project = load_project(path)?;
    let style = resolve(&config.style_for(&project.style));
    let duration = duration.unwrap_or_else(|| media_duration(&project.segments));
    let plan = FrameExportPlan::new(duration, fps)?;

    let quality = quality
        .or(project.quality.as_deref())
        .map(ExportQuality::parse_lenient)
        .unwrap_or_default();
    let preset = quality.encoder_preset();
    info!(
        frames = plan.total_frames(),
        crf = preset.crf,
        bitrate = preset.video_bitrate,
        preset = preset.preset,
        "frame schedule"
    );

    let mut stdout = io::stdout().lock();
    for frame in plan.frames(&project.segments, &style) {
        writeln!(
            stdout,
            "{}\t{:.3}\t{}",
            frame.file_name,
            frame.time,
            frame.overlay.to_markup()
        )?;
    }
    Ok(())
}

fn play(config: &Config, path: &Path, rate: f64, interval: Duration) -> Result<()> {
    ensure!(
        rate.is_finite() && rate > 0.0,
        "playback rate must be positive, got {rate}"
    );
    let mut project = load_project(path)?;
    project.style = config.style_for(&project.style);
    let duration = media_duration(&project.segments);

    let (frame_tx, frame_rx) = mpsc::channel();
    let mut engine = Engine::new(ThreadScheduler::new(interval, frame_tx));
    engine.handle_command(Command::LoadProject(Box::new(project)))?;

    run_playback(&mut engine, &frame_rx, interval, rate, duration, print_events)
}

/// Plays from zero to `duration` on a simulated clock, one frame per tick.
fn run_playback<S, F>(
    engine: &mut Engine<S>,
    frames: &Receiver<FrameTick>,
    interval: Duration,
    rate: f64,
    duration: f64,
    mut on_events: F,
) -> Result<()>
where
    S: FrameScheduler,
    F: FnMut(f64, Vec<Event>),
{
    let started = Instant::now();
    on_events(
        0.0,
        engine.handle_command(Command::Media {
            event: MediaEvent::Play,
            clock: ClockReading::playing(0.0),
        })?,
    );

    while engine.playback_state() == PlaybackState::Playing {
        if !engine.scheduler().is_active() {
            bail!("frame scheduler is not running");
        }
        match frames.recv_timeout(interval * 4) {
            Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("frame ticker stopped");
                break;
            }
        }
        let time = simulated_time(started.elapsed(), rate);
        let clock = if time >= duration {
            ClockReading::ended(duration)
        } else {
            ClockReading::playing(time)
        };
        on_events(clock.time, engine.handle_command(Command::Frame { clock })?);
    }
    Ok(())
}

fn projects(config: &Config, command: ProjectsCommand) -> Result<()> {
    let library = ProjectLibrary::new(config.projects_dir()?);
    match command {
        ProjectsCommand::List => {
            for summary in library.list()? {
                let created = summary
                    .created_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_owned());
                println!(
                    "{}\t{}\t{}\t{}",
                    summary.id,
                    created,
                    summary.language.as_deref().unwrap_or("-"),
                    summary.name
                );
            }
        }
        ProjectsCommand::Show { id } => {
            let project = library.load(&id)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectsCommand::Delete { id } => {
            library.delete(&id)?;
            info!(%id, "project deleted");
        }
    }
    Ok(())
}

/// Length of a track that ends with its last segment.
fn media_duration(segments: &[Segment]) -> f64 {
    segments
        .iter()
        .map(|segment| segment.end)
        .filter(|end| end.is_finite())
        .fold(0.0, f64::max)
}

fn simulated_time(elapsed: Duration, rate: f64) -> f64 {
    elapsed.as_secs_f64() * rate
}

fn print_events(time: f64, events: Vec<Event>) {
    for event in events {
        match event {
            Event::OverlayChanged(overlay) => println!("{time:>8.3}  {}", describe(&overlay)),
            Event::PlaybackChanged { state } => debug!(?state, time, "playback"),
            Event::ProjectChanged(_) | Event::Error(_) => {}
        }
    }
}

/// One-line text form of an overlay: `done|rest`, or `-` when empty.
fn describe(overlay: &Overlay) -> String {
    match overlay.line() {
        Some(line) => format!("{}|{}", line.done.text, line.rest.text),
        None => "-".to_owned(),
    }
}

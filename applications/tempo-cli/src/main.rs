/// Tempo CLI - drive the playback controller without a device
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tempo_playback::{
    CommandOutcome, InMemoryBackend, InMemoryControl, PlaybackConfig, PlaybackController,
    PlayerSnapshot, RawTrack, RepeatMode, TrackDescriptor,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Duration reported for tracks without a duration hint
const DEFAULT_DURATION_SECS: f64 = 180.0;

#[derive(Parser)]
#[command(name = "tempo-cli")]
#[command(about = "Headless driver for the Tempo playback controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize backend track records and print them
    Inspect {
        /// JSON file holding an array of track records
        path: PathBuf,
        /// Print normalized descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play a track list to the end against the in-memory backend
    Play {
        /// JSON file holding an array of track records
        path: PathBuf,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Enable shuffle
        #[arg(long)]
        shuffle: bool,
        /// Repeat mode
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,
        /// Stop after this many track transitions
        #[arg(long, default_value_t = 50)]
        max_steps: usize,
        /// Print every playback event as a JSON line
        #[arg(long)]
        events: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempo_cli=info,tempo_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path, json } => inspect(&path, json),
        Commands::Play {
            path,
            config,
            shuffle,
            repeat,
            max_steps,
            events,
        } => {
            let mut config = PlaybackConfig::load(config.as_deref())
                .context("Failed to load playback config")?;
            if shuffle {
                config.shuffle = true;
            }
            if let Some(repeat) = repeat {
                config.repeat = repeat.into();
            }
            play(&path, config, max_steps, events)
        }
    }
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let tracks = load_tracks(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    let placeholder = PlaybackConfig::default().placeholder_artwork;
    for track in &tracks {
        println!("{}", describe(track));
        println!("    media:   {}", track.media_url);
        println!("    artwork: {}", track.artwork_or(&placeholder));
    }
    println!("{} playable track(s)", tracks.len());
    Ok(())
}

fn play(path: &Path, config: PlaybackConfig, max_steps: usize, print_events: bool) -> Result<()> {
    let tracks = load_tracks(path)?;
    if tracks.is_empty() {
        bail!("No playable tracks in {}", path.display());
    }

    let (backend, control) = InMemoryBackend::auto_loading(DEFAULT_DURATION_SECS);
    for track in &tracks {
        if let Some(hint) = track.duration_hint {
            control.set_duration(&track.media_url, hint);
        }
    }

    let mut controller =
        PlaybackController::init(config, Box::new(backend)).context("Invalid playback config")?;

    for track in tracks {
        if let CommandOutcome::Ignored(reason) = controller.add_to_queue(track) {
            warn!(%reason, "Track not queued");
        }
    }

    advance(&mut controller);
    controller.process_events();
    flush_events(&mut controller, print_events)?;

    let mut steps = 0;
    while controller.current_track().is_some() && steps < max_steps {
        let snapshot = controller.snapshot();
        print_now_playing(&snapshot);

        if snapshot.status.is_error() {
            warn!(status = ?snapshot.status, "Skipping track");
            advance(&mut controller);
        } else {
            finish_current(&control);
        }
        controller.process_events();
        flush_events(&mut controller, print_events)?;
        steps += 1;
    }

    if steps == max_steps {
        info!(max_steps, "Step limit reached");
    }
    info!(status = controller.status().label(), "Session finished");
    Ok(())
}

/// Move to the next queued track, logging why when nothing happens
fn advance(controller: &mut PlaybackController) -> bool {
    match controller.play_next() {
        CommandOutcome::Applied => true,
        CommandOutcome::Ignored(reason) => {
            warn!(%reason, "Could not advance");
            false
        }
    }
}

/// Let the platform play the current media to its end
fn finish_current(control: &InMemoryControl) {
    if let Some(token) = control.latest() {
        control.end(token);
    }
}

fn load_tracks(path: &Path) -> Result<Vec<TrackDescriptor>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = RawTrack::list_from_str(&json)
        .with_context(|| format!("Failed to parse track records in {}", path.display()))?;

    let mut tracks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match record.normalize() {
            Ok(track) => tracks.push(track),
            Err(e) => warn!(index, error = %e, "Skipping track record"),
        }
    }
    Ok(tracks)
}

fn flush_events(controller: &mut PlaybackController, print: bool) -> Result<()> {
    for event in controller.drain_events() {
        if print {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

fn print_now_playing(snapshot: &PlayerSnapshot) {
    let Some(track) = &snapshot.current_track else {
        return;
    };
    let duration = snapshot
        .duration
        .map(format_time)
        .unwrap_or_else(|| "--:--".to_string());
    println!(
        "[{:>7}] {} ({} / {}) up next: {}",
        snapshot.status.label(),
        describe(track),
        format_time(snapshot.position),
        duration,
        snapshot.upcoming.len()
    );
}

fn describe(track: &TrackDescriptor) -> String {
    let creator = track
        .creator
        .as_ref()
        .and_then(|c| c.display_name.as_deref().or(c.username.as_deref()));
    match creator {
        Some(creator) => format!("{} - {} by {}", track.id, track.title, creator),
        None => format!("{} - {}", track.id, track.title),
    }
}

/// Format seconds as `m:ss`
fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

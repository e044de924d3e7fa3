use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use storypath::{
    HeadlessSurface, ManualScheduler, PlaybackSession, SessionStatus, Storymap, SyncEvent,
    TickScheduler as _,
};

#[derive(Parser, Debug)]
#[command(name = "storypath", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a storymap JSON document and print a summary.
    Validate(ValidateArgs),
    /// Play one segment headlessly and print marker positions over time.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input storymap JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input storymap JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Segment index to play.
    #[arg(long, default_value_t = 0)]
    segment: usize,

    /// Simulated frame rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Print a sample line roughly every this many milliseconds.
    #[arg(long, default_value_t = 500.0)]
    sample_ms: f64,

    /// Hard cap on simulated time.
    #[arg(long, default_value_t = 120_000.0)]
    max_ms: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => validate(&args),
        Command::Simulate(args) => simulate(&args),
    }
}

fn load_storymap(path: &PathBuf) -> anyhow::Result<Storymap> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let storymap: Storymap = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(storymap)
}

fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let storymap = load_storymap(&args.in_path)?;
    storymap.validate().context("storymap failed validation")?;

    println!("{}: {} segment(s)", storymap.title, storymap.segments.len());
    for (index, segment) in storymap.segments.iter().enumerate() {
        println!(
            "  [{index}] {} ({} route(s), camera: {})",
            segment.id,
            segment.routes.len(),
            if segment.camera.is_some() { "yes" } else { "no" },
        );
        for route in &segment.routes {
            println!(
                "      {}: {:.1} km over {:.0} ms",
                route.id,
                route.length_km(),
                route.duration_ms,
            );
        }
    }
    Ok(())
}

fn simulate(args: &SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0.0, "fps must be > 0");
    let storymap = load_storymap(&args.in_path)?;
    let route_ids: Vec<String> = storymap
        .segment(args.segment)
        .with_context(|| format!("storymap has no segment {}", args.segment))?
        .routes
        .iter()
        .map(|route| route.id.clone())
        .collect();

    let mut session = PlaybackSession::new(storymap, HeadlessSurface::new())?;
    let mut scheduler = ManualScheduler::new();
    let frame_ms = 1000.0 / args.fps;

    session.begin_join();
    session.ingest(
        SyncEvent::Joined {
            status: SessionStatus::Running,
            cached_state: None,
        },
        scheduler.now_ms(),
    );
    session.ingest(
        SyncEvent::SegmentSync {
            segment_index: args.segment as i64,
            is_playing: true,
            server_timestamp: 0.0,
        },
        scheduler.now_ms(),
    );

    let mut next_sample_ms = 0.0;
    loop {
        session.pump(&mut scheduler);
        let now = scheduler.now_ms();

        if now >= next_sample_ms {
            next_sample_ms += args.sample_ms;
            for route_id in &route_ids {
                if let Some(overlay) = session.surface().overlay(route_id)
                    && let Some(marker) = overlay.marker
                {
                    println!(
                        "t={now:>8.0}ms  {route_id}: lng={:>9.4} lat={:>8.4} visited={} pts",
                        marker.lng,
                        marker.lat,
                        overlay.visited_path.len(),
                    );
                }
            }
        }

        if !session.wants_frame() {
            break;
        }
        if now > args.max_ms {
            println!("stopping at the {:.0} ms cap", args.max_ms);
            break;
        }
        scheduler.advance(frame_ms);
    }

    println!("done at t={:.0} ms", scheduler.now_ms());
    Ok(())
}

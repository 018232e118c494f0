//! corridor-survey CLI - Driver and debug tool for road condition sectioning
//!
//! Usage:
//!   corridor-survey sections --track <gpx|folder> --frames <frames.json> [--output <file>] [--frames-output <file>]
//!   corridor-survey track --track <gpx|folder>
//!   corridor-survey demo --track <gpx|folder> [--clip <name> | --start-time <local>] [--output <file>]
//!
//! `sections` runs the full survey over assessed frames. `demo` synthesizes
//! frames along the track with a deterministic assessor, which is handy for
//! checking sectioning and rendering without the visual-assessment model.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use corridor_survey::{
    assessment::assess_frames,
    frame::frames_from_json,
    intervention::format_usd,
    resolver::{select_by_spacing, DEFAULT_UTC_OFFSET_HOURS},
    run_survey, BreakGranularity, Corridor, CyclingAssessor, FrameClock, PositionResolver,
    Result, SectionConfig, SurveyConfig, SurveyError, TrackStore,
};

#[derive(Parser)]
#[command(name = "corridor-survey")]
#[command(about = "Road condition sectioning from dashcam frames and GPS tracks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print every section, not just the summary
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct SectionArgs {
    /// Minimum section length in km
    #[arg(long, default_value = "0.3")]
    min_km: f64,

    /// Maximum section length in km
    #[arg(long, default_value = "2.0")]
    max_km: f64,

    /// Frames that must agree before a condition change breaks a section
    #[arg(long, default_value = "2")]
    smoothing_window: usize,

    /// Break on the coarse 4-band condition instead of the 6 classes
    #[arg(long)]
    bands: bool,
}

impl SectionArgs {
    fn to_config(&self) -> SectionConfig {
        SectionConfig {
            min_section_km: self.min_km,
            max_section_km: self.max_km,
            smoothing_window: self.smoothing_window,
            break_granularity: if self.bands {
                BreakGranularity::Band
            } else {
                BreakGranularity::Class
            },
            ..SectionConfig::default()
        }
    }
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output section GeoJSON file (stdout summary only if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output per-frame point GeoJSON file
    #[arg(long)]
    frames_output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Section a trip from assessed frames
    Sections {
        /// GPX file, or folder of GPX files
        #[arg(short, long)]
        track: PathBuf,

        /// JSON array of assessed frames
        #[arg(short, long)]
        frames: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        section: SectionArgs,
    },

    /// Show statistics for a GPS track
    Track {
        /// GPX file, or folder of GPX files
        #[arg(short, long)]
        track: PathBuf,
    },

    /// Section a trip using synthetic frames from a deterministic assessor
    Demo {
        /// GPX file, or folder of GPX files
        #[arg(short, long)]
        track: PathBuf,

        /// Dashcam clip name carrying the video start time
        #[arg(long, conflicts_with = "start_time")]
        clip: Option<String>,

        /// Local video start time, "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        start_time: Option<String>,

        /// Seconds between extracted frames
        #[arg(long, default_value = "2.0")]
        interval: f64,

        /// Keep only frames at least this many meters apart
        #[arg(long, default_value = "50")]
        spacing_m: f64,

        /// Dashcam clock offset from UTC, hours
        #[arg(long, default_value_t = DEFAULT_UTC_OFFSET_HOURS)]
        utc_offset: i32,

        /// Assessor seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Consecutive frames sharing one canned assessment
        #[arg(long, default_value = "15")]
        run_length: usize,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        section: SectionArgs,
    },
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Sections {
            track,
            frames,
            output,
            section,
        } => run_sections(&track, &frames, &output, &section, cli.verbose),
        Commands::Track { track } => run_track(&track),
        Commands::Demo {
            track,
            clip,
            start_time,
            interval,
            spacing_m,
            utc_offset,
            seed,
            run_length,
            output,
            section,
        } => {
            let clock = match (clip, start_time) {
                (Some(clip), _) => FrameClock::from_clip_name(&clip, utc_offset).map(Some),
                (None, Some(local)) => FrameClock::from_local(&local, utc_offset).map(Some),
                (None, None) => Ok(None),
            };
            clock.and_then(|clock| {
                let demo = DemoOptions {
                    clock,
                    interval,
                    spacing_m,
                    assessor: CyclingAssessor::new(seed).with_run_length(run_length),
                };
                run_demo(&track, &demo, &output, &section, cli.verbose)
            })
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_track(path: &Path) -> Result<TrackStore> {
    println!("\n{}", "=".repeat(60));
    println!("Loading track from: {}", path.display());
    println!("{}", "=".repeat(60));

    let track = TrackStore::from_gpx_path(path)?;
    println!(
        "  [OK] {} points, {:.2}km, {:.0}s",
        track.len(),
        track.total_distance_m() / 1000.0,
        track.duration_secs()
    );
    if track.skipped_points() > 0 {
        println!("  [WARN] {} points skipped (no time or bad coordinates)", track.skipped_points());
    }
    Ok(track)
}

fn run_track(path: &Path) -> Result<()> {
    let track = load_track(path)?;

    if let Some((start, end)) = track.time_span() {
        println!("  Time span: {:.0} .. {:.0} (epoch s)", start, end);
    }
    if let Some(bounds) = track.bounds() {
        println!(
            "  Bounds: lat {:.5}..{:.5}, lng {:.5}..{:.5}",
            bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng
        );
    }
    if track.was_resorted() {
        println!("  Points were out of time order and have been re-sorted");
    }
    Ok(())
}

fn run_sections(
    track_path: &Path,
    frames_path: &Path,
    output: &OutputArgs,
    section: &SectionArgs,
    verbose: bool,
) -> Result<()> {
    let track = load_track(track_path)?;

    let json = fs::read_to_string(frames_path).map_err(|e| SurveyError::Io {
        path: frames_path.display().to_string(),
        message: e.to_string(),
    })?;
    let frames = frames_from_json(&json)?;
    println!("  [OK] {} frames from {}", frames.len(), frames_path.display());

    let config = SurveyConfig {
        sections: section.to_config(),
    };
    let corridor = run_survey(&frames, &track, &config)?;

    print_corridor(&corridor, verbose);
    write_output(&corridor, output)
}

struct DemoOptions {
    clock: Option<FrameClock>,
    interval: f64,
    spacing_m: f64,
    assessor: CyclingAssessor,
}

fn run_demo(
    track_path: &Path,
    demo: &DemoOptions,
    output: &OutputArgs,
    section: &SectionArgs,
    verbose: bool,
) -> Result<()> {
    if !(demo.interval > 0.0) {
        return Err(SurveyError::Config {
            message: format!("frame interval must be positive, got {}", demo.interval),
        });
    }

    let track = load_track(track_path)?;
    let Some((track_start, track_end)) = track.time_span() else {
        return Err(SurveyError::TrackNotFound {
            path: track_path.display().to_string(),
        });
    };

    // Without a clock the video is assumed to start with the track
    let start = demo.clock.map_or(track_start, |clock| clock.start_epoch());
    let count = ((track_end - start) / demo.interval).floor().max(0.0) as usize + 1;
    let candidates: Vec<f64> = (0..count)
        .map(|k| start + k as f64 * demo.interval)
        .collect();

    let resolver = PositionResolver::new(&track);
    let positions: Vec<_> = resolver
        .resolve_all(&candidates)
        .into_iter()
        .map(|p| p.point)
        .collect();
    let times: Vec<f64> = select_by_spacing(&positions, demo.spacing_m)
        .into_iter()
        .map(|i| candidates[i])
        .collect();
    println!(
        "  [OK] {} of {} candidate frames kept at {:.0}m spacing",
        times.len(),
        candidates.len(),
        demo.spacing_m
    );

    let frames = assess_frames(&demo.assessor, &times);
    let config = SurveyConfig {
        sections: section.to_config(),
    };
    let corridor = run_survey(&frames, &track, &config)?;

    print_corridor(&corridor, verbose);
    write_output(&corridor, output)
}

fn print_corridor(corridor: &Corridor, verbose: bool) {
    println!("\n{}", "=".repeat(60));
    println!(
        "Corridor: {} sections, {:.2}km",
        corridor.sections.len(),
        corridor.panel.total_length_km
    );
    println!("{}", "=".repeat(60));

    if verbose {
        for section in &corridor.sections {
            println!(
                "  #{:<3} frames {:>4}+{:<4} {:>6.3}km  {:<18} {:<10} IRI {:>4.1}  {:<6} {:?}",
                section.index,
                section.first_frame,
                section.frame_count,
                section.length_km,
                section.surface_type.as_str(),
                section.condition_class.as_str(),
                section.roughness.mid,
                section.intervention.code.as_str(),
                section.closed_by
            );
        }
    }

    if let Some(mean) = corridor.panel.mean_roughness {
        println!("\n  Mean roughness: {:.1} m/km", mean);
    }
    for (class, share) in &corridor.panel.condition_share_pct {
        println!("  {:<10} {:>5.1}%", class.as_str(), share);
    }

    let summary = &corridor.route_summary;
    println!(
        "\n  Total cost: USD {} ({} dominant)",
        format_usd(summary.total_cost),
        summary.dominant_intervention.as_str()
    );
    println!("  {}", summary.narrative);
    println!("\n  {}", corridor.panel.narrative);
    println!("\n  {}", corridor.equity_panel.narrative);

    if !corridor.diagnostics.is_empty() {
        println!("\n  Diagnostics:");
        for diagnostic in &corridor.diagnostics {
            println!("    {:?}", diagnostic);
        }
    }
}

fn write_output(corridor: &Corridor, output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.output {
        write_file(path, &corridor.to_geojson_string()?)?;
    }
    if let Some(path) = &output.frames_output {
        let geojson = corridor.frames_geojson()?;
        let text = serde_json::to_string_pretty(&geojson).map_err(|e| SurveyError::Internal {
            message: e.to_string(),
        })?;
        write_file(path, &text)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| SurveyError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    println!("\n  Wrote {}", path.display());
    Ok(())
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cassandra_cache::{ArtifactCache, MonthKey};
use cassandra_core::artifact::ArtifactRecord;
use cassandra_remote::mirror::mirror_directory;
use cassandra_viewer::inference::{run_inference_stub, MODELS};
use cassandra_viewer::{ControlMode, DataLoader, HourStep, LoadedData, ViewState, ViewerConfig};

/// Browse VLF station spectrograms and audio clips.
#[derive(Parser, Debug)]
#[command(name = "cassandra", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct StationArgs {
    /// Station identifier.
    #[arg(long, short, default_value = "ExperimentalG4")]
    station: String,

    /// Local folder with LoRes/, HiRes/ and Wav/ for non-remote stations.
    #[arg(long, default_value = "VLF/")]
    src: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Slider,
    Hour,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a station and summarize its collections.
    Load(StationArgs),

    /// Show frames and the audio clip selected for a time window.
    Window {
        #[command(flatten)]
        station: StationArgs,
        #[arg(long, value_enum, default_value_t = Mode::Slider)]
        mode: Mode,
        /// Date (YYYY-MM-DD). Defaults to the first date with data.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Window start (HH:MM:SS), slider mode.
        #[arg(long)]
        start: Option<NaiveTime>,
        /// Window end (HH:MM:SS), slider mode.
        #[arg(long)]
        end: Option<NaiveTime>,
        /// Hours to step forward (hour mode); negative steps back.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        step: i32,
        /// HiRes minutes before the picked hour (hour mode).
        #[arg(long, default_value_t = 0)]
        minutes_before: u32,
        /// HiRes minutes after the picked hour (hour mode).
        #[arg(long, default_value_t = 60)]
        minutes_after: u32,
    },

    /// Print the cached listing of one station month, refreshing if stale.
    Month {
        #[arg(long, short)]
        station: String,
        /// Month as YYYY-MM.
        #[arg(long, short)]
        month: String,
    },

    /// Look up a cached thumbnail. Never touches the network.
    Thumb {
        #[arg(long, short)]
        station: String,
        /// Artifact timestamp (RFC 3339), selects the month bucket.
        #[arg(long)]
        timestamp: DateTime<Utc>,
        #[arg(long)]
        filename: String,
        /// Write the bytes here instead of printing a summary.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Copy a remote station folder to local disk.
    Mirror {
        #[arg(long, short)]
        station: String,
        #[arg(long)]
        dest: PathBuf,
        /// Remote directory; defaults to the station's root.
        #[arg(long)]
        remote_dir: Option<String>,
    },

    /// Create the `frames` table in the configured metadata store.
    Migrate,

    /// Run the inference stub and print the resulting log.
    Infer {
        #[arg(long, default_value = MODELS[0], value_parser = clap::builder::PossibleValuesParser::new(MODELS))]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cassandra_viewer=info,cassandra_cache=info,cassandra_remote=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ViewerConfig::from_env();
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Command::Load(args) => cmd_load(&config, args).await,
        Command::Window {
            station,
            mode,
            date,
            start,
            end,
            step,
            minutes_before,
            minutes_after,
        } => {
            let mut state = ViewState::new(match mode {
                Mode::Slider => ControlMode::Slider,
                Mode::Hour => ControlMode::HourPicker,
            });
            state.date = date;
            state.minutes_before = minutes_before;
            state.minutes_after = minutes_after;
            cmd_window(&config, station, state, start.zip(end), step).await
        }
        Command::Month { station, month } => cmd_month(&config, &station, &month).await,
        Command::Thumb {
            station,
            timestamp,
            filename,
            out,
        } => cmd_thumb(&config, &station, timestamp, &filename, out).await,
        Command::Mirror {
            station,
            dest,
            remote_dir,
        } => cmd_mirror(&config, &station, &dest, remote_dir).await,
        Command::Migrate => cmd_migrate(&config).await,
        Command::Infer { model } => {
            let mut state = ViewState::default();
            run_inference_stub(&model, &mut state, Utc::now());
            for line in &state.logs {
                println!("{line}");
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn load(config: &ViewerConfig, args: &StationArgs) -> Result<LoadedData> {
    let loader = DataLoader::from_config(config)?;
    loader
        .load(&args.station, &args.src)
        .await
        .with_context(|| format!("loading station {}", args.station))
}

async fn cmd_load(config: &ViewerConfig, args: StationArgs) -> Result<()> {
    let data = load(config, &args).await?;

    println!("station:  {}", args.station);
    println!("source:   {:?} (remote: {})", data.origin, data.is_remote);
    println!("LoRes:    {}", data.lowres.len());
    println!("HiRes:    {}", data.highres.len());
    println!("Wav:      {}", data.audio.len());
    match data.span() {
        Some((first, last)) => println!(
            "span:     {} -> {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        None => println!("No data found for this station/folder."),
    }

    if let Some(client) = data.client {
        client.close().await;
    }
    Ok(())
}

async fn cmd_window(
    config: &ViewerConfig,
    args: StationArgs,
    mut state: ViewState,
    times: Option<(NaiveTime, NaiveTime)>,
    step: i32,
) -> Result<()> {
    let data = load(config, &args).await?;
    if !state.sync(&data) {
        println!("No data found for this station/folder.");
        return Ok(());
    }

    if let (Some((start, end)), Some(date)) = (times, state.date) {
        if !state.set_window(date, start, end) {
            bail!("Start time must be before end time");
        }
    }
    let direction = if step < 0 { HourStep::Earlier } else { HourStep::Later };
    for _ in 0..step.unsigned_abs() {
        if !state.step_hour(&data.lowres, direction) {
            break;
        }
    }

    let Some(selection) = state.select(&data) else {
        println!("No window selected.");
        return Ok(());
    };

    println!(
        "window: {} -> {}",
        selection.start.format("%Y-%m-%d %H:%M"),
        selection.end.format("%H:%M")
    );
    print_records("LoRes", &selection.lowres);
    print_records("HiRes", &selection.highres);
    match &selection.clip {
        Some(clip) => println!("clip: {}", clip.original_filename),
        None => println!("clip: -"),
    }
    for message in &selection.messages {
        println!("info: {message}");
    }

    if let Some(client) = data.client {
        client.close().await;
    }
    Ok(())
}

async fn cmd_month(config: &ViewerConfig, station: &str, month: &str) -> Result<()> {
    let month = MonthKey::parse(month).with_context(|| format!("invalid month {month:?}, expected YYYY-MM"))?;
    let loader = DataLoader::from_config(config)?;
    let Some(source) = loader.remote_source(station) else {
        bail!("station {station} is not in the remote registry");
    };

    let cache = ArtifactCache::new(config.cache_config());
    let result = cache.get_month_listing(source.as_ref(), station, month).await;
    source.close().await;
    let listing = result?;

    println!(
        "{} {}: {} records (fetched {})",
        listing.station,
        listing.month,
        listing.records.len(),
        listing.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_records("records", &listing.records);
    Ok(())
}

async fn cmd_thumb(
    config: &ViewerConfig,
    station: &str,
    timestamp: DateTime<Utc>,
    filename: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let cache = ArtifactCache::new(config.cache_config());
    let Some(bytes) = cache.load_thumbnail(station, timestamp, filename).await? else {
        println!("not found");
        return Ok(());
    };

    match out {
        Some(path) => {
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{} bytes -> {}", bytes.len(), path.display());
        }
        None => println!("{filename}: {} bytes", bytes.len()),
    }
    Ok(())
}

async fn cmd_mirror(
    config: &ViewerConfig,
    station: &str,
    dest: &std::path::Path,
    remote_dir: Option<String>,
) -> Result<()> {
    let loader = DataLoader::from_config(config)?;
    let Some(station_config) = loader.registry().get(station) else {
        bail!("station {station} is not in the remote registry");
    };

    let client = config.connector().client(station, station_config);
    let remote_dir = remote_dir.unwrap_or_else(|| station_config.normalized_base());
    let result = mirror_directory(&client, &remote_dir, dest).await;
    client.close().await;
    let report = result?;

    println!(
        "downloaded {}, skipped {}, failed {}",
        report.downloaded, report.skipped, report.failed
    );
    Ok(())
}

async fn cmd_migrate(config: &ViewerConfig) -> Result<()> {
    let Some(url) = config.database_url.as_deref() else {
        bail!("DATABASE_URL must be set");
    };

    let pool = cassandra_db::create_pool(url, config.store_timeout())
        .await
        .context("connecting to metadata store")?;
    cassandra_db::health_check(&pool)
        .await
        .context("metadata store health check")?;
    tracing::info!("Database health check passed");

    cassandra_db::run_migrations(&pool)
        .await
        .context("applying migrations")?;
    tracing::info!("Database migrations applied");
    println!("frames table is up to date");
    Ok(())
}

fn print_records(label: &str, records: &[ArtifactRecord]) {
    println!("{label} ({}):", records.len());
    for record in records {
        println!(
            "  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.original_filename
        );
    }
}

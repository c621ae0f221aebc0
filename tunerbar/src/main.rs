//! tunerbar: companion front-end for the EpgTimerSrv recording scheduler.
//!
//! Polls the recorder state, keeps the channel, reservation, recorded and
//! tuner lists up to date and opens or closes the viewer around
//! reservations.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};

use tunerbar::clock::{Clock, SystemClock};
use tunerbar::config::{self, ConfigFile, Settings};
use tunerbar::logging;
use tunerbar::service::SnapshotService;
use tunerbar::ticker::Ticker;
use tunerbar::view::Tab;
use tunerbar::viewer::CommandLauncher;
use tunerbar::App;

/// tunerbar - EpgTimerSrv companion front-end
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Recorder state snapshot (overrides the configuration file)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Tab shown on startup
    #[arg(short, long, value_enum, default_value_t = Tab::Favorites)]
    tab: Tab,

    /// Print the current lists once and exit
    #[arg(short, long)]
    print: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Number of days to keep log files
    #[arg(long, default_value = "7")]
    log_retention_days: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from(config::DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    });
    let file_config = match &config_path {
        Some(path) => match config::load_config(path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return Err(e.into());
            }
        },
        None => ConfigFile::default(),
    };

    let log_dir = if args.log_dir.to_string_lossy() != "logs" {
        args.log_dir.clone()
    } else {
        PathBuf::from(file_config.logging.log_dir.as_deref().unwrap_or("logs"))
    };
    let log_retention_days = if args.log_retention_days != 7 {
        args.log_retention_days
    } else {
        file_config.logging.retention_days.unwrap_or(7)
    };
    let log_level = file_config.logging.level.clone();
    logging::init_logging(&log_dir, log_retention_days, args.verbose, log_level.as_deref())?;

    let mut settings = match Settings::from_file(file_config) {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    if let Some(snapshot) = args.snapshot {
        settings.snapshot_path = snapshot;
    }

    info!("Reading recorder state from {:?}", settings.snapshot_path);
    if settings.scheduler.enabled {
        info!(
            "Auto open enabled: open {}s before start, close at second {}",
            settings.scheduler.open_margin, settings.scheduler.close_margin
        );
    }

    let service = SnapshotService::new(settings.snapshot_path.clone());
    let launcher = CommandLauncher::new(settings.viewer.path.clone());
    let mut app = App::new(settings, service, launcher, args.tab);

    app.refresh(SystemClock.now(), true, true);
    for notice in app.take_notices() {
        warn!("{}", notice);
    }

    if args.print {
        println!("[{}]", app.tab().title());
        for row in app.rows() {
            println!("{}", row.to_line());
        }
        println!("[チューナー]");
        for row in app.tuner_rows() {
            println!("{}", row.to_line());
        }
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    };

    Ticker::new(SystemClock)
        .run(
            |now| {
                let report = app.tick(now);
                if !report.is_empty() {
                    info!(
                        "Viewers: launched {:?}, closed {:?}",
                        report.launched, report.closed
                    );
                }
                for notice in app.take_notices() {
                    warn!("{}", notice);
                }
            },
            shutdown,
        )
        .await;

    info!("Shutting down");
    Ok(())
}

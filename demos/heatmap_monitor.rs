//! Terminal front-end: connects, requests an X × Y grid and prints every completed matrix as a
//! text heatmap. Settings not given on the command line are read from `HEATMAP_*` variables.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use envconfig::Envconfig;
use log::{error, info};
use serial_heatmap::{LevelMode, LinkState, MonotonicClock, Session, Settings, TextHeatmap};

#[derive(Debug, Parser)]
struct Args {
    /// Serial port the device is attached to.
    port: Option<String>,
    #[clap(short, long)]
    baud: Option<u32>,
    /// Values per row sent to the device as X.
    #[clap(short)]
    x: Option<i32>,
    /// Rows per matrix sent to the device as Y.
    #[clap(short)]
    y: Option<i32>,
    /// Wait after each matrix in milliseconds.
    #[clap(short, long)]
    cooldown_ms: Option<i64>,
    /// File every received row is appended to.
    #[clap(long)]
    log_path: Option<PathBuf>,
    /// Heatmap scale: "dynamic" or "MIN..MAX".
    #[clap(long)]
    levels: Option<LevelMode>,
    /// Stop after this many matrices.
    #[clap(long)]
    frames: Option<usize>,
    #[clap(long, default_value_t = 20)]
    poll_interval_ms: u64,
}

impl Args {
    fn merge_into(self, mut settings: Settings) -> Settings {
        if let Some(port) = self.port {
            settings.port_name = port;
        }
        if let Some(baud) = self.baud {
            settings.baud_rate = baud;
        }
        if let Some(x) = self.x {
            settings.width = x;
        }
        if let Some(y) = self.y {
            settings.height = y;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            settings.cooldown_ms = cooldown_ms;
        }
        if let Some(log_path) = self.log_path {
            settings.log_path = log_path;
        }
        if let Some(levels) = self.levels {
            settings.levels = levels;
        }
        settings
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let frames = args.frames;
    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    let settings = match Settings::init_from_env() {
        Ok(settings) => args.merge_into(settings),
        Err(e) => {
            error!("Invalid HEATMAP_* environment: {}", e);
            std::process::exit(2);
        }
    };

    let mut session = Session::new(MonotonicClock::new(), TextHeatmap::new(settings.levels));
    session.configure(&settings);
    session.link_mut().on_state_change(|state| match state {
        LinkState::Connected(c) => info!("Port {} open", c.port_name()),
        LinkState::Disconnected => info!("Port closed"),
    });

    if session.connect(&settings.port_name, settings.baud_rate).is_err() {
        std::process::exit(1);
    }
    if let Err(e) = session.send_coordinates(settings.width, settings.height) {
        error!("Could not send coordinates: {}", e);
        std::process::exit(1);
    }

    let mut shown = 0;
    while session.link().is_connected() {
        if session.poll() > 0 {
            println!("{}", session.renderer().frame());
            shown += 1;
            if frames.map_or(false, |n| shown >= n) {
                break;
            }
        }
        thread::sleep(poll_interval);
    }
    session.disconnect();
}

//! Sends a single coordinate command and closes the port again.

use clap::Parser;
use serial_heatmap::LinkController;

#[derive(Debug, Parser)]
struct Config {
    device: String,
    x: i32,
    y: i32,
    #[clap(short, long, default_value_t = 9600)]
    baud: u32,
}

fn main() {
    env_logger::init();

    let config = Config::parse();
    let mut link = LinkController::new();
    link.connect(&config.device, config.baud).unwrap();
    link.send(config.x, config.y).unwrap();
    link.disconnect();
}

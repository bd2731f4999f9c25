//! Plays the device: waits for a `"{x},{y};"` command and then keeps streaming Y rows of X values.
//!
//! Pair it with the monitor through a pseudo terminal pair, e.g.
//! `socat PTY,link=/tmp/ttyV0,raw,echo=0 PTY,link=/tmp/ttyV1,raw,echo=0`.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

#[derive(Debug, Parser)]
struct Args {
    port: String,
    #[clap(short, long, default_value_t = 9600)]
    baud: u32,
    /// Pause between rows in milliseconds.
    #[clap(long, default_value_t = 50)]
    row_delay_ms: u64,
}

fn parse_command(command: &str) -> Option<(usize, usize)> {
    let (x, y) = command.trim().trim_end_matches(';').split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut port = serialport::new(&args.port, args.baud)
        .timeout(Duration::from_millis(100))
        .open()
        .expect("Failed to open serial port");

    let mut command = String::new();
    let (x, y) = loop {
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => {
                command.push(byte[0] as char);
                if byte[0] == b';' {
                    match parse_command(&command) {
                        Some(xy) => break xy,
                        None => warn!("Ignoring command {:?}", command),
                    }
                    command.clear();
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => panic!("Read failed: {}", e),
        }
    };
    info!("Streaming {} x {} matrices", x, y);

    let mut frame = 0usize;
    loop {
        for row in 0..y {
            let values: Vec<String> = (0..x)
                .map(|col| (((row + col + frame) % 10) * 10).to_string())
                .collect();
            port.write_all(format!("{}\r\n", values.join(" ")).as_bytes())
                .expect("Failed to write row");
            port.flush().unwrap();
            thread::sleep(Duration::from_millis(args.row_delay_ms));
        }
        frame += 1;
    }
}

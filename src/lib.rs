//! serial-heatmap turns a stream of newline-delimited integer rows coming from a serial device
//! into complete matrices and hands them to a heatmap renderer.
//!
//! The crate is split into a link layer, which owns the single serial connection and frames the
//! raw byte stream into text lines, and an ingestor, which accumulates parsed rows into a matrix
//! of a configured height and enforces a cooldown between matrices. A [`Session`] owns one of
//! each together with the row log and the renderer.
//!
//! ```no_run
//! use serial_heatmap::{MonotonicClock, Session, TextHeatmap};
//! use std::time::Duration;
//!
//! let mut session = Session::new(MonotonicClock::new(), TextHeatmap::default());
//! session.connect("/dev/ttyACM0", 9600).unwrap();
//! session.send_coordinates(8, 8).unwrap();
//! session.set_cooldown(Some(Duration::from_millis(500)));
//! loop {
//!     session.poll();
//! #   break;
//! }
//! ```
#![warn(missing_docs, missing_debug_implementations)]
// Don't worry about needing to `unwrap()` or otherwise handle some results in
// doc tests.
#![doc(test(attr(allow(unused_must_use))))]

mod clock;
pub mod config;
mod datalog;
mod error;
pub mod ingest;
pub mod link;
mod matrix;
mod render;
mod session;

pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::config::{LevelMode, Settings};
pub use crate::datalog::{LogError, RowLog};
pub use crate::error::{ConnectError, DecodeError, ParseError, RenderError, SendError};
pub use crate::ingest::{GridIngestor, Ingest, IngestState, TargetGeometry};
pub use crate::link::{available_ports, Connection, LineAction, LinkController, LinkState};
pub use crate::matrix::{parse_row, Matrix, Row};
pub use crate::render::{Renderer, TextHeatmap};
pub use crate::session::Session;

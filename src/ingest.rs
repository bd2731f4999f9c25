//! Turns received lines into matrices.
//!
//! The ingestor collects one parsed row per line until the configured height is reached, hands the
//! completed [`Matrix`] out and then ignores input for a cooldown period. Nothing is collected
//! while paused or before both the geometry and the cooldown have been configured.

use std::mem;
use std::time::Duration;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::error::ParseError;
use crate::matrix::{parse_row, Matrix, Row};

/// Expected matrix shape.
///
/// Values come straight from the operator and may be zero or negative, which leaves ingestion
/// inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetGeometry {
    /// Values per row (x). Informational; rows are not checked against it.
    pub width: i32,
    /// Rows per matrix (y).
    pub height: i32,
}

impl TargetGeometry {
    /// Geometry of `width` × `height`.
    pub fn new(width: i32, height: i32) -> Self {
        TargetGeometry { width, height }
    }

    /// Whether both dimensions are positive.
    pub fn is_set(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Row count of a complete matrix, if the geometry is set.
    pub fn rows(&self) -> Option<usize> {
        if self.is_set() {
            usize::try_from(self.height).ok()
        } else {
            None
        }
    }
}

/// Where the ingestor currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Paused, or geometry or cooldown not configured.
    Idle,
    /// A matrix completed less than one cooldown period ago.
    Cooling,
    /// Collecting rows.
    Accumulating,
}

/// Outcome of handing one line to the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    /// The line was not considered: paused, unconfigured or cooling down.
    Ignored,
    /// The line was appended as row number `row` (starting at 1).
    Appended {
        /// Position of the row within the matrix in progress.
        row: usize,
    },
    /// The line is not a row of integers and was discarded.
    Rejected(ParseError),
    /// The line completed a matrix. The ingestor has reset and is cooling down.
    Completed(Matrix),
}

impl Ingest {
    /// Row number the line was stored as, if it was stored at all.
    pub fn appended_row(&self) -> Option<usize> {
        match self {
            Ingest::Appended { row } => Some(*row),
            Ingest::Completed(matrix) => Some(matrix.height()),
            Ingest::Ignored | Ingest::Rejected(_) => None,
        }
    }
}

/// Accumulates rows into matrices.
#[derive(Debug)]
pub struct GridIngestor<C> {
    clock: C,
    geometry: TargetGeometry,
    cooldown: Option<Duration>,
    paused: bool,
    rows: Vec<Row>,
    counter: usize,
    completed_at: Option<Duration>,
}

impl<C: Clock> GridIngestor<C> {
    /// Creates an unconfigured ingestor reading time from `clock`.
    pub fn new(clock: C) -> Self {
        GridIngestor {
            clock,
            geometry: TargetGeometry::default(),
            cooldown: None,
            paused: false,
            rows: Vec::new(),
            counter: 0,
            completed_at: None,
        }
    }

    /// Sets the expected shape.
    ///
    /// Changing the height discards a matrix in progress, as its rows were counted against the
    /// old height.
    pub fn set_geometry(&mut self, geometry: TargetGeometry) {
        if geometry.height != self.geometry.height && self.counter > 0 {
            debug!(
                "Height changed from {} to {}, discarding {} rows",
                self.geometry.height, geometry.height, self.counter
            );
            self.reset();
        }
        self.geometry = geometry;
    }

    /// The expected shape.
    pub fn geometry(&self) -> TargetGeometry {
        self.geometry
    }

    /// Sets the wait after each completed matrix. `None` leaves ingestion idle.
    pub fn set_cooldown(&mut self, cooldown: Option<Duration>) {
        self.cooldown = cooldown;
        match cooldown {
            Some(period) => info!(
                "Cooldown after each matrix set to {} ms",
                period.as_millis()
            ),
            None => info!("Cooldown cleared"),
        }
    }

    /// Sets the cooldown from an operator-entered millisecond value; negative means unset.
    pub fn set_cooldown_ms(&mut self, millis: i64) {
        let cooldown = u64::try_from(millis).ok().map(Duration::from_millis);
        self.set_cooldown(cooldown);
    }

    /// The wait after each completed matrix.
    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    /// Toggles the pause flag and returns the new value.
    ///
    /// The matrix in progress is discarded either way.
    pub fn stop(&mut self) -> bool {
        self.paused = !self.paused;
        self.reset();
        if self.paused {
            info!("Data acquisition paused");
        } else {
            info!("Data acquisition resumed");
        }
        self.paused
    }

    /// Whether ingestion is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Discards the matrix in progress.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.counter = 0;
    }

    /// Rows collected for the matrix in progress.
    pub fn row_count(&self) -> usize {
        self.counter
    }

    /// The rows collected so far.
    pub fn buffered_rows(&self) -> &[Row] {
        &self.rows
    }

    /// Current state as of now.
    pub fn state(&self) -> IngestState {
        match (self.paused, self.geometry.rows(), self.cooldown) {
            (false, Some(_), Some(cooldown)) if self.is_cooling(cooldown) => IngestState::Cooling,
            (false, Some(_), Some(_)) => IngestState::Accumulating,
            _ => IngestState::Idle,
        }
    }

    /// Handles one received line.
    pub fn ingest(&mut self, line: &str) -> Ingest {
        if self.paused {
            return Ingest::Ignored;
        }
        let (height, cooldown) = match (self.geometry.rows(), self.cooldown) {
            (Some(height), Some(cooldown)) => (height, cooldown),
            _ => return Ingest::Ignored,
        };
        if self.is_cooling(cooldown) {
            return Ingest::Ignored;
        }
        // A counter beyond the height can only be cleared by an explicit reset.
        if self.counter >= height {
            return Ingest::Ignored;
        }

        let row = match parse_row(line) {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping line: {}", e);
                return Ingest::Rejected(e);
            }
        };
        self.rows.push(row);
        self.counter += 1;

        if self.counter != height {
            return Ingest::Appended { row: self.counter };
        }

        let matrix = Matrix::new(mem::take(&mut self.rows));
        self.counter = 0;
        self.completed_at = Some(self.clock.now());
        info!("Matrix complete, waiting {} ms", cooldown.as_millis());
        Ingest::Completed(matrix)
    }

    fn is_cooling(&self, cooldown: Duration) -> bool {
        match self.completed_at {
            Some(at) => self.clock.now().saturating_sub(at) < cooldown,
            None => false,
        }
    }
}

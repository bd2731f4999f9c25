use std::time::Duration;

use log::{error, info, warn};

use crate::clock::Clock;
use crate::config::Settings;
use crate::datalog::RowLog;
use crate::error::{ConnectError, RenderError, SendError};
use crate::ingest::{GridIngestor, Ingest, IngestState, TargetGeometry};
use crate::link::{Connection, LineAction, LinkController, PortOpener, SerialOpener};
use crate::matrix::Matrix;
use crate::render::Renderer;

/// Everything one front-end window drives: the link, the ingestor, the row log and the renderer.
///
/// All work happens inside the calls made on it; [`Session::poll`] is meant to be called
/// whenever the port may have new bytes.
#[derive(Debug)]
pub struct Session<C: Clock, R, O: PortOpener = SerialOpener> {
    link: LinkController<O>,
    ingestor: GridIngestor<C>,
    renderer: R,
    row_log: Option<RowLog>,
}

impl<C: Clock, R: Renderer> Session<C, R, SerialOpener> {
    /// Session talking to real serial ports.
    pub fn new(clock: C, renderer: R) -> Self {
        Session::with_link(LinkController::new(), clock, renderer)
    }
}

impl<C: Clock, R: Renderer, O: PortOpener> Session<C, R, O> {
    /// Session driving `link`.
    pub fn with_link(link: LinkController<O>, clock: C, renderer: R) -> Self {
        Session {
            link,
            ingestor: GridIngestor::new(clock),
            renderer,
            row_log: None,
        }
    }

    /// Appends every ingested row to `row_log`.
    pub fn with_row_log(mut self, row_log: RowLog) -> Self {
        self.row_log = Some(row_log);
        self
    }

    /// Replaces the row log; `None` stops logging rows.
    pub fn set_row_log(&mut self, row_log: Option<RowLog>) {
        self.row_log = row_log;
    }

    /// Takes geometry, cooldown and log path from `settings`.
    pub fn configure(&mut self, settings: &Settings) {
        settings.apply_to(&mut self.ingestor);
        self.row_log = Some(RowLog::new(settings.log_path.clone()));
    }

    /// Opens `port_name`. Any matrix in progress is discarded.
    pub fn connect(
        &mut self,
        port_name: &str,
        baud_rate: u32,
    ) -> Result<&Connection, ConnectError> {
        self.ingestor.reset();
        let connection = self.link.connect(port_name, baud_rate).map_err(|e| {
            error!("Could not connect to {:?}: {}", port_name, e);
            e
        })?;
        info!("Set the coordinates (X, Y) and the cooldown to start");
        Ok(connection)
    }

    /// Closes the link and discards any matrix in progress.
    pub fn disconnect(&mut self) {
        self.link.disconnect();
        self.ingestor.reset();
    }

    /// Sends `"{x},{y};"` to the device and, once sent, expects `x` × `y` matrices.
    pub fn send_coordinates(&mut self, x: i32, y: i32) -> Result<(), SendError> {
        self.link.send(x, y)?;
        self.ingestor.set_geometry(TargetGeometry::new(x, y));
        Ok(())
    }

    /// Sets the expected matrix shape without telling the device.
    pub fn set_geometry(&mut self, geometry: TargetGeometry) {
        self.ingestor.set_geometry(geometry);
    }

    /// Sets the wait after each completed matrix.
    pub fn set_cooldown(&mut self, cooldown: Option<Duration>) {
        self.ingestor.set_cooldown(cooldown);
    }

    /// Toggles pausing and returns whether ingestion is now paused.
    ///
    /// Either way the matrix in progress and any buffered input are discarded.
    pub fn stop(&mut self) -> bool {
        let paused = self.ingestor.stop();
        if let Err(e) = self.link.drain() {
            warn!("Could not clear input: {}", e);
        }
        paused
    }

    /// Processes every line received so far and returns the number of matrices completed.
    ///
    /// A read error closes the link.
    pub fn poll(&mut self) -> usize {
        let ingestor = &mut self.ingestor;
        let renderer = &mut self.renderer;
        let row_log = self.row_log.as_ref();
        let mut completed = 0;

        let result = self.link.poll(|line| {
            let outcome = ingestor.ingest(line);
            if let (Some(row), Some(log)) = (outcome.appended_row(), row_log) {
                if let Err(e) = log.append(row, line) {
                    error!("{}", e);
                }
            }

            match outcome {
                Ingest::Completed(matrix) => {
                    completed += 1;
                    // The ingestor has already cleared its buffer for the next matrix.
                    if let Err(e) = renderer.render(&matrix) {
                        error!("Could not draw the received matrix, discarding it: {}", e);
                    }
                    LineAction::Drain
                }
                Ingest::Ignored | Ingest::Appended { .. } | Ingest::Rejected(_) => {
                    LineAction::Continue
                }
            }
        });

        if let Err(e) = result {
            error!("Reading from the port failed: {}", e);
            self.disconnect();
        }
        completed
    }

    /// Replaces the heatmap with the placeholder pattern.
    pub fn clear_heatmap(&mut self) -> Result<(), RenderError> {
        self.renderer.render(&Matrix::placeholder())?;
        info!("Heatmap cleared");
        Ok(())
    }

    /// The ingestor's state as of now.
    pub fn state(&self) -> IngestState {
        self.ingestor.state()
    }

    /// The link.
    pub fn link(&self) -> &LinkController<O> {
        &self.link
    }

    /// The link, mutably, e.g. to register a state-change callback.
    pub fn link_mut(&mut self) -> &mut LinkController<O> {
        &mut self.link
    }

    /// The ingestor.
    pub fn ingestor(&self) -> &GridIngestor<C> {
        &self.ingestor
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

//! The serial link: lifecycle of the one open connection, the coordinate command and line
//! extraction from the received byte stream.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, error, info, warn};
use serialport::{ClearBuffer, SerialPort};

use crate::error::{ConnectError, SendError};

#[cfg(test)]
pub(crate) mod fake;
mod framer;

pub use self::framer::{LineFramer, MAX_PENDING};

/// Read timeout used for ports opened by [`SerialOpener`].
///
/// Reads only ever ask for bytes the OS already holds, so this merely bounds a misbehaving driver.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/// The byte-level operations the link needs from an open port.
pub trait Transport {
    /// Appends whatever is already buffered by the OS to `buf` without waiting for more.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;

    /// Writes all of `data` and flushes it to the device.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Discards bytes received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Transport for Box<dyn SerialPort> {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let available = self.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(0);
        }

        let start = buf.len();
        buf.resize(start + available, 0);
        match self.read(&mut buf[start..]) {
            Ok(n) => {
                buf.truncate(start + n);
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                buf.truncate(start);
                Ok(0)
            }
            Err(e) => {
                buf.truncate(start);
                Err(e)
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(self, data)?;
        self.flush()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Opens ports by name.
pub trait PortOpener {
    /// The handle type produced.
    type Port: Transport;

    /// Opens `port_name` for reading and writing at `baud_rate`.
    fn open(&mut self, port_name: &str, baud_rate: u32) -> Result<Self::Port, ConnectError>;
}

/// [`PortOpener`] for real serial ports.
#[derive(Debug, Clone, Copy)]
pub struct SerialOpener {
    timeout: Duration,
}

impl SerialOpener {
    /// Opener using `timeout` for reads and writes.
    pub fn new(timeout: Duration) -> Self {
        SerialOpener { timeout }
    }
}

impl Default for SerialOpener {
    fn default() -> Self {
        SerialOpener::new(DEFAULT_TIMEOUT)
    }
}

impl PortOpener for SerialOpener {
    type Port = Box<dyn SerialPort>;

    fn open(&mut self, port_name: &str, baud_rate: u32) -> Result<Self::Port, ConnectError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(self.timeout)
            .open()?;
        Ok(port)
    }
}

/// Names of the serial ports present on the system.
pub fn available_ports() -> serialport::Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// The currently open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    port_name: String,
    baud_rate: u32,
}

impl Connection {
    /// Name the port was opened with.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Baud rate the port was opened with.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

/// Notification sent to the front-end whenever the link opens or closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// A connection has been opened.
    Connected(Connection),
    /// The connection has been closed.
    Disconnected,
}

/// What the link should do after handing a line to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Keep delivering lines.
    Continue,
    /// Throw away everything still buffered, both here and in the OS.
    Drain,
}

struct Open<P> {
    info: Connection,
    port: P,
}

/// Owns the single serial connection.
pub struct LinkController<O: PortOpener = SerialOpener> {
    opener: O,
    open: Option<Open<O::Port>>,
    framer: LineFramer,
    read_buf: Vec<u8>,
    lines_received: u64,
    on_state_change: Option<Box<dyn FnMut(&LinkState)>>,
}

impl LinkController<SerialOpener> {
    /// Controller for real serial ports.
    pub fn new() -> Self {
        LinkController::with_opener(SerialOpener::default())
    }
}

impl Default for LinkController<SerialOpener> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: PortOpener> LinkController<O> {
    /// Controller opening ports through `opener`.
    pub fn with_opener(opener: O) -> Self {
        LinkController {
            opener,
            open: None,
            framer: LineFramer::new(),
            read_buf: Vec::new(),
            lines_received: 0,
            on_state_change: None,
        }
    }

    /// Registers the callback notified after every connect and disconnect.
    pub fn on_state_change<F>(&mut self, callback: F)
    where
        F: FnMut(&LinkState) + 'static,
    {
        self.on_state_change = Some(Box::new(callback));
    }

    /// Opens `port_name`, replacing any connection already open.
    ///
    /// Stale input is discarded and the line counter restarts at zero.
    pub fn connect(&mut self, port_name: &str, baud_rate: u32) -> Result<&Connection, ConnectError> {
        if port_name.is_empty() {
            return Err(ConnectError::InvalidPort(String::new()));
        }
        if baud_rate == 0 {
            return Err(ConnectError::InvalidBaudRate(baud_rate));
        }
        if self.is_connected() {
            warn!("Closing the open connection before connecting to {}", port_name);
            self.disconnect();
        }

        let mut port = self.opener.open(port_name, baud_rate)?;
        if let Err(e) = port.discard_input() {
            warn!("Could not clear stale input on {}: {}", port_name, e);
        }
        self.framer.clear();
        self.lines_received = 0;

        let info = Connection {
            port_name: port_name.to_owned(),
            baud_rate,
        };
        info!("Connected to port {} at {} baud", port_name, baud_rate);
        self.notify(LinkState::Connected(info.clone()));
        Ok(&self.open.insert(Open { info, port }).info)
    }

    /// Closes the connection. Does nothing when not connected.
    pub fn disconnect(&mut self) {
        if let Some(mut open) = self.open.take() {
            if let Err(e) = open.port.discard_input() {
                debug!("Could not clear input on {}: {}", open.info.port_name, e);
            }
            self.framer.clear();
            self.lines_received = 0;
            drop(open);
            info!("Disconnected");
            self.notify(LinkState::Disconnected);
        }
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.open.is_some()
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.open.as_ref().map(|open| &open.info)
    }

    /// Sends the coordinate command `"{x},{y};"`.
    pub fn send(&mut self, x: i32, y: i32) -> Result<(), SendError> {
        let open = self.open.as_mut().ok_or(SendError::NotConnected)?;
        let command = format!("{},{};", x, y);
        open.port.write_all(command.as_bytes()).map_err(|e| {
            error!("Failed to send {:?}: {}", command, e);
            SendError::from(e)
        })?;
        info!("Sent coordinates (X:{} Y:{})", x, y);
        Ok(())
    }

    /// Reads whatever has arrived and calls `on_line` for each complete line.
    ///
    /// Returns the number of lines delivered. Partial lines stay buffered for the next call.
    pub fn poll<F>(&mut self, mut on_line: F) -> io::Result<usize>
    where
        F: FnMut(&str) -> LineAction,
    {
        let open = match self.open.as_mut() {
            Some(open) => open,
            None => return Ok(0),
        };

        self.read_buf.clear();
        open.port.read_available(&mut self.read_buf)?;
        self.framer.push(&self.read_buf);

        let mut delivered = 0;
        while let Some(line) = self.framer.next_line() {
            self.lines_received += 1;
            delivered += 1;
            if on_line(&line) == LineAction::Drain {
                self.framer.clear();
                open.port.discard_input()?;
                break;
            }
        }
        Ok(delivered)
    }

    /// Discards all buffered input.
    pub fn drain(&mut self) -> io::Result<()> {
        self.framer.clear();
        match self.open.as_mut() {
            Some(open) => open.port.discard_input(),
            None => Ok(()),
        }
    }

    /// Lines delivered since the connection was opened.
    pub fn lines_received(&self) -> u64 {
        self.lines_received
    }

    fn notify(&mut self, state: LinkState) {
        if let Some(callback) = self.on_state_change.as_mut() {
            callback(&state);
        }
    }
}

impl<O: PortOpener> fmt::Debug for LinkController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkController")
            .field("connection", &self.connection())
            .field("pending", &self.framer.pending())
            .field("lines_received", &self.lines_received)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FakeOpener, Wire};
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn connected() -> (LinkController<FakeOpener>, Wire) {
        let wire = Wire::default();
        let mut link = LinkController::with_opener(FakeOpener::new(wire.clone()));
        link.connect("/dev/ttyACM0", 9600).unwrap();
        (link, wire)
    }

    #[test]
    fn rejects_empty_port_name() {
        let mut link = LinkController::with_opener(FakeOpener::new(Wire::default()));
        assert!(matches!(
            link.connect("", 9600),
            Err(ConnectError::InvalidPort(_))
        ));
        assert!(!link.is_connected());
    }

    #[test]
    fn rejects_zero_baud_rate() {
        let wire = Wire::default();
        let mut link = LinkController::with_opener(FakeOpener::new(wire.clone()));
        assert!(matches!(
            link.connect("/dev/ttyACM0", 0),
            Err(ConnectError::InvalidBaudRate(0))
        ));
        assert!(wire.opened().is_empty());
    }

    #[test]
    fn open_failure_is_reported() {
        let wire = Wire::default();
        wire.fail_open(serialport::ErrorKind::NoDevice);
        let mut link = LinkController::with_opener(FakeOpener::new(wire));
        assert!(matches!(
            link.connect("COM9", 9600),
            Err(ConnectError::InvalidPort(_))
        ));
        assert!(link.connection().is_none());
    }

    #[test]
    fn connect_discards_stale_input() {
        let wire = Wire::default();
        wire.feed(b"stale\n");
        let mut link = LinkController::with_opener(FakeOpener::new(wire.clone()));
        let connection = link.connect("/dev/ttyACM0", 115_200).unwrap();
        assert_eq!(connection.port_name(), "/dev/ttyACM0");
        assert_eq!(connection.baud_rate(), 115_200);
        assert_eq!(link.poll(|_| LineAction::Continue).unwrap(), 0);
    }

    #[test]
    fn reconnect_closes_previous_connection() {
        let (mut link, wire) = connected();
        let states = Rc::new(RefCell::new(Vec::new()));
        let seen = states.clone();
        link.on_state_change(move |s| seen.borrow_mut().push(s.clone()));

        link.connect("/dev/ttyACM1", 9600).unwrap();
        assert_eq!(wire.opened().len(), 2);
        assert_eq!(
            *states.borrow(),
            [
                LinkState::Disconnected,
                LinkState::Connected(Connection {
                    port_name: "/dev/ttyACM1".to_owned(),
                    baud_rate: 9600,
                }),
            ]
        );
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mut link, _wire) = connected();
        let count = Rc::new(RefCell::new(0));
        let seen = count.clone();
        link.on_state_change(move |_| *seen.borrow_mut() += 1);

        link.disconnect();
        link.disconnect();
        assert!(!link.is_connected());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn send_writes_coordinate_command() {
        let (mut link, wire) = connected();
        link.send(12, -4).unwrap();
        assert_eq!(wire.written(), b"12,-4;");
    }

    #[test]
    fn send_without_connection_writes_nothing() {
        let wire = Wire::default();
        let mut link = LinkController::with_opener(FakeOpener::new(wire.clone()));
        assert!(matches!(link.send(1, 2), Err(SendError::NotConnected)));
        assert!(wire.written().is_empty());
    }

    #[test]
    fn send_reports_write_failure() {
        let (mut link, wire) = connected();
        wire.fail_writes();
        assert!(matches!(link.send(1, 2), Err(SendError::WriteFailure(_))));
    }

    #[test]
    fn poll_delivers_complete_lines_only() {
        let (mut link, wire) = connected();
        wire.feed(b"1 2 3\n4 5");
        let mut lines = Vec::new();
        let n = link
            .poll(|l| {
                lines.push(l.to_owned());
                LineAction::Continue
            })
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(lines, ["1 2 3"]);

        wire.feed(b" 6\n");
        link.poll(|l| {
            lines.push(l.to_owned());
            LineAction::Continue
        })
        .unwrap();
        assert_eq!(lines, ["1 2 3", "4 5 6"]);
        assert_eq!(link.lines_received(), 2);
    }

    #[test]
    fn drain_drops_remaining_lines() {
        let (mut link, wire) = connected();
        wire.feed(b"1\n2\n3");
        let mut lines = Vec::new();
        link.poll(|l| {
            lines.push(l.to_owned());
            LineAction::Drain
        })
        .unwrap();
        wire.feed(b"\n4\n");
        link.poll(|l| {
            lines.push(l.to_owned());
            LineAction::Continue
        })
        .unwrap();
        assert_eq!(lines, ["1", "", "4"]);
    }

    #[test]
    fn poll_when_disconnected_is_a_no_op() {
        let mut link = LinkController::with_opener(FakeOpener::new(Wire::default()));
        assert_eq!(link.poll(|_| LineAction::Continue).unwrap(), 0);
    }
}

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Reasons why a serial connection could not be established.
#[derive(Debug)]
pub enum ConnectError {
    /// The port name is empty or does not refer to a known device.
    InvalidPort(String),
    /// The device exists but could not be opened for reading and writing.
    OpenFailure(serialport::Error),
    /// The baud rate is zero.
    InvalidBaudRate(u32),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::InvalidPort(name) if name.is_empty() => {
                write!(f, "no port selected")
            }
            ConnectError::InvalidPort(name) => write!(f, "unknown port {:?}", name),
            ConnectError::OpenFailure(e) => write!(f, "failed to open port: {}", e),
            ConnectError::InvalidBaudRate(rate) => write!(f, "invalid baud rate {}", rate),
        }
    }
}

impl StdError for ConnectError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConnectError::OpenFailure(e) => Some(e),
            _ => None,
        }
    }
}

/// Reasons why coordinates could not be sent to the device.
#[derive(Debug)]
pub enum SendError {
    /// There is no open connection. Nothing has been written.
    NotConnected,
    /// The underlying write or flush did not complete.
    WriteFailure(io::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotConnected => write!(f, "not connected"),
            SendError::WriteFailure(e) => write!(f, "write failed: {}", e),
        }
    }
}

impl StdError for SendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SendError::WriteFailure(e) => Some(e),
            SendError::NotConnected => None,
        }
    }
}

impl From<io::Error> for SendError {
    fn from(io_error: io::Error) -> SendError {
        SendError::WriteFailure(io_error)
    }
}

/// A received line which is not a row of integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line is blank or holds a token which is not a decimal integer.
    MalformedRow {
        /// The offending line after trimming.
        line: String,
        /// The first token that failed to parse, if any.
        token: Option<String>,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedRow {
                line,
                token: Some(token),
            } => write!(f, "malformed row {:?}: {:?} is not an integer", line, token),
            ParseError::MalformedRow { line, token: None } => {
                write!(f, "malformed row {:?}: no values", line)
            }
        }
    }
}

impl StdError for ParseError {}

/// Invalid UTF-8 in a received line.
///
/// Never propagated out of the link: the offending bytes are substituted and the event is
/// logged at debug level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The line held the given number of bytes that are not valid UTF-8.
    InvalidEncoding(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidEncoding(len) => {
                write!(f, "line of {} bytes is not valid UTF-8", len)
            }
        }
    }
}

impl StdError for DecodeError {}

/// A matrix which cannot be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The matrix has no rows or its first row has no values.
    Empty,
    /// Row `row` has `found` values while the first row has `expected`.
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Empty => write!(f, "matrix is empty"),
            RenderError::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} values, expected {}",
                row + 1,
                found,
                expected
            ),
        }
    }
}

impl StdError for RenderError {}

impl From<serialport::Error> for ConnectError {
    fn from(e: serialport::Error) -> ConnectError {
        match e.kind() {
            serialport::ErrorKind::NoDevice
            | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
                ConnectError::InvalidPort(e.description)
            }
            _ => ConnectError::OpenFailure(e),
        }
    }
}

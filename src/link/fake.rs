//! In-memory port for exercising the link without hardware.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use super::{PortOpener, Transport};
use crate::error::ConnectError;

#[derive(Debug, Default)]
struct WireState {
    inbound: Vec<u8>,
    outbound: Vec<u8>,
    opened: Vec<(String, u32)>,
    discards: usize,
    fail_open: Option<serialport::ErrorKind>,
    fail_writes: bool,
    fail_reads: bool,
}

/// Both ends of a fake serial line. Clones share state.
#[derive(Debug, Clone, Default)]
pub(crate) struct Wire(Rc<RefCell<WireState>>);

impl Wire {
    pub(crate) fn feed(&self, bytes: &[u8]) {
        self.0.borrow_mut().inbound.extend_from_slice(bytes);
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.0.borrow().outbound.clone()
    }

    pub(crate) fn opened(&self) -> Vec<(String, u32)> {
        self.0.borrow().opened.clone()
    }

    pub(crate) fn discards(&self) -> usize {
        self.0.borrow().discards
    }

    pub(crate) fn fail_open(&self, kind: serialport::ErrorKind) {
        self.0.borrow_mut().fail_open = Some(kind);
    }

    pub(crate) fn fail_writes(&self) {
        self.0.borrow_mut().fail_writes = true;
    }

    pub(crate) fn fail_reads(&self) {
        self.0.borrow_mut().fail_reads = true;
    }
}

#[derive(Debug)]
pub(crate) struct FakePort(Wire);

impl Transport for FakePort {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let mut state = self.0 .0.borrow_mut();
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        let n = state.inbound.len();
        buf.append(&mut state.inbound);
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.0 .0.borrow_mut();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }
        state.outbound.extend_from_slice(data);
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        let mut state = self.0 .0.borrow_mut();
        state.inbound.clear();
        state.discards += 1;
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FakeOpener(Wire);

impl FakeOpener {
    pub(crate) fn new(wire: Wire) -> Self {
        FakeOpener(wire)
    }
}

impl PortOpener for FakeOpener {
    type Port = FakePort;

    fn open(&mut self, port_name: &str, baud_rate: u32) -> Result<FakePort, ConnectError> {
        let mut state = self.0 .0.borrow_mut();
        if let Some(kind) = state.fail_open {
            return Err(serialport::Error::new(kind, port_name).into());
        }
        state.opened.push((port_name.to_owned(), baud_rate));
        drop(state);
        Ok(FakePort(self.0.clone()))
    }
}

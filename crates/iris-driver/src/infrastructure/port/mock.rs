//! In-memory endpoint for testing.
//!
//! Clones share the same state, so a test keeps one handle to script input
//! and inspect output while the port owns another.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::ByteEndpoint;

#[derive(Debug, Default)]
struct MockState {
    /// `None` entries are gaps: one read that finds no data.
    input: VecDeque<Option<u8>>,
    output: Vec<u8>,
    bauds: Vec<u32>,
    drains: usize,
    disconnected: bool,
    fail_reads: bool,
    fail_writes: bool,
    fail_reconfigure: bool,
}

/// A scripted [`ByteEndpoint`].
#[derive(Debug, Clone, Default)]
pub struct MockEndpoint {
    state: Arc<Mutex<MockState>>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues bytes to be read.
    pub fn push_input(&self, bytes: &[u8]) {
        self.state().input.extend(bytes.iter().copied().map(Some));
    }

    /// Queues one read that finds no data, as if the input timeout expired.
    pub fn push_gap(&self) {
        self.state().input.push_back(None);
    }

    /// Returns and clears everything written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.state().output)
    }

    /// Line speeds requested through `reconfigure`, in order.
    pub fn bauds(&self) -> Vec<u32> {
        self.state().bauds.clone()
    }

    pub fn drain_count(&self) -> usize {
        self.state().drains
    }

    pub fn is_disconnected(&self) -> bool {
        self.state().disconnected
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn fail_reconfigure(&self, fail: bool) {
        self.state().fail_reconfigure = fail;
    }
}

impl ByteEndpoint for MockEndpoint {
    fn read_byte(&mut self, _wait: bool) -> io::Result<Option<u8>> {
        let mut state = self.state();
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted read failure"));
        }
        Ok(state.input.pop_front().flatten())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        state.output.extend_from_slice(bytes);
        Ok(())
    }

    fn reconfigure(&mut self, baud: u32) -> io::Result<()> {
        let mut state = self.state();
        if state.fail_reconfigure {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "scripted reconfigure failure"));
        }
        state.bauds.push(baud);
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        self.state().drains += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state().disconnected = true;
    }
}

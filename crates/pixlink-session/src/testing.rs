//! Link fakes shared by the unit tests.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;
use pixlink_transport::{LinkTransport, Result, TransportError};

use crate::config::SessionConfig;

/// Session timings small enough for unit tests.
pub(crate) fn quick_config() -> SessionConfig {
    SessionConfig {
        settle_delay: Duration::ZERO,
        poll_deadline: Duration::from_millis(500),
        ..SessionConfig::default()
    }
}

enum Step {
    Data(Vec<u8>),
    Empty,
    Fail,
}

/// Replays a fixed script of reads, then reports "no data" forever.
pub(crate) struct ScriptedLink {
    steps: VecDeque<Step>,
    fail_writes: bool,
    write_budget: Option<usize>,
    pub(crate) written: Vec<u8>,
    pub(crate) write_calls: usize,
    pub(crate) read_calls: usize,
}

impl ScriptedLink {
    pub(crate) fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            fail_writes: false,
            write_budget: None,
            written: Vec::new(),
            write_calls: 0,
            read_calls: 0,
        }
    }

    pub(crate) fn then_data(mut self, data: &[u8]) -> Self {
        self.steps.push_back(Step::Data(data.to_vec()));
        self
    }

    pub(crate) fn then_empty(mut self) -> Self {
        self.steps.push_back(Step::Empty);
        self
    }

    pub(crate) fn then_failure(mut self) -> Self {
        self.steps.push_back(Step::Fail);
        self
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Accept `budget` bytes in total, then report a full transmit side forever.
    pub(crate) fn accepting(mut self, budget: usize) -> Self {
        self.write_budget = Some(budget);
        self
    }
}

impl LinkTransport for ScriptedLink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.write_calls += 1;
        if self.fail_writes {
            return Err(TransportError::Closed);
        }
        let take = match self.write_budget.as_mut() {
            Some(budget) => {
                let take = bytes.len().min(*budget);
                *budget -= take;
                take
            }
            None => bytes.len(),
        };
        self.written.extend_from_slice(&bytes[..take]);
        Ok(take)
    }

    fn read(&mut self, _max_bytes: usize) -> Result<Bytes> {
        self.read_calls += 1;
        match self.steps.pop_front() {
            Some(Step::Data(data)) => Ok(Bytes::from(data)),
            Some(Step::Empty) | None => Ok(Bytes::new()),
            Some(Step::Fail) => Err(TransportError::Disconnected),
        }
    }
}

/// Simulated remote unit.
///
/// Once a full frame has been written it becomes "busy" for `latency`, then
/// makes its reply available. Exchanges listed in `silent_on` (1-based)
/// never produce a reply; reads during exchanges listed in `failing_on`
/// report a dropped link.
pub(crate) struct FakeUnit {
    frame_len: usize,
    latency: Duration,
    reply: fn(&[u8]) -> Vec<u8>,
    inbox: Vec<u8>,
    outbox: VecDeque<u8>,
    ready_at: Option<Instant>,
    frame_written_at: Option<Instant>,
    exchanges: usize,
    silent_on: Vec<usize>,
    failing_on: Vec<usize>,
    max_chunk: usize,
    pub(crate) first_read_after_write: Option<Duration>,
}

impl FakeUnit {
    pub(crate) fn new(frame_len: usize, latency: Duration, reply: fn(&[u8]) -> Vec<u8>) -> Self {
        Self {
            frame_len,
            latency,
            reply,
            inbox: Vec::new(),
            outbox: VecDeque::new(),
            ready_at: None,
            frame_written_at: None,
            exchanges: 0,
            silent_on: Vec::new(),
            failing_on: Vec::new(),
            max_chunk: 1000,
            first_read_after_write: None,
        }
    }

    /// Replies with exactly what it received.
    pub(crate) fn echo(frame_len: usize, latency: Duration) -> Self {
        Self::new(frame_len, latency, |frame| frame.to_vec())
    }

    /// Replies with `0, 1, .., 255` repeated to the frame length.
    pub(crate) fn cyclic(frame_len: usize, latency: Duration) -> Self {
        Self::new(frame_len, latency, |frame| {
            (0..frame.len()).map(|i| (i % 256) as u8).collect()
        })
    }

    pub(crate) fn silent_on(mut self, exchange: usize) -> Self {
        self.silent_on.push(exchange);
        self
    }

    pub(crate) fn failing_on(mut self, exchange: usize) -> Self {
        self.failing_on.push(exchange);
        self
    }

    pub(crate) fn exchanges(&self) -> usize {
        self.exchanges
    }
}

impl LinkTransport for FakeUnit {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.inbox.extend_from_slice(bytes);
        while self.inbox.len() >= self.frame_len {
            let frame: Vec<u8> = self.inbox.drain(..self.frame_len).collect();
            self.exchanges += 1;
            let now = Instant::now();
            self.frame_written_at = Some(now);
            self.first_read_after_write = None;
            if !self.silent_on.contains(&self.exchanges) {
                self.outbox.extend((self.reply)(&frame));
                self.ready_at = Some(now + self.latency);
            }
        }
        Ok(bytes.len())
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        if self.failing_on.contains(&self.exchanges) {
            return Err(TransportError::Disconnected);
        }
        if self.first_read_after_write.is_none() {
            self.first_read_after_write = self.frame_written_at.map(|at| at.elapsed());
        }
        match self.ready_at {
            Some(at) if Instant::now() >= at => {}
            _ => return Ok(Bytes::new()),
        }
        let n = self.outbox.len().min(max_bytes).min(self.max_chunk);
        Ok(self.outbox.drain(..n).collect::<Vec<u8>>().into())
    }

    fn transport_name(&self) -> &'static str {
        "fake-unit"
    }
}

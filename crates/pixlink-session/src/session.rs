use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use pixlink_codec::PixelBuffer;
use pixlink_transport::{LinkTransport, TransportError};
use tracing::{debug, trace, warn};

use crate::cancel::CancelFlag;
use crate::config::{SessionConfig, WriteMode};
use crate::error::{Phase, Result, SessionError};
use crate::state::SessionState;

/// Granularity at which a cancellable settle delay checks the flag.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Shortest pause after the link refuses outbound bytes.
const WRITE_BACKOFF: Duration = Duration::from_millis(1);

/// A complete reply collected by a session.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Exactly the expected number of bytes, in arrival order.
    pub payload: Bytes,
    /// Bytes that arrived beyond the expected length and were dropped.
    pub discarded: usize,
    /// Number of `read` calls issued while polling.
    pub reads: usize,
    /// Time spent polling.
    pub waited: Duration,
}

/// One request/response exchange over an exclusively borrowed link.
///
/// The session writes the outbound buffer, settles, then polls until the
/// expected reply length arrives or the poll deadline expires. Writing is
/// bounded by the write timeout and polling by the poll deadline; the
/// cancel flag is honoured in every phase. The reply buffer only ever
/// grows, in arrival order.
pub struct TransferSession<'a, T: LinkTransport + ?Sized> {
    link: &'a mut T,
    outbound: Bytes,
    written: usize,
    last_write: Instant,
    expected_len: usize,
    config: SessionConfig,
    cancel: Option<CancelFlag>,
    reply: BytesMut,
    reads: usize,
    state: SessionState,
}

impl<'a, T: LinkTransport + ?Sized> TransferSession<'a, T> {
    /// Create an idle session. The link stays borrowed until the session ends.
    pub fn new(
        link: &'a mut T,
        outbound: &PixelBuffer,
        expected_len: usize,
        config: SessionConfig,
    ) -> Self {
        Self {
            link,
            outbound: outbound.bytes(),
            written: 0,
            last_write: Instant::now(),
            expected_len,
            config,
            cancel: None,
            reply: BytesMut::with_capacity(expected_len),
            reads: 0,
            state: SessionState::Idle,
        }
    }

    /// Attach a cancellation flag checked while writing, settling and polling.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes accumulated so far.
    pub fn received(&self) -> usize {
        self.reply.len()
    }

    /// Run the exchange to a terminal state (blocking).
    pub fn run(mut self) -> Result<Reply> {
        self.write_outbound()?;

        self.transition(SessionState::Settling);
        self.settle_blocking()?;

        let started = self.begin_polling();
        while !self.reply_complete() {
            if self.is_cancelled() {
                return Err(self.cancelled());
            }
            if started.elapsed() >= self.poll_deadline() {
                break;
            }
            if !self.poll_once()? {
                self.idle_blocking(started);
            }
        }

        self.finish(started.elapsed())
    }

    fn write_outbound(&mut self) -> Result<()> {
        self.begin_writing();
        while !self.write_complete() {
            if self.is_cancelled() {
                return Err(self.cancelled());
            }
            if !self.write_once()? {
                let pause = self.write_stalled()?;
                std::thread::sleep(pause);
            }
        }
        Ok(())
    }

    pub(crate) fn begin_writing(&mut self) {
        self.transition(SessionState::Writing);
        debug!(
            bytes = self.outbound.len(),
            mode = ?self.config.write_mode,
            link = self.link.transport_name(),
            "writing outbound buffer"
        );
        self.last_write = Instant::now();
    }

    pub(crate) fn write_complete(&self) -> bool {
        self.written >= self.outbound.len()
    }

    /// Offer the next slice of the outbound buffer. Returns whether the link took any of it.
    pub(crate) fn write_once(&mut self) -> Result<bool> {
        let end = match self.config.write_mode {
            WriteMode::Bulk => self.outbound.len(),
            WriteMode::PerByte => self.written + 1,
        };
        let pending = end - self.written;
        let accepted = self
            .link
            .write(&self.outbound[self.written..end])
            .map_err(|err| self.transport_failure(Phase::Writing, err))?;

        if accepted == 0 {
            return Ok(false);
        }
        self.written += accepted.min(pending);
        self.last_write = Instant::now();
        Ok(true)
    }

    /// Called after a write made no progress. Fails once the link has refused
    /// bytes for the whole write timeout, otherwise returns the backoff.
    pub(crate) fn write_stalled(&mut self) -> Result<Duration> {
        let waited = self.last_write.elapsed();
        let timeout = self.config.write_timeout;
        if waited >= timeout {
            self.transition(SessionState::Timeout);
            return Err(SessionError::WriteTimeout {
                written: self.written,
                total: self.outbound.len(),
                waited,
            });
        }
        trace!(
            written = self.written,
            total = self.outbound.len(),
            "link transmit side full"
        );
        Ok(self.poll_interval().max(WRITE_BACKOFF).min(timeout - waited))
    }

    fn settle_blocking(&mut self) -> Result<()> {
        let delay = self.settle_delay();
        if self.cancel.is_none() {
            std::thread::sleep(delay);
            return Ok(());
        }

        let until = Instant::now() + delay;
        loop {
            if self.is_cancelled() {
                return Err(self.cancelled());
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep((until - now).min(CANCEL_CHECK_INTERVAL));
        }
    }

    pub(crate) fn begin_polling(&mut self) -> Instant {
        self.transition(SessionState::Polling);
        Instant::now()
    }

    pub(crate) fn reply_complete(&self) -> bool {
        self.reply.len() >= self.expected_len
    }

    /// Issue one read and append whatever arrived. Returns whether any bytes came in.
    pub(crate) fn poll_once(&mut self) -> Result<bool> {
        let chunk = self
            .link
            .read(self.config.read_chunk)
            .map_err(|err| self.transport_failure(Phase::Polling, err))?;
        self.reads += 1;

        if chunk.is_empty() {
            return Ok(false);
        }
        self.reply.extend_from_slice(&chunk);
        trace!(
            received = self.reply.len(),
            expected = self.expected_len,
            "accumulated reply bytes"
        );
        Ok(true)
    }

    /// Time to wait after an empty read, clamped to the remaining deadline.
    pub(crate) fn idle_duration(&self, started: Instant) -> Duration {
        let remaining = self.poll_deadline().saturating_sub(started.elapsed());
        self.poll_interval().min(remaining)
    }

    fn idle_blocking(&self, started: Instant) {
        let pause = self.idle_duration(started);
        if pause.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(pause);
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    pub(crate) fn settle_delay(&self) -> Duration {
        self.config.settle_delay
    }

    pub(crate) fn poll_deadline(&self) -> Duration {
        self.config.poll_deadline
    }

    pub(crate) fn cancelled(&mut self) -> SessionError {
        self.transition(SessionState::Cancelled);
        SessionError::Cancelled {
            received: self.reply.len(),
        }
    }

    pub(crate) fn finish(&mut self, waited: Duration) -> Result<Reply> {
        let received = self.reply.len();
        if received < self.expected_len {
            self.transition(SessionState::Timeout);
            return Err(SessionError::Timeout {
                received,
                expected: self.expected_len,
                waited,
            });
        }

        let discarded = received - self.expected_len;
        if discarded > 0 {
            warn!(
                discarded,
                expected = self.expected_len,
                "discarding reply bytes beyond expected length"
            );
            self.reply.truncate(self.expected_len);
        }

        self.transition(SessionState::Success);
        Ok(Reply {
            payload: self.reply.split().freeze(),
            discarded,
            reads: self.reads,
            waited,
        })
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state change");
        self.state = next;
    }

    fn transport_failure(&mut self, phase: Phase, source: TransportError) -> SessionError {
        self.transition(SessionState::TransportError);
        SessionError::Transport { phase, source }
    }
}

impl<T: LinkTransport + ?Sized> std::fmt::Debug for TransferSession<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferSession")
            .field("state", &self.state)
            .field("outbound", &self.outbound.len())
            .field("expected_len", &self.expected_len)
            .field("received", &self.reply.len())
            .finish()
    }
}

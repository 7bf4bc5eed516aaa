use std::time::Duration;

use pixlink_transport::READ_CHUNK_SIZE;
use serde::Serialize;

/// How the outbound buffer is pushed onto the link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// One write call with the whole buffer.
    #[default]
    Bulk,
    /// One write call per byte. Slower, but friendlier to links with tiny
    /// transmit FIFOs.
    PerByte,
}

/// Timing and I/O knobs for one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    /// Maximum time the link may refuse outbound bytes before the write fails.
    pub write_timeout: Duration,
    /// Wait after writing, before the first read (remote processing time).
    pub settle_delay: Duration,
    /// Maximum time spent accumulating reply bytes.
    pub poll_deadline: Duration,
    /// Pause after an empty read. Zero yields the thread and re-polls at once.
    pub poll_interval: Duration,
    /// Bulk or per-byte outbound writes.
    pub write_mode: WriteMode,
    /// Upper bound passed to each `read` call.
    pub read_chunk: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(10),
            poll_deadline: Duration::from_secs(20),
            poll_interval: Duration::ZERO,
            write_mode: WriteMode::Bulk,
            read_chunk: READ_CHUNK_SIZE,
        }
    }
}

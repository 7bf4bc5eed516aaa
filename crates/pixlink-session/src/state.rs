use std::fmt;

/// Lifecycle of a transfer session.
///
/// `Idle -> Writing -> Settling -> Polling -> {terminal}`. Any phase may end
/// in `TransportError` or `Cancelled`; `Writing` and `Polling` may end in
/// `Timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Writing,
    Settling,
    Polling,
    Success,
    Timeout,
    LengthMismatch,
    TransportError,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Success
                | SessionState::Timeout
                | SessionState::LengthMismatch
                | SessionState::TransportError
                | SessionState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Writing => "writing",
            SessionState::Settling => "settling",
            SessionState::Polling => "polling",
            SessionState::Success => "success",
            SessionState::Timeout => "timeout",
            SessionState::LengthMismatch => "length-mismatch",
            SessionState::TransportError => "transport-error",
            SessionState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

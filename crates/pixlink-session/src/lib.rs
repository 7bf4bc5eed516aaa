//! Deadline-bounded image exchange with a remote processing unit.
//!
//! One exchange writes a canonical pixel buffer to a [`LinkTransport`],
//! waits a fixed settle delay, then polls the link until the expected reply
//! length has arrived or the poll deadline expires. The reply is validated
//! against the declared geometry before it is turned back into an image.
//!
//! [`BatchDriver`] runs exchanges over a list of input images, one at a time,
//! stopping at the first failure.
//!
//! [`LinkTransport`]: pixlink_transport::LinkTransport

pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod exchange;
pub mod session;
pub mod state;
pub mod validator;

#[cfg(feature = "async")]
pub mod async_session;

#[cfg(test)]
mod testing;

pub use batch::{
    BatchDriver, BatchError, BatchItem, BatchReport, FsImageStore, ImageSource, ItemError,
    ItemStatus, ResultSink, OUTPUT_SUFFIX,
};
pub use cancel::CancelFlag;
pub use config::{SessionConfig, WriteMode};
pub use error::{Phase, Result, SessionError};
pub use exchange::{exchange, Exchange, ExchangeStats};
pub use session::{Reply, TransferSession};
pub use state::SessionState;
pub use validator::validate_reply;

#[cfg(feature = "async")]
pub use async_session::exchange_async;

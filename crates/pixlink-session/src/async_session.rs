//! Async exchange for hosts that must keep other work running while the
//! remote unit processes a frame.
//!
//! Semantics match [`exchange`](crate::exchange::exchange): the settle delay
//! and write backoff are `tokio` sleeps rather than thread sleeps, empty
//! reads yield to the runtime, and a [`CancellationToken`] aborts the
//! exchange in any phase.

use std::time::Instant;

use pixlink_codec::{Layout, PixelBuffer};
use pixlink_transport::LinkTransport;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::exchange::{check_outbound, complete, Exchange};
use crate::session::{Reply, TransferSession};
use crate::state::SessionState;

/// Async counterpart of [`exchange`](crate::exchange::exchange).
pub async fn exchange_async<T: LinkTransport + ?Sized>(
    link: &mut T,
    buffer: &PixelBuffer,
    layout: &Layout,
    config: &SessionConfig,
    cancel: &CancellationToken,
) -> Result<Exchange> {
    check_outbound(buffer, layout)?;

    let started = Instant::now();
    info!(
        bytes = buffer.len(),
        link = link.transport_name(),
        "starting async exchange"
    );

    let session = TransferSession::new(link, buffer, layout.frame_len(), config.clone());
    let reply = run_async(session, cancel).await.inspect_err(|err| {
        warn!(error = %err, "exchange failed");
    })?;

    complete(buffer, layout, reply, started.elapsed())
}

async fn run_async<T: LinkTransport + ?Sized>(
    mut session: TransferSession<'_, T>,
    cancel: &CancellationToken,
) -> Result<Reply> {
    session.begin_writing();
    while !session.write_complete() {
        if cancel.is_cancelled() || session.is_cancelled() {
            return Err(session.cancelled());
        }
        if !session.write_once()? {
            let pause = session.write_stalled()?;
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => return Err(session.cancelled()),
            }
        }
    }

    session.transition(SessionState::Settling);
    tokio::select! {
        _ = tokio::time::sleep(session.settle_delay()) => {}
        _ = cancel.cancelled() => return Err(session.cancelled()),
    }

    let started = session.begin_polling();
    while !session.reply_complete() {
        if cancel.is_cancelled() || session.is_cancelled() {
            return Err(session.cancelled());
        }
        if started.elapsed() >= session.poll_deadline() {
            break;
        }
        if !session.poll_once()? {
            let pause = session.idle_duration(started);
            if pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(pause).await;
            }
        }
    }

    session.finish(started.elapsed())
}

//! Raw terminal input streams.
//!
//! A [`RawStream`] is lazy: the terminal subscription is only made on the
//! first poll. Teardown (unsubscribe, reattach the line editor) happens
//! exactly once, on whichever comes first of: the stream being dropped,
//! its sub-shell being destroyed, or the subscription ending.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::stream::{FusedStream, Stream, StreamExt};

use termshell_types::error::Result;
use termshell_types::terminal::ListenerId;

use crate::subshell::SubShell;

enum RawState {
    /// Not yet polled.
    Idle,
    Active {
        rx: mpsc::UnboundedReceiver<String>,
        listener: ListenerId,
    },
    Done,
}

/// Cancellable stream of raw terminal input chunks.
///
/// Chunks arrive in the order the terminal emits them, one item per data
/// event. Items are `Err` only when terminal input could not be claimed.
pub struct RawStream {
    shell: SubShell,
    state: RawState,
}

impl RawStream {
    pub(crate) fn new(shell: SubShell) -> Self {
        Self {
            shell,
            state: RawState::Idle,
        }
    }

    /// Whether the stream currently holds the terminal subscription.
    pub fn is_active(&self) -> bool {
        matches!(self.state, RawState::Active { .. })
    }

    fn start(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded();
        let listener = self.shell.inner().claim_raw(
            self.shell.generation(),
            Box::new(move |data: &str| {
                // Receiver gone means the stream already finished.
                let _ = tx.unbounded_send(data.to_string());
            }),
        )?;
        self.state = RawState::Active { rx, listener };
        Ok(())
    }

    fn finish(&mut self) {
        if let RawState::Active { listener, .. } = std::mem::replace(&mut self.state, RawState::Done)
        {
            self.shell.inner().release_raw(listener);
        }
    }
}

impl Stream for RawStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let RawState::Idle = this.state {
            if this.shell.is_destroyed() {
                this.state = RawState::Done;
                return Poll::Ready(None);
            }
            if let Err(e) = this.start() {
                this.state = RawState::Done;
                return Poll::Ready(Some(Err(e)));
            }
        }

        let RawState::Active { rx, .. } = &mut this.state else {
            return Poll::Ready(None);
        };

        match rx.poll_next_unpin(cx) {
            Poll::Ready(Some(chunk)) => {
                if this.shell.is_destroyed() {
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(chunk)))
            },
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for RawStream {
    fn is_terminated(&self) -> bool {
        matches!(self.state, RawState::Done)
    }
}

impl Drop for RawStream {
    fn drop(&mut self) {
        self.finish();
    }
}

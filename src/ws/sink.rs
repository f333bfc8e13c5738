//! Outbound sink with deferred binding.
//!
//! A [`ChannelSink`] is handed to the caller before the socket exists. While
//! unbound it queues every operation; once the connect orchestration binds
//! it to the socket's write half, the queue is replayed in submission order
//! and the sink becomes a direct pass-through. If the connection never
//! succeeds the sink stays unbound and operations remain local no-ops.

use super::message::{self, CloseFrame, Message};
use super::WriteHalf;
use crate::base::error::ChannelError;
use bytes::Bytes;
use futures::SinkExt;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite;

/// Sink state: queue operations until a socket is attached, then forward.
enum SinkState {
    /// No live socket yet; operations wait for replay.
    Deferred(VecDeque<SinkOp>),
    /// Bound to the socket's write half.
    Bound(WriteHalf),
}

/// A queued operation record, replayed on bind in submission order.
enum SinkOp {
    Send(Message),
    Close(Option<CloseFrame>),
}

/// Outbound half of a channel.
///
/// Cheap to clone; all clones share the same destination and queue.
#[derive(Clone)]
pub struct ChannelSink {
    state: Arc<Mutex<SinkState>>,
}

impl ChannelSink {
    /// A sink with no destination yet; operations queue until [`bind`](Self::bind).
    pub(crate) fn deferred() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState::Deferred(VecDeque::new()))),
        }
    }

    /// A sink bound to a live socket from the start.
    pub(crate) fn direct(target: WriteHalf) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState::Bound(target))),
        }
    }

    /// Send a message.
    ///
    /// Before the connection resolves this queues the message and succeeds
    /// locally; afterwards it forwards to the socket and reports transport
    /// failures as [`ChannelError`].
    pub async fn send(&self, msg: Message) -> Result<(), ChannelError> {
        let mut state = self.state.lock().await;
        match &mut *state {
            SinkState::Deferred(queue) => {
                queue.push_back(SinkOp::Send(msg));
                Ok(())
            }
            SinkState::Bound(target) => forward_send(target, msg).await,
        }
    }

    /// Send a text message.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        self.send(Message::Text(text.into())).await
    }

    /// Send binary data.
    pub async fn send_binary(&self, data: impl Into<Bytes>) -> Result<(), ChannelError> {
        self.send(Message::Binary(data.into())).await
    }

    /// Close the connection with an optional code and reason.
    ///
    /// The code and reason ride in the closing handshake itself. Close
    /// completes locally in every case; transport failures are logged, not
    /// surfaced — there is no error channel for close.
    pub async fn close(&self, frame: Option<CloseFrame>) {
        let mut state = self.state.lock().await;
        match &mut *state {
            SinkState::Deferred(queue) => queue.push_back(SinkOp::Close(frame)),
            SinkState::Bound(target) => forward_close(target, frame).await,
        }
    }

    /// Attach the socket's write half and replay queued operations in
    /// submission order.
    ///
    /// # Panics
    /// Panics if the sink is already bound.
    pub(crate) async fn bind(&self, mut target: WriteHalf) {
        let mut state = self.state.lock().await;
        let queue = match &mut *state {
            SinkState::Deferred(queue) => std::mem::take(queue),
            SinkState::Bound(_) => panic!("deferred sink bound twice"),
        };
        for op in queue {
            match op {
                SinkOp::Send(msg) => {
                    if let Err(err) = forward_send(&mut target, msg).await {
                        tracing::debug!("dropping remaining queued writes: {err}");
                        break;
                    }
                }
                SinkOp::Close(frame) => forward_close(&mut target, frame).await,
            }
        }
        *state = SinkState::Bound(target);
    }

    /// Weak handle for background tasks that must not keep the sink alive.
    pub(crate) fn downgrade(&self) -> WeakSink {
        WeakSink {
            state: Arc::downgrade(&self.state),
        }
    }

    #[cfg(test)]
    pub(crate) async fn queued(&self) -> usize {
        match &*self.state.lock().await {
            SinkState::Deferred(queue) => queue.len(),
            SinkState::Bound(_) => 0,
        }
    }
}

/// Weak counterpart of [`ChannelSink`], used by the keep-alive task.
#[derive(Clone)]
pub(crate) struct WeakSink {
    state: Weak<Mutex<SinkState>>,
}

impl WeakSink {
    pub(crate) fn upgrade(&self) -> Option<ChannelSink> {
        self.state.upgrade().map(|state| ChannelSink { state })
    }
}

async fn forward_send(target: &mut WriteHalf, msg: Message) -> Result<(), ChannelError> {
    target.send(message::to_tungstenite(msg)).await.map_err(|e| {
        tracing::debug!("WebSocket send error: {:?}", e);
        ChannelError::with_cause("WebSocket send failed", e)
    })
}

async fn forward_close(target: &mut WriteHalf, frame: Option<CloseFrame>) {
    let msg = tungstenite::Message::Close(frame.map(message::to_tungstenite_close));
    if let Err(e) = target.send(msg).await {
        tracing::debug!("WebSocket close error: {:?}", e);
    }
}

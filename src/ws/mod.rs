//! WebSocket channel support.
//!
//! Provides a bidirectional channel facade over tokio-tungstenite sockets.
//! A channel is obtained synchronously, before the underlying connection
//! exists; reads, writes, and close are deferred until the connection
//! resolves, and every failure mode surfaces as one unified error through
//! the normal data path.
//!
//! # Example
//! ```ignore
//! use wschannel::ws::{Message, WsChannel};
//!
//! let channel = WsChannel::connect("wss://echo.websocket.org");
//! channel.send_text("Hello").await?;       // queued until connected
//! channel.ready().await?;                  // wait for the handshake
//! let msg = channel.recv().await;
//! ```

mod channel;
mod message;
mod ready;
mod sink;

pub use channel::{ChannelBuilder, WsChannel};
pub use message::{CloseCode, CloseFrame, Message};
pub use ready::ReadySignal;
pub use sink::ChannelSink;

use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

/// The live socket type a channel delegates to once connected.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a live socket.
pub(crate) type WriteHalf = SplitSink<WsStream, tungstenite::Message>;

/// Read half of a live socket.
pub(crate) type ReadHalf = SplitStream<WsStream>;

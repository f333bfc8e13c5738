//! # wschannel
//!
//! A WebSocket channel library for Rust.
//!
//! `wschannel` wraps tokio-tungstenite sockets in a channel facade that is
//! usable the moment it is constructed: the connection is established in
//! the background while reads, writes, and close calls are transparently
//! deferred until it resolves. Every failure mode — handshake error,
//! connect timeout, mid-stream transport error — surfaces as one unified
//! error type through the normal data path, never as an exception out of
//! the constructor.
//!
//! ## Features
//!
//! - **Synchronous construction**: `connect` returns a usable channel
//!   before the socket exists
//! - **Deferred writes**: messages sent pre-connect are queued and replayed
//!   in order once the socket is live
//! - **Unified errors**: one `ChannelError` taxonomy for connect-phase and
//!   transport-phase failures
//! - **Readiness signal**: awaitable by any number of callers, all
//!   observing the same outcome
//! - **Keep-alive**: optional ping probing at a configured interval
//! - **TLS**: `ws://` and `wss://` via tokio-tungstenite's native-tls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wschannel::ws::WsChannel;
//!
//! #[tokio::main]
//! async fn main() {
//!     let channel = WsChannel::connect("wss://echo.websocket.org");
//!     channel.send_text("hello").await.unwrap(); // queued until connected
//!     channel.ready().await.unwrap();
//!     while let Some(Ok(msg)) = channel.recv().await {
//!         println!("received: {:?}", msg);
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types and error definitions
//! - [`ws`] - The channel facade, sink, readiness signal, and frame types

pub mod base;
pub mod ws;

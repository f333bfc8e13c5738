//! Channel facade and connect orchestration.
//!
//! A [`WsChannel`] is returned synchronously while a spawned task performs
//! the handshake. The task attaches the live socket on success or resolves
//! the readiness signal with a unified error on failure; either way, no
//! error ever crosses the constructor.

use super::message::{self, CloseCode, CloseFrame, Message};
use super::ready::{ready_signal, ReadyResolver, ReadySignal};
use super::sink::{ChannelSink, WeakSink};
use super::{ReadHalf, WsStream};
use crate::base::error::ChannelError;
use bytes::Bytes;
use futures::StreamExt;
use http::header::SEC_WEBSOCKET_PROTOCOL;
use http::HeaderMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite};
use url::Url;

type HandshakeResponse = tungstenite::handshake::client::Response;

/// Bidirectional WebSocket channel.
///
/// Obtained from [`connect`](Self::connect) (or [`builder`](Self::builder))
/// before the connection exists, or from [`wrap`](Self::wrap) around a
/// socket that is already live. Reads and writes issued before the
/// connection resolves are deferred, never rejected.
pub struct WsChannel {
    ready: ReadySignal,
    sink: ChannelSink,
    reader: Arc<Mutex<Reader>>,
    meta: Arc<ChannelMeta>,
}

/// Post-connect metadata. Each field is written at most once.
#[derive(Default)]
struct ChannelMeta {
    protocol: OnceLock<Option<String>>,
    close_frame: OnceLock<CloseFrame>,
}

/// Inbound side: absent until connected, gone again after termination.
struct Reader {
    stream: Option<ReadHalf>,
    terminated: bool,
}

impl Reader {
    fn pending() -> Self {
        Self {
            stream: None,
            terminated: false,
        }
    }
}

impl WsChannel {
    /// Connect to a WebSocket server.
    ///
    /// Returns the channel immediately; the handshake runs on a spawned
    /// task, so this must be called within a tokio runtime. Connect
    /// failures surface through [`ready`](Self::ready) and as a single
    /// error on [`recv`](Self::recv) — never out of this constructor.
    ///
    /// # Example
    /// ```ignore
    /// let channel = WsChannel::connect("wss://echo.websocket.org");
    /// channel.ready().await?;
    /// ```
    pub fn connect(url: impl Into<String>) -> WsChannel {
        ChannelBuilder::new(url).connect()
    }

    /// Start building a connection with subprotocols, handshake headers, a
    /// keep-alive interval, or a connect timeout.
    pub fn builder(url: impl Into<String>) -> ChannelBuilder {
        ChannelBuilder::new(url)
    }

    /// Wrap a socket that is already connected.
    ///
    /// The readiness signal is pre-resolved and the sink forwards directly;
    /// inbound transport errors are still translated into [`ChannelError`].
    pub fn wrap(socket: WsStream) -> WsChannel {
        Self::wrap_with_protocol(socket, None)
    }

    /// Wrap an already-connected socket, recording the sub-protocol it
    /// negotiated during its handshake.
    pub fn wrap_with_protocol(socket: WsStream, protocol: Option<String>) -> WsChannel {
        let (write, read) = socket.split();
        let meta = Arc::new(ChannelMeta::default());
        let _ = meta.protocol.set(protocol);
        WsChannel {
            ready: ReadySignal::connected(),
            sink: ChannelSink::direct(write),
            reader: Arc::new(Mutex::new(Reader {
                stream: Some(read),
                terminated: false,
            })),
            meta,
        }
    }

    /// Wait until the connection attempt settles.
    pub async fn ready(&self) -> Result<(), ChannelError> {
        self.ready.wait().await
    }

    /// A cloneable handle onto the readiness signal, for callers that want
    /// to await it independently of the channel.
    pub fn ready_signal(&self) -> ReadySignal {
        self.ready.clone()
    }

    /// A cloneable handle onto the outbound sink.
    pub fn sink(&self) -> ChannelSink {
        self.sink.clone()
    }

    /// Receive the next data frame.
    ///
    /// Returns `Some(Ok(_))` for text/binary frames, `Some(Err(_))` exactly
    /// once when the connection fails (at connect time or mid-stream), and
    /// `None` once the channel has terminated. A close frame from the peer
    /// populates [`close_code`](Self::close_code) and
    /// [`close_reason`](Self::close_reason) before the stream ends.
    pub async fn recv(&self) -> Option<Result<Message, ChannelError>> {
        if let Err(err) = self.ready.wait().await {
            let mut reader = self.reader.lock().await;
            if reader.terminated {
                return None;
            }
            reader.terminated = true;
            return Some(Err(err));
        }

        let mut reader = self.reader.lock().await;
        if reader.terminated {
            return None;
        }
        loop {
            let Some(stream) = reader.stream.as_mut() else {
                return None;
            };
            match stream.next().await {
                Some(Ok(frame)) => match message::from_tungstenite(frame) {
                    msg @ (Message::Text(_) | Message::Binary(_)) => return Some(Ok(msg)),
                    Message::Close(frame) => {
                        if let Some(frame) = frame {
                            let _ = self.meta.close_frame.set(frame);
                        }
                        // The transport finishes the close handshake; keep
                        // draining until the stream ends.
                    }
                    // Pings are answered by the transport; neither they nor
                    // pongs are data.
                    Message::Ping(_) | Message::Pong(_) => {}
                },
                Some(Err(err)) => {
                    tracing::debug!("WebSocket recv error: {:?}", err);
                    reader.terminated = true;
                    reader.stream = None;
                    return Some(Err(ChannelError::from_error(err)));
                }
                None => {
                    reader.terminated = true;
                    reader.stream = None;
                    return None;
                }
            }
        }
    }

    /// Send a message, deferring it if the connection is not up yet.
    pub async fn send(&self, msg: Message) -> Result<(), ChannelError> {
        self.sink.send(msg).await
    }

    /// Send a text message.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        self.sink.send_text(text).await
    }

    /// Send binary data.
    pub async fn send_binary(&self, data: impl Into<Bytes>) -> Result<(), ChannelError> {
        self.sink.send_binary(data).await
    }

    /// Close the connection with an optional code and reason.
    pub async fn close(&self, frame: Option<CloseFrame>) {
        self.sink.close(frame).await;
    }

    /// The sub-protocol negotiated during the handshake.
    ///
    /// `None` until the connection is up, and afterwards when the server
    /// did not negotiate one.
    pub fn protocol(&self) -> Option<&str> {
        self.meta.protocol.get().and_then(|p| p.as_deref())
    }

    /// The close code received from the peer, once the closing handshake
    /// carried one.
    pub fn close_code(&self) -> Option<CloseCode> {
        self.meta.close_frame.get().map(|f| f.code)
    }

    /// The close reason received from the peer, if any.
    pub fn close_reason(&self) -> Option<&str> {
        self.meta.close_frame.get().map(|f| f.reason.as_str())
    }
}

/// WebSocket channel builder.
#[derive(Debug, Clone)]
pub struct ChannelBuilder {
    url: String,
    subprotocols: Vec<String>,
    headers: HeaderMap,
    ping_interval: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ChannelBuilder {
    /// Create a builder for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subprotocols: Vec::new(),
            headers: HeaderMap::new(),
            ping_interval: None,
            connect_timeout: None,
        }
    }

    /// Add a subprotocol to offer during the handshake.
    pub fn subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.subprotocols.push(protocol.into());
        self
    }

    /// Add a header to the handshake request.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Probe the connection with pings at this interval once connected.
    /// Without one, no keep-alive probing happens.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    /// Give up on the connect attempt after this long.
    ///
    /// Without a timeout the attempt is awaited indefinitely. When the
    /// timeout fires first, the in-flight handshake is dropped — which
    /// tears down its half-open connection — and the channel fails with a
    /// timeout-flavored [`ChannelError`].
    pub fn connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = Some(limit);
        self
    }

    /// Start the connect attempt and return the channel immediately.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(self) -> WsChannel {
        let (resolver, ready) = ready_signal();
        let sink = ChannelSink::deferred();
        let reader = Arc::new(Mutex::new(Reader::pending()));
        let meta = Arc::new(ChannelMeta::default());
        tokio::spawn(run_connect(
            self,
            resolver,
            sink.clone(),
            reader.clone(),
            meta.clone(),
        ));
        WsChannel {
            ready,
            sink,
            reader,
            meta,
        }
    }
}

/// Connect continuation: drives `Connecting` to its terminal state.
async fn run_connect(
    config: ChannelBuilder,
    resolver: ReadyResolver,
    sink: ChannelSink,
    reader: Arc<Mutex<Reader>>,
    meta: Arc<ChannelMeta>,
) {
    match establish(&config).await {
        Ok((socket, response)) => {
            let negotiated = response
                .headers()
                .get(SEC_WEBSOCKET_PROTOCOL)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let _ = meta.protocol.set(negotiated);

            let (write, read) = socket.split();
            reader.lock().await.stream = Some(read);
            // Readiness resolves before queued writes replay: callers see
            // success ahead of their first delivered frame.
            resolver.resolve();
            sink.bind(write).await;
            if let Some(interval) = config.ping_interval {
                tokio::spawn(run_keepalive(sink.downgrade(), interval));
            }
            tracing::debug!(url = %config.url, "WebSocket channel connected");
        }
        Err(err) => {
            tracing::debug!(url = %config.url, "WebSocket connect failed: {}", err);
            resolver.fail(err);
        }
    }
}

/// Perform the handshake, racing the optional connect timeout.
async fn establish(config: &ChannelBuilder) -> Result<(WsStream, HandshakeResponse), ChannelError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ChannelError::with_cause(format!("invalid WebSocket URL `{}`", config.url), e))?;
    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(ChannelError::new(format!(
            "unsupported WebSocket URL scheme `{}`",
            url.scheme()
        )));
    }

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| ChannelError::with_cause("invalid WebSocket handshake request", e))?;
    if !config.subprotocols.is_empty() {
        if let Ok(value) = http::HeaderValue::try_from(config.subprotocols.join(", ")) {
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }
    }
    for (name, value) in &config.headers {
        request.headers_mut().append(name, value.clone());
    }

    let attempt = connect_async(request);
    match config.connect_timeout {
        Some(limit) => match tokio::time::timeout(limit, attempt).await {
            Ok(result) => {
                result.map_err(|e| ChannelError::with_cause("WebSocket handshake failed", e))
            }
            Err(_) => Err(ChannelError::timeout(limit)),
        },
        None => attempt
            .await
            .map_err(|e| ChannelError::with_cause("WebSocket handshake failed", e)),
    }
}

/// Keep-alive probing at the configured interval.
///
/// Holds only a weak sink handle so it cannot outlive the channel; stops on
/// the first failed ping.
async fn run_keepalive(sink: WeakSink, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(sink) = sink.upgrade() else { break };
        if sink.send(Message::Ping(Vec::new())).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ChannelBuilder::new("ws://example.com/ws");
        assert_eq!(builder.url, "ws://example.com/ws");
        assert!(builder.subprotocols.is_empty());
        assert!(builder.headers.is_empty());
        assert!(builder.ping_interval.is_none());
        assert!(builder.connect_timeout.is_none());
    }

    #[test]
    fn test_builder_subprotocols() {
        let builder = ChannelBuilder::new("ws://example.com")
            .subprotocol("graphql-ws")
            .subprotocol("protocol2");
        assert_eq!(builder.subprotocols.len(), 2);
    }

    #[test]
    fn test_builder_headers() {
        let builder = ChannelBuilder::new("ws://example.com").header("Authorization", "Bearer token");
        assert!(builder.headers.contains_key("authorization"));
    }

    #[test]
    fn test_builder_invalid_header_ignored() {
        let builder = ChannelBuilder::new("ws://example.com").header("bad name", "value");
        assert!(builder.headers.is_empty());
    }

    #[test]
    fn test_builder_durations() {
        let builder = ChannelBuilder::new("ws://example.com")
            .ping_interval(Duration::from_secs(20))
            .connect_timeout(Duration::from_secs(5));
        assert_eq!(builder.ping_interval, Some(Duration::from_secs(20)));
        assert_eq!(builder.connect_timeout, Some(Duration::from_secs(5)));
    }
}

//! WebSocket frame types carried by a channel.

use bytes::Bytes;
use tokio_tungstenite::tungstenite;

/// A message travelling through a channel.
///
/// The inbound side of a channel only ever yields `Text` and `Binary`;
/// control frames are handled by the transport (pings are answered
/// automatically, close frames populate the channel's close metadata).
/// The outbound side accepts every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Text frame (UTF-8)
    Text(String),
    /// Binary frame
    Binary(Bytes),
    /// Ping frame
    Ping(Vec<u8>),
    /// Pong frame
    Pong(Vec<u8>),
    /// Close frame with optional code and reason
    Close(Option<CloseFrame>),
}

impl Message {
    /// Create a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text(text.into())
    }

    /// Create a binary message.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Message::Binary(data.into())
    }

    /// Check if this is a text message.
    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    /// Check if this is a binary message.
    pub fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    /// Check if this is a data frame (text or binary).
    pub fn is_data(&self) -> bool {
        self.is_text() || self.is_binary()
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as binary data.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Message::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to bytes (text as UTF-8, binary as-is).
    pub fn into_data(self) -> Vec<u8> {
        match self {
            Message::Text(s) => s.into_bytes(),
            Message::Binary(b) => b.to_vec(),
            Message::Ping(d) | Message::Pong(d) => d,
            Message::Close(_) => Vec::new(),
        }
    }
}

/// Close frame data.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseFrame {
    /// Close code (RFC 6455)
    pub code: CloseCode,
    /// Close reason (optional UTF-8 string)
    pub reason: String,
}

impl CloseFrame {
    /// Create a new close frame.
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// WebSocket close codes (RFC 6455).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure
    pub const NORMAL: Self = Self(1000);
    /// Server going down
    pub const GOING_AWAY: Self = Self(1001);
    /// Protocol error
    pub const PROTOCOL_ERROR: Self = Self(1002);
    /// Unsupported data type
    pub const UNSUPPORTED: Self = Self(1003);
    /// No status received
    pub const NO_STATUS: Self = Self(1005);
    /// Abnormal closure
    pub const ABNORMAL: Self = Self(1006);
    /// Invalid payload data
    pub const INVALID_PAYLOAD: Self = Self(1007);
    /// Policy violation
    pub const POLICY_VIOLATION: Self = Self(1008);
    /// Message too big
    pub const MESSAGE_TOO_BIG: Self = Self(1009);
    /// Extension required
    pub const EXTENSION_REQUIRED: Self = Self(1010);
    /// Internal server error
    pub const INTERNAL_ERROR: Self = Self(1011);
    /// TLS handshake failure
    pub const TLS_HANDSHAKE: Self = Self(1015);
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

/// Convert a channel message to the transport's message type.
pub(crate) fn to_tungstenite(msg: Message) -> tungstenite::Message {
    match msg {
        Message::Text(s) => tungstenite::Message::Text(s),
        Message::Binary(b) => tungstenite::Message::Binary(b.to_vec()),
        Message::Ping(d) => tungstenite::Message::Ping(d),
        Message::Pong(d) => tungstenite::Message::Pong(d),
        Message::Close(frame) => tungstenite::Message::Close(frame.map(to_tungstenite_close)),
    }
}

/// Convert a close frame to the transport's close frame type.
pub(crate) fn to_tungstenite_close(frame: CloseFrame) -> tungstenite::protocol::CloseFrame<'static> {
    tungstenite::protocol::CloseFrame {
        code: tungstenite::protocol::frame::coding::CloseCode::from(frame.code.0),
        reason: frame.reason.into(),
    }
}

/// Convert a transport message to a channel message.
pub(crate) fn from_tungstenite(msg: tungstenite::Message) -> Message {
    match msg {
        tungstenite::Message::Text(s) => Message::Text(s),
        tungstenite::Message::Binary(b) => Message::Binary(Bytes::from(b)),
        tungstenite::Message::Ping(d) => Message::Ping(d),
        tungstenite::Message::Pong(d) => Message::Pong(d),
        tungstenite::Message::Close(frame) => Message::Close(frame.map(from_tungstenite_close)),
        // Raw frames never surface outside tungstenite's own plumbing.
        tungstenite::Message::Frame(_) => Message::Binary(Bytes::new()),
    }
}

/// Convert a transport close frame to a channel close frame.
pub(crate) fn from_tungstenite_close(frame: tungstenite::protocol::CloseFrame<'_>) -> CloseFrame {
    CloseFrame {
        code: CloseCode(frame.code.into()),
        reason: frame.reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_predicates() {
        let text = Message::text("hello");
        assert!(text.is_text());
        assert!(text.is_data());
        assert_eq!(text.as_text(), Some("hello"));

        let binary = Message::binary(Bytes::from_static(b"data"));
        assert!(binary.is_binary());
        assert!(binary.is_data());
        assert_eq!(binary.as_bytes(), Some(&b"data"[..]));

        let close = Message::Close(None);
        assert!(!close.is_data());
    }

    #[test]
    fn test_close_codes() {
        assert_eq!(CloseCode::NORMAL.0, 1000);
        assert_eq!(CloseCode::ABNORMAL.0, 1006);

        let code: u16 = CloseCode::GOING_AWAY.into();
        assert_eq!(code, 1001);
        assert_eq!(CloseCode::from(1002), CloseCode::PROTOCOL_ERROR);
    }

    #[test]
    fn test_into_data() {
        assert_eq!(Message::text("test").into_data(), b"test");
        assert_eq!(Message::binary(Bytes::from_static(b"bin")).into_data(), b"bin");
        assert_eq!(Message::Close(None).into_data(), Vec::<u8>::new());
    }

    #[test]
    fn test_transport_round_trip() {
        let msg = Message::text("hello");
        let back = from_tungstenite(to_tungstenite(msg.clone()));
        assert_eq!(back, msg);

        let close = Message::Close(Some(CloseFrame::new(CloseCode::NORMAL, "bye")));
        let back = from_tungstenite(to_tungstenite(close.clone()));
        assert_eq!(back, close);
    }
}

//! Stream session.
//!
//! Owns the telemetry connection and the mode it was opened with. Raw
//! transport events go in through [`StreamSession::on_transport`]; decoded
//! [`StreamEvent`]s come out for the orchestrator to act on.
//!
//! # Lifecycle
//!
//! ```text
//!   Idle --open--> Connecting --Opened--> Open
//!    ^                 |                   |
//!    |               close               close
//!    |                 v                   v
//!    +----Closed---- Closing <-------------+
//! ```
//!
//! Losing the connection from `Connecting` or `Open` yields exactly one
//! `Closed { by_command: false }`. A close requested through
//! [`StreamSession::close`] yields `Closed { by_command: true }`. The session
//! never changes mode in place: the caller closes and reopens.

use chrono::{DateTime, Utc};
use helm_types::{Delta, Hello, PathValue, PlaybackQuery, SessionMode, Update, Vessel};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, StreamConfig};
use crate::event::TransportEvent;
use crate::ports::{Endpoint, Transport};

/// Connection state of the stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection.
    Idle,
    /// `connect` issued, waiting for the transport to open.
    Connecting,
    /// Connection open.
    Open,
    /// `disconnect` issued, waiting for the transport to close.
    Closing,
}

impl core::fmt::Display for LinkState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        })
    }
}

/// What the stream session reports upwards.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The connection opened.
    Connected {
        /// Mode the connection was opened for.
        mode: SessionMode,
    },
    /// A decoded message.
    Delta(Delta),
    /// A transport error. Non-fatal.
    Error(String),
    /// The connection is gone.
    Closed {
        /// The close was requested through [`StreamSession::close`].
        by_command: bool,
        /// The connection was a playback connection.
        playback: bool,
    },
}

/// Misuse of the stream session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// `open` was called while a connection exists.
    #[error("cannot open stream while {state}")]
    Busy {
        /// Current link state.
        state: LinkState,
    },
}

/// A frame that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not JSON.
    #[error("frame is not valid JSON: {source}")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The frame is JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,
}

/// The telemetry connection.
pub struct StreamSession {
    transport: Box<dyn Transport + Send>,
    server: ServerConfig,
    stream: StreamConfig,
    state: LinkState,
    mode: SessionMode,
    subscribed: bool,
}

impl core::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamSession")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("subscribed", &self.subscribed)
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Create an idle session over `transport`.
    pub fn new(
        transport: Box<dyn Transport + Send>,
        server: ServerConfig,
        stream: StreamConfig,
    ) -> Self {
        Self {
            transport,
            server,
            stream,
            state: LinkState::Idle,
            mode: SessionMode::Realtime,
            subscribed: false,
        }
    }

    /// Current link state.
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Mode of the current (or last) connection.
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Replace endpoint settings. Takes effect on the next `open`.
    pub fn reconfigure(&mut self, server: ServerConfig, stream: StreamConfig) {
        self.server = server;
        self.stream = stream;
    }

    /// Start connecting for `mode`. Playback connections carry `options` as
    /// query parameters.
    ///
    /// Failures of the connection itself arrive later as a `Closed` event.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Busy`] unless the session is idle.
    pub fn open(
        &mut self,
        options: Option<&PlaybackQuery>,
        mode: SessionMode,
    ) -> Result<(), StreamError> {
        if self.state != LinkState::Idle {
            return Err(StreamError::Busy { state: self.state });
        }
        let endpoint = self.endpoint(options, mode);
        info!(mode = %mode, url = endpoint.url, "opening stream");
        self.mode = mode;
        self.subscribed = false;
        self.state = LinkState::Connecting;
        self.transport.connect(&endpoint);
        Ok(())
    }

    /// Request a graceful close.
    ///
    /// On an idle session nothing needs closing, so the terminal event is
    /// returned immediately. While already closing this is a no-op.
    pub fn close(&mut self) -> Option<StreamEvent> {
        match self.state {
            LinkState::Idle => {
                debug!("close on idle stream");
                Some(StreamEvent::Closed {
                    by_command: true,
                    playback: self.mode.is_playback(),
                })
            }
            LinkState::Closing => None,
            LinkState::Connecting | LinkState::Open => {
                info!(mode = %self.mode, "closing stream");
                self.state = LinkState::Closing;
                self.transport.disconnect();
                None
            }
        }
    }

    /// Drop the connection without reporting a close.
    pub fn abort(&mut self) {
        if self.state != LinkState::Idle {
            warn!(state = %self.state, "aborting stream");
            self.transport.disconnect();
        }
        self.state = LinkState::Idle;
        self.subscribed = false;
    }

    /// Feed a transport event through the session.
    pub fn on_transport(&mut self, event: TransportEvent) -> Vec<StreamEvent> {
        match event {
            TransportEvent::Opened => self.on_opened(),
            TransportEvent::Frame(text) => self.on_frame(&text),
            TransportEvent::Error(message) => {
                if self.state == LinkState::Idle {
                    return Vec::new();
                }
                warn!(error = message, "stream error");
                vec![StreamEvent::Error(message)]
            }
            TransportEvent::Closed => self.on_closed(),
        }
    }

    fn on_opened(&mut self) -> Vec<StreamEvent> {
        if self.state != LinkState::Connecting {
            debug!(state = %self.state, "ignoring open");
            return Vec::new();
        }
        info!(mode = %self.mode, "stream open");
        self.state = LinkState::Open;
        vec![StreamEvent::Connected { mode: self.mode }]
    }

    fn on_frame(&mut self, text: &str) -> Vec<StreamEvent> {
        if self.state != LinkState::Open {
            return Vec::new();
        }
        let deltas = match decode_frame(text) {
            Ok(deltas) => deltas,
            Err(e) => {
                warn!(error = %e, "dropping undecodable frame");
                return Vec::new();
            }
        };
        let mut out = Vec::with_capacity(deltas.len());
        for delta in deltas {
            if let Delta::Hello(hello) = &delta {
                if !hello.playback {
                    self.subscribe();
                }
            }
            out.push(StreamEvent::Delta(delta));
        }
        out
    }

    fn on_closed(&mut self) -> Vec<StreamEvent> {
        if self.state == LinkState::Idle {
            return Vec::new();
        }
        let by_command = self.state == LinkState::Closing;
        info!(by_command, mode = %self.mode, "stream closed");
        self.state = LinkState::Idle;
        self.subscribed = false;
        vec![StreamEvent::Closed {
            by_command,
            playback: self.mode.is_playback(),
        }]
    }

    fn subscribe(&mut self) {
        if self.subscribed {
            return;
        }
        let frame = subscribe_frame(&self.stream.subscribe_context, self.stream.subscribe_period_ms);
        debug!(context = self.stream.subscribe_context, "subscribing");
        self.transport.send(frame);
        self.subscribed = true;
    }

    fn endpoint(&self, options: Option<&PlaybackQuery>, mode: SessionMode) -> Endpoint {
        let scheme = if self.server.ssl { "wss" } else { "ws" };
        let path = match mode {
            SessionMode::Realtime => &self.stream.realtime_path,
            SessionMode::Playback => &self.stream.playback_path,
        };
        let mut url = format!(
            "{scheme}://{}:{}{path}?subscribe=none",
            self.server.host, self.server.port
        );
        if mode.is_playback() {
            for (key, value) in options.into_iter().flat_map(PlaybackQuery::iter) {
                url.push('&');
                url.push_str(key);
                url.push('=');
                url.push_str(value);
            }
        }
        Endpoint { mode, url }
    }
}

/// The subscription request sent on every realtime handshake.
pub fn subscribe_frame(context: &str, period_ms: u64) -> String {
    serde_json::json!({
        "context": context,
        "subscribe": [{ "path": "*", "period": period_ms }],
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Frame decoding
// ---------------------------------------------------------------------------

/// Decode one text frame.
///
/// A frame with `updates` yields one [`Update`] per entry; a frame with
/// `self` or `roles` is a [`Hello`]. Anything else (subscription acks,
/// heartbeats) decodes to nothing.
///
/// # Errors
///
/// Returns [`DecodeError`] when the frame is not a JSON object.
pub fn decode_frame(text: &str) -> Result<Vec<Delta>, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(obj) = value else {
        return Err(DecodeError::NotAnObject);
    };

    if let Some(updates) = obj.get("updates").and_then(Value::as_array) {
        let context = obj
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or(Vessel::SELF_CONTEXT);
        return Ok(updates
            .iter()
            .map(|entry| Delta::Update(decode_update(context, entry)))
            .collect());
    }

    if obj.contains_key("self") || obj.contains_key("roles") {
        let start = obj.get("startTime").and_then(parse_time);
        return Ok(vec![Delta::Hello(Hello {
            self_id: obj.get("self").and_then(Value::as_str).map(ToOwned::to_owned),
            playback: obj.contains_key("startTime"),
            version: obj.get("version").and_then(Value::as_str).map(ToOwned::to_owned),
            timestamp: start.or_else(|| obj.get("timestamp").and_then(parse_time)),
        })]);
    }

    Ok(Vec::new())
}

fn decode_update(context: &str, entry: &Value) -> Update {
    let values = entry
        .get("values")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|pv| {
                    let path = pv.get("path")?.as_str()?;
                    Some(PathValue {
                        path: path.to_owned(),
                        value: pv.get("value").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Update {
        context: context.to_owned(),
        timestamp: entry.get("timestamp").and_then(parse_time),
        values,
    }
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Connect(String),
        Disconnect,
        Send(String),
    }

    #[derive(Clone, Default)]
    struct RecordingTransport(Arc<Mutex<Vec<Call>>>);

    impl Transport for RecordingTransport {
        fn connect(&mut self, endpoint: &Endpoint) {
            self.0.lock().unwrap().push(Call::Connect(endpoint.url.clone()));
        }
        fn disconnect(&mut self) {
            self.0.lock().unwrap().push(Call::Disconnect);
        }
        fn send(&mut self, frame: String) {
            self.0.lock().unwrap().push(Call::Send(frame));
        }
    }

    fn session() -> (StreamSession, Arc<Mutex<Vec<Call>>>) {
        let t = RecordingTransport::default();
        let calls = Arc::clone(&t.0);
        let s = StreamSession::new(
            Box::new(t),
            ServerConfig::default(),
            StreamConfig::default(),
        );
        (s, calls)
    }

    const HELLO: &str = r#"{"name":"signalk-server","version":"2.0.0","self":"vessels.self","roles":["master"]}"#;
    const PLAYBACK_HELLO: &str = r#"{"self":"vessels.self","startTime":"2023-01-01T00:00:00Z","playbackRate":1}"#;

    fn sends(calls: &Arc<Mutex<Vec<Call>>>) -> usize {
        calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Send(_)))
            .count()
    }

    #[test]
    fn realtime_hello_subscribes_once() {
        let (mut s, calls) = session();
        s.open(None, SessionMode::Realtime).unwrap();
        assert_eq!(
            s.on_transport(TransportEvent::Opened),
            vec![StreamEvent::Connected {
                mode: SessionMode::Realtime
            }]
        );
        let events = s.on_transport(TransportEvent::Frame(HELLO.to_owned()));
        assert!(matches!(&events[0], StreamEvent::Delta(Delta::Hello(h)) if !h.playback));
        s.on_transport(TransportEvent::Frame(HELLO.to_owned()));
        assert_eq!(sends(&calls), 1);

        let sent = calls.lock().unwrap().iter().find_map(|c| match c {
            Call::Send(f) => Some(f.clone()),
            _ => None,
        });
        let frame: Value = serde_json::from_str(&sent.unwrap()).unwrap();
        assert_eq!(frame["subscribe"][0]["path"], "*");
        assert_eq!(frame["subscribe"][0]["period"], 1000);
    }

    #[test]
    fn playback_hello_does_not_subscribe() {
        let (mut s, calls) = session();
        s.open(Some(&PlaybackQuery::new().with("startTime", "2023-01-01")), SessionMode::Playback)
            .unwrap();
        s.on_transport(TransportEvent::Opened);
        let events = s.on_transport(TransportEvent::Frame(PLAYBACK_HELLO.to_owned()));
        assert!(matches!(&events[0], StreamEvent::Delta(Delta::Hello(h)) if h.playback));
        assert_eq!(sends(&calls), 0);
    }

    #[test]
    fn reconnect_subscribes_again() {
        let (mut s, calls) = session();
        for _ in 0..2 {
            s.open(None, SessionMode::Realtime).unwrap();
            s.on_transport(TransportEvent::Opened);
            s.on_transport(TransportEvent::Frame(HELLO.to_owned()));
            s.on_transport(TransportEvent::Closed);
        }
        assert_eq!(sends(&calls), 2);
    }

    #[test]
    fn playback_endpoint_carries_query() {
        let (mut s, calls) = session();
        let q = PlaybackQuery::new()
            .with("startTime", "2023-01-01")
            .with("playbackRate", "2");
        s.open(Some(&q), SessionMode::Playback).unwrap();
        assert_eq!(
            calls.lock().unwrap()[0],
            Call::Connect(
                "ws://localhost:3000/signalk/v1/playback?subscribe=none&playbackRate=2&startTime=2023-01-01"
                    .to_owned()
            )
        );
    }

    #[test]
    fn open_while_connected_is_rejected() {
        let (mut s, _) = session();
        s.open(None, SessionMode::Realtime).unwrap();
        assert_eq!(
            s.open(None, SessionMode::Realtime),
            Err(StreamError::Busy {
                state: LinkState::Connecting
            })
        );
    }

    #[test]
    fn commanded_close_is_flagged() {
        let (mut s, _) = session();
        s.open(None, SessionMode::Playback).unwrap();
        s.on_transport(TransportEvent::Opened);
        assert_eq!(s.close(), None);
        assert_eq!(s.close(), None);
        assert_eq!(
            s.on_transport(TransportEvent::Closed),
            vec![StreamEvent::Closed {
                by_command: true,
                playback: true
            }]
        );
        assert_eq!(s.state(), LinkState::Idle);
    }

    #[test]
    fn unexpected_close_reported_once() {
        let (mut s, _) = session();
        s.open(None, SessionMode::Realtime).unwrap();
        s.on_transport(TransportEvent::Opened);
        let first = s.on_transport(TransportEvent::Closed);
        let second = s.on_transport(TransportEvent::Closed);
        assert_eq!(
            first,
            vec![StreamEvent::Closed {
                by_command: false,
                playback: false
            }]
        );
        assert!(second.is_empty());
    }

    #[test]
    fn close_on_idle_synthesises_event() {
        let (mut s, calls) = session();
        assert_eq!(
            s.close(),
            Some(StreamEvent::Closed {
                by_command: true,
                playback: false
            })
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn abort_is_silent() {
        let (mut s, calls) = session();
        s.open(None, SessionMode::Realtime).unwrap();
        s.abort();
        assert!(s.on_transport(TransportEvent::Closed).is_empty());
        assert_eq!(calls.lock().unwrap().last(), Some(&Call::Disconnect));
    }

    #[test]
    fn garbage_frame_is_dropped() {
        let (mut s, _) = session();
        s.open(None, SessionMode::Realtime).unwrap();
        s.on_transport(TransportEvent::Opened);
        assert!(s.on_transport(TransportEvent::Frame("not json".to_owned())).is_empty());
        assert!(s.on_transport(TransportEvent::Frame("[1,2]".to_owned())).is_empty());
        assert_eq!(s.state(), LinkState::Open);
    }

    #[test]
    fn decode_update_frame() {
        let frame = r#"{
            "context": "vessels.urn:mrn:imo:mmsi:123",
            "updates": [
                {"timestamp": "2023-01-01T10:00:00.000Z",
                 "values": [{"path": "navigation.speedOverGround", "value": 3.5}]},
                {"values": [{"path": "navigation.headingTrue", "value": 1.2}]}
            ]
        }"#;
        let deltas = decode_frame(frame).unwrap();
        assert_eq!(deltas.len(), 2);
        assert!(matches!(
            &deltas[0],
            Delta::Update(u) if u.context == "vessels.urn:mrn:imo:mmsi:123"
                && u.timestamp.is_some()
                && u.values[0].path == "navigation.speedOverGround"
        ));
        assert!(matches!(&deltas[1], Delta::Update(u) if u.timestamp.is_none()));
    }

    #[test]
    fn update_context_defaults_to_self() {
        let deltas = decode_frame(r#"{"updates":[{"values":[]}]}"#).unwrap();
        assert!(matches!(&deltas[0], Delta::Update(u) if u.context == "vessels.self"));
    }

    #[test]
    fn decode_rejects_non_objects() {
        assert!(matches!(decode_frame("42"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode_frame("{"), Err(DecodeError::Json { .. })));
    }
}

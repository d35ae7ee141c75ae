//! Wire protocol between peers and the relay.
//!
//! One JSON object per line in each direction. Every message is a variant of
//! a closed tagged union, so anything that does not parse into
//! [`ClientMessage`] is rejected at the transport boundary before it reaches
//! the relay.

use crate::game::{MatchState, Position, Side};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Seats per room.
pub const ROOM_CAPACITY: u8 = 2;

/// Longest line accepted from the wire, newline excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Identifies one connection to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Identifies a room, e.g. `room-k3x9q2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lobby listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room id.
    pub id: RoomId,
    /// Connected participants.
    pub occupancy: u8,
    /// Seats in total.
    pub capacity: u8,
}

/// Why the relay refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayErrorCode {
    /// No room with that id.
    UnknownRoom,
    /// The room already has two participants.
    RoomFull,
    /// The participant is already seated in a room.
    AlreadyInRoom,
    /// The participant is not a member of that room.
    NotInRoom,
    /// The submission was based on a state the room no longer holds.
    StaleState,
    /// The line could not be parsed.
    Malformed,
}

impl fmt::Display for RelayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RelayErrorCode::UnknownRoom => "room not found",
            RelayErrorCode::RoomFull => "room is full",
            RelayErrorCode::AlreadyInRoom => "already in a room",
            RelayErrorCode::NotInRoom => "not in that room",
            RelayErrorCode::StaleState => "state is stale",
            RelayErrorCode::Malformed => "malformed message",
        };
        f.write_str(text)
    }
}

/// Peer to relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room and take its first seat.
    CreateRoom,
    /// Take the second seat of an existing room.
    JoinRoom {
        /// Room to join.
        room_id: RoomId,
    },
    /// Give up a seat.
    LeaveRoom {
        /// Room to leave.
        room_id: RoomId,
    },
    /// Replace the room state outside a move (box spawn, disruption, rematch,
    /// trapped concession).
    UpdateGameState {
        /// Target room.
        room_id: RoomId,
        /// The complete new state.
        state: MatchState,
        /// Digest of the state this one was derived from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prior_digest: Option<u32>,
    },
    /// Replace the room state after a move.
    GameMove {
        /// Target room.
        room_id: RoomId,
        /// Square the mover left.
        from: Position,
        /// Square the mover reached.
        to: Position,
        /// Mover.
        side: Side,
        /// The complete new state.
        state: MatchState,
        /// Digest of the state this one was derived from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prior_digest: Option<u32>,
    },
}

/// Relay to peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection.
    Welcome {
        /// The id the relay knows this connection by.
        participant: ParticipantId,
    },
    /// Reply to [`ClientMessage::CreateRoom`].
    RoomCreated {
        /// The new room.
        room_id: RoomId,
    },
    /// Reply to [`ClientMessage::JoinRoom`].
    JoinResult {
        /// Whether the seat was taken.
        accepted: bool,
        /// The joined room, when accepted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        /// Why not, when refused.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<RelayErrorCode>,
    },
    /// Reply to [`ClientMessage::LeaveRoom`].
    LeftRoom {
        /// The room left.
        room_id: RoomId,
    },
    /// Current lobby, broadcast to every connection.
    RoomList {
        /// Open rooms by id.
        rooms: Vec<RoomSummary>,
    },
    /// Someone took a seat in the recipient's room.
    PlayerJoined {
        /// Who.
        participant: ParticipantId,
    },
    /// Someone left the recipient's room.
    PlayerLeft {
        /// Who.
        participant: ParticipantId,
    },
    /// The room filled and a fresh match began. Sent to each member with the
    /// side it plays, which follows seating order in the room.
    MatchStarted {
        /// Room the match is in.
        room_id: RoomId,
        /// The side this recipient plays.
        side: Side,
        /// The opening state.
        state: MatchState,
    },
    /// The room's state, to be swapped in wholesale.
    GameStateUpdate {
        /// Room the state belongs to.
        room_id: RoomId,
        /// The complete state.
        state: MatchState,
    },
    /// A request was refused.
    Error {
        /// Machine-readable reason.
        code: RelayErrorCode,
        /// Human-readable detail.
        message: String,
    },
}

/// Problems encoding or decoding a line.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not a valid message.
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),
    /// The line exceeds [`MAX_LINE_LEN`].
    #[error("line of {len} bytes exceeds limit of {max}")]
    TooLong {
        /// Bytes seen before giving up.
        len: usize,
        /// Limit.
        max: usize,
    },
    /// The line is not UTF-8.
    #[error("line is not valid UTF-8")]
    NotUtf8,
    /// The stream failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Newline-framed reader that never buffers more than [`MAX_LINE_LEN`] bytes
/// of one line. After [`ProtocolError::TooLong`] the stream is mid-line and
/// should be dropped.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap a byte stream.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails, the line runs past
    /// [`MAX_LINE_LEN`] or it is not UTF-8.
    pub async fn next_line(&mut self) -> Result<Option<String>, ProtocolError> {
        self.buf.clear();
        // One byte past the limit tells an overlong line from a full one.
        let budget = u64::try_from(MAX_LINE_LEN + 1).unwrap_or(u64::MAX);
        let read = (&mut self.inner)
            .take(budget)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        } else if read > MAX_LINE_LEN {
            return Err(ProtocolError::TooLong {
                len: read,
                max: MAX_LINE_LEN,
            });
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let line = std::str::from_utf8(&self.buf).map_err(|_| ProtocolError::NotUtf8)?;
        Ok(Some(line.to_string()))
    }
}

/// Encode one message as a newline-terminated JSON line.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one line (trailing newline optional).
///
/// # Errors
///
/// Returns an error if the line is too long or not a valid message.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() > MAX_LINE_LEN {
        return Err(ProtocolError::TooLong {
            len: line.len(),
            max: MAX_LINE_LEN,
        });
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_wire_shape() {
        let line = encode_line(&ClientMessage::JoinRoom {
            room_id: "room-abc".into(),
        })
        .unwrap();
        assert_eq!(line, "{\"type\":\"joinRoom\",\"roomId\":\"room-abc\"}\n");
        assert_eq!(
            encode_line(&ClientMessage::CreateRoom).unwrap(),
            "{\"type\":\"createRoom\"}\n"
        );
    }

    #[test]
    fn test_game_move_parses() {
        let state = MatchState::free_play();
        let json = format!(
            r#"{{"type":"gameMove","roomId":"room-1","from":{{"x":0,"y":0}},"to":{{"x":1,"y":2}},"side":"A","state":{}}}"#,
            serde_json::to_string(&state).unwrap()
        );
        let msg: ClientMessage = decode_line(&json).unwrap();
        let ClientMessage::GameMove {
            to, prior_digest, ..
        } = msg
        else {
            panic!("expected gameMove");
        };
        assert_eq!(to, Position::new(1, 2));
        assert_eq!(prior_digest, None);
    }

    #[test]
    fn test_rejects_unknown_and_off_board() {
        assert!(decode_line::<ClientMessage>(r#"{"type":"chatMessage","text":"hi"}"#).is_err());
        let bad = r#"{"type":"gameMove","roomId":"r","from":{"x":0,"y":0},"to":{"x":9,"y":2},"side":"A","state":{}}"#;
        assert!(decode_line::<ClientMessage>(bad).is_err());
    }

    #[test]
    fn test_rejects_oversized_line() {
        let long = "x".repeat(MAX_LINE_LEN + 1);
        assert!(matches!(
            decode_line::<ClientMessage>(&long),
            Err(ProtocolError::TooLong { .. })
        ));
    }

    #[test]
    fn test_join_result_omits_empty_fields() {
        let line = encode_line(&ServerMessage::JoinResult {
            accepted: false,
            room_id: None,
            error: Some(RelayErrorCode::RoomFull),
        })
        .unwrap();
        assert_eq!(
            line,
            "{\"type\":\"joinResult\",\"accepted\":false,\"error\":\"ROOM_FULL\"}\n"
        );
    }

    #[tokio::test]
    async fn test_line_reader_frames_lines() {
        let data: &[u8] = b"{\"type\":\"createRoom\"}\r\n\nlast";
        let mut reader = LineReader::new(data);
        let first = reader.next_line().await.unwrap().unwrap();
        assert!(matches!(
            decode_line::<ClientMessage>(&first),
            Ok(ClientMessage::CreateRoom)
        ));
        assert_eq!(reader.next_line().await.unwrap(), Some(String::new()));
        assert_eq!(reader.next_line().await.unwrap(), Some("last".to_string()));
        assert_eq!(reader.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_reader_stops_at_limit() {
        let exact = "x".repeat(MAX_LINE_LEN) + "\n";
        let mut reader = LineReader::new(exact.as_bytes());
        assert_eq!(reader.next_line().await.unwrap().unwrap().len(), MAX_LINE_LEN);

        // Never reads the whole line: the error comes after one byte too many.
        let endless = "x".repeat(MAX_LINE_LEN * 4) + "\n";
        let mut reader = LineReader::new(endless.as_bytes());
        assert!(matches!(
            reader.next_line().await,
            Err(ProtocolError::TooLong { len, .. }) if len == MAX_LINE_LEN + 1
        ));

        let mut reader = LineReader::new(&b"\xff\xfe\n"[..]);
        assert!(matches!(reader.next_line().await, Err(ProtocolError::NotUtf8)));
    }
}

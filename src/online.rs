//! Networked two-player matches through a relay.
//!
//! The relay stores and rebroadcasts whole [`MatchState`](crate::game::MatchState)
//! values without running any game logic; each [`Peer`] validates and applies
//! its own moves. Layers, bottom up:
//!
//! - [`protocol`]: message types and the newline-delimited JSON codec
//! - [`relay`]: room bookkeeping, no I/O
//! - [`server`]: tokio TCP front end for the relay
//! - [`peer`]: client state machine, no I/O
//! - [`connection`]: tokio TCP client

pub mod connection;
pub mod peer;
pub mod protocol;
pub mod relay;
pub mod server;

pub use connection::{Connection, ConnectionError};
pub use peer::{Peer, PeerError};
pub use protocol::{
    ClientMessage, LineReader, MAX_LINE_LEN, ParticipantId, ProtocolError, ROOM_CAPACITY,
    RelayErrorCode, RoomId, RoomSummary, ServerMessage, decode_line, encode_line,
};
pub use relay::{Outbound, Relay, RelayPolicy};
pub use server::{RelayServer, ServerError};

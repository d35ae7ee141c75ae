//! Relay state machine.
//!
//! Holds every room and decides who hears what, but never looks inside a
//! match: states are stored and rebroadcast verbatim, last write wins. The
//! only state the relay ever builds itself is the initial one sent when a
//! room fills up.
//!
//! The machine is transport-free. Each call returns the [`Outbound`] messages
//! to deliver; the server in [`super::server`] does the socket work.

use crate::game::{LevelConfig, MatchState, Side, reset_match};
use crate::online::protocol::{
    ClientMessage, ParticipantId, ROOM_CAPACITY, RelayErrorCode, RoomId, RoomSummary,
    ServerMessage,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ROOM_ID_LEN: usize = 6;

/// Relay behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayPolicy {
    /// Refuse state submissions whose `prior_digest` does not match the
    /// room's stored state. Off by default: plain last-write-wins.
    pub reject_stale: bool,
}

/// A message bound for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Recipient.
    pub to: ParticipantId,
    /// Payload.
    pub message: ServerMessage,
}

#[derive(Debug, Clone)]
struct Room {
    members: Vec<ParticipantId>,
    state: Option<MatchState>,
}

/// All relay state.
#[derive(Debug)]
pub struct Relay {
    policy: RelayPolicy,
    rooms: BTreeMap<RoomId, Room>,
    seats: BTreeMap<ParticipantId, Option<RoomId>>,
    next_participant: u64,
    rng: StdRng,
}

impl Relay {
    /// Empty relay. `seed` drives room id generation.
    #[must_use]
    pub fn new(policy: RelayPolicy, seed: u64) -> Self {
        Self {
            policy,
            rooms: BTreeMap::new(),
            seats: BTreeMap::new(),
            next_participant: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Connected participants.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.seats.len()
    }

    /// Current lobby listing.
    #[must_use]
    pub fn room_list(&self) -> Vec<RoomSummary> {
        self.rooms
            .iter()
            .map(|(id, room)| RoomSummary {
                id: id.clone(),
                occupancy: u8::try_from(room.members.len()).unwrap_or(u8::MAX),
                capacity: ROOM_CAPACITY,
            })
            .collect()
    }

    /// Stored state of a room.
    #[must_use]
    pub fn room_state(&self, room_id: &RoomId) -> Option<&MatchState> {
        self.rooms.get(room_id).and_then(|r| r.state.as_ref())
    }

    /// Register a new connection.
    pub fn connect(&mut self) -> (ParticipantId, Vec<Outbound>) {
        let id = ParticipantId(self.next_participant);
        self.next_participant += 1;
        self.seats.insert(id, None);
        info!(participant = %id, connected = self.seats.len(), "participant connected");
        let out = vec![
            Outbound {
                to: id,
                message: ServerMessage::Welcome { participant: id },
            },
            Outbound {
                to: id,
                message: ServerMessage::RoomList {
                    rooms: self.room_list(),
                },
            },
        ];
        (id, out)
    }

    /// Drop a connection, vacating its seat.
    pub fn disconnect(&mut self, id: ParticipantId) -> Vec<Outbound> {
        let Some(seat) = self.seats.remove(&id) else {
            return Vec::new();
        };
        info!(participant = %id, connected = self.seats.len(), "participant disconnected");
        let mut out = Vec::new();
        if let Some(room_id) = seat {
            self.vacate(id, &room_id, &mut out);
            self.broadcast_room_list(&mut out);
        }
        out
    }

    /// Process one message from `from`.
    pub fn handle(&mut self, from: ParticipantId, message: ClientMessage) -> Vec<Outbound> {
        let mut out = Vec::new();
        if !self.seats.contains_key(&from) {
            warn!(participant = %from, "message from unknown participant");
            return out;
        }
        match message {
            ClientMessage::CreateRoom => self.create_room(from, &mut out),
            ClientMessage::JoinRoom { room_id } => self.join_room(from, room_id, &mut out),
            ClientMessage::LeaveRoom { room_id } => self.leave_room(from, &room_id, &mut out),
            ClientMessage::UpdateGameState {
                room_id,
                state,
                prior_digest,
            }
            | ClientMessage::GameMove {
                room_id,
                state,
                prior_digest,
                ..
            } => self.store_state(from, room_id, state, prior_digest, &mut out),
        }
        out
    }

    /// Reply to a line that did not parse.
    #[must_use]
    pub fn malformed(&self, from: ParticipantId, detail: &str) -> Vec<Outbound> {
        warn!(participant = %from, detail, "malformed message");
        vec![error(from, RelayErrorCode::Malformed, detail)]
    }

    fn create_room(&mut self, from: ParticipantId, out: &mut Vec<Outbound>) {
        if let Some(Some(current)) = self.seats.get(&from) {
            out.push(error(
                from,
                RelayErrorCode::AlreadyInRoom,
                &format!("already in {current}"),
            ));
            return;
        }
        let room_id = self.fresh_room_id();
        self.rooms.insert(
            room_id.clone(),
            Room {
                members: vec![from],
                state: None,
            },
        );
        self.seats.insert(from, Some(room_id.clone()));
        info!(participant = %from, room = %room_id, "room created");
        out.push(Outbound {
            to: from,
            message: ServerMessage::RoomCreated { room_id },
        });
        self.broadcast_room_list(out);
    }

    fn join_room(&mut self, from: ParticipantId, room_id: RoomId, out: &mut Vec<Outbound>) {
        let refusal = if matches!(self.seats.get(&from), Some(Some(_))) {
            Some(RelayErrorCode::AlreadyInRoom)
        } else {
            match self.rooms.get(&room_id) {
                None => Some(RelayErrorCode::UnknownRoom),
                Some(room) if room.members.len() >= usize::from(ROOM_CAPACITY) => {
                    Some(RelayErrorCode::RoomFull)
                }
                Some(_) => None,
            }
        };
        if let Some(code) = refusal {
            debug!(participant = %from, room = %room_id, ?code, "join refused");
            out.push(Outbound {
                to: from,
                message: ServerMessage::JoinResult {
                    accepted: false,
                    room_id: None,
                    error: Some(code),
                },
            });
            return;
        }

        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        room.members.push(from);
        let full = room.members.len() == usize::from(ROOM_CAPACITY);
        if full {
            room.state = Some(reset_match(&LevelConfig::free_play()));
        }
        let members = room.members.clone();
        let state = room.state.clone();
        self.seats.insert(from, Some(room_id.clone()));
        info!(participant = %from, room = %room_id, "room joined");

        out.push(Outbound {
            to: from,
            message: ServerMessage::JoinResult {
                accepted: true,
                room_id: Some(room_id.clone()),
                error: None,
            },
        });
        for &member in &members {
            out.push(Outbound {
                to: member,
                message: ServerMessage::PlayerJoined { participant: from },
            });
        }
        self.broadcast_room_list(out);
        if let Some(state) = state {
            info!(room = %room_id, "room full, match started");
            // Seating order decides sides: the longest-seated member plays A.
            for (seat, &member) in members.iter().enumerate() {
                let side = if seat == 0 { Side::A } else { Side::B };
                out.push(Outbound {
                    to: member,
                    message: ServerMessage::MatchStarted {
                        room_id: room_id.clone(),
                        side,
                        state: state.clone(),
                    },
                });
            }
        }
    }

    fn leave_room(&mut self, from: ParticipantId, room_id: &RoomId, out: &mut Vec<Outbound>) {
        if self.seats.get(&from) != Some(&Some(room_id.clone())) {
            out.push(error(from, RelayErrorCode::NotInRoom, &format!("not in {room_id}")));
            return;
        }
        self.seats.insert(from, None);
        self.vacate(from, room_id, out);
        out.push(Outbound {
            to: from,
            message: ServerMessage::LeftRoom {
                room_id: room_id.clone(),
            },
        });
        self.broadcast_room_list(out);
    }

    /// Remove `id` from the room; delete the room or tell whoever is left.
    fn vacate(&mut self, id: ParticipantId, room_id: &RoomId, out: &mut Vec<Outbound>) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.members.retain(|m| *m != id);
        if room.members.is_empty() {
            self.rooms.remove(room_id);
            info!(room = %room_id, "room deleted");
        } else {
            for &member in &room.members {
                out.push(Outbound {
                    to: member,
                    message: ServerMessage::PlayerLeft { participant: id },
                });
            }
        }
    }

    fn store_state(
        &mut self,
        from: ParticipantId,
        room_id: RoomId,
        state: MatchState,
        prior_digest: Option<u32>,
        out: &mut Vec<Outbound>,
    ) {
        let reject_stale = self.policy.reject_stale;
        let Some(room) = self.rooms.get_mut(&room_id) else {
            out.push(error(from, RelayErrorCode::UnknownRoom, &format!("no room {room_id}")));
            return;
        };
        if !room.members.contains(&from) {
            out.push(error(from, RelayErrorCode::NotInRoom, &format!("not in {room_id}")));
            return;
        }
        if reject_stale {
            let current = room.state.as_ref().map(MatchState::digest);
            if prior_digest.is_none() || prior_digest != current {
                warn!(participant = %from, room = %room_id, ?prior_digest, ?current, "stale submission");
                out.push(error(
                    from,
                    RelayErrorCode::StaleState,
                    "submission is not based on the room's current state",
                ));
                return;
            }
        }

        debug!(participant = %from, room = %room_id, turn = state.turn, "state relayed");
        room.state = Some(state.clone());
        for &member in &room.members {
            out.push(Outbound {
                to: member,
                message: ServerMessage::GameStateUpdate {
                    room_id: room_id.clone(),
                    state: state.clone(),
                },
            });
        }
    }

    fn broadcast_room_list(&self, out: &mut Vec<Outbound>) {
        let rooms = self.room_list();
        for &id in self.seats.keys() {
            out.push(Outbound {
                to: id,
                message: ServerMessage::RoomList {
                    rooms: rooms.clone(),
                },
            });
        }
    }

    fn fresh_room_id(&mut self) -> RoomId {
        loop {
            let suffix: String = (0..ROOM_ID_LEN)
                .map(|_| char::from(ROOM_ID_ALPHABET[self.rng.random_range(0..ROOM_ID_ALPHABET.len())]))
                .collect();
            let id = RoomId(format!("room-{suffix}"));
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

fn error(to: ParticipantId, code: RelayErrorCode, message: &str) -> Outbound {
    Outbound {
        to,
        message: ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    }
}

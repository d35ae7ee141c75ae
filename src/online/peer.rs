//! Client side of networked play.
//!
//! A [`Peer`] mirrors the room it sits in and runs its own engine. Moves are
//! applied locally first and the complete resulting state is sent to the
//! relay, which echoes it back to both seats. Every state received from the
//! relay replaces the local one wholesale.
//!
//! Sides are handed out by the relay when a match starts, in seating order.
//! Side A acts as host: it is the only peer that attempts mystery-box spawns,
//! at most once per turn.

use crate::error::{DisruptionError, MoveError};
use crate::game::{
    LevelConfig, MatchState, ModifierPolicy, Position, Rules, Side, apply_move,
    check_invariants, concede_if_trapped, release_disruption, reset_match, try_spawn_box,
};
use crate::online::protocol::{
    ClientMessage, ParticipantId, RelayErrorCode, RoomId, RoomSummary, ServerMessage,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// Why the peer refused to send something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// Already seated in a room.
    #[error("already in a room")]
    AlreadyInRoom,
    /// Not seated in a room.
    #[error("not in a room")]
    NotInRoom,
    /// The room has no match yet.
    #[error("waiting for an opponent")]
    NoMatch,
    /// The local side is not the side to move.
    #[error("it is {to_move}'s turn")]
    NotYourTurn {
        /// Side to move in the local state.
        to_move: Side,
    },
    /// Only side A holds the disruption charge.
    #[error("only side A can release a disruption")]
    NotChargeHolder,
    /// A rematch was requested while the match is still running.
    #[error("match still in progress")]
    MatchInProgress,
    /// The engine declined the move.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The engine declined the disruption.
    #[error(transparent)]
    Disruption(#[from] DisruptionError),
}

/// One participant's view of networked play.
#[derive(Debug, Clone)]
pub struct Peer {
    participant: Option<ParticipantId>,
    room: Option<RoomId>,
    side: Option<Side>,
    state: Option<MatchState>,
    rules: Rules,
    rooms: Vec<RoomSummary>,
    opponent_present: bool,
    last_error: Option<RelayErrorCode>,
    last_spawn_turn: Option<u32>,
    rng: StdRng,
}

impl Peer {
    /// Fresh peer, not yet in a room. Online matches are played on the
    /// free-play board with `modifiers`.
    #[must_use]
    pub fn new(modifiers: ModifierPolicy, seed: u64) -> Self {
        Self {
            participant: None,
            room: None,
            side: None,
            state: None,
            rules: Rules::new(&LevelConfig::free_play(), modifiers),
            rooms: Vec::new(),
            opponent_present: false,
            last_error: None,
            last_spawn_turn: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Id assigned by the relay.
    #[must_use]
    pub fn participant(&self) -> Option<ParticipantId> {
        self.participant
    }

    /// Room this peer sits in.
    #[must_use]
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Side this peer plays.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// Latest known state.
    #[must_use]
    pub fn state(&self) -> Option<&MatchState> {
        self.state.as_ref()
    }

    /// Rules the local engine applies.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Latest lobby listing.
    #[must_use]
    pub fn rooms(&self) -> &[RoomSummary] {
        &self.rooms
    }

    /// Whether the other seat is taken.
    #[must_use]
    pub fn opponent_present(&self) -> bool {
        self.opponent_present
    }

    /// Last refusal reported by the relay.
    #[must_use]
    pub fn last_error(&self) -> Option<RelayErrorCode> {
        self.last_error
    }

    /// Whether the local side is to move in a running match.
    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        match (&self.state, self.side) {
            (Some(state), Some(side)) => !state.is_over() && state.to_move == side,
            _ => false,
        }
    }

    /// Ask for a new room.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::AlreadyInRoom`] if seated.
    pub fn create_room(&self) -> Result<ClientMessage, PeerError> {
        if self.room.is_some() {
            return Err(PeerError::AlreadyInRoom);
        }
        Ok(ClientMessage::CreateRoom)
    }

    /// Ask for the second seat of `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::AlreadyInRoom`] if seated.
    pub fn join_room(&self, room_id: RoomId) -> Result<ClientMessage, PeerError> {
        if self.room.is_some() {
            return Err(PeerError::AlreadyInRoom);
        }
        Ok(ClientMessage::JoinRoom { room_id })
    }

    /// Give up the seat. Local room state is dropped right away.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::NotInRoom`] if not seated.
    pub fn leave_room(&mut self) -> Result<ClientMessage, PeerError> {
        let room_id = self.room.clone().ok_or(PeerError::NotInRoom)?;
        self.clear_room();
        Ok(ClientMessage::LeaveRoom { room_id })
    }

    /// Move the local token to `target`.
    ///
    /// The move is refused before anything is sent unless the local side is
    /// to move and the engine accepts it. On success the local state already
    /// holds the result; the relay's echo will replace it with the same value.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no running match, it is not this peer's
    /// turn or the move is illegal.
    pub fn submit_move(&mut self, target: Position) -> Result<ClientMessage, PeerError> {
        let (room_id, side, prior) = self.seat()?;
        if prior.to_move != side && !prior.is_over() {
            return Err(PeerError::NotYourTurn {
                to_move: prior.to_move,
            });
        }
        let from = prior.position(side);
        let transition = apply_move(&prior, &self.rules, side, target, &mut self.rng)?;
        let message = ClientMessage::GameMove {
            room_id,
            from,
            to: target,
            side,
            state: transition.state.clone(),
            prior_digest: Some(prior.digest()),
        };
        debug!(%side, %from, to = %target, "move submitted");
        self.state = Some(transition.state);
        Ok(message)
    }

    /// Release side A's disruption charge.
    ///
    /// # Errors
    ///
    /// Returns an error if this peer is not side A or the engine refuses.
    pub fn disrupt(&mut self) -> Result<ClientMessage, PeerError> {
        let (room_id, side, prior) = self.seat()?;
        if side != Side::A {
            return Err(PeerError::NotChargeHolder);
        }
        let transition = release_disruption(&prior, &self.rules, &mut self.rng)?;
        let message = update(room_id, &prior, transition.state.clone());
        self.state = Some(transition.state);
        Ok(message)
    }

    /// Push a fresh initial state once the match is over.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no finished match.
    pub fn play_again(&mut self) -> Result<ClientMessage, PeerError> {
        let (room_id, _, prior) = self.seat()?;
        if !prior.is_over() {
            return Err(PeerError::MatchInProgress);
        }
        let next = reset_match(&LevelConfig::free_play());
        let message = update(room_id, &prior, next.clone());
        self.state = Some(next);
        Ok(message)
    }

    /// Apply one message from the relay and return anything to send back.
    pub fn handle(&mut self, message: ServerMessage) -> Vec<ClientMessage> {
        match message {
            ServerMessage::Welcome { participant } => {
                self.participant = Some(participant);
            }
            ServerMessage::RoomCreated { room_id } => {
                info!(room = %room_id, "room created");
                self.seat_in(room_id);
            }
            ServerMessage::JoinResult {
                accepted: true,
                room_id: Some(room_id),
                ..
            } => {
                info!(room = %room_id, "joined");
                self.seat_in(room_id);
                self.opponent_present = true;
            }
            ServerMessage::JoinResult { error, .. } => {
                warn!(?error, "join refused");
                self.last_error = error;
            }
            ServerMessage::LeftRoom { room_id } => {
                if self.room.as_ref() == Some(&room_id) {
                    self.clear_room();
                }
            }
            ServerMessage::RoomList { rooms } => self.rooms = rooms,
            ServerMessage::PlayerJoined { participant } => {
                if Some(participant) != self.participant {
                    self.opponent_present = true;
                }
            }
            ServerMessage::PlayerLeft { participant } => {
                info!(%participant, "opponent left");
                self.opponent_present = false;
            }
            ServerMessage::MatchStarted {
                room_id,
                side,
                state,
            } => {
                if self.room.as_ref() != Some(&room_id) {
                    warn!(room = %room_id, "match start for a room we are not in");
                    return Vec::new();
                }
                info!(room = %room_id, %side, "match started");
                self.side = Some(side);
                self.opponent_present = true;
                self.last_spawn_turn = None;
                return self.receive_state(room_id, state);
            }
            ServerMessage::GameStateUpdate { room_id, state } => {
                return self.receive_state(room_id, state);
            }
            ServerMessage::Error { code, message } => {
                warn!(%code, message, "relay refused request");
                self.last_error = Some(code);
            }
        }
        Vec::new()
    }

    fn receive_state(&mut self, room_id: RoomId, state: MatchState) -> Vec<ClientMessage> {
        if self.room.as_ref() != Some(&room_id) {
            warn!(room = %room_id, "state for a room we are not in");
            return Vec::new();
        }
        for violation in check_invariants(&state, &self.rules) {
            warn!(%violation, "received state violates an invariant");
        }
        // A rematch restarts the turn counter.
        if self.last_spawn_turn.is_some_and(|turn| state.turn < turn) {
            self.last_spawn_turn = None;
        }
        self.state = Some(state);
        let (Some(side), Some(state)) = (self.side, self.state.as_ref()) else {
            return Vec::new();
        };

        // Safety net: a side that finds itself trapped ends the match even if
        // the opponent's engine missed it.
        if let Some(conceded) = concede_if_trapped(state, side) {
            info!(%side, "trapped on our turn, conceding");
            let message = update(room_id, state, conceded.clone());
            self.state = Some(conceded);
            return vec![message];
        }

        if side == Side::A && !state.is_over() && self.last_spawn_turn != Some(state.turn) {
            self.last_spawn_turn = Some(state.turn);
            if let Some(spawn) = try_spawn_box(state, &self.rules, &mut self.rng) {
                debug!(turn = state.turn, "mystery box spawned");
                let message = update(room_id, state, spawn.state.clone());
                self.state = Some(spawn.state);
                return vec![message];
            }
        }
        Vec::new()
    }

    fn seat(&self) -> Result<(RoomId, Side, MatchState), PeerError> {
        let room_id = self.room.clone().ok_or(PeerError::NotInRoom)?;
        let (Some(side), Some(state)) = (self.side, self.state.clone()) else {
            return Err(PeerError::NoMatch);
        };
        Ok((room_id, side, state))
    }

    fn seat_in(&mut self, room_id: RoomId) {
        self.room = Some(room_id);
        self.side = None;
        self.state = None;
        self.last_error = None;
        self.last_spawn_turn = None;
        self.opponent_present = false;
    }

    fn clear_room(&mut self) {
        self.room = None;
        self.side = None;
        self.state = None;
        self.opponent_present = false;
        self.last_spawn_turn = None;
    }
}

fn update(room_id: RoomId, prior: &MatchState, state: MatchState) -> ClientMessage {
    ClientMessage::UpdateGameState {
        room_id,
        state,
        prior_digest: Some(prior.digest()),
    }
}

//! Online command implementation: play through a relay.

use super::{CliError, MatchArgs, parse_square, seed_or_clock};
use knight_chase::online::{ClientMessage, Connection, Peer, RoomId, ServerMessage};
use knight_chase::replay::{RenderOptions, render_ascii};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  create     open a room (you play A)
  join ID    join a room (you play B)
  rooms      list open rooms
  x y        move to square (x, y)
  d          release the disruption charge (side A)
  again      start a new match once this one is over
  leave      leave the room
  q          quit";

/// How to enter the lobby.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    /// Wait for commands.
    Lobby,
    /// Open a room straight away.
    Create,
    /// Join this room straight away.
    Join(String),
}

/// Execute the online command.
///
/// # Errors
///
/// Returns an error if the relay cannot be reached or the connection fails.
pub(crate) fn execute(
    server: &str,
    entry: Entry,
    setup: &MatchArgs,
    seed: Option<u64>,
    no_color: bool,
) -> Result<(), CliError> {
    let modifiers = setup.modifiers();
    let options = RenderOptions {
        color: !no_color,
        hide_blocked: modifiers.fading_blocks,
        show_moves: true,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut conn = Connection::connect(server).await?;
        let mut peer = Peer::new(modifiers, seed_or_clock(seed));
        println!("Connected to {server}");
        println!("{HELP}");

        let opening = match entry {
            Entry::Lobby => None,
            Entry::Create => Some(peer.create_room()),
            Entry::Join(id) => Some(peer.join_room(RoomId(id))),
        };
        if let Some(Ok(message)) = opening {
            conn.send(&message).await?;
        }

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                incoming = conn.recv() => {
                    let Some(message) = incoming? else {
                        println!("Relay closed the connection");
                        break;
                    };
                    let show_board = matches!(
                        message,
                        ServerMessage::GameStateUpdate { .. } | ServerMessage::MatchStarted { .. }
                    );
                    announce(&peer, &message);
                    for reply in peer.handle(message) {
                        conn.send(&reply).await?;
                    }
                    if show_board {
                        print_board(&peer, options);
                    }
                }
                line = stdin.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match command(&mut peer, line.trim(), options) {
                        Step::Send(message) => conn.send(&message).await?,
                        Step::Quit => break,
                        Step::Nothing => {}
                    }
                }
            }
        }
        Ok::<(), CliError>(())
    })
}

enum Step {
    Send(ClientMessage),
    Quit,
    Nothing,
}

fn command(peer: &mut Peer, text: &str, options: RenderOptions) -> Step {
    let request = match text {
        "" => return Step::Nothing,
        "q" | "quit" => return Step::Quit,
        "h" | "help" => {
            println!("{HELP}");
            return Step::Nothing;
        }
        "rooms" => {
            print_rooms(peer);
            return Step::Nothing;
        }
        "create" => peer.create_room(),
        "leave" => peer.leave_room(),
        "d" | "disrupt" => peer.disrupt(),
        "again" => peer.play_again(),
        _ => {
            if let Some(id) = text.strip_prefix("join ") {
                peer.join_room(RoomId(id.trim().to_string()))
            } else if let Some(target) = parse_square(text) {
                peer.submit_move(target)
            } else {
                println!("Unknown command `{text}` (h for help)");
                return Step::Nothing;
            }
        }
    };
    match request {
        Ok(message) => {
            if matches!(
                message,
                ClientMessage::GameMove { .. } | ClientMessage::UpdateGameState { .. }
            ) {
                print_board(peer, options);
            }
            Step::Send(message)
        }
        Err(e) => {
            println!("Not sent: {e}");
            Step::Nothing
        }
    }
}

fn announce(peer: &Peer, message: &ServerMessage) {
    match message {
        ServerMessage::Welcome { participant } => println!("You are {participant}"),
        ServerMessage::RoomCreated { room_id } => {
            println!("Room {room_id} created; waiting for an opponent");
        }
        ServerMessage::JoinResult {
            accepted: true,
            room_id: Some(room_id),
            ..
        } => println!("Joined {room_id}"),
        ServerMessage::JoinResult { error, .. } => match error {
            Some(code) => println!("Join refused: {code}"),
            None => println!("Join refused"),
        },
        ServerMessage::LeftRoom { room_id } => println!("Left {room_id}"),
        ServerMessage::RoomList { rooms } => {
            if peer.room().is_none() && !rooms.is_empty() {
                println!("{} room(s) open; type `rooms` to list", rooms.len());
            }
        }
        ServerMessage::PlayerJoined { participant } => {
            if Some(*participant) != peer.participant() {
                println!("{participant} joined");
            }
        }
        ServerMessage::PlayerLeft { participant } => println!("{participant} left the room"),
        ServerMessage::MatchStarted { room_id, side, .. } => {
            println!("Match started in {room_id}; you are {side}");
        }
        ServerMessage::GameStateUpdate { .. } => {}
        ServerMessage::Error { code, message } => println!("Relay: {code} ({message})"),
    }
}

fn print_board(peer: &Peer, options: RenderOptions) {
    let Some(state) = peer.state() else {
        return;
    };
    print!("{}", render_ascii(state, peer.rules(), options));
    if peer.is_my_turn() {
        println!("Your move");
    } else if !state.is_over() {
        println!("Waiting for {}", state.to_move);
    } else {
        println!("Type `again` for a rematch");
    }
}

fn print_rooms(peer: &Peer) {
    if peer.rooms().is_empty() {
        println!("No open rooms");
    }
    for room in peer.rooms() {
        println!("  {}  {}/{}", room.id, room.occupancy, room.capacity);
    }
}

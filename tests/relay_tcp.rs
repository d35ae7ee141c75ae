//! Relay server and clients over real loopback sockets.
//!
//! Run with: cargo test relay_tcp

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use knight_chase::game::{ModifierPolicy, Position, Side};
use knight_chase::online::{
    Connection, MAX_LINE_LEN, Peer, RelayErrorCode, RelayPolicy, RelayServer, ServerMessage,
    decode_line,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn start_relay(policy: RelayPolicy) -> SocketAddr {
    let server = RelayServer::bind("127.0.0.1:0", policy).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Feed relay messages to `peer` (answering as it asks) until `done` holds.
async fn drive(conn: &mut Connection, peer: &mut Peer, done: impl Fn(&Peer) -> bool) {
    while !done(peer) {
        let message = timeout(WAIT, conn.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        for reply in peer.handle(message) {
            conn.send(&reply).await.unwrap();
        }
    }
}

async fn seated_pair(addr: SocketAddr) -> ((Connection, Peer), (Connection, Peer)) {
    let mut host_conn = Connection::connect(addr).await.unwrap();
    let mut host = Peer::new(ModifierPolicy::none(), 1);
    drive(&mut host_conn, &mut host, |p| p.participant().is_some()).await;
    host_conn.send(&host.create_room().unwrap()).await.unwrap();
    drive(&mut host_conn, &mut host, |p| p.room().is_some()).await;

    let mut guest_conn = Connection::connect(addr).await.unwrap();
    let mut guest = Peer::new(ModifierPolicy::none(), 2);
    drive(&mut guest_conn, &mut guest, |p| p.participant().is_some()).await;
    let room = host.room().cloned().unwrap();
    guest_conn.send(&guest.join_room(room).unwrap()).await.unwrap();
    drive(&mut guest_conn, &mut guest, |p| p.state().is_some()).await;
    drive(&mut host_conn, &mut host, |p| p.state().is_some()).await;

    ((host_conn, host), (guest_conn, guest))
}

#[tokio::test]
async fn test_match_over_tcp() {
    let addr = start_relay(RelayPolicy::default()).await;
    let ((mut host_conn, mut host), (mut guest_conn, mut guest)) = seated_pair(addr).await;

    assert_eq!(host.side(), Some(Side::A));
    assert_eq!(guest.side(), Some(Side::B));
    assert_eq!(host.state(), guest.state());
    assert!(host.opponent_present());

    let first = host.submit_move(Position::new(1, 2)).unwrap();
    host_conn.send(&first).await.unwrap();
    drive(&mut guest_conn, &mut guest, |p| p.state().is_some_and(|s| s.turn == 1)).await;
    assert_eq!(guest.state(), host.state());
    assert!(guest.is_my_turn());

    let reply = guest.submit_move(Position::new(6, 5)).unwrap();
    guest_conn.send(&reply).await.unwrap();
    drive(&mut host_conn, &mut host, |p| p.state().is_some_and(|s| s.turn == 2)).await;
    assert_eq!(host.state(), guest.state());
    assert_eq!(host.state().unwrap().b, Position::new(6, 5));

    drop(guest_conn);
    drive(&mut host_conn, &mut host, |p| !p.opponent_present()).await;
}

#[tokio::test]
async fn test_strict_relay_rejects_stale_state() {
    let addr = start_relay(RelayPolicy { reject_stale: true }).await;
    let ((mut host_conn, mut host), _guest) = seated_pair(addr).await;

    let first = host.submit_move(Position::new(1, 2)).unwrap();
    host_conn.send(&first).await.unwrap();
    // Resend the same move: it is based on a state the room no longer holds.
    host_conn.send(&first).await.unwrap();
    drive(&mut host_conn, &mut host, |p| p.last_error().is_some()).await;
    assert_eq!(host.last_error(), Some(RelayErrorCode::StaleState));
}

#[tokio::test]
async fn test_malformed_line_gets_error() {
    let addr = start_relay(RelayPolicy::default()).await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    write_half.write_all(b"garbage\n").await.unwrap();

    let mut lines = BufReader::new(read_half).lines();
    loop {
        let line = timeout(WAIT, lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let ServerMessage::Error { code, .. } = decode_line::<ServerMessage>(&line).unwrap() {
            assert_eq!(code, RelayErrorCode::Malformed);
            break;
        }
    }
}

#[tokio::test]
async fn test_overlong_line_is_refused_and_closed() {
    let addr = start_relay(RelayPolicy::default()).await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    // One byte past the limit with no newline in sight.
    write_half
        .write_all("x".repeat(MAX_LINE_LEN + 1).as_bytes())
        .await
        .unwrap();

    let mut lines = BufReader::new(read_half).lines();
    let mut refused = false;
    while let Some(line) = timeout(WAIT, lines.next_line()).await.unwrap().unwrap() {
        if let ServerMessage::Error { code, .. } = decode_line::<ServerMessage>(&line).unwrap() {
            assert_eq!(code, RelayErrorCode::Malformed);
            refused = true;
        }
    }
    assert!(refused);
}

//! TCP front end for the [`Relay`].
//!
//! One actor task owns the relay and the outbox of every connection. Each
//! connection gets a reader task that turns lines into commands and a writer
//! task that drains its outbox, so a slow client never stalls the others.

use crate::online::protocol::{
    ClientMessage, LineReader, ParticipantId, ProtocolError, ServerMessage, decode_line,
    encode_line,
};
use crate::online::relay::{Outbound, Relay, RelayPolicy};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Errors from the relay server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or accepting failed.
    #[error("relay socket error: {0}")]
    Io(#[from] std::io::Error),
}

enum Command {
    Connect {
        outbox: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<ParticipantId>,
    },
    Message(ParticipantId, ClientMessage),
    Malformed(ParticipantId, String),
    Disconnect(ParticipantId),
}

/// A bound, not yet running relay.
#[derive(Debug)]
pub struct RelayServer {
    listener: TcpListener,
    policy: RelayPolicy,
}

impl RelayServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs, policy: RelayPolicy) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, policy })
    }

    /// Address actually bound, useful after binding port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting a connection fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let relay = Relay::new(self.policy, rand::random());
        let (commands, inbox) = mpsc::unbounded_channel();
        tokio::spawn(relay_actor(relay, inbox));
        info!(addr = ?self.listener.local_addr().ok(), stale_check = self.policy.reject_stale, "relay listening");

        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!(%addr, "accepted connection");
            tokio::spawn(serve_connection(stream, commands.clone()));
        }
    }
}

async fn relay_actor(mut relay: Relay, mut inbox: mpsc::UnboundedReceiver<Command>) {
    let mut outboxes: HashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>> =
        HashMap::new();
    while let Some(command) = inbox.recv().await {
        let out = match command {
            Command::Connect { outbox, reply } => {
                let (id, out) = relay.connect();
                outboxes.insert(id, outbox);
                if reply.send(id).is_err() {
                    outboxes.remove(&id);
                    relay.disconnect(id)
                } else {
                    out
                }
            }
            Command::Message(id, message) => relay.handle(id, message),
            Command::Malformed(id, detail) => relay.malformed(id, &detail),
            Command::Disconnect(id) => {
                outboxes.remove(&id);
                relay.disconnect(id)
            }
        };
        deliver(&outboxes, out);
    }
}

fn deliver(outboxes: &HashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>>, out: Vec<Outbound>) {
    for Outbound { to, message } in out {
        if let Some(outbox) = outboxes.get(&to) {
            // A closed outbox means the writer is gone; its disconnect follows.
            let _ = outbox.send(message);
        }
    }
}

async fn serve_connection(stream: TcpStream, commands: mpsc::UnboundedSender<Command>) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbox, mut pending) = mpsc::unbounded_channel();
    let (reply, assigned) = oneshot::channel();
    if commands.send(Command::Connect { outbox, reply }).is_err() {
        return;
    }
    let Ok(id) = assigned.await else {
        return;
    };

    let writer = tokio::spawn(async move {
        while let Some(message) = pending.recv().await {
            let line = match encode_line(&message) {
                Ok(line) => line,
                Err(e) => {
                    warn!(participant = %id, error = %e, "dropping unencodable message");
                    continue;
                }
            };
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut lines = LineReader::new(read_half);
    loop {
        let command = match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_line::<ClientMessage>(&line) {
                    Ok(message) => Command::Message(id, message),
                    Err(e) => Command::Malformed(id, e.to_string()),
                }
            }
            Ok(None) => break,
            Err(ProtocolError::Io(e)) => {
                debug!(participant = %id, error = %e, "read failed");
                break;
            }
            Err(e @ ProtocolError::TooLong { .. }) => {
                // The rest of the line is still on the wire; no way to resync.
                let _ = commands.send(Command::Malformed(id, e.to_string()));
                break;
            }
            Err(e) => Command::Malformed(id, e.to_string()),
        };
        if commands.send(command).is_err() {
            break;
        }
    }

    let _ = commands.send(Command::Disconnect(id));
    let _ = writer.await;
}

//! TCP client side of the relay protocol.

use crate::online::protocol::{
    ClientMessage, LineReader, ProtocolError, ServerMessage, decode_line, encode_line,
};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Errors on a relay connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The socket failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    /// The relay sent something unreadable, or we could not encode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// An open line-framed connection to the relay.
#[derive(Debug)]
pub struct Connection {
    lines: LineReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Connect to a relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ConnectionError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            lines: LineReader::new(read_half),
            writer,
        })
    }

    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ConnectionError> {
        let line = encode_line(message)?;
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Next message from the relay, or `None` once it closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the line does not parse.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, ConnectionError> {
        loop {
            let line = self.lines.next_line().await.map_err(|e| match e {
                ProtocolError::Io(io) => ConnectionError::Io(io),
                other => ConnectionError::Protocol(other),
            })?;
            let Some(line) = line else {
                return Ok(None);
            };
            if !line.trim().is_empty() {
                return Ok(Some(decode_line(&line)?));
            }
        }
    }
}

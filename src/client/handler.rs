use log::{debug, error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::client::ClientRegistry;
use crate::error::ServiceError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::protocol::responses::error_response;
use crate::protocol::{Command, CommandStatus, handle_command, parse_command};
use crate::service::StructureStore;

/// Outcome of one capped line read.
enum ReadLine {
    Line,
    TooLong,
    Closed,
}

/// Handles one client session using the Tokio async runtime.
///
/// - Reads request lines through a cap of `max_command_length` bytes, so a
///   client can never make the session buffer grow past it.
/// - Dispatches requests using `handle_command`.
/// - Removes the client from `clients` when the session ends.
pub async fn handle_client(
    stream: TcpStream,
    clients: Arc<Mutex<ClientRegistry>>,
    client_addr: SocketAddr,
    store: Arc<StructureStore>,
    max_command_length: usize,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        match read_bounded_line(&mut reader, &mut line, max_command_length).await {
            Ok(ReadLine::Closed) => {
                // Client closed the connection
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(ReadLine::TooLong) => {
                let err = ServiceError::RequestTooLong(max_command_length);
                handle_error(&err);
                let reply = error_response(error_to_status(&err), &err.to_string());
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
                // Drop the rest of the oversized line before reading the next request
                match discard_line(&mut reader).await {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(e) => {
                        error!("Failed to read from {}: {}", client_addr, e);
                        break;
                    }
                }
            }
            Ok(ReadLine::Line) => {
                let command = match std::str::from_utf8(&line) {
                    Ok(text) => {
                        let trimmed = text.trim_end_matches(['\r', '\n']);
                        if trimmed.trim().is_empty() {
                            continue;
                        }
                        parse_command(trimmed)
                    }
                    Err(_) => Command::Malformed("request is not valid UTF-8".into()),
                };
                debug!("Received from {}: {:?}", client_addr, &command);

                if let Some(session) = clients.lock().await.get_mut(&client_addr) {
                    session.record_request();
                }

                let result = handle_command(&command, &store).await;

                if let Some(msg) = result.message {
                    if let Err(e) = write_half.write_all(msg.as_bytes()).await {
                        error!("Failed to write to {}: {}", client_addr, e);
                        break;
                    }
                }

                match result.status {
                    CommandStatus::CloseConnection => {
                        info!("Client {} requested to quit", client_addr);
                        break;
                    }
                    CommandStatus::Success => {}
                    CommandStatus::Failure(reason) => {
                        debug!("Request from {} failed: {}", client_addr, reason);
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let mut clients_guard = clients.lock().await;
    if let Some(session) = clients_guard.remove(&client_addr) {
        let elapsed = chrono::Utc::now() - session.connected_at();
        info!(
            "Client {} disconnected after {} requests ({}s)",
            session.addr(),
            session.requests(),
            elapsed.num_seconds()
        );
    }
}

/// Reads one line into `buf`, never buffering more than `limit + 1` bytes.
/// A line whose content exceeds `limit` is left partially unread.
async fn read_bounded_line<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<ReadLine>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(ReadLine::Closed);
    }
    if read > limit && buf.last() != Some(&b'\n') {
        return Ok(ReadLine::TooLong);
    }
    Ok(ReadLine::Line)
}

/// Skips input through the next newline. Returns `false` on end of stream.
async fn discard_line<R>(reader: &mut R) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (used, found) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(false);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if found {
            return Ok(true);
        }
    }
}

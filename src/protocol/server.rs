// ABOUTME: WebSocket server fanning clock events out to observers of each game
// ABOUTME: Routes /clock/<game-id>, sends a snapshot on join, forwards control messages to the authority

use crate::authority::AuthorityHandle;
use crate::error::Error;
use crate::protocol::codec::{decode, encode};
use crate::protocol::messages::Message;
use crate::registry::GameRegistry;
use futures_util::{Sink, SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use uuid::Uuid;

/// Path prefix under which games are served
pub const ROUTE_PREFIX: &str = "/clock/";

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// URL a client connects to for one game
pub fn game_url(addr: SocketAddr, id: Uuid) -> String {
    format!("ws://{addr}{ROUTE_PREFIX}{id}")
}

/// WebSocket front end for every game in a registry
pub struct ClockServer {
    listener: TcpListener,
    registry: Arc<GameRegistry>,
}

impl ClockServer {
    /// Listen on `addr` for observers of any game in `registry`
    pub async fn bind(addr: impl ToSocketAddrs, registry: Arc<GameRegistry>) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self { listener, registry })
    }

    /// Address actually bound, useful after binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.listener
            .local_addr()
            .map_err(|e| Error::Connection(e.to_string()))
    }

    /// Accept connections forever, one task per observer
    ///
    /// A failed accept never ends the loop: games already being watched
    /// keep their observers.
    pub async fn run(self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::warn!("accept failed: {e}");
                    tokio::time::sleep(accept_backoff(&e)).await;
                    continue;
                }
            };
            let registry = Arc::clone(&self.registry);

            tokio::spawn(async move {
                match serve(stream, registry).await {
                    Ok(()) => log::debug!("observer {peer} disconnected"),
                    Err(e) => log::warn!("observer {peer} dropped: {e}"),
                }
            });
        }
    }
}

/// Delay before accepting again; per-connection failures retry at once
fn accept_backoff(error: &io::Error) -> Duration {
    match error.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted => Duration::ZERO,
        // Typically out of file descriptors; give other tasks a chance to close some
        _ => ACCEPT_BACKOFF,
    }
}

fn route(path: &str, registry: &GameRegistry) -> Result<AuthorityHandle, Error> {
    let id = path
        .strip_prefix(ROUTE_PREFIX)
        .ok_or_else(|| Error::UnknownGame(path.to_string()))?;
    registry.find(id)
}

async fn serve(stream: TcpStream, registry: Arc<GameRegistry>) -> Result<(), Error> {
    let mut game = None;
    let ws = accept_hdr_async(stream, |request: &Request, response: Response| {
        match route(request.uri().path(), &registry) {
            Ok(handle) => {
                game = Some(handle);
                Ok(response)
            }
            Err(e) => {
                let mut rejection = ErrorResponse::new(Some(e.to_string()));
                *rejection.status_mut() = StatusCode::NOT_FOUND;
                Err(rejection)
            }
        }
    })
    .await
    .map_err(|e| Error::WebSocket(e.to_string()))?;
    let game = game.ok_or_else(|| Error::Protocol("handshake accepted without a game".to_string()))?;

    let (mut write, mut read) = ws.split();

    // Subscribe first so nothing emitted after the snapshot is missed.
    let mut events = game.subscribe();
    send(&mut write, &Message::Sync(game.snapshot().await?)).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    for message in event.messages() {
                        send(&mut write, &message).await?;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("game {}: observer lagged by {missed} events, resyncing", game.id());
                    send(&mut write, &Message::Sync(game.snapshot().await?)).await?;
                }
                Err(RecvError::Closed) => break,
            },
            _ = game.closed() => {
                log::debug!("game {} closed, dropping observer", game.id());
                let _ = write.send(WsMessage::Close(None)).await;
                break;
            }
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => control(&game, &text).await,
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
            },
        }
    }

    Ok(())
}

/// Apply a control message from an observer; failures are logged, not fatal
async fn control(game: &AuthorityHandle, text: &str) {
    let result = match decode(text) {
        Ok(Message::Press(press)) => game.press(press.side, press.rtt_ns).await,
        Ok(Message::Pause(_)) => game.pause().await,
        Ok(Message::Resume(resume)) => game.resume(resume.side).await,
        Ok(other) => Err(Error::Protocol(format!(
            "not a control message: {other:?}"
        ))),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        log::info!("game {}: rejected control message: {e}", game.id());
    }
}

async fn send<S>(write: &mut S, message: &Message) -> Result<(), Error>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    write
        .send(WsMessage::Text(encode(message)?))
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_handshake_retries_at_once() {
        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert_eq!(accept_backoff(&aborted), Duration::ZERO);
    }

    #[test]
    fn test_descriptor_exhaustion_backs_off() {
        // EMFILE
        let exhausted = io::Error::from_raw_os_error(24);
        assert_eq!(accept_backoff(&exhausted), ACCEPT_BACKOFF);
    }
}

// ABOUTME: WebSocket client implementation for the clock protocol
// ABOUTME: Feeds received snapshots into a SnapshotInbox and sends turn/pause controls with measured RTT

use crate::authority::Side;
use crate::error::Error;
use crate::protocol::codec::{decode, encode};
use crate::protocol::messages::{Message, Pause, Press, Resume};
use crate::scheduler::SnapshotInbox;
use crate::sync::{RttTracker, SyncQuality, SystemClock};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

const PING_INTERVAL: Duration = Duration::from_secs(2);
const OUTGOING_CAPACITY: usize = 32;

type SharedRtt = Arc<Mutex<RttTracker<SystemClock>>>;

/// WebSocket client for one game
pub struct ProtocolClient {
    outgoing: mpsc::Sender<WsMessage>,
    rtt: SharedRtt,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ProtocolClient {
    /// Connect to a game URL; every snapshot received lands in `inbox`
    pub async fn connect(url: &str, inbox: SnapshotInbox) -> Result<Self, Error> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        log::info!("Connected to clock server: {url}");

        let (write, read) = ws_stream.split();
        let rtt: SharedRtt = Arc::new(Mutex::new(RttTracker::new(SystemClock)));
        let (outgoing, rx) = mpsc::channel(OUTGOING_CAPACITY);

        let reader = tokio::spawn(read_loop(read, inbox, Arc::clone(&rtt)));
        let writer = tokio::spawn(write_loop(write, rx, Arc::clone(&rtt)));

        Ok(Self {
            outgoing,
            rtt,
            reader,
            writer,
        })
    }

    /// End `side`'s turn, attaching the last measured RTT
    pub async fn press(&self, side: Side) -> Result<(), Error> {
        let rtt_ns = self.rtt.lock().rtt_ns();
        self.send(&Message::Press(Press { side, rtt_ns })).await
    }

    /// Ask the server to stop whichever side is running
    pub async fn pause(&self) -> Result<(), Error> {
        self.send(&Message::Pause(Pause {})).await
    }

    /// Ask the server to restart `side`
    pub async fn resume(&self, side: Side) -> Result<(), Error> {
        self.send(&Message::Resume(Resume { side })).await
    }

    /// Last measured round trip to the server
    pub fn rtt(&self) -> Option<Duration> {
        self.rtt.lock().rtt()
    }

    /// Link quality graded from the last round trip
    pub fn quality(&self) -> SyncQuality {
        self.rtt.lock().quality()
    }

    /// Whether the server side of the socket is still open
    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Send a close frame; the reader stops once the server acknowledges
    pub async fn close(&self) -> Result<(), Error> {
        self.outgoing
            .send(WsMessage::Close(None))
            .await
            .map_err(|_| Error::Connection("connection already closed".to_string()))
    }

    async fn send(&self, message: &Message) -> Result<(), Error> {
        self.outgoing
            .send(WsMessage::Text(encode(message)?))
            .await
            .map_err(|_| Error::Connection("connection closed".to_string()))
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_loop<S>(mut read: S, inbox: SnapshotInbox, rtt: SharedRtt)
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match decode(&text) {
                Ok(Message::Sync(sync)) => inbox.push(sync),
                Ok(Message::Expired(expired)) => log::info!("{} ran out of time", expired.side),
                Ok(other) => log::debug!("ignoring unexpected message: {other:?}"),
                Err(e) => log::warn!("dropping message: {e}"),
            },
            Ok(WsMessage::Pong(_)) => rtt.lock().pong_received(),
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("connection error: {e}");
                break;
            }
        }
    }
}

async fn write_loop<S>(mut write: S, mut outgoing: mpsc::Receiver<WsMessage>, rtt: SharedRtt)
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let mut pings = interval(PING_INTERVAL);

    loop {
        let frame = tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            _ = pings.tick() => {
                rtt.lock().ping_sent();
                WsMessage::Ping(Vec::new())
            }
        };

        let closing = matches!(frame, WsMessage::Close(_));
        if let Err(e) = write.send(frame).await {
            log::warn!("failed to send: {e}");
            break;
        }
        if closing {
            break;
        }
    }
}

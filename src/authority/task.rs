// ABOUTME: Single-owner task that drives a ClockAuthority
// ABOUTME: Serializes control commands and timer ticks; fans events out over a broadcast channel

use crate::authority::clock_authority::{ClockAuthority, ClockEvent};
use crate::authority::state::Side;
use crate::error::Error;
use crate::protocol::messages::ClockSyncMessage;
use crate::sync::MonotonicClock;
use std::fmt;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// Shortest timer period; `tokio::time::interval` rejects zero
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Start(Side, Reply<Result<(), Error>>),
    Stop(Side, Reply<()>),
    Press(Side, Option<Duration>, Reply<Result<(), Error>>),
    Pause(Reply<()>),
    Snapshot(Reply<ClockSyncMessage>),
    Shutdown,
}

/// Cloneable handle to a running authority task
#[derive(Clone)]
pub struct AuthorityHandle {
    id: Uuid,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ClockEvent>,
}

impl AuthorityHandle {
    /// Move `authority` into a new task ticking every `tick_period`
    ///
    /// Periods below [`MIN_TICK_PERIOD`] are raised to it. Must be called
    /// from within a tokio runtime.
    pub fn spawn<C: MonotonicClock>(
        authority: ClockAuthority<C>,
        tick_period: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = Self {
            id: Uuid::new_v4(),
            commands,
            events: events.clone(),
        };
        let tick_period = tick_period.max(MIN_TICK_PERIOD);
        let task = tokio::spawn(run(authority, rx, events, tick_period));
        (handle, task)
    }

    /// Game id, used for routing
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.events.subscribe()
    }

    /// Start `side`'s clock, stopping the opponent's
    pub async fn start(&self, side: Side) -> Result<(), Error> {
        self.request(|reply| Command::Start(side, reply)).await?
    }

    /// Stop `side` without crediting an increment
    pub async fn stop(&self, side: Side) -> Result<(), Error> {
        self.request(|reply| Command::Stop(side, reply)).await
    }

    /// End `side`'s turn; `rtt_ns` is the client-measured round trip
    pub async fn press(&self, side: Side, rtt_ns: Option<u64>) -> Result<(), Error> {
        let rtt = rtt_ns.map(Duration::from_nanos);
        self.request(|reply| Command::Press(side, rtt, reply)).await?
    }

    /// Stop whichever side is running
    pub async fn pause(&self) -> Result<(), Error> {
        self.request(Command::Pause).await
    }

    /// Restart `side` after a pause
    pub async fn resume(&self, side: Side) -> Result<(), Error> {
        self.start(side).await
    }

    /// Current state of both clocks, projected to now
    pub async fn snapshot(&self) -> Result<ClockSyncMessage, Error> {
        self.request(Command::Snapshot).await
    }

    /// Stop the timer and end the task
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| Error::AuthorityClosed)
    }

    /// Resolves once the authority task has ended
    pub async fn closed(&self) {
        self.commands.closed().await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, Error> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| Error::AuthorityClosed)?;
        response.await.map_err(|_| Error::AuthorityClosed)
    }
}

impl fmt::Debug for AuthorityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorityHandle")
            .field("id", &self.id)
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

async fn run<C: MonotonicClock>(
    mut authority: ClockAuthority<C>,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<ClockEvent>,
    tick_period: Duration,
) {
    let mut ticker = interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Start(side, reply) => {
                        let result = authority.start(side).map(|event| publish(&events, event));
                        let _ = reply.send(result);
                    }
                    Command::Stop(side, reply) => {
                        publish(&events, authority.stop(side));
                        let _ = reply.send(());
                    }
                    Command::Press(side, rtt, reply) => {
                        let result = authority.press(side, rtt).map(|event| publish(&events, event));
                        let _ = reply.send(result);
                    }
                    Command::Pause(reply) => {
                        publish(&events, authority.pause());
                        let _ = reply.send(());
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(authority.snapshot());
                    }
                    Command::Shutdown => break,
                }
            }
            _ = ticker.tick(), if !authority.is_finished() => {
                publish(&events, authority.tick());
            }
        }
    }

    log::debug!("clock authority stopped after {} turns", authority.turn());
}

/// Fan out without waiting on subscribers; slow ones lag instead of blocking the timer
fn publish(events: &broadcast::Sender<ClockEvent>, event: Option<ClockEvent>) {
    if let Some(event) = event {
        // No subscribers is fine: late joiners ask for a snapshot.
        let _ = events.send(event);
    }
}

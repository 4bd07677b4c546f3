use duelclock::authority::{AuthorityHandle, ClockAuthority, Side};
use duelclock::error::Error;
use duelclock::protocol::codec::decode;
use duelclock::protocol::messages::{ClockSyncMessage, Message};
use duelclock::protocol::server::game_url;
use duelclock::protocol::{ClockServer, ProtocolClient};
use duelclock::reconciler::{ClockReconciler, RecordingSink};
use duelclock::registry::GameRegistry;
use duelclock::{AuthorityConfig, ManualClock, SnapshotInbox};
use futures_util::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{client_async, WebSocketStream};

async fn wait_for(inbox: &SnapshotInbox, pred: impl Fn(&ClockSyncMessage) -> bool) -> ClockSyncMessage {
    timeout(Duration::from_secs(5), async {
        loop {
            for message in inbox.drain() {
                if pred(&message) {
                    return message;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("no matching snapshot")
}

async fn serve(registry: Arc<GameRegistry>) -> std::net::SocketAddr {
    let server = ClockServer::bind("127.0.0.1:0", registry).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Next clock/sync frame from a raw observer socket
async fn next_sync(observer: &mut WebSocketStream<TcpStream>) -> ClockSyncMessage {
    loop {
        match observer.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                if let Message::Sync(sync) = decode(&text).unwrap() {
                    return sync;
                }
            }
            Some(Ok(_)) => {}
            other => panic!("observer connection ended: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_observer_follows_game() {
    let registry = Arc::new(GameRegistry::new());
    let (game, _task) = registry.create(&AuthorityConfig::default());
    let addr = serve(Arc::clone(&registry)).await;

    let inbox = SnapshotInbox::new();
    let client = ProtocolClient::connect(&game_url(addr, game.id()), inbox.clone())
        .await
        .unwrap();

    // Late joiners get the current state straight away
    let initial = wait_for(&inbox, |_| true).await;
    assert_eq!(initial.running_side(), None);
    assert_eq!(initial.first.remaining_ns, 300_000_000_000);

    game.start(Side::First).await.unwrap();
    wait_for(&inbox, |m| m.first.running).await;
    sleep(Duration::from_millis(50)).await;

    client.press(Side::First).await.unwrap();
    let switched = wait_for(&inbox, |m| m.second.running).await;
    assert!(!switched.first.running);
    assert!(switched.first.remaining_ns < 300_000_000_000);

    client.pause().await.unwrap();
    let paused = wait_for(&inbox, |m| m.running_side().is_none()).await;
    assert!(paused.seq > switched.seq);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_unknown_game_is_rejected() {
    let registry = Arc::new(GameRegistry::new());
    let addr = serve(registry).await;

    let url = game_url(addr, uuid::Uuid::new_v4());
    assert!(ProtocolClient::connect(&url, SnapshotInbox::new()).await.is_err());
}

#[tokio::test]
async fn test_registry_lookup() {
    let registry = GameRegistry::new();
    let (game, _task) = registry.create(&AuthorityConfig::default());

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.find(&game.id().to_string()).unwrap().id(), game.id());
    assert!(registry.find("not-a-uuid").is_err());

    registry.remove(&game.id());
    assert!(registry.is_empty());
    game.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_close_ends_game_and_observers() {
    let registry = Arc::new(GameRegistry::new());
    let (game, task) = registry.create(&AuthorityConfig::default());
    let addr = serve(Arc::clone(&registry)).await;

    let inbox = SnapshotInbox::new();
    let client = ProtocolClient::connect(&game_url(addr, game.id()), inbox.clone())
        .await
        .unwrap();
    wait_for(&inbox, |_| true).await;

    registry.close(&game.id()).await.unwrap();

    assert!(registry.is_empty());
    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(matches!(game.snapshot().await, Err(Error::AuthorityClosed)));
    assert!(matches!(registry.close(&game.id()).await, Err(Error::UnknownGame(_))));

    // The server drops the connection once the game is closed
    timeout(Duration::from_secs(5), async {
        while client.is_connected() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("observer still connected");
}

#[tokio::test]
async fn test_lagging_observer_is_resynced() {
    const SWITCHES: u64 = 60_000;

    // A frozen clock: no heartbeats, only the turn switches below emit
    let registry = Arc::new(GameRegistry::new());
    let config = AuthorityConfig::default();
    let authority = ClockAuthority::with_clock(&config, ManualClock::new());
    let (game, _task) = AuthorityHandle::spawn(authority, config.tick_period);
    registry.insert(game.clone());
    let addr = serve(Arc::clone(&registry)).await;

    // Small receive window so the server's writes back up early
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let stream = socket.connect(addr).await.unwrap();
    let (mut observer, _) = client_async(game_url(addr, game.id()), stream).await.unwrap();

    // The join snapshot arrives after the server subscribed
    assert_eq!(next_sync(&mut observer).await.seq, 0);

    // Nobody reads the socket while the game runs far ahead of the observer
    for turn in 0..SWITCHES {
        let side = if turn % 2 == 0 { Side::First } else { Side::Second };
        game.start(side).await.unwrap();
    }
    let last = game.snapshot().await.unwrap();
    assert_eq!(last.seq, SWITCHES);

    // The latest state shows up twice: once as the resync snapshot, once as
    // the newest event still queued behind it
    let inbox = SnapshotInbox::new();
    let mut seqs = Vec::new();
    timeout(Duration::from_secs(30), async {
        while seqs.iter().filter(|&&seq| seq == last.seq).count() < 2 {
            let sync = next_sync(&mut observer).await;
            seqs.push(sync.seq);
            inbox.push(sync);
        }
    })
    .await
    .expect("observer was never resynced");

    let delivered: HashSet<u64> = seqs.iter().copied().collect();
    assert!((delivered.len() as u64) < SWITCHES);
    assert!(seqs.windows(2).any(|pair| pair[1] < pair[0]));

    let mut reconciler = ClockReconciler::new(ManualClock::new(), RecordingSink::new());
    reconciler.pump(&inbox);
    assert_eq!(reconciler.last_seq(), Some(last.seq));
    for side in Side::BOTH {
        assert_eq!(reconciler.clock(side).remaining(), last.side(side).remaining());
        assert_eq!(reconciler.clock(side).is_running(), last.side(side).running);
    }
}

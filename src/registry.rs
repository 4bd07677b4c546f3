// ABOUTME: Per-process registry of live games
// ABOUTME: Maps game ids to authority handles for the transport layer; the host decides when a game ends

use crate::authority::{AuthorityHandle, ClockAuthority};
use crate::config::AuthorityConfig;
use crate::error::Error;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Live games keyed by id
///
/// The registry never retires a game on its own, not even after a flag
/// falls: observers may still ask for the final snapshot. Whoever created a
/// game calls [`GameRegistry::close`] when it is done with it.
#[derive(Debug, Default)]
pub struct GameRegistry {
    games: RwLock<HashMap<Uuid, AuthorityHandle>>,
}

impl GameRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a system-clock authority for a new game and register it
    ///
    /// The game stays registered and its task keeps running until
    /// [`GameRegistry::close`] is called for it.
    pub fn create(&self, config: &AuthorityConfig) -> (AuthorityHandle, JoinHandle<()>) {
        let (handle, task) = AuthorityHandle::spawn(ClockAuthority::new(config), config.tick_period);
        self.insert(handle.clone());
        log::info!("created game {} ({})", handle.id(), config.time_control.name);
        (handle, task)
    }

    /// Register an already running authority
    pub fn insert(&self, handle: AuthorityHandle) {
        self.games.write().insert(handle.id(), handle);
    }

    /// Handle for a registered game
    pub fn get(&self, id: &Uuid) -> Option<AuthorityHandle> {
        self.games.read().get(id).cloned()
    }

    /// Look a game up from its textual id
    pub fn find(&self, id: &str) -> Result<AuthorityHandle, Error> {
        Uuid::parse_str(id)
            .ok()
            .and_then(|id| self.get(&id))
            .ok_or_else(|| Error::UnknownGame(id.to_string()))
    }

    /// Unregister a game; its task keeps running until shut down
    pub fn remove(&self, id: &Uuid) -> Option<AuthorityHandle> {
        self.games.write().remove(id)
    }

    /// Unregister a game and stop its authority task
    ///
    /// Connected observers see the event stream close and disconnect.
    pub async fn close(&self, id: &Uuid) -> Result<(), Error> {
        let handle = self
            .remove(id)
            .ok_or_else(|| Error::UnknownGame(id.to_string()))?;
        log::info!("closing game {id}");
        match handle.shutdown().await {
            // Task already gone; nothing left to stop.
            Ok(()) | Err(Error::AuthorityClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Number of registered games
    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    /// True when no game is registered
    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }
}

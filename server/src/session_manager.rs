//! Session ownership and request dispatch for the game server
//!
//! This module owns every live game on the server:
//! - Session creation with collision-free identifiers
//! - Lookup restricted to the connection that created a session
//! - Per-session serialisation of all requests
//! - Cleanup on disconnect and for idle sessions
//!
//! The table lock is only held long enough to find, insert or remove an
//! entry. Each session sits behind its own mutex, so requests for different
//! sessions never wait on each other while requests for the same session are
//! applied strictly one after another.

use crate::board::Board;
use crate::config::ServerConfig;
use crate::error::{GameError, Result};
use crate::session::{ConnectionId, Session};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{ClientMessage, Position, ServerMessage, SessionId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Table entry for one session
///
/// The owner is immutable, so it lives next to the handle rather than behind
/// the session's mutex.
#[derive(Clone)]
struct SessionEntry {
    owner: ConnectionId,
    session: SessionHandle,
}

#[derive(Default)]
struct SessionTable {
    /// Live sessions indexed by their identifier
    sessions: HashMap<SessionId, SessionEntry>,
    /// Sessions each connection currently owns
    by_owner: HashMap<ConnectionId, HashSet<SessionId>>,
}

impl SessionTable {
    fn remove(&mut self, id: SessionId) -> Option<SessionEntry> {
        let entry = self.sessions.remove(&id)?;
        if let Some(owned) = self.by_owner.get_mut(&entry.owner) {
            owned.remove(&id);
            if owned.is_empty() {
                self.by_owner.remove(&entry.owner);
            }
        }
        Some(entry)
    }
}

/// Concurrency-safe table of all sessions on the server
///
/// Identifiers come from a monotonically increasing counter and are never
/// handed out twice, regardless of how similar two boards are. No method
/// waits on a session's own lock while holding the table lock.
pub struct SessionStore {
    table: RwLock<SessionTable>,
    /// Next identifier to hand out
    next_session_id: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(SessionTable::default()),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Stores a fully generated board as a new session and returns its handle
    ///
    /// The board exists before the entry does, so no request can ever observe
    /// a session that is still being set up.
    pub async fn create(&self, owner: ConnectionId, board: Board) -> SessionHandle {
        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(Mutex::new(Session::new(id, owner, board)));

        let mut table = self.table.write().await;
        table.sessions.insert(
            id,
            SessionEntry {
                owner,
                session: Arc::clone(&session),
            },
        );
        table.by_owner.entry(owner).or_default().insert(id);
        info!("Session {} created for connection {}", id, owner);

        session
    }

    /// Looks up a session by identifier
    pub async fn get(&self, id: SessionId) -> Result<SessionHandle> {
        let table = self.table.read().await;
        table
            .sessions
            .get(&id)
            .map(|entry| Arc::clone(&entry.session))
            .ok_or(GameError::UnknownSession(id))
    }

    /// Looks up a session that must belong to `owner`
    ///
    /// Someone else's session is reported exactly like a missing one.
    pub async fn get_owned(&self, id: SessionId, owner: ConnectionId) -> Result<SessionHandle> {
        let table = self.table.read().await;
        match table.sessions.get(&id) {
            Some(entry) if entry.owner == owner => Ok(Arc::clone(&entry.session)),
            _ => Err(GameError::UnknownSession(id)),
        }
    }

    /// Removes a session. Returns false if it was already gone.
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut table = self.table.write().await;
        if table.remove(id).is_some() {
            info!("Session {} removed", id);
            true
        } else {
            false
        }
    }

    /// Removes every session created by `owner`
    pub async fn remove_owned_by(&self, owner: ConnectionId) -> Vec<SessionId> {
        let mut table = self.table.write().await;
        let removed: Vec<SessionId> = table
            .by_owner
            .remove(&owner)
            .map(|owned| owned.into_iter().collect())
            .unwrap_or_default();
        for id in &removed {
            table.sessions.remove(id);
        }

        if !removed.is_empty() {
            info!(
                "Removed {} session(s) owned by connection {}",
                removed.len(),
                owner
            );
        }
        removed
    }

    /// Drops sessions nobody has touched within `ttl`
    ///
    /// A session that is currently locked is in use and therefore not idle.
    pub async fn reap_idle(&self, ttl: Duration) -> Vec<SessionId> {
        let mut table = self.table.write().await;
        let idle: Vec<SessionId> = table
            .sessions
            .iter()
            .filter(|(_, entry)| {
                entry
                    .session
                    .try_lock()
                    .map(|session| session.is_idle(ttl))
                    .unwrap_or(false)
            })
            .map(|(id, _)| *id)
            .collect();

        for id in &idle {
            table.remove(*id);
        }

        if !idle.is_empty() {
            info!("Reaped {} idle session(s)", idle.len());
        }
        idle
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies protocol requests to the sessions they name
pub struct SessionManager {
    store: SessionStore,
    /// Board randomness; only locked for the duration of one generation
    rng: std::sync::Mutex<StdRng>,
    max_dimension: usize,
}

impl SessionManager {
    pub fn new(config: &ServerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store: SessionStore::new(),
            rng: std::sync::Mutex::new(rng),
            max_dimension: config.max_dimension,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Dispatches one inbound message from connection `owner`
    ///
    /// Sessions are private to the connection that created them; naming
    /// someone else's session is the same as naming one that does not exist.
    pub async fn handle(&self, owner: ConnectionId, message: ClientMessage) -> Result<ServerMessage> {
        match message {
            ClientMessage::StartGame {
                rows,
                columns,
                mines,
            } => self.start_game(owner, rows, columns, mines).await,
            ClientMessage::RevealCell { session_id, x, y } => {
                self.reveal_cell(owner, session_id, (x, y)).await
            }
            ClientMessage::Solve { session_id } => self.solve(owner, session_id).await,
            ClientMessage::VerifyMarks { session_id, marks } => {
                self.verify_marks(owner, session_id, &marks).await
            }
        }
    }

    /// Creates a new game, replacing any game `owner` already had
    pub async fn start_game(
        &self,
        owner: ConnectionId,
        rows: usize,
        columns: usize,
        mines: usize,
    ) -> Result<ServerMessage> {
        if rows > self.max_dimension || columns > self.max_dimension {
            return Err(GameError::InvalidConfiguration {
                rows,
                columns,
                mines,
                reason: "board exceeds the maximum dimension",
            });
        }

        let board = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Board::generate(rows, columns, mines, &mut *rng)?
        };

        let replaced = self.store.remove_owned_by(owner).await;
        if !replaced.is_empty() {
            debug!("Connection {} replaced sessions {:?}", owner, replaced);
        }

        let handle = self.store.create(owner, board).await;
        let session = handle.lock().await;
        Ok(session.created_message())
    }

    pub async fn reveal_cell(
        &self,
        owner: ConnectionId,
        session_id: SessionId,
        pos: Position,
    ) -> Result<ServerMessage> {
        let handle = self.owned_session(owner, session_id).await?;
        let mut session = handle.lock().await;
        session.reveal(pos)
    }

    pub async fn solve(&self, owner: ConnectionId, session_id: SessionId) -> Result<ServerMessage> {
        let handle = self.owned_session(owner, session_id).await?;
        let mut session = handle.lock().await;
        Ok(session.solve())
    }

    pub async fn verify_marks(
        &self,
        owner: ConnectionId,
        session_id: SessionId,
        marks: &[Position],
    ) -> Result<ServerMessage> {
        let handle = self.owned_session(owner, session_id).await?;
        let mut session = handle.lock().await;
        session.verify_marks(marks)
    }

    /// Releases everything a closed connection owned
    pub async fn disconnect(&self, owner: ConnectionId) -> Vec<SessionId> {
        self.store.remove_owned_by(owner).await
    }

    async fn owned_session(&self, owner: ConnectionId, session_id: SessionId) -> Result<SessionHandle> {
        self.store.get_owned(session_id, owner).await
    }
}

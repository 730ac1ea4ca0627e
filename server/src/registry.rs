//! C8 — the server-wide registry: every live game, chat channel and table
//! template, plus connection-id allocation. One process holds exactly one
//! [`AppState`], shared as an `Arc` the way the teacher's `AppState` is
//! threaded through every axum handler and background task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use game_core::Game;
use protocol::{Item, ServerInfoGame};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};

use crate::chat::ChatChannel;
use crate::config::TableTemplate;
use crate::deck_store::DeckStore;

pub type ConnectionId = u64;

/// Outstanding capacity of a connection's outbound mailbox and of each
/// game's public broadcast lane. A slow reader backs up its own mailbox
/// before it can stall anyone else's.
const OUTBOUND_BUFFER: usize = 256;

/// One active table: the authoritative [`Game`] behind a lock held only for
/// the span of a single command (§5 concurrency model), its public
/// broadcast lane, and the private per-player mailboxes event fan-out is
/// pushed into directly.
pub struct GameSession {
    pub game: Mutex<Game>,
    pub public_tx: broadcast::Sender<Item>,
    player_senders: Mutex<HashMap<i32, mpsc::Sender<Item>>>,
}

impl GameSession {
    fn new(game: Game) -> Self {
        let (public_tx, _) = broadcast::channel(OUTBOUND_BUFFER);
        GameSession {
            game: Mutex::new(game),
            public_tx,
            player_senders: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register_player_sender(&self, player_id: i32, sender: mpsc::Sender<Item>) {
        self.player_senders.lock().await.insert(player_id, sender);
    }

    pub async fn unregister_player_sender(&self, player_id: i32) {
        self.player_senders.lock().await.remove(&player_id);
    }

    /// Delivers one private event to its addressee, if still connected. A
    /// disconnected-but-seated player (§4.5 `DisconnectOutcome::SeatKept`)
    /// has no sender registered, so the event is simply dropped — there is
    /// nobody to replay it to until they reconnect, and live-game state
    /// across restarts is out of scope.
    pub async fn send_private(&self, player_id: i32, item: Item) {
        if let Some(sender) = self.player_senders.lock().await.get(&player_id) {
            let _ = sender.try_send(item);
        }
    }
}

pub struct AppState {
    pub table_templates: RwLock<HashMap<String, TableTemplate>>,
    pub deck_store: DeckStore,
    games: Mutex<HashMap<i32, Arc<GameSession>>>,
    chat_channels: Mutex<HashMap<String, ChatChannel>>,
    next_game_id: AtomicI32,
    next_connection_id: AtomicU64,
}

impl AppState {
    pub fn new(deck_dir: impl Into<std::path::PathBuf>) -> Self {
        AppState {
            table_templates: RwLock::new(HashMap::new()),
            deck_store: DeckStore::new(deck_dir),
            games: Mutex::new(HashMap::new()),
            chat_channels: Mutex::new(HashMap::new()),
            next_game_id: AtomicI32::new(1),
            next_connection_id: AtomicU64::new(1),
        }
    }

    pub fn alloc_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn create_game(
        &self,
        description: String,
        creator_name: String,
        max_players: i32,
        spectators_allowed: bool,
        password: Option<String>,
    ) -> Arc<GameSession> {
        let game_id = self.next_game_id.fetch_add(1, Ordering::Relaxed);
        let shuffle_seed = rand::random::<u64>();
        let game = Game::new(game_id, description, creator_name, max_players, spectators_allowed, password, shuffle_seed);
        let session = Arc::new(GameSession::new(game));
        self.games.lock().await.insert(game_id, session.clone());
        session
    }

    pub async fn find_game(&self, game_id: i32) -> Option<Arc<GameSession>> {
        self.games.lock().await.get(&game_id).cloned()
    }

    /// Drops a terminal game from the registry (§4.4 lifecycle "Terminal is
    /// final"). Called once all seated players have disconnected or
    /// conceded; live state is not persisted across restarts, so this is
    /// just freeing memory.
    pub async fn remove_game(&self, game_id: i32) {
        self.games.lock().await.remove(&game_id);
    }

    pub async fn list_games(&self) -> Vec<ServerInfoGame> {
        let games = self.games.lock().await;
        let mut out = Vec::with_capacity(games.len());
        for session in games.values() {
            out.push(session.game.lock().await.to_server_info());
        }
        out
    }

    /// Runs `f` against a chat channel, creating it on first join the way
    /// the teacher's lobby lazily creates its single room on first use.
    pub async fn with_chat_channel<R>(&self, name: &str, f: impl FnOnce(&mut ChatChannel) -> R) -> R {
        let mut channels = self.chat_channels.lock().await;
        let channel = channels
            .entry(name.to_string())
            .or_insert_with(|| ChatChannel::new(name, "", false));
        f(channel)
    }

    /// Removes `connection_id` from every chat channel it ever joined,
    /// dropping any channel left empty behind it (§4.2 chat channels have
    /// no fixed lifetime beyond their membership).
    pub async fn leave_all_chat_channels(&self, connection_id: ConnectionId) {
        let mut channels = self.chat_channels.lock().await;
        for channel in channels.values_mut() {
            channel.leave(connection_id);
        }
        channels.retain(|_, c| !c.is_empty());
    }

    pub async fn chat_channel_infos(&self) -> Vec<protocol::ServerInfoChatChannel> {
        self.chat_channels.lock().await.values().map(|c| c.to_server_info()).collect()
    }

    /// Sweeps out games that reached `Terminal` but whose last connection
    /// never sent an explicit command to trigger [`Self::remove_game`] — a
    /// fallback the way the teacher's own watchdog treats dead rooms as a
    /// belt-and-braces cleanup rather than the primary removal path.
    pub async fn sweep_terminal_games(&self) -> Vec<i32> {
        let mut games = self.games.lock().await;
        let mut removed = Vec::new();
        let ids: Vec<i32> = games.keys().copied().collect();
        for id in ids {
            let is_terminal = games.get(&id).map(|s| s.game.try_lock().map(|g| g.phase == game_core::GamePhase::Terminal));
            if let Some(Ok(true)) = is_terminal {
                games.remove(&id);
                removed.push(id);
            }
        }
        removed
    }

    pub async fn debug_listing(&self) -> String {
        let games = self.games.lock().await;
        let mut lines = Vec::with_capacity(games.len());
        for (id, session) in games.iter() {
            let info = session.game.lock().await.to_server_info();
            lines.push(format!(
                "Game {:<4} {:<30} players {}/{} started={}",
                id, info.description, info.player_count, info.max_players, info.started
            ));
        }
        lines.join("\n")
    }
}

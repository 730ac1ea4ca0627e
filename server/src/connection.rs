//! C7 — the per-connection protocol handler: one axum websocket upgrade
//! becomes one call to [`handle_socket`]. Mirrors the teacher's
//! spawn-a-writer-task-and-loop-the-reader shape (`processing_module.rs`),
//! swapping its postcard/`Bytes` relay for the wire format this server
//! actually speaks: one JSON-encoded `Vec<FramerToken>` per websocket text
//! frame, each decoding to exactly one top-level [`Item`].

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use game_core::DisconnectOutcome;
use protocol::framer::{item_from_tokens, item_to_tokens, FramerToken};
use protocol::{
    encode_event_container, encode_response, shared_registry, ClientEnvelope, Command, CommandContainer, Event, Item,
    ResponseCode, ResponsePayload,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::registry::{AppState, ConnectionId, GameSession};

const OUTBOUND_BUFFER: usize = 256;

struct Seat {
    game: Arc<GameSession>,
    game_id: i32,
    player_id: i32,
    forwarder: JoinHandle<()>,
}

struct Connection {
    state: Arc<AppState>,
    connection_id: ConnectionId,
    player_name: String,
    outbound_tx: mpsc::Sender<Item>,
    seat: Option<Seat>,
    chat_channels: Vec<String>,
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = state.alloc_connection_id();
    let (sink, mut stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Item>(OUTBOUND_BUFFER);

    let mut writer_task = tokio::spawn(write_loop(sink, outbound_rx));

    let Some(player_name) = handshake(&mut stream, &outbound_tx).await else {
        writer_task.abort();
        return;
    };
    tracing::info!(connection_id, player_name, "connection established");

    let mut conn = Connection {
        state: state.clone(),
        connection_id,
        player_name,
        outbound_tx: outbound_tx.clone(),
        seat: None,
        chat_channels: Vec::new(),
    };

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !conn.handle_text(&text).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!(?err, connection_id, "websocket read error");
                        break;
                    }
                }
            }
            _ = &mut writer_task => {
                tracing::warn!(connection_id, "writer task ended, closing connection");
                break;
            }
        }
    }

    writer_task.abort();
    conn.cleanup().await;
    tracing::info!(connection_id, "connection closed");
}

/// Reads the single `Command::Hello` every connection must open with and
/// replies `Event::Welcome` (§6). Returns the claimed player name on
/// success; on a version mismatch or malformed first message, the welcome
/// (if any) has already been flushed and the caller closes the socket.
async fn handshake(stream: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin), outbound_tx: &mpsc::Sender<Item>) -> Option<String> {
    let text = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => break text,
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::warn!(?err, "websocket error during handshake");
                return None;
            }
        }
    };

    let Some(item) = decode_text(&text) else {
        tracing::warn!("malformed handshake message");
        return None;
    };
    let Some(Command::Hello { protocol_version, player_name }) = Command::from_item(&item) else {
        tracing::warn!("first command was not hello");
        return None;
    };

    let accepted = protocol_version == protocol::PROTOCOL_VERSION;
    let _ = outbound_tx
        .send(Event::Welcome { protocol_version: protocol::PROTOCOL_VERSION, accepted }.to_item())
        .await;
    if accepted {
        Some(player_name)
    } else {
        tracing::warn!(protocol_version, expected = protocol::PROTOCOL_VERSION, "protocol version mismatch");
        None
    }
}

fn decode_text(text: &str) -> Option<Item> {
    let tokens: Vec<FramerToken> = serde_json::from_str(text).ok()?;
    item_from_tokens(tokens, shared_registry()).ok()
}

fn encode_item_message(item: &Item) -> Message {
    let tokens = item_to_tokens(item);
    Message::Text(serde_json::to_string(&tokens).unwrap_or_default().into())
}

async fn write_loop(mut sink: SplitSink<WebSocket, Message>, mut outbound_rx: mpsc::Receiver<Item>) {
    while let Some(item) = outbound_rx.recv().await {
        if sink.send(encode_item_message(&item)).await.is_err() {
            break;
        }
    }
}

/// Forwards a game's public broadcast lane into one connection's private
/// mailbox until the channel is torn down (on leave/disconnect) or lags
/// past recovery.
fn spawn_forwarder(mut rx: broadcast::Receiver<Item>, outbound_tx: mpsc::Sender<Item>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(item) => {
                    if outbound_tx.send(item).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "connection lagged behind public event lane");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

impl Connection {
    /// Decodes and dispatches every command in one incoming text frame.
    /// Returns `false` when the connection should close (malformed frame).
    async fn handle_text(&mut self, text: &str) -> bool {
        let Some(item) = decode_text(text) else {
            tracing::warn!(connection_id = self.connection_id, "dropping malformed frame");
            let _ = self.outbound_tx.send(encode_response(-1, ResponseCode::Invalid, &ResponsePayload::None)).await;
            return true;
        };
        let envelope = ClientEnvelope::from_item(&item);
        if envelope.commands.is_empty() {
            let _ = self
                .outbound_tx
                .send(encode_response(envelope.cmd_id, ResponseCode::Invalid, &ResponsePayload::None))
                .await;
            return true;
        }

        let mut container = CommandContainer::new();
        let mut touched_games: HashSet<i32> = HashSet::new();
        for command in envelope.commands {
            self.dispatch(command, &mut container, &mut touched_games).await;
        }

        let _ = self
            .outbound_tx
            .send(encode_response(envelope.cmd_id, container.response(), container.response_payload()))
            .await;

        for (game_id, events) in container.public_events() {
            if let Some(session) = self.state.find_game(game_id).await {
                let _ = session.public_tx.send(encode_event_container(game_id, None, events));
            }
        }
        for game_id in touched_games {
            if let Some(session) = self.state.find_game(game_id).await {
                for (player_id, events) in container.private_events(game_id) {
                    session.send_private(player_id, encode_event_container(game_id, None, events)).await;
                }
            }
        }
        true
    }

    async fn dispatch(&mut self, command: Command, container: &mut CommandContainer, touched_games: &mut HashSet<i32>) {
        match command {
            Command::Hello { .. } => container.process_response(ResponseCode::Invalid),
            Command::DeckUpload { deck, name } => match self.state.deck_store.upload(&self.player_name, &name, &deck).await {
                Ok(id) => {
                    container.process_response(ResponseCode::Ok);
                    container.set_response_payload(ResponsePayload::DeckUploaded { id });
                }
                Err(err) => {
                    tracing::warn!(?err, "deck upload failed");
                    container.process_response(ResponseCode::ContextError);
                }
            },
            Command::DeckSelect { deck_id } => {
                let Some(seat) = &self.seat else {
                    container.process_response(ResponseCode::ContextError);
                    return;
                };
                match self.state.deck_store.load(&self.player_name, &deck_id).await {
                    Ok(deck) => {
                        let mut game = seat.game.game.lock().await;
                        container.process_response(game.select_deck(seat.player_id, &deck, deck_id));
                    }
                    Err(_) => container.process_response(ResponseCode::NameNotFound),
                }
            }
            Command::DeckListDir { path } => match self.state.deck_store.list_dir(&self.player_name, &path).await {
                Ok(root) => {
                    container.process_response(ResponseCode::Ok);
                    container.set_response_payload(ResponsePayload::DeckDirectory { root });
                }
                Err(_) => container.process_response(ResponseCode::ContextError),
            },
            Command::DeckNewDir { path, name } => {
                let code = if self.state.deck_store.new_dir(&self.player_name, &path, &name).await.is_ok() {
                    ResponseCode::Ok
                } else {
                    ResponseCode::ContextError
                };
                container.process_response(code);
            }
            Command::DeckDelete { id } => {
                let code = if self.state.deck_store.delete(&self.player_name, &id).await.is_ok() {
                    ResponseCode::Ok
                } else {
                    ResponseCode::NameNotFound
                };
                container.process_response(code);
            }
            Command::ListGames => {
                let games = self.state.list_games().await;
                container.process_response(ResponseCode::Ok);
                let _ = self.outbound_tx.send(Event::ListGames { games }.to_item()).await;
            }
            Command::CreateGame { description, password, max_players, spectators_allowed } => {
                if self.seat.is_some() {
                    container.process_response(ResponseCode::ContextError);
                    return;
                }
                let session = self.state.create_game(description, self.player_name.clone(), max_players, spectators_allowed, password).await;
                let game_id = session.game.lock().await.game_id;
                self.seat_into(session, game_id, 0, container, touched_games).await;
                container.process_response(ResponseCode::Ok);
            }
            Command::JoinGame { game_id, password, spectator } => {
                if self.seat.is_some() {
                    container.process_response(ResponseCode::ContextError);
                    return;
                }
                let Some(session) = self.state.find_game(game_id).await else {
                    container.process_response(ResponseCode::NameNotFound);
                    return;
                };
                let joined = {
                    let mut game = session.game.lock().await;
                    game.join_player(self.player_name.clone(), spectator, password.as_deref())
                };
                match joined {
                    Ok(player_id) => {
                        self.seat_into(session, game_id, player_id, container, touched_games).await;
                        container.process_response(ResponseCode::Ok);
                    }
                    Err(code) => container.process_response(code),
                }
            }
            Command::LeaveGame => {
                let Some(seat) = self.seat.take() else {
                    container.process_response(ResponseCode::ContextError);
                    return;
                };
                seat.forwarder.abort();
                seat.game.unregister_player_sender(seat.player_id).await;
                let ended = {
                    let mut game = seat.game.game.lock().await;
                    game.remove_player(seat.player_id)
                };
                touched_games.insert(seat.game_id);
                container.enqueue_game_event_public(seat.game_id, Event::Leave { player_id: seat.player_id });
                if ended {
                    container.enqueue_game_event_public(seat.game_id, Event::GameClosed);
                    self.state.remove_game(seat.game_id).await;
                }
                container.process_response(ResponseCode::Ok);
            }
            Command::ChatSay { channel, message } => {
                if !self.chat_channels.contains(&channel) {
                    container.process_response(ResponseCode::ContextError);
                    return;
                }
                self.state.with_chat_channel(&channel, |c| c.say(&self.player_name, &message)).await;
                container.process_response(ResponseCode::Ok);
            }
            Command::ChatJoinChannel { channel } => {
                let users = self
                    .state
                    .with_chat_channel(&channel, |c| {
                        c.join(self.connection_id, self.player_name.clone(), self.outbound_tx.clone());
                        c.users()
                    })
                    .await;
                self.chat_channels.push(channel.clone());
                let _ = self.outbound_tx.send(Event::ChatListPlayers { channel, users }.to_item()).await;
                container.process_response(ResponseCode::Ok);
            }
            Command::ChatLeaveChannel { channel } => {
                self.state.with_chat_channel(&channel, |c| c.leave(self.connection_id)).await;
                self.chat_channels.retain(|c| c != &channel);
                container.process_response(ResponseCode::Ok);
            }
            Command::ReadyStart => self.in_game(container, touched_games, |game, player_id, container| game.ready_start(player_id, container)).await,
            Command::Concede => self.in_game(container, touched_games, |game, player_id, container| game.concede(player_id, container)).await,
            Command::DrawCards { count } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.draw_cards(player_id, count, container)).await
            }
            Command::MoveCard { card_id, target_zone, x, y } => {
                self.in_game(container, touched_games, move |game, player_id, container| {
                    game.move_card(player_id, card_id, &target_zone, x, y, container)
                })
                .await
            }
            Command::CreateCounter { name, color, value } => {
                self.in_game(container, touched_games, move |game, player_id, container| {
                    game.create_counter(player_id, &name, color, value, container)
                })
                .await
            }
            Command::DeleteCounter { counter_id } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.delete_counter(player_id, counter_id, container)).await
            }
            Command::SetCounter { counter_id, value } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.set_counter(player_id, counter_id, value, container)).await
            }
            Command::CreateArrow { from_card, to_card, color } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.create_arrow(player_id, from_card, to_card, color, container))
                    .await
            }
            Command::DeleteArrow { arrow_id } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.delete_arrow(player_id, arrow_id, container)).await
            }
            Command::DumpZone { player_id: target_player, zone } => {
                let Some(seat) = &self.seat else {
                    container.process_response(ResponseCode::ContextError);
                    return;
                };
                let game = seat.game.game.lock().await;
                match game.dump_zone(seat.player_id, target_player, &zone) {
                    Ok(zone) => {
                        container.process_response(ResponseCode::Ok);
                        container.set_response_payload(ResponsePayload::ZoneDump { zone });
                    }
                    Err(code) => container.process_response(code),
                }
            }
            Command::KickFromGame { player_id: target } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.kick_from_game(player_id, target, container)).await
            }
            Command::NextPhase => self.in_game(container, touched_games, |game, player_id, container| game.next_phase(player_id, container)).await,
            Command::SetActivePlayer { player_id: target } => {
                self.in_game(container, touched_games, move |game, player_id, container| game.set_active_player(player_id, target, container)).await
            }
        }
    }

    /// Runs `f` against the game this connection is seated in, recording
    /// the response code and noting the game as touched so its private
    /// events get flushed. `ResponseCode::ContextError` if not seated
    /// anywhere (§4.4 "commands outside a game are rejected").
    async fn in_game(&self, container: &mut CommandContainer, touched_games: &mut HashSet<i32>, f: impl FnOnce(&mut game_core::Game, i32, &mut CommandContainer) -> ResponseCode) {
        let Some(seat) = &self.seat else {
            container.process_response(ResponseCode::ContextError);
            return;
        };
        let mut game = seat.game.game.lock().await;
        let code = f(&mut game, seat.player_id, container);
        touched_games.insert(seat.game_id);
        container.process_response(code);
    }

    async fn seat_into(&mut self, session: Arc<GameSession>, game_id: i32, player_id: i32, container: &mut CommandContainer, touched_games: &mut HashSet<i32>) {
        session.register_player_sender(player_id, self.outbound_tx.clone()).await;
        let forwarder = spawn_forwarder(session.public_tx.subscribe(), self.outbound_tx.clone());
        let (props, all_props, game_info) = {
            let game = session.game.lock().await;
            (
                game.player_properties(player_id).unwrap_or(protocol::ServerInfoPlayerProperties {
                    player_id,
                    player_name: self.player_name.clone(),
                    spectator: false,
                    conceded: false,
                    ready_start: false,
                    deck_id: -1,
                }),
                game.all_player_properties(),
                game.to_server_info(),
            )
        };
        touched_games.insert(game_id);
        container.enqueue_game_event_public(game_id, Event::Join { player: props });
        container.enqueue_game_event_private(game_id, player_id, Event::GameJoined { game: game_info, players: all_props });
        self.seat = Some(Seat { game: session, game_id, player_id, forwarder });
    }

    async fn cleanup(&mut self) {
        self.state.leave_all_chat_channels(self.connection_id).await;
        let Some(seat) = self.seat.take() else { return };
        seat.forwarder.abort();
        seat.game.unregister_player_sender(seat.player_id).await;
        let outcome = {
            let mut game = seat.game.game.lock().await;
            let outcome = game.disconnect_player(seat.player_id);
            if !matches!(outcome, DisconnectOutcome::Removed) {
                if let Some(props) = game.player_properties(seat.player_id) {
                    let _ = seat.game.public_tx.send(Event::PlayerPropertiesChanged { player: props }.to_item());
                }
            }
            if matches!(outcome, DisconnectOutcome::GameEnded) {
                let _ = seat.game.public_tx.send(Event::GameClosed.to_item());
            }
            outcome
        };
        if matches!(outcome, DisconnectOutcome::GameEnded) {
            self.state.remove_game(seat.game_id).await;
        }
    }
}

//! C2 — the concrete protocol vocabulary built on top of [`crate::item`]:
//! commands clients send, responses and events the server sends back, and
//! the [`CommandContainer`]/[`GameEventContainer`] envelopes that carry a
//! command's three-lane fan-out (§4.2: one correlated response, one public
//! event stream, one private event stream per addressee).
//!
//! `ItemId` is a dispatch key only — it never rides on the wire itself, the
//! wire tag is always the `(item_type, item_sub_type)` pair on the
//! underlying [`Item`]. It exists so `server` can `match` on a command
//! without restringing tag names everywhere.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::decklist::DeckList;
use crate::item::{AttrValue, Item};
use crate::registry::ItemRegistry;
use crate::server_info::{
    ServerInfoArrow, ServerInfoChatChannel, ServerInfoChatUser, ServerInfoCounter, ServerInfoGame,
    ServerInfoPlayerPing, ServerInfoPlayerProperties, ServerInfoZone,
};

/// Every known `(item_type, item_sub_type)` pair, registered once at
/// startup. Mirrors the original server's `initializeHash` (§4.2) — a
/// duplicate entry here is a programmer error and panics via
/// [`ItemRegistry::register`].
pub fn register_known_items(registry: &mut ItemRegistry) {
    let commands: &[&str] = &[
        "hello",
        "deck_upload",
        "deck_select",
        "deck_list_dir",
        "deck_new_dir",
        "deck_delete",
        "list_games",
        "create_game",
        "join_game",
        "leave_game",
        "chat_say",
        "chat_join_channel",
        "chat_leave_channel",
        "ready_start",
        "concede",
        "draw_cards",
        "move_card",
        "create_counter",
        "delete_counter",
        "set_counter",
        "create_arrow",
        "delete_arrow",
        "dump_zone",
        "kick_from_game",
        "next_phase",
        "set_active_player",
    ];
    for c in commands {
        registry.register("command", c);
    }

    registry.register("cmd_container", "");
    registry.register("event_container", "");
    registry.register("response", "");
    registry.register("response", "deck_download");
    registry.register("response", "deck_uploaded");
    registry.register("response", "deck_list_dir");
    registry.register("response", "dump_zone");

    let events: &[&str] = &[
        "welcome",
        "join",
        "leave",
        "game_joined",
        "chat_join_channel",
        "chat_leave_channel",
        "chat_say",
        "chat_list_players",
        "list_games",
        "game_started",
        "game_closed",
        "set_active_player",
        "set_active_phase",
        "player_properties_changed",
        "draw_cards",
        "create_counters",
        "set_counter",
        "delete_counter",
        "create_arrows",
        "delete_arrow",
        "move_card",
        "game_state",
        "ping",
        "kicked",
    ];
    for e in events {
        registry.register("event", e);
    }

    for tag in ["zone", "card", "counter", "arrow", "player_properties", "chat_channel", "chat_user", "game", "player_ping"] {
        registry.register(tag, "");
    }

    registry.register("deck_list", "");
    registry.register("deck_zone", "");
    registry.register("deck_card", "");
    registry.register("deck_dir_folder", "");
    registry.register("deck_dir_file", "");
}

/// Response codes a command handler can return instead of a success payload
/// (§6 "Response codes"). Not an error type in the Rust sense — rejecting a
/// command is an ordinary, expected outcome, so handlers return
/// `Result<CommandOutcome, ResponseCode>` rather than anything `std::error`
/// flavored. Encoded on the wire as lowercase tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Ok,
    Invalid,
    NameNotFound,
    Login,
    ContextError,
    Wrong,
    SpectatorsNotAllowed,
    OnlyBuddies,
    UserLevelTooLow,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseCode::Ok => "ok",
            ResponseCode::Invalid => "invalid",
            ResponseCode::NameNotFound => "name_not_found",
            ResponseCode::Login => "login",
            ResponseCode::ContextError => "context_error",
            ResponseCode::Wrong => "wrong",
            ResponseCode::SpectatorsNotAllowed => "spectators_not_allowed",
            ResponseCode::OnlyBuddies => "only_buddies",
            ResponseCode::UserLevelTooLow => "user_level_too_low",
        };
        f.write_str(s)
    }
}

impl FromStr for ResponseCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ok" => ResponseCode::Ok,
            "invalid" => ResponseCode::Invalid,
            "name_not_found" => ResponseCode::NameNotFound,
            "login" => ResponseCode::Login,
            "context_error" => ResponseCode::ContextError,
            "wrong" => ResponseCode::Wrong,
            "spectators_not_allowed" => ResponseCode::SpectatorsNotAllowed,
            "only_buddies" => ResponseCode::OnlyBuddies,
            "user_level_too_low" => ResponseCode::UserLevelTooLow,
            _ => return Err(()),
        })
    }
}

/// A command arriving on a connection, already parsed out of its wire
/// `Item` (§4.2, §6's command list). `channel`/`game_id` context that the
/// original left embedded on the shared `CommandContainer` scratch state
/// lives here instead, resolved by the handler before dispatch (§9 Open
/// Questions — this is the corrected placement).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// The first message every connection must send (§6 "Protocol version").
    /// The server replies with [`Event::Welcome`] and closes the connection
    /// if `protocol_version` does not match [`crate::PROTOCOL_VERSION`].
    Hello { protocol_version: i32, player_name: String },
    DeckUpload { deck: DeckList, name: String },
    DeckSelect { deck_id: String },
    DeckListDir { path: String },
    DeckNewDir { path: String, name: String },
    DeckDelete { id: String },
    ListGames,
    CreateGame { description: String, password: Option<String>, max_players: i32, spectators_allowed: bool },
    JoinGame { game_id: i32, password: Option<String>, spectator: bool },
    LeaveGame,
    ChatSay { channel: String, message: String },
    ChatJoinChannel { channel: String },
    ChatLeaveChannel { channel: String },
    ReadyStart,
    Concede,
    DrawCards { count: i32 },
    MoveCard { card_id: i32, target_zone: String, x: i32, y: i32 },
    CreateCounter { name: String, color: crate::item::Color, value: i32 },
    DeleteCounter { counter_id: i32 },
    SetCounter { counter_id: i32, value: i32 },
    CreateArrow { from_card: i32, to_card: i32, color: crate::item::Color },
    DeleteArrow { arrow_id: i32 },
    DumpZone { player_id: i32, zone: String },
    KickFromGame { player_id: i32 },
    /// Advances `active_phase` by one (§4.4 "Active-player/phase advance is
    /// a client-issued game command"). The server validates the issuer is
    /// the current active player (or an admin) before applying it.
    NextPhase,
    /// Hands the active-player marker to `player_id` (the other half of
    /// §4.4's active-player/phase advance).
    SetActivePlayer { player_id: i32 },
}

impl Command {
    /// Parses a generic [`Item`] into a concrete command. Returns `None`
    /// for an `Invalid` sentinel or an unrecognized `item_sub_type` — the
    /// caller (C7) turns that into `ResponseCode::Invalid`.
    pub fn from_item(item: &Item) -> Option<Command> {
        if item.is_invalid || item.item_type != "command" {
            return None;
        }
        Some(match item.item_sub_type.as_str() {
            "hello" => Command::Hello {
                protocol_version: item.get_int("protocol_version"),
                player_name: item.get_str("player_name").to_string(),
            },
            "deck_upload" => Command::DeckUpload {
                deck: item.get_child("deck").map(DeckList::from_item).unwrap_or_default(),
                name: item.get_str("name").to_string(),
            },
            "deck_select" => Command::DeckSelect {
                deck_id: item.get_str("deck_id").to_string(),
            },
            "deck_list_dir" => Command::DeckListDir {
                path: item.get_str("path").to_string(),
            },
            "deck_new_dir" => Command::DeckNewDir {
                path: item.get_str("path").to_string(),
                name: item.get_str("name").to_string(),
            },
            "deck_delete" => Command::DeckDelete {
                id: item.get_str("id").to_string(),
            },
            "list_games" => Command::ListGames,
            "create_game" => Command::CreateGame {
                description: item.get_str("description").to_string(),
                password: optional_str(item, "password"),
                max_players: item.get_int("max_players"),
                spectators_allowed: item.get_bool("spectators_allowed"),
            },
            "join_game" => Command::JoinGame {
                game_id: item.get_int("game_id"),
                password: optional_str(item, "password"),
                spectator: item.get_bool("spectator"),
            },
            "leave_game" => Command::LeaveGame,
            "chat_say" => Command::ChatSay {
                channel: item.get_str("channel").to_string(),
                message: item.get_str("message").to_string(),
            },
            "chat_join_channel" => Command::ChatJoinChannel {
                channel: item.get_str("channel").to_string(),
            },
            "chat_leave_channel" => Command::ChatLeaveChannel {
                channel: item.get_str("channel").to_string(),
            },
            "ready_start" => Command::ReadyStart,
            "concede" => Command::Concede,
            "draw_cards" => Command::DrawCards {
                count: item.get_int("count"),
            },
            "move_card" => Command::MoveCard {
                card_id: item.get_int("card_id"),
                target_zone: item.get_str("target_zone").to_string(),
                x: item.get_int("x"),
                y: item.get_int("y"),
            },
            "create_counter" => Command::CreateCounter {
                name: item.get_str("name").to_string(),
                color: item.get_color("color"),
                value: item.get_int("value"),
            },
            "delete_counter" => Command::DeleteCounter {
                counter_id: item.get_int("counter_id"),
            },
            "set_counter" => Command::SetCounter {
                counter_id: item.get_int("counter_id"),
                value: item.get_int("value"),
            },
            "create_arrow" => Command::CreateArrow {
                from_card: item.get_int("from_card"),
                to_card: item.get_int("to_card"),
                color: item.get_color("color"),
            },
            "delete_arrow" => Command::DeleteArrow {
                arrow_id: item.get_int("arrow_id"),
            },
            "dump_zone" => Command::DumpZone {
                player_id: item.get_int("player_id"),
                zone: item.get_str("zone").to_string(),
            },
            "kick_from_game" => Command::KickFromGame {
                player_id: item.get_int("player_id"),
            },
            "next_phase" => Command::NextPhase,
            "set_active_player" => Command::SetActivePlayer {
                player_id: item.get_int("player_id"),
            },
            _ => return None,
        })
    }
}

impl Command {
    /// Encodes a command back into wire shape — the inverse of
    /// [`Command::from_item`], used by tests to exercise the round-trip law
    /// and by anything that needs to replay a command (e.g. the in-process
    /// test harness in `game-core`).
    pub fn to_item(&self) -> Item {
        match self {
            Command::Hello { protocol_version, player_name } => Item::new("command", "hello")
                .with_int("protocol_version", *protocol_version)
                .with_str("player_name", player_name.clone()),
            Command::DeckUpload { deck, name } => Item::new("command", "deck_upload")
                .with_child("deck", deck.to_item())
                .with_str("name", name.clone()),
            Command::DeckSelect { deck_id } => Item::new("command", "deck_select").with_str("deck_id", deck_id.clone()),
            Command::DeckListDir { path } => Item::new("command", "deck_list_dir").with_str("path", path.clone()),
            Command::DeckNewDir { path, name } => Item::new("command", "deck_new_dir")
                .with_str("path", path.clone())
                .with_str("name", name.clone()),
            Command::DeckDelete { id } => Item::new("command", "deck_delete").with_str("id", id.clone()),
            Command::ListGames => Item::new("command", "list_games"),
            Command::CreateGame { description, password, max_players, spectators_allowed } => {
                let mut item = Item::new("command", "create_game")
                    .with_str("description", description.clone())
                    .with_int("max_players", *max_players)
                    .with_bool("spectators_allowed", *spectators_allowed);
                if let Some(p) = password {
                    item = item.with_str("password", p.clone());
                }
                item
            }
            Command::JoinGame { game_id, password, spectator } => {
                let mut item = Item::new("command", "join_game")
                    .with_int("game_id", *game_id)
                    .with_bool("spectator", *spectator);
                if let Some(p) = password {
                    item = item.with_str("password", p.clone());
                }
                item
            }
            Command::LeaveGame => Item::new("command", "leave_game"),
            Command::ChatSay { channel, message } => Item::new("command", "chat_say")
                .with_str("channel", channel.clone())
                .with_str("message", message.clone()),
            Command::ChatJoinChannel { channel } => Item::new("command", "chat_join_channel").with_str("channel", channel.clone()),
            Command::ChatLeaveChannel { channel } => Item::new("command", "chat_leave_channel").with_str("channel", channel.clone()),
            Command::ReadyStart => Item::new("command", "ready_start"),
            Command::Concede => Item::new("command", "concede"),
            Command::DrawCards { count } => Item::new("command", "draw_cards").with_int("count", *count),
            Command::MoveCard { card_id, target_zone, x, y } => Item::new("command", "move_card")
                .with_int("card_id", *card_id)
                .with_str("target_zone", target_zone.clone())
                .with_int("x", *x)
                .with_int("y", *y),
            Command::CreateCounter { name, color, value } => Item::new("command", "create_counter")
                .with_str("name", name.clone())
                .with_color("color", *color)
                .with_int("value", *value),
            Command::DeleteCounter { counter_id } => Item::new("command", "delete_counter").with_int("counter_id", *counter_id),
            Command::SetCounter { counter_id, value } => Item::new("command", "set_counter")
                .with_int("counter_id", *counter_id)
                .with_int("value", *value),
            Command::CreateArrow { from_card, to_card, color } => Item::new("command", "create_arrow")
                .with_int("from_card", *from_card)
                .with_int("to_card", *to_card)
                .with_color("color", *color),
            Command::DeleteArrow { arrow_id } => Item::new("command", "delete_arrow").with_int("arrow_id", *arrow_id),
            Command::DumpZone { player_id, zone } => Item::new("command", "dump_zone")
                .with_int("player_id", *player_id)
                .with_str("zone", zone.clone()),
            Command::KickFromGame { player_id } => Item::new("command", "kick_from_game").with_int("player_id", *player_id),
            Command::NextPhase => Item::new("command", "next_phase"),
            Command::SetActivePlayer { player_id } => Item::new("command", "set_active_player").with_int("player_id", *player_id),
        }
    }
}

/// The wire envelope a client sends: one or more commands sharing a single
/// `cmd_id` for response correlation (§3 `CommandContainer`, §6
/// "`cmd_id` echo"). Kept distinct from the in-process [`CommandContainer`]
/// scratch state, which only exists on the server side while a request is
/// being processed (§9 Open Questions — the relocation this spec pins).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEnvelope {
    pub cmd_id: i32,
    pub commands: Vec<Command>,
}

impl ClientEnvelope {
    pub fn to_item(&self) -> Item {
        Item::new("cmd_container", "")
            .with_int("cmd_id", self.cmd_id)
            .with_list("commands", self.commands.iter().map(Command::to_item).collect())
    }

    /// Parses the envelope; individual commands that fail to parse (unknown
    /// subtype or `Invalid` sentinel) are dropped rather than aborting the
    /// whole envelope — the dispatcher below replies `RespInvalid` for a
    /// completely empty result the same way it would for one bad command
    /// (§7 "unknown item id -> RespInvalid, connection kept").
    pub fn from_item(item: &Item) -> ClientEnvelope {
        ClientEnvelope {
            cmd_id: item.get_int("cmd_id"),
            commands: item.get_list("commands").iter().filter_map(Command::from_item).collect(),
        }
    }
}

/// Encodes the single correlated response an envelope produces (§4.2, §8
/// "Response correlation"). A response carrying a payload reuses the
/// payload's own `(item_type, item_sub_type)` — its own tag already
/// identifies what it is — and just adds `cmd_id`/`response_code` to it;
/// a plain `Ok`/error response has no payload and uses the generic
/// `("response", "")` tag.
pub fn encode_response(cmd_id: i32, code: ResponseCode, payload: &ResponsePayload) -> Item {
    let mut item = payload.to_item().unwrap_or_else(|| Item::new("response", ""));
    item.attributes.push(("cmd_id".to_string(), crate::item::AttrValue::Int(cmd_id)));
    item.attributes.push(("response_code".to_string(), crate::item::AttrValue::Str(code.to_string())));
    item
}

/// Encodes one game's event fan-out for one audience as a single wire
/// element (§4.2 `GameEventContainer`, §8 "event atomicity" — delivered to
/// a recipient as one element or not at all). `context` is the optional
/// machine-readable cause tag (e.g. `"undo draw"`).
pub fn encode_event_container(game_id: i32, context: Option<&str>, events: &GameEventContainer) -> Item {
    let mut item = Item::new("event_container", "")
        .with_int("game_id", game_id)
        .with_list("events", events.events.iter().map(Event::to_item).collect());
    if let Some(ctx) = context {
        item = item.with_str("context", ctx);
    }
    item
}

fn optional_str(item: &Item, name: &str) -> Option<String> {
    let s = item.get_str(name);
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// The event payloads a game session can emit (§4.2, §6). Each variant
/// carries exactly the `ServerInfo_*` records it needs; [`GameEventContext`]
/// supplies the game/player framing the original attached separately.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Sent once, immediately after a connection's [`Command::Hello`] is
    /// read, advertising [`crate::PROTOCOL_VERSION`] (§6). `accepted` is
    /// `false` when the client's version did not match — the connection is
    /// closed right after this event is flushed.
    Welcome { protocol_version: i32, accepted: bool },
    Join { player: ServerInfoPlayerProperties },
    Leave { player_id: i32 },
    GameJoined { game: ServerInfoGame, players: Vec<ServerInfoPlayerProperties> },
    ChatJoinChannel { channel: ServerInfoChatChannel, user: ServerInfoChatUser },
    ChatLeaveChannel { channel: String, user: ServerInfoChatUser },
    /// Sent to a joining member only, right after it is added to the
    /// channel's member list: the full current roster, so the joiner learns
    /// who else is already present (§6).
    ChatListPlayers { channel: String, users: Vec<ServerInfoChatUser> },
    ChatSay { channel: String, user: ServerInfoChatUser, message: String },
    ListGames { games: Vec<ServerInfoGame> },
    GameStarted,
    GameClosed,
    SetActivePlayer { player_id: i32 },
    SetActivePhase { phase: i32 },
    PlayerPropertiesChanged { player: ServerInfoPlayerProperties },
    DrawCards { player_id: i32, cards: Vec<crate::server_info::ServerInfoCard> },
    CreateCounters { player_id: i32, counters: Vec<ServerInfoCounter> },
    SetCounter { player_id: i32, counter_id: i32, value: i32 },
    DeleteCounter { player_id: i32, counter_id: i32 },
    CreateArrows { player_id: i32, arrows: Vec<ServerInfoArrow> },
    DeleteArrow { player_id: i32, arrow_id: i32 },
    MoveCard { player_id: i32, card_id: i32, target_zone: String, x: i32, y: i32 },
    GameState { zones: Vec<ServerInfoZone> },
    /// Carries one ping-time entry per seat the accept loop has measured
    /// (§3 supplement) — the core only stores/forwards these, it never
    /// measures latency itself (that's an external-interface concern, §1).
    Ping { pings: Vec<ServerInfoPlayerPing> },
    Kicked { player_id: i32 },
}

impl Event {
    pub fn to_item(&self) -> Item {
        match self {
            Event::Welcome { protocol_version, accepted } => Item::new("event", "welcome")
                .with_int("protocol_version", *protocol_version)
                .with_bool("accepted", *accepted),
            Event::Join { player } => Item::new("event", "join").with_child("player", player.to_item()),
            Event::Leave { player_id } => Item::new("event", "leave").with_int("player_id", *player_id),
            Event::GameJoined { game, players } => Item::new("event", "game_joined")
                .with_child("game", game.to_item())
                .with_list("players", players.iter().map(ServerInfoPlayerProperties::to_item).collect()),
            Event::ChatJoinChannel { channel, user } => Item::new("event", "chat_join_channel")
                .with_child("channel", channel.to_item())
                .with_child("user", user.to_item()),
            Event::ChatLeaveChannel { channel, user } => Item::new("event", "chat_leave_channel")
                .with_str("channel", channel.clone())
                .with_child("user", user.to_item()),
            Event::ChatSay { channel, user, message } => Item::new("event", "chat_say")
                .with_str("channel", channel.clone())
                .with_child("user", user.to_item())
                .with_str("message", message.clone()),
            Event::ChatListPlayers { channel, users } => Item::new("event", "chat_list_players")
                .with_str("channel", channel.clone())
                .with_list("users", users.iter().map(ServerInfoChatUser::to_item).collect()),
            Event::ListGames { games } => {
                Item::new("event", "list_games").with_list("games", games.iter().map(ServerInfoGame::to_item).collect())
            }
            Event::GameStarted => Item::new("event", "game_started"),
            Event::GameClosed => Item::new("event", "game_closed"),
            Event::SetActivePlayer { player_id } => Item::new("event", "set_active_player").with_int("player_id", *player_id),
            Event::SetActivePhase { phase } => Item::new("event", "set_active_phase").with_int("phase", *phase),
            Event::PlayerPropertiesChanged { player } => {
                Item::new("event", "player_properties_changed").with_child("player", player.to_item())
            }
            Event::DrawCards { player_id, cards } => Item::new("event", "draw_cards")
                .with_int("player_id", *player_id)
                .with_list("cards", cards.iter().map(|c| c.to_item()).collect()),
            Event::CreateCounters { player_id, counters } => Item::new("event", "create_counters")
                .with_int("player_id", *player_id)
                .with_list("counters", counters.iter().map(ServerInfoCounter::to_item).collect()),
            Event::SetCounter { player_id, counter_id, value } => Item::new("event", "set_counter")
                .with_int("player_id", *player_id)
                .with_int("counter_id", *counter_id)
                .with_int("value", *value),
            Event::DeleteCounter { player_id, counter_id } => Item::new("event", "delete_counter")
                .with_int("player_id", *player_id)
                .with_int("counter_id", *counter_id),
            Event::CreateArrows { player_id, arrows } => Item::new("event", "create_arrows")
                .with_int("player_id", *player_id)
                .with_list("arrows", arrows.iter().map(ServerInfoArrow::to_item).collect()),
            Event::DeleteArrow { player_id, arrow_id } => Item::new("event", "delete_arrow")
                .with_int("player_id", *player_id)
                .with_int("arrow_id", *arrow_id),
            Event::MoveCard { player_id, card_id, target_zone, x, y } => Item::new("event", "move_card")
                .with_int("player_id", *player_id)
                .with_int("card_id", *card_id)
                .with_str("target_zone", target_zone.clone())
                .with_int("x", *x)
                .with_int("y", *y),
            Event::GameState { zones } => {
                Item::new("event", "game_state").with_list("zones", zones.iter().map(ServerInfoZone::to_item).collect())
            }
            Event::Ping { pings } => {
                Item::new("event", "ping").with_list("pings", pings.iter().map(ServerInfoPlayerPing::to_item).collect())
            }
            Event::Kicked { player_id } => Item::new("event", "kicked").with_int("player_id", *player_id),
        }
    }
}

/// Who an event is addressed to within a game (§4.2 "two lanes: public,
/// seen by everyone at the table, and private, seen only by its
/// addressee").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAudience {
    Public,
    Private(i32),
}

/// The per-recipient framing a raw [`Event`] needs before it leaves the
/// game: which game it belongs to and who (if anyone) it is private to.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEventContext {
    pub game_id: i32,
    pub audience: EventAudience,
}

/// A batch of events destined for one audience within one game. The
/// original's `GameEventContainer` bundles multiple events raised by a
/// single command into one wire message so recipients apply them
/// atomically (§4.2, §8 "per recipient, atomically").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameEventContainer {
    pub events: Vec<Event>,
}

impl GameEventContainer {
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn to_item(&self) -> Item {
        Item::new("event_container", "").with_list("events", self.events.iter().map(Event::to_item).collect())
    }
}

/// The payload a specific response carries alongside its [`ResponseCode`]
/// (§3 "Specific responses carry a payload"). Most responses carry none.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    None,
    /// The fresh opaque id a `deck_upload` command is assigned (§8 scenario
    /// 1: "expect a response carrying a fresh file id").
    DeckUploaded { id: String },
    DeckDownload { deck: DeckList },
    DeckDirectory { root: crate::decklist::DeckDirEntry },
    ZoneDump { zone: ServerInfoZone },
}

impl ResponsePayload {
    pub fn to_item(&self) -> Option<Item> {
        match self {
            ResponsePayload::None => None,
            ResponsePayload::DeckUploaded { id } => Some(Item::new("response", "deck_uploaded").with_str("id", id.clone())),
            ResponsePayload::DeckDownload { deck } => Some(Item::new("response", "deck_download").with_child("deck", deck.to_item())),
            ResponsePayload::DeckDirectory { root } => Some(Item::new("response", "deck_list_dir").with_child("root", root.to_item())),
            ResponsePayload::ZoneDump { zone } => Some(Item::new("response", "dump_zone").with_child("zone", zone.to_item())),
        }
    }
}

/// Everything one command produces: a correlated response plus a public
/// and (per recipient) private event fan-out, keyed by game (§4.2).
///
/// `process_response` encodes the original's precedence rule: the first
/// non-`Ok` response wins and nothing later can overwrite it, so a handler
/// made of several fallible steps can fail early without losing the
/// specific reason.
#[derive(Debug, Default)]
pub struct CommandContainer {
    response: Option<ResponseCode>,
    payload: Option<ResponsePayload>,
    public_events: HashMap<i32, GameEventContainer>,
    private_events: HashMap<i32, HashMap<i32, GameEventContainer>>,
}

impl CommandContainer {
    pub fn new() -> Self {
        CommandContainer::default()
    }

    /// "If no response is set yet, or the current response is `Ok`, replace
    /// it with `r`. Otherwise keep the first non-`Ok` response" (§4.2).
    pub fn process_response(&mut self, r: ResponseCode) {
        match self.response {
            None => self.response = Some(r),
            Some(ResponseCode::Ok) => self.response = Some(r),
            Some(_) => {}
        }
    }

    pub fn response(&self) -> ResponseCode {
        self.response.unwrap_or(ResponseCode::Ok)
    }

    /// Attaches a payload to the eventual response. Only meaningful when
    /// the final response code is `Ok` — a rejected command's payload is
    /// never inspected by the caller.
    pub fn set_response_payload(&mut self, payload: ResponsePayload) {
        self.payload = Some(payload);
    }

    pub fn response_payload(&self) -> &ResponsePayload {
        self.payload.as_ref().unwrap_or(&ResponsePayload::None)
    }

    pub fn enqueue_game_event_public(&mut self, game_id: i32, event: Event) {
        self.public_events.entry(game_id).or_default().push(event);
    }

    pub fn enqueue_game_event_private(&mut self, game_id: i32, player_id: i32, event: Event) {
        self.private_events
            .entry(game_id)
            .or_default()
            .entry(player_id)
            .or_default()
            .push(event);
    }

    pub fn public_events(&self) -> impl Iterator<Item = (i32, &GameEventContainer)> {
        self.public_events.iter().map(|(id, c)| (*id, c))
    }

    pub fn private_events(&self, game_id: i32) -> impl Iterator<Item = (i32, &GameEventContainer)> {
        self.private_events
            .get(&game_id)
            .into_iter()
            .flat_map(|m| m.iter().map(|(id, c)| (*id, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_known_items_does_not_panic() {
        let mut reg = ItemRegistry::new();
        register_known_items(&mut reg);
        assert!(reg.is_known("command", "draw_cards"));
        assert!(reg.is_known("event", "game_state"));
    }

    #[test]
    fn response_code_tokens_round_trip() {
        for code in [
            ResponseCode::Ok,
            ResponseCode::Invalid,
            ResponseCode::NameNotFound,
            ResponseCode::Login,
            ResponseCode::ContextError,
            ResponseCode::Wrong,
            ResponseCode::SpectatorsNotAllowed,
            ResponseCode::OnlyBuddies,
            ResponseCode::UserLevelTooLow,
        ] {
            let token = code.to_string();
            assert_eq!(token.parse::<ResponseCode>().unwrap(), code);
        }
    }

    #[test]
    fn first_non_ok_response_sticks() {
        let mut container = CommandContainer::new();
        container.process_response(ResponseCode::Ok);
        container.process_response(ResponseCode::Wrong);
        container.process_response(ResponseCode::ContextError);
        assert_eq!(container.response(), ResponseCode::Wrong);
    }

    #[test]
    fn no_response_defaults_to_ok() {
        let container = CommandContainer::new();
        assert_eq!(container.response(), ResponseCode::Ok);
    }

    #[test]
    fn events_fan_out_by_game_and_audience() {
        let mut container = CommandContainer::new();
        container.enqueue_game_event_public(1, Event::GameStarted);
        container.enqueue_game_event_private(1, 7, Event::Leave { player_id: 7 });
        container.enqueue_game_event_private(1, 9, Event::Leave { player_id: 7 });

        let public: Vec<_> = container.public_events().collect();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].1.events.len(), 1);

        let private: Vec<_> = container.private_events(1).collect();
        assert_eq!(private.len(), 2);
    }

    #[test]
    fn response_payload_defaults_to_none() {
        let container = CommandContainer::new();
        assert_eq!(container.response_payload(), &ResponsePayload::None);
    }

    #[test]
    fn zone_dump_payload_encodes_to_item() {
        let mut container = CommandContainer::new();
        container.set_response_payload(ResponsePayload::ZoneDump {
            zone: ServerInfoZone {
                name: "hand".into(),
                cards: vec![],
            },
        });
        let item = container.response_payload().to_item().unwrap();
        assert_eq!(item.item_sub_type, "dump_zone");
    }

    #[test]
    fn command_parses_from_item_and_rejects_invalid() {
        let item = Item::new("command", "draw_cards").with_int("count", 3);
        assert_eq!(Command::from_item(&item), Some(Command::DrawCards { count: 3 }));

        let invalid = Item::invalid("command", "draw_cards");
        assert_eq!(Command::from_item(&invalid), None);

        let unknown_subtype = Item::new("command", "nonsense");
        assert_eq!(Command::from_item(&unknown_subtype), None);
    }

    #[test]
    fn hello_and_welcome_round_trip() {
        let hello = Command::Hello { protocol_version: 6, player_name: "alice".into() };
        assert_eq!(Command::from_item(&hello.to_item()), Some(hello));

        let welcome = Event::Welcome { protocol_version: 6, accepted: true };
        let item = welcome.to_item();
        assert_eq!(item.get_int("protocol_version"), 6);
        assert!(item.get_bool("accepted"));
    }

    #[test]
    fn command_round_trips_through_its_own_item_shape() {
        let commands = vec![
            Command::Hello { protocol_version: 6, player_name: "alice".into() },
            Command::ReadyStart,
            Command::DrawCards { count: 3 },
            Command::CreateArrow { from_card: 1, to_card: 2, color: crate::item::Color(255, 0, 0) },
            Command::NextPhase,
            Command::SetActivePlayer { player_id: 2 },
            Command::JoinGame { game_id: 4, password: Some("hunter2".into()), spectator: false },
        ];
        for cmd in commands {
            let item = cmd.to_item();
            assert_eq!(Command::from_item(&item), Some(cmd));
        }
    }

    #[test]
    fn client_envelope_round_trips_and_drops_unparseable_commands() {
        let envelope = ClientEnvelope {
            cmd_id: 42,
            commands: vec![Command::ReadyStart, Command::Concede],
        };
        let item = envelope.to_item();
        assert_eq!(ClientEnvelope::from_item(&item), envelope);

        let mut tampered = item;
        if let AttrValue::List(commands) = &mut tampered.attributes.iter_mut().find(|(n, _)| n == "commands").unwrap().1 {
            commands.push(Item::invalid("command", "garbage"));
        }
        let parsed = ClientEnvelope::from_item(&tampered);
        assert_eq!(parsed.commands.len(), 2);
    }

    #[test]
    fn encode_response_merges_cmd_id_and_code_onto_payload() {
        let item = encode_response(
            7,
            ResponseCode::Ok,
            &ResponsePayload::ZoneDump {
                zone: ServerInfoZone { name: "hand".into(), cards: vec![] },
            },
        );
        assert_eq!(item.item_sub_type, "dump_zone");
        assert_eq!(item.get_int("cmd_id"), 7);
        assert_eq!(item.get_str("response_code"), "ok");
    }

    #[test]
    fn chat_list_players_event_encodes_channel_and_roster() {
        let event = Event::ChatListPlayers {
            channel: "general".into(),
            users: vec![ServerInfoChatUser { name: "alice".into() }, ServerInfoChatUser { name: "bob".into() }],
        };
        let item = event.to_item();
        assert_eq!(item.item_sub_type, "chat_list_players");
        assert_eq!(item.get_str("channel"), "general");
        assert_eq!(item.get_list("users").len(), 2);
    }

    #[test]
    fn encode_event_container_carries_game_id_and_optional_context() {
        let mut events = GameEventContainer::default();
        events.push(Event::GameStarted);
        let item = encode_event_container(3, Some("undo draw"), &events);
        assert_eq!(item.get_int("game_id"), 3);
        assert_eq!(item.get_str("context"), "undo draw");
        assert_eq!(item.get_list("events").len(), 1);
    }
}

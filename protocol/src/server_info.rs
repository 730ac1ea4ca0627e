//! The small payload records carried inside responses and events: zones,
//! cards, counters, arrows, player properties, chat users/channels, game
//! listings and pings. These are plain data — the Qt-side "value types"
//! design note (§9) becomes plain records with an ordered attribute list
//! where order matters (e.g. zone card order) and no extra structure where
//! it does not.

use crate::item::{Color, Item};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoCard {
    pub id: i32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub tapped: bool,
    pub attacking: bool,
    pub counters: Vec<ServerInfoCounter>,
    pub annotation: String,
}

impl ServerInfoCard {
    pub fn to_item(&self) -> Item {
        let counters = self.counters.iter().map(ServerInfoCounter::to_item).collect();
        Item::new("card", "")
            .with_int("id", self.id)
            .with_str("name", self.name.clone())
            .with_int("x", self.x)
            .with_int("y", self.y)
            .with_bool("tapped", self.tapped)
            .with_bool("attacking", self.attacking)
            .with_list("counters", counters)
            .with_str("annotation", self.annotation.clone())
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoCard {
            id: item.get_int("id"),
            name: item.get_str("name").to_string(),
            x: item.get_int("x"),
            y: item.get_int("y"),
            tapped: item.get_bool("tapped"),
            attacking: item.get_bool("attacking"),
            counters: item.get_list("counters").iter().map(ServerInfoCounter::from_item).collect(),
            annotation: item.get_str("annotation").to_string(),
        }
    }

    /// A face-down view of the same card: every spectator sees a card
    /// occupies this slot, but not its identity (used for the public half
    /// of `draw_cards`, §8 scenario 3).
    pub fn face_down(id: i32) -> Self {
        ServerInfoCard {
            id,
            name: String::new(),
            x: 0,
            y: 0,
            tapped: false,
            attacking: false,
            counters: Vec::new(),
            annotation: String::new(),
        }
    }
}

/// A counter on a card or on a player's counter area (life, poison, storm,
/// ...). `radius` is a client display hint, carried through unused on the
/// server side (original_source `server_counter.h`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoCounter {
    pub id: i32,
    pub name: String,
    pub color: Color,
    pub radius: i32,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoArrow {
    pub id: i32,
    pub from_card: i32,
    pub to_card: i32,
    pub color: Color,
}

impl ServerInfoArrow {
    pub fn to_item(&self) -> Item {
        Item::new("arrow", "")
            .with_int("id", self.id)
            .with_int("from_card", self.from_card)
            .with_int("to_card", self.to_card)
            .with_color("color", self.color)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoArrow {
            id: item.get_int("id"),
            from_card: item.get_int("from_card"),
            to_card: item.get_int("to_card"),
            color: item.get_color("color"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoPlayerProperties {
    pub player_id: i32,
    pub player_name: String,
    pub spectator: bool,
    pub conceded: bool,
    pub ready_start: bool,
    pub deck_id: i32,
}

impl ServerInfoPlayerProperties {
    pub fn to_item(&self) -> Item {
        Item::new("player_properties", "")
            .with_int("player_id", self.player_id)
            .with_str("player_name", self.player_name.clone())
            .with_bool("spectator", self.spectator)
            .with_bool("conceded", self.conceded)
            .with_bool("ready_start", self.ready_start)
            .with_int("deck_id", self.deck_id)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoPlayerProperties {
            player_id: item.get_int("player_id"),
            player_name: item.get_str("player_name").to_string(),
            spectator: item.get_bool("spectator"),
            conceded: item.get_bool("conceded"),
            ready_start: item.get_bool("ready_start"),
            deck_id: item.get_int("deck_id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoChatChannel {
    pub name: String,
    pub description: String,
    pub user_count: i32,
    pub auto_join: bool,
}

impl ServerInfoChatChannel {
    pub fn to_item(&self) -> Item {
        Item::new("chat_channel", "")
            .with_str("name", self.name.clone())
            .with_str("description", self.description.clone())
            .with_int("user_count", self.user_count)
            .with_bool("auto_join", self.auto_join)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoChatChannel {
            name: item.get_str("name").to_string(),
            description: item.get_str("description").to_string(),
            user_count: item.get_int("user_count"),
            auto_join: item.get_bool("auto_join"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoChatUser {
    pub name: String,
}

impl ServerInfoChatUser {
    pub fn to_item(&self) -> Item {
        Item::new("chat_user", "").with_str("name", self.name.clone())
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoChatUser {
            name: item.get_str("name").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoGame {
    pub game_id: i32,
    pub description: String,
    pub creator_name: String,
    pub has_password: bool,
    pub spectators_allowed: bool,
    pub player_count: i32,
    pub max_players: i32,
    pub started: bool,
}

impl ServerInfoGame {
    pub fn to_item(&self) -> Item {
        Item::new("game", "")
            .with_int("game_id", self.game_id)
            .with_str("description", self.description.clone())
            .with_str("creator_name", self.creator_name.clone())
            .with_bool("has_password", self.has_password)
            .with_bool("spectators_allowed", self.spectators_allowed)
            .with_int("player_count", self.player_count)
            .with_int("max_players", self.max_players)
            .with_bool("started", self.started)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoGame {
            game_id: item.get_int("game_id"),
            description: item.get_str("description").to_string(),
            creator_name: item.get_str("creator_name").to_string(),
            has_password: item.get_bool("has_password"),
            spectators_allowed: item.get_bool("spectators_allowed"),
            player_count: item.get_int("player_count"),
            max_players: item.get_int("max_players"),
            started: item.get_bool("started"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfoPlayerPing {
    pub player_id: i32,
    pub ping_time_ms: i32,
}

impl ServerInfoPlayerPing {
    pub fn to_item(&self) -> Item {
        Item::new("player_ping", "")
            .with_int("player_id", self.player_id)
            .with_int("ping_time_ms", self.ping_time_ms)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoPlayerPing {
            player_id: item.get_int("player_id"),
            ping_time_ms: item.get_int("ping_time_ms"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoZone {
    pub name: String,
    pub cards: Vec<ServerInfoCard>,
}

impl ServerInfoZone {
    pub fn to_item(&self) -> Item {
        let cards = self.cards.iter().map(ServerInfoCard::to_item).collect();
        Item::new("zone", "").with_str("name", self.name.clone()).with_list("cards", cards)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoZone {
            name: item.get_str("name").to_string(),
            cards: item.get_list("cards").iter().map(ServerInfoCard::from_item).collect(),
        }
    }
}

impl ServerInfoCounter {
    pub fn to_item(&self) -> Item {
        Item::new("counter", "")
            .with_int("id", self.id)
            .with_str("name", self.name.clone())
            .with_color("color", self.color)
            .with_int("radius", self.radius)
            .with_int("value", self.value)
    }

    pub fn from_item(item: &Item) -> Self {
        ServerInfoCounter {
            id: item.get_int("id"),
            name: item.get_str("name").to_string(),
            color: item.get_color("color"),
            radius: item.get_int("radius"),
            value: item.get_int("value"),
        }
    }
}

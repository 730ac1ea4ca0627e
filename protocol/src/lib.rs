//! Protocol layer: the self-describing item tree (§4.1), the framer
//! boundary it rides over (§6), the deck list and vocabulary built on top
//! (§4.2, §3), and a process-wide registry of known tags.

pub mod decklist;
pub mod framer;
pub mod item;
pub mod registry;
pub mod server_info;
pub mod vocabulary;

pub use decklist::{DeckCardEntry, DeckDirEntry, DeckFileInfo, DeckFolder, DeckList, DeckZoneGroup};
pub use framer::{decode_item, encode_item, item_from_tokens, item_to_tokens, Framer, FramerToken, PrimKind, VecFramer};
pub use item::{AttrValue, Color, DecodeError, Item};
pub use registry::ItemRegistry;
pub use server_info::{
    ServerInfoArrow, ServerInfoChatChannel, ServerInfoChatUser, ServerInfoCard, ServerInfoCounter, ServerInfoGame,
    ServerInfoPlayerPing, ServerInfoPlayerProperties, ServerInfoZone,
};
pub use vocabulary::{
    encode_event_container, encode_response, register_known_items, ClientEnvelope, Command, CommandContainer, Event,
    EventAudience, GameEventContainer, GameEventContext, ResponseCode, ResponsePayload,
};

/// The wire protocol version the server advertises in its welcome event
/// (§6). A client presenting a different version gets a versioning error
/// and is disconnected before it can join anything.
pub const PROTOCOL_VERSION: i32 = 6;

use std::sync::OnceLock;

/// The process-wide registry of known protocol tags, populated exactly
/// once (§4.2). `server` and `game-core` both decode against this instance
/// rather than building their own, so "known" has one meaning process-wide.
pub fn shared_registry() -> &'static ItemRegistry {
    static REGISTRY: OnceLock<ItemRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut reg = ItemRegistry::new();
        register_known_items(&mut reg);
        reg
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_registry_is_populated_and_stable_across_calls() {
        let a = shared_registry();
        let b = shared_registry();
        assert!(std::ptr::eq(a, b));
        assert!(a.is_known("command", "join_game"));
    }
}
//! Game state substrate and rules-agnostic game-object aggregation: cards,
//! zones, counters, arrows (C4), player state (C5), and the game itself
//! (C6) — the per-table state machine that turns commands into the
//! response/public-event/private-event triples the protocol layer ships.

pub mod card;
pub mod game;
pub mod player;

pub use card::{Arrow, Card, CardZone, Counter, MonotonicIdAllocator, Visibility};
pub use game::{DisconnectOutcome, Game, GamePhase};
pub use player::{Player, INITIAL_CARDS};

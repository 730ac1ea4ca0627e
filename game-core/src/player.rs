//! C5 — player state: zones, counters, arrows, deck, readiness, and the
//! id allocators that hand out fresh card/counter/arrow ids.

use std::collections::HashMap;

use protocol::{Color, DeckList};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::card::{Arrow, Card, CardZone, Counter, MonotonicIdAllocator, Visibility};

/// The six zones every player gets on `setup_zones` (§4.3).
const STANDARD_ZONES: &[(&str, bool, Visibility)] = &[
    ("deck", false, Visibility::Hidden),
    ("sb", false, Visibility::Hidden),
    ("table", true, Visibility::Public),
    ("hand", false, Visibility::Private),
    ("grave", false, Visibility::Public),
    ("rfg", false, Visibility::Public),
];

/// The standard counters every player gets on `setup_zones`, `(name, color,
/// starting value)` (§4.3).
const STANDARD_COUNTERS: &[(&str, Color, i32)] = &[
    ("life", Color(200, 200, 200), 20),
    ("w", Color(248, 246, 216), 0),
    ("u", Color(193, 215, 233), 0),
    ("b", Color(186, 177, 171), 0),
    ("r", Color(228, 153, 119), 0),
    ("g", Color(163, 192, 149), 0),
    ("x", Color(200, 200, 200), 0),
    ("storm", Color(200, 200, 200), 0),
];

pub const INITIAL_CARDS: u32 = 7;

/// A seated player or spectator within a game (§3 `Server_Player`).
///
/// `connected` stands in for the original's `handler` being `None`: the
/// seat persists with `connected = false` after a disconnect, and the game
/// decides separately whether to keep or remove it (§4.5 "Disconnection").
pub struct Player {
    pub player_id: i32,
    pub player_name: String,
    pub spectator: bool,
    pub connected: bool,
    pub ready_start: bool,
    pub conceded: bool,
    pub deck: Option<DeckList>,
    pub deck_id: Option<String>,
    pub zones: HashMap<String, CardZone>,
    pub counters: HashMap<i32, Counter>,
    pub arrows: HashMap<i32, Arrow>,
    card_id_alloc: MonotonicIdAllocator,
    counter_id_alloc: MonotonicIdAllocator,
    arrow_id_alloc: MonotonicIdAllocator,
}

impl Player {
    pub fn new(player_id: i32, player_name: impl Into<String>, spectator: bool) -> Self {
        Player {
            player_id,
            player_name: player_name.into(),
            spectator,
            connected: true,
            ready_start: false,
            conceded: false,
            deck: None,
            deck_id: None,
            zones: HashMap::new(),
            counters: HashMap::new(),
            arrows: HashMap::new(),
            card_id_alloc: MonotonicIdAllocator::new(),
            counter_id_alloc: MonotonicIdAllocator::new(),
            arrow_id_alloc: MonotonicIdAllocator::new(),
        }
    }

    /// Tears down any previous zones/counters and materializes a fresh set
    /// from `deck`, all-or-nothing (§4.3 "setupZones is atomic").
    ///
    /// Built as a fresh set of zones/counters/a fresh card-id allocator
    /// first, then swapped in — a partial failure here would simply leave
    /// the player's previous state untouched, since nothing below this
    /// point is fallible.
    pub fn setup_zones(&mut self, deck: &DeckList, shuffle_seed: u64) {
        let mut zones: HashMap<String, CardZone> = STANDARD_ZONES
            .iter()
            .map(|(name, ordered, vis)| (name.to_string(), CardZone::new(*name, *ordered, *vis)))
            .collect();
        let mut counters = HashMap::new();
        let mut counter_id_alloc = MonotonicIdAllocator::new();
        for (name, color, value) in STANDARD_COUNTERS {
            let id = counter_id_alloc.next_id();
            counters.insert(
                id,
                Counter {
                    id,
                    name: name.to_string(),
                    color: *color,
                    value: *value,
                },
            );
        }

        let mut card_id_alloc = MonotonicIdAllocator::new();
        for zone_group in &deck.zones {
            let target = match zone_group.name.as_str() {
                "main" => "deck",
                "side" => "sb",
                _ => continue,
            };
            let zone = zones.get_mut(target).expect("standard zone always present");
            for entry in &zone_group.cards {
                for _ in 0..entry.number {
                    let id = card_id_alloc.next_id();
                    zone.push(Card::new(id, entry.name.clone()));
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(shuffle_seed);
        zones.get_mut("deck").expect("deck zone present").shuffle(&mut rng);

        self.zones = zones;
        self.counters = counters;
        self.arrows = HashMap::new();
        self.card_id_alloc = card_id_alloc;
        self.counter_id_alloc = counter_id_alloc;
        self.arrow_id_alloc = MonotonicIdAllocator::new();
    }

    /// Deals the opening hand by moving `initial_cards` cards off the top
    /// of the deck into the hand (§3 `initialCards`).
    pub fn deal_starting_hand(&mut self) {
        for _ in 0..INITIAL_CARDS {
            let Some(card) = self.zones.get_mut("deck").and_then(|z| z.cards.pop()) else {
                break;
            };
            self.zones.get_mut("hand").expect("hand zone present").push(card);
        }
    }

    /// Moves the top `count` cards of `deck` into `hand`, returning the
    /// drawn cards (§8 scenario 3).
    pub fn draw_cards(&mut self, count: i32) -> Vec<Card> {
        let mut drawn = Vec::new();
        for _ in 0..count.max(0) {
            let Some(card) = self.zones.get_mut("deck").and_then(|z| z.cards.pop()) else {
                break;
            };
            drawn.push(card.clone());
            self.zones.get_mut("hand").expect("hand zone present").push(card);
        }
        drawn
    }

    pub fn create_counter(&mut self, name: impl Into<String>, color: Color, value: i32) -> i32 {
        let id = self.counter_id_alloc.next_id();
        self.counters.insert(
            id,
            Counter {
                id,
                name: name.into(),
                color,
                value,
            },
        );
        id
    }

    pub fn delete_counter(&mut self, counter_id: i32) -> bool {
        self.counters.remove(&counter_id).is_some()
    }

    pub fn set_counter(&mut self, counter_id: i32, value: i32) -> bool {
        match self.counters.get_mut(&counter_id) {
            Some(c) => {
                c.value = value;
                true
            }
            None => false,
        }
    }

    pub fn create_arrow(&mut self, from_card: i32, to_card: i32, color: Color) -> i32 {
        let id = self.arrow_id_alloc.next_id();
        self.arrows.insert(
            id,
            Arrow {
                id,
                from_card,
                to_card,
                color,
            },
        );
        id
    }

    pub fn delete_arrow(&mut self, arrow_id: i32) -> bool {
        self.arrows.remove(&arrow_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{DeckCardEntry, DeckZoneGroup};

    fn sample_deck() -> DeckList {
        DeckList {
            zones: vec![
                DeckZoneGroup {
                    name: "main".into(),
                    cards: vec![DeckCardEntry {
                        name: "Plains".into(),
                        number: 4,
                    }],
                },
                DeckZoneGroup {
                    name: "side".into(),
                    cards: vec![DeckCardEntry {
                        name: "Negate".into(),
                        number: 2,
                    }],
                },
            ],
        }
    }

    #[test]
    fn setup_zones_materializes_main_and_side() {
        let mut player = Player::new(0, "alice", false);
        player.setup_zones(&sample_deck(), 1);
        assert_eq!(player.zones["deck"].cards.len(), 4);
        assert_eq!(player.zones["sb"].cards.len(), 2);
        assert_eq!(player.counters.len(), STANDARD_COUNTERS.len());
    }

    #[test]
    fn card_ids_are_unique_within_a_player() {
        let mut player = Player::new(0, "alice", false);
        player.setup_zones(&sample_deck(), 3);
        let mut ids: Vec<i32> = player.zones.values().flat_map(|z| z.cards.iter().map(|c| c.id)).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn counter_id_allocation_skips_deleted_max() {
        let mut player = Player::new(0, "alice", false);
        player.counters.clear();
        let id1 = player.create_counter("a", Color::default(), 0);
        let id2 = player.create_counter("b", Color::default(), 0);
        let _id3 = player.create_counter("c", Color::default(), 0);
        assert!(player.delete_counter(id2));
        let id4 = player.create_counter("d", Color::default(), 0);
        assert_eq!(id4, id1 + 3);
    }

    #[test]
    fn draw_cards_moves_from_deck_to_hand() {
        let mut player = Player::new(0, "alice", false);
        player.setup_zones(&sample_deck(), 5);
        let drawn = player.draw_cards(3);
        assert_eq!(drawn.len(), 3);
        assert_eq!(player.zones["hand"].cards.len(), 3);
        assert_eq!(player.zones["deck"].cards.len(), 1);
    }

    #[test]
    fn setup_zones_resets_card_ids_deterministically_for_same_seed() {
        let mut a = Player::new(0, "alice", false);
        let mut b = Player::new(1, "bob", false);
        a.setup_zones(&sample_deck(), 99);
        b.setup_zones(&sample_deck(), 99);
        let ids_a: Vec<i32> = a.zones["deck"].cards.iter().map(|c| c.id).collect();
        let ids_b: Vec<i32> = b.zones["deck"].cards.iter().map(|c| c.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}

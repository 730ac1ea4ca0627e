//! C4 — the mutable per-player game substrate: cards, zones, counters and
//! arrows. None of this understands what a card *does* (§1 Non-goals) — it
//! only tracks positions, ownership and display metadata.

use protocol::Color;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;

/// Who can see the cards in a zone (§3 `Server_CardZone`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Hidden,
}

/// A single card instance, identified by an id unique within its owning
/// player (§3 `Server_Card`).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: i32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub tapped: bool,
    pub attacking: bool,
    pub counters: Vec<Counter>,
    pub annotation: String,
}

impl Card {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Card {
            id,
            name: name.into(),
            x: 0,
            y: 0,
            tapped: false,
            attacking: false,
            counters: Vec::new(),
            annotation: String::new(),
        }
    }
}

/// A counter, either on a card or in a player's counter area (life, mana
/// pools, storm, ...). Ids are allocated per owning player and never
/// reused (§4.3 "ids never reused").
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub id: i32,
    pub name: String,
    pub color: Color,
    pub value: i32,
}

/// A directed visual annotation between two cards owned by the same
/// player (§3 `Server_Counter / Server_Arrow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    pub id: i32,
    pub from_card: i32,
    pub to_card: i32,
    pub color: Color,
}

/// A named container of a player's cards (§3 `Server_CardZone`).
///
/// `ordered_by_coordinates` zones (e.g. `table`) preserve each card's
/// explicit `(x, y)`; unordered zones use list position as the only
/// ordering (e.g. `deck`, `hand`).
#[derive(Debug, Clone, PartialEq)]
pub struct CardZone {
    pub name: String,
    pub ordered_by_coordinates: bool,
    pub visibility: Visibility,
    pub cards: Vec<Card>,
}

impl CardZone {
    pub fn new(name: impl Into<String>, ordered_by_coordinates: bool, visibility: Visibility) -> Self {
        CardZone {
            name: name.into(),
            ordered_by_coordinates,
            visibility,
            cards: Vec::new(),
        }
    }

    /// Uniform random permutation of this zone's cards (§4.3 "Fisher-Yates
    /// using a PRNG explicitly seeded per game").
    pub fn shuffle(&mut self, rng: &mut StdRng) {
        self.cards.shuffle(rng);
    }

    pub fn card_mut(&mut self, id: i32) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_card(&mut self, id: i32) -> Option<Card> {
        let idx = self.cards.iter().position(|c| c.id == id)?;
        Some(self.cards.remove(idx))
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }
}

/// A monotonic id allocator: `next()` always returns a fresh, strictly
/// increasing value starting at 1 and never reuses one handed out earlier,
/// even across deletions (§4.3, §9 Open Questions — this supersedes the
/// source's `max(existing) + 1` rescan).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicIdAllocator {
    next: i32,
}

impl MonotonicIdAllocator {
    pub fn new() -> Self {
        MonotonicIdAllocator { next: 1 }
    }

    pub fn next_id(&mut self) -> i32 {
        let id = self.next.max(1);
        self.next = id + 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn monotonic_allocator_never_reuses_ids() {
        let mut alloc = MonotonicIdAllocator::new();
        let a = alloc.next_id();
        let b = alloc.next_id();
        let c = alloc.next_id();
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn shuffle_preserves_multiset_of_ids() {
        let mut zone = CardZone::new("deck", false, Visibility::Hidden);
        for i in 1..=10 {
            zone.push(Card::new(i, format!("card{i}")));
        }
        let mut before: Vec<i32> = zone.cards.iter().map(|c| c.id).collect();
        let mut rng = StdRng::seed_from_u64(42);
        zone.shuffle(&mut rng);
        let mut after: Vec<i32> = zone.cards.iter().map(|c| c.id).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn shuffle_is_deterministic_for_a_fixed_seed() {
        let make_zone = || {
            let mut zone = CardZone::new("deck", false, Visibility::Hidden);
            for i in 1..=20 {
                zone.push(Card::new(i, format!("card{i}")));
            }
            zone
        };
        let mut zone_a = make_zone();
        let mut zone_b = make_zone();
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        zone_a.shuffle(&mut rng_a);
        zone_b.shuffle(&mut rng_b);
        let ids_a: Vec<i32> = zone_a.cards.iter().map(|c| c.id).collect();
        let ids_b: Vec<i32> = zone_b.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}

//! C6 — the game: seats players and spectators, assigns player ids, holds
//! active-player/phase, and turns one incoming [`Command`] into the
//! response/public-event/private-event triple the protocol layer ships
//! (§4.4's "resolve subject, authorize, mutate, emit" pipeline).
//!
//! None of this understands what a card *does* (§1 Non-goals) — `draw_cards`
//! moves cards between zones, `move_card` repositions one, and so on. Rules
//! enforcement (legality of a play) is explicitly out of scope.

use std::collections::HashMap;

use protocol::{
    Color, CommandContainer, DeckList, Event, ResponseCode, ServerInfoArrow, ServerInfoCard, ServerInfoCounter, ServerInfoGame,
    ServerInfoPlayerProperties, ServerInfoZone,
};

use crate::player::Player;

/// The three-state game lifecycle (§4.4 "State machine — game lifecycle").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Players may join/leave, set ready, select a deck.
    Lobby,
    /// Seats are frozen; active-player/phase commands are live.
    Active,
    /// Every non-spectator has conceded or disconnected; the owning
    /// registry removes the game once it observes this.
    Terminal,
}

/// What happened to a player's seat when their connection dropped (§4.5
/// "Disconnection"). The registry uses this to decide whether to keep
/// routing events at a dangling seat or to forget about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The seat persists with `connected = false`; the game carries on.
    SeatKept,
    /// The player (a spectator, or the game's last occupant) was removed
    /// outright.
    Removed,
    /// Removing this player emptied the game of non-spectators — the
    /// caller should drop the game from the registry.
    GameEnded,
}

/// A single table (§3 `Server_Game`). Owns its players exclusively; their
/// zones/counters/arrows/deck live and die with them (§3 ownership summary).
pub struct Game {
    pub game_id: i32,
    pub description: String,
    pub creator_player_id: i32,
    pub max_players: i32,
    pub spectators_allowed: bool,
    pub password: Option<String>,
    pub phase: GamePhase,
    pub active_player: i32,
    pub active_phase: i32,
    pub players: HashMap<i32, Player>,
    next_player_id: i32,
    shuffle_seed: u64,
}

impl Game {
    /// Creates a game and immediately seats its creator as player 0 — the
    /// websocket connection that issues `create_game` always ends up seated,
    /// mirroring the original server's `Server::createGame` which hands the
    /// new `Server_Game` straight back to the requesting handler.
    pub fn new(
        game_id: i32,
        description: impl Into<String>,
        creator_name: impl Into<String>,
        max_players: i32,
        spectators_allowed: bool,
        password: Option<String>,
        shuffle_seed: u64,
    ) -> Game {
        let mut players = HashMap::new();
        players.insert(0, Player::new(0, creator_name, false));
        Game {
            game_id,
            description: description.into(),
            creator_player_id: 0,
            max_players,
            spectators_allowed,
            password,
            phase: GamePhase::Lobby,
            active_player: 0,
            active_phase: 0,
            players,
            next_player_id: 1,
            shuffle_seed,
        }
    }

    fn non_spectator_count(&self) -> i32 {
        self.players.values().filter(|p| !p.spectator).count() as i32
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, GamePhase::Active)
    }

    pub fn to_server_info(&self) -> ServerInfoGame {
        ServerInfoGame {
            game_id: self.game_id,
            description: self.description.clone(),
            creator_name: self.players.get(&self.creator_player_id).map(|p| p.player_name.clone()).unwrap_or_default(),
            has_password: self.password.is_some(),
            spectators_allowed: self.spectators_allowed,
            player_count: self.non_spectator_count(),
            max_players: self.max_players,
            started: self.is_started(),
        }
    }

    pub fn player_properties(&self, player_id: i32) -> Option<ServerInfoPlayerProperties> {
        self.players.get(&player_id).map(|p| ServerInfoPlayerProperties {
            player_id: p.player_id,
            player_name: p.player_name.clone(),
            spectator: p.spectator,
            conceded: p.conceded,
            ready_start: p.ready_start,
            deck_id: p.deck_id.as_deref().and_then(|s| s.parse().ok()).unwrap_or(-1),
        })
    }

    /// The full roster, in player-id order — what a freshly joined
    /// connection needs to render the table it just sat down at
    /// (`Event::GameJoined`'s `players` list).
    pub fn all_player_properties(&self) -> Vec<ServerInfoPlayerProperties> {
        let mut ids: Vec<i32> = self.players.keys().copied().collect();
        ids.sort();
        ids.into_iter().filter_map(|id| self.player_properties(id)).collect()
    }

    pub fn player_name(&self, player_id: i32) -> Option<&str> {
        self.players.get(&player_id).map(|p| p.player_name.as_str())
    }

    /// Seats a new player or spectator (§4.4 step 1/2: resolve + authorize
    /// the join itself). Player ids are assigned monotonically and never
    /// reused within a game (§3 invariant).
    pub fn join_player(&mut self, name: impl Into<String>, spectator: bool, password: Option<&str>) -> Result<i32, ResponseCode> {
        if let Some(expected) = &self.password {
            if password != Some(expected.as_str()) {
                return Err(ResponseCode::Login);
            }
        }
        if spectator {
            if !self.spectators_allowed {
                return Err(ResponseCode::SpectatorsNotAllowed);
            }
        } else {
            if self.is_started() {
                return Err(ResponseCode::ContextError);
            }
            if self.max_players != 0 && self.non_spectator_count() >= self.max_players {
                return Err(ResponseCode::ContextError);
            }
        }
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.insert(id, Player::new(id, name, spectator));
        Ok(id)
    }

    /// Removes a player outright (used by an explicit `leave_game` and by
    /// `kick_from_game`). Returns whether the game is now empty of
    /// non-spectators (§3 "Game destroyed when last non-spectator leaves").
    pub fn remove_player(&mut self, player_id: i32) -> bool {
        let was_spectator = self.players.get(&player_id).map(|p| p.spectator).unwrap_or(true);
        self.players.remove(&player_id);
        if !was_spectator && self.non_spectator_count() == 0 {
            self.phase = GamePhase::Terminal;
            return true;
        }
        false
    }

    /// A connection dropped without an explicit `leave_game` (§4.5). A
    /// spectator's seat is discarded outright (there is nothing dangling to
    /// keep); a seated player's record persists with `connected = false` so
    /// the game continues and reconnection is possible, unless that was the
    /// last non-spectator, which ends the game.
    pub fn disconnect_player(&mut self, player_id: i32) -> DisconnectOutcome {
        let Some(player) = self.players.get_mut(&player_id) else {
            return DisconnectOutcome::Removed;
        };
        if player.spectator {
            self.players.remove(&player_id);
            return DisconnectOutcome::Removed;
        }
        player.connected = false;
        tracing::warn!(game_id = self.game_id, player_id, "player disconnected, seat kept");
        if self.players.values().filter(|p| !p.spectator).all(|p| !p.connected || p.conceded) {
            self.phase = GamePhase::Terminal;
            return DisconnectOutcome::GameEnded;
        }
        DisconnectOutcome::SeatKept
    }

    fn authorize_mutation(&self, player_id: i32) -> Result<(), ResponseCode> {
        let Some(player) = self.players.get(&player_id) else {
            return Err(ResponseCode::NameNotFound);
        };
        if player.spectator {
            return Err(ResponseCode::SpectatorsNotAllowed);
        }
        if !self.is_started() {
            return Err(ResponseCode::ContextError);
        }
        if player.conceded || !player.connected {
            return Err(ResponseCode::ContextError);
        }
        Ok(())
    }

    /// Resolves a deck selection against an already-uploaded deck (the
    /// `server` crate looks the blob up by id and passes the parsed
    /// [`DeckList`] in here) and materializes zones for it (§4.3
    /// "setupZones is atomic"). Forbidden once the game has started — deck
    /// changes mid-game would desync everyone's hand/library.
    pub fn select_deck(&mut self, player_id: i32, deck: &DeckList, deck_id: impl Into<String>) -> ResponseCode {
        if self.is_started() {
            return ResponseCode::ContextError;
        }
        let Some(player) = self.players.get_mut(&player_id) else {
            return ResponseCode::NameNotFound;
        };
        if player.spectator {
            return ResponseCode::SpectatorsNotAllowed;
        }
        let seed = self.shuffle_seed.wrapping_add(player_id as u64);
        player.setup_zones(deck, seed);
        player.deck = Some(deck.clone());
        player.deck_id = Some(deck_id.into());
        ResponseCode::Ok
    }

    /// Marks a player ready; once every seated non-spectator is ready the
    /// game transitions to `Active`, deals opening hands, and emits the
    /// state-changed events (§4.4 "Active", §8 scenario 2).
    pub fn ready_start(&mut self, player_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if self.is_started() {
            return ResponseCode::ContextError;
        }
        let Some(player) = self.players.get_mut(&player_id) else {
            return ResponseCode::NameNotFound;
        };
        if player.spectator {
            return ResponseCode::SpectatorsNotAllowed;
        }
        player.ready_start = true;
        if let Some(props) = self.player_properties(player_id) {
            container.enqueue_game_event_public(self.game_id, Event::PlayerPropertiesChanged { player: props });
        }

        let all_ready = self
            .players
            .values()
            .filter(|p| !p.spectator)
            .all(|p| p.ready_start && p.connected);
        let has_seated_player = self.players.values().any(|p| !p.spectator);
        if all_ready && has_seated_player {
            tracing::info!(game_id = self.game_id, "all seats ready, starting game");
            self.phase = GamePhase::Active;
            let mut ids: Vec<i32> = self.players.iter().filter(|(_, p)| !p.spectator).map(|(id, _)| *id).collect();
            ids.sort();
            self.active_player = *ids.first().unwrap_or(&0);
            self.active_phase = 0;
            for id in ids {
                self.players.get_mut(&id).expect("seated player present").deal_starting_hand();
            }
            container.enqueue_game_event_public(self.game_id, Event::GameStarted);
            container.enqueue_game_event_public(self.game_id, Event::SetActivePlayer { player_id: self.active_player });
            container.enqueue_game_event_public(self.game_id, Event::SetActivePhase { phase: self.active_phase });
        }
        ResponseCode::Ok
    }

    /// A player concedes; their seat stays for spectating the rest of the
    /// match but can no longer mutate it (§4.4 "conceded... are read-only").
    pub fn concede(&mut self, player_id: i32, container: &mut CommandContainer) -> ResponseCode {
        let Some(player) = self.players.get_mut(&player_id) else {
            return ResponseCode::NameNotFound;
        };
        if player.spectator {
            return ResponseCode::SpectatorsNotAllowed;
        }
        player.conceded = true;
        if let Some(props) = self.player_properties(player_id) {
            container.enqueue_game_event_public(self.game_id, Event::PlayerPropertiesChanged { player: props });
        }
        if self.players.values().filter(|p| !p.spectator).all(|p| p.conceded) {
            tracing::info!(game_id = self.game_id, "all players conceded, closing game");
            self.phase = GamePhase::Terminal;
            container.enqueue_game_event_public(self.game_id, Event::GameClosed);
        }
        ResponseCode::Ok
    }

    /// Draws `count` cards: the drawer gets the real cards privately, every
    /// other recipient gets a face-down count-only version (§8 scenario 3).
    pub fn draw_cards(&mut self, player_id: i32, count: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let drawn = self.players.get_mut(&player_id).expect("checked above").draw_cards(count);
        let real: Vec<ServerInfoCard> = drawn
            .iter()
            .map(|c| ServerInfoCard {
                id: c.id,
                name: c.name.clone(),
                x: c.x,
                y: c.y,
                tapped: c.tapped,
                attacking: c.attacking,
                counters: vec![],
                annotation: c.annotation.clone(),
            })
            .collect();
        let face_down: Vec<ServerInfoCard> = drawn.iter().map(|c| ServerInfoCard::face_down(c.id)).collect();
        container.enqueue_game_event_private(self.game_id, player_id, Event::DrawCards { player_id, cards: real });
        // Face-down view goes out on the public lane so it reaches every
        // connected player *and spectator* at the table (§4.4), not just
        // other seated players.
        container.enqueue_game_event_public(self.game_id, Event::DrawCards { player_id, cards: face_down });
        ResponseCode::Ok
    }

    /// Repositions or re-zones one of the mover's own cards.
    pub fn move_card(&mut self, player_id: i32, card_id: i32, target_zone: &str, x: i32, y: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        let Some(mut card) = player.zones.values_mut().find_map(|z| z.remove_card(card_id)) else {
            return ResponseCode::NameNotFound;
        };
        let Some(zone) = player.zones.get_mut(target_zone) else {
            // Put the card back where it was rather than losing it.
            player.zones.entry("hand".to_string()).or_insert_with(|| {
                crate::card::CardZone::new("hand", false, crate::card::Visibility::Private)
            }).push(card);
            return ResponseCode::NameNotFound;
        };
        card.x = x;
        card.y = y;
        zone.push(card);
        container.enqueue_game_event_public(self.game_id, Event::MoveCard {
            player_id,
            card_id,
            target_zone: target_zone.to_string(),
            x,
            y,
        });
        ResponseCode::Ok
    }

    pub fn create_counter(&mut self, player_id: i32, name: &str, color: Color, value: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        let id = player.create_counter(name, color, value);
        container.enqueue_game_event_public(self.game_id, Event::CreateCounters {
            player_id,
            counters: vec![ServerInfoCounter { id, name: name.to_string(), color, radius: 20, value }],
        });
        ResponseCode::Ok
    }

    pub fn set_counter(&mut self, player_id: i32, counter_id: i32, value: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        if !player.set_counter(counter_id, value) {
            return ResponseCode::NameNotFound;
        }
        container.enqueue_game_event_public(self.game_id, Event::SetCounter { player_id, counter_id, value });
        ResponseCode::Ok
    }

    pub fn delete_counter(&mut self, player_id: i32, counter_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        if !player.delete_counter(counter_id) {
            return ResponseCode::NameNotFound;
        }
        container.enqueue_game_event_public(self.game_id, Event::DeleteCounter { player_id, counter_id });
        ResponseCode::Ok
    }

    pub fn create_arrow(&mut self, player_id: i32, from_card: i32, to_card: i32, color: Color, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        let id = player.create_arrow(from_card, to_card, color);
        container.enqueue_game_event_public(self.game_id, Event::CreateArrows {
            player_id,
            arrows: vec![ServerInfoArrow { id, from_card, to_card, color }],
        });
        ResponseCode::Ok
    }

    pub fn delete_arrow(&mut self, player_id: i32, arrow_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        let player = self.players.get_mut(&player_id).expect("checked above");
        if !player.delete_arrow(arrow_id) {
            return ResponseCode::NameNotFound;
        }
        container.enqueue_game_event_public(self.game_id, Event::DeleteArrow { player_id, arrow_id });
        ResponseCode::Ok
    }

    /// Dumps one zone of `target_player` for `requesting_player` — a
    /// request, not a mutation, so spectators may use it too, but only for
    /// zones whose visibility allows it (hidden zones never dump for anyone
    /// but their owner).
    pub fn dump_zone(&self, requesting_player: i32, target_player: i32, zone_name: &str) -> Result<ServerInfoZone, ResponseCode> {
        if !self.players.contains_key(&requesting_player) {
            return Err(ResponseCode::NameNotFound);
        }
        let Some(target) = self.players.get(&target_player) else {
            return Err(ResponseCode::NameNotFound);
        };
        let Some(zone) = target.zones.get(zone_name) else {
            return Err(ResponseCode::NameNotFound);
        };
        let visible_to_requester = requesting_player == target_player || matches!(zone.visibility, crate::card::Visibility::Public);
        if !visible_to_requester {
            return Err(ResponseCode::ContextError);
        }
        Ok(ServerInfoZone {
            name: zone.name.clone(),
            cards: zone
                .cards
                .iter()
                .map(|c| ServerInfoCard {
                    id: c.id,
                    name: c.name.clone(),
                    x: c.x,
                    y: c.y,
                    tapped: c.tapped,
                    attacking: c.attacking,
                    counters: c.counters.iter().map(|ct| ServerInfoCounter {
                        id: ct.id,
                        name: ct.name.clone(),
                        color: ct.color,
                        radius: 20,
                        value: ct.value,
                    }).collect(),
                    annotation: c.annotation.clone(),
                })
                .collect(),
        })
    }

    /// Advances `active_phase` by one; only the current active player (or
    /// the game's creator, acting as admin) may do this (§4.4).
    pub fn next_phase(&mut self, player_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        if player_id != self.active_player && player_id != self.creator_player_id {
            return ResponseCode::ContextError;
        }
        self.active_phase += 1;
        container.enqueue_game_event_public(self.game_id, Event::SetActivePhase { phase: self.active_phase });
        ResponseCode::Ok
    }

    /// Hands the active-player marker to `target_player_id`.
    pub fn set_active_player(&mut self, player_id: i32, target_player_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if let Err(code) = self.authorize_mutation(player_id) {
            return code;
        }
        if player_id != self.active_player && player_id != self.creator_player_id {
            return ResponseCode::ContextError;
        }
        if !self.players.contains_key(&target_player_id) {
            return ResponseCode::NameNotFound;
        }
        self.active_player = target_player_id;
        self.active_phase = 0;
        container.enqueue_game_event_public(self.game_id, Event::SetActivePlayer { player_id: target_player_id });
        container.enqueue_game_event_public(self.game_id, Event::SetActivePhase { phase: 0 });
        ResponseCode::Ok
    }

    /// Removes `target_player_id` from the game; only the creator may kick
    /// (§6 `kick_from_game`).
    pub fn kick_from_game(&mut self, requesting_player: i32, target_player_id: i32, container: &mut CommandContainer) -> ResponseCode {
        if requesting_player != self.creator_player_id {
            return ResponseCode::ContextError;
        }
        if !self.players.contains_key(&target_player_id) {
            return ResponseCode::NameNotFound;
        }
        self.remove_player(target_player_id);
        container.enqueue_game_event_public(self.game_id, Event::Kicked { player_id: target_player_id });
        ResponseCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{DeckCardEntry, DeckZoneGroup};

    fn sample_deck() -> DeckList {
        DeckList {
            zones: vec![DeckZoneGroup {
                name: "main".into(),
                cards: vec![DeckCardEntry { name: "Plains".into(), number: 10 }],
            }],
        }
    }

    fn seated_two_player_game() -> (Game, i32, i32) {
        let mut game = Game::new(1, "Friendly game", "alice", 2, true, None, 1);
        let bob = game.join_player("bob", false, None).unwrap();
        game.select_deck(0, &sample_deck(), "f1");
        game.select_deck(bob, &sample_deck(), "f2");
        (game, 0, bob)
    }

    #[test]
    fn join_assigns_monotonically_increasing_ids() {
        let mut game = Game::new(1, "d", "alice", 4, true, None, 1);
        let a = game.join_player("bob", false, None).unwrap();
        let b = game.join_player("carol", false, None).unwrap();
        assert!(b > a);
    }

    #[test]
    fn join_rejects_wrong_password() {
        let mut game = Game::new(1, "d", "alice", 4, true, Some("secret".into()), 1);
        assert_eq!(game.join_player("bob", false, Some("nope")), Err(ResponseCode::Login));
        assert!(game.join_player("bob", false, Some("secret")).is_ok());
    }

    #[test]
    fn join_rejects_spectators_when_disallowed() {
        let mut game = Game::new(1, "d", "alice", 4, false, None, 1);
        assert_eq!(game.join_player("eve", true, None), Err(ResponseCode::SpectatorsNotAllowed));
    }

    #[test]
    fn ready_start_by_all_non_spectators_starts_the_game() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        assert_eq!(game.ready_start(alice, &mut container), ResponseCode::Ok);
        assert!(!game.is_started());
        assert_eq!(game.ready_start(bob, &mut container), ResponseCode::Ok);
        assert!(game.is_started());
        assert_eq!(game.active_player, alice.min(bob));
        assert_eq!(game.players[&alice].zones["hand"].cards.len(), 7);
    }

    #[test]
    fn spectator_cannot_mutate_game_state() {
        let (mut game, ..) = seated_two_player_game();
        let spectator = game.join_player("watcher", true, None).unwrap();
        let mut container = CommandContainer::new();
        assert_eq!(game.draw_cards(spectator, 1, &mut container), ResponseCode::SpectatorsNotAllowed);
    }

    #[test]
    fn draw_cards_gives_names_privately_and_face_down_publicly() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        game.ready_start(alice, &mut container);
        game.ready_start(bob, &mut container);
        let mut container = CommandContainer::new();
        assert_eq!(game.draw_cards(alice, 3, &mut container), ResponseCode::Ok);

        let private: Vec<_> = container.private_events(game.game_id).collect();
        assert_eq!(private.len(), 1);
        let (recipient, alice_events) = private[0];
        assert_eq!(recipient, alice);
        match &alice_events.events[0] {
            Event::DrawCards { cards, .. } => assert_eq!(cards.len(), 3),
            _ => panic!("expected draw cards event"),
        }

        // The face-down view is public, so it reaches bob and any
        // spectator at the table, not just other seated players.
        let public: Vec<_> = container.public_events().collect();
        assert_eq!(public.len(), 1);
        match &public[0].1.events[0] {
            Event::DrawCards { cards, .. } => assert!(cards.iter().all(|c| c.name.is_empty())),
            _ => panic!("expected draw cards event"),
        }
        let _ = bob;
    }

    #[test]
    fn concede_ends_game_when_all_non_spectators_concede() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        game.ready_start(alice, &mut container);
        game.ready_start(bob, &mut container);
        let mut container = CommandContainer::new();
        game.concede(alice, &mut container);
        assert!(matches!(game.phase, GamePhase::Active));
        game.concede(bob, &mut container);
        assert!(matches!(game.phase, GamePhase::Terminal));
    }

    #[test]
    fn disconnect_keeps_seat_but_can_end_game_if_last_connected() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        game.ready_start(alice, &mut container);
        game.ready_start(bob, &mut container);
        assert_eq!(game.disconnect_player(alice), DisconnectOutcome::SeatKept);
        assert!(!game.players[&alice].connected);
        assert!(game.is_started());
        assert_eq!(game.disconnect_player(bob), DisconnectOutcome::GameEnded);
    }

    #[test]
    fn counter_id_allocation_never_reuses_a_deleted_max() {
        let (mut game, alice, _) = seated_two_player_game();
        let mut container = CommandContainer::new();
        game.ready_start(alice, &mut container);
        game.ready_start(1, &mut container);
        let mut container = CommandContainer::new();
        game.create_counter(alice, "poison", Color(0, 200, 0), 0, &mut container);
        let second = game.players[&alice].counters.keys().max().copied().unwrap();
        game.delete_counter(alice, second, &mut container);
        game.create_counter(alice, "energy", Color(255, 255, 0), 0, &mut container);
        let new_id = *game.players[&alice].counters.keys().max().unwrap();
        assert_ne!(new_id, second);
        assert!(new_id > second);
    }

    #[test]
    fn dump_zone_hides_hidden_zones_from_other_players() {
        let (game, alice, bob) = seated_two_player_game();
        assert!(game.dump_zone(bob, alice, "deck").is_err());
        assert!(game.dump_zone(alice, alice, "deck").is_ok());
        assert!(game.dump_zone(bob, alice, "table").is_ok());
    }

    #[test]
    fn next_phase_requires_active_player_or_creator() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        game.ready_start(alice, &mut container);
        game.ready_start(bob, &mut container);
        assert_eq!(game.active_player, alice);
        let mut container = CommandContainer::new();
        assert_eq!(game.next_phase(bob, &mut container), ResponseCode::ContextError);
        assert_eq!(game.next_phase(alice, &mut container), ResponseCode::Ok);
        assert_eq!(game.active_phase, 1);
    }

    #[test]
    fn only_creator_can_kick() {
        let (mut game, alice, bob) = seated_two_player_game();
        let mut container = CommandContainer::new();
        assert_eq!(game.kick_from_game(bob, alice, &mut container), ResponseCode::ContextError);
        assert_eq!(game.kick_from_game(alice, bob, &mut container), ResponseCode::Ok);
        assert!(!game.players.contains_key(&bob));
    }
}

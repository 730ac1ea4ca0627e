//! C3 — the in-memory deck list tree.
//!
//! A deck list is a small tree: a root holding named zone groups
//! (conventionally `main` and `side`), each holding card-count leaves. It
//! carries no game-play behavior of its own; [`crate::item::Item`]
//! conversions let it ride inside `deck_upload`/`deck_select` commands and
//! `deck_download` responses, and `game-core` walks it to materialize cards
//! into zones (§4.3).

use crate::item::Item;

/// One `(card name, copies)` leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckCardEntry {
    pub name: String,
    pub number: u32,
}

/// A named zone group within a deck list (conventionally `main` or `side`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckZoneGroup {
    pub name: String,
    pub cards: Vec<DeckCardEntry>,
}

/// The full deck tree: root → zone groups → card-count leaves (§3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckList {
    pub zones: Vec<DeckZoneGroup>,
}

impl DeckList {
    pub fn zone(&self, name: &str) -> Option<&DeckZoneGroup> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn to_item(&self) -> Item {
        let zones = self
            .zones
            .iter()
            .map(|z| {
                let cards = z
                    .cards
                    .iter()
                    .map(|c| Item::new("deck_card", "").with_str("name", c.name.clone()).with_int("number", c.number as i32))
                    .collect();
                Item::new("deck_zone", "").with_str("name", z.name.clone()).with_list("cards", cards)
            })
            .collect();
        Item::new("deck_list", "").with_list("zones", zones)
    }

    pub fn from_item(item: &Item) -> DeckList {
        let zones = item
            .get_list("zones")
            .iter()
            .map(|z| {
                let cards = z
                    .get_list("cards")
                    .iter()
                    .map(|c| DeckCardEntry {
                        name: c.get_str("name").to_string(),
                        number: c.get_int("number").max(0) as u32,
                    })
                    .collect();
                DeckZoneGroup {
                    name: z.get_str("name").to_string(),
                    cards,
                }
            })
            .collect();
        DeckList { zones }
    }
}

/// An entry in a user's persisted deck directory (§6 "Persisted state").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckDirEntry {
    Folder(DeckFolder),
    File(DeckFileInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckFolder {
    pub name: String,
    pub entries: Vec<DeckDirEntry>,
}

/// A stored deck blob, addressed by the opaque id returned on upload
/// (§5 "Deck blobs are immutable once uploaded; their files are
/// content-addressed by an opaque id").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckFileInfo {
    pub id: String,
    pub name: String,
}

impl DeckDirEntry {
    pub fn to_item(&self) -> Item {
        match self {
            DeckDirEntry::Folder(f) => {
                let entries = f.entries.iter().map(DeckDirEntry::to_item).collect();
                Item::new("deck_dir_folder", "")
                    .with_str("name", f.name.clone())
                    .with_list("entries", entries)
            }
            DeckDirEntry::File(file) => Item::new("deck_dir_file", "")
                .with_str("id", file.id.clone())
                .with_str("name", file.name.clone()),
        }
    }

    pub fn from_item(item: &Item) -> DeckDirEntry {
        if item.item_type == "deck_dir_file" {
            DeckDirEntry::File(DeckFileInfo {
                id: item.get_str("id").to_string(),
                name: item.get_str("name").to_string(),
            })
        } else {
            DeckDirEntry::Folder(DeckFolder {
                name: item.get_str("name").to_string(),
                entries: item.get_list("entries").iter().map(DeckDirEntry::from_item).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_list_round_trips_through_item() {
        let deck = DeckList {
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
                    cards: vec![],
                },
            ],
        };
        let item = deck.to_item();
        let back = DeckList::from_item(&item);
        assert_eq!(back, deck);
    }

    #[test]
    fn directory_round_trips_nested_folders() {
        let dir = DeckDirEntry::Folder(DeckFolder {
            name: "root".into(),
            entries: vec![
                DeckDirEntry::File(DeckFileInfo {
                    id: "1".into(),
                    name: "mono_white.dck".into(),
                }),
                DeckDirEntry::Folder(DeckFolder {
                    name: "standard".into(),
                    entries: vec![],
                }),
            ],
        });
        let item = dir.to_item();
        assert_eq!(DeckDirEntry::from_item(&item), dir);
    }
}

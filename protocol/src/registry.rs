//! The process-wide `(item_type, item_sub_type) -> known?` registry.
//!
//! The original server keeps a hash of constructors populated once via
//! `initializeHash` and treats a second registration of the same tag as a
//! programmer error. Our generic [`crate::item::Item`] tree does not need a
//! per-tag constructor (decode is structurally uniform regardless of tag —
//! see `framer.rs`), so the registry here only needs to answer "is this tag
//! known", which is what decode uses to decide between a real item and the
//! `Invalid` sentinel. The higher-level [`crate::vocabulary`] layer is what
//! actually interprets a known tag's attributes.

use std::collections::HashSet;

/// A process-wide set of known `(item_type, item_sub_type)` tags.
#[derive(Default)]
pub struct ItemRegistry {
    known: HashSet<(String, String)>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        ItemRegistry::default()
    }

    /// Registers a tag. Panics on re-registration — "duplicate registration
    /// is a programmer error (must fail loudly)" (§4.2).
    pub fn register(&mut self, item_type: &str, item_sub_type: &str) {
        let key = (item_type.to_string(), item_sub_type.to_string());
        if !self.known.insert(key) {
            panic!(
                "protocol item ({item_type}, {item_sub_type}) registered twice"
            );
        }
    }

    pub fn is_known(&self, item_type: &str, item_sub_type: &str) -> bool {
        self.known.contains(&(item_type.to_string(), item_sub_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut reg = ItemRegistry::new();
        reg.register("command", "draw_cards");
        reg.register("command", "draw_cards");
    }

    #[test]
    fn unknown_tag_is_not_known() {
        let reg = ItemRegistry::new();
        assert!(!reg.is_known("command", "draw_cards"));
    }
}

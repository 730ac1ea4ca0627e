//! The framer boundary (§6 "External Interfaces").
//!
//! A framer turns an [`Item`] tree into a forward stream of tokens and back.
//! The real deployment's framer is a streaming XML tokenizer; that tokenizer
//! is out of scope for this crate (§1) and only its interface is pinned
//! here. [`VecFramer`] is a small, fully in-process implementation used by
//! tests and by anything that wants to drive the server without a real
//! socket — it stores the token stream as a plain `Vec` instead of bytes on
//! a wire, but walks exactly the same token sequence a real XML writer
//! would produce, so it exercises the decode/encode algorithm faithfully.

use crate::item::{AttrValue, Color, DecodeError, Item};
use crate::registry::ItemRegistry;

/// The primitive kind carried alongside a token so the reader knows how to
/// parse the text back (§6: "integers as decimal text, booleans as 0/1,
/// colors as #rrggbb").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PrimKind {
    Int,
    Bool,
    Str,
    Color,
}

/// One token in the forward stream §4.1 describes. Derives `Serialize` so a
/// concrete framer can ship a `Vec<FramerToken>` over a real transport (the
/// `server` crate's websocket connection) as its wire encoding — the actual
/// streaming XML tokenizer stays out of scope (§1, §6), this is just enough
/// of a concrete framer to drive the server end to end.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FramerToken {
    /// Opens an item. `item_type`/`item_sub_type` are the dispatch key.
    Start {
        item_type: String,
        item_sub_type: String,
    },
    /// A primitive attribute of the item currently open.
    Attr {
        name: String,
        kind: PrimKind,
        value: String,
    },
    /// Opens a named nested child (single item, or one entry of a list).
    ChildStart { name: String },
    /// Closes the most recently opened child.
    ChildEnd,
    /// Declares that attribute `name` is list-typed, written once ahead of
    /// that name's `ChildStart`/`ChildEnd` pairs (zero or more of them).
    /// Without this marker a list of exactly one entry is indistinguishable
    /// on decode from a lone nested child, which silently drops it back to
    /// a single `AttrValue::Child` instead of `AttrValue::List` — this
    /// token is what makes `decode(encode(x)) == x` hold for one-element
    /// (and empty) lists, not just two-or-more-element ones.
    ListMarker { name: String },
    /// Closes the item opened by the matching [`FramerToken::Start`].
    End,
}

/// Abstract transport for the tagged item tree. See module docs.
pub trait Framer {
    fn read_token(&mut self) -> Result<FramerToken, DecodeError>;
    fn write_token(&mut self, token: FramerToken);
}

/// An in-memory framer backed by a `Vec<FramerToken>`, read front-to-back.
///
/// `encode` appends to `written`; a fresh `VecFramer::for_reading` can be
/// constructed from another framer's `written` buffer to decode it back,
/// which is how the round-trip law is tested.
#[derive(Default)]
pub struct VecFramer {
    written: Vec<FramerToken>,
    cursor: usize,
}

impl VecFramer {
    pub fn new() -> Self {
        VecFramer::default()
    }

    pub fn for_reading(tokens: Vec<FramerToken>) -> Self {
        VecFramer {
            written: tokens,
            cursor: 0,
        }
    }

    pub fn into_tokens(self) -> Vec<FramerToken> {
        self.written
    }
}

impl Framer for VecFramer {
    fn read_token(&mut self) -> Result<FramerToken, DecodeError> {
        let token = self
            .written
            .get(self.cursor)
            .cloned()
            .ok_or(DecodeError::UnexpectedEof)?;
        self.cursor += 1;
        Ok(token)
    }

    fn write_token(&mut self, token: FramerToken) {
        self.written.push(token);
    }
}

/// Decodes exactly one element from `framer`, dispatching through
/// `registry` to decide known-vs-`Invalid` (§4.1).
pub fn decode_item<F: Framer>(framer: &mut F, registry: &ItemRegistry) -> Result<Item, DecodeError> {
    let (item_type, item_sub_type) = match framer.read_token()? {
        FramerToken::Start {
            item_type,
            item_sub_type,
        } => (item_type, item_sub_type),
        _ => return Err(DecodeError::ExpectedStart),
    };

    let mut item = if registry.is_known(&item_type, &item_sub_type) {
        Item::new(item_type, item_sub_type)
    } else {
        Item::invalid(item_type, item_sub_type)
    };

    // Names declared list-typed via a `ListMarker` seen so far for this
    // element — scoped to this one `decode_item` call, matching how
    // `encode_item` decides list-vs-child independently per nested item.
    let mut list_attrs: std::collections::HashSet<String> = std::collections::HashSet::new();

    loop {
        match framer.read_token()? {
            FramerToken::Attr { name, kind, value } => {
                item.attributes.push((name, parse_primitive(kind, &value)));
            }
            FramerToken::ListMarker { name } => {
                if !item.attributes.iter().any(|(n, _)| *n == name) {
                    item.attributes.push((name.clone(), AttrValue::List(Vec::new())));
                }
                list_attrs.insert(name);
            }
            FramerToken::ChildStart { name } => {
                // An unknown child element's own tag decodes to Invalid via
                // the recursive call, but the *parent* keeps going — the
                // child is always attached, never dropped (§4.1, §9).
                let child = decode_item(framer, registry)?;
                match framer.read_token()? {
                    FramerToken::ChildEnd => {}
                    _ => return Err(DecodeError::ExpectedChildEnd(name)),
                }
                attach_child(&mut item, name, child, &list_attrs);
            }
            FramerToken::End => return Ok(item),
            FramerToken::ChildEnd => return Err(DecodeError::ExpectedEnd),
        }
    }
}

fn attach_child(item: &mut Item, name: String, child: Item, list_attrs: &std::collections::HashSet<String>) {
    if list_attrs.contains(&name) {
        match item.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, AttrValue::List(list))) => list.push(child),
            _ => item.attributes.push((name, AttrValue::List(vec![child]))),
        }
        return;
    }
    // No preceding `ListMarker` for this name — the common single-child
    // case. A second child of the same unmarked name is unexpected but
    // still upgraded to a list rather than silently overwriting the first.
    if let Some((_, existing)) = item.attributes.iter_mut().find(|(n, _)| *n == name) {
        match existing {
            AttrValue::List(list) => list.push(child),
            AttrValue::Child(first) => {
                let first = std::mem::replace(first.as_mut(), Item::new("", ""));
                *existing = AttrValue::List(vec![first, child]);
            }
            _ => *existing = AttrValue::Child(Box::new(child)),
        }
        return;
    }
    item.attributes.push((name, AttrValue::Child(Box::new(child))));
}

fn parse_primitive(kind: PrimKind, value: &str) -> AttrValue {
    match kind {
        PrimKind::Int => AttrValue::Int(if value.is_empty() {
            0
        } else {
            // Out-of-range integers clamp rather than fail the decode.
            value.parse::<i64>().unwrap_or(0).clamp(i32::MIN as i64, i32::MAX as i64) as i32
        }),
        PrimKind::Bool => AttrValue::Bool(value == "1"),
        PrimKind::Str => AttrValue::Str(value.to_string()),
        PrimKind::Color => AttrValue::Color(Color::from_hex(value)),
    }
}

/// Encodes `item` straight to a flat token vector, the shape the `server`
/// crate ships as JSON over the websocket connection.
pub fn item_to_tokens(item: &Item) -> Vec<FramerToken> {
    let mut framer = VecFramer::new();
    encode_item(item, &mut framer);
    framer.into_tokens()
}

/// Decodes a flat token vector previously produced by [`item_to_tokens`].
pub fn item_from_tokens(tokens: Vec<FramerToken>, registry: &ItemRegistry) -> Result<Item, DecodeError> {
    let mut framer = VecFramer::for_reading(tokens);
    decode_item(&mut framer, registry)
}

/// Encodes exactly one element to `framer`.
pub fn encode_item<F: Framer>(item: &Item, framer: &mut F) {
    framer.write_token(FramerToken::Start {
        item_type: item.item_type.clone(),
        item_sub_type: item.item_sub_type.clone(),
    });
    for (name, value) in &item.attributes {
        match value {
            AttrValue::Int(i) => framer.write_token(FramerToken::Attr {
                name: name.clone(),
                kind: PrimKind::Int,
                value: i.to_string(),
            }),
            AttrValue::Bool(b) => framer.write_token(FramerToken::Attr {
                name: name.clone(),
                kind: PrimKind::Bool,
                value: if *b { "1".to_string() } else { "0".to_string() },
            }),
            AttrValue::Str(s) => framer.write_token(FramerToken::Attr {
                name: name.clone(),
                kind: PrimKind::Str,
                value: s.clone(),
            }),
            AttrValue::Color(c) => framer.write_token(FramerToken::Attr {
                name: name.clone(),
                kind: PrimKind::Color,
                value: c.to_hex(),
            }),
            AttrValue::Child(child) => {
                framer.write_token(FramerToken::ChildStart { name: name.clone() });
                encode_item(child, framer);
                framer.write_token(FramerToken::ChildEnd);
            }
            AttrValue::List(list) => {
                // Written even for a zero- or one-entry list: it is the
                // only thing that tells decode this name is list-typed
                // regardless of how many children follow.
                framer.write_token(FramerToken::ListMarker { name: name.clone() });
                for entry in list {
                    framer.write_token(FramerToken::ChildStart { name: name.clone() });
                    encode_item(entry, framer);
                    framer.write_token(FramerToken::ChildEnd);
                }
            }
        }
    }
    framer.write_token(FramerToken::End);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Color;

    fn registry_with(tags: &[(&str, &str)]) -> ItemRegistry {
        let mut reg = ItemRegistry::new();
        for (t, s) in tags {
            reg.register(t, s);
        }
        reg
    }

    #[test]
    fn round_trip_flat_item() {
        let reg = registry_with(&[("card", "")]);
        let item = Item::new("card", "")
            .with_int("id", 3)
            .with_str("name", "Plains")
            .with_bool("tapped", true)
            .with_color("highlight", Color(255, 0, 0));

        let mut writer = VecFramer::new();
        encode_item(&item, &mut writer);

        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn round_trip_nested_and_list() {
        let reg = registry_with(&[("zone", ""), ("card", "")]);
        let zone = Item::new("zone", "")
            .with_str("name", "table")
            .with_list(
                "cards",
                vec![
                    Item::new("card", "").with_int("id", 0).with_str("name", "Forest"),
                    Item::new("card", "").with_int("id", 1).with_str("name", "Island"),
                ],
            );

        let mut writer = VecFramer::new();
        encode_item(&zone, &mut writer);
        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert_eq!(decoded, zone);
        assert_eq!(decoded.get_list("cards").len(), 2);
    }

    #[test]
    fn single_element_list_round_trips_as_a_list_not_a_lone_child() {
        let reg = registry_with(&[("zone", ""), ("card", "")]);
        let zone = Item::new("zone", "")
            .with_str("name", "table")
            .with_list("cards", vec![Item::new("card", "").with_int("id", 0).with_str("name", "Forest")]);

        let mut writer = VecFramer::new();
        encode_item(&zone, &mut writer);
        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert_eq!(decoded, zone);
        assert_eq!(decoded.get_list("cards").len(), 1);
    }

    #[test]
    fn empty_list_round_trips_as_an_empty_list() {
        let reg = registry_with(&[("zone", "")]);
        let zone = Item::new("zone", "").with_str("name", "sb").with_list("cards", vec![]);

        let mut writer = VecFramer::new();
        encode_item(&zone, &mut writer);
        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert_eq!(decoded, zone);
        assert_eq!(decoded.get_list("cards").len(), 0);
    }

    #[test]
    fn unknown_tag_decodes_to_invalid_without_aborting() {
        let reg = registry_with(&[("zone", "")]);
        let outer = Item::new("zone", "").with_child(
            "weird_child",
            Item::new("something_unregistered", "x").with_int("v", 1),
        );
        let mut writer = VecFramer::new();
        encode_item(&outer, &mut writer);
        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert!(!decoded.is_invalid);
        let child = decoded.get_child("weird_child").unwrap();
        assert!(child.is_invalid);
        assert_eq!(child.get_int("v"), 1);
    }

    #[test]
    fn unknown_root_tag_decodes_to_invalid_sentinel() {
        let reg = ItemRegistry::new();
        let item = Item::new("nonsense", "").with_int("x", 1);
        let mut writer = VecFramer::new();
        encode_item(&item, &mut writer);
        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert!(decoded.is_invalid);
    }

    #[test]
    fn item_tokens_round_trip_and_serialize_as_json() {
        let reg = registry_with(&[("card", "")]);
        let item = Item::new("card", "").with_int("id", 4).with_str("name", "Island");
        let tokens = item_to_tokens(&item);
        let json = serde_json::to_vec(&tokens).unwrap();
        let decoded_tokens: Vec<FramerToken> = serde_json::from_slice(&json).unwrap();
        let decoded = item_from_tokens(decoded_tokens, &reg).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn empty_and_out_of_range_primitives_degrade_instead_of_failing() {
        let reg = registry_with(&[("card", "")]);
        let mut writer = VecFramer::new();
        writer.write_token(FramerToken::Start {
            item_type: "card".into(),
            item_sub_type: "".into(),
        });
        writer.write_token(FramerToken::Attr {
            name: "id".into(),
            kind: PrimKind::Int,
            value: "99999999999".into(),
        });
        writer.write_token(FramerToken::Attr {
            name: "name".into(),
            kind: PrimKind::Str,
            value: "".into(),
        });
        writer.write_token(FramerToken::End);

        let mut reader = VecFramer::for_reading(writer.into_tokens());
        let decoded = decode_item(&mut reader, &reg).unwrap();
        assert_eq!(decoded.get_int("id"), i32::MAX);
        assert_eq!(decoded.get_str("name"), "");
    }
}

//! The self-describing tagged record at the bottom of the protocol stack.
//!
//! A [`Item`] is the Rust shape of what the original server called a
//! `SerializableItem`: a `(item_type, item_sub_type)` tag plus an ordered
//! list of named attributes, each of which is either a primitive, a single
//! nested item, or an ordered list of nested items. Everything above this
//! (commands, responses, events) is built by reading and writing named
//! attributes on top of this tree — see [`crate::vocabulary`].

use thiserror::Error;

/// Errors that abort decoding outright (wire-level, not dispatch-level).
///
/// These never occur while decoding a *child* of an already-open element —
/// per the round-trip contract an unknown child tag decodes to an
/// [`Item::invalid`] sentinel instead and decoding continues. They can only
/// happen at the top of the stream (truncated input, a token arriving where
/// none was expected).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("stream ended before an element was closed")]
    UnexpectedEof,
    #[error("expected a start token, found a different token")]
    ExpectedStart,
    #[error("expected an end token to close child {0:?}, found a different token")]
    ExpectedChildEnd(String),
    #[error("expected the outer end token, found a different token")]
    ExpectedEnd,
}

/// An RGB color, rendered on the wire as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Parses `#rrggbb`. Malformed input never aborts the outer decode (§4.1
    /// primitive parse policy) — it degenerates to black, same as an
    /// out-of-range/empty primitive degenerates to zero.
    pub fn from_hex(s: &str) -> Color {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 {
            return Color::default();
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).unwrap_or(0);
        Color(byte(0), byte(2), byte(4))
    }
}

/// A named attribute's value: a primitive, a single nested record, or an
/// ordered list of nested records (§3's "or an ordered list of child
/// items").
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i32),
    Bool(bool),
    Str(String),
    Color(Color),
    Child(Box<Item>),
    List(Vec<Item>),
}

/// A tagged record: `(item_type, item_sub_type)` plus an ordered attribute
/// list. Unknown `(item_type, item_sub_type)` pairs decode to
/// [`Item::invalid`] rather than aborting the stream (§4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub item_type: String,
    pub item_sub_type: String,
    /// Set when this item's tag was not found in the registry. The tag is
    /// still preserved (unlike the original's `ProtocolItem_Invalid`, which
    /// drops it) so a log line can say what was actually on the wire.
    pub is_invalid: bool,
    pub attributes: Vec<(String, AttrValue)>,
}

impl Item {
    pub fn new(item_type: impl Into<String>, item_sub_type: impl Into<String>) -> Self {
        Item {
            item_type: item_type.into(),
            item_sub_type: item_sub_type.into(),
            is_invalid: false,
            attributes: Vec::new(),
        }
    }

    pub fn invalid(item_type: impl Into<String>, item_sub_type: impl Into<String>) -> Self {
        Item {
            item_type: item_type.into(),
            item_sub_type: item_sub_type.into(),
            is_invalid: true,
            attributes: Vec::new(),
        }
    }

    pub fn with_int(mut self, name: impl Into<String>, value: i32) -> Self {
        self.attributes.push((name.into(), AttrValue::Int(value)));
        self
    }

    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.attributes.push((name.into(), AttrValue::Bool(value)));
        self
    }

    pub fn with_str(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push((name.into(), AttrValue::Str(value.into())));
        self
    }

    pub fn with_color(mut self, name: impl Into<String>, value: Color) -> Self {
        self.attributes
            .push((name.into(), AttrValue::Color(value)));
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, value: Item) -> Self {
        self.attributes
            .push((name.into(), AttrValue::Child(Box::new(value))));
        self
    }

    pub fn with_list(mut self, name: impl Into<String>, value: Vec<Item>) -> Self {
        self.attributes.push((name.into(), AttrValue::List(value)));
        self
    }

    fn find(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns `0` if the attribute is absent or not an int — the same
    /// degrade-to-zero policy §4.1 mandates for malformed primitive text.
    pub fn get_int(&self, name: &str) -> i32 {
        match self.find(name) {
            Some(AttrValue::Int(i)) => *i,
            _ => 0,
        }
    }

    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.find(name), Some(AttrValue::Bool(true)))
    }

    pub fn get_str(&self, name: &str) -> &str {
        match self.find(name) {
            Some(AttrValue::Str(s)) => s.as_str(),
            _ => "",
        }
    }

    pub fn get_color(&self, name: &str) -> Color {
        match self.find(name) {
            Some(AttrValue::Color(c)) => *c,
            _ => Color::default(),
        }
    }

    pub fn get_child(&self, name: &str) -> Option<&Item> {
        match self.find(name) {
            Some(AttrValue::Child(c)) => Some(c),
            _ => None,
        }
    }

    /// Filters the child list by attribute name — the Rust replacement for
    /// the original's "list of children typecast to T" pattern (§9).
    pub fn get_list(&self, name: &str) -> &[Item] {
        match self.find(name) {
            Some(AttrValue::List(l)) => l.as_slice(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_through_hex() {
        let c = Color(255, 16, 0);
        assert_eq!(Color::from_hex(&c.to_hex()), c);
    }

    #[test]
    fn malformed_color_degrades_to_black_not_panic() {
        assert_eq!(Color::from_hex("not-a-color"), Color::default());
    }

    #[test]
    fn missing_attribute_degrades_to_zero_value() {
        let item = Item::new("card", "");
        assert_eq!(item.get_int("x"), 0);
        assert!(!item.get_bool("tapped"));
        assert_eq!(item.get_str("name"), "");
    }
}

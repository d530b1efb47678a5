//! Typed figure attributes.
//!
//! The key set is closed: every key knows its default value and its
//! persisted name, so a figure only stores the attributes that differ from
//! the defaults.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// An RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
                Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Channels as bytes.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Keys & Values ───────────────────────────────────────────────────────

/// The closed set of attribute keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKey {
    FillColor,
    StrokeColor,
    StrokeWidth,
    TextColor,
    FontSize,
    /// Z-layer; higher layers draw in front regardless of list order.
    Layer,
    Visible,
    ArrowAtStart,
    ArrowAtEnd,
    Name,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 10] = [
        AttributeKey::FillColor,
        AttributeKey::StrokeColor,
        AttributeKey::StrokeWidth,
        AttributeKey::TextColor,
        AttributeKey::FontSize,
        AttributeKey::Layer,
        AttributeKey::Visible,
        AttributeKey::ArrowAtStart,
        AttributeKey::ArrowAtEnd,
        AttributeKey::Name,
    ];

    /// Persisted name of the key.
    pub fn name(self) -> &'static str {
        match self {
            AttributeKey::FillColor => "fillColor",
            AttributeKey::StrokeColor => "strokeColor",
            AttributeKey::StrokeWidth => "strokeWidth",
            AttributeKey::TextColor => "textColor",
            AttributeKey::FontSize => "fontSize",
            AttributeKey::Layer => "layer",
            AttributeKey::Visible => "visible",
            AttributeKey::ArrowAtStart => "arrowAtStart",
            AttributeKey::ArrowAtEnd => "arrowAtEnd",
            AttributeKey::Name => "name",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn default_value(self) -> AttributeValue {
        match self {
            AttributeKey::FillColor => AttributeValue::Color(Some(Color::WHITE)),
            AttributeKey::StrokeColor | AttributeKey::TextColor => {
                AttributeValue::Color(Some(Color::BLACK))
            }
            AttributeKey::StrokeWidth => AttributeValue::Number(1.0),
            AttributeKey::FontSize => AttributeValue::Number(12.0),
            AttributeKey::Layer => AttributeValue::Number(0.0),
            AttributeKey::Visible => AttributeValue::Bool(true),
            AttributeKey::ArrowAtStart | AttributeKey::ArrowAtEnd => AttributeValue::Bool(false),
            AttributeKey::Name => AttributeValue::Text(String::new()),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed attribute value. `Color(None)` means "no paint".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Color(Option<Color>),
    Number(f64),
    Bool(bool),
    Text(String),
}

impl AttributeValue {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttributeValue::Color(c) => *c,
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value has the variant `key` expects.
    pub fn fits(&self, key: AttributeKey) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&key.default_value())
    }

    /// Serialize to the string form used by the persistence layer.
    pub fn encode(&self) -> String {
        match self {
            AttributeValue::Color(Some(c)) => c.to_hex(),
            AttributeValue::Color(None) => "none".to_string(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Text(s) => s.clone(),
        }
    }

    /// Parse the string form of a value for `key`.
    pub fn decode(key: AttributeKey, raw: &str) -> Option<Self> {
        match key.default_value() {
            AttributeValue::Color(_) if raw == "none" => Some(AttributeValue::Color(None)),
            AttributeValue::Color(_) => Color::from_hex(raw).map(|c| AttributeValue::Color(Some(c))),
            AttributeValue::Number(_) => raw.parse().ok().map(AttributeValue::Number),
            AttributeValue::Bool(_) => raw.parse().ok().map(AttributeValue::Bool),
            AttributeValue::Text(_) => Some(AttributeValue::Text(raw.to_string())),
        }
    }
}

// ─── Attribute Map ───────────────────────────────────────────────────────

/// Explicitly set attributes of one figure. Unset keys read as their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    entries: SmallVec<[(AttributeKey, AttributeValue); 4]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The explicitly set value, if any.
    pub fn get_explicit(&self, key: AttributeKey) -> Option<&AttributeValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// The value for `key`, falling back to its default.
    pub fn get(&self, key: AttributeKey) -> AttributeValue {
        self.get_explicit(key)
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }

    /// Set or clear an explicit value, returning the previous explicit value.
    pub fn set(&mut self, key: AttributeKey, value: Option<AttributeValue>) -> Option<AttributeValue> {
        let pos = self.entries.iter().position(|(k, _)| *k == key);
        match (pos, value) {
            (Some(i), Some(v)) => Some(std::mem::replace(&mut self.entries[i].1, v)),
            (Some(i), None) => Some(self.entries.remove(i).1),
            (None, Some(v)) => {
                self.entries.push((key, v));
                None
            }
            (None, None) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn color(&self, key: AttributeKey) -> Option<Color> {
        self.get(key).as_color()
    }

    pub fn number(&self, key: AttributeKey) -> f64 {
        self.get(key)
            .as_number()
            .or_else(|| key.default_value().as_number())
            .unwrap_or(0.0)
    }

    pub fn flag(&self, key: AttributeKey) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    pub fn layer(&self) -> i64 {
        self.number(AttributeKey::Layer) as i64
    }

    pub fn is_visible(&self) -> bool {
        self.flag(AttributeKey::Visible)
    }

    pub fn stroke_width(&self) -> f64 {
        self.number(AttributeKey::StrokeWidth)
    }

    pub fn font_size(&self) -> f64 {
        self.number(AttributeKey::FontSize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_hex_color() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");
        let c = Color::from_hex("FF000080").unwrap();
        assert_eq!(c.to_rgba8(), [255, 0, 0, 128]);
        assert_eq!(Color::from_hex("#fff").unwrap().to_hex(), "#FFFFFF");
        assert!(Color::from_hex("#12").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
    }

    #[test]
    fn defaults_when_unset() {
        let attrs = Attributes::new();
        assert_eq!(attrs.font_size(), 12.0);
        assert!(attrs.is_visible());
        assert_eq!(attrs.layer(), 0);
        assert_eq!(attrs.get(AttributeKey::Name), AttributeValue::Text(String::new()));
    }

    #[test]
    fn set_returns_previous_explicit_value() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.set(AttributeKey::Layer, Some(AttributeValue::Number(2.0))), None);
        assert_eq!(
            attrs.set(AttributeKey::Layer, Some(AttributeValue::Number(3.0))),
            Some(AttributeValue::Number(2.0))
        );
        assert_eq!(attrs.layer(), 3);
        assert_eq!(attrs.set(AttributeKey::Layer, None), Some(AttributeValue::Number(3.0)));
        assert_eq!(attrs.get_explicit(AttributeKey::Layer), None);
    }

    #[test]
    fn encode_decode_by_key() {
        for key in AttributeKey::ALL {
            let v = key.default_value();
            assert_eq!(AttributeValue::decode(key, &v.encode()), Some(v));
            assert_eq!(AttributeKey::from_name(key.name()), Some(key));
        }
        assert_eq!(
            AttributeValue::decode(AttributeKey::FillColor, "none"),
            Some(AttributeValue::Color(None))
        );
        assert_eq!(AttributeValue::decode(AttributeKey::StrokeWidth, "wide"), None);
    }

    #[test]
    fn value_kind_matches_key() {
        assert!(AttributeValue::Number(4.0).fits(AttributeKey::StrokeWidth));
        assert!(!AttributeValue::Bool(true).fits(AttributeKey::StrokeWidth));
    }
}

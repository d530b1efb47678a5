//! Input abstraction layer.
//!
//! Hosts translate their native mouse and keyboard events into
//! [`InputEvent`]s. Pointer positions are in view coordinates; the view maps
//! them into the drawing.

use bitflags::bitflags;
use kurbo::Point;

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl Modifiers {
    pub fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn alt(self) -> bool {
        self.contains(Self::ALT)
    }

    /// The platform command key: `meta` on macOS, `ctrl` elsewhere.
    pub fn command(self) -> bool {
        self.intersects(Self::CTRL | Self::META)
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { point: Point, modifiers: Modifiers },
    PointerMove { point: Point, modifiers: Modifiers },
    PointerUp { point: Point, modifiers: Modifiers },
    /// `key` follows `KeyboardEvent.key` naming (`"z"`, `"Delete"`, `"Escape"`).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            point: Point::new(x, y),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn drag(x: f64, y: f64) -> Self {
        Self::PointerMove {
            point: Point::new(x, y),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            point: Point::new(x, y),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn key(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.into(),
            modifiers,
        }
    }

    /// Same event with `modifiers` replaced.
    pub fn with_modifiers(mut self, m: Modifiers) -> Self {
        match &mut self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers = m,
        }
        self
    }

    /// Pointer position, if this is a pointer event.
    pub fn point(&self) -> Option<Point> {
        match self {
            Self::PointerDown { point, .. }
            | Self::PointerMove { point, .. }
            | Self::PointerUp { point, .. } => Some(*point),
            Self::Key { .. } => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers,
        }
    }
}

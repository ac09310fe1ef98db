//! Input identifiers and native transport events

use core::fmt;

use embedded_graphics::prelude::Point;

/// Physical keys, ordered left-to-right, top-to-bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyId {
    /// Top row, first key
    Key1,
    /// Top row, second key
    Key2,
    /// Top row, third key
    Key3,
    /// Top row, fourth key
    Key4,
    /// Bottom row, first key
    Key5,
    /// Bottom row, second key
    Key6,
    /// Bottom row, third key
    Key7,
    /// Bottom row, fourth key
    Key8,
}

impl KeyId {
    /// Every key in physical order.
    pub const ALL: [KeyId; 8] = [
        KeyId::Key1,
        KeyId::Key2,
        KeyId::Key3,
        KeyId::Key4,
        KeyId::Key5,
        KeyId::Key6,
        KeyId::Key7,
        KeyId::Key8,
    ];

    /// Zero-based position in [`KeyId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`KeyId::index`]. Returns `None` past the last key.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key{}", self.index() + 1)
    }
}

/// Rotary encoders, ordered left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DialId {
    /// Leftmost dial
    Dial1,
    /// Second dial
    Dial2,
    /// Third dial
    Dial3,
    /// Rightmost dial
    Dial4,
}

impl DialId {
    /// Every dial in physical order.
    pub const ALL: [DialId; 4] = [DialId::Dial1, DialId::Dial2, DialId::Dial3, DialId::Dial4];

    /// Zero-based position in [`DialId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`DialId::index`]. Returns `None` past the last dial.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for DialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dial{}", self.index() + 1)
    }
}

/// Touch strip contact length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    /// Short tap
    Short,
    /// Long press on the strip
    Long,
}

/// Input events as the transport reports them.
///
/// Presses and releases arrive as separate events; joining them into
/// press/release pairs with a hold duration is the coordinator's job.
/// Strip points are in full-strip pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Key went down
    KeyDown(KeyId),
    /// Key came up
    KeyUp(KeyId),
    /// Dial rotated; positive = clockwise, magnitude = detent count
    DialTurn {
        /// Which dial
        dial: DialId,
        /// Signed tick count
        ticks: i8,
    },
    /// Dial pushed in
    DialDown(DialId),
    /// Dial released
    DialUp(DialId),
    /// Tap or long tap on the strip
    StripTouch {
        /// Contact length
        kind: TouchKind,
        /// Contact point
        point: Point,
    },
    /// Swipe across the strip
    StripSwipe {
        /// Where the finger landed
        from: Point,
        /// Where the finger lifted
        to: Point,
    },
}

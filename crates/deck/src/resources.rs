//! Resource grants - the slice of the surface one module owns.

use surface::{DialId, KeyId, Point, Rectangle, Size};

/// Keys, dials and strip rectangle granted to exactly one module.
///
/// Key and dial order is preserved, so a module can address "its first key"
/// without knowing which physical key that is.
///
/// ```
/// use deck::Resources;
/// use surface::{DialId, KeyId, Point, Rectangle, Size};
///
/// let grant = Resources::new()
///     .keys([KeyId::Key5, KeyId::Key6])
///     .dials([DialId::Dial1])
///     .strip(Rectangle::new(Point::zero(), Size::new(400, 100)));
/// assert!(grant.owns_key(KeyId::Key6));
/// assert!(grant.has_strip());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    /// Granted keys, in the order the module addresses them
    pub keys: Vec<KeyId>,
    /// Granted dials, in the order the module addresses them
    pub dials: Vec<DialId>,
    /// Slice of the strip in full-strip coordinates; zero-sized means none
    pub strip: Rectangle,
}

impl Resources {
    /// Empty grant: no keys, no dials, no strip.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            dials: Vec::new(),
            strip: Rectangle::new(Point::zero(), Size::zero()),
        }
    }

    /// Add keys to the grant. Duplicates are ignored.
    #[must_use]
    pub fn keys(mut self, keys: impl IntoIterator<Item = KeyId>) -> Self {
        for key in keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self
    }

    /// Add dials to the grant. Duplicates are ignored.
    #[must_use]
    pub fn dials(mut self, dials: impl IntoIterator<Item = DialId>) -> Self {
        for dial in dials {
            if !self.dials.contains(&dial) {
                self.dials.push(dial);
            }
        }
        self
    }

    /// Set the strip rectangle.
    #[must_use]
    pub fn strip(mut self, rect: Rectangle) -> Self {
        self.strip = rect;
        self
    }

    /// Whether the strip rectangle has a non-zero area.
    pub fn has_strip(&self) -> bool {
        !self.strip.is_zero_sized()
    }

    /// Whether `key` is part of this grant.
    pub fn owns_key(&self, key: KeyId) -> bool {
        self.keys.contains(&key)
    }

    /// Whether `dial` is part of this grant.
    pub fn owns_dial(&self, dial: DialId) -> bool {
        self.dials.contains(&dial)
    }

    /// Whether the strip rectangle contains `point` (full-strip coordinates).
    pub fn strip_contains(&self, point: Point) -> bool {
        self.has_strip() && self.strip.contains(point)
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

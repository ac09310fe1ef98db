//! Normalized input events delivered to modules.
//!
//! The transport reports raw down/up edges ([`SurfaceEvent`]); the router
//! joins them into the shapes below before any module sees them.

use std::time::Duration;

use surface::{Point, SurfaceEvent, TouchKind};

/// Key press or release.
///
/// A press arrives with `pressed == true` and no duration; the matching
/// release carries how long the key was held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// `true` on press, `false` on release
    pub pressed: bool,
    /// Hold time, only set on release
    pub duration: Option<Duration>,
}

impl KeyEvent {
    /// Key went down.
    pub const fn press() -> Self {
        Self {
            pressed: true,
            duration: None,
        }
    }

    /// Key came up after being held for `duration`.
    pub const fn release(duration: Duration) -> Self {
        Self {
            pressed: false,
            duration: Some(duration),
        }
    }
}

/// Dial rotation, press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialEvent {
    /// Turned by `delta` detents; positive is clockwise
    Rotate {
        /// Signed tick count
        delta: i8,
    },
    /// Pushed in
    Press,
    /// Released after being held for `duration`
    Release {
        /// Hold time
        duration: Duration,
    },
}

/// Touch strip gesture, in full-strip pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchStripEvent {
    /// Short tap
    Tap(Point),
    /// Long tap
    LongTap(Point),
    /// Swipe between two points
    Swipe {
        /// Where the finger landed
        from: Point,
        /// Where it lifted
        to: Point,
    },
}

impl TouchStripEvent {
    /// Point used to decide which module the gesture belongs to: the tap
    /// point, or where a swipe started.
    pub const fn anchor(&self) -> Point {
        match *self {
            Self::Tap(p) | Self::LongTap(p) => p,
            Self::Swipe { from, .. } => from,
        }
    }

    /// Convert a strip gesture from the transport. Other events yield `None`.
    pub fn from_surface(event: &SurfaceEvent) -> Option<Self> {
        match *event {
            SurfaceEvent::StripTouch {
                kind: TouchKind::Short,
                point,
            } => Some(Self::Tap(point)),
            SurfaceEvent::StripTouch {
                kind: TouchKind::Long,
                point,
            } => Some(Self::LongTap(point)),
            SurfaceEvent::StripSwipe { from, to } => Some(Self::Swipe { from, to }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surface::KeyId;

    #[test]
    fn release_carries_duration() {
        assert_eq!(KeyEvent::press().duration, None);
        let r = KeyEvent::release(Duration::from_millis(250));
        assert!(!r.pressed);
        assert_eq!(r.duration, Some(Duration::from_millis(250)));
    }

    #[test]
    fn swipe_anchors_at_origin() {
        let e = TouchStripEvent::Swipe {
            from: Point::new(10, 5),
            to: Point::new(600, 5),
        };
        assert_eq!(e.anchor(), Point::new(10, 5));
    }

    #[test]
    fn strip_events_convert_from_transport() {
        let long = SurfaceEvent::StripTouch {
            kind: TouchKind::Long,
            point: Point::new(3, 4),
        };
        assert_eq!(
            TouchStripEvent::from_surface(&long),
            Some(TouchStripEvent::LongTap(Point::new(3, 4)))
        );
        assert_eq!(
            TouchStripEvent::from_surface(&SurfaceEvent::KeyDown(KeyId::Key1)),
            None
        );
    }
}

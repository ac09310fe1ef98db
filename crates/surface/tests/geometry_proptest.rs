//! Property-based tests for identifiers and the drawing canvas.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use surface::{Canvas, DialId, KeyId};

proptest::proptest! {
    /// KeyId::from_index is defined exactly for the eight physical keys.
    #[test]
    fn key_from_index_defined_below_eight(i in 0usize..64) {
        assert_eq!(KeyId::from_index(i).is_some(), i < 8);
        if let Some(key) = KeyId::from_index(i) {
            assert_eq!(key.index(), i);
        }
    }

    /// DialId::from_index is defined exactly for the four dials.
    #[test]
    fn dial_from_index_defined_below_four(i in 0usize..64) {
        assert_eq!(DialId::from_index(i).is_some(), i < 4);
    }

    /// Drawing anywhere, including far outside the canvas, never panics and
    /// never changes the canvas size.
    #[test]
    fn canvas_draw_clips_without_panicking(
        x in -500i32..500,
        y in -500i32..500,
        w in 0u32..300,
        h in 0u32..300,
    ) {
        let mut canvas = Canvas::new(Size::new(120, 120));
        Rectangle::new(Point::new(x, y), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::GREEN))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.size(), Size::new(120, 120));
    }
}

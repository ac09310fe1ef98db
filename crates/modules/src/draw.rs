//! Shared drawing helpers: key tiles and strip panels.

use std::convert::Infallible;
use std::sync::Arc;

use deck::Frame;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use surface::{config, Canvas};

/// Dark background shared by all tiles.
pub const BACKGROUND: Rgb888 = Rgb888::new(0x12, 0x12, 0x16);
/// Dimmed label colour.
pub const LABEL: Rgb888 = Rgb888::new(0x90, 0x90, 0x98);

/// Paint onto a fresh canvas and freeze the result.
pub fn paint(size: Size, f: impl FnOnce(&mut Canvas) -> Result<(), Infallible>) -> Frame {
    let mut canvas = Canvas::new(size);
    if let Err(never) = f(&mut canvas) {
        match never {}
    }
    Arc::new(canvas.into_image())
}

fn centered() -> embedded_graphics::text::TextStyle {
    TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build()
}

/// Key tile: small label on top, large value in the middle, accent bar at
/// the bottom.
pub fn key_tile(label: &str, value: &str, accent: Rgb888) -> Frame {
    let size = config::key_image_size();
    paint(size, |c| {
        c.clear(BACKGROUND)?;
        let mid = i32::try_from(size.width / 2).unwrap_or_default();
        let height = i32::try_from(size.height).unwrap_or_default();

        Text::with_text_style(
            label,
            Point::new(mid, 14),
            MonoTextStyle::new(&FONT_6X10, LABEL),
            centered(),
        )
        .draw(c)?;
        Text::with_text_style(
            value,
            Point::new(mid, height / 2),
            MonoTextStyle::new(&FONT_10X20, Rgb888::WHITE),
            centered(),
        )
        .draw(c)?;
        Rectangle::new(Point::new(0, height - 8), Size::new(size.width, 8))
            .into_styled(PrimitiveStyle::with_fill(accent))
            .draw(c)?;
        Ok(())
    })
}

/// Strip panel: a title and a body line, left-aligned, with a progress bar
/// filled to `fill` (0.0..=1.0) along the bottom edge.
pub fn strip_panel(size: Size, title: &str, body: &str, fill: f32, accent: Rgb888) -> Frame {
    paint(size, |c| {
        c.clear(BACKGROUND)?;
        Text::with_baseline(
            title,
            Point::new(12, 10),
            MonoTextStyle::new(&FONT_6X10, LABEL),
            Baseline::Top,
        )
        .draw(c)?;
        Text::with_baseline(
            body,
            Point::new(12, 30),
            MonoTextStyle::new(&FONT_10X20, Rgb888::WHITE),
            Baseline::Top,
        )
        .draw(c)?;

        let track = size.width.saturating_sub(24);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let filled = (track as f32 * fill.clamp(0.0, 1.0)) as u32;
        let y = i32::try_from(size.height).unwrap_or_default() - 14;
        Rectangle::new(Point::new(12, y), Size::new(track, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::new(0x30, 0x30, 0x38)))
            .draw(c)?;
        Rectangle::new(Point::new(12, y), Size::new(filled, 4))
            .into_styled(PrimitiveStyle::with_fill(accent))
            .draw(c)?;
        Ok(())
    })
}

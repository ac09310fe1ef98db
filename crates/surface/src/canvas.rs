//! Drawing surface for module images
//!
//! [`Canvas`] lets modules render with embedded-graphics primitives and mono
//! fonts, then hand the result to the device as an [`RgbaImage`].

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use image::{Rgba, RgbaImage};

/// Opaque RGBA image that implements [`DrawTarget`].
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a canvas filled with opaque black.
    pub fn new(size: Size) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 255])),
        }
    }

    /// Create a fully transparent canvas.
    ///
    /// Useful for strip layers that should only cover part of their area.
    pub fn transparent(size: Size) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
        }
    }

    /// Borrow the pixels drawn so far.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Finish drawing and take the image.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Convert an embedded-graphics colour into an opaque RGBA pixel.
pub fn to_rgba(color: Rgb888) -> Rgba<u8> {
    Rgba([color.r(), color.g(), color.b(), 255])
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < width && y < height {
                self.image.put_pixel(x, y, to_rgba(color));
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let px = to_rgba(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

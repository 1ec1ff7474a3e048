use core::convert::Infallible;

use embedded_graphics::{
    image::{Image, ImageDrawable},
    mono_font::{ascii::FONT_8X13, MonoTextStyleBuilder},
    pixelcolor::{
        raw::{RawData, RawU16},
        Rgb565,
    },
    prelude::*,
    text::{Baseline, Text},
};

/// Packed RGB565, two bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 2;

/// Half length of a calibration crosshair arm.
const CROSS_ARM: i32 = 15;
/// Gap left open around the crosshair center.
const CROSS_GAP: i32 = 2;

/// The one primitive everything else is drawn with.
pub trait PixelSurface {
    fn size(&self) -> Size;

    /// Writes outside the surface are dropped.
    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565);

    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565>;

    /// Push pending pixels to the panel. Memory-backed surfaces need not
    /// do anything.
    fn flush(&mut self) {}
}

impl<S: PixelSurface + ?Sized> PixelSurface for &mut S {
    fn size(&self) -> Size {
        (**self).size()
    }
    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        (**self).set_pixel(x, y, color)
    }
    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        (**self).get_pixel(x, y)
    }
    fn flush(&mut self) {
        (**self).flush()
    }
}

/// A linear 16bpp pixel buffer, addressed as `x * 2 + y * stride`.
#[derive(Debug, Clone)]
pub struct FrameBuffer<B> {
    buffer: B,
    width: u32,
    height: u32,
    stride: usize,
}

impl<B> FrameBuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Returns `None` when `stride` cannot hold a row or `buffer` cannot
    /// hold `height` rows.
    pub fn new(buffer: B, width: u32, height: u32, stride: usize) -> Option<Self> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if stride < row_bytes {
            return None;
        }
        if height > 0 && buffer.as_ref().len() < stride * (height as usize - 1) + row_bytes {
            return None;
        }
        Some(Self {
            buffer,
            width,
            height,
            stride,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(x as usize * BYTES_PER_PIXEL + y as usize * self.stride)
    }
}

impl<B> PixelSurface for FrameBuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let word = RawU16::from(color).into_inner();
        self.buffer.as_mut()[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&word.to_le_bytes());
    }

    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        let offset = self.offset(x, y)?;
        let bytes = &self.buffer.as_ref()[offset..offset + BYTES_PER_PIXEL];
        let word = u16::from_le_bytes([bytes[0], bytes[1]]);
        Some(Rgb565::from(RawU16::new(word)))
    }
}

/// Lets embedded-graphics drawables (text, images) render through
/// [`PixelSurface::set_pixel`].
pub struct SurfaceTarget<'a, S: ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: PixelSurface + ?Sized> SurfaceTarget<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        Self { surface }
    }
}

impl<S: PixelSurface + ?Sized> OriginDimensions for SurfaceTarget<'_, S> {
    fn size(&self) -> Size {
        self.surface.size()
    }
}

impl<S: PixelSurface + ?Sized> DrawTarget for SurfaceTarget<'_, S> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.surface.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

/// Drawing primitives, available on every [`PixelSurface`].
pub trait Raster: PixelSurface {
    fn clear(&mut self, color: Rgb565) {
        let size = self.size();
        for y in 0..size.height as i32 {
            for x in 0..size.width as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Bresenham, both end points inclusive.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb565) {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let dx_abs = dx.abs();
        let dy_abs = dy.abs();
        let step_x = dx.signum();
        let step_y = dy.signum();

        let mut err_x = dy_abs >> 1;
        let mut err_y = dx_abs >> 1;
        let mut x = x1;
        let mut y = y1;

        self.set_pixel(x, y, color);

        if dx_abs >= dy_abs {
            // Shallow: one pixel per column.
            for _ in 0..dx_abs {
                err_y += dy_abs;
                if err_y >= dx_abs {
                    err_y -= dx_abs;
                    y += step_y;
                }
                x += step_x;
                self.set_pixel(x, y, color);
            }
        } else {
            // Steep: one pixel per row.
            for _ in 0..dy_abs {
                err_x += dx_abs;
                if err_x >= dy_abs {
                    err_x -= dy_abs;
                    x += step_x;
                }
                y += step_y;
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Outline from `(x0, y0)` to `(x1, y1)`, interior filled line by line
    /// when `fill` is given.
    fn draw_box(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, border: Rgb565, fill: Option<Rgb565>) {
        self.draw_line(x0, y0, x1, y0, border);
        self.draw_line(x1, y0, x1, y1, border);
        self.draw_line(x0, y0, x0, y1, border);
        self.draw_line(x0, y1, x1, y1, border);

        if let Some(fill) = fill {
            for row in 0..(y1 - y0 - 1) {
                let y = y0 + 1 + row;
                self.draw_line(x0 + 1, y, x1 - 1, y, fill);
            }
        }
    }

    /// Midpoint circle outline.
    fn draw_circle(&mut self, xc: i32, yc: i32, radius: u32, color: Rgb565) {
        let mut x = 0;
        let mut y = radius as i32;
        let mut p = 1 - radius as i32;

        while x < y {
            plot_octants(self, xc, yc, x, y, color);
            x += 1;
            if p < 0 {
                p += 2 * x + 1;
            } else {
                y -= 1;
                p += 2 * (x - y) + 1;
            }
            plot_octants(self, xc, yc, x, y, color);
        }
    }

    /// One pixel wide ring, `(r - 1)² < d² <= r²`.
    fn draw_ring(&mut self, xc: i32, yc: i32, radius: u32, color: Rgb565) {
        scan_disk(self, xc, yc, radius, color, false);
    }

    /// Solid disk in `fill`, outlined in `border` when the two differ.
    fn draw_circle_filled(&mut self, xc: i32, yc: i32, radius: u32, border: Rgb565, fill: Rgb565) {
        scan_disk(self, xc, yc, radius, fill, true);
        if fill != border {
            self.draw_circle(xc, yc, radius, border);
        }
    }

    /// Calibration target: four arms around `(x, y)`, center left open.
    fn draw_cross(&mut self, x: i32, y: i32, color: Rgb565) {
        self.draw_line(x - CROSS_ARM, y, x - CROSS_GAP, y, color);
        self.draw_line(x + CROSS_GAP, y, x + CROSS_ARM, y, color);
        self.draw_line(x, y - CROSS_ARM, x, y - CROSS_GAP, color);
        self.draw_line(x, y + CROSS_GAP, x, y + CROSS_ARM, color);
    }

    /// 2x2 touch marker.
    fn draw_point(&mut self, x: i32, y: i32, color: Rgb565) {
        self.set_pixel(x, y, color);
        self.set_pixel(x + 1, y, color);
        self.set_pixel(x, y + 1, color);
        self.set_pixel(x + 1, y + 1, color);
    }

    /// Renders `text` with its top left corner at `(x, y)`. Returns the
    /// position right after the last glyph.
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        color: Rgb565,
        background: Option<Rgb565>,
    ) -> Point {
        let mut style = MonoTextStyleBuilder::new().font(&FONT_8X13).text_color(color);
        if let Some(background) = background {
            style = style.background_color(background);
        }

        let mut target = SurfaceTarget::new(self);
        Text::with_baseline(text, Point::new(x, y), style.build(), Baseline::Top)
            .draw(&mut target)
            .unwrap_or_else(|never| match never {})
    }

    fn draw_image<I>(&mut self, image: &I, top_left: Point)
    where
        I: ImageDrawable<Color = Rgb565>,
    {
        let mut target = SurfaceTarget::new(self);
        Image::new(image, top_left)
            .draw(&mut target)
            .unwrap_or_else(|never| match never {})
    }
}

impl<S: PixelSurface + ?Sized> Raster for S {}

fn plot_octants<S: PixelSurface + ?Sized>(surface: &mut S, xc: i32, yc: i32, x: i32, y: i32, color: Rgb565) {
    surface.set_pixel(xc + x, yc + y, color);
    surface.set_pixel(xc - x, yc + y, color);
    surface.set_pixel(xc + x, yc - y, color);
    surface.set_pixel(xc - x, yc - y, color);
    surface.set_pixel(xc + y, yc + x, color);
    surface.set_pixel(xc - y, yc + x, color);
    surface.set_pixel(xc + y, yc - x, color);
    surface.set_pixel(xc - y, yc - x, color);
}

fn scan_disk<S: PixelSurface + ?Sized>(
    surface: &mut S,
    xc: i32,
    yc: i32,
    radius: u32,
    color: Rgb565,
    solid: bool,
) {
    let r = radius as i32;
    let r_sq_min = (r - 1) * (r - 1);
    let r_sq_max = r * r;

    for dy in -r..r {
        for dx in -r..r {
            let d_sq = dx * dx + dy * dy;
            let on_ring = r_sq_min < d_sq && d_sq <= r_sq_max;
            let in_disk = solid && d_sq <= r_sq_max;
            if on_ring || in_disk {
                surface.set_pixel(xc + dx, yc + dy, color);
            }
        }
    }
}

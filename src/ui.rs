use std::{fs, ops::ControlFlow, path::Path};

use ads7843::{
    buttons::{ButtonRect, ButtonRegistry, ButtonStyle},
    raster::Raster,
};
use derivative::Derivative;
use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::{Point, Size},
};
use log::{error, info, warn};
use strum::VariantArray;
use tinybmp::Bmp;

use crate::errors::Result;

/// On-screen buttons. Declaration order is the handle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::VariantArray)]
pub enum ButtonAction {
    Image,
    On,
    Off,
    Exit,
    Up,
    Down,
}

impl ButtonAction {
    pub fn handle(self) -> usize {
        self as usize
    }

    pub fn from_handle(handle: usize) -> Option<Self> {
        Self::VARIANTS.get(handle).copied()
    }

    fn origin(self) -> Point {
        match self {
            ButtonAction::Image => Point::new(260, 10),
            ButtonAction::On => Point::new(260, 50),
            ButtonAction::Off => Point::new(260, 90),
            ButtonAction::Exit => Point::new(260, 140),
            ButtonAction::Up => Point::new(60, 10),
            ButtonAction::Down => Point::new(60, 50),
        }
    }
}

#[derive(Debug, Clone, Copy, Derivative)]
#[derivative(Default)]
pub struct Theme {
    #[derivative(Default(value = "Rgb565::BLACK"))]
    pub background: Rgb565,
    #[derivative(Default(value = "Rgb565::YELLOW"))]
    pub border: Rgb565,
    #[derivative(Default(value = "Some(Rgb565::BLUE)"))]
    pub fill: Option<Rgb565>,
    #[derivative(Default(value = "Size::new(55, 30)"))]
    pub button_size: Size,
    #[derivative(Default(value = "Point::new(3, 7)"))]
    pub label_offset: Point,
}

impl Theme {
    fn button_style(&self) -> ButtonStyle {
        ButtonStyle::new(self.border, self.fill, self.label_offset)
    }
}

/// A BMP file kept in memory, drawn on demand.
pub struct Picture {
    data: Vec<u8>,
    origin: Point,
}

impl Picture {
    pub fn load(path: &Path, origin: Point) -> Result<Self> {
        let data = fs::read(path)?;
        Bmp::<Rgb565>::from_slice(&data)?;
        info!("Loaded {}", path.display());

        Ok(Self { data, origin })
    }

    fn draw<S: Raster>(&self, surface: &mut S) -> Result<()> {
        let bmp = Bmp::<Rgb565>::from_slice(&self.data)?;
        surface.draw_image(&bmp, self.origin);
        Ok(())
    }
}

pub struct Ui {
    theme: Theme,
    picture: Option<Picture>,
}

impl Ui {
    pub fn new(theme: Theme, picture: Option<Picture>) -> Self {
        Self { theme, picture }
    }

    /// Paints the background and registers every button.
    pub fn draw<S: Raster, const N: usize>(
        &self,
        buttons: &mut ButtonRegistry<N>,
        surface: &mut S,
    ) -> Result<()> {
        let Size { width, height } = self.theme.button_size;

        surface.clear(self.theme.background);
        for action in ButtonAction::VARIANTS {
            let origin = action.origin();
            let rect = ButtonRect::with_size(origin.x, origin.y, width as i32, height as i32);
            buttons.register(
                action.handle(),
                rect,
                self.theme.button_style(),
                &action.to_string(),
                surface,
            )?;
        }
        surface.flush();

        Ok(())
    }

    pub fn on_press<S: Raster, const N: usize>(
        &self,
        handle: usize,
        buttons: &mut ButtonRegistry<N>,
        surface: &mut S,
    ) -> ControlFlow<()> {
        let Some(action) = ButtonAction::from_handle(handle) else {
            warn!("No action for button {handle}");
            return ControlFlow::Continue(());
        };

        match action {
            ButtonAction::Image => match &self.picture {
                Some(picture) => {
                    if let Err(e) = picture.draw(surface) {
                        error!("{e}");
                    }
                    surface.flush();
                }
                None => info!("No image configured"),
            },
            ButtonAction::On => {
                surface.clear(self.theme.background);
                buttons.redraw(surface);
                surface.flush();
            }
            ButtonAction::Off | ButtonAction::Up | ButtonAction::Down => info!("{action}"),
            ButtonAction::Exit => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads7843::raster::{FrameBuffer, PixelSurface};
    use tempfile::tempdir;

    fn screen() -> FrameBuffer<Vec<u8>> {
        FrameBuffer::new(vec![0; 320 * 240 * 2], 320, 240, 640).unwrap()
    }

    /// 2x1, 24 bpp: a red pixel then a blue one.
    fn tiny_bmp() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&62u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&54u32.to_le_bytes());

        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&2835u32.to_le_bytes());
        data.extend_from_slice(&2835u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        // BGR, row padded to four bytes
        data.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]);
        data
    }

    fn laid_out() -> (Ui, ButtonRegistry, FrameBuffer<Vec<u8>>) {
        let ui = Ui::new(Theme::default(), None);
        let mut buttons = ButtonRegistry::new();
        let mut fb = screen();
        ui.draw(&mut buttons, &mut fb).unwrap();
        (ui, buttons, fb)
    }

    #[test]
    fn layout_matches_handles() {
        let (_, buttons, fb) = laid_out();

        let labels: Vec<_> = buttons.iter().map(|(handle, b)| (handle, b.label())).collect();
        assert_eq!(
            labels,
            [(0, "Image"), (1, "On"), (2, "Off"), (3, "Exit"), (4, "Up"), (5, "Down")]
        );
        assert_eq!(buttons.get(3).unwrap().rect(), ButtonRect::new(260, 140, 315, 170));
        assert_eq!(fb.get_pixel(60, 10), Some(Rgb565::YELLOW));
        assert_eq!(fb.get_pixel(114, 38), Some(Rgb565::BLUE));
    }

    #[test]
    fn actions_by_handle() {
        assert_eq!(ButtonAction::from_handle(0), Some(ButtonAction::Image));
        assert_eq!(ButtonAction::from_handle(3), Some(ButtonAction::Exit));
        assert_eq!(ButtonAction::from_handle(6), None);
        assert_eq!(ButtonAction::Down.handle(), 5);
    }

    #[test]
    fn exit_breaks() {
        let (ui, mut buttons, mut fb) = laid_out();
        assert_eq!(ui.on_press(3, &mut buttons, &mut fb), ControlFlow::Break(()));
        assert_eq!(ui.on_press(2, &mut buttons, &mut fb), ControlFlow::Continue(()));
        assert_eq!(ui.on_press(17, &mut buttons, &mut fb), ControlFlow::Continue(()));
    }

    #[test]
    fn on_repaints_the_layout() {
        let (ui, mut buttons, mut fb) = laid_out();
        fb.draw_box(0, 0, 319, 239, Rgb565::RED, Some(Rgb565::RED));

        assert_eq!(ui.on_press(1, &mut buttons, &mut fb), ControlFlow::Continue(()));
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb565::BLACK));
        assert_eq!(fb.get_pixel(260, 10), Some(Rgb565::YELLOW));
    }

    #[test]
    fn image_button_draws_the_picture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.bmp");
        fs::write(&path, tiny_bmp()).unwrap();

        let picture = Picture::load(&path, Point::new(100, 100)).unwrap();
        let ui = Ui::new(Theme::default(), Some(picture));
        let mut buttons = ButtonRegistry::<20>::new();
        let mut fb = screen();

        assert_eq!(ui.on_press(0, &mut buttons, &mut fb), ControlFlow::Continue(()));
        assert_eq!(fb.get_pixel(100, 100), Some(Rgb565::RED));
        assert_eq!(fb.get_pixel(101, 100), Some(Rgb565::BLUE));
    }

    #[test]
    fn image_button_without_picture_does_nothing() {
        let (ui, mut buttons, mut fb) = laid_out();
        let before = fb.as_bytes().to_vec();
        let _ = ui.on_press(0, &mut buttons, &mut fb);
        assert_eq!(fb.as_bytes(), before);
    }

    #[test]
    fn garbage_image_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bmp");
        fs::write(&path, b"not a bitmap").unwrap();
        assert!(Picture::load(&path, Point::zero()).is_err());
    }
}

use crate::{
    errors::{Error, Result},
    raster::Raster,
};

use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::Point,
};
use embedded_hal::delay::DelayNs;
use heapless::String;
use log::debug;

/// Longest label a button can carry, in bytes.
pub const LABEL_CAPACITY: usize = 49;

/// Button slots in a registry unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 20;

/// How long a pressed button stays inverted.
pub const DEFAULT_FEEDBACK_MS: u32 = 150;

/// Corners of a button, both inclusive for drawing. Hit testing only counts
/// points strictly inside.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ButtonRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ButtonRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn with_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub const fn is_valid(&self) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1
    }

    pub const fn top_left(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x > self.x0 && point.x < self.x1 && point.y > self.y0 && point.y < self.y1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ButtonStyle {
    /// Outline and label color.
    pub border: Rgb565,
    /// Body and label background. `None` leaves the body see-through.
    pub fill: Option<Rgb565>,
    /// Label position relative to the top left corner.
    pub label_offset: Point,
}

impl ButtonStyle {
    pub const fn new(border: Rgb565, fill: Option<Rgb565>, label_offset: Point) -> Self {
        Self {
            border,
            fill,
            label_offset,
        }
    }

    /// Colors swapped, for press feedback.
    fn inverted(&self) -> Self {
        Self {
            border: self.fill.unwrap_or(Rgb565::BLACK),
            fill: Some(self.border),
            label_offset: self.label_offset,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Button {
    rect: ButtonRect,
    style: ButtonStyle,
    label: String<LABEL_CAPACITY>,
    pressed: bool,
    // Set while the contact dwells inside, so a dwell is one press.
    inside: bool,
}

impl Button {
    pub fn rect(&self) -> ButtonRect {
        self.rect
    }

    pub fn style(&self) -> ButtonStyle {
        self.style
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn draw<S: Raster>(&self, surface: &mut S, style: &ButtonStyle) {
        let ButtonRect { x0, y0, x1, y1 } = self.rect;
        let label = self.rect.top_left() + style.label_offset;

        surface.draw_box(x0, y0, x1, y1, style.border, style.fill);
        surface.draw_text(label.x, label.y, &self.label, style.border, style.fill);
    }
}

/// Fixed table of on-screen buttons addressed by handle.
///
/// Presses are edge triggered: a button is pressed on the frame a contact
/// enters it, and stays pressed until [`consume_press`](Self::consume_press)
/// reports it or a later frame lands outside it.
pub struct ButtonRegistry<const N: usize = DEFAULT_CAPACITY> {
    buttons: [Option<Button>; N],
    feedback_ms: u32,
}

impl<const N: usize> Default for ButtonRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ButtonRegistry<N> {
    pub fn new() -> Self {
        Self {
            buttons: core::array::from_fn(|_| None),
            feedback_ms: DEFAULT_FEEDBACK_MS,
        }
    }

    pub fn with_feedback_ms(mut self, feedback_ms: u32) -> Self {
        self.feedback_ms = feedback_ms;
        self
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Draws a button and stores it at `handle`, replacing whatever was
    /// there. Nothing is drawn or stored when the button is rejected.
    pub fn register<S: Raster>(
        &mut self,
        handle: usize,
        rect: ButtonRect,
        style: ButtonStyle,
        label: &str,
        surface: &mut S,
    ) -> Result<()> {
        let slot = self.buttons.get_mut(handle).ok_or(Error::HandleOutOfRange {
            handle,
            capacity: N,
        })?;

        if !rect.is_valid() {
            return Err(Error::InvalidButtonGeometry { handle });
        }

        let label = String::try_from(label).map_err(|_| Error::LabelTooLong { handle })?;

        let button = Button {
            rect,
            style,
            label,
            pressed: false,
            inside: false,
        };
        button.draw(surface, &style);
        *slot = Some(button);

        Ok(())
    }

    /// Forgets a button. Its pixels stay on screen.
    pub fn unregister(&mut self, handle: usize) -> Option<Button> {
        self.buttons.get_mut(handle)?.take()
    }

    pub fn get(&self, handle: usize) -> Option<&Button> {
        self.buttons.get(handle)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Button)> {
        self.buttons
            .iter()
            .enumerate()
            .filter_map(|(handle, button)| Some((handle, button.as_ref()?)))
    }

    /// Draws every registered button in its normal state. The caller flushes.
    pub fn redraw<S: Raster>(&self, surface: &mut S) {
        for (_, button) in self.iter() {
            button.draw(surface, &button.style);
        }
    }

    /// Feeds one mapped contact point through every button.
    ///
    /// A button the point enters is marked pressed and flashes inverted for
    /// the feedback time. Buttons the point is outside of are cleared.
    /// Returns the lowest handle pressed by this frame.
    pub fn update_hit_test<S, DELAY>(
        &mut self,
        point: Point,
        surface: &mut S,
        delay: &mut DELAY,
    ) -> Option<usize>
    where
        S: Raster,
        DELAY: DelayNs,
    {
        let mut first = None;

        for (handle, slot) in self.buttons.iter_mut().enumerate() {
            let Some(button) = slot else {
                continue;
            };

            if !button.rect.contains(point) {
                button.pressed = false;
                button.inside = false;
                continue;
            }

            if button.inside {
                continue;
            }

            debug!("button {handle} entered at {} {}", point.x, point.y);
            button.inside = true;
            button.pressed = true;
            first.get_or_insert(handle);

            button.draw(surface, &button.style.inverted());
            surface.flush();
            delay.delay_ms(self.feedback_ms);
            button.draw(surface, &button.style);
            surface.flush();
        }

        first
    }

    /// The contact was lifted. Unconsumed presses survive.
    pub fn release(&mut self) {
        for button in self.buttons.iter_mut().flatten() {
            button.inside = false;
        }
    }

    /// Takes the lowest pending press, if any.
    pub fn consume_press(&mut self) -> Option<usize> {
        self.buttons
            .iter_mut()
            .enumerate()
            .find_map(|(handle, slot)| {
                let button = slot.as_mut()?;
                if button.pressed {
                    button.pressed = false;
                    Some(handle)
                } else {
                    None
                }
            })
    }
}

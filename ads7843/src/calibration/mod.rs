use crate::{
    ads7843::Ads7843,
    errors::{Error, Result},
    raster::Raster,
    RawPoint, SampleSource, TouchError,
};

use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::Point,
};
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use serde_derive::{Deserialize, Serialize};

// Three-point method from TI SLYT277 "Calibration in Touch-Screen Systems",
// in the "matrix + shared divider" form: for integer inputs every
// coefficient is an exact integer.

/// A point widened to f64.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CalibrationPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for CalibrationPoint {
    fn from(value: Point) -> Self {
        Self {
            x: value.x.into(),
            y: value.y.into(),
        }
    }
}

impl From<RawPoint> for CalibrationPoint {
    fn from(value: RawPoint) -> Self {
        Self {
            x: value.x.into(),
            y: value.y.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalibrationSet {
    pub a: CalibrationPoint,
    pub b: CalibrationPoint,
    pub c: CalibrationPoint,
}

impl From<&[Point; 3]> for CalibrationSet {
    fn from(points: &[Point; 3]) -> Self {
        Self {
            a: points[0].into(),
            b: points[1].into(),
            c: points[2].into(),
        }
    }
}

impl From<&[RawPoint; 3]> for CalibrationSet {
    fn from(points: &[RawPoint; 3]) -> Self {
        Self {
            a: points[0].into(),
            b: points[1].into(),
            c: points[2].into(),
        }
    }
}

/// Raw to display transform:
///
/// ```text
/// Xd = (a * Xr + b * Yr + c) / divider
/// Yd = (d * Xr + e * Yr + f) / divider
/// ```
///
/// A zero `divider` marks the matrix as unusable.
///
/// Field order is the persisted record layout, don't reorder.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub divider: f64,
}

impl Default for CalibrationMatrix {
    fn default() -> Self {
        CalibrationMatrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 1.0,
            f: 0.0,
            divider: 1.0,
        }
    }
}

impl CalibrationMatrix {
    pub fn is_usable(&self) -> bool {
        self.divider != 0.0 && self.divider.is_finite()
    }

    /// Maps a filtered raw reading to display space, truncating toward zero.
    /// `None` when the matrix is unusable.
    pub fn map(&self, raw: RawPoint) -> Option<Point> {
        if !self.is_usable() {
            return None;
        }

        let x = raw.x as f64;
        let y = raw.y as f64;

        let display_x = (self.a * x + self.b * y + self.c) / self.divider;
        let display_y = (self.d * x + self.e * y + self.f) / self.divider;

        Some(Point::new(display_x as i32, display_y as i32))
    }
}

/// Reference targets shown during calibration. Not collinear.
pub const CALIBRATION_POINTS: [Point; 3] = [
    Point::new(45, 45),
    Point::new(45, 195),
    Point::new(190, 190),
];

const PROMPT: &str = "Touch crosshair to calibrate";

/// Pause after each captured target so the next one isn't hit by the same tap.
const SETTLE_MS: u32 = 200;
const RETRY_MS: u32 = 10;

/// Fits the transform that takes each `raw[i]` onto `display[i]`.
///
/// Fails with [`Error::DegenerateCalibration`] when the raw points are
/// collinear or coincident; nothing is produced in that case.
pub fn solve(display: &[Point; 3], raw: &[RawPoint; 3]) -> Result<CalibrationMatrix> {
    calibration_math(&CalibrationSet::from(display), &CalibrationSet::from(raw))
}

pub fn calibration_math(
    screen_space_points: &CalibrationSet,
    touch_space_points: &CalibrationSet,
) -> Result<CalibrationMatrix> {
    // Just shortening names for easier reading
    let screen = screen_space_points;
    let touch = touch_space_points;

    let divider = ((touch.a.x - touch.c.x) * (touch.b.y - touch.c.y))
        - ((touch.b.x - touch.c.x) * (touch.a.y - touch.c.y));

    if divider == 0.0 {
        return Err(Error::DegenerateCalibration);
    }

    let a = ((screen.a.x - screen.c.x) * (touch.b.y - touch.c.y))
        - ((screen.b.x - screen.c.x) * (touch.a.y - touch.c.y));

    let b = ((touch.a.x - touch.c.x) * (screen.b.x - screen.c.x))
        - ((screen.a.x - screen.c.x) * (touch.b.x - touch.c.x));

    let c = (touch.c.x * screen.b.x - touch.b.x * screen.c.x) * touch.a.y
        + (touch.a.x * screen.c.x - touch.c.x * screen.a.x) * touch.b.y
        + (touch.b.x * screen.a.x - touch.a.x * screen.b.x) * touch.c.y;

    let d = ((screen.a.y - screen.c.y) * (touch.b.y - touch.c.y))
        - ((screen.b.y - screen.c.y) * (touch.a.y - touch.c.y));

    let e = ((touch.a.x - touch.c.x) * (screen.b.y - screen.c.y))
        - ((screen.a.y - screen.c.y) * (touch.b.x - touch.c.x));

    let f = (touch.c.x * screen.b.y - touch.b.x * screen.c.y) * touch.a.y
        + (touch.a.x * screen.c.y - touch.c.x * screen.a.y) * touch.b.y
        + (touch.b.x * screen.a.y - touch.a.x * screen.b.y) * touch.c.y;

    Ok(CalibrationMatrix {
        a,
        b,
        c,
        d,
        e,
        f,
        divider,
    })
}

impl<SRC> Ads7843<SRC>
where
    SRC: SampleSource,
{
    /// Takes over the screen to calibrate touch input.
    ///
    /// Shows a crosshair on each of `targets` in turn and waits for a clean
    /// filtered reading on it. On success the new matrix is installed and
    /// returned; on [`Error::DegenerateCalibration`] the previous one is kept.
    pub fn intrusive_calibration<S, DELAY>(
        &mut self,
        surface: &mut S,
        delay: &mut DELAY,
        targets: &[Point; 3],
    ) -> Result<CalibrationMatrix>
    where
        S: Raster,
        DELAY: DelayNs,
    {
        let mut touched = [RawPoint::default(); 3];

        for (index, (target, slot)) in targets.iter().zip(touched.iter_mut()).enumerate() {
            surface.clear(Rgb565::BLACK);
            surface.draw_text(10, 10, PROMPT, Rgb565::WHITE, Some(Rgb565::BLACK));
            surface.draw_cross(target.x, target.y, Rgb565::WHITE);
            surface.flush();

            *slot = self.acquire_blocking(delay);
            info!("cal: {index}  x: {:4} y: {:4}", slot.x, slot.y);

            surface.draw_cross(target.x, target.y, Rgb565::RED);
            surface.flush();

            self.wait_for_release(delay);
            delay.delay_ms(SETTLE_MS);
        }

        surface.clear(Rgb565::BLACK);
        surface.flush();

        let matrix = solve(targets, &touched)?;
        debug!("calibration: {matrix:?}");
        self.set_calibration(matrix);
        Ok(matrix)
    }

    /// Keeps reading until a burst survives the noise filter.
    fn acquire_blocking<DELAY: DelayNs>(&mut self, delay: &mut DELAY) -> RawPoint {
        loop {
            match self.read() {
                Ok(Some(point)) => return point,
                Ok(None) => (),
                Err(TouchError::Panel(e)) => debug!("{e}"),
                Err(TouchError::Sensor(e)) => {
                    warn!("touch read failed: {e}");
                    delay.delay_ms(RETRY_MS);
                }
            }
        }
    }

    fn wait_for_release<DELAY: DelayNs>(&mut self, delay: &mut DELAY) {
        loop {
            match self.source_mut().read_raw_sample() {
                Ok(None) => return,
                Ok(Some(_)) => (),
                Err(e) => {
                    warn!("touch read failed: {e}");
                    delay.delay_ms(RETRY_MS);
                }
            }
        }
    }
}

use core::ops::ControlFlow;

use crate::{
    buttons::{ButtonRegistry, DEFAULT_CAPACITY},
    raster::Raster,
    Ads7843, Error, SampleSource, TouchError,
};

use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, trace};

/// Outcome of one pass through the touch pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// A button was pressed on this pass.
    Pressed(usize),
    /// Contact at a display point that pressed nothing new.
    Touched(Point),
    /// No contact.
    Released,
    /// The reading was thrown away, either as noise or because it could not
    /// be mapped.
    Discarded(Error),
}

/// Owns the sampler, its calibration and the button table.
pub struct Panel<SRC, const N: usize = DEFAULT_CAPACITY> {
    touch: Ads7843<SRC>,
    buttons: ButtonRegistry<N>,
}

impl<SRC, const N: usize> Panel<SRC, N>
where
    SRC: SampleSource,
{
    pub fn new(touch: Ads7843<SRC>, buttons: ButtonRegistry<N>) -> Self {
        Self { touch, buttons }
    }

    pub fn buttons(&self) -> &ButtonRegistry<N> {
        &self.buttons
    }

    pub fn into_parts(self) -> (Ads7843<SRC>, ButtonRegistry<N>) {
        (self.touch, self.buttons)
    }

    /// Acquire, filter, map, hit test and consume, once. Never retries.
    pub fn step<S, DELAY>(
        &mut self,
        surface: &mut S,
        delay: &mut DELAY,
    ) -> Result<Step, TouchError<SRC::Error>>
    where
        S: Raster,
        DELAY: DelayNs,
    {
        let raw = match self.touch.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.buttons.release();
                return Ok(Step::Released);
            }
            Err(TouchError::Panel(reason)) => return Ok(Step::Discarded(reason)),
            Err(e) => return Err(e),
        };

        let point = match self.touch.display_point(raw) {
            Ok(point) => point,
            Err(reason) => return Ok(Step::Discarded(reason)),
        };

        self.buttons.update_hit_test(point, surface, delay);

        Ok(match self.buttons.consume_press() {
            Some(handle) => Step::Pressed(handle),
            None => Step::Touched(point),
        })
    }

    /// Runs the pipeline until `on_press` breaks, and returns what it broke
    /// with. Sensor errors are logged and the pass skipped.
    pub fn run<S, DELAY, F, B>(&mut self, surface: &mut S, delay: &mut DELAY, mut on_press: F) -> B
    where
        S: Raster,
        DELAY: DelayNs,
        F: FnMut(usize, &mut ButtonRegistry<N>, &mut S) -> ControlFlow<B>,
    {
        loop {
            match self.step(surface, delay) {
                Ok(Step::Pressed(handle)) => {
                    info!("Pressed button {handle:02}");
                    if let ControlFlow::Break(value) = on_press(handle, &mut self.buttons, surface) {
                        return value;
                    }
                }
                Ok(Step::Touched(point)) => trace!("touch {} {}", point.x, point.y),
                Ok(Step::Released) => (),
                Ok(Step::Discarded(reason)) => debug!("{reason}"),
                Err(e) => error!("{e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buttons::{ButtonRect, ButtonStyle},
        calibration::CalibrationMatrix,
        testing::{screen, Clock, Script},
        RawPoint,
    };

    use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

    fn panel(script: Script, calibration: Option<CalibrationMatrix>) -> Panel<Script> {
        let mut buttons = ButtonRegistry::new().with_feedback_ms(0);
        let style = ButtonStyle::new(Rgb565::YELLOW, Some(Rgb565::BLUE), Point::new(3, 7));
        buttons
            .register(0, ButtonRect::new(10, 10, 60, 40), style, "Go", &mut screen())
            .unwrap();
        buttons
            .register(3, ButtonRect::with_size(100, 10, 55, 30), style, "Exit", &mut screen())
            .unwrap();
        Panel::new(Ads7843::new(script, calibration), buttons)
    }

    // Identity calibration: raw units are pixels.
    fn identity() -> Option<CalibrationMatrix> {
        Some(CalibrationMatrix::default())
    }

    #[test]
    fn steps_follow_the_contact() {
        let on_button = RawPoint::new(35, 25);
        let script = Script::default()
            .hold(on_button)
            .hold(on_button)
            .lift()
            .hold(on_button)
            .hold(RawPoint::new(5, 5));
        let mut panel = panel(script, identity());
        let (mut fb, mut clock) = (screen(), Clock::default());

        let mut step = || panel.step(&mut fb, &mut clock).unwrap();
        assert_eq!(step(), Step::Pressed(0));
        assert_eq!(step(), Step::Touched(Point::new(35, 25)));
        assert_eq!(step(), Step::Released);
        assert_eq!(step(), Step::Pressed(0));
        assert_eq!(step(), Step::Touched(Point::new(5, 5)));
    }

    #[test]
    fn noise_and_unmapped_are_discarded() {
        let mut script = Script::default();
        for x in [100, 100, 100, 200, 200, 200, 300, 300, 300] {
            script = script.push(RawPoint::new(x, 20));
        }
        let mut fb = screen();
        let mut clock = Clock::default();

        let mut noisy = panel(script, identity());
        assert_eq!(
            noisy.step(&mut fb, &mut clock).unwrap(),
            Step::Discarded(Error::NoiseRejected)
        );

        let mut uncalibrated = panel(Script::default().hold(RawPoint::new(35, 25)), None);
        assert_eq!(
            uncalibrated.step(&mut fb, &mut clock).unwrap(),
            Step::Discarded(Error::Unmapped)
        );
        assert!(uncalibrated.buttons().get(0).is_some_and(|b| !b.is_pressed()));
    }

    #[test]
    fn sensor_errors_surface_from_step() {
        let mut panel = panel(Script::default().fail(), identity());
        let result = panel.step(&mut screen(), &mut Clock::default());
        assert!(matches!(result, Err(TouchError::Sensor("sensor fault"))));
    }

    #[test]
    fn run_dispatches_until_break() {
        let script = Script::default()
            .hold(RawPoint::new(35, 25))
            .fail()
            .lift()
            .push(RawPoint::new(1, 1))
            .lift()
            .hold(RawPoint::new(120, 20));
        let mut panel = panel(script, identity());
        let mut seen = Vec::new();

        let last = panel.run(&mut screen(), &mut Clock::default(), |handle, buttons, _| {
            seen.push(handle);
            assert!(buttons.get(handle).is_some());
            if handle == 3 {
                ControlFlow::Break(handle)
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(last, 3);
        assert_eq!(seen, [0, 3]);
        assert_eq!(panel.into_parts().0.into_inner().remaining(), 0);
    }
}

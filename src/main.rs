use std::{thread, time::Duration};

use ads7843::{
    buttons::ButtonRegistry,
    calibration::{CalibrationMatrix, CALIBRATION_POINTS},
    panel::Panel,
    Ads7843,
};
use anyhow::Context;
use clap::Parser;
use embedded_hal::delay::DelayNs;
use env_logger::Env;
use log::{error, info};

mod errors;
mod fbdev;
mod input;
mod settings;
mod store;
mod ui;

use fbdev::FbDevice;
use input::EvdevTouch;
use settings::Settings;
use store::StoreError;
use ui::{Picture, Theme, Ui};

/// Sleeps the calling thread.
struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::parse();

    let mut screen = FbDevice::open(&settings.framebuffer)
        .with_context(|| format!("opening {}", settings.framebuffer.display()))?;
    let input = evdev::Device::open(&settings.input)
        .with_context(|| format!("opening {}", settings.input.display()))?;
    let mut delay = StdDelay;

    let picture = settings
        .image
        .as_deref()
        .map(|path| Picture::load(path, settings.image_origin))
        .transpose()?;

    let touch_calibration: Option<CalibrationMatrix> = if settings.recalibrate {
        None
    } else {
        match store::load(&settings.calibration_file) {
            Ok(matrix) => Some(matrix),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                error!("Failed to load touch calibration: {e}");
                None
            }
        }
    };

    let mut touch = Ads7843::new(EvdevTouch::new(input), touch_calibration)
        .with_threshold(settings.noise_threshold);

    if !touch.calibrated() {
        let output = touch
            .intrusive_calibration(&mut screen, &mut delay, &CALIBRATION_POINTS)
            .context("touch calibration failed, please try again")?;
        info!("{output:#?}");
        store::save_or_log(&settings.calibration_file, &output);
    }

    let ui = Ui::new(Theme::default(), picture);
    let mut buttons = ButtonRegistry::new().with_feedback_ms(settings.feedback_ms);
    ui.draw(&mut buttons, &mut screen)?;

    let mut panel: Panel<_> = Panel::new(touch, buttons);
    panel.run(&mut screen, &mut delay, |handle, buttons, screen| {
        ui.on_press(handle, buttons, screen)
    });

    info!("Exiting");
    screen.close()?;

    Ok(())
}

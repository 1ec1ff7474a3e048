use std::path::PathBuf;

use ads7843::{buttons::DEFAULT_FEEDBACK_MS, filter::DEFAULT_THRESHOLD};
use clap::Parser;
use embedded_graphics::prelude::Point;

/// Touch calibration and button demo for HY28A framebuffer LCDs
#[derive(Debug, Parser)]
#[command(name = "hy28a-lcd", version)]
pub struct Settings {
    /// Framebuffer device (e.g. /dev/fb1)
    pub framebuffer: PathBuf,

    /// Touch input event device (e.g. /dev/input/event2)
    pub input: PathBuf,

    /// Where the touch calibration is kept
    #[arg(long, default_value = "cal")]
    pub calibration_file: PathBuf,

    /// Calibrate even if a calibration file exists
    #[arg(long)]
    pub recalibrate: bool,

    /// Largest spread between sample groups, in raw units
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = clap::value_parser!(i32).range(0..))]
    pub noise_threshold: i32,

    /// How long a pressed button flashes, in milliseconds
    #[arg(long, default_value_t = DEFAULT_FEEDBACK_MS)]
    pub feedback_ms: u32,

    /// BMP shown by the "Image" button
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Top left corner of the image, as X,Y
    #[arg(long, default_value = "100,100", value_parser = parse_point)]
    pub image_origin: Point,
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {value:?}"))?;
    let parse = |part: &str| part.trim().parse::<i32>().map_err(|e| format!("{part:?}: {e}"));
    Ok(Point::new(parse(x)?, parse(y)?))
}

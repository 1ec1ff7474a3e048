use std::{
    fs::{self, File, OpenOptions},
    os::unix::fs::FileExt,
    path::{Path, PathBuf},
};

use ads7843::raster::{FrameBuffer, PixelSurface, Raster, BYTES_PER_PIXEL};
use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::Size,
};
use log::{error, info};

use crate::errors::{AppError, Result};

const SYSFS_GRAPHICS: &str = "/sys/class/graphics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Bytes per line.
    pub stride: usize,
}

impl Geometry {
    /// Reads the geometry the kernel exports for one framebuffer, e.g.
    /// `/sys/class/graphics/fb1`.
    pub fn read(dir: &Path) -> Result<Self> {
        let attribute = |name: &str| -> Result<String> { Ok(fs::read_to_string(dir.join(name))?) };

        Self::parse(
            &attribute("virtual_size")?,
            &attribute("bits_per_pixel")?,
            &attribute("stride")?,
        )
    }

    fn parse(virtual_size: &str, bits_per_pixel: &str, stride: &str) -> Result<Self> {
        let (width, height) = virtual_size
            .trim()
            .split_once(',')
            .ok_or_else(|| AppError::BadGeometry(format!("virtual_size {virtual_size:?}")))?;

        let number = |name: &str, value: &str| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|e| AppError::BadGeometry(format!("{name} {value:?}: {e}")))
        };

        let geometry = Geometry {
            width: number("width", width)?,
            height: number("height", height)?,
            bits_per_pixel: number("bits_per_pixel", bits_per_pixel)?,
            stride: number("stride", stride)? as usize,
        };

        if geometry.bits_per_pixel as usize != BYTES_PER_PIXEL * 8 {
            return Err(AppError::UnsupportedDepth {
                bits: geometry.bits_per_pixel,
            });
        }

        Ok(geometry)
    }
}

/// A 16 bpp Linux framebuffer. Drawing goes to an in-memory copy that
/// [`flush`](PixelSurface::flush) writes to the device.
pub struct FbDevice {
    file: File,
    path: PathBuf,
    shadow: FrameBuffer<Vec<u8>>,
}

impl FbDevice {
    /// Opens e.g. `/dev/fb1`, taking its geometry from sysfs.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .ok_or_else(|| AppError::BadGeometry(format!("{} is not a device", path.display())))?;
        let geometry = Geometry::read(&Path::new(SYSFS_GRAPHICS).join(name))?;

        Self::with_geometry(path, geometry)
    }

    pub fn with_geometry(path: &Path, geometry: Geometry) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let buffer = vec![0; geometry.stride * geometry.height as usize];
        let shadow = FrameBuffer::new(buffer, geometry.width, geometry.height, geometry.stride)
            .ok_or_else(|| AppError::BadGeometry(format!("{geometry:?}")))?;

        info!(
            "{}: {}x{}, {} bpp, stride {}",
            path.display(),
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel,
            geometry.stride
        );

        Ok(Self {
            file,
            path: path.to_owned(),
            shadow,
        })
    }

    /// Blanks the panel and lets go of the device. The video mode was never
    /// touched, so there is nothing to restore.
    pub fn close(mut self) -> Result<()> {
        self.shadow.clear(Rgb565::BLACK);
        self.file.write_all_at(self.shadow.as_bytes(), 0)?;
        Ok(())
    }
}

impl PixelSurface for FbDevice {
    fn size(&self) -> Size {
        self.shadow.size()
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        self.shadow.set_pixel(x, y, color);
    }

    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.shadow.get_pixel(x, y)
    }

    fn flush(&mut self) {
        if let Err(e) = self.file.write_all_at(self.shadow.as_bytes(), 0) {
            error!("{}: {e}", self.path.display());
        }
    }
}

#![cfg_attr(not(test), no_std)]

pub mod buttons;
pub mod calibration;
mod errors;
pub mod filter;
pub mod panel;
pub mod raster;
mod ads7843;

#[cfg(test)]
mod testing;

pub use ads7843::Ads7843;
pub use errors::{Error, TouchError};

// Touch pipeline for ADS7843-class resistive panels: 9-sample noise filter,
// three-point affine calibration and edge-triggered button hit testing.

/// A reading in raw sensor (ADC) space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPoint {
    pub x: i32,
    pub y: i32,
}

impl RawPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Something that can hand out raw touch readings, one per call.
///
/// `Ok(None)` means the read completed but decoded to nothing actionable,
/// most commonly because the contact was released.
pub trait SampleSource {
    type Error: ::core::fmt::Debug + ::core::fmt::Display;

    fn read_raw_sample(&mut self) -> ::core::result::Result<Option<RawPoint>, Self::Error>;
}

impl<T: SampleSource + ?Sized> SampleSource for &mut T {
    type Error = T::Error;

    fn read_raw_sample(&mut self) -> ::core::result::Result<Option<RawPoint>, Self::Error> {
        (**self).read_raw_sample()
    }
}

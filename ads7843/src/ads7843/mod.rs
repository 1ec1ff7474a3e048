use crate::{
    calibration::CalibrationMatrix,
    filter::{filter, DEFAULT_THRESHOLD, SAMPLE_COUNT},
    Error, RawPoint, SampleSource, TouchError,
};

use embedded_graphics::prelude::Point;
use log::trace;

/// Filtered, calibrated view over a raw touch source.
pub struct Ads7843<SRC> {
    source: SRC,
    calibration: Option<CalibrationMatrix>,
    threshold: i32,
}

impl<SRC> Ads7843<SRC>
where
    SRC: SampleSource,
{
    /// A `calibration` that can't map anything is treated as absent.
    pub fn new(source: SRC, calibration: Option<CalibrationMatrix>) -> Self {
        Self {
            source,
            calibration: calibration.filter(CalibrationMatrix::is_usable),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn calibration(&self) -> Option<&CalibrationMatrix> {
        self.calibration.as_ref()
    }

    pub fn set_calibration(&mut self, calibration: CalibrationMatrix) {
        self.calibration = Some(calibration);
    }

    pub fn source_mut(&mut self) -> &mut SRC {
        &mut self.source
    }

    pub fn into_inner(self) -> SRC {
        self.source
    }

    /// Reads a burst of raw samples and runs it through the noise filter.
    ///
    /// `Ok(None)` when the contact went away before the burst completed.
    pub fn read(&mut self) -> Result<Option<RawPoint>, TouchError<SRC::Error>> {
        let mut samples = [RawPoint::default(); SAMPLE_COUNT];

        for slot in samples.iter_mut() {
            match self.source.read_raw_sample().map_err(TouchError::Sensor)? {
                Some(point) => *slot = point,
                None => return Ok(None),
            }
        }

        let point = filter(&samples, self.threshold)?;
        trace!("filtered: {} {}", point.x, point.y);
        Ok(Some(point))
    }

    /// Maps a filtered reading to display coordinates.
    pub fn display_point(&self, raw: RawPoint) -> Result<Point, Error> {
        self.calibration
            .as_ref()
            .and_then(|matrix| matrix.map(raw))
            .ok_or(Error::Unmapped)
    }
}

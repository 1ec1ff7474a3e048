use core::fmt::{Debug, Display};

pub type Result<T> = ::core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("sample groups disagree beyond the noise threshold")]
    NoiseRejected,
    #[error("calibration points are collinear or coincident")]
    DegenerateCalibration,
    #[error("calibration divider is zero, point cannot be mapped")]
    Unmapped,
    #[error("button {handle} has an empty or inverted rectangle")]
    InvalidButtonGeometry { handle: usize },
    #[error("button handle {handle} is out of range (capacity {capacity})")]
    HandleOutOfRange { handle: usize, capacity: usize },
    #[error("label for button {handle} is longer than {} bytes", crate::buttons::LABEL_CAPACITY)]
    LabelTooLong { handle: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum TouchError<E: Debug + Display> {
    #[error("sensor read failed: {0}")]
    Sensor(E),
    #[error(transparent)]
    Panel(#[from] Error),
}

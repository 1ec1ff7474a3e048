pub type Result<T> = ::core::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
    #[error(transparent)]
    Panel(#[from] ads7843::Error),
    #[error("framebuffer uses {bits} bits per pixel, only 16 is supported")]
    UnsupportedDepth { bits: u32 },
    #[error("bad framebuffer geometry: {0}")]
    BadGeometry(String),
    #[error("{0:?}")]
    Bmp(tinybmp::ParseError),
}

impl From<tinybmp::ParseError> for AppError {
    fn from(value: tinybmp::ParseError) -> Self {
        Self::Bmp(value)
    }
}

use std::fmt::{Display, Formatter};

/// Error type for progress-ring rendering and rasterization.
#[derive(Debug)]
pub enum ImageError {
    /// The SVG could not be written to the cache.
    Generation(std::io::Error),
    /// The SVG could not be decoded, drawn or encoded as PNG.
    Rasterization(String),
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation(err) => write!(f, "write svg: {}", err),
            Self::Rasterization(err) => write!(f, "rasterize svg: {}", err),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<std::io::Error> for ImageError {
    fn from(value: std::io::Error) -> Self {
        Self::Generation(value)
    }
}

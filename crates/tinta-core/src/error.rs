use crate::filter::FilterId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
    #[error("cannot bind a LUT to filter `{0}`")]
    BindNone(FilterId),
    #[error("LUT image must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
    #[error("LUT side {side} is not divisible into a {grid}x{grid} tile grid")]
    BadTiling { side: u32, grid: u32 },
    #[error("failed to decode LUT image: {0}")]
    Decode(#[from] ::image::ImageError),
}

/// ASCII conversion engine for glyphcast.
///
/// Converts RGBA pixel frames to glyph grids: luminance pass, Sobel edge
/// sampling, per-cell mean color, weighted brightness blend, glyph mapping.
pub mod converter;
pub mod edge;
pub mod luminance;
pub mod sampler;

pub use converter::FrameConverter;
pub use luminance::LuminanceField;

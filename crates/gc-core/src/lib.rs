/// Shared types, configuration, and contracts for glyphcast.
///
/// This crate contains the types exchanged between the conversion engine,
/// the media sources, the render loop, and the export path.

pub mod config;
pub mod dims;
pub mod error;
pub mod frame;
pub mod ramp;
pub mod traits;

pub use config::RenderConfig;
pub use dims::{CHAR_ASPECT, OutputDimensions, plan};
pub use error::EngineError;
pub use frame::{AsciiCell, AsciiFrame, PixelBuffer};
pub use ramp::{GLYPH_RAMP, GlyphMapper};

/// Export layer for glyphcast: turns rendered glyph grids back into
/// pixels and encodes them to disk.
///
/// `rasterizer` paints an `AsciiFrame` into a high-resolution RGBA
/// buffer, `recorder` streams those buffers through ffmpeg into a
/// fragmented MP4 held in memory until the session stops, and `still`
/// writes single-frame PNG snapshots.
pub mod rasterizer;
pub mod recorder;
pub mod still;

pub use rasterizer::Rasterizer;
pub use recorder::{RecordingSession, RecordingSink};
pub use still::save_png;

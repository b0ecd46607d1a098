/// Pixel acquisition adapters for glyphcast (image files, video files).
///
/// Video decoding runs ffmpeg as a subprocess and streams raw RGBA frames
/// over a pipe; images are decoded once with the image crate.
pub mod image;
pub mod video;

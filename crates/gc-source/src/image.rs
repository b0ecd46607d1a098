use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gc_core::frame::PixelBuffer;
use gc_core::traits::Source;

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use gc_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("test.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<PixelBuffer>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded or decoded.
    pub fn new(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Impossible de charger {}", path.display()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let frame = PixelBuffer::from_rgba(rgba.into_raw(), width, height)
            .context("Buffer RGBA incohérent après décodage")?;
        Ok(Self {
            frame: Arc::new(frame),
        })
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Option<Arc<PixelBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }
}

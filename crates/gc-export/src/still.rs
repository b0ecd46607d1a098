use anyhow::{Context, Result};
use gc_core::error::EngineError;
use gc_core::frame::PixelBuffer;
use std::path::Path;

/// Écrit un buffer RGBA en PNG (snapshot d'une conversion one-shot).
///
/// # Errors
/// `EngineError::UnsupportedSource` si le buffer est incohérent,
/// erreur I/O si l'écriture échoue.
pub fn save_png(fb: &PixelBuffer, path: &Path) -> Result<()> {
    let img = image::RgbaImage::from_raw(fb.width, fb.height, fb.data.clone()).ok_or_else(
        || EngineError::UnsupportedSource("buffer RGBA incohérent pour l'export PNG".into()),
    )?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("écriture de {}", path.display()))?;
    log::info!("snapshot PNG écrit : {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.png");

        let mut fb = PixelBuffer::new(3, 2);
        fb.data[0] = 200; // R du pixel (0,0)
        fb.data[3] = 255;
        save_png(&fb, &path).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.width(), 3);
        assert_eq!(reloaded.height(), 2);
        assert_eq!(reloaded.get_pixel(0, 0)[0], 200);
    }
}

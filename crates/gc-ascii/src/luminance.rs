use gc_core::frame::PixelBuffer;

/// Per-pixel grayscale intensity map, recomputed once per frame.
///
/// Dense row-major `f32` buffer, same dimensions as the source. The buffer
/// is reused across frames and only reallocated when the source dimensions
/// change.
///
/// # Example
/// ```
/// use gc_ascii::luminance::LuminanceField;
/// use gc_core::frame::PixelBuffer;
///
/// let mut field = LuminanceField::new();
/// let buffer = PixelBuffer::new(10, 10);
/// field.compute(&buffer);
/// assert_eq!(field.at(0, 0), 0.0);
/// ```
pub struct LuminanceField {
    values: Vec<f32>,
    width: u32,
    height: u32,
}

impl Default for LuminanceField {
    fn default() -> Self {
        Self::new()
    }
}

impl LuminanceField {
    /// Create an empty field; the scratch buffer is sized on first `compute`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// One O(W×H) pass over the RGBA buffer.
    ///
    /// `lum = 0.299*R + 0.587*G + 0.114*B` — BT.601 perceptual weighting,
    /// reproduced exactly. Alpha is ignored. No per-pixel allocation.
    pub fn compute(&mut self, buffer: &PixelBuffer) {
        let len = buffer.width as usize * buffer.height as usize;
        if self.width != buffer.width || self.height != buffer.height {
            self.values.resize(len, 0.0);
            self.width = buffer.width;
            self.height = buffer.height;
        }

        for (px, lum) in buffer.data.chunks_exact(4).zip(self.values.iter_mut()) {
            *lum = 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
        }
    }

    /// Width of the field in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luminance at (x, y). Coordinates must be in bounds.
    #[inline(always)]
    #[must_use]
    pub fn at(&self, x: u32, y: u32) -> f32 {
        debug_assert!(x < self.width && y < self.height, "field out of bounds");
        self.values[(y * self.width + x) as usize]
    }

    /// Luminance échantillonnée avec coordonnées serrées aux bords
    /// (edge-replicate, pas de zero-padding).
    ///
    /// # Example
    /// ```
    /// use gc_ascii::luminance::LuminanceField;
    /// use gc_core::frame::PixelBuffer;
    ///
    /// let mut field = LuminanceField::new();
    /// field.compute(&PixelBuffer::new(4, 4));
    /// assert_eq!(field.at_clamped(-3, 100), 0.0);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn at_clamped(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, i64::from(self.width) - 1) as u32;
        let cy = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.at(cx, cy)
    }

    /// Libère le scratch buffer (reset du loop).
    pub fn release(&mut self) {
        self.values = Vec::new();
        self.width = 0;
        self.height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let mut pb = PixelBuffer::new(width, height);
        for px in pb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        pb
    }

    #[test]
    fn bt601_weights_are_exact() {
        let mut field = LuminanceField::new();

        field.compute(&solid(2, 2, [255, 0, 0, 255]));
        assert!((field.at(0, 0) - 0.299 * 255.0).abs() < 1e-4);

        field.compute(&solid(2, 2, [0, 255, 0, 255]));
        assert!((field.at(1, 1) - 0.587 * 255.0).abs() < 1e-4);

        field.compute(&solid(2, 2, [0, 0, 255, 255]));
        assert!((field.at(0, 1) - 0.114 * 255.0).abs() < 1e-4);
    }

    #[test]
    fn white_sums_to_255() {
        let mut field = LuminanceField::new();
        field.compute(&solid(1, 1, [255, 255, 255, 255]));
        assert!((field.at(0, 0) - 255.0).abs() < 1e-3);
    }

    #[test]
    fn alpha_is_ignored() {
        let mut field = LuminanceField::new();
        field.compute(&solid(1, 1, [10, 20, 30, 0]));
        let expected = 0.299 * 10.0 + 0.587 * 20.0 + 0.114 * 30.0;
        assert!((field.at(0, 0) - expected).abs() < 1e-4);
    }

    #[test]
    fn clamped_sampling_replicates_edges() {
        let mut pb = PixelBuffer::new(2, 1);
        // Pixel gauche noir, pixel droit blanc.
        pb.data[4..8].copy_from_slice(&[255, 255, 255, 255]);
        let mut field = LuminanceField::new();
        field.compute(&pb);

        assert_eq!(field.at_clamped(-5, 0), field.at(0, 0));
        assert_eq!(field.at_clamped(99, 0), field.at(1, 0));
        assert_eq!(field.at_clamped(0, -1), field.at(0, 0));
        assert_eq!(field.at_clamped(1, 42), field.at(1, 0));
    }

    #[test]
    fn scratch_is_reused_for_same_dimensions() {
        let mut field = LuminanceField::new();
        field.compute(&solid(8, 8, [0, 0, 0, 255]));
        let ptr = field.values.as_ptr();
        field.compute(&solid(8, 8, [255, 255, 255, 255]));
        assert_eq!(field.values.as_ptr(), ptr);
        assert!((field.at(7, 7) - 255.0).abs() < 1e-3);
    }
}

use crate::luminance::LuminanceField;

/// Edge magnitude at pixel (x, y) using the full 3×3 Sobel operator.
///
/// Kernels:
/// `Gx = [[-1,0,1],[-2,0,2],[-1,0,1]]`, `Gy = [[-1,-2,-1],[0,0,0],[1,2,1]]`.
///
/// Border handling is edge-replicate: sample coordinates are clamped to the
/// field, so corners and edges return real gradients instead of the
/// artificial darkening a zero-pad would produce.
///
/// Returns `sqrt(gx² + gy²)` — non-negative and finite, not normalized
/// (max ≈ 1443 for 8-bit input). Called once per output cell at the cell
/// center, not per source pixel.
///
/// # Example
/// ```
/// use gc_ascii::{edge, luminance::LuminanceField};
/// use gc_core::frame::PixelBuffer;
///
/// let mut field = LuminanceField::new();
/// field.compute(&PixelBuffer::new(10, 10));
/// let mag = edge::magnitude(&field, 0, 0);
/// assert!(mag >= 0.0 && mag.is_finite());
/// ```
#[must_use]
pub fn magnitude(field: &LuminanceField, x: u32, y: u32) -> f32 {
    let x = i64::from(x);
    let y = i64::from(y);

    let tl = field.at_clamped(x - 1, y - 1);
    let tc = field.at_clamped(x, y - 1);
    let tr = field.at_clamped(x + 1, y - 1);
    let ml = field.at_clamped(x - 1, y);
    let mr = field.at_clamped(x + 1, y);
    let bl = field.at_clamped(x - 1, y + 1);
    let bc = field.at_clamped(x, y + 1);
    let br = field.at_clamped(x + 1, y + 1);

    let gx = -tl + tr - 2.0 * ml + 2.0 * mr - bl + br;
    let gy = -tl - 2.0 * tc - tr + bl + 2.0 * bc + br;

    (gx * gx + gy * gy).sqrt()
}

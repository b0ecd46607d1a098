use gc_core::frame::PixelBuffer;

use crate::edge;
use crate::luminance::LuminanceField;

/// Diviseur de normalisation de la magnitude Sobel vers [0, 255].
/// Constante empirique — reproduite telle quelle pour la parité visuelle.
pub const EDGE_NORM_DIVISOR: f32 = 5.66;

/// Poids de la luminance moyenne dans le blend.
pub const LUMA_WEIGHT: f32 = 0.7;

/// Poids du signal de contour dans le blend.
pub const EDGE_WEIGHT: f32 = 0.3;

/// Rectangle source d'une cellule de sortie, demi-ouvert : `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub start_x: u32,
    pub end_x: u32,
    pub start_y: u32,
    pub end_y: u32,
}

impl CellRect {
    /// Centre géométrique de la cellule.
    #[must_use]
    pub fn center(&self) -> (u32, u32) {
        (
            (self.start_x + self.end_x) / 2,
            (self.start_y + self.end_y) / 2,
        )
    }

    /// Nombre de pixels couverts.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.end_x - self.start_x) * u64::from(self.end_y - self.start_y)
    }
}

/// Résultat pré-glyphe d'une cellule : couleur moyenne + brightness blendée.
#[derive(Clone, Copy, Debug)]
pub struct CellSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Blend luminance/contour [0, 255], entrée du GlyphMapper.
    pub brightness: f32,
}

/// Rectangle source de la cellule (row, col) d'une grille cols×rows.
///
/// Bornes en `floor(i * extent / n)` ; la dernière ligne/colonne absorbe le
/// reste d'arrondi. Les cellules pavent la source exactement — ni trou,
/// ni recouvrement.
///
/// # Example
/// ```
/// use gc_ascii::sampler::cell_rect;
/// let rect = cell_rect(10, 10, 3, 3, 2, 2);
/// assert_eq!(rect.end_x, 10);
/// assert_eq!(rect.end_y, 10);
/// ```
#[must_use]
pub fn cell_rect(width: u32, height: u32, cols: u32, rows: u32, col: u32, row: u32) -> CellRect {
    let cell_w = f64::from(width) / f64::from(cols);
    let cell_h = f64::from(height) / f64::from(rows);

    let start_x = (f64::from(col) * cell_w).floor() as u32;
    let start_y = (f64::from(row) * cell_h).floor() as u32;
    // Dernière colonne/ligne : borne exacte, pas d'arrondi flottant.
    let end_x = if col + 1 == cols {
        width
    } else {
        (f64::from(col + 1) * cell_w).floor() as u32
    };
    let end_y = if row + 1 == rows {
        height
    } else {
        (f64::from(row + 1) * cell_h).floor() as u32
    };

    CellRect {
        start_x,
        end_x,
        start_y,
        end_y,
    }
}

/// Échantillonne une cellule : moyenne RGB + luminance, un échantillon de
/// contour au centre, puis blend 70/30.
///
/// Une cellule vide (grille plus fine que la source) retombe sur le pixel
/// le plus proche du rectangle.
#[must_use]
pub fn sample_cell(buffer: &PixelBuffer, field: &LuminanceField, rect: &CellRect) -> CellSample {
    let mut sum_r: u64 = 0;
    let mut sum_g: u64 = 0;
    let mut sum_b: u64 = 0;
    let mut sum_lum: f64 = 0.0;

    let count = rect.pixel_count();
    let (mean_r, mean_g, mean_b, mean_lum) = if count == 0 {
        let x = rect.start_x.min(buffer.width.saturating_sub(1));
        let y = rect.start_y.min(buffer.height.saturating_sub(1));
        let (r, g, b, _) = buffer.pixel(x, y);
        (f64::from(r), f64::from(g), f64::from(b), f64::from(field.at(x, y)))
    } else {
        for y in rect.start_y..rect.end_y {
            for x in rect.start_x..rect.end_x {
                let (r, g, b, _) = buffer.pixel(x, y);
                sum_r += u64::from(r);
                sum_g += u64::from(g);
                sum_b += u64::from(b);
                sum_lum += f64::from(field.at(x, y));
            }
        }
        let n = count as f64;
        (
            sum_r as f64 / n,
            sum_g as f64 / n,
            sum_b as f64 / n,
            sum_lum / n,
        )
    };

    let (cx, cy) = rect.center();
    let mag = edge::magnitude(
        field,
        cx.min(buffer.width.saturating_sub(1)),
        cy.min(buffer.height.saturating_sub(1)),
    );
    let normalized_edge = (mag / EDGE_NORM_DIVISOR).min(255.0);
    let brightness = mean_lum as f32 * LUMA_WEIGHT + normalized_edge * EDGE_WEIGHT;

    CellSample {
        r: mean_r.round() as u8,
        g: mean_g.round() as u8,
        b: mean_b.round() as u8,
        brightness,
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

    fn field_from(pb: &PixelBuffer) -> LuminanceField {
        let mut field = LuminanceField::new();
        field.compute(pb);
        field
    }

    #[test]
    fn cells_tile_source_without_gaps_or_overlaps() {
        for (w, h, cols, rows) in [(640, 480, 213, 80), (10, 10, 3, 3), (7, 5, 7, 5), (100, 1, 9, 1)] {
            let mut covered = vec![0u8; (w * h) as usize];
            for row in 0..rows {
                for col in 0..cols {
                    let rect = cell_rect(w, h, cols, rows, col, row);
                    for y in rect.start_y..rect.end_y {
                        for x in rect.start_x..rect.end_x {
                            covered[(y * w + x) as usize] += 1;
                        }
                    }
                }
            }
            assert!(
                covered.iter().all(|&c| c == 1),
                "pavage incorrect pour {w}x{h} en {cols}x{rows}"
            );
        }
    }

    #[test]
    fn last_row_and_column_absorb_remainder() {
        let rect = cell_rect(10, 10, 3, 3, 2, 2);
        assert_eq!(rect.end_x, 10);
        assert_eq!(rect.end_y, 10);
        // floor(2 * 10/3) = 6
        assert_eq!(rect.start_x, 6);
    }

    #[test]
    fn all_black_cell_blends_to_zero() {
        let pb = solid(12, 12, [0, 0, 0, 255]);
        let field = field_from(&pb);
        let rect = cell_rect(12, 12, 2, 2, 0, 0);
        let s = sample_cell(&pb, &field, &rect);
        assert_eq!(s.brightness, 0.0);
        assert_eq!((s.r, s.g, s.b), (0, 0, 0));
    }

    #[test]
    fn all_white_cell_blends_to_weighted_luma() {
        // Blanc uniforme, aucune arête : 255 * 0.7 + 0 * 0.3 = 178.5.
        let pb = solid(12, 12, [255, 255, 255, 255]);
        let field = field_from(&pb);
        let rect = cell_rect(12, 12, 2, 2, 1, 1);
        let s = sample_cell(&pb, &field, &rect);
        assert!((s.brightness - 178.5).abs() < 1e-2);
        assert_eq!((s.r, s.g, s.b), (255, 255, 255));
    }

    #[test]
    fn blend_weights_are_70_30() {
        // Frontière verticale noir/blanc : la cellule côté noir dont le
        // centre touche la frontière reçoit un signal de contour pur.
        let mut pb = PixelBuffer::new(6, 6);
        for y in 0..6u32 {
            for x in 3..6u32 {
                let idx = ((y * 6 + x) * 4) as usize;
                pb.data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        let field = field_from(&pb);
        let rect = CellRect {
            start_x: 2,
            end_x: 4,
            start_y: 2,
            end_y: 4,
        };
        let s = sample_cell(&pb, &field, &rect);
        let mean_lum = 255.0 / 2.0;
        let mag = edge::magnitude(&field, 3, 3);
        let expected = mean_lum * 0.7 + (mag / 5.66).min(255.0) * 0.3;
        assert!((s.brightness - expected).abs() < 1e-2);
    }

    #[test]
    fn empty_cell_falls_back_to_nearest_pixel() {
        // Grille plus fine que la source : certaines cellules sont vides.
        let pb = solid(2, 2, [200, 100, 50, 255]);
        let field = field_from(&pb);
        let rect = cell_rect(2, 2, 8, 8, 3, 3);
        assert_eq!(rect.pixel_count(), 0);
        let s = sample_cell(&pb, &field, &rect);
        assert_eq!((s.r, s.g, s.b), (200, 100, 50));
    }
}

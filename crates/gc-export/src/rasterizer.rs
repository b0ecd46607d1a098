use ab_glyph::{Font, FontRef, PxScale, point};
use gc_core::frame::{AsciiFrame, PixelBuffer};
use rayon::prelude::*;
use std::collections::HashMap;

/// Convertit une `AsciiFrame` en pixels RGBA haute résolution.
///
/// Tous les glyphes de la rampe sont pré-rasterisés dans un atlas au
/// démarrage : le hot-loop d'encodage ne touche jamais la police.
pub struct Rasterizer {
    cell_width: u32,
    cell_height: u32,
    /// Alpha coverage per char, `cell_width * cell_height` bytes each.
    atlas: HashMap<char, Vec<u8>>,
    /// Fallback tout-transparent pour les glyphes hors atlas.
    blank: Vec<u8>,
}

impl Rasterizer {
    /// Initialise le rasterizer en pré-calculant la plage ASCII
    /// imprimable (la rampe de glyphes n'utilise rien d'autre).
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font_data: &[u8], scale_px: f32) -> anyhow::Result<Self> {
        let font = FontRef::try_from_slice(font_data)?;
        let scale = PxScale::from(scale_px);

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;

        // 'M' advance comme largeur de référence (fontes à chasse fixe).
        let h_advance = font.h_advance_unscaled(font.glyph_id('M'));
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;

        let cell_width = width.max(1);
        let cell_height = height.max(1);

        let mut rasterizer = Self {
            cell_width,
            cell_height,
            atlas: HashMap::new(),
            blank: vec![0u8; (cell_width * cell_height) as usize],
        };
        rasterizer.cache_range(&font, scale, 32..=126);

        Ok(rasterizer)
    }

    fn cache_range(&mut self, font: &FontRef, scale: PxScale, range: std::ops::RangeInclusive<u32>) {
        for codepoint in range {
            let Some(ch) = std::char::from_u32(codepoint) else {
                continue;
            };
            // glyph_id 0 = .notdef ; on saute pour ne pas encoder des "?"
            // de remplacement dans la vidéo exportée.
            let gid = font.glyph_id(ch);
            if gid.0 == 0 {
                continue;
            }

            let mut coverage = vec![0u8; (self.cell_width * self.cell_height) as usize];

            let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
            let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));

            if let Some(outline) = font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                #[allow(clippy::cast_possible_wrap)]
                outline.draw(|x, y, v| {
                    let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                    let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                    if px < self.cell_width && py < self.cell_height {
                        let idx = (py * self.cell_width + px) as usize;
                        if idx < coverage.len() {
                            coverage[idx] = (v * 255.0).round() as u8;
                        }
                    }
                });
            }
            self.atlas.insert(ch, coverage);
        }
    }

    /// Dimensions pixel du buffer cible pour une grille donnée.
    #[must_use]
    pub fn target_dimensions(&self, cols: u32, rows: u32) -> (u32, u32) {
        (cols * self.cell_width, rows * self.cell_height)
    }

    /// Peint la grille sur le buffer (fond noir, alpha-blend du glyphe
    /// avec la couleur moyenne de la cellule). Parallélisé par bande de
    /// lignes de glyphes ; zéro allocation après `ensure_size`.
    pub fn render(&self, frame: &AsciiFrame, out: &mut PixelBuffer) {
        let (target_w, target_h) = self.target_dimensions(frame.cols, frame.rows);
        if target_w == 0 || target_h == 0 {
            log::warn!("rasterisation d'une grille vide ignorée");
            return;
        }
        out.ensure_size(target_w, target_h);

        let blank = &self.blank;
        let stride = (target_w * 4) as usize;
        let band_size = stride * self.cell_height as usize;

        out.data
            .par_chunks_exact_mut(band_size)
            .enumerate()
            .for_each(|(grid_row, band)| {
                for grid_col in 0..frame.cols as usize {
                    let cell = frame.get(grid_col as u32, grid_row as u32);
                    let coverage = self.atlas.get(&cell.glyph).unwrap_or(blank);

                    let x_start = grid_col * self.cell_width as usize;
                    for cy in 0..self.cell_height as usize {
                        let row_offset = cy * stride;
                        for cx in 0..self.cell_width as usize {
                            let alpha =
                                f32::from(coverage[cy * self.cell_width as usize + cx]) / 255.0;

                            let px = row_offset + (x_start + cx) * 4;
                            band[px] = (f32::from(cell.r) * alpha) as u8;
                            band[px + 1] = (f32::from(cell.g) * alpha) as u8;
                            band[px + 2] = (f32::from(cell.b) * alpha) as u8;
                            band[px + 3] = 255;
                        }
                    }
                }
            });
    }
}

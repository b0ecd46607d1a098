use gc_core::dims::OutputDimensions;
use gc_core::error::EngineError;
use gc_core::frame::{AsciiCell, AsciiFrame, PixelBuffer};
use gc_core::ramp::GlyphMapper;
use rayon::prelude::*;

use crate::luminance::LuminanceField;
use crate::sampler;

/// Orchestre LuminanceField → EdgeDetector → CellSampler → GlyphMapper pour
/// produire une frame ASCII complète depuis un buffer pixel.
///
/// Pure sur des buffers plats : aucune dépendance à une surface hôte.
/// Le scratch de luminance est possédé ici et réutilisé entre frames.
///
/// # Example
/// ```
/// use gc_ascii::converter::FrameConverter;
/// use gc_core::frame::{AsciiFrame, PixelBuffer};
/// use gc_core::dims::plan;
/// use gc_core::ramp::GLYPH_RAMP;
///
/// let mut converter = FrameConverter::new(GLYPH_RAMP);
/// let buffer = PixelBuffer::new(64, 48);
/// let dims = plan(64, 48, 12).unwrap();
/// let mut out = AsciiFrame::new(0, 0);
/// converter.convert(&buffer, dims, &mut out).unwrap();
/// assert_eq!(out.rows, 12);
/// ```
pub struct FrameConverter {
    field: LuminanceField,
    mapper: GlyphMapper,
    current_charset: String,
}

impl FrameConverter {
    /// Create a converter with the given glyph ramp (densest→sparsest).
    #[must_use]
    pub fn new(charset: &str) -> Self {
        Self {
            field: LuminanceField::new(),
            mapper: GlyphMapper::new(charset),
            current_charset: charset.to_string(),
        }
    }

    /// Update the mapper if the charset has changed.
    pub fn update_if_needed(&mut self, charset: &str) {
        if self.current_charset != charset {
            self.mapper = GlyphMapper::new(charset);
            self.current_charset = charset.to_string();
        }
    }

    /// Convertit une frame complète : une passe luminance, puis une cellule
    /// de sortie par rectangle source (parallélisé par ligne de grille).
    ///
    /// Aucune frame partielle : en cas d'erreur, `out` n'est pas modifié.
    ///
    /// # Errors
    /// `EngineError::DegenerateDimensions` si le buffer a une dimension
    /// nulle ; `EngineError::UnsupportedSource` si `data` ne correspond pas
    /// aux dimensions annoncées.
    pub fn convert(
        &mut self,
        buffer: &PixelBuffer,
        dims: OutputDimensions,
        out: &mut AsciiFrame,
    ) -> Result<(), EngineError> {
        if buffer.width == 0 || buffer.height == 0 {
            return Err(EngineError::DegenerateDimensions {
                width: buffer.width,
                height: buffer.height,
            });
        }
        if buffer.data.len() != (buffer.width as usize) * (buffer.height as usize) * 4 {
            return Err(EngineError::UnsupportedSource(format!(
                "buffer de {} bytes pour {}×{}",
                buffer.data.len(),
                buffer.width,
                buffer.height
            )));
        }
        if dims.cols == 0 || dims.rows == 0 {
            return Err(EngineError::DegenerateDimensions {
                width: dims.cols,
                height: dims.rows,
            });
        }

        self.field.compute(buffer);
        out.ensure_size(dims.cols, dims.rows);

        let field = &self.field;
        let mapper = &self.mapper;
        let (w, h) = (buffer.width, buffer.height);
        let (cols, rows) = (dims.cols, dims.rows);

        out.cells
            .par_chunks_mut(cols as usize)
            .enumerate()
            .for_each(|(row, cells)| {
                let row = row as u32;
                for (col, cell) in cells.iter_mut().enumerate() {
                    let rect = sampler::cell_rect(w, h, cols, rows, col as u32, row);
                    let s = sampler::sample_cell(buffer, field, &rect);
                    *cell = AsciiCell {
                        glyph: mapper.map(s.brightness),
                        r: s.r,
                        g: s.g,
                        b: s.b,
                    };
                }
            });

        Ok(())
    }

    /// Libère le scratch de luminance (reset du loop).
    pub fn release(&mut self) {
        self.field.release();
    }
}

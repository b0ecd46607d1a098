use crate::error::EngineError;

/// Buffer de pixels réutilisable. Pré-alloué, redimensionné uniquement
/// quand la source change de dimensions — jamais en hot path.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel, origine en
/// haut à gauche.
///
/// # Example
/// ```
/// use gc_core::frame::PixelBuffer;
/// let pb = PixelBuffer::new(10, 10);
/// assert_eq!(pb.data.len(), 400);
/// ```
pub struct PixelBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelBuffer {
    /// Crée un buffer pré-alloué aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::PixelBuffer;
    /// let pb = PixelBuffer::new(100, 50);
    /// assert_eq!(pb.width, 100);
    /// assert_eq!(pb.height, 50);
    /// assert_eq!(pb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width * height * 4) as usize],
            width,
            height,
        }
    }

    /// Construit un buffer depuis des données RGBA déjà décodées.
    ///
    /// # Errors
    /// `EngineError::UnsupportedSource` si `data.len() != width * height * 4`.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::PixelBuffer;
    /// let pb = PixelBuffer::from_rgba(vec![0u8; 16], 2, 2).unwrap();
    /// assert_eq!(pb.width, 2);
    /// assert!(PixelBuffer::from_rgba(vec![0u8; 15], 2, 2).is_err());
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, EngineError> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(EngineError::UnsupportedSource(format!(
                "buffer RGBA de {} bytes pour {width}×{height}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Redimensionne le buffer si les dimensions diffèrent.
    ///
    /// Réalloue uniquement quand la taille change ; le contenu n'est pas
    /// préservé (il est réécrit par la prochaine frame).
    pub fn ensure_size(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.data.resize((width * height * 4) as usize, 0);
            self.width = width;
            self.height = height;
        }
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::PixelBuffer;
    /// let pb = PixelBuffer::new(10, 10);
    /// let (r, g, b, a) = pb.pixel(0, 0);
    /// assert_eq!((r, g, b, a), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = ((y * self.width + x) * 4) as usize;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }
}

/// Single cell of the output grid: one glyph plus its representative color.
///
/// Produced fresh every frame — no identity persists across frames.
///
/// # Example
/// ```
/// use gc_core::frame::AsciiCell;
/// let cell = AsciiCell::default();
/// assert_eq!(cell.glyph, ' ');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsciiCell {
    /// Caractère à afficher.
    pub glyph: char,
    /// Rouge moyen de la cellule source.
    pub r: u8,
    /// Vert moyen de la cellule source.
    pub g: u8,
    /// Bleu moyen de la cellule source.
    pub b: u8,
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            r: 0,
            g: 0,
            b: 0,
        }
    }
}

/// Grille de sortie ASCII. Pré-allouée, réutilisée chaque frame.
///
/// Row-major : `cells[row * cols + col]`.
///
/// # Example
/// ```
/// use gc_core::frame::{AsciiFrame, AsciiCell};
/// let mut frame = AsciiFrame::new(80, 24);
/// frame.set(0, 0, AsciiCell { glyph: '@', r: 255, g: 0, b: 0 });
/// assert_eq!(frame.get(0, 0).glyph, '@');
/// ```
#[derive(Clone)]
pub struct AsciiFrame {
    /// Flat array of cells, row-major.
    pub cells: Vec<AsciiCell>,
    /// Width in glyphs.
    pub cols: u32,
    /// Height in glyphs.
    pub rows: u32,
}

impl AsciiFrame {
    /// Crée une grille pré-allouée.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::AsciiFrame;
    /// let frame = AsciiFrame::new(80, 24);
    /// assert_eq!(frame.cells.len(), 80 * 24);
    /// ```
    #[must_use]
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cells: vec![AsciiCell::default(); (cols * rows) as usize],
            cols,
            rows,
        }
    }

    /// Redimensionne la grille si nécessaire (réalloue uniquement au changement).
    pub fn ensure_size(&mut self, cols: u32, rows: u32) {
        if self.cols != cols || self.rows != rows {
            self.cells
                .resize((cols * rows) as usize, AsciiCell::default());
            self.cols = cols;
            self.rows = rows;
        }
    }

    /// Set a cell at position (col, row).
    #[inline(always)]
    pub fn set(&mut self, col: u32, row: u32, cell: AsciiCell) {
        self.cells[(row * self.cols + col) as usize] = cell;
    }

    /// Get a cell reference at position (col, row).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::AsciiFrame;
    /// let frame = AsciiFrame::new(10, 10);
    /// assert_eq!(frame.get(0, 0).glyph, ' ');
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn get(&self, col: u32, row: u32) -> &AsciiCell {
        &self.cells[(row * self.cols + col) as usize]
    }

    /// Une ligne complète de la grille, pour la couche de présentation.
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::AsciiFrame;
    /// let frame = AsciiFrame::new(10, 4);
    /// assert_eq!(frame.row(3).len(), 10);
    /// ```
    #[must_use]
    pub fn row(&self, row: u32) -> &[AsciiCell] {
        let start = (row * self.cols) as usize;
        &self.cells[start..start + self.cols as usize]
    }

    /// Clear all cells to default (space, black).
    ///
    /// # Example
    /// ```
    /// use gc_core::frame::{AsciiFrame, AsciiCell};
    /// let mut frame = AsciiFrame::new(10, 10);
    /// frame.set(0, 0, AsciiCell { glyph: '#', r: 255, g: 0, b: 0 });
    /// frame.clear();
    /// assert_eq!(frame.get(0, 0).glyph, ' ');
    /// ```
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = AsciiCell::default();
        }
    }

    /// Vide la grille et libère la mémoire (utilisé par le reset du loop).
    pub fn release(&mut self) {
        self.cells = Vec::new();
        self.cols = 0;
        self.rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_from_rgba_validates_length() {
        assert!(PixelBuffer::from_rgba(vec![0u8; 4 * 6], 2, 3).is_ok());
        let err = PixelBuffer::from_rgba(vec![0u8; 5], 2, 3);
        assert!(matches!(err, Err(EngineError::UnsupportedSource(_))));
    }

    #[test]
    fn ensure_size_reallocates_only_on_change() {
        let mut pb = PixelBuffer::new(4, 4);
        let ptr = pb.data.as_ptr();
        pb.ensure_size(4, 4);
        assert_eq!(pb.data.as_ptr(), ptr);
        pb.ensure_size(8, 8);
        assert_eq!(pb.data.len(), 8 * 8 * 4);
    }

    #[test]
    fn ascii_frame_release_empties_grid() {
        let mut frame = AsciiFrame::new(10, 10);
        frame.release();
        assert_eq!(frame.cols, 0);
        assert_eq!(frame.rows, 0);
        assert!(frame.cells.is_empty());
    }
}

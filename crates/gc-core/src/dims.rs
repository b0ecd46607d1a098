use crate::error::EngineError;

/// Ratio hauteur/largeur d'une cellule glyphe (les glyphes terminal sont
/// environ deux fois plus hauts que larges). Compense l'étirement vertical.
pub const CHAR_ASPECT: f64 = 2.0;

/// Dimensions de la grille de sortie, dérivées des dimensions source.
///
/// Stables pour la durée de vie d'une source ; recalculées quand la
/// source change.
///
/// # Example
/// ```
/// use gc_core::dims::OutputDimensions;
/// let d = OutputDimensions { cols: 213, rows: 80 };
/// assert_eq!(d.cell_count(), 213 * 80);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputDimensions {
    /// Width of the output grid in glyphs.
    pub cols: u32,
    /// Height of the output grid in glyphs.
    pub rows: u32,
}

impl OutputDimensions {
    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Planifie la grille de sortie pour une source donnée.
///
/// `rows = max_rows` ; `cols = round(rows * (width / height) * CHAR_ASPECT)`.
/// Pure function, aucun effet de bord.
///
/// # Errors
/// `EngineError::DegenerateDimensions` si width ou height vaut zéro,
/// `EngineError::Config` si `max_rows` vaut zéro.
///
/// # Example
/// ```
/// use gc_core::dims::plan;
/// let d = plan(640, 480, 80).unwrap();
/// assert_eq!(d.rows, 80);
/// assert_eq!(d.cols, 213);
/// ```
pub fn plan(width: u32, height: u32, max_rows: u32) -> Result<OutputDimensions, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::DegenerateDimensions { width, height });
    }
    if max_rows == 0 {
        return Err(EngineError::Config("le budget de lignes doit être > 0".into()));
    }

    let rows = max_rows;
    let cols = (f64::from(rows) * (f64::from(width) / f64::from(height)) * CHAR_ASPECT).round();

    Ok(OutputDimensions {
        cols: cols as u32,
        rows,
    })
}

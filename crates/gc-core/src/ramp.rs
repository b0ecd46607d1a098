/// 70 caractères — Paul Bourke, ordonnés du plus dense au plus clair.
///
/// La rampe est indexée en sens inverse par `GlyphMapper::map` : une
/// luminosité élevée sélectionne les caractères de tête (les plus denses).
pub const GLYPH_RAMP: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Correction gamma appliquée avant le mapping (éclaircit légèrement les ombres).
const GAMMA: f32 = 1.1;

/// Facteur d'étirement du contraste autour du point médian 128.
const CONTRAST: f32 = 1.3;

/// Maps a blended brightness score [0, 255] to one glyph of the ramp.
///
/// Pipeline: gamma correction → contrast stretch → reverse ramp index.
/// Brighter input always selects a denser (or equal) glyph.
///
/// # Example
/// ```
/// use gc_core::ramp::{GlyphMapper, GLYPH_RAMP};
/// let mapper = GlyphMapper::new(GLYPH_RAMP);
/// assert_eq!(mapper.map(0.0), ' ');
/// assert_eq!(mapper.map(255.0), '$');
/// ```
pub struct GlyphMapper {
    chars: Vec<char>,
}

impl GlyphMapper {
    /// Build a mapper from a ramp ordered densest→sparsest.
    ///
    /// Ramps shorter than 2 characters fall back to a minimal default.
    ///
    /// # Example
    /// ```
    /// use gc_core::ramp::GlyphMapper;
    /// let mapper = GlyphMapper::new("@. ");
    /// assert_eq!(mapper.map(255.0), '@');
    /// ```
    #[must_use]
    pub fn new(ramp: &str) -> Self {
        let chars: Vec<char> = ramp.chars().collect();
        if chars.len() < 2 {
            return Self {
                chars: vec!['@', ' '],
            };
        }
        Self { chars }
    }

    /// Nombre de caractères dans la rampe.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// `true` si la rampe est vide (jamais le cas après `new`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Position d'un glyphe dans la rampe (0 = le plus dense).
    ///
    /// Utilisé par les tests de monotonie ; `None` si le glyphe n'y est pas.
    #[must_use]
    pub fn density_rank(&self, glyph: char) -> Option<usize> {
        self.chars.iter().position(|&c| c == glyph)
    }

    /// Map a blended brightness [0, 255] to a glyph.
    ///
    /// # Example
    /// ```
    /// use gc_core::ramp::{GlyphMapper, GLYPH_RAMP};
    /// let mapper = GlyphMapper::new(GLYPH_RAMP);
    /// let mid = mapper.map(128.0);
    /// assert!(GLYPH_RAMP.contains(mid));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn map(&self, brightness: f32) -> char {
        let b = brightness.clamp(0.0, 255.0);
        let corrected = (b / 255.0).powf(GAMMA) * 255.0;
        let stretched = ((corrected - 128.0) * CONTRAST + 128.0).clamp(0.0, 255.0);

        let last = self.chars.len() - 1;
        let index = ((stretched / 255.0) * last as f32).floor() as usize;
        // Indexation inverse : luminosité haute → tête de rampe (dense).
        self.chars[last - index.min(last)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_has_seventy_characters() {
        assert_eq!(GLYPH_RAMP.chars().count(), 70);
    }

    #[test]
    fn black_maps_to_sparsest_glyph() {
        // Gamma(0) = 0, puis clamp((0-128)*1.3+128) = 0 → glyphe le plus clair.
        let mapper = GlyphMapper::new(GLYPH_RAMP);
        assert_eq!(mapper.map(0.0), ' ');
    }

    #[test]
    fn white_maps_to_densest_glyph() {
        // Gamma(255) = 255, puis clamp((255-128)*1.3+128) = 255 → tête de rampe.
        let mapper = GlyphMapper::new(GLYPH_RAMP);
        assert_eq!(mapper.map(255.0), '$');
    }

    #[test]
    fn density_is_monotonic_in_brightness() {
        let mapper = GlyphMapper::new(GLYPH_RAMP);
        let mut prev_rank = mapper.len();
        for step in 0..=2550 {
            let brightness = step as f32 / 10.0;
            let glyph = mapper.map(brightness);
            let rank = mapper.density_rank(glyph).unwrap();
            // rank 0 = plus dense : il ne doit jamais remonter.
            assert!(
                rank <= prev_rank,
                "densité décroissante à brightness {brightness}"
            );
            prev_rank = rank;
        }
    }

    #[test]
    fn short_ramp_falls_back_to_minimal() {
        let mapper = GlyphMapper::new("@");
        assert_eq!(mapper.len(), 2);
        assert_eq!(mapper.map(255.0), '@');
        assert_eq!(mapper.map(0.0), ' ');
    }

    #[test]
    fn out_of_range_brightness_is_clamped() {
        let mapper = GlyphMapper::new(GLYPH_RAMP);
        assert_eq!(mapper.map(-10.0), mapper.map(0.0));
        assert_eq!(mapper.map(1000.0), mapper.map(255.0));
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration complète du rendu.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gc_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.max_rows, 80);
/// assert_eq!(config.image_rows, 120);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    // === Conversion ===
    /// Budget de lignes pour la vidéo live.
    pub max_rows: u32,
    /// Budget de lignes pour le one-shot image (qualité supérieure).
    pub image_rows: u32,
    /// Rampe de glyphes, du plus dense au plus clair.
    pub charset: String,
    /// Activer la couleur truecolor dans la présentation.
    pub color_enabled: bool,

    // === Enregistrement ===
    /// FPS cible du flux de capture.
    pub record_fps: u32,
    /// Police TTF/OTF pour la rasterisation export. None = export désactivé.
    pub font_path: Option<PathBuf>,
    /// Taille de rendu des glyphes en pixels.
    pub font_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_rows: 80,
            image_rows: 120,
            charset: crate::ramp::GLYPH_RAMP.to_string(),
            color_enabled: true,
            record_fps: 30,
            font_path: None,
            font_px: 16.0,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.max_rows = self.max_rows.clamp(1, 512);
        self.image_rows = self.image_rows.clamp(1, 512);
        self.record_fps = self.record_fps.clamp(1, 120);
        self.font_px = self.font_px.clamp(6.0, 64.0);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: RenderSection,
    record: Option<RecordSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    max_rows: Option<u32>,
    image_rows: Option<u32>,
    charset: Option<String>,
    color_enabled: Option<bool>,
}

/// Record section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct RecordSection {
    fps: Option<u32>,
    font_path: Option<PathBuf>,
    font_px: Option<f32>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gc_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = RenderConfig::default();

    let r = file.render;
    if let Some(v) = r.max_rows {
        config.max_rows = v;
    }
    if let Some(v) = r.image_rows {
        config.image_rows = v;
    }
    if let Some(v) = r.charset {
        config.charset = v;
    }
    if let Some(v) = r.color_enabled {
        config.color_enabled = v;
    }

    if let Some(rec) = file.record {
        if let Some(v) = rec.fps {
            config.record_fps = v;
        }
        if let Some(v) = rec.font_path {
            config.font_path = Some(v);
        }
        if let Some(v) = rec.font_px {
            config.font_px = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[render]\nmax_rows = 60\n\n[record]\nfps = 24\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_rows, 60);
        assert_eq!(config.record_fps, 24);
        // Champs absents : valeurs par défaut.
        assert_eq!(config.image_rows, 120);
        assert!(config.color_enabled);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[render]\nmax_rows = 9999\n\n[record]\nfps = 0\n").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_rows, 512);
        assert_eq!(config.record_fps, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/glyphcast.toml")).is_err());
    }
}

use std::path::PathBuf;

use clap::Parser;

/// glyphcast — Media-to-ASCII rendering engine.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source : chemin vers une vidéo. Requiert ffmpeg/ffprobe dans PATH.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Budget de lignes pour la lecture vidéo (défaut : config).
    #[arg(long)]
    pub rows: Option<u32>,

    /// FPS du flux d'enregistrement (défaut : config).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Désactiver la couleur.
    #[arg(long, default_value_t = false)]
    pub no_color: bool,

    /// Police TTF/OTF pour l'export rasterisé (prioritaire sur la config).
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Chemin de sortie pour l'export (PNG pour --image, MP4 pour --video).
    /// Défaut : ascii-image.png / ascii-video-<timestamp>.mp4.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one media source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (self.image.is_some(), self.video.is_some()) {
            (false, false) => {
                anyhow::bail!("Aucune source spécifiée. Utilisez --image ou --video.")
            }
            (true, true) => {
                anyhow::bail!("Une seule source à la fois. Spécifiez --image OU --video.")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_source_is_required() {
        let none = Cli::parse_from(["glyphcast"]);
        assert!(none.validate_source().is_err());

        let image = Cli::parse_from(["glyphcast", "--image", "a.png"]);
        assert!(image.validate_source().is_ok());

        let both = Cli::parse_from(["glyphcast", "--image", "a.png", "--video", "b.mp4"]);
        assert!(both.validate_source().is_err());
    }

    #[test]
    fn overrides_default_to_none() {
        let cli = Cli::parse_from(["glyphcast", "--video", "b.mp4"]);
        assert!(cli.rows.is_none());
        assert!(cli.fps.is_none());
        assert!(!cli.no_color);
        assert_eq!(cli.log_level, "warn");
    }
}

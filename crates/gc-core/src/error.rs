use thiserror::Error;

/// Errors originating from the conversion engine and the recording path.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Le buffer source ne peut pas être lu ou décodé.
    #[error("Source non supportée : {0}")]
    UnsupportedSource(String),

    /// Largeur ou hauteur nulle (média dégénéré).
    #[error("Dimensions dégénérées : {width}×{height}")]
    DegenerateDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Le flux de capture n'a pas pu être créé ou n'existe pas.
    #[error("Enregistrement indisponible : {0}")]
    RecordingUnavailable(String),

    /// `start` appelé alors qu'une session d'enregistrement est déjà active.
    #[error("Une session d'enregistrement est déjà active")]
    RecordingAlreadyActive,

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}

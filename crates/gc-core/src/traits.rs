use std::sync::Arc;

use crate::frame::PixelBuffer;

/// Fournit des frames pixel au pipeline de conversion.
///
/// Implémenté par : `ImageSource`, et côté vidéo par le thread de décodage
/// (les frames arrivent alors via un canal flume).
///
/// # Example
/// ```
/// use gc_core::traits::Source;
/// use gc_core::frame::PixelBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self) -> Option<Arc<PixelBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { false }
/// }
/// ```
pub trait Source: Send + 'static {
    /// Retourne la prochaine frame disponible.
    ///
    /// Retourne `None` si la source est épuisée (fin de vidéo).
    /// Ne bloque JAMAIS — retourne la dernière frame connue si pas de nouvelle.
    fn next_frame(&mut self) -> Option<Arc<PixelBuffer>>;

    /// Dimensions natives de la source.
    fn native_size(&self) -> (u32, u32);

    /// Indique si la source avance toute seule (vidéo) ou est statique (image).
    fn is_live(&self) -> bool;
}

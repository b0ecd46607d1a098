use gc_ascii::converter::FrameConverter;
use gc_core::config::RenderConfig;
use gc_core::dims::{OutputDimensions, plan};
use gc_core::error::EngineError;
use gc_core::frame::{AsciiFrame, PixelBuffer};

use crate::scheduler::TickScheduler;

/// États du cycle de vie du rendu.
///
/// `Idle → Loaded → Playing ⇄ Paused → Idle` (reset) pour la vidéo ;
/// `Loaded → Converting → Done` pour le one-shot image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Aucune source chargée, buffers vides.
    Idle,
    /// Métadonnées disponibles, une première frame convertie.
    Loaded,
    /// Ticks planifiés en continu.
    Playing,
    /// Lecture suspendue, tick en attente annulé.
    Paused,
    /// Passe one-shot image en cours.
    Converting,
    /// Passe one-shot image terminée.
    Done,
}

/// Boucle de rendu : orchestre le FrameConverter au rythme de la source.
///
/// Chaque demande de tick porte un numéro de génération ; pause et reset
/// incrémentent la génération AVANT de muter l'état, si bien qu'un tick
/// déjà en vol est jeté à l'arrivée au lieu d'écraser l'état courant.
///
/// # Example
/// ```
/// use gc_runtime::{RenderLoop, LoopState, scheduler::PendingTick};
/// use gc_core::config::RenderConfig;
/// use gc_core::frame::PixelBuffer;
///
/// let mut rl = RenderLoop::new(&RenderConfig::default());
/// let mut sched = PendingTick::new();
/// assert_eq!(rl.state(), LoopState::Idle);
///
/// rl.load(&PixelBuffer::new(64, 48)).unwrap();
/// assert_eq!(rl.state(), LoopState::Loaded);
/// rl.play(&mut sched);
/// assert_eq!(rl.state(), LoopState::Playing);
/// ```
pub struct RenderLoop {
    state: LoopState,
    converter: FrameConverter,
    frame: AsciiFrame,
    dims: Option<OutputDimensions>,
    /// Dimensions de la source au moment du plan (re-plan si elles changent).
    source_size: Option<(u32, u32)>,
    generation: u64,
    max_rows: u32,
    image_rows: u32,
}

impl RenderLoop {
    /// Create an idle loop from the render configuration.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            state: LoopState::Idle,
            converter: FrameConverter::new(&config.charset),
            frame: AsciiFrame::new(0, 0),
            dims: None,
            source_size: None,
            generation: 0,
            max_rows: config.max_rows,
            image_rows: config.image_rows,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Planned output dimensions, if a source is loaded.
    #[must_use]
    pub fn dims(&self) -> Option<OutputDimensions> {
        self.dims
    }

    /// Génération courante (les ticks plus anciens sont périmés).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Dernière frame convertie, si une existe.
    #[must_use]
    pub fn current_frame(&self) -> Option<&AsciiFrame> {
        if self.frame.cells.is_empty() {
            None
        } else {
            Some(&self.frame)
        }
    }

    /// `Idle → Loaded` : planifie les dimensions et convertit immédiatement
    /// une première frame, visible avant le démarrage de la lecture.
    ///
    /// Appeler depuis un autre état recharge la source (génération
    /// incrémentée, tout tick en vol devient périmé).
    ///
    /// # Errors
    /// `EngineError::DegenerateDimensions` pour une source à dimension nulle.
    pub fn load(&mut self, buffer: &PixelBuffer) -> Result<&AsciiFrame, EngineError> {
        self.generation += 1;
        let dims = plan(buffer.width, buffer.height, self.max_rows)?;
        self.converter.convert(buffer, dims, &mut self.frame)?;
        self.dims = Some(dims);
        self.source_size = Some((buffer.width, buffer.height));
        self.state = LoopState::Loaded;
        Ok(&self.frame)
    }

    /// `Loaded/Paused → Playing` : planifie la livraison continue de frames.
    /// No-op depuis les autres états.
    pub fn play<S: TickScheduler>(&mut self, sched: &mut S) {
        if matches!(self.state, LoopState::Loaded | LoopState::Paused) {
            self.state = LoopState::Playing;
            sched.schedule(self.generation);
        }
    }

    /// `Playing → Paused` : annule le tick en attente AVANT de muter l'état.
    pub fn pause<S: TickScheduler>(&mut self, sched: &mut S) {
        if self.state == LoopState::Playing {
            self.generation += 1;
            sched.cancel();
            self.state = LoopState::Paused;
        }
    }

    /// Retour à `Idle` : annule le tick en attente et libère les scratch
    /// buffers liés à la source. Idempotent — reset sur `Idle` est un no-op.
    pub fn reset<S: TickScheduler>(&mut self, sched: &mut S) {
        if self.state == LoopState::Idle {
            return;
        }
        self.generation += 1;
        sched.cancel();
        self.converter.release();
        self.frame.release();
        self.dims = None;
        self.source_size = None;
        self.state = LoopState::Idle;
    }

    /// Un tick planifié : convertit `latest` si la source a avancé.
    ///
    /// - Tick périmé (génération différente) ou état ≠ Playing : jeté,
    ///   aucun travail, aucune replanification.
    /// - `latest = None` (source statique ou pas de nouvelle frame) :
    ///   no-op, le tick suivant est replanifié.
    /// - Frame dégénérée : tick sauté avec un warn, le loop continue
    ///   d'attendre une source valide au lieu de planter.
    pub fn tick<S: TickScheduler>(
        &mut self,
        generation: u64,
        latest: Option<&PixelBuffer>,
        sched: &mut S,
    ) -> Option<&AsciiFrame> {
        if generation != self.generation || self.state != LoopState::Playing {
            return None; // Tick périmé : résultat jeté.
        }

        let Some(buffer) = latest else {
            sched.schedule(self.generation);
            return None;
        };

        // Re-plan si la source a changé de dimensions sous nos pieds.
        if self.source_size != Some((buffer.width, buffer.height)) {
            match plan(buffer.width, buffer.height, self.max_rows) {
                Ok(dims) => {
                    self.dims = Some(dims);
                    self.source_size = Some((buffer.width, buffer.height));
                }
                Err(e) => {
                    log::warn!("tick sauté : {e}");
                    sched.schedule(self.generation);
                    return None;
                }
            }
        }

        let Some(dims) = self.dims else {
            sched.schedule(self.generation);
            return None;
        };

        match self.converter.convert(buffer, dims, &mut self.frame) {
            Ok(()) => {
                sched.schedule(self.generation);
                Some(&self.frame)
            }
            Err(e) => {
                log::warn!("tick sauté : {e}");
                sched.schedule(self.generation);
                None
            }
        }
    }

    /// Chemin image one-shot : `Loaded → Converting → Done`, une seule passe
    /// au budget de lignes haute qualité. Aucun tick planifié.
    ///
    /// # Errors
    /// `EngineError::Config` si aucune source n'est chargée ;
    /// les erreurs du converter sont propagées telles quelles.
    pub fn convert_image(&mut self, buffer: &PixelBuffer) -> Result<&AsciiFrame, EngineError> {
        if self.state != LoopState::Loaded {
            return Err(EngineError::Config(
                "conversion one-shot impossible sans source chargée".into(),
            ));
        }
        self.state = LoopState::Converting;
        let dims = plan(buffer.width, buffer.height, self.image_rows)?;
        self.converter.convert(buffer, dims, &mut self.frame)?;
        self.dims = Some(dims);
        self.state = LoopState::Done;
        Ok(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PendingTick;

    fn solid(width: u32, height: u32, value: u8) -> PixelBuffer {
        let mut pb = PixelBuffer::new(width, height);
        for px in pb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[value, value, value, 255]);
        }
        pb
    }

    fn loaded_loop() -> (RenderLoop, PendingTick, PixelBuffer) {
        let mut rl = RenderLoop::new(&RenderConfig::default());
        let sched = PendingTick::new();
        let buffer = solid(64, 48, 128);
        rl.load(&buffer).unwrap();
        (rl, sched, buffer)
    }

    #[test]
    fn load_converts_a_first_frame_before_playback() {
        let (rl, _, _) = loaded_loop();
        assert_eq!(rl.state(), LoopState::Loaded);
        let frame = rl.current_frame().unwrap();
        assert_eq!(frame.rows, 80);
        assert_eq!(rl.dims().unwrap().rows, 80);
    }

    #[test]
    fn play_schedules_and_tick_reschedules() {
        let (mut rl, mut sched, buffer) = loaded_loop();
        rl.play(&mut sched);
        assert_eq!(rl.state(), LoopState::Playing);

        let generation = sched.take().unwrap();
        let produced = rl.tick(generation, Some(&buffer), &mut sched);
        assert!(produced.is_some());
        // Le tick suivant est replanifié avec la même génération.
        assert_eq!(sched.take(), Some(generation));
    }

    #[test]
    fn tick_without_new_frame_is_a_noop_that_reschedules() {
        let (mut rl, mut sched, _) = loaded_loop();
        rl.play(&mut sched);
        let generation = sched.take().unwrap();

        assert!(rl.tick(generation, None, &mut sched).is_none());
        assert!(sched.is_pending());
    }

    #[test]
    fn pause_cancels_pending_tick_and_stales_generation() {
        let (mut rl, mut sched, buffer) = loaded_loop();
        rl.play(&mut sched);
        let generation = sched.take().unwrap();

        rl.pause(&mut sched);
        assert_eq!(rl.state(), LoopState::Paused);
        assert!(!sched.is_pending());

        // Tick en vol au moment de la pause : jeté.
        assert!(rl.tick(generation, Some(&buffer), &mut sched).is_none());
        assert!(!sched.is_pending());
    }

    #[test]
    fn reset_is_idempotent_on_idle() {
        let mut rl = RenderLoop::new(&RenderConfig::default());
        let mut sched = PendingTick::new();
        rl.reset(&mut sched);
        assert_eq!(rl.state(), LoopState::Idle);
        assert_eq!(rl.generation(), 0);
        rl.reset(&mut sched);
        assert_eq!(rl.generation(), 0);
    }

    #[test]
    fn reset_releases_buffers_and_discards_in_flight_tick() {
        let (mut rl, mut sched, buffer) = loaded_loop();
        rl.play(&mut sched);
        let generation = sched.take().unwrap();

        // Pause en plein vol puis reset : plus aucune frame après le reset.
        rl.pause(&mut sched);
        rl.reset(&mut sched);
        assert_eq!(rl.state(), LoopState::Idle);
        assert!(rl.current_frame().is_none());
        assert!(rl.dims().is_none());

        assert!(rl.tick(generation, Some(&buffer), &mut sched).is_none());
        assert!(rl.current_frame().is_none());
        assert!(!sched.is_pending());
    }

    #[test]
    fn degenerate_frame_skips_tick_and_keeps_playing() {
        let (mut rl, mut sched, _) = loaded_loop();
        rl.play(&mut sched);
        let generation = sched.take().unwrap();

        let degenerate = PixelBuffer {
            data: Vec::new(),
            width: 0,
            height: 0,
        };
        assert!(rl.tick(generation, Some(&degenerate), &mut sched).is_none());
        assert_eq!(rl.state(), LoopState::Playing);
        // Le loop continue d'attendre une source valide.
        assert!(sched.is_pending());
    }

    #[test]
    fn source_dimension_change_replans_grid() {
        let (mut rl, mut sched, _) = loaded_loop();
        rl.play(&mut sched);
        let generation = sched.take().unwrap();

        let wider = solid(192, 48, 40);
        rl.tick(generation, Some(&wider), &mut sched).unwrap();
        let dims = rl.dims().unwrap();
        assert_eq!(dims.rows, 80);
        assert_eq!(dims.cols, (80.0_f64 * 4.0 * 2.0).round() as u32);
    }

    #[test]
    fn image_one_shot_uses_high_quality_budget() {
        let (mut rl, _, buffer) = loaded_loop();
        let frame_rows = rl.convert_image(&buffer).unwrap().rows;
        assert_eq!(frame_rows, 120);
        assert_eq!(rl.state(), LoopState::Done);
    }

    #[test]
    fn image_one_shot_requires_loaded_state() {
        let mut rl = RenderLoop::new(&RenderConfig::default());
        let buffer = solid(8, 8, 0);
        assert!(matches!(
            rl.convert_image(&buffer),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn play_from_idle_is_a_noop() {
        let mut rl = RenderLoop::new(&RenderConfig::default());
        let mut sched = PendingTick::new();
        rl.play(&mut sched);
        assert_eq!(rl.state(), LoopState::Idle);
        assert!(!sched.is_pending());
    }
}

use std::time::{Duration, Instant};

/// Compteur FPS par fenêtre d'une seconde. Zéro allocation.
///
/// La boucle interactive l'interroge pour journaliser le débit réel.
///
/// # Example
/// ```
/// use gc_runtime::fps::FpsCounter;
/// let mut counter = FpsCounter::new();
/// counter.tick();
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    window_start: Instant,
    frames_in_window: u32,
    fps: f64,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    /// Create a counter; the first window starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames_in_window: 0,
            fps: 0.0,
        }
    }

    /// Appeler une fois par frame présentée, APRÈS le rendu.
    pub fn tick(&mut self) {
        self.frames_in_window += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = f64::from(self.frames_in_window) / elapsed.as_secs_f64();
            self.frames_in_window = 0;
            self.window_start = Instant::now();
        }
    }

    /// FPS moyen sur la dernière fenêtre complète (0.0 avant la première).
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Planification coopérative des ticks de rendu.
///
/// Équivalent de `requestAnimationFrame` côté hôte : le loop demande un
/// tick, l'hôte le délivre au prochain rafraîchissement. Chaque demande
/// porte un numéro de génération ; un tick délivré avec une génération
/// périmée doit être jeté par le loop.
pub trait TickScheduler {
    /// Demande un tick au prochain rafraîchissement de l'hôte.
    fn schedule(&mut self, generation: u64);

    /// Annule le tick en attente s'il n'a pas encore été délivré.
    fn cancel(&mut self);
}

/// Scheduler minimal : retient au plus un tick en attente.
///
/// Utilisé tel quel par la boucle interactive (qui délivre le tick quand le
/// budget de frame est écoulé) et par les tests (qui le délivrent à la main).
///
/// # Example
/// ```
/// use gc_runtime::scheduler::{PendingTick, TickScheduler};
/// let mut sched = PendingTick::new();
/// sched.schedule(7);
/// assert_eq!(sched.take(), Some(7));
/// assert_eq!(sched.take(), None);
/// ```
#[derive(Debug, Default)]
pub struct PendingTick {
    pending: Option<u64>,
}

impl PendingTick {
    /// Create a scheduler with no pending tick.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// `true` si un tick attend d'être délivré.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consomme le tick en attente, s'il existe.
    pub fn take(&mut self) -> Option<u64> {
        self.pending.take()
    }
}

impl TickScheduler for PendingTick {
    fn schedule(&mut self, generation: u64) {
        self.pending = Some(generation);
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_drops_pending_tick() {
        let mut sched = PendingTick::new();
        sched.schedule(1);
        assert!(sched.is_pending());
        sched.cancel();
        assert!(!sched.is_pending());
        assert_eq!(sched.take(), None);
    }

    #[test]
    fn reschedule_overwrites_generation() {
        let mut sched = PendingTick::new();
        sched.schedule(1);
        sched.schedule(2);
        assert_eq!(sched.take(), Some(2));
    }
}

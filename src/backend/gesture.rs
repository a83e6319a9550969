use glam::Vec3A;

/// Turns the cumulative translation of a drag into per-frame deltas,
/// dropping frames whose delta is too large to be real hand motion.
#[derive(Debug, Clone)]
pub struct DragDeltaTracker {
    last_translation: Vec3A,
    glitch_threshold: f32,
}

impl DragDeltaTracker {
    pub const fn new(glitch_threshold: f32) -> Self {
        Self {
            last_translation: Vec3A::ZERO,
            glitch_threshold,
        }
    }

    /// A drag translation always starts from zero.
    pub fn reset(&mut self) {
        self.last_translation = Vec3A::ZERO;
    }

    /// Returns the movement since the last frame, or `None` for a glitch frame.
    /// `last_translation` advances either way so one glitch does not poison the next frame.
    pub fn update(&mut self, translation: Vec3A) -> Option<Vec3A> {
        let delta = translation - self.last_translation;
        self.last_translation = translation;

        if !delta.is_finite() || delta.length() > self.glitch_threshold {
            log::debug!(
                "Drag glitch: |delta| {:.1} > {:.1}, frame skipped",
                delta.length(),
                self.glitch_threshold
            );
            return None;
        }
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_are_incremental() {
        let mut tracker = DragDeltaTracker::new(100.0);
        assert_eq!(tracker.update(Vec3A::new(10.0, 0.0, 0.0)), Some(Vec3A::new(10.0, 0.0, 0.0)));
        assert_eq!(tracker.update(Vec3A::new(15.0, 5.0, 0.0)), Some(Vec3A::new(5.0, 5.0, 0.0)));
    }

    #[test]
    fn test_glitch_is_dropped_but_tracked() {
        let mut tracker = DragDeltaTracker::new(100.0);
        tracker.update(Vec3A::new(10.0, 0.0, 0.0));
        assert_eq!(tracker.update(Vec3A::new(400.0, 0.0, 0.0)), None);
        // the next ordinary step is measured from the glitch position
        assert_eq!(tracker.update(Vec3A::new(405.0, 0.0, 0.0)), Some(Vec3A::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reset_restarts_from_zero() {
        let mut tracker = DragDeltaTracker::new(100.0);
        tracker.update(Vec3A::new(50.0, 0.0, 0.0));
        tracker.reset();
        assert_eq!(tracker.update(Vec3A::new(0.0, 20.0, 0.0)), Some(Vec3A::new(0.0, 20.0, 0.0)));
    }
}

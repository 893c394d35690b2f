/// One fixed simulation step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedStep {
    /// Step length in seconds.
    pub dt: f32,
    /// Steps run since start.
    pub index: u64,
}

/// Accumulator converting variable frame deltas into fixed steps.
///
/// Steps per frame are capped; time beyond the cap is discarded so a slow
/// frame cannot trigger ever-longer catch-up frames.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps_per_frame: u32,
    accumulator: f32,
    index: u64,
}

impl FixedTimestep {
    /// `hz` is clamped to at least 1.
    pub fn new(hz: f32, max_steps_per_frame: u32) -> Self {
        Self {
            step: 1.0 / hz.max(1.0),
            max_steps_per_frame: max_steps_per_frame.max(1),
            accumulator: 0.0,
            index: 0,
        }
    }

    #[inline]
    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    /// Adds `dt` and returns the steps to run this frame, in order.
    pub fn advance(&mut self, dt: f32) -> impl Iterator<Item = FixedStep> + use<> {
        self.accumulator += dt.max(0.0);

        let mut count = 0;
        while self.accumulator >= self.step && count < self.max_steps_per_frame {
            self.accumulator -= self.step;
            count += 1;
        }
        if count == self.max_steps_per_frame && self.accumulator >= self.step {
            log::debug!("fixed timestep behind; dropping {:.3}s", self.accumulator);
            self.accumulator %= self.step;
        }

        let first = self.index;
        self.index += count as u64;
        let step = self.step;
        (first..first + count as u64).map(move |index| FixedStep { dt: step, index })
    }

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    #[inline]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(60.0, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_frames() {
        let mut t = FixedTimestep::new(10.0, 5);
        assert_eq!(t.advance(0.05).count(), 0);
        assert!((t.alpha() - 0.5).abs() < 1e-5);

        let steps: Vec<_> = t.advance(0.06).collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].index, 0);
        assert!((steps[0].dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn step_indices_continue_across_frames() {
        let mut t = FixedTimestep::new(10.0, 5);
        let a: Vec<_> = t.advance(0.25).map(|s| s.index).collect();
        let b: Vec<_> = t.advance(0.2).map(|s| s.index).collect();
        assert_eq!(a, vec![0, 1]);
        assert_eq!(b, vec![2, 3]);
    }

    #[test]
    fn long_frame_is_capped_and_excess_dropped() {
        let mut t = FixedTimestep::new(100.0, 3);
        assert_eq!(t.advance(1.0).count(), 3);
        assert!(t.alpha() < 1.0);
        assert!(t.advance(0.0).count() == 0);
    }

    #[test]
    fn rate_is_clamped_to_one_hertz() {
        assert_eq!(FixedTimestep::new(0.0, 1).step_seconds(), 1.0);
        assert_eq!(FixedTimestep::new(50.0, 1).step_seconds(), 0.02);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut t = FixedTimestep::default();
        assert_eq!(t.advance(-1.0).count(), 0);
        assert_eq!(t.alpha(), 0.0);
    }
}

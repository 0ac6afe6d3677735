//! Simulation clock
//!
//! Drives the two cadences of the navigation loop: a fixed physics step and
//! a coarser periodic interval used for replanning.

/// Fixed-step accumulator.
///
/// Feed it variable frame deltas with [`FixedTimestep::advance`] and it
/// reports how many fixed steps are due.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    /// Upper bound on steps per advance, stops a long frame from spiralling
    max_steps: u32,
    total_steps: u64,
}

impl FixedTimestep {
    /// Create a clock ticking every `step` seconds
    #[must_use]
    pub fn new(step: f32) -> Self {
        assert!(step > 0.0, "fixed timestep must be positive, got {step}");
        Self {
            step,
            accumulator: 0.0,
            max_steps: 8,
            total_steps: 0,
        }
    }

    /// Limit how many steps a single advance may produce
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Accumulate a frame delta and return the number of fixed steps due
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.accumulator += delta.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.step {
            log::trace!(
                "Dropping {:.3}s of simulation time after {} steps",
                self.accumulator,
                steps
            );
            self.accumulator %= self.step;
        }

        self.total_steps += u64::from(steps);
        steps
    }

    /// Fixed step length in seconds
    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Fraction of a step currently accumulated (0.0 to 1.0)
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Steps produced since creation
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

/// Periodic timer that fires once every `period` seconds.
#[derive(Debug, Clone)]
pub struct Interval {
    period: f32,
    elapsed: f32,
}

impl Interval {
    /// Create an interval that fires on the first tick
    #[must_use]
    pub fn new(period: f32) -> Self {
        Self {
            period,
            elapsed: period,
        }
    }

    /// Advance the timer, returning true when the period has elapsed
    pub fn tick(&mut self, delta: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed >= self.period {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Make the next tick fire regardless of elapsed time
    pub fn trigger(&mut self) {
        self.elapsed = self.period;
    }

    /// Configured period in seconds
    #[must_use]
    pub fn period(&self) -> f32 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_accumulates() {
        let mut clock = FixedTimestep::new(0.02);

        assert_eq!(clock.advance(0.01), 0);
        assert_eq!(clock.advance(0.015), 1);
        assert_eq!(clock.advance(0.04), 2);
        assert_eq!(clock.total_steps(), 3);
    }

    #[test]
    fn test_fixed_step_clamps_long_frames() {
        let mut clock = FixedTimestep::new(0.01).with_max_steps(4);

        assert_eq!(clock.advance(1.0), 4);
        assert!(clock.alpha() < 1.0);
    }

    #[test]
    fn test_interval_fires_immediately_then_periodically() {
        let mut interval = Interval::new(0.25);

        assert!(interval.tick(0.0));
        assert!(!interval.tick(0.1));
        assert!(!interval.tick(0.1));
        assert!(interval.tick(0.1));
    }

    #[test]
    fn test_interval_trigger() {
        let mut interval = Interval::new(10.0);
        interval.tick(0.0);

        interval.trigger();
        assert!(interval.tick(0.0));
    }
}

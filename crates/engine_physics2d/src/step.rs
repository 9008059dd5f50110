//! Fixed-timestep accumulator.

/// Tolerance when dividing accumulated time into whole steps, so that frame
/// times summing to an exact multiple of the step are not lost to rounding.
const STEP_EPSILON: f64 = 1.0e-9;

/// What one [`FixedStep::advance`] call decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Steps to run now, at most `max_steps`.
    pub steps: u32,
    /// Whole steps discarded by the cap.
    pub dropped: u64,
    /// Leftover time as a fraction of one step, in `[0, 1)`.
    pub ratio: f32,
}

/// Splits variable frame times into whole fixed steps.
///
/// Steps beyond `max_steps` are discarded together with their time: under
/// sustained overload the simulation falls behind real time instead of
/// trying to catch up.
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f64,
    max_steps: u32,
    accumulator: f64,
}

impl FixedStep {
    #[must_use]
    pub fn new(dt: f64, max_steps: u32) -> Self {
        Self {
            dt,
            max_steps,
            accumulator: 0.0,
        }
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Time carried over to the next frame, in seconds.
    #[must_use]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Add `frame_dt` and take out as many whole steps as fit.
    ///
    /// Negative or non-finite frame times count as zero.
    pub fn advance(&mut self, frame_dt: f64) -> StepPlan {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let whole = (self.accumulator / self.dt + STEP_EPSILON).floor();
        self.accumulator = (self.accumulator - whole * self.dt).max(0.0);

        // Saturating float-to-int conversion.
        let whole = whole as u64;
        let steps = whole.min(u64::from(self.max_steps));
        let ratio = (self.accumulator / self.dt).clamp(0.0, 1.0) as f32;

        StepPlan {
            steps: u32::try_from(steps).unwrap_or(self.max_steps),
            dropped: whole - steps,
            ratio,
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_partial_frames_accumulate() {
        let mut clock = FixedStep::new(DT, 5);

        let plan = clock.advance(DT * 0.5);
        assert_eq!(plan.steps, 0);
        assert!((plan.ratio - 0.5).abs() < 1e-6);

        let plan = clock.advance(DT * 0.75);
        assert_eq!(plan.steps, 1);
        assert!((plan.ratio - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_exact_multiples_leave_nothing_behind() {
        let mut clock = FixedStep::new(DT, 5);
        let frames = [0.5, 1.5, 2.0, 1.0, 3.0, 0.25, 0.75];
        let total: u32 = frames.iter().map(|&f| clock.advance(DT * f).steps).sum();

        assert_eq!(total, 9);
        assert!(clock.accumulator() < 1e-12);
    }

    #[test]
    fn test_overload_discards_excess_time() {
        let mut clock = FixedStep::new(DT, 5);
        let plan = clock.advance(DT * 100.0);

        assert_eq!(plan.steps, 5);
        assert_eq!(plan.dropped, 95);
        assert!(clock.accumulator() < 1e-12);
        assert!(plan.ratio < 1e-6);

        // Nothing was retained for the next frame.
        assert_eq!(clock.advance(0.0).steps, 0);
    }

    #[test]
    fn test_negative_frame_time_is_ignored() {
        let mut clock = FixedStep::new(DT, 5);
        clock.advance(DT * 0.5);
        let plan = clock.advance(-1.0);
        assert_eq!(plan.steps, 0);
        assert!((clock.accumulator() - DT * 0.5).abs() < 1e-12);

        clock.reset();
        assert_eq!(clock.accumulator(), 0.0);
    }
}

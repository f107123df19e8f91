use crate::error::EngineError;
use rand::Rng;
use std::time::Duration;

/// Randomized wait applied between a user's consecutive actions.
///
/// Each draw is independent: no state is kept between calls and no state
/// is shared between users, so pacing never serializes the population.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self, EngineError> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 || max_secs < 0.0 {
            return Err(EngineError::Configuration(format!(
                "pacing bounds must be non-negative, got ({}, {})",
                min_secs, max_secs
            )));
        }
        if min_secs > max_secs {
            return Err(EngineError::Configuration(format!(
                "pacing min {} exceeds max {}",
                min_secs, max_secs
            )));
        }
        Ok(Self {
            min: Duration::from_secs_f64(min_secs),
            max: Duration::from_secs_f64(max_secs),
        })
    }

    /// Uniform draw from `[min, max]`; exactly `min` when the bounds are
    /// equal, which keeps fixed-rate profiles fixed-rate.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let span = (self.max - self.min).as_secs_f64();
        self.min + Duration::from_secs_f64(rng.gen_range(0.0..=span))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

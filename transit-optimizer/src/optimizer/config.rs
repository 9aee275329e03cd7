//! Optimizer configuration.

use tracing::warn;

/// Configuration parameters for the assignment and frequency iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Largest relative frequency change accepted as converged.
    pub tolerance: f64,

    /// Assignment iterations before giving up on convergence.
    pub max_iterations: usize,

    /// Fraction of the step towards the newly designed frequencies taken
    /// each iteration. 1.0 is plain successive substitution.
    pub damping: f64,

    /// Dispersion scale below which route choice is all-or-nothing.
    pub dispersion_floor: f64,
}

impl OptimizerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(tolerance: f64, max_iterations: usize, damping: f64, dispersion_floor: f64) -> Self {
        Self {
            tolerance,
            max_iterations,
            damping,
            dispersion_floor,
        }
    }

    /// Returns a copy with a different tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check every parameter is usable.
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(format!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(format!("damping must be in (0, 1], got {}", self.damping));
        }
        if !self.dispersion_floor.is_finite() || self.dispersion_floor < 0.0 {
            return Err(format!(
                "dispersion_floor must be non-negative, got {}",
                self.dispersion_floor
            ));
        }
        Ok(())
    }

    /// Apply `OPTIMIZER_TOLERANCE`, `OPTIMIZER_MAX_ITERATIONS` and
    /// `OPTIMIZER_DAMPING` overrides read through `lookup`.
    ///
    /// Values that do not parse are logged and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = parse_override(&lookup, "OPTIMIZER_TOLERANCE") {
            self.tolerance = value;
        }
        if let Some(value) = parse_override(&lookup, "OPTIMIZER_MAX_ITERATIONS") {
            self.max_iterations = value;
        }
        if let Some(value) = parse_override(&lookup, "OPTIMIZER_DAMPING") {
            self.damping = value;
        }
        self
    }

    /// Default configuration with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration override");
            None
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_iterations: 100,
            damping: 0.5,
            dispersion_floor: 1e-6,
        }
    }
}

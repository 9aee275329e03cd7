//! Passenger behaviour coefficients.

use serde::{Deserialize, Serialize};

use super::NetworkError;

/// How passengers value the components of a trip.
///
/// The objective values (`pv`, `pw`, `pa`, `pt`) price the user cost of the
/// final assignment. The subjective values (`spv`, `spw`, `spa`, `spt`) are
/// the perceived weights passengers use when choosing paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerProfile {
    /// Walking speed on access and egress legs (km/h)
    pub va: f64,
    /// Value of in-vehicle time ($/h)
    pub pv: f64,
    /// Value of waiting time ($/h)
    pub pw: f64,
    /// Value of access time ($/h)
    pub pa: f64,
    /// Penalty per transfer ($)
    pub pt: f64,
    /// Perceived value of in-vehicle time ($/h)
    pub spv: f64,
    /// Perceived value of waiting time ($/h)
    pub spw: f64,
    /// Perceived value of access time ($/h)
    pub spa: f64,
    /// Perceived penalty per transfer ($)
    pub spt: f64,
}

impl PassengerProfile {
    /// Check every coefficient is in range.
    ///
    /// All values must be finite and non-negative. Walking speed and the
    /// perceived in-vehicle value must be strictly positive.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let fields = [
            ("va", self.va),
            ("pv", self.pv),
            ("pw", self.pw),
            ("pa", self.pa),
            ("pt", self.pt),
            ("spv", self.spv),
            ("spw", self.spw),
            ("spa", self.spa),
            ("spt", self.spt),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(NetworkError::InvalidPassenger(format!(
                    "{name} must be non-negative"
                )));
            }
        }
        if self.va == 0.0 {
            return Err(NetworkError::InvalidPassenger(
                "va must be positive".to_string(),
            ));
        }
        if self.spv == 0.0 {
            return Err(NetworkError::InvalidPassenger(
                "spv must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PassengerProfile {
    fn default() -> Self {
        Self {
            va: 4.0,
            pv: 2.74,
            pw: 5.48,
            pa: 8.22,
            pt: 1.0,
            spv: 2.74,
            spw: 5.48,
            spa: 8.22,
            spt: 1.0,
        }
    }
}

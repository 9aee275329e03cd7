//! Transport modes: vehicle capacity, speed and cost parameters.

use serde::{Deserialize, Serialize};

use super::NetworkError;

/// Raw operating parameters of a transport mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeParameters {
    /// 1 if the mode stops to board and alight at every stop, 0 otherwise
    pub bya: u8,
    /// Fixed operating cost per route ($/h)
    pub co: f64,
    /// Cost per vehicle ($/vehicle-hour)
    pub c1: f64,
    /// Cost per vehicle-kilometre ($/vehicle-km)
    pub c2: f64,
    /// Cruising speed (km/h)
    pub v: f64,
    /// Dwell time per stop (seconds)
    pub t: f64,
    /// Maximum frequency (veh/h)
    pub fmax: f64,
    /// Vehicle capacity (passengers)
    pub kmax: f64,
    /// Route-choice dispersion
    pub theta: f64,
    /// Turnaround time per terminal (minutes)
    pub tat: f64,
    /// Lines per route: the route frequency is shared among `d` lines
    pub d: f64,
    /// Initial and minimum frequency (veh/h)
    pub fini: f64,
}

impl ModeParameters {
    /// Typical bus parameters.
    pub fn bus() -> Self {
        Self {
            bya: 1,
            co: 8.61,
            c1: 15.0,
            c2: 0.5,
            v: 20.0,
            t: 10.0,
            fmax: 150.0,
            kmax: 160.0,
            theta: 0.5,
            tat: 5.0,
            d: 1.0,
            fini: 2.0,
        }
    }

    /// Typical metro parameters.
    pub fn metro() -> Self {
        Self {
            bya: 0,
            co: 39.01,
            c1: 120.0,
            c2: 2.0,
            v: 35.0,
            t: 20.0,
            fmax: 40.0,
            kmax: 1440.0,
            theta: 0.5,
            tat: 5.0,
            d: 1.0,
            fini: 2.0,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let positive = [
            ("co", self.co),
            ("c1", self.c1),
            ("c2", self.c2),
            ("v", self.v),
            ("kmax", self.kmax),
            ("fmax", self.fmax),
            ("fini", self.fini),
            ("d", self.d),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be positive"));
            }
        }

        let non_negative = [
            ("t", self.t),
            ("tat", self.tat),
            ("theta", self.theta),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be non-negative"));
            }
        }

        if self.bya > 1 {
            return Err("bya must be 0 or 1".to_string());
        }
        if self.fini > self.fmax {
            return Err(format!(
                "fini ({}) must not exceed fmax ({})",
                self.fini, self.fmax
            ));
        }
        Ok(())
    }
}

/// A validated, named transport mode.
///
/// # Invariants
///
/// - The name is not empty
/// - Costs, speed, capacity, frequencies and the line divisor are positive
/// - Dwell, turnaround and dispersion are non-negative
/// - `fini <= fmax`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportMode {
    name: String,
    #[serde(flatten)]
    params: ModeParameters,
}

impl TransportMode {
    /// Validate parameters and name a mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_optimizer::transit::{ModeParameters, TransportMode};
    ///
    /// let bus = TransportMode::new("bus", ModeParameters::bus()).unwrap();
    /// assert_eq!(bus.name(), "bus");
    ///
    /// let broken = ModeParameters { v: 0.0, ..ModeParameters::bus() };
    /// assert!(TransportMode::new("bus", broken).is_err());
    /// ```
    pub fn new(name: impl Into<String>, params: ModeParameters) -> Result<Self, NetworkError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NetworkError::InvalidMode {
                mode: name,
                reason: "name must not be empty".to_string(),
            });
        }
        params
            .validate()
            .map_err(|reason| NetworkError::InvalidMode {
                mode: name.clone(),
                reason,
            })?;
        Ok(Self { name, params })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ModeParameters {
        &self.params
    }

    /// Whether vehicles dwell at every stop.
    pub fn stops_at_each_stop(&self) -> bool {
        self.params.bya == 1
    }

    /// Dwell time charged per intermediate stop, in hours.
    pub fn dwell_hours(&self) -> f64 {
        if self.stops_at_each_stop() {
            self.params.t / 3600.0
        } else {
            0.0
        }
    }

    /// Running time over a distance at cruising speed, in hours.
    pub fn running_hours(&self, distance: f64) -> f64 {
        distance / self.params.v
    }

    /// Turnaround time per terminal, in hours.
    pub fn turnaround_hours(&self) -> f64 {
        self.params.tat / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(TransportMode::new("bus", ModeParameters::bus()).is_ok());
        assert!(TransportMode::new("metro", ModeParameters::metro()).is_ok());
    }

    #[test]
    fn reject_empty_name() {
        let err = TransportMode::new("  ", ModeParameters::bus()).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidMode { .. }));
    }

    #[test]
    fn reject_out_of_range_parameters() {
        let cases = [
            (ModeParameters { v: 0.0, ..ModeParameters::bus() }, "v must be positive"),
            (ModeParameters { kmax: -1.0, ..ModeParameters::bus() }, "kmax must be positive"),
            (ModeParameters { d: 0.0, ..ModeParameters::bus() }, "d must be positive"),
            (ModeParameters { c1: -0.1, ..ModeParameters::bus() }, "c1 must be positive"),
            (ModeParameters { co: 0.0, ..ModeParameters::bus() }, "co must be positive"),
            (ModeParameters { c2: 0.0, ..ModeParameters::bus() }, "c2 must be positive"),
            (ModeParameters { theta: f64::NAN, ..ModeParameters::bus() }, "theta must be non-negative"),
            (ModeParameters { bya: 2, ..ModeParameters::bus() }, "bya must be 0 or 1"),
        ];
        for (params, reason) in cases {
            assert_eq!(
                TransportMode::new("bus", params).unwrap_err(),
                NetworkError::InvalidMode {
                    mode: "bus".to_string(),
                    reason: reason.to_string()
                }
            );
        }

        // Dwell, turnaround and dispersion may be switched off
        let instant = ModeParameters { t: 0.0, tat: 0.0, theta: 0.0, ..ModeParameters::bus() };
        assert!(TransportMode::new("bus", instant).is_ok());
    }

    #[test]
    fn reject_fini_above_fmax() {
        let params = ModeParameters {
            fini: 50.0,
            fmax: 40.0,
            ..ModeParameters::metro()
        };
        let err = TransportMode::new("metro", params).unwrap_err();
        assert!(err.to_string().contains("fini (50) must not exceed fmax (40)"));
    }

    #[test]
    fn dwell_only_when_stopping() {
        let bus = TransportMode::new("bus", ModeParameters { t: 36.0, ..ModeParameters::bus() }).unwrap();
        assert!((bus.dwell_hours() - 0.01).abs() < 1e-12);

        let metro = TransportMode::new("metro", ModeParameters { t: 36.0, ..ModeParameters::metro() }).unwrap();
        assert_eq!(metro.dwell_hours(), 0.0);
    }

    #[test]
    fn unit_conversions() {
        let bus = TransportMode::new("bus", ModeParameters::bus()).unwrap();
        assert_eq!(bus.running_hours(10.0), 0.5);
        assert!((bus.turnaround_hours() - 5.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_flat() {
        let bus = TransportMode::new("bus", ModeParameters::bus()).unwrap();
        let json = serde_json::to_value(&bus).unwrap();
        assert_eq!(json["name"], "bus");
        assert_eq!(json["kmax"], 160.0);
    }
}

//! Launch parameters
//!
//! Supplied by the front end before each run. The ranges below are hints for
//! building sliders; the simulation accepts any finite value.

use serde::{Deserialize, Serialize};

use crate::sim::{SimError, SimResult};

/// Advisory slider range for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamRange {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

/// Parameters for a single toss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// Launch height above the ground line (m)
    pub height: f32,
    /// Launch speed (m/s)
    pub launch_velocity: f32,
    /// Initial spin (rad/s)
    pub spin_rate: f32,
    /// Launch elevation (degrees, 90 = straight up)
    pub launch_angle: f32,
    /// Horizontal wind (m/s, positive pushes right)
    pub wind_speed: f32,
    /// Fraction of vertical speed kept after a ground bounce
    pub restitution: f32,
    /// Quadratic drag coefficient
    pub drag_coefficient: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            height: 1.5,
            launch_velocity: 5.0,
            spin_rate: 20.0,
            launch_angle: 75.0,
            wind_speed: 0.0,
            restitution: 0.6,
            drag_coefficient: 0.005,
        }
    }
}

impl ParameterSet {
    /// Slider ranges in display order
    pub fn ranges() -> [ParamRange; 7] {
        let d = Self::default();
        [
            ParamRange { name: "height", min: 0.5, max: 3.0, step: 0.1, default: d.height },
            ParamRange { name: "launch_velocity", min: 2.0, max: 10.0, step: 0.1, default: d.launch_velocity },
            ParamRange { name: "spin_rate", min: 5.0, max: 50.0, step: 1.0, default: d.spin_rate },
            ParamRange { name: "launch_angle", min: 60.0, max: 90.0, step: 1.0, default: d.launch_angle },
            ParamRange { name: "wind_speed", min: -2.0, max: 2.0, step: 0.1, default: d.wind_speed },
            ParamRange { name: "restitution", min: 0.1, max: 0.9, step: 0.05, default: d.restitution },
            ParamRange { name: "drag_coefficient", min: 0.0, max: 0.02, step: 0.001, default: d.drag_coefficient },
        ]
    }

    fn fields(&self) -> [(&'static str, f32); 7] {
        [
            ("height", self.height),
            ("launch_velocity", self.launch_velocity),
            ("spin_rate", self.spin_rate),
            ("launch_angle", self.launch_angle),
            ("wind_speed", self.wind_speed),
            ("restitution", self.restitution),
            ("drag_coefficient", self.drag_coefficient),
        ]
    }

    /// Reject NaN/Inf fields. Out-of-range but finite values are accepted.
    pub fn validate(&self) -> SimResult<()> {
        match self.fields().iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(SimError::DegenerateParameter(format!(
                "{name} is not finite ({value})"
            ))),
            None => Ok(()),
        }
    }

    /// Same parameters with the launch speed scaled
    pub fn with_velocity_scale(&self, factor: f32) -> Self {
        Self {
            launch_velocity: self.launch_velocity * factor,
            ..*self
        }
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

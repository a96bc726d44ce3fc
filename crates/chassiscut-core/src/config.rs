//! Synthesis configuration.
//!
//! Every tunable the planners consult lives here and is passed in explicitly.
//! The defaults are the shop-floor values the cutting heads were tuned with.

use serde::{Deserialize, Serialize};

/// Parameters for profile segmentation and sequence synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Length of an uncut wire-joint gap in mm; 0 turns landmark wire
    /// joints off
    pub wire_joint_distance: f64,
    /// Gap used instead when `wire_joint_distance` is below 0.5 mm
    pub min_wire_joint_distance: f64,
    /// Notch approach length in mm
    pub approach_length: f64,
    /// Minimum distance from a relocated 25/75% landmark to the profile end
    pub min_notch_length_threshold: f64,
    /// Half the Y span a web-only closed profile needs to get wire joints
    pub min_cutout_length_threshold: f64,
    /// Landmarks closer than this to a flex run are relocated
    pub flex_proximity_threshold: f64,
    /// Fraction used when the 50% landmark lands on flex
    pub mid_landmark_fallback: f64,
    /// Fractions used when the 25% and 75% landmarks land on or near flex
    pub edge_landmark_fallbacks: (f64, f64),
    /// Leftover length below which a landmark snaps to a segment end
    pub least_curve_length: f64,
    /// Allowed deviation of a wire-joint segment from the configured gap
    pub wire_joint_tolerance: f64,
    /// Geometric comparison epsilon
    pub tolerance: f64,
    /// Emit wire joints at the 25/50/75% landmarks
    pub wire_joints_enabled: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            wire_joint_distance: 2.0,
            min_wire_joint_distance: 2.0,
            approach_length: 5.0,
            min_notch_length_threshold: 210.0,
            min_cutout_length_threshold: 210.0,
            flex_proximity_threshold: 10.0,
            mid_landmark_fallback: 0.4,
            edge_landmark_fallbacks: (0.125, 0.875),
            least_curve_length: 0.5,
            wire_joint_tolerance: 0.1,
            tolerance: 1e-6,
            wire_joints_enabled: true,
        }
    }
}

impl SynthesisConfig {
    pub fn with_wire_joint_distance(mut self, distance: f64) -> Self {
        self.wire_joint_distance = distance;
        self
    }

    pub fn with_approach_length(mut self, length: f64) -> Self {
        self.approach_length = length;
        self
    }

    pub fn with_wire_joints(mut self, enabled: bool) -> Self {
        self.wire_joints_enabled = enabled;
        self
    }

    pub fn with_notch_length_threshold(mut self, threshold: f64) -> Self {
        self.min_notch_length_threshold = threshold;
        self
    }

    /// Wire-joint gap actually cut, after the minimum substitution.
    pub fn effective_wire_joint_distance(&self) -> f64 {
        if self.wire_joint_distance < 0.5 {
            self.min_wire_joint_distance
        } else {
            self.wire_joint_distance
        }
    }

    /// Whether wire joints go in at the 25/50/75% landmarks. Flex runs are
    /// bracketed by wire joints either way.
    pub fn landmark_wire_joints(&self) -> bool {
        self.wire_joints_enabled && self.wire_joint_distance != 0.0
    }

    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.wire_joint_distance >= 0.0) {
            return Err("wire_joint_distance must be >= 0".to_string());
        }

        let positive = [
            ("min_wire_joint_distance", self.min_wire_joint_distance),
            ("approach_length", self.approach_length),
            ("min_notch_length_threshold", self.min_notch_length_threshold),
            ("min_cutout_length_threshold", self.min_cutout_length_threshold),
            ("flex_proximity_threshold", self.flex_proximity_threshold),
            ("least_curve_length", self.least_curve_length),
            ("wire_joint_tolerance", self.wire_joint_tolerance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(format!("{} must be > 0", name));
            }
        }

        let fractions = [
            ("mid_landmark_fallback", self.mid_landmark_fallback),
            ("edge_landmark_fallbacks.0", self.edge_landmark_fallbacks.0),
            ("edge_landmark_fallbacks.1", self.edge_landmark_fallbacks.1),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value < 1.0) {
                return Err(format!("{} must lie strictly between 0 and 1", name));
            }
        }

        if self.edge_landmark_fallbacks.0 >= self.edge_landmark_fallbacks.1 {
            return Err("edge_landmark_fallbacks must be increasing".to_string());
        }

        if !(self.tolerance > 0.0) || self.tolerance >= self.least_curve_length {
            return Err("tolerance must be > 0 and below least_curve_length".to_string());
        }

        Ok(())
    }
}

//! Run configuration
//!
//! Resolves the raw parameters for one pass (spool mass, filament geometry,
//! extrusion mode) into the two derived constants the accounting needs:
//! grams of filament per mm extruded, and the trigger threshold in grams.

use std::f64::consts::PI;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_DIAMETER: f64 = 1.75;
pub const DEFAULT_DENSITY: f64 = 1.25;
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.03;
pub const DEFAULT_FEEDRATE_THRESHOLD: f64 = 3000.0;
pub const DEFAULT_PAUSE_COMMAND: &str = "M600";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {name} must be {requirement}, got {value}")]
    InvalidConfiguration {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("unsupported extrusion mode {0:?} (expected \"relative\" or \"absolute\")")]
    UnsupportedMode(String),
}

/// How E words on a G1 line are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrusionMode {
    /// E values are incremental lengths (M83 firmware state)
    Relative,
    /// E values are cumulative axis positions (M82 firmware state)
    Absolute,
}

impl FromStr for ExtrusionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(ExtrusionMode::Relative),
            "absolute" => Ok(ExtrusionMode::Absolute),
            _ => Err(ConfigError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Raw parameters as supplied by the CLI or a calling test.
#[derive(Debug, Clone)]
pub struct SpoolParams {
    /// Spool weight in grams
    pub spool_mass: f64,
    /// Filament diameter in mm
    pub diameter: f64,
    /// Filament density in g/cm^3
    pub density: f64,
    pub mode: ExtrusionMode,
    /// Correction factor applied to the computed mass per mm
    pub scale: f64,
    /// Fraction of the spool held in reserve when triggering
    pub safety_margin: f64,
    /// Extrusion moves faster than this (mm/min) are not counted
    pub feedrate_threshold: f64,
    /// Command text spliced into the output at the trigger point
    pub pause_command: String,
    /// Defer the pause to the next layer change marker
    pub layer_based: bool,
}

impl Default for SpoolParams {
    fn default() -> Self {
        Self {
            spool_mass: 1000.0,
            diameter: DEFAULT_DIAMETER,
            density: DEFAULT_DENSITY,
            mode: ExtrusionMode::Relative,
            scale: 1.0,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            feedrate_threshold: DEFAULT_FEEDRATE_THRESHOLD,
            pause_command: DEFAULT_PAUSE_COMMAND.to_string(),
            layer_based: false,
        }
    }
}

/// Validated configuration for one pass. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct SpoolConfig {
    pub spool_mass: f64,
    pub diameter: f64,
    pub density: f64,
    pub mode: ExtrusionMode,
    pub scale: f64,
    pub safety_margin: f64,
    pub feedrate_threshold: f64,
    pub pause_command: String,
    pub layer_based: bool,

    mass_per_mm: f64,
    trigger_mass: f64,
}

impl SpoolConfig {
    /// Validate raw parameters and derive the accounting constants.
    ///
    /// A filament strand of diameter d (mm) weighs
    /// `density * pi * (d/2)^2 / 1000` grams per mm; the scale factor
    /// corrects that for flow multipliers or miscalibrated estimates.
    pub fn resolve(params: SpoolParams) -> Result<SpoolConfig, ConfigError> {
        require_positive("spool mass", params.spool_mass)?;
        require_positive("filament diameter", params.diameter)?;
        require_positive("filament density", params.density)?;
        require_positive("scale", params.scale)?;
        require_positive("feedrate threshold", params.feedrate_threshold)?;

        if !(0.0..1.0).contains(&params.safety_margin) {
            return Err(ConfigError::InvalidConfiguration {
                name: "safety margin",
                requirement: "a fraction in [0, 1)",
                value: params.safety_margin,
            });
        }

        let cross_section = PI * (params.diameter / 2.0).powi(2);
        let mass_per_mm = cross_section * params.density / 1000.0 * params.scale;
        let trigger_mass = params.spool_mass * (1.0 - params.safety_margin);

        Ok(SpoolConfig {
            spool_mass: params.spool_mass,
            diameter: params.diameter,
            density: params.density,
            mode: params.mode,
            scale: params.scale,
            safety_margin: params.safety_margin,
            feedrate_threshold: params.feedrate_threshold,
            pause_command: params.pause_command,
            layer_based: params.layer_based,
            mass_per_mm,
            trigger_mass,
        })
    }

    /// Grams of filament per mm of extrusion, scale applied.
    pub fn mass_per_mm(&self) -> f64 {
        self.mass_per_mm
    }

    /// Consumed mass at which the pause is inserted.
    pub fn trigger_mass(&self) -> f64 {
        self.trigger_mass
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfiguration {
            name,
            requirement: "positive",
            value,
        })
    }
}

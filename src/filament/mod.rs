//! Filament library - JSON-based material definitions
//!
//! Common materials ship built in; a user library in the same JSON shape can
//! be loaded on top and referenced by name.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_DIAMETER;

#[derive(Error, Debug)]
pub enum FilamentError {
    #[error("failed to read filament library: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse filament library: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filament definition from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilamentDefinition {
    /// Human-readable name (e.g., "Prusament PETG")
    pub name: String,

    /// Density in g/cm^3
    pub density: f64,

    /// Strand diameter in mm
    #[serde(default = "default_diameter")]
    pub diameter: f64,

    /// Optional: supplier or printing notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_diameter() -> f64 {
    DEFAULT_DIAMETER
}

/// Filament library - definitions indexed by key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilamentLibrary {
    #[serde(flatten)]
    pub filaments: HashMap<String, FilamentDefinition>,
}

impl FilamentLibrary {
    /// Load a filament library from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FilamentError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Look up a filament by key or name, case-insensitively
    pub fn get(&self, key_or_name: &str) -> Option<&FilamentDefinition> {
        let wanted = key_or_name.to_lowercase();
        if let Some(filament) = self.filaments.get(&wanted) {
            return Some(filament);
        }
        self.filaments
            .values()
            .find(|f| f.name.to_lowercase() == wanted)
    }

    /// Overlay another library; its entries win on key collision
    pub fn extend(&mut self, other: FilamentLibrary) {
        self.filaments.extend(other.filaments);
    }

    pub fn is_empty(&self) -> bool {
        self.filaments.is_empty()
    }

    /// Densities for the common printing materials
    pub fn builtin() -> Self {
        let mut filaments = HashMap::new();
        for (key, name, density) in [
            ("pla", "PLA", 1.24),
            ("petg", "PETG", 1.27),
            ("abs", "ABS", 1.04),
            ("asa", "ASA", 1.07),
            ("tpu", "TPU", 1.21),
            ("nylon", "Nylon", 1.14),
            ("pc", "Polycarbonate", 1.20),
            ("pva", "PVA", 1.23),
        ] {
            filaments.insert(
                key.to_string(),
                FilamentDefinition {
                    name: name.to_string(),
                    density,
                    diameter: DEFAULT_DIAMETER,
                    notes: None,
                },
            );
        }
        FilamentLibrary { filaments }
    }
}

//! Filament consumption accounting
//!
//! One tracker per run. Consumed mass only ever grows, and the trigger fires
//! exactly once: on the move whose accumulated mass first reaches the
//! configured threshold.

use crate::config::{ExtrusionMode, SpoolConfig};
use crate::parser::Instruction;

#[derive(Debug, Default)]
pub struct SpoolTracker {
    /// Most recent E axis reading; meaningful in absolute mode only
    last_e: f64,
    /// Net positive filament length pulled off the spool, in mm
    extruded_mm: f64,
    /// Accumulated mass in grams
    consumed_g: f64,
    triggered: bool,
    counted_moves: u64,
}

impl SpoolTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one classified instruction through the accounting state.
    ///
    /// Returns true exactly once per run: on the move that first pushes
    /// consumed mass to the trigger threshold.
    pub fn observe(&mut self, instruction: &Instruction, config: &SpoolConfig) -> bool {
        match *instruction {
            Instruction::ExtrusionMove { e, feedrate } => {
                // Fast moves are wipes/travels with token extrusion; skip
                // them wholesale, axis reading included
                if feedrate.map_or(false, |f| f > config.feedrate_threshold) {
                    return false;
                }

                let delta = match config.mode {
                    ExtrusionMode::Relative => e,
                    ExtrusionMode::Absolute => {
                        let delta = e - self.last_e;
                        self.last_e = e;
                        delta
                    }
                };

                // Retraction pushes filament back; net spool draw is zero
                if delta > 0.0 {
                    self.extruded_mm += delta;
                    self.consumed_g += delta * config.mass_per_mm();
                    self.counted_moves += 1;
                }

                if !self.triggered && self.consumed_g >= config.trigger_mass() {
                    self.triggered = true;
                    return true;
                }
                false
            }
            Instruction::AxisReset { e } => {
                self.last_e = e;
                false
            }
            Instruction::LayerChange | Instruction::Passthrough => false,
        }
    }

    pub fn consumed_g(&self) -> f64 {
        self.consumed_g
    }

    pub fn extruded_mm(&self) -> f64 {
        self.extruded_mm
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn counted_moves(&self) -> u64 {
        self.counted_moves
    }
}

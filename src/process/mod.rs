//! Single-pass stream driver
//!
//! Copies lines from input to output while the tracker accounts for
//! filament, and splices the configured pause command into the stream at the
//! crossing point. One forward pass, no buffering beyond the current line.

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::debug;

use crate::config::SpoolConfig;
use crate::parser::{self, Instruction};
use crate::tracker::SpoolTracker;

/// Progress log cadence, in input lines
const LOG_INTERVAL: usize = 100;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("I/O error while streaming G-code: {0}")]
    Io(#[from] std::io::Error),
}

/// What one pass did, for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub lines_in: usize,
    /// Net filament length pulled off the spool, in mm
    pub extruded_mm: f64,
    /// Total extruded mass in grams
    pub consumed_g: f64,
    /// 1-based output line number of the injected pause command
    pub injected_at: Option<usize>,
}

/// Run the full pass: classify, account, copy through, inject.
///
/// The output is line-for-line identical to the input (modulo line-ending
/// normalization) except for at most one inserted pause line. By default the
/// pause lands immediately after the move that crosses the budget; with
/// `layer_based` it is deferred to just before the next layer marker, or to
/// the end of the stream when no marker follows.
pub fn process<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: &SpoolConfig,
) -> Result<RunSummary, ProcessError> {
    let mut tracker = SpoolTracker::new();
    let mut lines_in = 0usize;
    let mut lines_out = 0usize;
    let mut injected_at = None;
    let mut awaiting_layer = false;

    for line in input.lines() {
        let line = line?;
        lines_in += 1;
        let instruction = parser::classify(&line);

        if awaiting_layer && instruction == Instruction::LayerChange {
            lines_out += 1;
            injected_at = Some(lines_out);
            write_pause(output, config, &tracker)?;
            awaiting_layer = false;
        }

        output.write_all(line.as_bytes())?;
        output.write_all(b"\n")?;
        lines_out += 1;

        if tracker.observe(&instruction, config) {
            debug!(
                line = lines_in,
                consumed_g = tracker.consumed_g(),
                "spool budget crossed"
            );
            if config.layer_based {
                awaiting_layer = true;
            } else {
                lines_out += 1;
                injected_at = Some(lines_out);
                write_pause(output, config, &tracker)?;
            }
        }

        if lines_in % LOG_INTERVAL == 0 && matches!(instruction, Instruction::ExtrusionMove { .. })
        {
            debug!(
                line = lines_in,
                extruded_mm = tracker.extruded_mm(),
                consumed_g = tracker.consumed_g(),
                "progress"
            );
        }
    }

    // Crossed but never saw another layer marker
    if awaiting_layer {
        lines_out += 1;
        injected_at = Some(lines_out);
        write_pause(output, config, &tracker)?;
    }

    output.flush()?;

    Ok(RunSummary {
        lines_in,
        extruded_mm: tracker.extruded_mm(),
        consumed_g: tracker.consumed_g(),
        injected_at,
    })
}

fn write_pause<W: Write>(
    output: &mut W,
    config: &SpoolConfig,
    tracker: &SpoolTracker,
) -> std::io::Result<()> {
    writeln!(
        output,
        "{} ; color change after ~{:.2}g of filament",
        config.pause_command,
        tracker.consumed_g()
    )
}

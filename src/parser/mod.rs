//! Line classifier
//!
//! Sorts each raw line into the handful of instruction shapes the filament
//! accounting cares about. Everything else is passthrough: copied to the
//! output untouched and never inspected again.

use std::io::{self, BufRead};

use crate::lexer;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// G1 move that feeds filament: an E word plus at least one spatial axis.
    /// E-only G1 lines are retract/prime moves and stay passthrough.
    ExtrusionMove { e: f64, feedrate: Option<f64> },
    /// G92 redefining the current E axis position
    AxisReset { e: f64 },
    /// Slicer layer boundary comment
    LayerChange,
    /// Anything else
    Passthrough,
}

/// Classify one raw line.
///
/// Tolerates inline comments, packed words, and trailing whitespace. A line
/// whose numeric fields fail to parse classifies as passthrough; malformed
/// input never aborts the run.
pub fn classify(line: &str) -> Instruction {
    let trimmed = line.trim();

    if let Some(comment) = trimmed.strip_prefix(';') {
        if comment.trim_start().to_ascii_lowercase().starts_with("layer") {
            return Instruction::LayerChange;
        }
        return Instruction::Passthrough;
    }

    let words = lexer::words(trimmed);
    let Some(&(letter, number)) = words.first() else {
        return Instruction::Passthrough;
    };
    if letter != 'G' {
        return Instruction::Passthrough;
    }

    if number == 1.0 {
        let has_travel = ['X', 'Y', 'Z'].iter().any(|&axis| find(&words, axis).is_some());
        if let (Some(e), true) = (find(&words, 'E'), has_travel) {
            return Instruction::ExtrusionMove {
                e,
                feedrate: find(&words, 'F'),
            };
        }
    } else if number == 92.0 {
        if let Some(e) = find(&words, 'E') {
            return Instruction::AxisReset { e };
        }
    }

    Instruction::Passthrough
}

fn find(words: &[(char, f64)], letter: char) -> Option<f64> {
    words.iter().find(|&&(l, _)| l == letter).map(|&(_, v)| v)
}

/// Scan header comments for a spool weight annotation, e.g.
/// "; spool weight: 1kg" or "; spool weight = 750g". Values in kg convert
/// to grams. Returns the first annotation that carries a number.
pub fn scan_spool_weight<R: BufRead>(input: R) -> io::Result<Option<f64>> {
    for line in input.lines() {
        let lower = line?.to_ascii_lowercase();
        if !lower.contains("spool weight") {
            continue;
        }
        if let Some(value) = first_number(&lower) {
            let grams = if lower.contains("kg") { value * 1000.0 } else { value };
            return Ok(Some(grams));
        }
    }
    Ok(None)
}

fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extrusion_move_needs_travel_axis() {
        assert_eq!(
            classify("G1 X10 Y20 E2.5"),
            Instruction::ExtrusionMove { e: 2.5, feedrate: None }
        );
        assert_eq!(
            classify("G1 Z0.4 E0.2 F1200"),
            Instruction::ExtrusionMove { e: 0.2, feedrate: Some(1200.0) }
        );
        // Retract/prime moves carry E but no axis
        assert_eq!(classify("G1 E-0.8 F2400"), Instruction::Passthrough);
        // Travel without extrusion
        assert_eq!(classify("G1 X50 Y50 F9000"), Instruction::Passthrough);
    }

    #[test]
    fn test_packed_syntax_and_inline_comment() {
        assert_eq!(
            classify("G1X10Y10E-1.5 ; wipe"),
            Instruction::ExtrusionMove { e: -1.5, feedrate: None }
        );
    }

    #[test]
    fn test_axis_reset() {
        assert_eq!(classify("G92 E0"), Instruction::AxisReset { e: 0.0 });
        assert_eq!(classify("g92 e150.2"), Instruction::AxisReset { e: 150.2 });
        // G92 without an E word does not touch the extrusion axis
        assert_eq!(classify("G92 X0 Y0"), Instruction::Passthrough);
    }

    #[test]
    fn test_malformed_operand_is_passthrough() {
        assert_eq!(classify("G1 X10 E+-"), Instruction::Passthrough);
        assert_eq!(classify("G1 Xten Efive"), Instruction::Passthrough);
    }

    #[test]
    fn test_comments_blanks_and_other_codes() {
        assert_eq!(classify(""), Instruction::Passthrough);
        assert_eq!(classify("; perimeter"), Instruction::Passthrough);
        assert_eq!(classify("M104 S210"), Instruction::Passthrough);
        assert_eq!(classify("G28 W"), Instruction::Passthrough);
        assert_eq!(classify("M600"), Instruction::Passthrough);
    }

    #[test]
    fn test_layer_markers() {
        assert_eq!(classify("; layer 12"), Instruction::LayerChange);
        assert_eq!(classify(";LAYER_CHANGE"), Instruction::LayerChange);
        assert_eq!(classify("; not a marker"), Instruction::Passthrough);
    }

    #[test]
    fn test_scan_spool_weight_grams_and_kg() {
        let header = "; generated by slicer\n; spool weight: 750 g\nG28\n";
        let found = scan_spool_weight(Cursor::new(header)).unwrap();
        assert_eq!(found, Some(750.0));

        let header = "; Spool Weight = 1kg\n";
        let found = scan_spool_weight(Cursor::new(header)).unwrap();
        assert_eq!(found, Some(1000.0));
    }

    #[test]
    fn test_scan_spool_weight_absent() {
        let header = "; no annotations here\nG28\nG1 X0 Y0 E1\n";
        assert_eq!(scan_spool_weight(Cursor::new(header)).unwrap(), None);
    }

    #[test]
    fn test_scan_skips_annotation_without_number() {
        let header = "; spool weight: unknown\n; spool weight: 500\n";
        assert_eq!(scan_spool_weight(Cursor::new(header)).unwrap(), Some(500.0));
    }
}

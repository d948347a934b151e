//! Alignment weights (C4, spec.md §4.3).

use crate::errors::{CoreError, CoreResult};

const ZERO_BOUND: f64 = 1e-4;
const BRACKETS: [(char, char); 4] = [('(', ')'), ('<', '>'), ('[', ']'), ('{', '}')];

/// Four finite affine-gap weights. Stored already sign-normalized:
/// `match_score > 0`, the rest `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentWeights {
    pub match_score: f32,
    pub mismatch: f32,
    pub gap_open: f32,
    pub gap_extend: f32,
}

impl Default for AlignmentWeights {
    fn default() -> Self {
        AlignmentWeights {
            match_score: 10.0,
            mismatch: -10.0,
            gap_open: -40.0,
            gap_extend: -4.0,
        }
    }
}

impl AlignmentWeights {
    pub fn new(match_score: f64, mismatch: f64, gap_open: f64, gap_extend: f64) -> CoreResult<Self> {
        if match_score.abs() < ZERO_BOUND {
            return Err(CoreError::Usage(
                "match weight must not be within 1e-4 of zero".to_string(),
            ));
        }
        if mismatch.abs() < ZERO_BOUND {
            return Err(CoreError::Usage(
                "mismatch weight must not be within 1e-4 of zero".to_string(),
            ));
        }
        Ok(AlignmentWeights {
            match_score: match_score.abs() as f32,
            mismatch: -mismatch.abs() as f32,
            gap_open: -gap_open.abs() as f32,
            gap_extend: -gap_extend.abs() as f32,
        })
    }

    /// Score of matching (`bases equal`) or mismatching bases.
    pub fn substitution_score(&self, a: u8, b: u8) -> f32 {
        if a.to_ascii_uppercase() == b.to_ascii_uppercase() {
            self.match_score
        } else {
            self.mismatch
        }
    }

    /// Scale every weight by a positive constant. Used by the "weight
    /// scaling preserves the CIGAR of every emitted haplotype" law
    /// (spec.md §8).
    pub fn scaled(&self, factor: f32) -> Self {
        AlignmentWeights {
            match_score: self.match_score * factor,
            mismatch: self.mismatch * factor,
            gap_open: self.gap_open * factor,
            gap_extend: self.gap_extend * factor,
        }
    }

    /// Parse a four-element comma-separated weight spec, e.g.
    /// `"10,-10,-40,-4"`, `"(10,-10,-40,-4)"`, or `"10,,-40,"` (empty
    /// components fall back to their default).
    pub fn parse(spec: &str) -> CoreResult<Self> {
        let trimmed = spec.trim();
        let inner = strip_matching_brackets(trimmed)?;
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() != 4 {
            return Err(CoreError::Usage(format!(
                "alignment weights must have exactly 4 comma-separated components, got {}",
                parts.len()
            )));
        }
        let defaults = AlignmentWeights::default();
        let default_values = [
            defaults.match_score as f64,
            defaults.mismatch as f64,
            defaults.gap_open as f64,
            defaults.gap_extend as f64,
        ];
        let mut values = [0.0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            let part = part.trim();
            values[i] = if part.is_empty() {
                default_values[i]
            } else {
                parse_number(part)?
            };
        }
        AlignmentWeights::new(values[0], values[1], values[2], values[3])
    }
}

fn strip_matching_brackets(s: &str) -> CoreResult<&str> {
    if s.is_empty() {
        return Ok(s);
    }
    let first = s.chars().next().unwrap();
    let last = s.chars().last().unwrap();
    for (open, close) in BRACKETS {
        if first == open {
            return if last == close {
                Ok(&s[first.len_utf8()..s.len() - close.len_utf8()])
            } else {
                Err(CoreError::Usage(format!(
                    "unmatched bracket in weight spec: {s}"
                )))
            };
        }
    }
    Ok(s)
}

/// Accepts decimal, exponential, hexadecimal (`0x...`) or octal (`0...`)
/// integer literals, each optionally prefixed with `-` or `+`.
fn parse_number(s: &str) -> CoreResult<f64> {
    let (neg, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let value = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .map_err(|_| CoreError::Usage(format!("invalid hexadecimal weight component: {s}")))?
    } else if unsigned.contains('e') || unsigned.contains('E') {
        unsigned
            .parse::<f64>()
            .map_err(|_| CoreError::Usage(format!("invalid exponential weight component: {s}")))?
    } else if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.contains('.') {
        i64::from_str_radix(unsigned, 8)
            .map(|v| v as f64)
            .map_err(|_| CoreError::Usage(format!("invalid octal weight component: {s}")))?
    } else {
        unsigned
            .parse::<f64>()
            .map_err(|_| CoreError::Usage(format!("invalid weight component: {s}")))?
    };

    Ok(if neg { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_list() {
        let w = AlignmentWeights::parse("10,-10,-40,-4").unwrap();
        assert_eq!(w, AlignmentWeights::default());
    }

    #[test]
    fn parses_bracketed_list() {
        let w = AlignmentWeights::parse("(10,-10,-40,-4)").unwrap();
        assert_eq!(w, AlignmentWeights::default());
        let w = AlignmentWeights::parse("[10,-10,-40,-4]").unwrap();
        assert_eq!(w, AlignmentWeights::default());
    }

    #[test]
    fn empty_components_default() {
        let w = AlignmentWeights::parse("10,,-40,").unwrap();
        assert_eq!(w, AlignmentWeights::default());
    }

    #[test]
    fn normalizes_signs() {
        let w = AlignmentWeights::parse("10,10,40,4").unwrap();
        assert_eq!(w, AlignmentWeights::default());
    }

    #[test]
    fn rejects_near_zero_match_or_mismatch() {
        assert!(AlignmentWeights::parse("0.00001,-10,-40,-4").is_err());
        assert!(AlignmentWeights::parse("10,0.00001,-40,-4").is_err());
    }

    #[test]
    fn parses_hex_and_octal() {
        let w = AlignmentWeights::parse("0xA,-0xA,-40,-4").unwrap();
        assert_eq!(w.match_score, 10.0);
        assert_eq!(w.mismatch, -10.0);
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert!(AlignmentWeights::parse("10,-10,-40").is_err());
    }

    #[test]
    fn scaling_preserves_relative_magnitudes() {
        let w = AlignmentWeights::default();
        let scaled = w.scaled(2.0);
        assert_eq!(scaled.match_score, w.match_score * 2.0);
        assert_eq!(scaled.gap_extend, w.gap_extend * 2.0);
    }
}

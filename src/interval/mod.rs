//! BED-style interval source (spec.md §6, "Interval source").

use crate::errors::{CoreError, CoreResult};

/// One input interval, 0-based half-open, optionally stranded and named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub sequence_name: String,
    pub start: u64,
    pub end: u64,
    pub is_forward: bool,
    pub name: Option<String>,
}

/// Parse a BED-like interval file: `chrom start end [name [score [strand]]]`,
/// tab- or whitespace-separated. Lines with fewer than 3 columns are a
/// data-format error (spec.md §7).
pub fn parse_intervals(contents: &str) -> CoreResult<Vec<Interval>> {
    let mut out = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(CoreError::DataFormat(format!(
                "interval file line {}: expected at least 3 columns, got {}",
                lineno + 1,
                fields.len()
            )));
        }
        let start: u64 = fields[1]
            .parse()
            .map_err(|_| CoreError::DataFormat(format!("interval file line {}: invalid start", lineno + 1)))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| CoreError::DataFormat(format!("interval file line {}: invalid end", lineno + 1)))?;
        if end < start {
            return Err(CoreError::DataFormat(format!(
                "interval file line {}: end before start",
                lineno + 1
            )));
        }
        let name = fields.get(3).filter(|s| **s != ".").map(|s| s.to_string());
        let is_forward = fields.get(5).map(|s| *s != "-").unwrap_or(true);
        out.push(Interval {
            sequence_name: fields[0].to_string(),
            start,
            end,
            is_forward,
            name,
        });
    }
    sort_and_validate(&mut out)?;
    Ok(out)
}

/// Sort by `(sequenceName, start)` and reject overlapping intervals on the
/// same sequence, per spec.md §6 ("sorted and non-overlapping per sequence
/// after load").
fn sort_and_validate(intervals: &mut Vec<Interval>) -> CoreResult<()> {
    intervals.sort_by(|a, b| a.sequence_name.cmp(&b.sequence_name).then(a.start.cmp(&b.start)));
    for w in intervals.windows(2) {
        if w[0].sequence_name == w[1].sequence_name && w[1].start < w[0].end {
            return Err(CoreError::DataFormat(format!(
                "overlapping intervals on {}: [{}, {}) and [{}, {})",
                w[0].sequence_name, w[0].start, w[0].end, w[1].start, w[1].end
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_three_column_lines() {
        let intervals = parse_intervals("chr1\t10\t20\nchr1\t30\t40\n").unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].start, 10);
        assert_eq!(intervals[0].end, 20);
    }

    #[test]
    fn rejects_fewer_than_three_columns() {
        assert!(parse_intervals("chr1\t10\n").is_err());
    }

    #[test]
    fn rejects_overlaps_on_the_same_sequence() {
        assert!(parse_intervals("chr1\t10\t20\nchr1\t15\t25\n").is_err());
    }

    #[test]
    fn sorts_by_sequence_then_start() {
        let intervals = parse_intervals("chr2\t1\t2\nchr1\t30\t40\nchr1\t10\t20\n").unwrap();
        assert_eq!(intervals[0].sequence_name, "chr1");
        assert_eq!(intervals[0].start, 10);
        assert_eq!(intervals[1].start, 30);
        assert_eq!(intervals[2].sequence_name, "chr2");
    }

    #[test]
    fn skips_comments_and_track_lines() {
        let intervals = parse_intervals("track name=x\n#comment\nchr1\t10\t20\n").unwrap();
        assert_eq!(intervals.len(), 1);
    }
}

//! Command-line front-end (spec.md §6, "CLI surface").
//!
//! A thin adapter over the core: parses arguments with `clap`'s derive
//! macros (the teacher's `clap = "^4"` with the `cargo` feature), builds a
//! [`RunConfig`], drives the pipeline of §2, and maps [`CoreError`] to the
//! exit codes of §6. `main` itself lives in `src/bin/main.rs`; this module
//! is kept in the library so it can be exercised from tests.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{CounterMode, RunConfig};
use crate::errors::{CoreError, CoreResult};

#[derive(Parser, Debug)]
#[command(name = "kvcall", version, about = "Mapping-free short-read variant caller")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call variants for one or more samples against a reference.
    Call(CallArgs),
    /// Generate shell completions.
    Completions { shell: clap_complete::Shell },
}

#[derive(clap::Args, Debug)]
pub struct CallArgs {
    /// Reference FASTA file(s).
    #[arg(long, required = true, num_args = 1..)]
    pub reference: Vec<PathBuf>,

    /// Sample group: one or more read files treated as a single counter input.
    #[arg(long = "sample", required = true, num_args = 1..)]
    pub samples: Vec<PathBuf>,

    /// BED-style interval file restricting the scan; whole reference if absent.
    #[arg(long)]
    pub intervals: Option<PathBuf>,

    /// K-mer size.
    #[arg(short = 'k', long, default_value_t = 31)]
    pub k: usize,

    /// Minimum k-mer count retained by the counter.
    #[arg(long = "min-count", default_value_t = 0)]
    pub min_count: u32,

    /// Alignment weights `match,mismatch,gapOpen,gapExtend` (spec.md §4.3).
    #[arg(long, default_value = "10,-10,-40,-4")]
    pub weights: String,

    /// Flank length either side of a region (default floor(k*1.5)).
    #[arg(long = "flank-len")]
    pub flank_len: Option<usize>,

    /// Count both strands when querying the counter.
    #[arg(long = "count-reverse", default_value_t = true)]
    pub count_reverse: bool,

    /// Maximum saved states kept by the haplotype builder's state stack.
    #[arg(long = "max-state", default_value_t = 15)]
    pub max_state: usize,

    /// Maximum haplotypes kept per active region.
    #[arg(long = "max-haplotypes", default_value_t = 15)]
    pub max_haplotypes: usize,

    /// Allowed k-mer repeats per haplotype walk before it is abandoned.
    #[arg(long = "max-repeat-count", default_value_t = 0)]
    pub max_repeat_count: u32,

    /// Report variant coordinates relative to the reference rather than the region.
    #[arg(long = "by-reference", default_value_t = true)]
    pub by_reference: bool,

    /// Call variants that touch an ambiguous reference base.
    #[arg(long = "call-ambiguous-variant", default_value_t = true)]
    pub call_ambiguous_variant: bool,

    /// Output variant format.
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Vcf)]
    pub output_format: OutputFormat,

    /// Where to write the variant output (stdout if absent).
    #[arg(long = "output")]
    pub output: Option<PathBuf>,

    /// Also emit the resolved haplotypes as a SAM file at this path.
    #[arg(long = "haplotype-output")]
    pub haplotype_output: Option<PathBuf>,

    /// Built-in filter specs, applied in order, e.g. `type=snp,ins`, `coverage=0.1:2`.
    #[arg(long = "filter", num_args = 0..)]
    pub filters: Vec<String>,

    /// Counter back-end.
    #[arg(long = "counter-mode", value_enum, default_value_t = CounterModeArg::InMemory)]
    pub counter_mode: CounterModeArg,

    /// Release aligner buffers between samples instead of retaining them.
    #[arg(long)]
    pub free: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Vcf,
    Table,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CounterModeArg {
    InMemory,
    Indexed,
}

impl From<CounterModeArg> for CounterMode {
    fn from(a: CounterModeArg) -> Self {
        match a {
            CounterModeArg::InMemory => CounterMode::InMemory,
            CounterModeArg::Indexed => CounterMode::Indexed,
        }
    }
}

impl CallArgs {
    /// Build the [`RunConfig`] this invocation implies (spec.md §1,
    /// "Configuration"); CLI flags always win over file defaults here
    /// because there is no config-file flag yet at this layer.
    pub fn to_run_config(&self) -> CoreResult<RunConfig> {
        if self.k < 4 {
            return Err(CoreError::Usage(format!("k must be >= 4, got {}", self.k)));
        }
        Ok(RunConfig {
            k: self.k,
            min_count: self.min_count,
            flank_len: self.flank_len,
            count_reverse: self.count_reverse,
            free: self.free,
            counter_mode: self.counter_mode.into(),
            weights: self.weights.clone(),
            max_state: self.max_state,
            max_haplotypes: self.max_haplotypes,
            max_repeat_count: self.max_repeat_count,
            by_reference: self.by_reference,
            call_ambiguous_variant: self.call_ambiguous_variant,
            ..RunConfig::default()
        })
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Parse one `key=value` filter spec into a boxed [`VariantFilter`]
/// (spec.md §4.9's built-ins, registered by name per the REDESIGN FLAGS of
/// spec.md §9 rather than loaded by reflection).
pub fn parse_filter_spec(
    spec: &str,
    sequence_len: u64,
) -> CoreResult<Box<dyn crate::variant::VariantFilter>> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| CoreError::Usage(format!("malformed filter spec: {spec}")))?;
    match name {
        "type" => {
            let allowed = value
                .split(',')
                .map(|t| match t.trim().to_ascii_lowercase().as_str() {
                    "snp" => Ok(crate::variant::VariantType::Snp),
                    "ins" | "insertion" => Ok(crate::variant::VariantType::Insertion),
                    "del" | "deletion" => Ok(crate::variant::VariantType::Deletion),
                    other => Err(CoreError::Usage(format!("unknown variant type: {other}"))),
                })
                .collect::<CoreResult<Vec<_>>>()?;
            Ok(Box::new(crate::variant::TypeFilter { allowed }))
        }
        "coverage" => {
            let (fraction, depth) = value
                .split_once(':')
                .ok_or_else(|| CoreError::Usage(format!("coverage filter needs fraction:depth, got {value}")))?;
            let min_fraction: f64 = fraction
                .parse()
                .map_err(|_| CoreError::Usage(format!("invalid coverage fraction: {fraction}")))?;
            let min_depth: u64 = depth
                .parse()
                .map_err(|_| CoreError::Usage(format!("invalid coverage depth: {depth}")))?;
            Ok(Box::new(crate::variant::CoverageFilter { min_fraction, min_depth }))
        }
        "distance" => {
            let min_distance: u64 = value
                .parse()
                .map_err(|_| CoreError::Usage(format!("invalid distance-from-ends value: {value}")))?;
            Ok(Box::new(crate::variant::DistanceFromEndsFilter {
                sequence_start: 1,
                sequence_end: sequence_len,
                min_distance,
            }))
        }
        other => Err(CoreError::Usage(format!("unknown filter: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_filter_spec() {
        let f = parse_filter_spec("type=snp,ins", 100).unwrap();
        let _ = f; // just assert it parses without error
    }

    #[test]
    fn rejects_unknown_filter_name() {
        assert!(parse_filter_spec("bogus=1", 100).is_err());
    }

    #[test]
    fn rejects_k_below_minimum() {
        let args = CallArgs {
            reference: vec![],
            samples: vec![],
            intervals: None,
            k: 2,
            min_count: 0,
            weights: "10,-10,-40,-4".to_string(),
            flank_len: None,
            count_reverse: true,
            max_state: 15,
            max_haplotypes: 15,
            max_repeat_count: 0,
            by_reference: true,
            call_ambiguous_variant: true,
            output_format: OutputFormat::Vcf,
            output: None,
            haplotype_output: None,
            filters: vec![],
            counter_mode: CounterModeArg::InMemory,
            free: false,
            verbose: 0,
            quiet: false,
        };
        assert!(args.to_run_config().is_err());
    }
}

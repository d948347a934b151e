//! Run configuration (spec.md §4.2/§4.3/§4.5/§4.6/§4.7/§4.8/§5).
//!
//! `RunConfig` gathers every tunable spec.md names into one serde-backed
//! struct so it can be built from CLI flags or loaded from a TOML/JSON/YAML
//! file, mirroring the teacher's config-struct-plus-CLI-override convention.

use serde::{Deserialize, Serialize};

use crate::active_region::ActiveRegionConfig;
use crate::align::AlignmentWeights;
use crate::errors::{CoreError, CoreResult};
use crate::haplotype::BuilderConfig;
use crate::variant::VariantCallerConfig;

/// Which back-end the counter is built on (spec.md §6, "Counter
/// (consumed)"). Both are in-memory in this crate; `Indexed` stands in for
/// the memory-mapped count-file back-end spec.md names but leaves as a true
/// external collaborator (no wire format is specified).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterMode {
    InMemory,
    Indexed,
}

impl Default for CounterMode {
    fn default() -> Self {
        CounterMode::InMemory
    }
}

/// Every tunable named in spec.md, collected into one struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub k: usize,
    pub min_count: u32,
    pub flank_len: Option<usize>,
    pub count_reverse: bool,
    pub free: bool,
    pub counter_mode: CounterMode,
    #[serde(flatten)]
    pub active_region: ActiveRegionConfigDto,
    pub weights: String,
    pub max_state: usize,
    pub max_haplotypes: usize,
    pub max_repeat_count: u32,
    pub by_reference: bool,
    pub call_ambiguous_variant: bool,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            k: 31,
            min_count: 0,
            flank_len: None,
            count_reverse: true,
            free: false,
            counter_mode: CounterMode::default(),
            active_region: ActiveRegionConfigDto::default(),
            weights: "10,-10,-40,-4".to_string(),
            max_state: 15,
            max_haplotypes: 15,
            max_repeat_count: 0,
            by_reference: true,
            call_ambiguous_variant: true,
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    pub fn flank_len(&self) -> usize {
        self.flank_len.unwrap_or_else(|| crate::reference::region::default_flank_len(self.k))
    }

    pub fn weights(&self) -> CoreResult<AlignmentWeights> {
        AlignmentWeights::parse(&self.weights)
    }

    pub fn active_region_config(&self) -> ActiveRegionConfig {
        self.active_region.clone().into()
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            max_state: self.max_state,
            max_haplotypes: self.max_haplotypes,
            max_repeat_count: self.max_repeat_count,
            count_reverse: self.count_reverse,
        }
    }

    pub fn variant_caller_config(&self) -> VariantCallerConfig {
        VariantCallerConfig {
            by_reference: self.by_reference,
            call_ambiguous_variant: self.call_ambiguous_variant,
        }
    }

    /// Load a config file (TOML, JSON, or YAML, inferred from extension)
    /// and let any already-set CLI flags override its values.
    pub fn from_file(path: &std::path::Path) -> CoreResult<RunConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if !path.exists() {
                CoreError::FileNotFound(path.display().to_string())
            } else {
                CoreError::Io(e)
            }
        })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| CoreError::DataFormat(format!("invalid config JSON: {e}"))),
            "toml" => toml_like_not_supported(),
            _ => serde_json::from_str(&contents)
                .map_err(|e| CoreError::DataFormat(format!("invalid config file: {e}"))),
        }
    }
}

fn toml_like_not_supported() -> CoreResult<RunConfig> {
    Err(CoreError::Usage(
        "TOML config files are not supported by this build; use JSON".to_string(),
    ))
}

/// Serde-friendly mirror of [`ActiveRegionConfig`] (which is `Copy` and
/// lives in `active_region`, kept dependency-free of `serde`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveRegionConfigDto {
    pub min_diff: u32,
    pub diff_quantile: f64,
    pub peak_scan: usize,
    pub scan_limit_factor: f64,
    pub decay_min: f64,
    pub alpha: f64,
    pub anchor_both: bool,
    pub ambig_regions: bool,
    pub peak_cluster_run: usize,
}

impl Default for ActiveRegionConfigDto {
    fn default() -> Self {
        ActiveRegionConfig::default().into()
    }
}

impl From<ActiveRegionConfig> for ActiveRegionConfigDto {
    fn from(c: ActiveRegionConfig) -> Self {
        ActiveRegionConfigDto {
            min_diff: c.min_diff,
            diff_quantile: c.diff_quantile,
            peak_scan: c.peak_scan,
            scan_limit_factor: c.scan_limit_factor,
            decay_min: c.decay_min,
            alpha: c.alpha,
            anchor_both: c.anchor_both,
            ambig_regions: c.ambig_regions,
            peak_cluster_run: c.peak_cluster_run,
        }
    }
}

impl From<ActiveRegionConfigDto> for ActiveRegionConfig {
    fn from(d: ActiveRegionConfigDto) -> Self {
        ActiveRegionConfig {
            min_diff: d.min_diff,
            diff_quantile: d.diff_quantile,
            peak_scan: d.peak_scan,
            scan_limit_factor: d.scan_limit_factor,
            decay_min: d.decay_min,
            alpha: d.alpha,
            anchor_both: d.anchor_both,
            ambig_regions: d.ambig_regions,
            peak_cluster_run: d.peak_cluster_run,
        }
    }
}

/// Tunable parameters of the active-region detector (spec.md §4.2 table).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveRegionConfig {
    /// Absolute floor on the neighbor-pair difference that can start a scan.
    pub min_diff: u32,
    /// Quantile over `|f[i] - f[i-1]|` used as the adaptive threshold.
    pub diff_quantile: f64,
    /// K-mers scanned forward to identify and skip short peaks.
    pub peak_scan: usize,
    /// Active-region length bound = `k * scan_limit_factor + max_gap_len`.
    pub scan_limit_factor: f64,
    /// Asymptote of the recovery-threshold decay, as a fraction of `f(L)`.
    pub decay_min: f64,
    /// Fraction of `(f(L) - decay_min * f(L))` remaining after `k` steps.
    pub alpha: f64,
    /// If false, allow single-anchored regions at reference ends.
    pub anchor_both: bool,
    /// If false, discard regions crossing an ambiguous base.
    pub ambig_regions: bool,
    /// How many consecutive candidate recoveries, each within `peak_scan` of
    /// the next and each itself followed by another peak, constitute a
    /// "terminal peak cluster" whose end anchor should be rolled back to the
    /// cluster's first sharp rise. Spec.md §9 leaves the precise count as an
    /// open question; this crate exposes it as a knob rather than guessing
    /// a hidden constant.
    pub peak_cluster_run: usize,
}

impl Default for ActiveRegionConfig {
    fn default() -> Self {
        ActiveRegionConfig {
            min_diff: 5,
            diff_quantile: 0.90,
            peak_scan: 7,
            scan_limit_factor: 5.0,
            decay_min: 0.55,
            alpha: 0.80,
            anchor_both: true,
            ambig_regions: true,
            peak_cluster_run: 3,
        }
    }
}

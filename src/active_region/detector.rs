//! The scanning algorithm itself (spec.md §4.2).

use crate::align::AlignmentWeights;
use crate::kmer::Kmer;
use crate::reference::ReferenceRegion;

use super::ActiveRegionConfig;

/// A half-open interval `[l_idx, r_idx)` over region offsets, bounded by
/// anchor k-mers (spec.md §3, "Active region").
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRegion {
    pub l_idx: usize,
    pub r_idx: usize,
    pub left_anchor: Kmer,
    pub right_anchor: Kmer,
    pub left_end: bool,
    pub right_end: bool,
}

impl ActiveRegion {
    pub fn len(&self) -> usize {
        self.r_idx - self.l_idx
    }
}

/// The longest gap whose extension cost alone cannot be offset by the best
/// possible gain of converting mismatches into matches over one k-mer's
/// worth of bases. Used both to bound active-region length (spec.md §4.2)
/// and to size the aligner's early-termination window (spec.md §4.5).
pub fn max_gap_len(weights: &AlignmentWeights, k: usize) -> usize {
    let gain = k as f64 * weights.match_score as f64;
    let per_base_cost = (-weights.gap_extend as f64).max(1e-6);
    ((gain / per_base_cost).floor() as usize).max(1)
}

/// Scan `region`'s frequency vector and return every active region found,
/// in left-to-right order, plus any end-called region prepended/appended.
pub fn detect(
    region: &ReferenceRegion,
    cfg: &ActiveRegionConfig,
    weights: &AlignmentWeights,
) -> Vec<ActiveRegion> {
    let f = &region.freq;
    let k = region.k;
    let n = f.len();
    if n < 2 {
        return Vec::new();
    }

    let gap_len = max_gap_len(weights, k);
    let scan_limit = (k as f64 * cfg.scan_limit_factor) as usize + gap_len;
    let d_t = difference_threshold(f, cfg);

    let mut out = Vec::new();
    let mut i = 1usize;

    if !cfg.anchor_both {
        if let Some(region_hit) = try_left_open_region(region, f, cfg, d_t, scan_limit) {
            i = region_hit.r_idx;
            out.push(region_hit);
        }
    }

    while i < n {
        // Pre-scan peak suppression: a short dip that recovers within
        // peak_scan positions isn't a real drop, skip past it.
        if (f[i - 1] as i64 - f[i] as i64) >= d_t as i64 && f[i] < f[i - 1] {
            if let Some(skip_to) = pre_scan_peak_skip(f, i, cfg) {
                i = skip_to;
                continue;
            }

            let l_idx = i - 1;
            match scan_for_recovery(f, region, l_idx, cfg, scan_limit) {
                ScanOutcome::Found { r_idx } => {
                    let keep = cfg.ambig_regions || !any_ambiguous(region, l_idx, r_idx);
                    if keep {
                        out.push(ActiveRegion {
                            l_idx,
                            r_idx,
                            left_anchor: anchor_kmer(region, l_idx),
                            right_anchor: anchor_kmer(region, r_idx),
                            left_end: false,
                            right_end: false,
                        });
                        // resume just after the right anchor
                        i = r_idx + 1;
                    } else {
                        // discarded for ambiguity; resume just after the left anchor
                        i = l_idx + 1;
                    }
                    continue;
                }
                ScanOutcome::EndOfRegion => {
                    if !cfg.anchor_both {
                        let r_idx = n - 1;
                        let keep = cfg.ambig_regions || !any_ambiguous(region, l_idx, r_idx);
                        if keep {
                            out.push(ActiveRegion {
                                l_idx,
                                r_idx,
                                left_anchor: anchor_kmer(region, l_idx),
                                right_anchor: anchor_kmer(region, r_idx),
                                left_end: false,
                                right_end: true,
                            });
                        }
                    }
                    break;
                }
                ScanOutcome::TooLong => {
                    // discard; resume just after the left anchor
                    i = l_idx + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    out
}

enum ScanOutcome {
    Found { r_idx: usize },
    EndOfRegion,
    TooLong,
}

/// Scan forward from `l_idx` for a right anchor satisfying the
/// recovery-threshold decay, applying in-scan peak suppression and terminal
/// peak-cluster rollback along the way.
fn scan_for_recovery(
    f: &[u32],
    region: &ReferenceRegion,
    l_idx: usize,
    cfg: &ActiveRegionConfig,
    scan_limit: usize,
) -> ScanOutcome {
    let n = f.len();
    let k = region.k;
    let f_l = f[l_idx] as f64;
    let f_min = cfg.decay_min * f_l;
    let lambda = -cfg.alpha.ln() / k as f64;
    let recovery = |x: usize| -> f64 { (f_l - f_min) * (-lambda * x as f64).exp() + f_min };

    // candidates found so far in the current peak cluster: region-offsets
    let mut cluster: Vec<usize> = Vec::new();
    let mut prev_candidate: Option<usize> = None;

    let mut r = l_idx + 1;
    while r < n {
        if r - l_idx > scan_limit {
            return ScanOutcome::TooLong;
        }
        if f[r] as f64 >= recovery(r - l_idx) {
            // candidate recovery at r; check whether it's a transient peak
            let threshold = recovery(r - l_idx);
            let mut peaked = false;
            let mut peak_end = r;
            for j in 1..=cfg.peak_scan {
                let idx = r + j;
                if idx >= n {
                    break;
                }
                if (f[idx] as f64) < threshold {
                    peaked = true;
                    peak_end = idx;
                    break;
                }
            }

            if !peaked {
                // genuine recovery, but first check terminal peak-cluster:
                // if we've already seen a run of peaked candidates
                // clustered tightly before this one, roll back to the
                // first of them instead of using this later, true anchor.
                if cluster.len() >= cfg.peak_cluster_run {
                    return ScanOutcome::Found { r_idx: cluster[0] };
                }
                return ScanOutcome::Found { r_idx: r };
            }

            // transient peak: record as a cluster candidate if it's close
            // to the previous one, otherwise start a new cluster.
            match prev_candidate {
                Some(prev) if r - prev <= cfg.peak_scan => cluster.push(r),
                _ => {
                    cluster.clear();
                    cluster.push(r);
                }
            }
            prev_candidate = Some(r);

            if cluster.len() >= cfg.peak_cluster_run {
                return ScanOutcome::Found { r_idx: cluster[0] };
            }

            r = peak_end + 1;
            continue;
        }
        r += 1;
    }
    ScanOutcome::EndOfRegion
}

/// Returns `Some(new_i)` if a short dip at `i` recovers within `peak_scan`
/// positions back to roughly the pre-drop level, meaning it should be
/// skipped rather than opening a region.
fn pre_scan_peak_skip(f: &[u32], i: usize, cfg: &ActiveRegionConfig) -> Option<usize> {
    let baseline = f[i - 1] as f64 - cfg.min_diff as f64 / 2.0;
    for j in 0..=cfg.peak_scan {
        let idx = i + j;
        if idx >= f.len() {
            break;
        }
        if f[idx] as f64 >= baseline {
            return Some(idx + 1);
        }
    }
    None
}

fn any_ambiguous(region: &ReferenceRegion, l_idx: usize, r_idx: usize) -> bool {
    (l_idx..=r_idx.min(region.sequence.len().saturating_sub(1)))
        .any(|o| region.is_ambiguous_at_region_offset(o))
}

fn anchor_kmer(region: &ReferenceRegion, region_offset: usize) -> Kmer {
    let k = region.k;
    let end = (region_offset + k).min(region.sequence.len());
    let start = end.saturating_sub(k);
    Kmer::from_bases(&region.sequence[start..end]).expect("anchor window has k bases")
}

/// `dT = max(minDiff, diff[q]*(1-frac) + diff[q+1]*frac)` over the sorted
/// absolute pairwise differences of `f` (spec.md §4.2).
fn difference_threshold(f: &[u32], cfg: &ActiveRegionConfig) -> u32 {
    if f.len() < 2 {
        return cfg.min_diff;
    }
    let mut diffs: Vec<i64> = f.windows(2).map(|w| (w[0] as i64 - w[1] as i64).abs()).collect();
    diffs.sort_unstable();
    let last = diffs.len() - 1;
    let pos = (last as f64) * cfg.diff_quantile;
    let q = pos.floor() as usize;
    let frac = pos - q as f64;
    let q0 = diffs[q.min(last)] as f64;
    let q1 = diffs[(q + 1).min(last)] as f64;
    let d_t = q0 * (1.0 - frac) + q1 * frac;
    (d_t.round() as i64).max(cfg.min_diff as i64) as u32
}

/// Detect whether the reference begins already inside an active region: a
/// sharp rise from `f[0]` recovering to a stable plateau within the scan
/// limit, with no preceding drop to anchor a left boundary. Only
/// considered when `anchor_both` is false (spec.md §4.2, "End calling").
fn try_left_open_region(
    region: &ReferenceRegion,
    f: &[u32],
    cfg: &ActiveRegionConfig,
    d_t: u32,
    scan_limit: usize,
) -> Option<ActiveRegion> {
    let n = f.len();
    if n < 2 {
        return None;
    }
    if (f[1] as i64 - f[0] as i64) < d_t as i64 {
        return None;
    }
    // Find the first index where the value is sustained (a genuine
    // plateau, not a transient blip) for peak_scan positions.
    for r in 1..n.min(scan_limit + 1) {
        let stable = (0..=cfg.peak_scan).all(|j| {
            let idx = r + j;
            idx >= n || f[idx] as f64 >= f[r] as f64 * cfg.decay_min
        });
        if stable && f[r] > f[0] {
            let keep = cfg.ambig_regions || !any_ambiguous(region, 0, r);
            if !keep {
                return None;
            }
            return Some(ActiveRegion {
                l_idx: 0,
                r_idx: r,
                left_anchor: anchor_kmer(region, 0),
                right_anchor: anchor_kmer(region, r),
                left_end: true,
                right_end: false,
            });
        }
    }
    None
}

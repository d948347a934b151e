//! Variant extraction (C10) and the filter pipeline that follows it (C11).

pub mod caller;
pub mod filter;

pub use caller::{call_variants, VariantCall, VariantCallerConfig, VariantKey, VariantType};
pub use filter::{run_pipeline, CoverageFilter, DistanceFromEndsFilter, TypeFilter, VariantFilter};

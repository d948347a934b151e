//! CLI entry point (spec.md §6, "CLI surface"). A thin adapter: parse
//! arguments, build the collaborators the core needs (counter, references,
//! intervals), drive `kvcaller::call_region` per reference/interval, run
//! the filter pipeline, and write output. Everything here is I/O and
//! wiring; the algorithms live in the library.

use std::env;
use std::fs;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use env_logger::Builder;
use log::{info, warn};

use kvcaller::cli::{Cli, Command, OutputFormat};
use kvcaller::config::RunConfig;
use kvcaller::errors::{CoreError, CoreResult};
use kvcaller::interval::{parse_intervals, Interval};
use kvcaller::kmer::{InMemoryCounter, KmerCounter};
use kvcaller::reference::{load_fasta, ReferenceSequence};
use kvcaller::variant::{run_pipeline, VariantCall, VariantFilter};
use kvcaller::writer::plain::PlainGroup;
use kvcaller::writer::sam::HaplotypeRecord;
use kvcaller::writer::table::TableRow;
use kvcaller::writer::{write_plain, write_sam, write_table, write_vcf};
use kvcaller::writer::vcf::SampleVariants;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match &cli.command {
        Command::Call(args) => {
            init_logging(args.log_level());
            info!("kvcall version {}", env!("CARGO_PKG_VERSION"));
            match run_call(args) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::from(e.exit_code() as u8)
                }
            }
        }
        Command::Completions { shell } => {
            init_logging(log::LevelFilter::Info);
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(level: log::LevelFilter) {
    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    let _ = builder.try_init();
}

/// One sample's intervals-worth of work against one reference.
fn reference_intervals(reference: &ReferenceSequence, intervals: &[Interval]) -> Vec<(u64, u64)> {
    let matching: Vec<(u64, u64)> = intervals
        .iter()
        .filter(|iv| iv.sequence_name == reference.name)
        .map(|iv| (iv.start, iv.end))
        .collect();
    if matching.is_empty() && intervals.iter().all(|iv| iv.sequence_name != reference.name) {
        vec![(0, reference.size as u64)]
    } else {
        matching
    }
}

/// Build a per-sample k-mer counter by streaming every read file in the
/// sample group through `needletail` (spec.md §1, "memory-resident map"
/// back-end of C1).
fn build_counter(paths: &[std::path::PathBuf], k: usize, min_count: u32) -> CoreResult<InMemoryCounter> {
    let mut counter = InMemoryCounter::new(k);
    for path in paths {
        let mut reader = needletail::parse_fastx_file(path).map_err(|e| {
            if !path.exists() {
                CoreError::FileNotFound(path.display().to_string())
            } else {
                CoreError::DataFormat(format!("failed to open sample {}: {e}", path.display()))
            }
        })?;
        while let Some(record) = reader.next() {
            let record = record.map_err(|e| CoreError::DataFormat(format!("malformed read record: {e}")))?;
            counter.add_sequence(&record.seq());
        }
    }
    Ok(counter.with_min_count(min_count))
}

fn sample_name(paths: &[std::path::PathBuf]) -> String {
    paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "sample".to_string())
}

fn build_filters(
    args: &kvcaller::cli::CallArgs,
    sequence_len: u64,
) -> CoreResult<Vec<Box<dyn VariantFilter>>> {
    args.filters
        .iter()
        .map(|spec| kvcaller::cli::parse_filter_spec(spec, sequence_len))
        .collect()
}

fn run_call(args: &kvcaller::cli::CallArgs) -> CoreResult<()> {
    if args.counter_mode == kvcaller::cli::CounterModeArg::Indexed {
        return Err(CoreError::Usage(
            "indexed counter mode is not implemented by this build; use --counter-mode in-memory".to_string(),
        ));
    }

    let cfg: RunConfig = args.to_run_config()?;

    let mut references = Vec::new();
    for path in &args.reference {
        references.extend(load_fasta(path)?);
    }
    if references.is_empty() {
        return Err(CoreError::Usage("at least one reference sequence is required".to_string()));
    }

    let intervals: Vec<Interval> = match &args.intervals {
        Some(path) => {
            let contents = fs::read_to_string(path).map_err(|e| {
                if !path.exists() {
                    CoreError::FileNotFound(path.display().to_string())
                } else {
                    CoreError::Io(e)
                }
            })?;
            parse_intervals(&contents)?
        }
        None => Vec::new(),
    };

    let sample = sample_name(&args.samples);
    info!("building k-mer counter for sample {sample} (k={})", cfg.k);
    let counter = build_counter(&args.samples, cfg.k, cfg.min_count)?;
    info!("counter holds {} distinct canonical k-mer(s)", counter.len());

    let mut sample_calls: Vec<VariantCall> = Vec::new();
    let mut table_rows_owned: Vec<(String, VariantCall)> = Vec::new();
    let mut haplotype_records: Vec<(String, String, u64, kvcaller::haplotype::Haplotype)> = Vec::new();

    for reference in &references {
        let filters = build_filters(args, reference.size as u64)?;
        for (region_idx, (start, end)) in reference_intervals(reference, &intervals).into_iter().enumerate() {
            let core_len = (end - start) as usize;
            if core_len == 0 {
                continue;
            }
            let (by_region, variants) = call_region_checked(reference, start as usize, core_len, &counter, &cfg)?;
            let region_name = format!("region_{region_idx}");

            for v in variants {
                if let Some(filtered) = run_pipeline(&filters, v) {
                    table_rows_owned.push((region_name.clone(), filtered.clone()));
                    sample_calls.push(filtered);
                }
            }

            if args.haplotype_output.is_some() {
                for (region, active, haplotypes) in by_region {
                    let ref_start = region.region_offset_to_reference_offset(active.l_idx) as u64;
                    for h in haplotypes {
                        haplotype_records.push((reference.name.clone(), region_name.clone(), ref_start, h));
                    }
                }
            }
        }
    }

    write_variants(args, &references, &sample, &sample_calls, &table_rows_owned)?;

    if let Some(haplotype_path) = &args.haplotype_output {
        let records: Vec<HaplotypeRecord<'_>> = haplotype_records
            .iter()
            .map(|(reference_name, region_name, ref_start, hap)| HaplotypeRecord {
                haplotype: hap,
                region_name: region_name.clone(),
                reference_name: reference_name.clone(),
                reference_start: *ref_start as i64,
            })
            .collect();
        write_sam(haplotype_path, "kvcall", env!("CARGO_PKG_VERSION"), &references, &records)?;
        info!("wrote {} haplotype record(s) to {}", records.len(), haplotype_path.display());
    }

    Ok(())
}

/// Wraps `kvcaller::call_region`, downgrading an analysis-limit failure to
/// a logged warning and an empty result rather than aborting the whole
/// sample (spec.md §7, "Analysis-limit ... recoverable only by discarding
/// the enclosing region").
fn call_region_checked(
    reference: &ReferenceSequence,
    core_start: usize,
    core_len: usize,
    counter: &dyn KmerCounter,
    cfg: &RunConfig,
) -> CoreResult<(
    Vec<(
        kvcaller::reference::ReferenceRegion,
        kvcaller::active_region::ActiveRegion,
        Vec<kvcaller::haplotype::Haplotype>,
    )>,
    Vec<VariantCall>,
)> {
    match kvcaller::call_region(reference, core_start, core_len, counter, cfg) {
        Ok(result) => Ok(result),
        Err(CoreError::AnalysisLimit(msg)) => {
            warn!(
                "reference {} [{}, {}): analysis limit exceeded, discarding region ({msg})",
                reference.name,
                core_start,
                core_start + core_len
            );
            Ok((Vec::new(), Vec::new()))
        }
        Err(e) => Err(e),
    }
}

/// Either a buffered file or buffered stdout, so the writers below stay
/// generic over `std::io::Write` without an owned trait object.
enum OutputSink {
    File(BufWriter<fs::File>),
    Stdout(BufWriter<std::io::Stdout>),
}

impl std::io::Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            OutputSink::File(w) => w.write(buf),
            OutputSink::Stdout(w) => w.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutputSink::File(w) => w.flush(),
            OutputSink::Stdout(w) => w.flush(),
        }
    }
}

fn write_variants(
    args: &kvcaller::cli::CallArgs,
    references: &[ReferenceSequence],
    sample: &str,
    calls: &[VariantCall],
    table_rows_owned: &[(String, VariantCall)],
) -> CoreResult<()> {
    let mut out = match &args.output {
        Some(path) => OutputSink::File(BufWriter::new(fs::File::create(path)?)),
        None => OutputSink::Stdout(BufWriter::new(std::io::stdout())),
    };
    let out = &mut out;

    match args.output_format {
        OutputFormat::Vcf => {
            let samples = vec![SampleVariants {
                sample_name: sample.to_string(),
                calls: calls.to_vec(),
            }];
            write_vcf(out, "kvcall", env!("CARGO_PKG_VERSION"), references, &samples)?;
        }
        OutputFormat::Table => {
            let rows: Vec<TableRow<'_>> = table_rows_owned
                .iter()
                .map(|(region, call)| TableRow { sample, region, call })
                .collect();
            write_table(out, &rows)?;
        }
        OutputFormat::Plain => {
            let groups_by_region: std::collections::BTreeMap<&str, Vec<VariantCall>> = {
                let mut m: std::collections::BTreeMap<&str, Vec<VariantCall>> = std::collections::BTreeMap::new();
                for (region, call) in table_rows_owned {
                    m.entry(region.as_str()).or_default().push(call.clone());
                }
                m
            };
            let groups: Vec<PlainGroup<'_>> = groups_by_region
                .iter()
                .map(|(region, calls)| PlainGroup { sample, region: *region, calls })
                .collect();
            write_plain(out, &groups)?;
        }
    }
    Ok(())
}

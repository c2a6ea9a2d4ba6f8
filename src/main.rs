use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use snpgl::genomics::io::{parse_allele_list, read_sites, write_calls, InMemoryTruthSource};
use snpgl::genomics::{ReadOrientation, SiteCaller, TracingProgress};
use snpgl::{CallerConfig, GenotypingMode, OutputMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snpgl", about = "Diploid SNP genotype likelihoods from base pileups")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute genotype likelihoods and call alleles for every site.
    Call {
        /// Pileup rows (`sample chrom pos ref read start base qual [mapq [strand]]`).
        pileup: PathBuf,
        /// Genotype exactly these alleles at every site, reference first (e.g. `A,G`).
        #[arg(long, conflicts_with = "truth")]
        alleles: Option<String>,
        /// Genotype alleles from a truth file (`chrom pos ref alt[,alt]`).
        #[arg(long)]
        truth: Option<PathBuf>,
        /// Fraction of reads assumed to come from a contaminant.
        #[arg(long, default_value_t = 0.0)]
        contamination: f64,
        /// PCR error rate.
        #[arg(long, default_value_t = 1e-4)]
        pcr_error_rate: f64,
        /// Minimum base quality for a base to be used.
        #[arg(long, default_value_t = 17)]
        min_base_quality: u8,
        /// Do not cap base qualities at the mapping quality.
        #[arg(long)]
        no_mapq_cap: bool,
        /// Emit monomorphic sites with genotypes too.
        #[arg(long)]
        emit_all_sites: bool,
        /// Restrict pileups to one strand.
        #[arg(long, value_enum, default_value_t = Orientation::Complete)]
        orientation: Orientation,
        /// Seed for contamination downsampling.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Orientation {
    Complete,
    Forward,
    Reverse,
}

impl From<Orientation> for ReadOrientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Complete => ReadOrientation::Complete,
            Orientation::Forward => ReadOrientation::Forward,
            Orientation::Reverse => ReadOrientation::Reverse,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Call {
            pileup,
            alleles,
            truth,
            contamination,
            pcr_error_rate,
            min_base_quality,
            no_mapq_cap,
            emit_all_sites,
            orientation,
            seed,
        } => {
            let config = CallerConfig::default()
                .with_contamination_fraction(contamination)
                .with_pcr_error_rate(pcr_error_rate)
                .with_min_base_quality(min_base_quality)
                .with_mapping_quality_cap(!no_mapq_cap)
                .with_read_orientation(orientation.into())
                .with_output_mode(if emit_all_sites {
                    OutputMode::AllSites
                } else {
                    OutputMode::VariantsOnly
                })
                .with_genotyping_mode(if truth.is_some() {
                    GenotypingMode::GivenAlleles
                } else {
                    GenotypingMode::Discovery
                })
                .with_seed(seed);
            run_call(config, pileup, alleles, truth)?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_call(
    config: CallerConfig,
    pileup_path: PathBuf,
    alleles: Option<String>,
    truth_path: Option<PathBuf>,
) -> Result<()> {
    let mut caller = SiteCaller::new(config).context("invalid caller configuration")?;

    if let Some(truth_path) = truth_path {
        let file = File::open(&truth_path)
            .with_context(|| format!("failed to open truth file {}", truth_path.display()))?;
        let truth = InMemoryTruthSource::read(BufReader::new(file))
            .with_context(|| format!("failed to read truth file {}", truth_path.display()))?;
        info!(records = truth.len(), "loaded truth alleles");
        caller = caller.with_truth_source(Arc::new(truth));
    }

    let fixed_alleles = alleles
        .as_deref()
        .map(parse_allele_list)
        .transpose()
        .context("invalid --alleles")?;

    let file = File::open(&pileup_path)
        .with_context(|| format!("failed to open pileup file {}", pileup_path.display()))?;
    let mut sites = read_sites(BufReader::new(file))
        .with_context(|| format!("failed to read pileup file {}", pileup_path.display()))?;
    if let Some(fixed) = fixed_alleles {
        for site in &mut sites {
            site.alleles = Some(fixed.clone());
        }
    }
    info!(sites = sites.len(), "calling sites");

    let mut calls = Vec::with_capacity(sites.len());
    for (site, result) in sites.iter().zip(caller.call_sites(&sites, &TracingProgress)) {
        match result {
            Ok(Some(call)) if call.is_variant() || !call.samples.is_empty() => calls.push(call),
            Ok(_) => {}
            Err(err) => warn!(locus = %site.locus, "site skipped: {err}"),
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_calls(&mut handle, &calls)?;
    info!(emitted = calls.len(), "done");
    Ok(())
}

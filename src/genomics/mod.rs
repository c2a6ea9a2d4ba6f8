//! Site-level diploid SNP genotype likelihood model.
//!
//! Components, leaves first: pileup types, the contamination downsampler,
//! the quality adjuster interface, the likelihood accumulator, allele
//! resolution, PL remapping, and the [`SiteCaller`] that sequences them.

mod types;
mod pileup;
mod downsample;
mod quality;
pub mod likelihoods;
mod alleles;
mod ordering;
mod site_caller;
pub mod io;

pub use types::{
    Allele, AlleleSet, Base, Locus, PileupElement, ReadObservation, MAX_PHRED_QUALITY, NUM_BASES,
};
pub use pileup::{FragmentCollection, Pileup, ReadOrientation};
pub use downsample::ContaminationDownsampler;
pub use quality::{adjust_pileup, QualityAdjuster};
pub use likelihoods::{
    AccumulatedLikelihoods, BaseFilter, GenotypeLikelihoods, LikelihoodAccumulator,
    NUM_DIPLOID_GENOTYPES,
};
pub use alleles::{
    discover_alternate_alleles, placeholder_alternate, AllelePolicy, ResolvedAlleles,
    TruthAlleles, TruthSource,
};
pub use ordering::PlOrdering;
pub use site_caller::{
    ProgressReporter, SampleRecord, SiteCall, SiteCaller, SiteInput, TracingProgress,
};

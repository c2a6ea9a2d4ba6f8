//! # Diploid SNP genotype likelihoods
//!
//! This library computes, for one genomic site at a time, log10 likelihoods
//! of every diploid SNP genotype given the aligned base observations of each
//! sample, and uses them to decide which alternate alleles are present.
//!
//! ## Pipeline
//!
//! 1. **Stratification**: optionally restrict each pileup to one strand
//! 2. **Decontamination**: remove `ceil(n·f)` reads from every base stratum
//! 3. **Quality adjustment**: optionally wrap elements with recalculated qualities
//! 4. **Accumulation**: sum per-read log-likelihoods over the ten genotypes
//! 5. **Allele resolution**: fixed list, truth source, or discovery
//! 6. **Remapping**: reorder each sample's vector into VCF PL order and normalize
//!
//! ## Usage Example
//!
//! ```ignore
//! use snpgl::{CallerConfig, genomics::{SiteCaller, SiteInput}};
//!
//! let caller = SiteCaller::new(CallerConfig::default())?;
//! let mut rng = StdRng::seed_from_u64(caller.config().seed);
//! if let Some(call) = caller.call_site(&site, &mut rng)? {
//!     println!("{} alleles at {}", call.alleles.len(), call.locus);
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod genomics; // Site-level genotype likelihood model

pub use genomics::{
    Allele, AlleleSet, Base, GenotypeLikelihoods, Locus, Pileup, PileupElement, ReadObservation,
    SiteCall, SiteCaller, SiteInput,
};

use thiserror::Error;

use crate::genomics::ReadOrientation;

/// Which sites are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OutputMode {
    /// Only sites with at least one alternate allele carry genotypes.
    #[default]
    VariantsOnly,
    /// Every callable site is emitted with genotypes.
    AllSites,
}

/// How alternate alleles are chosen when the site carries no allele list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GenotypingMode {
    /// Infer alternates from the sample likelihoods.
    #[default]
    Discovery,
    /// Genotype the alleles recorded by a truth source.
    GivenAlleles,
}

/// Configuration parameters for per-site calling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CallerConfig {
    /// Probability that PCR introduced an error into a fragment.
    pub pcr_error_rate: f64,

    /// Bases below this Phred quality are ignored.
    pub min_base_quality: u8,

    /// Fraction of each pileup assumed to come from a contaminant.
    pub contamination_fraction: f64,

    /// Cap base qualities at the read's mapping quality.
    pub cap_base_quality_at_mapping_quality: bool,

    /// Replace base qualities through the attached quality adjuster.
    pub use_quality_adjustment: bool,

    /// Strand restriction applied to every pileup.
    pub read_orientation: ReadOrientation,

    /// Which sites are emitted.
    pub output_mode: OutputMode,

    /// Allele source when no per-site list is given.
    pub genotyping_mode: GenotypingMode,

    /// Base seed for downsampling randomness.
    pub seed: u64,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            pcr_error_rate: 1e-4,
            min_base_quality: 17,
            contamination_fraction: 0.0,
            cap_base_quality_at_mapping_quality: true,
            use_quality_adjustment: false,
            read_orientation: ReadOrientation::Complete,
            output_mode: OutputMode::VariantsOnly,
            genotyping_mode: GenotypingMode::Discovery,
            seed: 0,
        }
    }
}

impl CallerConfig {
    /// Set the PCR error rate.
    pub fn with_pcr_error_rate(mut self, rate: f64) -> Self {
        self.pcr_error_rate = rate;
        self
    }

    /// Set the minimum base quality.
    pub fn with_min_base_quality(mut self, quality: u8) -> Self {
        self.min_base_quality = quality;
        self
    }

    /// Set the contamination fraction.
    pub fn with_contamination_fraction(mut self, fraction: f64) -> Self {
        self.contamination_fraction = fraction;
        self
    }

    /// Enable or disable mapping-quality capping.
    pub fn with_mapping_quality_cap(mut self, enabled: bool) -> Self {
        self.cap_base_quality_at_mapping_quality = enabled;
        self
    }

    /// Enable or disable quality adjustment.
    pub fn with_quality_adjustment(mut self, enabled: bool) -> Self {
        self.use_quality_adjustment = enabled;
        self
    }

    /// Set the strand restriction.
    pub fn with_read_orientation(mut self, orientation: ReadOrientation) -> Self {
        self.read_orientation = orientation;
        self
    }

    /// Set the output mode.
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Set the genotyping mode.
    pub fn with_genotyping_mode(mut self, mode: GenotypingMode) -> Self {
        self.genotyping_mode = mode;
        self
    }

    /// Set the downsampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pcr_error_rate > 0.0 && self.pcr_error_rate < 1.0) {
            return Err(ConfigError::PcrErrorRateOutOfRange(self.pcr_error_rate));
        }
        if !(0.0..=1.0).contains(&self.contamination_fraction) {
            return Err(ConfigError::ContaminationOutOfRange(
                self.contamination_fraction,
            ));
        }
        Ok(())
    }
}

/// Invalid or incomplete caller configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// PCR error rate outside `(0, 1)`.
    #[error("PCR error rate must be in (0, 1), got {0}")]
    PcrErrorRateOutOfRange(f64),

    /// Contamination fraction outside `[0, 1]`.
    #[error("contamination fraction must be in [0, 1], got {0}")]
    ContaminationOutOfRange(f64),

    /// Given-alleles mode without a truth source.
    #[error("genotyping given alleles requires a truth source")]
    MissingTruthSource,

    /// Quality adjustment requested without an adjuster.
    #[error("quality adjustment enabled but no quality adjuster attached")]
    MissingQualityAdjuster,
}

/// Errors that abort the call of a single site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// An allele list declares the reference base as an alternate.
    #[error("alternate allele '{base}' is the same as the reference at {locus}")]
    ReferenceAsAlternate {
        /// Site of the conflict.
        locus: Locus,
        /// Offending base.
        base: Base,
    },

    /// The truth source holds an allele that is not a single A/C/G/T base.
    #[error("truth allele '{allele}' at {locus} is not a SNP allele")]
    NonSnpTruthAllele {
        /// Site of the record.
        locus: Locus,
        /// Offending allele string.
        allele: String,
    },

    /// The truth record's reference allele disagrees with the site reference.
    #[error("truth reference '{truth}' at {locus} does not match site reference '{reference}'")]
    TruthReferenceMismatch {
        /// Site of the record.
        locus: Locus,
        /// Reference base of the site.
        reference: Base,
        /// Reference allele string from the truth record.
        truth: String,
    },

    /// The caller is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CallerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_base_quality, 17);
        assert_eq!(config.output_mode, OutputMode::VariantsOnly);
    }

    #[test]
    fn test_validate_rejects_out_of_range_parameters() {
        let config = CallerConfig::default().with_contamination_fraction(1.2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ContaminationOutOfRange(1.2))
        );

        let config = CallerConfig::default().with_pcr_error_rate(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PcrErrorRateOutOfRange(_))
        ));
    }
}

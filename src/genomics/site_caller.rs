use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::genomics::alleles::{placeholder_alternate, AllelePolicy, ResolvedAlleles, TruthSource};
use crate::genomics::likelihoods::{to_phred, BaseFilter};
use crate::genomics::quality::{adjust_pileup, QualityAdjuster};
use crate::genomics::{
    Allele, AlleleSet, Base, ContaminationDownsampler, GenotypeLikelihoods, LikelihoodAccumulator,
    Locus, Pileup, PlOrdering,
};
use crate::{CallError, CallerConfig, ConfigError, GenotypingMode, OutputMode};

/// Everything known about one site before calling.
#[derive(Debug, Clone)]
pub struct SiteInput {
    /// Reference position.
    pub locus: Locus,
    /// Reference symbol as ASCII; non-standard symbols are not called.
    pub reference: u8,
    /// Pileup per sample, keyed by sample name.
    pub samples: BTreeMap<String, Pileup>,
    /// Alleles to genotype instead of resolving them by policy; element 0
    /// stands for the reference.
    pub alleles: Option<Vec<Allele>>,
}

impl SiteInput {
    /// Site without samples or allele list.
    pub fn new(locus: Locus, reference: u8) -> Self {
        Self {
            locus,
            reference,
            samples: BTreeMap::new(),
            alleles: None,
        }
    }

    /// Add (or replace) a sample's pileup.
    pub fn with_sample(mut self, name: impl Into<String>, pileup: Pileup) -> Self {
        self.samples.insert(name.into(), pileup);
        self
    }

    /// Genotype exactly these alleles.
    pub fn with_alleles(mut self, alleles: Vec<Allele>) -> Self {
        self.alleles = Some(alleles);
        self
    }
}

/// Genotype likelihoods of one sample in the site's PL order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SampleRecord {
    /// Sample name.
    pub sample: String,
    /// Normalized log10 likelihoods, `k(k+1)/2` entries for `k` alleles.
    pub log10_likelihoods: Vec<f64>,
    /// Number of A/C/G/T observations in the processed pileup.
    pub depth: u32,
}

impl SampleRecord {
    /// Phred-scaled integer PLs.
    pub fn phred_likelihoods(&self) -> Vec<u32> {
        to_phred(&self.log10_likelihoods)
    }
}

/// Final call for one site.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SiteCall {
    /// Reference position.
    pub locus: Locus,
    /// Alleles, reference first.
    pub alleles: AlleleSet,
    /// Per-sample likelihoods; samples without usable bases are absent.
    pub samples: Vec<SampleRecord>,
}

impl SiteCall {
    /// Whether the call carries any alternate allele.
    pub fn is_variant(&self) -> bool {
        !self.alleles.alternates().is_empty()
    }
}

/// Receives percent-complete updates from batch calling. Best effort only.
pub trait ProgressReporter: Send + Sync {
    /// Called with a value in `0.0..=100.0`.
    fn report_progress(&self, percent: f64);
}

/// Progress reporter that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report_progress(&self, percent: f64) {
        info!("{percent:.0}% of sites processed");
    }
}

/// Per-sample likelihoods before allele resolution.
#[derive(Debug, Clone)]
struct SampleGenotypeData {
    name: String,
    likelihoods: GenotypeLikelihoods,
    depth: u32,
}

/// Calls genotype likelihoods one site at a time.
///
/// The caller keeps no per-site state, so a single instance can call many
/// sites concurrently.
#[derive(Clone)]
pub struct SiteCaller {
    config: CallerConfig,
    accumulator: LikelihoodAccumulator,
    downsampler: ContaminationDownsampler,
    quality_adjuster: Option<Arc<dyn QualityAdjuster>>,
    truth_source: Option<Arc<dyn TruthSource>>,
}

impl std::fmt::Debug for SiteCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCaller")
            .field("config", &self.config)
            .field("quality_adjuster", &self.quality_adjuster.is_some())
            .field("truth_source", &self.truth_source.is_some())
            .finish()
    }
}

impl SiteCaller {
    /// Create a caller after validating `config`.
    pub fn new(config: CallerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = BaseFilter {
            min_base_quality: config.min_base_quality,
            cap_at_mapping_quality: config.cap_base_quality_at_mapping_quality,
        };
        let accumulator = LikelihoodAccumulator::new(config.pcr_error_rate, filter)?;
        let downsampler = ContaminationDownsampler::new(config.contamination_fraction)?;

        Ok(Self {
            config,
            accumulator,
            downsampler,
            quality_adjuster: None,
            truth_source: None,
        })
    }

    /// Attach the quality adjuster used when quality adjustment is enabled.
    pub fn with_quality_adjuster(mut self, adjuster: Arc<dyn QualityAdjuster>) -> Self {
        self.quality_adjuster = Some(adjuster);
        self
    }

    /// Attach the truth source used in given-alleles mode.
    pub fn with_truth_source(mut self, source: Arc<dyn TruthSource>) -> Self {
        self.truth_source = Some(source);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Call one site.
    ///
    /// Returns `Ok(None)` when the site is not callable: a non-standard
    /// reference base, or no truth record in given-alleles mode.
    pub fn call_site<R: Rng + ?Sized>(
        &self,
        site: &SiteInput,
        rng: &mut R,
    ) -> Result<Option<SiteCall>, CallError> {
        let Some(reference) = Base::from_ascii(site.reference) else {
            let symbol = site.reference as char;
            debug!(locus = %site.locus, reference = %symbol, "non-standard reference base; skipping");
            return Ok(None);
        };

        let quality_adjuster = if self.config.use_quality_adjustment {
            Some(
                self.quality_adjuster
                    .as_deref()
                    .ok_or(ConfigError::MissingQualityAdjuster)?,
            )
        } else {
            None
        };

        let samples: Vec<SampleGenotypeData> = site
            .samples
            .iter()
            .filter_map(|(name, pileup)| {
                self.sample_likelihoods(&site.locus, name, pileup, quality_adjuster, rng)
            })
            .collect();

        let policy = match (&site.alleles, self.config.genotyping_mode) {
            (Some(fixed), _) => AllelePolicy::Fixed(fixed),
            (None, GenotypingMode::GivenAlleles) => AllelePolicy::Truth(
                self.truth_source
                    .as_deref()
                    .ok_or(ConfigError::MissingTruthSource)?,
            ),
            (None, GenotypingMode::Discovery) => AllelePolicy::Discover,
        };
        let discovering = matches!(policy, AllelePolicy::Discover);

        let mut alleles = match policy.resolve(
            &site.locus,
            reference,
            samples.iter().map(|sample| &sample.likelihoods),
        )? {
            ResolvedAlleles::Alleles(alleles) => alleles,
            ResolvedAlleles::NoCall => return Ok(None),
        };

        if discovering && alleles.alternates().is_empty() {
            if self.config.output_mode == OutputMode::VariantsOnly {
                trace!(locus = %site.locus, "no alternate alleles discovered");
                return Ok(Some(SiteCall {
                    locus: site.locus.clone(),
                    alleles,
                    samples: Vec::new(),
                }));
            }
            alleles.push_alternate(placeholder_alternate(reference));
        }
        debug!(locus = %site.locus, alleles = alleles.len(), samples = samples.len(), "resolved alleles");

        Ok(Some(remap_samples(&site.locus, alleles, samples)))
    }

    /// Call independent sites in parallel. Site `i` draws its randomness from
    /// `seed + i`, so results do not depend on scheduling.
    pub fn call_sites(
        &self,
        sites: &[SiteInput],
        progress: &dyn ProgressReporter,
    ) -> Vec<Result<Option<SiteCall>, CallError>> {
        let total = sites.len();
        if total == 0 {
            progress.report_progress(100.0);
            return Vec::new();
        }
        let completed = AtomicUsize::new(0);

        sites
            .par_iter()
            .enumerate()
            .map(|(idx, site)| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(idx as u64));
                let result = self.call_site(site, &mut rng);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if (done - 1) * 100 / total != done * 100 / total {
                    progress.report_progress(done as f64 * 100.0 / total as f64);
                }
                result
            })
            .collect()
    }

    fn sample_likelihoods<R: Rng + ?Sized>(
        &self,
        locus: &Locus,
        name: &str,
        pileup: &Pileup,
        quality_adjuster: Option<&dyn QualityAdjuster>,
        rng: &mut R,
    ) -> Option<SampleGenotypeData> {
        let mut pileup = pileup.stratify(self.config.read_orientation);
        if self.config.contamination_fraction > 0.0 {
            pileup = self.downsampler.downsample(&pileup, rng);
        }
        if let Some(adjuster) = quality_adjuster {
            pileup = adjust_pileup(&pileup, adjuster);
        }

        let Some(accumulated) = self.accumulator.accumulate(&pileup) else {
            trace!(%locus, sample = name, "no usable bases");
            return None;
        };
        Some(SampleGenotypeData {
            name: name.to_string(),
            likelihoods: accumulated.likelihoods,
            depth: pileup.filtered_depth(),
        })
    }
}

fn remap_samples(locus: &Locus, alleles: AlleleSet, samples: Vec<SampleGenotypeData>) -> SiteCall {
    let ordering = PlOrdering::new(&alleles);
    let samples = samples
        .into_iter()
        .map(|sample| SampleRecord {
            log10_likelihoods: ordering.remap(&sample.likelihoods),
            sample: sample.name,
            depth: sample.depth,
        })
        .collect();

    SiteCall {
        locus: locus.clone(),
        alleles,
        samples,
    }
}

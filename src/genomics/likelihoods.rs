//! Diploid SNP genotype likelihoods.
//!
//! Genotypes over the four-base alphabet are laid out densely with the
//! canonical pairing `index(i, j) = j(j+1)/2 + i` for `i <= j`, giving the
//! order AA, AC, CC, AG, CG, GG, AT, CT, GT, TT.

use std::f64::consts::LOG10_2;

use crate::genomics::{Base, Pileup, PileupElement, MAX_PHRED_QUALITY, NUM_BASES};
use crate::ConfigError;

/// Number of diploid genotypes over A/C/G/T.
pub const NUM_DIPLOID_GENOTYPES: usize = NUM_BASES * (NUM_BASES + 1) / 2;

/// Canonical pairing index of the unordered genotype `{a, b}`.
#[inline]
pub fn genotype_index(a: usize, b: usize) -> usize {
    let (i, j) = if a <= b { (a, b) } else { (b, a) };
    j * (j + 1) / 2 + i
}

/// Inverse of [`genotype_index`]: the allele pair `(i, j)`, `i <= j`.
pub fn genotype_alleles(index: usize) -> (usize, usize) {
    let mut j = 0;
    while (j + 1) * (j + 2) / 2 <= index {
        j += 1;
    }
    (index - j * (j + 1) / 2, j)
}

/// log10 likelihoods of the ten diploid SNP genotypes for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GenotypeLikelihoods {
    log10: [f64; NUM_DIPLOID_GENOTYPES],
}

impl GenotypeLikelihoods {
    /// Wrap raw log10 values.
    pub fn from_log10(log10: [f64; NUM_DIPLOID_GENOTYPES]) -> Self {
        Self { log10 }
    }

    /// Raw log10 values in dense order.
    pub fn as_log10(&self) -> &[f64; NUM_DIPLOID_GENOTYPES] {
        &self.log10
    }

    /// Value for genotype `{a, b}`.
    pub fn get(&self, a: Base, b: Base) -> f64 {
        self.log10[genotype_index(a.index(), b.index())]
    }

    /// Dense index of the most likely genotype; the first one wins ties.
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for (idx, &value) in self.log10.iter().enumerate().skip(1) {
            if value > self.log10[best] {
                best = idx;
            }
        }
        best
    }

    /// Shift so the largest entry is exactly zero.
    pub fn normalized(&self) -> Self {
        Self {
            log10: normalize_log10(self.log10),
        }
    }

    /// Phred-scaled PLs in dense order, relative to the best genotype.
    pub fn to_phred(&self) -> [u32; NUM_DIPLOID_GENOTYPES] {
        let mut pls = [0; NUM_DIPLOID_GENOTYPES];
        for (pl, value) in pls.iter_mut().zip(to_phred(&self.normalized().log10)) {
            *pl = value;
        }
        pls
    }
}

/// Subtract the maximum so the best entry becomes exactly zero.
pub fn normalize_log10<const N: usize>(mut values: [f64; N]) -> [f64; N] {
    normalize_log10_in_place(&mut values);
    values
}

/// In-place variant of [`normalize_log10`] for slices.
pub fn normalize_log10_in_place(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() {
        for value in values.iter_mut() {
            *value -= max;
        }
    }
}

/// Convert normalized log10 likelihoods to integer Phred-scaled PLs.
pub fn to_phred(values: &[f64]) -> Vec<u32> {
    values
        .iter()
        .map(|&value| {
            let pl = (-10.0 * value).round();
            if pl.is_finite() {
                pl.max(0.0).min(u32::MAX as f64) as u32
            } else {
                u32::MAX
            }
        })
        .collect()
}

/// Result of scoring one pileup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatedLikelihoods {
    /// Unnormalized genotype likelihoods.
    pub likelihoods: GenotypeLikelihoods,
    /// Number of bases (or overlapping fragments) that contributed.
    pub good_bases: usize,
}

/// Base-usability rules applied while scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseFilter {
    /// Bases with effective quality below this are ignored.
    pub min_base_quality: u8,
    /// Cap base quality at the read's mapping quality.
    pub cap_at_mapping_quality: bool,
}

impl Default for BaseFilter {
    fn default() -> Self {
        Self {
            min_base_quality: 17,
            cap_at_mapping_quality: true,
        }
    }
}

impl BaseFilter {
    /// Usable base and quality for an element, or `None`.
    fn usable(&self, element: &PileupElement) -> Option<(Base, u8)> {
        let base = element.standard_base()?;
        let mut quality = element.quality().min(MAX_PHRED_QUALITY);
        if self.cap_at_mapping_quality {
            quality = quality.min(element.mapping_quality());
        }
        if quality == 0 || quality < self.min_base_quality {
            return None;
        }
        Some((base, quality))
    }
}

/// Scores pileups against the ten diploid SNP genotypes.
///
/// The accumulator holds only immutable, precomputed tables; every call to
/// [`LikelihoodAccumulator::accumulate`] starts from fresh sums, so one
/// instance can be shared across samples, sites and threads.
#[derive(Debug, Clone)]
pub struct LikelihoodAccumulator {
    filter: BaseFilter,
    log10_pcr_match: f64,
    log10_pcr_mismatch: f64,
    /// `single_base[q][observed][true_base]`, log10 P(observed | true_base).
    single_base: Vec<[[f64; NUM_BASES]; NUM_BASES]>,
}

impl LikelihoodAccumulator {
    /// Build an accumulator for a PCR error rate in `(0, 1)`.
    pub fn new(pcr_error_rate: f64, filter: BaseFilter) -> Result<Self, ConfigError> {
        if !(pcr_error_rate > 0.0 && pcr_error_rate < 1.0) {
            return Err(ConfigError::PcrErrorRateOutOfRange(pcr_error_rate));
        }

        let mut accumulator = Self {
            filter,
            log10_pcr_match: (1.0 - pcr_error_rate).log10(),
            log10_pcr_mismatch: (pcr_error_rate / 3.0).log10(),
            single_base: Vec::with_capacity(MAX_PHRED_QUALITY as usize + 1),
        };
        for quality in 0..=MAX_PHRED_QUALITY {
            let mut table = [[0.0; NUM_BASES]; NUM_BASES];
            for observed in Base::ALL {
                table[observed.index()] = accumulator.true_base_log10(&[(observed, quality)]);
            }
            accumulator.single_base.push(table);
        }
        Ok(accumulator)
    }

    /// Usability rules in effect.
    pub fn filter(&self) -> BaseFilter {
        self.filter
    }

    /// Score `pileup`. Returns `None` when no usable base exists.
    pub fn accumulate(&self, pileup: &Pileup) -> Option<AccumulatedLikelihoods> {
        let mut log10 = [0.0; NUM_DIPLOID_GENOTYPES];
        let mut good_bases = 0;

        let fragments = pileup.fragments();
        for element in fragments.singletons {
            if let Some((base, quality)) = self.filter.usable(element) {
                let per_true_base = self.single_base[quality as usize][base.index()];
                add_to_genotypes(&mut log10, &per_true_base);
                good_bases += 1;
            }
        }
        for [first, second] in fragments.overlapping_pairs {
            let observations: Vec<(Base, u8)> = [first, second]
                .into_iter()
                .filter_map(|element| self.filter.usable(element))
                .collect();
            if observations.is_empty() {
                continue;
            }
            add_to_genotypes(&mut log10, &self.true_base_log10(&observations));
            good_bases += 1;
        }

        if good_bases == 0 {
            return None;
        }
        Some(AccumulatedLikelihoods {
            likelihoods: GenotypeLikelihoods::from_log10(log10),
            good_bases,
        })
    }

    /// log10 P(observations | true base) for each true base, marginalizing
    /// over the PCR fragment base.
    fn true_base_log10(&self, observations: &[(Base, u8)]) -> [f64; NUM_BASES] {
        let mut result = [0.0; NUM_BASES];
        for true_base in Base::ALL {
            let mut likelihood = 0.0;
            for fragment_base in Base::ALL {
                let mut log10_fragment = if true_base == fragment_base {
                    self.log10_pcr_match
                } else {
                    self.log10_pcr_mismatch
                };
                for &(observed, quality) in observations {
                    log10_fragment += log10_observed_given(observed, fragment_base, quality);
                }
                likelihood += 10f64.powf(log10_fragment);
            }
            result[true_base.index()] = likelihood.log10();
        }
        result
    }
}

/// log10 P(observing `observed` | the fragment carries `actual`) at `quality`.
fn log10_observed_given(observed: Base, actual: Base, quality: u8) -> f64 {
    let error = 10f64.powf(-(quality as f64) / 10.0);
    if observed == actual {
        (1.0 - error).log10()
    } else {
        (error / 3.0).log10()
    }
}

/// Fold per-true-base likelihoods into each genotype as an even mixture of
/// its two chromosomes.
fn add_to_genotypes(log10: &mut [f64; NUM_DIPLOID_GENOTYPES], per_true_base: &[f64; NUM_BASES]) {
    for j in 0..NUM_BASES {
        for i in 0..=j {
            let mixture = 10f64.powf(per_true_base[i] - LOG10_2)
                + 10f64.powf(per_true_base[j] - LOG10_2);
            log10[genotype_index(i, j)] += mixture.log10();
        }
    }
}

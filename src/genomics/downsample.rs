use bitvec::prelude::*;
use rand::seq::index;
use rand::Rng;
use tracing::trace;

use crate::genomics::{Pileup, PileupElement, NUM_BASES};
use crate::ConfigError;

/// Contamination-aware downsampler.
///
/// Elements are stratified by observed base and the *same absolute* number of
/// reads, `ceil(len * fraction)`, is removed from every stratum. Small strata
/// therefore lose proportionally more, which is what strips contaminating
/// reads. Survivors are re-sorted by alignment start, then read name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContaminationDownsampler {
    fraction: f64,
}

impl ContaminationDownsampler {
    /// Create a downsampler for a contamination fraction in `[0, 1]`.
    pub fn new(fraction: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::ContaminationOutOfRange(fraction));
        }
        Ok(Self { fraction })
    }

    /// Configured contamination fraction.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Downsample `pileup`, drawing removals from `rng`.
    pub fn downsample<R: Rng + ?Sized>(&self, pileup: &Pileup, rng: &mut R) -> Pileup {
        if self.fraction <= 0.0 {
            return pileup.clone();
        }
        if self.fraction >= 1.0 {
            return Pileup::empty();
        }

        let mut strata: [Vec<&PileupElement>; NUM_BASES] = Default::default();
        for element in pileup {
            if let Some(base) = element.standard_base() {
                strata[base.index()].push(element);
            }
        }

        let to_remove = (pileup.len() as f64 * self.fraction).ceil() as usize;
        let mut kept: Vec<PileupElement> = Vec::with_capacity(pileup.len());
        for stratum in strata.iter() {
            if stratum.len() > to_remove {
                kept.extend(remove_random(stratum, to_remove, rng));
            }
        }

        kept.sort_by(|left, right| {
            left.alignment_start()
                .cmp(&right.alignment_start())
                .then_with(|| left.read_name().cmp(right.read_name()))
        });

        trace!(
            original = pileup.len(),
            kept = kept.len(),
            to_remove,
            "decontaminated pileup"
        );
        Pileup::new(kept)
    }
}

/// Remove `count` elements chosen uniformly without replacement, keeping the
/// rest in their original order.
fn remove_random<R: Rng + ?Sized>(
    elements: &[&PileupElement],
    count: usize,
    rng: &mut R,
) -> Vec<PileupElement> {
    let mut removed = bitvec![0; elements.len()];
    for idx in index::sample(rng, elements.len(), count) {
        removed.set(idx, true);
    }

    elements
        .iter()
        .zip(removed.iter())
        .filter(|(_, is_removed)| !**is_removed)
        .map(|(element, _)| (*element).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ReadObservation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pileup_with(counts: &[(u8, usize)]) -> Pileup {
        let mut elements = Vec::new();
        let mut read = 0u32;
        for &(base, count) in counts {
            for _ in 0..count {
                elements.push(
                    ReadObservation::new(format!("read{read:04}"), 1000 - read, base, 30).into(),
                );
                read += 1;
            }
        }
        Pileup::new(elements)
    }

    #[test]
    fn zero_fraction_is_identity() {
        let pileup = pileup_with(&[(b'A', 5), (b'N', 1), (b'C', 3)]);
        let downsampler = ContaminationDownsampler::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(downsampler.downsample(&pileup, &mut rng), pileup);
    }

    #[test]
    fn full_fraction_empties_pileup() {
        let pileup = pileup_with(&[(b'A', 5)]);
        let downsampler = ContaminationDownsampler::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(downsampler.downsample(&pileup, &mut rng).is_empty());
    }

    #[test]
    fn removes_same_count_from_each_stratum() {
        let pileup = pileup_with(&[(b'A', 60), (b'C', 40)]);
        let downsampler = ContaminationDownsampler::new(0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let kept = downsampler.downsample(&pileup, &mut rng);

        let count = |base: u8| kept.iter().filter(|e| e.base() == base).count();
        assert_eq!(count(b'A'), 50);
        assert_eq!(count(b'C'), 30);
    }

    #[test]
    fn strata_not_larger_than_removal_target_vanish() {
        let pileup = pileup_with(&[(b'A', 90), (b'T', 10)]);
        let downsampler = ContaminationDownsampler::new(0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let kept = downsampler.downsample(&pileup, &mut rng);
        assert_eq!(kept.len(), 80);
        assert!(kept.iter().all(|e| e.base() == b'A'));
    }

    #[test]
    fn output_sorted_by_start_then_name() {
        let pileup = pileup_with(&[(b'A', 20), (b'G', 20)]);
        let downsampler = ContaminationDownsampler::new(0.25).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let kept = downsampler.downsample(&pileup, &mut rng);
        let keys: Vec<_> = kept
            .iter()
            .map(|e| (e.alignment_start(), e.read_name().to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn deletions_are_not_stratified() {
        let mut elements = pileup_with(&[(b'G', 10)]).into_elements();
        for i in 0..3u32 {
            elements.push(
                ReadObservation::new(format!("del{i}"), 2000 + i, b'G', 30)
                    .with_deletion(true)
                    .into(),
            );
        }
        let pileup = Pileup::new(elements);

        let downsampler = ContaminationDownsampler::new(0.05).unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        let kept = downsampler.downsample(&pileup, &mut rng);
        // ceil(13 * 0.05) = 1 removed from the ten G reads only.
        assert_eq!(kept.len(), 9);
        assert!(kept.iter().all(|e| !e.is_deletion()));
    }

    #[test]
    fn rejects_fraction_outside_unit_interval() {
        assert!(ContaminationDownsampler::new(-0.1).is_err());
        assert!(ContaminationDownsampler::new(1.5).is_err());
        assert!(ContaminationDownsampler::new(f64::NAN).is_err());
    }
}

use crate::genomics::{Pileup, PileupElement};

/// Recalculates the quality of a base, e.g. base alignment quality.
///
/// Implementations must be pure: the same element and offset always yield the
/// same score, and nothing is mutated.
pub trait QualityAdjuster: Send + Sync {
    /// Adjusted Phred quality for the base at `offset` of the element's read.
    fn adjust_quality(&self, element: &PileupElement, offset: usize) -> u8;
}

impl<F> QualityAdjuster for F
where
    F: Fn(&PileupElement, usize) -> u8 + Send + Sync,
{
    fn adjust_quality(&self, element: &PileupElement, offset: usize) -> u8 {
        self(element, offset)
    }
}

/// Wrap every element with its adjusted quality, keeping order and the
/// original observations.
pub fn adjust_pileup(pileup: &Pileup, adjuster: &dyn QualityAdjuster) -> Pileup {
    pileup
        .iter()
        .map(|element| element.with_quality(adjuster.adjust_quality(element, element.read_offset())))
        .collect()
}
